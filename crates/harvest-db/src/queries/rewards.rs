//! Direct reward row queries.

use harvest_types::reward::RewardRecord;
use harvest_types::SeasonIndex;
use rusqlite::{Connection, Row};

use super::{address_at, amount_at, to_sql_u64, u64_at};
use crate::Result;

/// Insert or replace a row at `position` in its season's insertion order.
pub fn upsert(conn: &Connection, record: &RewardRecord, position: u64) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO rewards (season_index, owner, position, destination, amount, claimed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            to_sql_u64(record.season_index)?,
            record.owner.as_bytes().as_slice(),
            to_sql_u64(position)?,
            record.destination.as_bytes().as_slice(),
            record.amount.to_string(),
            record.claimed,
        ],
    )?;
    Ok(())
}

/// Rows of one season in insertion order.
pub fn list_season(conn: &Connection, season_index: SeasonIndex) -> Result<Vec<RewardRecord>> {
    let mut stmt = conn.prepare(
        "SELECT season_index, owner, destination, amount, claimed
         FROM rewards WHERE season_index = ?1 ORDER BY position",
    )?;
    let rows = stmt
        .query_map([to_sql_u64(season_index)?], record_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Every row, season by season, each in insertion order.
pub fn list(conn: &Connection) -> Result<Vec<RewardRecord>> {
    let mut stmt = conn.prepare(
        "SELECT season_index, owner, destination, amount, claimed
         FROM rewards ORDER BY season_index, position",
    )?;
    let rows = stmt
        .query_map([], record_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<RewardRecord> {
    Ok(RewardRecord {
        season_index: u64_at(row, 0)?,
        owner: address_at(row, 1)?,
        destination: address_at(row, 2)?,
        amount: amount_at(row, 3)?,
        claimed: row.get(4)?,
    })
}
