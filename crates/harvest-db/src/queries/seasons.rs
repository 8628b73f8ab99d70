//! Season arena queries.

use harvest_types::season::{ClaimMode, Season};
use harvest_types::SeasonIndex;
use rusqlite::types::Type;
use rusqlite::{Connection, Row};

use super::{address_at, amount_at, hash_at, to_sql_u64, u64_at};
use crate::{DbError, Result};

const COLUMNS: &str = "season_index, default_destination, open_window_end, claim_window_end,
     total_rewards, claimed_rewards, reward_count, unclaimed_funds_swept, claim_mode, merkle_root";

/// Insert a season or overwrite the stored copy of the same index.
pub fn upsert(conn: &Connection, season: &Season) -> Result<()> {
    let open_window_end = season.open_window_end.map(to_sql_u64).transpose()?;
    let merkle_root = season.mode.merkle_root().map(|root| root.as_slice());
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO seasons ({COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"
        ),
        rusqlite::params![
            to_sql_u64(season.index)?,
            season.default_destination.as_bytes().as_slice(),
            open_window_end,
            to_sql_u64(season.claim_window_end)?,
            season.total_rewards.to_string(),
            season.claimed_rewards.to_string(),
            to_sql_u64(season.reward_count)?,
            season.unclaimed_funds_swept,
            season.mode.name(),
            merkle_root,
        ],
    )?;
    Ok(())
}

/// Get a season by index.
pub fn get(conn: &Connection, index: SeasonIndex) -> Result<Season> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM seasons WHERE season_index = ?1"),
        [to_sql_u64(index)?],
        season_from_row,
    )
    .map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => DbError::NotFound(format!("season {index}")),
        other => DbError::Sqlite(other),
    })
}

/// All seasons in index order.
pub fn list(conn: &Connection) -> Result<Vec<Season>> {
    let mut stmt = conn.prepare(&format!("SELECT {COLUMNS} FROM seasons ORDER BY season_index"))?;
    let rows = stmt
        .query_map([], season_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Highest stored index, 0 if none.
pub fn current_index(conn: &Connection) -> Result<SeasonIndex> {
    let index: Option<i64> =
        conn.query_row("SELECT MAX(season_index) FROM seasons", [], |row| row.get(0))?;
    Ok(index.and_then(|i| u64::try_from(i).ok()).unwrap_or(0))
}

fn season_from_row(row: &Row<'_>) -> rusqlite::Result<Season> {
    let open_window_end = row
        .get::<_, Option<i64>>(2)?
        .map(|end| {
            u64::try_from(end).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, Box::new(e))
            })
        })
        .transpose()?;

    let mode_name: String = row.get(8)?;
    let mode = match mode_name.as_str() {
        "direct" => ClaimMode::Direct,
        "merkle" => ClaimMode::Merkle {
            merkle_root: hash_at(row, 9)?,
        },
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                8,
                Type::Text,
                format!("unknown claim mode '{other}'").into(),
            ))
        }
    };

    Ok(Season {
        index: u64_at(row, 0)?,
        default_destination: address_at(row, 1)?,
        open_window_end,
        claim_window_end: u64_at(row, 3)?,
        total_rewards: amount_at(row, 4)?,
        claimed_rewards: amount_at(row, 5)?,
        reward_count: u64_at(row, 6)?,
        unclaimed_funds_swept: row.get(7)?,
        mode,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_types::Address;

    fn test_db() -> Connection {
        crate::open_memory().expect("open test db")
    }

    fn season(index: SeasonIndex) -> Season {
        Season {
            index,
            default_destination: Address::repeat(0xDE),
            open_window_end: Some(100),
            claim_window_end: 200,
            total_rewards: u128::MAX,
            claimed_rewards: 5,
            reward_count: 2,
            unclaimed_funds_swept: false,
            mode: ClaimMode::Direct,
        }
    }

    #[test]
    fn test_upsert_and_get() {
        let conn = test_db();
        let mut stored = season(1);
        upsert(&conn, &stored).expect("insert");
        assert_eq!(get(&conn, 1).expect("get"), stored);

        stored.unclaimed_funds_swept = true;
        upsert(&conn, &stored).expect("update");
        assert!(get(&conn, 1).expect("get").unclaimed_funds_swept);
        assert_eq!(current_index(&conn).expect("index"), 1);
    }

    #[test]
    fn test_merkle_season() {
        let conn = test_db();
        let stored = Season {
            open_window_end: None,
            mode: ClaimMode::Merkle {
                merkle_root: [7u8; 32],
            },
            ..season(1)
        };
        upsert(&conn, &stored).expect("insert");
        assert_eq!(list(&conn).expect("list"), vec![stored]);
    }

    #[test]
    fn test_get_missing() {
        let conn = test_db();
        assert_eq!(current_index(&conn).expect("index"), 0);
        assert!(matches!(get(&conn, 3), Err(DbError::NotFound(_))));
    }
}
