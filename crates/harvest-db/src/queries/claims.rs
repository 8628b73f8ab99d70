//! Allow-list claim flag queries.

use harvest_types::snapshot::ClaimMark;
use harvest_types::{Address, SeasonIndex};
use rusqlite::Connection;

use super::{address_at, to_sql_u64, u64_at};
use crate::Result;

/// Set a claim flag. Setting it twice is a no-op.
pub fn insert(conn: &Connection, mark: &ClaimMark) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO merkle_claims (season_index, claimant) VALUES (?1, ?2)",
        rusqlite::params![
            to_sql_u64(mark.season_index)?,
            mark.claimant.as_bytes().as_slice()
        ],
    )?;
    Ok(())
}

pub fn has_claimed(conn: &Connection, season_index: SeasonIndex, claimant: &Address) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM merkle_claims WHERE season_index = ?1 AND claimant = ?2",
        rusqlite::params![to_sql_u64(season_index)?, claimant.as_bytes().as_slice()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Every flag, ordered by season then address.
pub fn list(conn: &Connection) -> Result<Vec<ClaimMark>> {
    let mut stmt = conn.prepare(
        "SELECT season_index, claimant FROM merkle_claims ORDER BY season_index, claimant",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ClaimMark {
                season_index: u64_at(row, 0)?,
                claimant: address_at(row, 1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::seasons;
    use harvest_types::season::{ClaimMode, Season};

    #[test]
    fn test_flags() {
        let conn = crate::open_memory().expect("open test db");
        seasons::upsert(
            &conn,
            &Season {
                index: 1,
                default_destination: Address::repeat(0xDE),
                claim_window_end: 10,
                total_rewards: 60,
                mode: ClaimMode::Merkle {
                    merkle_root: [1u8; 32],
                },
                ..Season::default()
            },
        )
        .expect("season");

        let mark = ClaimMark {
            season_index: 1,
            claimant: Address::repeat(0xB),
        };
        assert!(!has_claimed(&conn, 1, &mark.claimant).expect("query"));
        insert(&conn, &mark).expect("insert");
        insert(&conn, &mark).expect("second insert is a no-op");
        assert!(has_claimed(&conn, 1, &mark.claimant).expect("query"));
        assert_eq!(list(&conn).expect("list"), vec![mark]);
    }
}
