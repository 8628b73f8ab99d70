//! Role membership queries.

use harvest_types::access::Role;
use harvest_types::snapshot::RoleGrant;
use rusqlite::types::Type;
use rusqlite::Connection;

use super::{address_at, to_sql_u64};
use crate::Result;

/// Replace the whole membership table with `grants`, keeping their order.
pub fn replace_all(conn: &Connection, grants: &[RoleGrant]) -> Result<()> {
    conn.execute("DELETE FROM role_members", [])?;
    let mut stmt =
        conn.prepare("INSERT INTO role_members (role, account, position) VALUES (?1, ?2, ?3)")?;
    for (position, grant) in grants.iter().enumerate() {
        stmt.execute(rusqlite::params![
            grant.role.as_str(),
            grant.account.as_bytes().as_slice(),
            to_sql_u64(position as u64)?,
        ])?;
    }
    Ok(())
}

/// All grants in stored order.
pub fn list(conn: &Connection) -> Result<Vec<RoleGrant>> {
    let mut stmt = conn.prepare("SELECT role, account FROM role_members ORDER BY position")?;
    let rows = stmt
        .query_map([], |row| {
            let role: String = row.get(0)?;
            let role = role.parse::<Role>().map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
            })?;
            Ok(RoleGrant {
                role,
                account: address_at(row, 1)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvest_types::Address;

    #[test]
    fn test_replace_all_keeps_order() {
        let conn = crate::open_memory().expect("open test db");
        let grants = vec![
            RoleGrant {
                role: Role::Admin,
                account: Address::repeat(0xAD),
            },
            RoleGrant {
                role: Role::Writer,
                account: Address::repeat(0x02),
            },
            RoleGrant {
                role: Role::Writer,
                account: Address::repeat(0x01),
            },
        ];
        replace_all(&conn, &grants).expect("store");
        assert_eq!(list(&conn).expect("list"), grants);

        replace_all(&conn, &grants[..1]).expect("store");
        assert_eq!(list(&conn).expect("list"), grants[..1].to_vec());
    }
}
