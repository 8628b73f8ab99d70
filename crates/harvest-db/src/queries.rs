//! Database query functions organized by table.

pub mod claims;
pub mod rewards;
pub mod roles;
pub mod seasons;

use harvest_types::{Address, Amount, Hash};
use rusqlite::types::Type;
use rusqlite::Row;

/// Read a 32-byte BLOB column.
pub(crate) fn hash_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Hash> {
    let bytes: Vec<u8> = row.get(idx)?;
    Hash::try_from(bytes.as_slice()).map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Blob,
            format!("expected 32 bytes, found {}", bytes.len()).into(),
        )
    })
}

pub(crate) fn address_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Address> {
    hash_at(row, idx).map(Address::new)
}

/// Read a decimal TEXT amount column.
pub(crate) fn amount_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Amount> {
    let text: String = row.get(idx)?;
    text.parse::<Amount>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Read a non-negative INTEGER column as `u64`.
pub(crate) fn u64_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

/// Store a `u64` in an INTEGER column.
pub(crate) fn to_sql_u64(value: u64) -> rusqlite::Result<i64> {
    i64::try_from(value).map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}
