//! Whole-ledger save and load.
//!
//! `save` rewrites the stored state inside one transaction, so a failed
//! save leaves the previous state intact.

use std::collections::BTreeMap;

use harvest_types::snapshot::LedgerSnapshot;
use harvest_types::SeasonIndex;
use rusqlite::Connection;

use crate::queries::{claims, rewards, roles, seasons};
use crate::Result;

/// Persist `snapshot`, replacing whatever was stored before.
pub fn save(conn: &mut Connection, snapshot: &LedgerSnapshot) -> Result<()> {
    let tx = conn.transaction()?;
    tx.execute_batch("DELETE FROM merkle_claims; DELETE FROM rewards; DELETE FROM seasons;")?;

    for season in &snapshot.seasons {
        seasons::upsert(&tx, season)?;
    }

    let mut positions: BTreeMap<SeasonIndex, u64> = BTreeMap::new();
    for record in &snapshot.rewards {
        let position = positions.entry(record.season_index).or_insert(0);
        rewards::upsert(&tx, record, *position)?;
        *position += 1;
    }

    for mark in &snapshot.merkle_claims {
        claims::insert(&tx, mark)?;
    }
    roles::replace_all(&tx, &snapshot.roles)?;

    tx.commit()?;
    tracing::debug!(
        seasons = snapshot.seasons.len(),
        rewards = snapshot.rewards.len(),
        merkle_claims = snapshot.merkle_claims.len(),
        roles = snapshot.roles.len(),
        "ledger snapshot saved"
    );
    Ok(())
}

/// Load the stored state. An empty database yields an empty snapshot.
pub fn load(conn: &Connection) -> Result<LedgerSnapshot> {
    Ok(LedgerSnapshot {
        seasons: seasons::list(conn)?,
        rewards: rewards::list(conn)?,
        merkle_claims: claims::list(conn)?,
        roles: roles::list(conn)?,
    })
}
