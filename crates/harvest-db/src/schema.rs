//! SQL schema definitions.

/// Complete schema for the v1 ledger database.
pub const SCHEMA_V1: &str = r#"
-- Season arena, indexed from 1 with no gaps.
CREATE TABLE IF NOT EXISTS seasons (
    season_index INTEGER PRIMARY KEY CHECK (season_index >= 1),
    default_destination BLOB NOT NULL,
    open_window_end INTEGER,
    claim_window_end INTEGER NOT NULL,
    total_rewards TEXT NOT NULL,
    claimed_rewards TEXT NOT NULL,
    reward_count INTEGER NOT NULL DEFAULT 0,
    unclaimed_funds_swept INTEGER NOT NULL DEFAULT 0,
    claim_mode TEXT NOT NULL CHECK (claim_mode IN ('direct', 'merkle')),
    merkle_root BLOB,
    CHECK ((claim_mode = 'merkle') = (merkle_root IS NOT NULL))
);

-- Direct-mode reward rows. `position` is insertion order within the season.
CREATE TABLE IF NOT EXISTS rewards (
    season_index INTEGER NOT NULL REFERENCES seasons(season_index),
    owner BLOB NOT NULL,
    position INTEGER NOT NULL,
    destination BLOB NOT NULL,
    amount TEXT NOT NULL,
    claimed INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (season_index, owner),
    UNIQUE (season_index, position)
);

-- Allow-list claim flags.
CREATE TABLE IF NOT EXISTS merkle_claims (
    season_index INTEGER NOT NULL REFERENCES seasons(season_index),
    claimant BLOB NOT NULL,
    PRIMARY KEY (season_index, claimant)
);

-- Role membership. `position` is grant order within the role.
CREATE TABLE IF NOT EXISTS role_members (
    role TEXT NOT NULL CHECK (role IN ('admin', 'writer')),
    account BLOB NOT NULL,
    position INTEGER NOT NULL,
    PRIMARY KEY (role, account)
);

CREATE INDEX IF NOT EXISTS idx_rewards_order ON rewards(season_index, position);
"#;
