//! Integration test: `$HARVEST_CONFIG` points the ledger at a config file.
//!
//! Kept in its own test binary since it mutates the process environment.

use std::path::PathBuf;

use harvest_ledger::{LedgerConfig, CONFIG_ENV_VAR};

#[test]
fn test_env_var_selects_config_file() {
    let path = std::env::temp_dir().join(format!(
        "harvest-config-{}-{}.toml",
        std::process::id(),
        rand::random::<u32>()
    ));
    std::fs::write(
        &path,
        r#"
        [ledger]
        max_batch_size = 25
        require_funded_merkle_seasons = false

        [storage]
        db_path = "/srv/harvest/ledger.db"

        [logging]
        log_level = "debug"
        "#,
    )
    .expect("write config");

    std::env::set_var(CONFIG_ENV_VAR, &path);
    let loaded = LedgerConfig::load_default();
    std::env::remove_var(CONFIG_ENV_VAR);
    let _ = std::fs::remove_file(&path);

    let config = loaded.expect("load");
    assert_eq!(config.ledger.max_batch_size, 25);
    assert!(!config.ledger.require_funded_merkle_seasons);
    assert_eq!(
        config.storage.db_path(),
        Some(PathBuf::from("/srv/harvest/ledger.db"))
    );
    assert_eq!(config.logging.log_level, "debug");

    // A pointer at a missing file falls back to defaults.
    std::env::set_var(CONFIG_ENV_VAR, path.with_extension("missing"));
    let fallback = LedgerConfig::load_default();
    std::env::remove_var(CONFIG_ENV_VAR);
    assert_eq!(fallback.expect("defaults").logging.log_level, "info");
}
