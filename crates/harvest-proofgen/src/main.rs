//! Allow-list proof generator.
//!
//! Turns an allow-list of `(recipient, amount)` entries into the Merkle
//! root and declared total an admin opens an allow-list season with, plus
//! the per-recipient proofs recipients claim with.
//!
//! Usage:
//!   harvest-proofgen <allow-list.json> [--out proofs.json]
//!   harvest-proofgen --verify <proofs.json>
//!
//! The log level comes from `[logging] log_level` in the ledger config
//! (`$HARVEST_CONFIG` or `harvest.toml`); `RUST_LOG` adds directives.
//!
//! Input format:
//!
//! ```json
//! { "entries": [ { "recipient": "0x0a0a…", "amount": "10" } ] }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use harvest_crypto::merkle::{reward_leaf, verify, RewardTree};
use harvest_ledger::LedgerConfig;
use harvest_types::{Address, Amount, Hash};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as, DisplayFromStr};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Serialize, Deserialize)]
struct AllowList {
    entries: Vec<AllowListEntry>,
}

#[serde_as]
#[derive(Debug, Serialize, Deserialize)]
struct AllowListEntry {
    #[serde_as(as = "DisplayFromStr")]
    recipient: Address,
    #[serde_as(as = "DisplayFromStr")]
    amount: Amount,
}

#[serde_as]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ProofSet {
    #[serde_as(as = "Hex")]
    merkle_root: Hash,
    #[serde_as(as = "DisplayFromStr")]
    total_rewards: Amount,
    /// Keyed by `0x`-prefixed recipient address.
    claims: BTreeMap<String, RecipientProof>,
}

#[serde_as]
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RecipientProof {
    #[serde_as(as = "DisplayFromStr")]
    amount: Amount,
    #[serde_as(as = "Vec<Hex>")]
    proof: Vec<Hash>,
}

enum Command {
    Generate { input: PathBuf, out: Option<PathBuf> },
    Verify { path: PathBuf },
}

fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut verify = false;
    let mut out = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--verify" => verify = true,
            "--out" | "-o" => {
                let path = iter.next().context("--out requires a path")?;
                out = Some(PathBuf::from(path));
            }
            other if other.starts_with('-') => bail!("unknown flag {other}"),
            other => positional.push(PathBuf::from(other)),
        }
    }

    let [path] = <[PathBuf; 1]>::try_from(positional).map_err(|_| {
        anyhow::anyhow!("usage: harvest-proofgen <allow-list.json> [--out proofs.json] | --verify <proofs.json>")
    })?;

    Ok(if verify {
        Command::Verify { path }
    } else {
        Command::Generate { input: path, out }
    })
}

fn generate(allow_list: &AllowList) -> anyhow::Result<ProofSet> {
    let entries = allow_list
        .entries
        .iter()
        .map(|entry| (entry.recipient, entry.amount))
        .collect();
    let tree = RewardTree::new(entries)?;
    let total_rewards = tree.total()?;
    if total_rewards == 0 {
        bail!("allow-list total is zero; a season needs a non-zero total");
    }

    let mut claims = BTreeMap::new();
    for (recipient, _) in tree.entries() {
        let (amount, proof) = tree
            .proof_for(recipient)
            .with_context(|| format!("no proof for {recipient}"))?;
        claims.insert(recipient.to_string(), RecipientProof { amount, proof });
    }

    Ok(ProofSet {
        merkle_root: tree.root(),
        total_rewards,
        claims,
    })
}

/// Check every proof against the root and the total against the amounts.
fn check(proofs: &ProofSet) -> anyhow::Result<()> {
    let mut sum: Amount = 0;
    for (recipient, claim) in &proofs.claims {
        let address: Address = recipient
            .parse()
            .with_context(|| format!("bad recipient {recipient}"))?;
        if !verify(&claim.proof, &proofs.merkle_root, &reward_leaf(&address, claim.amount)) {
            bail!("proof for {recipient} does not match the root");
        }
        sum = sum
            .checked_add(claim.amount)
            .context("claim amounts overflow")?;
    }
    if sum != proofs.total_rewards {
        bail!(
            "declared total {} does not match the sum of claims {sum}",
            proofs.total_rewards
        );
    }
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

/// `RUST_LOG` directives plus `harvest=<log_level>`.
fn log_filter(log_level: &str) -> anyhow::Result<EnvFilter> {
    let level: LevelFilter = log_level
        .parse()
        .with_context(|| format!("invalid log level {log_level:?}"))?;
    Ok(EnvFilter::from_default_env().add_directive(format!("harvest={level}").parse()?))
}

fn main() -> anyhow::Result<()> {
    let config = LedgerConfig::load_default()?;
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(log_filter(&config.logging.log_level)?)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match parse_args(&args)? {
        Command::Generate { input, out } => {
            let allow_list: AllowList = read_json(&input)?;
            let proofs = generate(&allow_list)?;
            check(&proofs)?;
            info!(
                recipients = proofs.claims.len(),
                total_rewards = proofs.total_rewards,
                merkle_root = %hex::encode(proofs.merkle_root),
                "proof set generated"
            );

            let json = serde_json::to_string_pretty(&proofs)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("writing {}", path.display()))?;
                    eprintln!("Wrote proofs for {} recipients to {}", proofs.claims.len(), path.display());
                }
                None => println!("{json}"),
            }
        }
        Command::Verify { path } => {
            let proofs: ProofSet = read_json(&path)?;
            check(&proofs)?;
            eprintln!("All {} proofs verified successfully.", proofs.claims.len());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_from_config_level() {
        for level in ["trace", "debug", "info", "warn", "error", "off"] {
            let filter = log_filter(level).expect("valid level");
            assert!(filter.to_string().contains("harvest="), "{filter}");
        }
        assert!(log_filter("loud").is_err());
    }

    fn allow_list() -> AllowList {
        serde_json::from_str(
            r#"{ "entries": [
                { "recipient": "0x0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a0a", "amount": "10" },
                { "recipient": "0x0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b", "amount": "20" },
                { "recipient": "0x0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c", "amount": "30" }
            ] }"#,
        )
        .expect("allow-list json")
    }

    #[test]
    fn test_generate_and_check() {
        let proofs = generate(&allow_list()).expect("generate");
        assert_eq!(proofs.total_rewards, 60);
        assert_eq!(proofs.claims.len(), 3);
        check(&proofs).expect("self-check");

        let b = Address::repeat(0xB).to_string();
        assert_eq!(proofs.claims[&b].amount, 20);
    }

    #[test]
    fn test_json_round_trip() {
        let proofs = generate(&allow_list()).expect("generate");
        let json = serde_json::to_string(&proofs).expect("serialize");
        let parsed: ProofSet = serde_json::from_str(&json).expect("parse");
        assert_eq!(parsed, proofs);
    }

    #[test]
    fn test_tampering_detected() {
        let mut proofs = generate(&allow_list()).expect("generate");
        proofs.total_rewards = 61;
        assert!(check(&proofs).is_err());

        let mut proofs = generate(&allow_list()).expect("generate");
        let b = Address::repeat(0xB).to_string();
        if let Some(claim) = proofs.claims.get_mut(&b) {
            claim.amount = 25;
        }
        assert!(check(&proofs).is_err());
    }

    #[test]
    fn test_parse_args() {
        let args = |list: &[&str]| list.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(matches!(
            parse_args(&args(&["list.json", "--out", "p.json"])),
            Ok(Command::Generate { out: Some(_), .. })
        ));
        assert!(matches!(
            parse_args(&args(&["--verify", "p.json"])),
            Ok(Command::Verify { .. })
        ));
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["a.json", "b.json"])).is_err());
        assert!(parse_args(&args(&["--bogus", "a.json"])).is_err());
    }
}
