pub mod config;
pub mod resource;
pub mod session;

use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use folio_client::{ClientConfig, Folio};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Output {
    Table,
    Json,
}

/// Load config and open the stored session.
pub fn open(config_path: &Path) -> Result<(ClientConfig, Folio)> {
    let config = ClientConfig::load(config_path)?;
    tracing::debug!(server = %config.server, session = %config.session_path.display(), "opening client");
    let folio = Folio::open(&config)
        .with_context(|| format!("opening session store {}", config.session_path.display()))?;
    Ok((config, folio))
}

pub fn prompt(label: &str) -> Result<String> {
    eprint!("{label}");
    std::io::stderr().flush()?;
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn confirm(label: &str) -> Result<bool> {
    Ok(prompt(label)?.eq_ignore_ascii_case("y"))
}

/// `--json` or `-f <file>`, exactly one of them.
pub fn read_body(json_body: Option<String>, file: Option<String>) -> Result<String> {
    match (json_body, file) {
        (Some(json), None) => Ok(json),
        (None, Some(path)) => std::fs::read_to_string(&path).with_context(|| format!("reading {path}")),
        (Some(_), Some(_)) => anyhow::bail!("Provide either --json or -f <file>, not both."),
        (None, None) => anyhow::bail!("Provide --json or -f <file>."),
    }
}

pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
