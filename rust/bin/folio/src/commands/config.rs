//! `folio config show|set`.

use std::path::{Path, PathBuf};

use anyhow::Result;
use folio_client::ClientConfig;

use super::Output;

#[derive(Debug, Default)]
pub struct Changes {
    pub server: Option<String>,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub refresh_leeway_secs: Option<i64>,
    pub session_path: Option<PathBuf>,
}

impl Changes {
    fn is_empty(&self) -> bool {
        self.server.is_none()
            && self.page_size.is_none()
            && self.timeout_secs.is_none()
            && self.refresh_leeway_secs.is_none()
            && self.session_path.is_none()
    }

    fn apply(self, config: &mut ClientConfig) {
        if let Some(server) = self.server {
            config.server = server.trim().trim_end_matches('/').to_string();
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(timeout) = self.timeout_secs {
            config.timeout_secs = timeout;
        }
        if let Some(leeway) = self.refresh_leeway_secs {
            config.refresh_leeway_secs = leeway;
        }
        if let Some(path) = self.session_path {
            config.session_path = path;
        }
    }
}

pub fn show(config_path: &Path, output: Output) -> Result<()> {
    let config = ClientConfig::load(config_path)?;
    match output {
        Output::Json => super::print_json(&serde_json::to_value(&config)?)?,
        Output::Table => {
            println!("Config:    {}", config_path.display());
            println!("Server:    {}", config.server);
            println!("Session:   {}", config.session_path.display());
            println!("Timeout:   {}s", config.timeout_secs);
            println!("Leeway:    {}s", config.refresh_leeway_secs);
            println!("Page size: {}", config.page_size);
        }
    }
    Ok(())
}

pub fn set(config_path: &Path, changes: Changes) -> Result<()> {
    if changes.is_empty() {
        anyhow::bail!("Nothing to set. See `folio config set --help`.");
    }
    if changes.page_size == Some(0) {
        anyhow::bail!("Page size must be at least 1.");
    }

    let mut config = ClientConfig::load(config_path)?;
    changes.apply(&mut config);
    config.validate()?;
    config.save(config_path)?;
    println!("Saved {}.", config_path.display());
    Ok(())
}
