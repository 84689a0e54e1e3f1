use std::path::Path;

use tracing::{info, warn};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://codeclub.db";

/// Database location, overridable through DATABASE_URL.
pub fn database_url() -> String {
    dotenvy::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

pub fn load_environment() -> Result<(), Box<dyn std::error::Error>> {
    let is_production =
        dotenvy::var("APP_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !Path::new(path).exists() {
        warn!("Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}
