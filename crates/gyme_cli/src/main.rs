//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `gyme_core` linkage, configuration and database bootstrap.
//! - Print deterministic `key=value` lines for quick sanity checks.

use gyme_core::db::migrations::current_user_version;
use gyme_core::{core_version, init_from_config, open_db, ping, CoreConfig};
use log::info;
use std::process::ExitCode;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("gyme error={message}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    let file_logging = init_from_config(&config)?;

    println!("gyme_core ping={}", ping());
    println!("gyme_core version={}", core_version());
    println!("gyme_core file_logging={file_logging}");

    let conn = open_db(&config.db_path)
        .map_err(|err| format!("open `{}` failed: {err}", config.db_path.display()))?;
    let schema_version = current_user_version(&conn).map_err(|err| err.to_string())?;
    println!("gyme_core db_path={}", config.db_path.display());
    println!("gyme_core schema_version={schema_version}");

    info!("event=cli_smoke module=cli status=ok schema_version={schema_version}");
    Ok(())
}
