//! Command line probe for the Alvin storage backends.
//!
//! # Responsibility
//! - Read places from Fedora and users from the user database using the
//!   process environment as configuration.
//! - Print records as JSON on stdout; errors go to stderr with exit code 1.

use alvin_storage_core::{
    core_version, init_logging_from_config, DataGroup, FedoraRecordStorage, RecordStorage,
    ReqwestHttpClient, SqlUserStorage, SqliteRecordReader, StorageConfig,
};
use log::info;
use std::process::ExitCode;
use std::sync::Arc;

const USAGE: &str = "usage: alvin_storage_cli <read-place <pid> | list-places | read-user <id> | list-users | version>";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<String, String> {
    let command = args.first().map(String::as_str).ok_or(USAGE)?;
    if command == "version" {
        return Ok(format!("alvin_storage_core version={}", core_version()));
    }

    let config = StorageConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config).map_err(|err| err.to_string())?;
    info!("event=cli_command module=cli status=start command={command}");

    let empty_filter = DataGroup::new("filter");
    match (command, args.get(1)) {
        ("read-place", Some(pid)) => {
            let record = fedora_storage(&config)?
                .read("place", pid)
                .map_err(|err| err.to_string())?;
            to_json(&record)
        }
        ("list-places", None) => {
            let result = fedora_storage(&config)?
                .read_list("place", &empty_filter)
                .map_err(|err| err.to_string())?;
            to_json(&result)
        }
        ("read-user", Some(id)) => {
            let record = user_storage(&config)?
                .read("user", id)
                .map_err(|err| err.to_string())?;
            to_json(&record)
        }
        ("list-users", None) => {
            let result = user_storage(&config)?
                .read_abstract_list("user", &empty_filter)
                .map_err(|err| err.to_string())?;
            to_json(&result)
        }
        _ => Err(USAGE.to_string()),
    }
}

fn fedora_storage(config: &StorageConfig) -> Result<FedoraRecordStorage, String> {
    let http = ReqwestHttpClient::new().map_err(|err| err.to_string())?;
    Ok(FedoraRecordStorage::with_default_converters(
        config.fedora.clone(),
        Arc::new(http),
    ))
}

fn user_storage(config: &StorageConfig) -> Result<SqlUserStorage<SqliteRecordReader>, String> {
    let reader = SqliteRecordReader::open(&config.user_db).map_err(|err| err.to_string())?;
    Ok(SqlUserStorage::new(reader))
}

fn to_json(value: &impl serde::Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}
