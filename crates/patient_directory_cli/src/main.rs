//! Command-line entry point for the patient directory.
//!
//! # Usage
//! - No arguments: print core linkage info.
//! - `<db-path> <query> [config.json]`: run a composite patient search as an
//!   administrator and print matches as JSON.
//!
//! Set `PATIENT_DIRECTORY_LOG_DIR` to an absolute directory to keep rolling
//! logs of the search run.

use patient_directory_core::db::open_db;
use patient_directory_core::{
    default_log_level, init_logging, DirectoryConfig, PatientService, SessionContext,
    SqlitePatientRepository,
};
use std::error::Error;
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "PATIENT_DIRECTORY_LOG_DIR";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [] => {
            println!(
                "patient_directory_core ping={}",
                patient_directory_core::ping()
            );
            println!(
                "patient_directory_core version={}",
                patient_directory_core::core_version()
            );
            ExitCode::SUCCESS
        }
        [db_path, query] => report(run_search(db_path, query, None)),
        [db_path, query, config_path] => report(run_search(db_path, query, Some(config_path))),
        _ => {
            eprintln!("usage: patient_directory_cli [<db-path> <query> [config.json]]");
            ExitCode::from(2)
        }
    }
}

fn run_search(
    db_path: &str,
    query: &str,
    config_path: Option<&String>,
) -> Result<String, Box<dyn Error>> {
    let config = match config_path {
        Some(path) => DirectoryConfig::load(path)?,
        None => DirectoryConfig::default(),
    };

    if let Some(log_dir) = configured_log_dir(std::env::var(LOG_DIR_ENV).ok()) {
        init_logging(default_log_level(), &log_dir)?;
    }

    let conn = open_db(db_path)?;
    let repo = SqlitePatientRepository::with_config(&conn, config.clone());
    let service = PatientService::with_config(repo, config);
    let session = SessionContext::superuser("cli");

    let patients = service.find_patients(&session, query, false)?;
    Ok(serde_json::to_string_pretty(&patients)?)
}

fn configured_log_dir(raw: Option<String>) -> Option<String> {
    raw.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn report(result: Result<String, Box<dyn Error>>) -> ExitCode {
    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
