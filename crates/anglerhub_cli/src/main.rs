//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `anglerhub_core` linkage and the
//!   local profile store.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `anglerhub_cli [profile <identity-id> | lakes [query]]`

use anglerhub_core::{
    core_version, init_logging, CatchStore, CoreConfig, ProfileStore, SqliteCatchStore,
    SqliteProfileStore,
};
use log::info;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = CoreConfig::from_env();
    if let Some(log_dir) = &config.log_dir {
        if let Err(err) = init_logging(&config.log_level, log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    println!("anglerhub_core version={}", core_version());

    let store = match SqliteProfileStore::open(&config.profile_db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!(
                "failed to open profile store `{}`: {err}",
                config.profile_db_path.display()
            );
            return ExitCode::FAILURE;
        }
    };
    info!("event=cli_start module=cli status=ok");

    match store.count_profiles() {
        Ok(count) => println!("profiles={count}"),
        Err(err) => {
            eprintln!("failed to count profiles: {err}");
            return ExitCode::FAILURE;
        }
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => ExitCode::SUCCESS,
        [command, id] if command == "profile" => print_profile(&store, id).await,
        [command] if command == "lakes" => print_lakes(&config.profile_db_path, "").await,
        [command, query] if command == "lakes" => {
            print_lakes(&config.profile_db_path, query).await
        }
        _ => {
            eprintln!("usage: anglerhub_cli [profile <identity-id> | lakes [query]]");
            ExitCode::FAILURE
        }
    }
}

async fn print_profile(store: &SqliteProfileStore, id: &str) -> ExitCode {
    let profile = match store.read_profile(id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            eprintln!("no profile for `{id}`");
            return ExitCode::FAILURE;
        }
        Err(err) => {
            eprintln!("failed to read profile: {err}");
            return ExitCode::FAILURE;
        }
    };

    match serde_json::to_string_pretty(&profile) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to encode profile: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn print_lakes(db_path: &std::path::Path, query: &str) -> ExitCode {
    let lakes = match SqliteCatchStore::open(db_path) {
        Ok(store) => store.list_lakes().await,
        Err(err) => {
            eprintln!("failed to open catch store `{}`: {err}", db_path.display());
            return ExitCode::FAILURE;
        }
    };
    match lakes {
        Ok(lakes) => {
            for lake in lakes.iter().filter(|lake| lake.matches_search(query)) {
                println!("{}\t{}", lake.id, lake.name);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to list lakes: {err}");
            ExitCode::FAILURE
        }
    }
}
