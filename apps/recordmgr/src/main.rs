//! Record manager demo CLI.
//!
//! Loads `recordmgr.toml`, wires up the storage stack, and runs a short
//! scripted demonstration of insert/get/update/remove against it before
//! persisting state back to disk.

use crate::config::EngineConfig;
use crate::engine_environment::EngineEnvironment;
use std::error::Error;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

mod config;
mod engine_environment;

fn main() {
    let cfg = match EngineConfig::load_from_file("recordmgr.toml") {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };

    let _logging_guard = match init_logging(&cfg.storage.logs_dir) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {e}");
            std::process::exit(2);
        }
    };

    let mut env = EngineEnvironment::new(cfg);

    run_demo(&mut env);

    env.persist();
    tracing::info!("shutdown complete");
}

/// Inserts a few records, reads one back, updates one in place, removes one,
/// and reports the manager's size — enough to exercise the whole surface
/// without needing a client protocol.
fn run_demo(env: &mut EngineEnvironment) {
    let manager = &mut env.manager;

    let first = manager
        .insert(b"hello, record manager")
        .expect("insert failed");
    let second = manager.insert(b"a second record").expect("insert failed");
    tracing::info!(?first, ?second, "inserted two records");

    let fetched = manager.get(first).expect("get failed");
    tracing::info!(bytes = ?String::from_utf8_lossy(&fetched), "fetched first record");

    manager
        .update(second, b"a second record, now grown a good deal longer than before")
        .expect("update failed");
    tracing::info!("updated second record in place or via relocation");

    manager.remove(first).expect("remove failed");
    tracing::info!("removed first record");

    tracing::info!(
        size = manager.size(),
        pages = manager.number_of_pages(),
        "current manager state"
    );

    manager.check_consistency().expect("consistency check failed");
}

/// Sets up console (human-readable) and daily-rolling-file (JSON) logging
/// layers, same split the storage engine this is built on uses.
pub fn init_logging(log_dir: &Path) -> Result<WorkerGuard, Box<dyn Error + Send + Sync>> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "recordmgr.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let console_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(false)
        .with_level(true)
        .compact();

    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .json()
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
