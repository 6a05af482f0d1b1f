//! # File Server - Entry Point
//! src/main.rs
//!
//! Parsea los argumentos, configura los logs y corre el loop de accept.
//! Los logs de diagnóstico y la auditoría van a stderr.

use file_server::config::Config;
use file_server::server::Server;
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let config = Config::new();

    tracing_subscriber::fmt()
        .with_max_level(config.log_level.as_tracing())
        .with_writer(std::io::stderr)
        .with_thread_names(true)
        .init();

    config.print_summary();

    let server = match Server::bind(&config) {
        Ok(server) => server,
        Err(e) => {
            error!("💥 {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run() {
        error!("💥 Error fatal: {}", e);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
