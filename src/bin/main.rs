//! script-bridge CLI
//!
//! Evaluates a controller script with the built-in interpreter and calls its
//! methods, pumping asynchronous ones to completion.

use std::process::ExitCode;

use script_bridge::cli;

#[tokio::main]
async fn main() -> ExitCode {
    match cli::run_cli().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(cli::exit_code(&e))
        }
    }
}
