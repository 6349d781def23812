//! pullq HTTP client binary

use clap::Parser;
use pullq::telemetry;
use pullq_http::{
    ClientConfig, PullqClient,
    cli::{Cli, handle_cli_command},
};
use std::process::ExitCode;
use std::time::Duration;

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init_with_default_filter("warn");
    let cli = Cli::parse();

    let mut config = ClientConfig::new(&cli.url);
    if let Some(secs) = cli.timeout {
        config = config.with_timeout(Duration::from_secs(secs));
    }

    let result = match PullqClient::with_config(config) {
        Ok(client) => handle_cli_command(&client, cli.command).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            match serde_json::to_string_pretty(&output) {
                Ok(text) => println!("{text}"),
                Err(_) => println!("{output}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
