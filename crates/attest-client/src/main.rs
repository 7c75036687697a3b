//! Attestation Client Binary
//!
//! Requests a token placement for this Mac and waits for the MDM to deposit
//! the token. Must run as root to read the token file.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use attest_client::{set_token, FixedSerial, TokenClient};

/// Retrieve an attestation token through the MDM
#[derive(Parser)]
#[command(name = "attest-client", version, about)]
struct Cli {
    /// Placement endpoint, e.g. https://attest.example.com/v1/attest/place
    #[arg(long, env = "ATTEST_PLACE_URL")]
    url: String,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 300)]
    timeout: u64,

    /// Protected endpoint to call with the retrieved token
    #[arg(long)]
    hello_url: Option<String>,

    /// Use this serial number instead of reading it from ioreg
    #[arg(long, hide = true)]
    serial: Option<String>,

    #[arg(long, env = "ATTEST_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level.parse().unwrap_or(Level::INFO))
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Attestation failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut client = TokenClient::new()?;
    if let Some(serial) = cli.serial {
        client = client.with_serial_source(Arc::new(FixedSerial(serial)));
    }

    let token = client.get_token(&cli.url, Duration::from_secs(cli.timeout)).await?;

    match cli.hello_url {
        Some(url) => {
            let response = set_token(reqwest::Client::new().get(&url), &token).send().await?;
            let status = response.status();
            let body = response.text().await?;
            info!(status = status.as_u16(), "Protected endpoint answered");
            println!("{}", body);
        }
        None => println!("{}", token),
    }

    Ok(())
}
