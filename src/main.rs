use std::process::ExitCode;

use clap::Parser;
use snapverify::cli::extract::ExtractCommandOutput;
use snapverify::cli::verify::{VerifyCommandOutput, VerifyRun};
use snapverify::cli::{Cli, Commands};
use snapverify::error::SnapverifyError;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(cli.verbose))),
        )
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok((output, success)) => {
            println!("{output}");
            if success {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            tracing::debug!(%error, "command failed");
            let serialized = serde_json::to_string_pretty(&error.to_error_response()).unwrap_or_else(
                |_| {
                    "{\"error\":{\"type\":\"serialization_error\",\"message\":\"Failed to serialize error response\"}}"
                        .to_string()
                },
            );
            println!("{serialized}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(String, bool), SnapverifyError> {
    match cli.command {
        Commands::Verify(args) => {
            let VerifyRun { output, success } = snapverify::cli::verify::run_verify(args)?;
            let rendered = match output {
                VerifyCommandOutput::Text(output) => output,
                VerifyCommandOutput::Json(response) => serde_json::to_string_pretty(&response)
                    .map_err(|source| SnapverifyError::ResponseSerialization { source })?,
            };
            Ok((rendered, success))
        }
        Commands::Extract(args) => match snapverify::cli::extract::run_extract(args)? {
            ExtractCommandOutput::Text(output) => Ok((output, true)),
            ExtractCommandOutput::Json(response) => serde_json::to_string_pretty(&response)
                .map(|rendered| (rendered, true))
                .map_err(|source| SnapverifyError::ResponseSerialization { source }),
        },
    }
}

fn directive_for_verbosity(v: u8) -> &'static str {
    match v {
        0 => "snapverify=warn",
        1 => "snapverify=debug",
        _ => "snapverify=trace",
    }
}
