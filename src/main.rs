use api_fixture_validator::{load_fixtures, ValidationEngine};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Validate recorded API fixtures against a RAML-derived JSON contract
#[derive(Debug, Parser)]
#[command(name = "api-fixture-validator", version)]
struct Cli {
    /// Contract document (JSON, or YAML by extension)
    #[arg(long, env = "FIXTURE_CONTRACT")]
    contract: PathBuf,

    /// Ordered whitelist of exempt routes
    #[arg(long, env = "FIXTURE_WHITELIST")]
    whitelist: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text", env = "FIXTURE_LOG_FORMAT")]
    log_format: LogFormat,

    /// Fixture files, each holding one fixture or an array of them
    #[arg(required = true)]
    fixtures: Vec<PathBuf>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let engine = match ValidationEngine::from_files(&cli.contract, cli.whitelist.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            error!(error = %e, "failed to initialise validator");
            return ExitCode::from(2);
        }
    };

    let mut failures = 0usize;
    let mut checked = 0usize;
    for path in &cli.fixtures {
        let fixtures = match load_fixtures(path) {
            Ok(fixtures) => fixtures,
            Err(e) => {
                failures += 1;
                println!("{}", json!({ "error": e.to_string() }));
                continue;
            }
        };

        for fixture in &fixtures {
            checked += 1;
            let line = match engine.validate(fixture) {
                Ok(verdict) if verdict.is_exempt() => json!({ "warning": verdict.message() }),
                Ok(verdict) => json!({ "message": verdict.message() }),
                Err(e) => {
                    failures += 1;
                    json!({ "error": e.to_string() })
                }
            };
            println!("{}", line);
        }
    }

    info!(checked, failures, "validation finished");
    if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
