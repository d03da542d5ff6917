//! dialcache CLI entrypoint.

use clap::Parser;
use console::style;
use dialcache_cache::FilesystemProvider;
use dialcache_core::InvocationConfig;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod handlers;

#[cfg(test)]
mod handlers_tests;

use commands::{Cli, Commands};
use config::Settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = hint_for(e.as_ref()) {
                eprintln!("{} {}", style("Hint:").cyan(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let invocation = InvocationConfig::from_env()?;
    let settings = Settings::resolve(&cli, invocation)?;
    let provider = FilesystemProvider::new(settings.cache_dir.clone());

    match cli.command {
        Commands::Restore => {
            handlers::restore(&provider, &settings).await?;
        }
        Commands::Save => {
            handlers::save(&provider, &settings).await?;
        }
    }

    Ok(())
}

/// Advice for failures caused by the invocation rather than the store.
fn hint_for(err: &(dyn std::error::Error + 'static)) -> Option<&'static str> {
    let err = err.downcast_ref::<dialcache_core::Error>()?;
    if !err.is_validation() {
        return None;
    }
    Some(match err {
        dialcache_core::Error::NoMatchingPaths(_) => {
            "run dialyzer before saving, or point --workspace at the project root"
        }
        _ => "check CACHE_KEY, OTP_PREFIX and SYSTEM_PREFIX",
    })
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "dialcache=info",
            1 => "dialcache=debug",
            _ => "dialcache=trace",
        })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
