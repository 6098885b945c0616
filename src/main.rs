use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use transcript_extractor::cli::{Cli, Commands};
use transcript_extractor::config::Config;
use transcript_extractor::pipeline::{Extraction, ExtractionPipeline};
use transcript_extractor::utils::format_duration;
use transcript_extractor::{server, Error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => match e.downcast::<Error>() {
            Ok(err) => {
                if let Error::Unclassified(detail) = &err {
                    tracing::error!(detail = %detail, "Unclassified failure");
                } else {
                    tracing::debug!(error = %err, "Extraction failed");
                }
                eprintln!("{} {}", style("Error:").red().bold(), err.user_message());
                ExitCode::from(err.exit_code())
            }
            Err(other) => {
                tracing::error!(error = ?other, "Command failed");
                eprintln!("{} {:#}", style("Error:").red().bold(), other);
                ExitCode::FAILURE
            }
        },
    }
}

/// Logs go to stderr; `RUST_LOG` takes precedence over `-v`
fn init_tracing(verbose: u8, json: bool) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("transcript_extractor={}", default_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    let mut config = match cli.command {
        // Initializing a config file that does not exist yet
        Commands::Config { show: false } if config_path.is_some_and(|p| !p.exists()) => Config::default(),
        _ => Config::load(config_path)?,
    };

    match cli.command {
        Commands::Extract {
            reference,
            lang,
            output_dir,
        } => {
            if let Some(dir) = output_dir {
                config.output.directory = Some(dir);
            }

            let pipeline = ExtractionPipeline::new(&config)?;
            let spinner = spinner(cli.quiet, &reference);

            let result = pipeline.run(&reference, lang.as_ref()).await;
            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let extraction = result?;
            print_summary(&extraction, cli.quiet);
        }
        Commands::Config { show } => {
            if show {
                config.display();
            } else {
                let path = config
                    .save(config_path)
                    .context("Failed to initialize configuration")?;
                println!("Configuration written to: {}", path.display());
            }
        }
        Commands::Serve { host, port } => {
            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);

            let pipeline = ExtractionPipeline::new(&config)?;
            server::run_server(pipeline, &host, port).await?;
        }
    }

    Ok(())
}

fn spinner(quiet: bool, reference: &str) -> Option<ProgressBar> {
    if quiet || !Term::stderr().is_term() {
        return None;
    }

    let progress = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        progress.set_style(style);
    }
    progress.set_message(format!("Fetching transcript for {}...", reference));
    progress.enable_steady_tick(Duration::from_millis(100));
    Some(progress)
}

/// The artifact path is the only line on stdout
fn print_summary(extraction: &Extraction, quiet: bool) {
    println!("{}", extraction.path.display());

    if quiet {
        return;
    }
    eprintln!(
        "{} {} [{}] {} segments, {}",
        style("Saved").green().bold(),
        style(&extraction.title).bold(),
        extraction.language,
        extraction.segment_count,
        format_duration(extraction.duration)
    );
}
