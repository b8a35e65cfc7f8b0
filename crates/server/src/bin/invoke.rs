//! Replays a request envelope file through the skill and prints the response

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use skill::{SkillConfig, hello_world_skill};
use tracing_subscriber::{EnvFilter, prelude::*};

#[derive(Parser)]
#[command(name = "invoke")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Run one request envelope through the Hello World skill")]
struct Cli {
    /// Request envelope JSON file ("-" reads stdin)
    request: PathBuf,

    /// Default locale when the request's locale has no strings
    #[arg(long, env = "SKILL_DEFAULT_LOCALE")]
    default_locale: Option<String>,

    /// Alternate language strings file
    #[arg(long, env = "SKILL_LANGUAGE_STRINGS")]
    language_strings: Option<PathBuf>,

    /// Fail if a handler can never be reached
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::new(format!("warn,skill={level}"))),
        )
        .init();

    let body = if cli.request.as_os_str() == "-" {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(&cli.request)
            .with_context(|| format!("Failed to read {}", cli.request.display()))?
    };

    let mut config = SkillConfig::from_env();
    if cli.default_locale.is_some() {
        config.default_locale = cli.default_locale;
    }
    if cli.language_strings.is_some() {
        config.language_strings_path = cli.language_strings;
    }
    config.strict_routing |= cli.strict;

    let skill = hello_world_skill(&config)?;
    let response = skill.invoke_json(body.as_bytes()).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
