//! etagger CLI - content fingerprints and conditional GET checks
//!
//! Computes the ETag a response body would receive and replays the
//! conditional-request decision for a given content type and validator.

use clap::{Parser, Subcommand, ValueEnum};
use etagger::SupportedMimeType;
use etagger_telemetry::TelemetryConfig;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;

/// Content fingerprints and conditional GET checks
#[derive(Parser)]
#[command(name = "etagger")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print collected metrics as JSON on stderr when done
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format shared by all commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the fingerprint of files ("-" reads stdin)
    Fingerprint {
        /// Files to fingerprint
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Run the conditional GET filter over a file served as a response body
    Check {
        /// File used as the response body
        path: PathBuf,

        /// Response Content-Type header
        #[arg(short, long)]
        content_type: Option<String>,

        /// Request method
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request If-None-Match header
        #[arg(short, long)]
        if_none_match: Option<String>,

        /// Allowed media type (repeatable, overrides configuration)
        #[arg(short, long = "allow", value_parser = parse_mime_type)]
        allow: Vec<SupportedMimeType>,

        /// Options file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List the media types that can be fingerprinted
    MimeTypes,
}

fn parse_mime_type(value: &str) -> Result<SupportedMimeType, String> {
    value.parse().map_err(|e: etagger::EtagError| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let telemetry = if cli.verbose {
        TelemetryConfig::verbose()
    } else {
        TelemetryConfig::default()
    }
    .with_json(cli.format == OutputFormat::Json);
    if let Err(e) = etagger_telemetry::init_with_config(telemetry) {
        eprintln!("Warning: {e}");
    }

    let result = match cli.command {
        Commands::Fingerprint { paths } => commands::fingerprint::run(&paths, cli.format).await,

        Commands::Check {
            path,
            content_type,
            method,
            if_none_match,
            allow,
            config,
        } => {
            let args = commands::check::CheckArgs {
                path,
                content_type,
                method,
                if_none_match,
                allow,
                config,
            };
            commands::check::run(args, cli.format).await
        }

        Commands::MimeTypes => commands::mime_types::run(cli.format),
    };

    if cli.stats {
        eprintln!("{:#}", etagger_telemetry::metrics().export_json());
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
