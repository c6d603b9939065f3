use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treedoc::cli::{GenerateOptions, Output};

#[derive(Parser)]
#[command(name = "treedoc")]
#[command(
    version,
    about = "Bottom-up README generator for source trees",
    args_conflicts_with_subcommands = true,
    subcommand_negates_reqs = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    generate: GenerateArgs,

    #[arg(long, global = true, help = "Config file used instead of <ROOT>/.treedoc.toml")]
    config: Option<PathBuf>,

    #[arg(long, short, global = true, help = "Debug logging")]
    verbose: bool,

    #[arg(long, short, global = true, help = "Only print errors")]
    quiet: bool,
}

#[derive(Args)]
struct GenerateArgs {
    #[arg(required = true, help = "Root folder to document")]
    root: Option<PathBuf>,

    #[arg(long = "dry-run", help = "Print the would-be documents without writing")]
    dry_run: bool,

    #[arg(long = "no-backup", help = "Do not keep README.md.backup copies")]
    no_backup: bool,

    #[arg(long = "append-only", help = "Keep existing text verbatim; only append new sections")]
    append_only: bool,

    #[arg(long, help = "LLM provider (openai, ollama, claude-code)")]
    provider: Option<String>,

    #[arg(long, help = "Model to use")]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration (merged from all sources)
    Show {
        #[arg(default_value = ".", help = "Root whose project config applies")]
        root: PathBuf,
        #[arg(
            short = 'f',
            long,
            default_value = "toml",
            help = "Output format: toml, json"
        )]
        format: String,
    },
    /// Show configuration file paths
    Path {
        #[arg(default_value = ".", help = "Root whose project config applies")]
        root: PathBuf,
    },
}

/// Set up panic handler for graceful error reporting
fn setup_panic_handler() {
    let default_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        eprintln!("\n\x1b[1;31m━━━ PANIC ━━━\x1b[0m");
        eprintln!("\x1b[31mtreedoc encountered an unexpected error:\x1b[0m");
        eprintln!("  {}", message);

        if let Some(location) = panic_info.location() {
            eprintln!(
                "\x1b[90mLocation: {}:{}:{}\x1b[0m",
                location.file(),
                location.line(),
                location.column()
            );
        }
        eprintln!();

        // Call default hook for backtrace (if RUST_BACKTRACE=1)
        default_hook(panic_info);
    }));
}

fn main() -> ExitCode {
    setup_panic_handler();

    match run_cli() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            Output::new().error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}

fn run_cli() -> anyhow::Result<u8> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Some(Commands::Config { action }) => {
            match action {
                ConfigAction::Show { root, format } => {
                    treedoc::cli::commands::config::show(&root, cli.config.as_deref(), &format)?;
                }
                ConfigAction::Path { root } => {
                    treedoc::cli::commands::config::path(&root)?;
                }
            }
            Ok(0)
        }
        None => {
            let GenerateArgs {
                root,
                dry_run,
                no_backup,
                append_only,
                provider,
                model,
            } = cli.generate;

            let options = GenerateOptions {
                root: root.unwrap_or_else(|| PathBuf::from(".")),
                config: cli.config,
                dry_run,
                no_backup,
                append_only,
                provider,
                model,
            };
            let output = Output::new().with_quiet(cli.quiet);
            Ok(treedoc::cli::commands::generate::run(options, &output)?)
        }
    }
}
