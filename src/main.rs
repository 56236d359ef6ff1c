use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clarion::cli::commands::{codebase, config, prompt, providers, run};
use clarion::cli::{CommandContext, resolve_root};

#[derive(Parser)]
#[command(name = "clarion")]
#[command(
    version,
    about = "Local code assistant backend: load a codebase, prompt an LLM, apply its edits"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true)]
    verbose: bool,

    #[arg(long, short, global = true)]
    quiet: bool,
}

/// Agent, prompt and file selection shared by run-style commands
#[derive(clap::Args)]
struct RunArgs {
    #[arg(long, short, help = "Agent definition (YAML)")]
    agent: PathBuf,
    #[arg(long, short, help = "Task for the agent")]
    prompt: String,
    #[arg(long, help = "Codebase root (default: current directory)")]
    root: Option<PathBuf>,
    #[arg(
        long = "file",
        help = "Send only these files (relative to root) instead of filtering the root"
    )]
    files: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the directory tree of a codebase
    Tree {
        #[arg(help = "Codebase root (default: current directory)")]
        root: Option<PathBuf>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// List the files selected by an agent's filters and extra globs
    Files {
        #[arg(help = "Codebase root (default: current directory)")]
        root: Option<PathBuf>,
        #[arg(long, short, help = "Agent definition whose filters to apply")]
        agent: Option<PathBuf>,
        #[arg(long, help = "Include glob (repeatable)")]
        include: Vec<String>,
        #[arg(long, help = "Exclude glob (repeatable)")]
        exclude: Vec<String>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Show the include/exclude status of every file for a set of globs
    PreviewFilter {
        #[arg(help = "Codebase root (default: current directory)")]
        root: Option<PathBuf>,
        #[arg(long, help = "Include glob (repeatable)")]
        include: Vec<String>,
        #[arg(long, help = "Exclude glob (repeatable)")]
        exclude: Vec<String>,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// Render the prompt and provider payload without sending it
    PreparePrompt {
        #[command(flatten)]
        args: RunArgs,
        #[arg(
            short = 'f',
            long,
            default_value = "markdown",
            help = "Output format: markdown, payload, json"
        )]
        format: String,
    },

    /// Run an agent task against its LLM provider
    Run {
        #[command(flatten)]
        args: RunArgs,
        #[arg(long, help = "Apply the returned file changes to the root")]
        apply: bool,
        #[arg(long, help = "Save the structured output to this file")]
        save: Option<PathBuf>,
    },

    /// Apply a saved structured output to a codebase
    Apply {
        #[arg(help = "Structured output JSON file")]
        output: PathBuf,
        #[arg(long, help = "Codebase root (default: current directory)")]
        root: Option<PathBuf>,
    },

    /// Estimate the token count of an agent run
    Tokens {
        #[command(flatten)]
        args: RunArgs,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

    /// List registered providers and configured credentials
    Providers {
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },

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
        #[arg(short = 'g', long, help = "Show global config file only")]
        global: bool,
        #[arg(short = 'f', long, default_value = "text", help = "Output format: text, json")]
        format: String,
    },
    /// Show configuration file paths
    Path,
    /// Initialize configuration
    Init {
        #[arg(long, short, help = "Initialize global config")]
        global: bool,
        #[arg(long, help = "Overwrite existing config")]
        force: bool,
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
        eprintln!("\x1b[31mClarion encountered an unexpected error:\x1b[0m");
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
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError:\x1b[0m {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_cli() -> anyhow::Result<()> {
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
        Commands::Tree { root, format } => {
            let ctx = CommandContext::load()?;
            codebase::tree(&ctx, &resolve_root(root)?, &format)?;
        }
        Commands::Files {
            root,
            agent,
            include,
            exclude,
            format,
        } => {
            let ctx = CommandContext::load()?;
            codebase::files(
                &ctx,
                &resolve_root(root)?,
                agent.as_deref(),
                include,
                exclude,
                &format,
            )?;
        }
        Commands::PreviewFilter {
            root,
            include,
            exclude,
            format,
        } => {
            let ctx = CommandContext::load()?;
            codebase::preview_filter(&ctx, &resolve_root(root)?, &include, &exclude, &format)?;
        }
        Commands::PreparePrompt { args, format } => {
            let ctx = CommandContext::load()?;
            prompt::prepare(
                &ctx,
                &resolve_root(args.root)?,
                &args.agent,
                &args.prompt,
                &args.files,
                &format,
            )?;
        }
        Commands::Run { args, apply, save } => {
            let ctx = CommandContext::load()?;
            run::run(
                &ctx,
                run::RunOptions {
                    root: resolve_root(args.root)?,
                    agent: args.agent,
                    prompt: args.prompt,
                    paths: args.files,
                    apply,
                    save,
                },
            )?;
        }
        Commands::Apply { output, root } => {
            run::apply(&resolve_root(root)?, &output)?;
        }
        Commands::Tokens { args, format } => {
            let ctx = CommandContext::load()?;
            prompt::tokens(
                &ctx,
                &resolve_root(args.root)?,
                &args.agent,
                &args.prompt,
                &args.files,
                &format,
            )?;
        }
        Commands::Providers { format } => {
            let ctx = CommandContext::load()?;
            providers::run(&ctx, &format)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { global, format } => {
                config::show(global, &format)?;
            }
            ConfigAction::Path => {
                config::path()?;
            }
            ConfigAction::Init { global, force } => {
                if global {
                    config::init_global(force)?;
                } else {
                    config::init_project(force)?;
                }
            }
        },
    }

    Ok(())
}
