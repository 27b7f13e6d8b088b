use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Declarative container infrastructure CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Synthesize templates from a stack manifest
    Synth {
        /// Path to the stack manifest
        #[arg(short, long, default_value = "strata.yml")]
        file: String,

        /// Deployment target to build against
        #[arg(short, long)]
        target: Option<String>,

        /// Output directory for the templates
        #[arg(short, long)]
        out: Option<String>,
    },

    /// Parse and validate a stack manifest without synthesizing
    Validate {
        /// Path to the stack manifest
        #[arg(short, long, default_value = "strata.yml")]
        file: String,
    },

    /// List the resources a manifest declares
    Resources {
        /// Path to the stack manifest
        #[arg(short, long, default_value = "strata.yml")]
        file: String,

        /// Only show one stack
        #[arg(short, long)]
        stack: Option<String>,

        /// Deployment target to build against
        #[arg(short, long)]
        target: Option<String>,
    },

    /// List configured deployment targets
    Targets,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Synth { file, target, out } => {
            commands::synth(&file, target.as_deref(), out.as_deref())?;
        }

        Commands::Validate { file } => {
            commands::validate(&file)?;
        }

        Commands::Resources { file, stack, target } => {
            commands::resources(&file, stack.as_deref(), target.as_deref())?;
        }

        Commands::Targets => {
            commands::targets()?;
        }
    }

    Ok(())
}
