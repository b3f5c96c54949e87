use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ziwei")]
#[command(about = "Zi Wei Dou Shu charts, canonical text and streamed AI readings", long_about = None)]
struct Cli {
    /// Raise log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file instead of ~/.config/ziwei/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Birth data; any field left out defaults to the current moment, male.
#[derive(Args, Debug, Clone, Default)]
pub struct BirthArgs {
    /// Solar birth date, YYYY-MM-DD
    #[arg(long)]
    date: Option<String>,

    /// Local birth time, HH:MM
    #[arg(long)]
    time: Option<String>,

    /// male | female | 男 | 女
    #[arg(long)]
    gender: Option<String>,

    /// Replace the year, keeping month and day
    #[arg(long)]
    year: Option<i32>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the chart with coloured palaces
    Chart {
        #[command(flatten)]
        birth: BirthArgs,
    },
    /// Print the canonical tree text
    Text {
        #[command(flatten)]
        birth: BirthArgs,

        /// Write the text to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Stream the expert report (DeepSeek)
    Analyze {
        #[command(flatten)]
        birth: BirthArgs,
    },
    /// Interactive consultation (Zhipu) with view switching
    Chat {
        #[command(flatten)]
        birth: BirthArgs,
    },
    /// Send a one-line test prompt to a provider
    Probe {
        /// deepseek | zhipu
        #[arg(long, default_value = "deepseek")]
        provider: String,

        #[arg(long, default_value = "Hello")]
        message: String,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "ziwei=info",
        1 => "ziwei=debug",
        _ => "ziwei=trace",
    };
    // Target directives match by prefix, so `ziwei` covers every workspace crate.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let context = commands::context::AppContext::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Chart { birth } => commands::chart::run(&context, &birth).await?,
        Commands::Text { birth, output } => {
            commands::text::run(&context, &birth, output.as_deref()).await?
        }
        Commands::Analyze { birth } => commands::analyze::run(&context, &birth).await?,
        Commands::Chat { birth } => commands::repl::run(&context, &birth).await?,
        Commands::Probe { provider, message } => {
            commands::probe::run(&context, &provider, &message).await?
        }
    }

    Ok(())
}
