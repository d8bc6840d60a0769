use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};

use covtree::cli;
use covtree::ingest::{self, OnMalformed};
use covtree::level::{Thresholds, HIGH_LOWER_BOUND, LOW_UPPER_BOUND};
use covtree::render::ReportOptions;

/// covtree: hierarchical code coverage summaries rendered as linked HTML pages.
#[derive(Parser)]
#[command(name = "covtree", version, about)]
struct Cli {
    /// Leave out source files whose coverage data is malformed instead of failing.
    #[arg(long, global = true)]
    skip_malformed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render an HTML report, one page per directory and per file.
    Render {
        /// Path to the coverage file.
        file: PathBuf,

        /// Directory to write the pages into.
        #[arg(long, short)]
        output: PathBuf,

        /// Override format detection (lcov, clover).
        #[arg(long)]
        format: Option<String>,

        /// Title shown on every page.
        #[arg(long, default_value = "Code Coverage")]
        title: String,

        /// Charset declared by every page.
        #[arg(long, default_value = "UTF-8")]
        charset: String,

        /// Percentages below this are Lo.
        #[arg(long, default_value_t = LOW_UPPER_BOUND)]
        low_upper_bound: u32,

        /// Percentages from this up are Hi.
        #[arg(long, default_value_t = HIGH_LOWER_BOUND)]
        high_lower_bound: u32,

        /// Directory with templates overriding the built-in ones.
        #[arg(long)]
        template_dir: Option<PathBuf>,
    },

    /// Print coverage of the top-level entries.
    Summary {
        /// Path to the coverage file.
        file: PathBuf,

        /// Override format detection (lcov, clover).
        #[arg(long)]
        format: Option<String>,

        /// Print the whole tree as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let on_malformed = if cli.skip_malformed {
        OnMalformed::Skip
    } else {
        OnMalformed::Abort
    };

    let output = match cli.command {
        Commands::Render {
            file,
            output,
            format,
            title,
            charset,
            low_upper_bound,
            high_lower_bound,
            template_dir,
        } => {
            let options = ReportOptions {
                title,
                charset,
                generated_at: Utc::now(),
                thresholds: Thresholds::new(low_upper_bound, high_lower_bound)?,
            };
            let (tree, detected) = ingest::load(&file, format.as_deref(), on_malformed)?;
            cli::cmd_render(&tree, detected, &output, &options, template_dir.as_deref())?
        }
        Commands::Summary { file, format, json } => {
            let (tree, _) = ingest::load(&file, format.as_deref(), on_malformed)?;
            cli::cmd_summary(&tree, &Thresholds::default(), json)?
        }
    };

    print!("{output}");
    Ok(())
}
