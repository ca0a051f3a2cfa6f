//! gradecurve CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "gradecurve", version, about = "Relative grade finalization engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a course file, assign curved letter grades, and write reports
    Finalize {
        /// Path to the .toml course file
        #[arg(long)]
        course: PathBuf,

        /// Config file path
        #[arg(long)]
        store_config: Option<PathBuf>,

        /// Output directory (defaults to the configured output_dir)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, all, none
        #[arg(long, default_value = "json")]
        format: String,

        /// Write records to the configured store instead of a throwaway one
        #[arg(long)]
        persist: bool,
    },

    /// Compute percentages for a course file without assigning grades
    Score {
        /// Path to the .toml course file
        #[arg(long)]
        course: PathBuf,

        /// Config file path
        #[arg(long)]
        store_config: Option<PathBuf>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Decode and score a single attendance ledger
    Attendance {
        /// Encoded ledger, e.g. "1P2L3A"
        #[arg(long)]
        ledger: String,

        /// Sessions in the course
        #[arg(long, default_value = "80")]
        total_sessions: i32,

        /// Maximum attendance score
        #[arg(long, default_value = "20")]
        max_score: f64,

        /// Points deducted per late session
        #[arg(long, default_value = "0")]
        late_penalty: f64,
    },

    /// Compare two finalization reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Exit code 1 if any grade changed
        #[arg(long)]
        fail_on_change: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate course TOML files
    Validate {
        /// Path to a course file or directory
        #[arg(long)]
        course: PathBuf,
    },

    /// Create starter config and example course file
    Init,
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gradecurve=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Finalize {
            course,
            store_config,
            output,
            format,
            persist,
        } => commands::finalize::execute(course, store_config, output, format, persist).await,
        Commands::Score {
            course,
            store_config,
            format,
        } => commands::score::execute(course, store_config, format),
        Commands::Attendance {
            ledger,
            total_sessions,
            max_score,
            late_penalty,
        } => commands::attendance::execute(ledger, total_sessions, max_score, late_penalty),
        Commands::Compare {
            baseline,
            current,
            fail_on_change,
            format,
        } => commands::compare::execute(baseline, current, fail_on_change, format),
        Commands::Validate { course } => commands::validate::execute(course),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
