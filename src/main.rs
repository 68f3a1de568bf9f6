//! `antiplag` command line: drives [`AntiPlagiarism`] against a configured
//! store and prints every result as JSON.

use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

use anyhow::{bail, Context, Result};
use antiplag::{
    AntiPlagiarism, AntiplagConfig, AuthorId, LoggingConfig, NewSubmission, SubmissionId,
    SweepSelection, TaskId,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Source-code plagiarism detection
#[derive(Parser, Debug)]
#[command(name = "antiplag")]
#[command(version, about = "Source-code plagiarism detection over a submission store")]
struct Cli {
    /// Path to the YAML configuration file (defaults: in-memory store)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a new submission read from a file (or `-` for stdin)
    Add {
        #[arg(long)]
        task: TaskId,
        #[arg(long)]
        author: AuthorId,
        /// Language name, e.g. csharp, java, python
        #[arg(long)]
        language: String,
        file: PathBuf,
        /// Free-form text kept with the submission
        #[arg(long)]
        info: Option<String>,
        /// Index the submission right after storing it
        #[arg(long)]
        index: bool,
    },

    /// Index a stored submission
    Index { submission: u64 },

    /// Rebuild a task's snippets from stored submissions and recalculate
    /// its statistics
    Rebuild { task: TaskId },

    /// Recalculate task statistics (all tasks by default)
    Recalc {
        /// Only this task
        #[arg(long, conflicts_with = "from_task")]
        task: Option<TaskId>,
        /// Resume from this task in stored order
        #[arg(long)]
        from_task: Option<TaskId>,
    },

    /// Plagiarisms of one submission
    Check { submission: u64 },

    /// Plagiarisms of an author's latest submissions to a task
    Author {
        #[arg(long)]
        author: AuthorId,
        #[arg(long)]
        task: TaskId,
        #[arg(long, default_value = "1")]
        last: usize,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_env("ANTIPLAG_LOG")
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_source(file: &PathBuf) -> Result<String> {
    if file.as_os_str() == "-" {
        return std::io::read_to_string(std::io::stdin()).context("failed to read stdin");
    }
    std::fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AntiplagConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => AntiplagConfig::default(),
    };
    init_tracing(&config.logging);

    let service = AntiPlagiarism::open(config).context("failed to open service")?;

    match cli.command {
        Commands::Add {
            task,
            author,
            language,
            file,
            info,
            index,
        } => {
            let added = service.add_submission(NewSubmission {
                task_id: task,
                author_id: author,
                language,
                code: read_source(&file)?,
                additional_info: info,
            })?;
            if index {
                service.index_submission(added.submission_id)?;
            }
            print_json(&added)
        }
        Commands::Index { submission } => {
            let distinct = service.index_submission(SubmissionId(submission))?;
            print_json(&serde_json::json!({
                "submission_id": submission,
                "distinct_fingerprints": distinct,
            }))
        }
        Commands::Rebuild { task } => print_json(&service.rebuild_task_snippets(task)?),
        Commands::Recalc { task, from_task } => {
            let selection = match (task, from_task) {
                (Some(_), Some(_)) => bail!("--task and --from-task are mutually exclusive"),
                (Some(task), None) => SweepSelection::Single(task),
                (None, Some(task)) => SweepSelection::From(task),
                (None, None) => SweepSelection::All,
            };
            let cancel = AtomicBool::new(false);
            print_json(&service.recalculate_task_statistics(selection, &cancel)?)
        }
        Commands::Check { submission } => {
            print_json(&service.get_submission_plagiarisms(SubmissionId(submission))?)
        }
        Commands::Author { author, task, last } => {
            print_json(&service.get_author_plagiarisms(author, task, last)?)
        }
    }
}
