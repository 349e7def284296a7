//! Command-line arguments.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use shotbridge_core::batch::ParentKind;

#[derive(Debug, Parser)]
#[command(name = "shotbridge")]
#[command(about = "Create tracker shots and tasks from an editorial shot table")]
#[command(version)]
pub struct Cli {
    /// Use an in-memory tracker instead of the configured server.
    #[arg(long, global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create sequences, shots and tasks from a JSON records file
    Create(CreateArgs),
    /// Log hours against a task
    LogTime {
        #[arg(long)]
        task_id: String,
        #[arg(long)]
        hours: f64,
        #[arg(long)]
        comment: Option<String>,
        /// Day the work happened (YYYY-MM-DD); defaults to now
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// List today's time logs
    Today {
        /// Only logs against this task
        #[arg(long)]
        task_id: Option<String>,
    },
    /// List tasks assigned to you that are in progress
    MyTasks,
    /// List the task types known to the tracker
    Types,
    /// Publish a review video as a new version on a task
    Publish {
        #[arg(long)]
        task_id: String,
        #[arg(long)]
        video: PathBuf,
        /// Version comment; defaults to a timestamped one
        #[arg(long)]
        comment: Option<String>,
    },
    /// List projects, or those whose name contains --search
    Projects {
        #[arg(long)]
        search: Option<String>,
    },
    /// List folders, sequences and shots under a project or folder
    Children {
        #[arg(long)]
        parent_id: String,
    },
    /// Suggest known task type or status names
    Suggest {
        #[arg(value_enum)]
        kind: SuggestKind,
        /// Only names starting with this
        #[arg(default_value = "")]
        prefix: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SuggestKind {
    TaskTypes,
    Statuses,
}

#[derive(Debug, clap::Args)]
pub struct CreateArgs {
    /// JSON array of shot records
    #[arg(long)]
    pub records: PathBuf,

    /// project, folder or sequence
    #[arg(long, default_value = "project", value_parser = parse_parent_kind)]
    pub parent_kind: ParentKind,

    #[arg(long)]
    pub parent_id: String,

    /// Look everything up but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Search here for thumbnails of records that have none
    #[arg(long)]
    pub thumb_dir: Option<PathBuf>,

    /// Search here for review videos of records that have none
    #[arg(long)]
    pub video_dir: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_parent_kind(value: &str) -> Result<ParentKind, String> {
    ParentKind::from_str(value)
        .ok_or_else(|| format!("unknown parent kind '{value}' (expected project, folder or sequence)"))
}
