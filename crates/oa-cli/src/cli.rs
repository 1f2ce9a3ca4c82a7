use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use oa_types::{ErrorType, TaskStatus};

#[derive(Parser)]
#[command(
    name = "oa",
    about = "Operator archive: block validation and the analysis queue",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (default: ./operator.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Queue log to use instead of the configured one
    #[arg(long, global = true)]
    pub queue: Option<PathBuf>,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Work with block files
    Block(BlockArgs),
    /// Inspect and drive the analysis queue
    Queue(QueueArgs),
}

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    pub action: BlockAction,
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// Read and validate block files
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct ValidateArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
    /// Fail on any hard finding, whatever the block status
    #[arg(long, conflicts_with = "lenient")]
    pub strict: bool,
    /// Record every finding as a warning
    #[arg(long)]
    pub lenient: bool,
}

#[derive(Args)]
pub struct QueueArgs {
    #[command(subcommand)]
    pub action: QueueAction,
}

#[derive(Subcommand)]
pub enum QueueAction {
    /// List every entry, finished ones included
    List(ListArgs),
    /// Show pending entries in dispatch order
    Pending(PendingArgs),
    /// Mark a task as in progress
    Start(StartArgs),
    /// Store an analysis result and mark the task done
    Done(DoneArgs),
    /// Store an error record and mark the task failed
    Fail(FailArgs),
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long, value_parser = parse_status)]
    pub status: Option<TaskStatus>,
}

#[derive(Args)]
pub struct PendingArgs {
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

#[derive(Args)]
pub struct StartArgs {
    pub id: String,
}

#[derive(Args)]
pub struct DoneArgs {
    pub id: String,
    /// JSON file holding the analysis payload
    #[arg(long)]
    pub analysis: PathBuf,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub analysis_version: Option<String>,
}

#[derive(Args)]
pub struct FailArgs {
    pub id: String,
    #[arg(long, value_parser = parse_error_type)]
    pub error_type: ErrorType,
    #[arg(long)]
    pub detail: String,
    /// File holding the raw response that caused the failure
    #[arg(long)]
    pub response_text: Option<PathBuf>,
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    s.parse().map_err(|e| format!("{e}"))
}

fn parse_error_type(s: &str) -> Result<ErrorType, String> {
    s.parse().map_err(|e| format!("{e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_validate() {
        let cli = Cli::try_parse_from(["oa", "block", "validate", "a.json", "b.json"]).unwrap();
        let Command::Block(BlockArgs { action: BlockAction::Validate(args) }) = cli.command else {
            panic!("wrong command");
        };
        assert_eq!(args.paths, vec![PathBuf::from("a.json"), PathBuf::from("b.json")]);
        assert!(!args.strict && !args.lenient);
    }

    #[test]
    fn validate_needs_a_path() {
        assert!(Cli::try_parse_from(["oa", "block", "validate"]).is_err());
    }

    #[test]
    fn strict_and_lenient_conflict() {
        assert!(Cli::try_parse_from(["oa", "block", "validate", "--strict", "--lenient", "a.json"]).is_err());
    }

    #[test]
    fn parse_list_with_status() {
        let cli = Cli::try_parse_from(["oa", "queue", "list", "--status", "in_progress"]).unwrap();
        if let Command::Queue(QueueArgs { action: QueueAction::List(args) }) = cli.command {
            assert_eq!(args.status, Some(TaskStatus::InProgress));
        } else { panic!("wrong command"); }
        assert!(Cli::try_parse_from(["oa", "queue", "list", "--status", "finished"]).is_err());
    }

    #[test]
    fn parse_pending_limit() {
        let cli = Cli::try_parse_from(["oa", "queue", "pending", "-n", "3"]).unwrap();
        if let Command::Queue(QueueArgs { action: QueueAction::Pending(args) }) = cli.command {
            assert_eq!(args.limit, Some(3));
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_done() {
        let cli = Cli::try_parse_from([
            "oa", "queue", "done", "t-1", "--analysis", "out.json", "--model", "m-2",
        ])
        .unwrap();
        if let Command::Queue(QueueArgs { action: QueueAction::Done(args) }) = cli.command {
            assert_eq!(args.id, "t-1");
            assert_eq!(args.analysis, PathBuf::from("out.json"));
            assert_eq!(args.model.as_deref(), Some("m-2"));
            assert!(args.analysis_version.is_none());
        } else { panic!("wrong command"); }
    }

    #[test]
    fn parse_fail() {
        let cli = Cli::try_parse_from([
            "oa", "queue", "fail", "t-1", "--error-type", "InvalidJSON", "--detail", "truncated body",
        ])
        .unwrap();
        if let Command::Queue(QueueArgs { action: QueueAction::Fail(args) }) = cli.command {
            assert_eq!(args.error_type, ErrorType::InvalidJson);
            assert_eq!(args.detail, "truncated body");
        } else { panic!("wrong command"); }
        assert!(Cli::try_parse_from([
            "oa", "queue", "fail", "t-1", "--error-type", "Timeout", "--detail", "x",
        ])
        .is_err());
    }

    #[test]
    fn parse_globals_after_subcommand() {
        let cli = Cli::try_parse_from([
            "oa", "queue", "start", "t-9", "--queue", "q.jsonl", "--verbose", "--format", "json",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.queue, Some(PathBuf::from("q.jsonl")));
        assert!(matches!(cli.format, OutputFormat::Json));
    }
}
