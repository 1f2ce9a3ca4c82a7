use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use oa_archive::{ErrorWriter, ResultWriter};
use oa_block::{BlockReader, Finding, Policy, Severity};
use oa_queue::{Outcome, QueueEntry, QueueError, TaskQueue};
use oa_types::{format_timestamp, now, TaskStatus};
use serde_json::{json, Value};

use crate::cli::*;
use crate::config::OperatorConfig;

pub fn run_command(cli: Cli, config: &OperatorConfig) -> anyhow::Result<()> {
    let queue_path = cli.queue.clone().unwrap_or_else(|| config.queue_file());
    let json = matches!(cli.format, OutputFormat::Json);
    match cli.command {
        Command::Block(BlockArgs {
            action: BlockAction::Validate(args),
        }) => cmd_validate(args, json),
        Command::Queue(QueueArgs { action }) => match action {
            QueueAction::List(args) => cmd_list(&queue_path, args, json),
            QueueAction::Pending(args) => cmd_pending(&queue_path, args, json),
            QueueAction::Start(args) => cmd_start(&queue_path, args),
            QueueAction::Done(args) => cmd_done(&queue_path, config, args),
            QueueAction::Fail(args) => cmd_fail(&queue_path, config, args),
        },
    }
}

fn cmd_validate(args: ValidateArgs, json: bool) -> anyhow::Result<()> {
    let reader = if args.strict {
        BlockReader::with_policy(Policy::Strict)
    } else if args.lenient {
        BlockReader::with_policy(Policy::Lenient)
    } else {
        BlockReader::new()
    };

    let mut failed = 0usize;
    let mut reports = Vec::new();
    for path in &args.paths {
        match reader.read(path) {
            Ok(validated) => {
                let findings = &validated.report.findings;
                if json {
                    reports.push(json!({
                        "path": path.display().to_string(),
                        "block_id": validated.block.block_id,
                        "valid": true,
                        "policy": format!("{:?}", validated.report.policy).to_lowercase(),
                        "findings": findings.iter().map(finding_json).collect::<Vec<_>>(),
                    }));
                } else {
                    println!(
                        "{} {} ({})",
                        "✓".green().bold(),
                        path.display(),
                        validated.block.block_id.cyan()
                    );
                    for finding in findings {
                        print_finding(finding);
                    }
                }
            }
            Err(e) => {
                failed += 1;
                if json {
                    reports.push(json!({
                        "path": path.display().to_string(),
                        "valid": false,
                        "error": e.to_string(),
                    }));
                } else {
                    println!("{} {}: {}", "✗".red().bold(), path.display(), e);
                }
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    if failed > 0 {
        anyhow::bail!("{failed} of {} block(s) failed validation", args.paths.len());
    }
    Ok(())
}

fn finding_json(f: &Finding) -> Value {
    json!({
        "severity": f.severity.to_string(),
        "code": f.code.as_str(),
        "detail": f.detail,
    })
}

fn print_finding(f: &Finding) {
    let tag = match f.severity {
        Severity::Warning => "warning".yellow(),
        Severity::Error => "error".red(),
    };
    println!("    {tag} {}: {}", f.code.as_str().bold(), f.detail);
}

fn cmd_list(queue_path: &Path, args: ListArgs, json: bool) -> anyhow::Result<()> {
    let queue = TaskQueue::open(queue_path)?;
    let entries: Vec<&QueueEntry> = queue
        .entries()
        .iter()
        .filter(|e| args.status.map_or(true, |s| e.status == s))
        .collect();
    print_entries(&entries, json)
}

fn cmd_pending(queue_path: &Path, args: PendingArgs, json: bool) -> anyhow::Result<()> {
    let queue = TaskQueue::open(queue_path)?;
    let mut pending = queue.pending();
    if let Some(limit) = args.limit {
        pending.truncate(limit);
    }
    print_entries(&pending, json)
}

fn print_entries(entries: &[&QueueEntry], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    if entries.is_empty() {
        println!("No tasks.");
        return Ok(());
    }
    for e in entries {
        println!(
            "{:<12} {:<11} {:>4}  {}  {}",
            e.id.bold(),
            colored_status(e.status),
            e.priority,
            format_timestamp(&e.created_at).dimmed(),
            e.block_id.cyan()
        );
    }
    Ok(())
}

fn colored_status(status: TaskStatus) -> colored::ColoredString {
    let s = status.as_str();
    match status {
        TaskStatus::Pending => s.normal(),
        TaskStatus::InProgress => s.yellow(),
        TaskStatus::Done => s.green(),
        TaskStatus::Error => s.red(),
    }
}

fn cmd_start(queue_path: &Path, args: StartArgs) -> anyhow::Result<()> {
    let mut queue = TaskQueue::open(queue_path)?;
    let outcome = queue.mark_in_progress(&args.id)?;
    finish(&queue, &args.id, &outcome)
}

fn cmd_done(queue_path: &Path, config: &OperatorConfig, args: DoneArgs) -> anyhow::Result<()> {
    let mut queue = TaskQueue::open(queue_path)?;
    let entry = lookup(&queue, &args.id)?;
    let completed_at = now();

    let result_path = if entry.status.is_terminal() {
        PathBuf::new()
    } else {
        let text = fs::read_to_string(&args.analysis)
            .with_context(|| format!("cannot read analysis {}", args.analysis.display()))?;
        let analysis: Value = serde_json::from_str(&text)
            .with_context(|| format!("analysis {} is not valid JSON", args.analysis.display()))?;
        ResultWriter::new(&config.archive_root).write_result(
            &entry.block_id,
            args.model.as_deref().unwrap_or(&config.model),
            args.analysis_version.as_deref().unwrap_or(&config.analysis_version),
            analysis,
            completed_at,
        )?
    };

    let outcome = queue.mark_done(&args.id, &result_path.display().to_string(), completed_at)?;
    finish(&queue, &args.id, &outcome)
}

fn cmd_fail(queue_path: &Path, config: &OperatorConfig, args: FailArgs) -> anyhow::Result<()> {
    let mut queue = TaskQueue::open(queue_path)?;
    let entry = lookup(&queue, &args.id)?;
    let failed_at = now();

    let error_path = if entry.status.is_terminal() {
        PathBuf::new()
    } else {
        let response = match &args.response_text {
            Some(path) => Some(
                fs::read_to_string(path).with_context(|| format!("cannot read response {}", path.display()))?,
            ),
            None => None,
        };
        ErrorWriter::new(&config.archive_root).write_error(
            &entry.block_id,
            &entry.id,
            args.error_type,
            &args.detail,
            response.as_deref(),
            failed_at,
        )?
    };

    let message = format!("{}: {}", args.error_type, args.detail);
    let outcome = queue.mark_error(&args.id, &message, &error_path.display().to_string(), failed_at)?;
    finish(&queue, &args.id, &outcome)
}

fn lookup(queue: &TaskQueue, id: &str) -> anyhow::Result<QueueEntry> {
    queue
        .get(id)
        .cloned()
        .ok_or_else(|| QueueError::NotFound { id: id.to_string() }.into())
}

fn finish(queue: &TaskQueue, id: &str, outcome: &Outcome) -> anyhow::Result<()> {
    match outcome {
        Outcome::Applied { from, to } => {
            queue.save()?;
            println!("{} {} {} → {}", "✓".green().bold(), id.bold(), from, colored_status(*to));
        }
        Outcome::Unchanged { reason } => {
            println!("{} {} unchanged ({})", "·".dimmed(), id.bold(), reason);
        }
    }
    Ok(())
}
