//! envmerge CLI
//!
//! Command-line tool for merging the Resources folders of two environments.

mod output_dir;

use clap::{Parser, Subcommand};
use envmerge_core::{EnvironmentMerger, Error, FolderPolicy, MergeReport};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "envmerge")]
#[command(about = "Merge two environments into a new one", long_about = None)]
#[command(version)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_negates_reqs = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Environment 1 to merge (wins on file name collisions)
    #[arg(required = true)]
    environment1: Option<PathBuf>,

    /// Environment 2 to merge
    #[arg(required = true)]
    environment2: Option<PathBuf>,

    /// Output directory for where the merged environment will be written to
    #[arg(long)]
    out_dir: Option<PathBuf>,

    /// Folder classification policy (JSON)
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Write a JSON report of the run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Log every copied file
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the built-in folder policy as a template
    WritePolicy {
        /// Output path for the policy file
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> envmerge_core::Result<()> {
    match (cli.command, cli.environment1, cli.environment2) {
        (Some(Commands::WritePolicy { output }), _, _) => cmd_write_policy(&output),
        (None, Some(env1), Some(env2)) => cmd_merge(
            &env1,
            &env2,
            cli.out_dir.as_deref(),
            cli.policy.as_deref(),
            cli.report.as_deref(),
        ),
        // clap requires both environments when no subcommand is given
        (None, _, _) => Ok(()),
    }
}

fn cmd_merge(
    env1: &Path,
    env2: &Path,
    out_dir: Option<&Path>,
    policy_path: Option<&Path>,
    report_path: Option<&Path>,
) -> envmerge_core::Result<()> {
    let mut missing = Vec::new();
    for (label, env) in [("Environment1", env1), ("Environment2", env2)] {
        if !env.is_dir() {
            println!("{} does not exist on path:", label);
            println!("{}", env.display());
            missing.push(env);
        }
    }
    if let Some(env) = missing.first() {
        return Err(Error::MissingInput(env.to_path_buf()));
    }

    let policy = match policy_path {
        Some(path) => FolderPolicy::load(path)?,
        None => FolderPolicy::default(),
    };

    let output = output_dir::create_output_dir(out_dir)?;
    println!("Merge path created at:");
    println!("{}", output.display());

    let merger = EnvironmentMerger::new(policy);
    let report = match merger.merge(env1, env2, &output) {
        Ok(report) => report,
        Err(e @ Error::MissingResourcesFolder { .. }) => {
            println!("{}, skipping", e);
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    print_summary(&report);

    if let Some(path) = report_path {
        report.save(path)?;
        println!("Report written to {}", path.display());
    }

    Ok(())
}

fn cmd_write_policy(output: &Path) -> envmerge_core::Result<()> {
    FolderPolicy::default().save(output)?;
    println!("Created policy file: {}", output.display());
    println!();
    println!("Edit the file to change how folders are merged, then run:");
    println!(
        "  envmerge <ENV1> <ENV2> --policy {}",
        output.display()
    );

    Ok(())
}

fn print_summary(report: &MergeReport) {
    println!("------------------------------------------");
    for folder in &report.folders {
        println!(
            "{} [{}]: {} metadata, {} copied, {} skipped, {} items",
            folder.name,
            folder.strategy,
            folder.metadata_files,
            folder.files_copied,
            folder.files_skipped,
            folder.items_merged
        );
        for (path, issue) in &folder.issues {
            println!("  {}: {}", path.display(), issue);
        }
    }

    if !report.unmatched.is_empty() {
        println!();
        println!("Not in both environments ({}):", report.unmatched.len());
        for name in &report.unmatched {
            println!("  {}", name);
        }
    }

    println!();
    println!("Merge is done");
    if report.total_issues() > 0 {
        println!("{} issue(s) reported above", report.total_issues());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_environments_required() {
        assert!(Cli::try_parse_from(["envmerge"]).is_err());
        assert!(Cli::try_parse_from(["envmerge", "env1"]).is_err());

        let cli = Cli::try_parse_from(["envmerge", "env1", "env2", "--out-dir", "merged"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.environment1, Some(PathBuf::from("env1")));
        assert_eq!(cli.environment2, Some(PathBuf::from("env2")));
        assert_eq!(cli.out_dir, Some(PathBuf::from("merged")));
    }

    #[test]
    fn test_write_policy_needs_no_environments() {
        let cli = Cli::try_parse_from(["envmerge", "write-policy", "policy.json"]).unwrap();

        assert!(matches!(
            cli.command,
            Some(Commands::WritePolicy { ref output }) if output == Path::new("policy.json")
        ));
        assert!(cli.environment1.is_none());
    }
}
