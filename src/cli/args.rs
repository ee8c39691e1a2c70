//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--settings <path>`: Read runtime settings from this file
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Results only, warnings and errors in the log

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::DEFAULT_LABELS_FILE;

/// blm - Jira backlog metrics for Zabbix
#[derive(Parser, Debug)]
#[command(name = "blm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Runtime settings file (overrides BLM_SETTINGS and the default locations)
    #[arg(long, global = true, value_name = "PATH")]
    pub settings: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print results only
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Count the open backlog and push the metrics to Zabbix
    #[command(
        name = "report",
        long_about = "Count the open backlog and push the metrics to Zabbix.\n\n\
            Issues are grouped by their first configured priority component and \
            counted per configured issue-type label, plus one total per label. \
            Issues with missing or duplicated From_/Type_ tags are reported \
            separately and left out of every count.\n\n\
            The run always ends with an `exitcode` item: 1 when the counts were \
            produced, 0 when anything went wrong before that.",
        after_help = "\
EXAMPLES:
    # Run with labels_list.yaml from the current directory
    blm report

    # Use another labels file
    blm report --config /etc/blm/labels_list.yaml

    # Print the payload instead of sending it
    blm report --dry-run"
    )]
    Report {
        /// Labels file with PRIORITIES and ISSUE_TYPE lists
        #[arg(long, value_name = "PATH", default_value = DEFAULT_LABELS_FILE)]
        config: PathBuf,

        /// Print the payload as JSON instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Transition every issue matching a query
    #[command(
        name = "close",
        long_about = "Transition every issue matching a JQL query.\n\n\
            For each matching issue the available transitions are fetched; the \
            target transition is executed only when the issue offers it. The \
            transition sets the resolution, assigns the issue to --user, adds \
            --comment and logs the configured worklog.",
        after_help = "\
EXAMPLES:
    # Close all resolved-but-open support tickets
    blm close --query 'project = OPS AND labels = stale' \\
        --user bot --password \"$JIRA_PASSWORD\" --comment 'Closed as stale'

    # See what would be closed
    blm close --query 'project = OPS AND labels = stale' \\
        --user bot --password \"$JIRA_PASSWORD\" --comment 'x' --dry-run"
    )]
    Close {
        /// JQL selecting the issues
        #[arg(long)]
        query: String,

        /// Jira account, also the new assignee
        #[arg(long)]
        user: String,

        /// Password for the account
        #[arg(long)]
        password: String,

        /// Comment added with the transition
        #[arg(long)]
        comment: String,

        /// Transition to execute (defaults to the configured id)
        #[arg(long, value_name = "ID")]
        transition_id: Option<String>,

        /// List matching issues without transitioning them
        #[arg(long)]
        dry_run: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn report_defaults() {
        let cli = Cli::try_parse_from(["blm", "report"]).unwrap();
        match cli.command {
            Command::Report { config, dry_run } => {
                assert_eq!(config, PathBuf::from("labels_list.yaml"));
                assert!(!dry_run);
            }
            other => panic!("expected report, got {:?}", other),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["blm", "report", "--settings", "s.toml", "-q"]).unwrap();
        assert_eq!(cli.settings, Some(PathBuf::from("s.toml")));
        assert!(cli.quiet);
        assert!(!cli.debug);
    }

    #[test]
    fn close_requires_all_arguments() {
        let result = Cli::try_parse_from(["blm", "close", "--query", "q", "--user", "u"]);
        assert!(result.is_err());
    }

    #[test]
    fn close_parses() {
        let cli = Cli::try_parse_from([
            "blm",
            "close",
            "--query",
            "project = OPS",
            "--user",
            "bot",
            "--password",
            "pw",
            "--comment",
            "bye",
            "--transition-id",
            "31",
        ])
        .unwrap();
        match cli.command {
            Command::Close {
                query,
                transition_id,
                dry_run,
                ..
            } => {
                assert_eq!(query, "project = OPS");
                assert_eq!(transition_id.as_deref(), Some("31"));
                assert!(!dry_run);
            }
            other => panic!("expected close, got {:?}", other),
        }
    }
}
