//! Tests for stats, quarantine and completions.

use super::parse;
use crate::cli::{Cli, CliCommand, QuarantineCommand};
use clap::Parser;
use siteaudit_core::quarantine::QuarantineStatus;

#[test]
fn cli_parse_stats() {
    match parse(&["siteaudit", "stats"]) {
        CliCommand::Stats { days, limit } => {
            assert_eq!(days, 7);
            assert_eq!(limit, 10);
        }
        _ => panic!("expected Stats"),
    }
}

#[test]
fn cli_parse_quarantine_list_filter() {
    match parse(&["siteaudit", "quarantine", "list", "--status", "wrong_url"]) {
        CliCommand::Quarantine {
            action: QuarantineCommand::List { status },
        } => assert_eq!(status, Some(QuarantineStatus::WrongUrl)),
        _ => panic!("expected Quarantine List"),
    }
}

#[test]
fn cli_parse_quarantine_set_with_note() {
    match parse(&[
        "siteaudit",
        "quarantine",
        "set",
        "https://x.example.gov",
        "investigating",
        "--note",
        "dns moved",
    ]) {
        CliCommand::Quarantine {
            action: QuarantineCommand::Set { url, status, note },
        } => {
            assert_eq!(url, "https://x.example.gov");
            assert_eq!(status, QuarantineStatus::Investigating);
            assert_eq!(note.as_deref(), Some("dns moved"));
        }
        _ => panic!("expected Quarantine Set"),
    }
}

#[test]
fn cli_parse_quarantine_remove_and_stats() {
    match parse(&["siteaudit", "quarantine", "remove", "https://x.example.gov"]) {
        CliCommand::Quarantine {
            action: QuarantineCommand::Remove { url },
        } => assert_eq!(url, "https://x.example.gov"),
        _ => panic!("expected Quarantine Remove"),
    }
    assert!(matches!(
        parse(&["siteaudit", "quarantine", "stats"]),
        CliCommand::Quarantine {
            action: QuarantineCommand::Stats
        }
    ));
}

#[test]
fn cli_rejects_unknown_status() {
    assert!(Cli::try_parse_from(["siteaudit", "quarantine", "set", "https://x", "gone"]).is_err());
}

#[test]
fn cli_parse_completions() {
    match parse(&["siteaudit", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, clap_complete::Shell::Bash),
        _ => panic!("expected Completions"),
    }
}

#[test]
fn clap_definition_is_consistent() {
    use clap::CommandFactory;
    Cli::command().debug_assert();
}
