//! Tests for checksum and completions.

use super::parse;
use crate::cli::CliCommand;
use clap_complete::Shell;
use tdash_core::checksum::ChecksumKind;

#[test]
fn cli_parse_checksum_defaults_to_sha256() {
    match parse(&["tdash", "checksum", "/path/to/file.iso"]) {
        CliCommand::Checksum { path, kind } => {
            assert_eq!(path, "/path/to/file.iso");
            assert_eq!(kind, ChecksumKind::Sha256);
        }
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_parse_checksum_md5() {
    match parse(&["tdash", "checksum", "f", "--kind", "MD5"]) {
        CliCommand::Checksum { kind, .. } => assert_eq!(kind, ChecksumKind::Md5),
        _ => panic!("expected Checksum"),
    }
}

#[test]
fn cli_parse_completions() {
    match parse(&["tdash", "completions", "bash"]) {
        CliCommand::Completions { shell } => assert_eq!(shell, Shell::Bash),
        _ => panic!("expected Completions"),
    }
}
