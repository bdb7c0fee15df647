//! Integration tests for the pylite subcommands, driven through the library
//! with in-memory output buffers.

use pylite_cli::colors::plain;
use pylite_cli::commands::{self, Settings, Status};
use pylite_cli::config::PyliteConfig;
use pylite_cli::CliError;
use pylite_compiler::compiler::source::SourceIndex;
use std::path::Path;

struct Captured {
    status: Status,
    out: String,
    err: String,
}

fn capture(f: impl FnOnce(&mut Vec<u8>, &mut Vec<u8>) -> Result<Status, CliError>) -> Captured {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let status = f(&mut out, &mut err).expect("command should not fail");
    Captured {
        status,
        out: String::from_utf8(out).expect("utf-8 stdout"),
        err: String::from_utf8(err).expect("utf-8 stderr"),
    }
}

fn source(text: &str) -> SourceIndex {
    SourceIndex::new(text).with_name("prog.py")
}

// =============================================================================
// tokens
// =============================================================================

#[test]
fn tokens_one_per_line() {
    let settings = Settings::default();
    let got = capture(|out, _| commands::tokens(&source("print(1)\n"), &settings, false, false, out));
    assert_eq!(got.status, Status::Success);
    let lines: Vec<&str> = got.out.lines().collect();
    assert_eq!(lines.len(), 6, "{}", got.out);
    assert!(lines[0].starts_with("IDENTIFIER(\"print\")"));
    assert!(lines[5].starts_with("EOF"));
}

#[test]
fn tokens_json_lossless_keeps_comments() {
    let settings = Settings::default();
    let got = capture(|out, _| commands::tokens(&source("# hi\nx\n"), &settings, true, true, out));
    let tokens: serde_json::Value = serde_json::from_str(&got.out).expect("valid json");
    let kinds: Vec<&str> = tokens
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|t| t["kind"].as_str())
        .collect();
    assert_eq!(kinds.first(), Some(&"COMMENT"));
    assert_eq!(kinds.last(), Some(&"EOF"));
}

// =============================================================================
// parse / check
// =============================================================================

#[test]
fn parse_prints_program_json() {
    let settings = Settings::default();
    let got = capture(|out, err| commands::parse(&source("x: print(1)\n"), &settings, true, out, err));
    assert_eq!(got.status, Status::Success);
    assert_eq!(got.out.lines().count(), 1);
    let program: serde_json::Value = serde_json::from_str(&got.out).expect("valid json");
    let body = program["body"].as_array().expect("body");
    assert_eq!(body.len(), 2);
    assert_eq!(body[1]["type"], "Block");
    assert!(got.err.is_empty());
}

#[test]
fn parse_reports_syntax_error() {
    let settings = Settings::default();
    let got = capture(|out, err| commands::parse(&source("print(1 2)\n"), &settings, false, out, err));
    assert_eq!(got.status, Status::Failed);
    assert_eq!(got.status.exit_code(), 1);
    assert!(got.out.is_empty());
    assert!(got.err.starts_with("  File \"prog.py\", line 1\n    print(1 2)\n"), "{}", got.err);
    assert!(got.err.ends_with("SyntaxError: invalid syntax\n"));
}

#[test]
fn check_success_and_failure() {
    let settings = Settings::default();
    let ok = capture(|out, err| commands::check(&source("print(1)\n"), &settings, out, err));
    assert_eq!(ok.status, Status::Success);
    assert_eq!(plain(&ok.out), "✓ prog.py no errors found\n");

    let bad = capture(|out, err| commands::check(&source("x:\nprint(1)\n"), &settings, out, err));
    assert_eq!(bad.status, Status::Failed);
    assert!(bad.err.contains("IndentationError: expected an indented block"), "{}", bad.err);
}

#[test]
fn tab_width_flag_overrides_config() {
    let config: PyliteConfig = toml::from_str("[lexer]\ntab_width = 8\n").unwrap();
    assert_eq!(Settings::resolve(&config, None).tab_width, 8);
    assert_eq!(Settings::resolve(&config, Some(2)).tab_width, 2);

    // A tab and four spaces agree only when a tab counts as four columns.
    let src = source("x:\n\tprint(1)\n    print(2)\n");
    let four = Settings::resolve(&config, Some(4));
    let got = capture(|out, err| commands::check(&src, &four, out, err));
    assert_eq!(got.status, Status::Success, "{}", got.err);
    let eight = Settings::resolve(&config, None);
    let got = capture(|out, err| commands::check(&src, &eight, out, err));
    assert_eq!(got.status, Status::Failed);
}

// =============================================================================
// run
// =============================================================================

#[test]
fn run_prints_program_output() {
    let settings = Settings::default();
    let got = capture(|out, err| commands::run(&source("print('a', 1)\nprint([None])\n"), &settings, out, err));
    assert_eq!(got.status, Status::Success);
    assert_eq!(got.out, "a 1\n[None]\n");
    assert!(got.err.is_empty());
}

#[test]
fn run_keeps_output_before_runtime_error() {
    let settings = Settings::default();
    let got = capture(|out, err| commands::run(&source("print('before')\nprint(after)\n"), &settings, out, err));
    assert_eq!(got.status, Status::Failed);
    assert_eq!(got.out, "before\n");
    assert_eq!(
        got.err,
        "Traceback (most recent call last):\n  File \"prog.py\", line 2, in <module>\n    print(after)\nNameError: name 'after' is not defined\n"
    );
}

#[test]
fn run_does_not_execute_on_syntax_error() {
    let settings = Settings::default();
    let got = capture(|out, err| commands::run(&source("print('no')\n  print(1)\n"), &settings, out, err));
    assert_eq!(got.status, Status::Failed);
    assert!(got.out.is_empty());
    assert!(got.err.contains("IndentationError: unexpected indent"), "{}", got.err);
}

// =============================================================================
// input
// =============================================================================

#[test]
fn read_source_names_file_by_path() {
    let dir = std::env::temp_dir().join(format!("pylite-cli-read-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("main.py");
    std::fs::write(&path, "print(1)\n").unwrap();

    let index = commands::read_source(&path, &Settings::default()).unwrap();
    assert_eq!(index.text(), "print(1)\n");
    assert_eq!(index.name(), path.display().to_string());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn read_source_missing_file() {
    let err = commands::read_source(Path::new("/nonexistent/pylite/prog.py"), &Settings::default()).unwrap_err();
    assert!(matches!(err, CliError::Read { .. }));
    assert!(err.to_string().starts_with("cannot read '/nonexistent/pylite/prog.py'"));
}
