//! Subcommand implementations.
//!
//! Each command writes regular output to `out` and diagnostics to `err`,
//! and reports whether a diagnostic was produced.

use crate::colors::{bold, gray, green};
use crate::config::PyliteConfig;
use crate::error::CliError;
use pylite_compiler::compiler::ast::Program;
use pylite_compiler::compiler::lexer::LexOptions;
use pylite_compiler::compiler::source::SourceIndex;
use pylite_compiler::{Diagnostic, ParseOptions};
use pylite_rt::{Environment, Interpreter};
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Outcome of a command that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    /// A syntax or runtime diagnostic was printed.
    Failed,
}

impl Status {
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Success => 0,
            Status::Failed => 1,
        }
    }
}

/// Effective settings after merging the config file with command-line
/// flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tab_width: usize,
    pub stdin_name: String,
}

impl Settings {
    pub fn resolve(config: &PyliteConfig, tab_width: Option<usize>) -> Self {
        Self {
            tab_width: tab_width.unwrap_or_else(|| config.tab_width()),
            stdin_name: config.stdin_name().to_string(),
        }
    }

    fn parse_options(&self) -> ParseOptions {
        ParseOptions { tab_width: self.tab_width }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::resolve(&PyliteConfig::default(), None)
    }
}

/// Read a program from `path`, or from stdin when `path` is `-`.
pub fn read_source(path: &Path, settings: &Settings) -> Result<SourceIndex, CliError> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(SourceIndex::new(&text).with_name(settings.stdin_name.as_str()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    Ok(SourceIndex::new(&text).with_name(path.display().to_string()))
}

fn parse_reporting(source: &SourceIndex, settings: &Settings, err: &mut dyn Write) -> Result<Option<Program>, CliError> {
    match pylite_compiler::parse_with_options(source, settings.parse_options()) {
        Ok(program) => Ok(Some(program)),
        Err(diagnostic) => {
            report(&diagnostic, err)?;
            Ok(None)
        }
    }
}

fn report(diagnostic: &Diagnostic, err: &mut dyn Write) -> Result<(), CliError> {
    debug!(kind = %diagnostic.kind(), span = %diagnostic.span(), "reporting diagnostic");
    err.write_all(diagnostic.rendered().as_bytes())?;
    Ok(())
}

/// `pylite tokens`: one token per line, or a JSON array.
pub fn tokens(
    source: &SourceIndex,
    settings: &Settings,
    lossless: bool,
    json: bool,
    out: &mut dyn Write,
) -> Result<Status, CliError> {
    let options = LexOptions { tab_width: settings.tab_width, keep_trivia: lossless };
    let tokens = pylite_compiler::tokenize_with_options(source.text(), options);
    info!(file = source.name(), count = tokens.len(), "tokenized");
    if json {
        serde_json::to_writer_pretty(&mut *out, &tokens)?;
        writeln!(out)?;
    } else {
        for token in &tokens {
            writeln!(out, "{}", token)?;
        }
    }
    Ok(Status::Success)
}

/// `pylite parse`: the syntax tree as JSON.
pub fn parse(
    source: &SourceIndex,
    settings: &Settings,
    compact: bool,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<Status, CliError> {
    let Some(program) = parse_reporting(source, settings, err)? else {
        return Ok(Status::Failed);
    };
    if compact {
        serde_json::to_writer(&mut *out, &program)?;
    } else {
        serde_json::to_writer_pretty(&mut *out, &program)?;
    }
    writeln!(out)?;
    Ok(Status::Success)
}

/// `pylite check`: parse without running.
pub fn check(source: &SourceIndex, settings: &Settings, out: &mut dyn Write, err: &mut dyn Write) -> Result<Status, CliError> {
    if parse_reporting(source, settings, err)?.is_none() {
        return Ok(Status::Failed);
    }
    writeln!(out, "{} {} {}", green("✓"), bold(source.name()), gray("no errors found"))?;
    Ok(Status::Success)
}

/// `pylite run`: parse, then interpret with the builtins in scope. Output
/// printed before a runtime error is still written.
pub fn run(source: &SourceIndex, settings: &Settings, out: &mut dyn Write, err: &mut dyn Write) -> Result<Status, CliError> {
    let Some(program) = parse_reporting(source, settings, err)? else {
        return Ok(Status::Failed);
    };
    let mut env = Environment::with_builtins();
    let mut interpreter = Interpreter::new(source);
    let result = interpreter.interpret(&program, &mut env);
    out.write_all(interpreter.output().as_bytes())?;
    out.flush()?;
    match result {
        Ok(_) => Ok(Status::Success),
        Err(diagnostic) => {
            report(&diagnostic, err)?;
            Ok(Status::Failed)
        }
    }
}
