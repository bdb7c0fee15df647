//! Configuration file parsing for `pylite.toml`.
//!
//! Searches the current directory then its ancestors. Missing sections and
//! keys fall back to built-in defaults.

use pylite_compiler::compiler::indent::DEFAULT_TAB_WIDTH;
use pylite_compiler::compiler::source::STDIN_NAME;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "pylite.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid toml in '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: tab_width must be at least 1")]
    ZeroTabWidth,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PyliteConfig {
    #[serde(default)]
    pub lexer: LexerSection,
    #[serde(default)]
    pub diagnostics: DiagnosticsSection,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct LexerSection {
    /// Columns a tab contributes to indentation.
    pub tab_width: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct DiagnosticsSection {
    /// File name reported in tracebacks for source read from stdin.
    pub file_name: Option<String>,
}

impl PyliteConfig {
    /// Find `pylite.toml` starting at the current directory.
    pub fn load() -> Result<Option<(PathBuf, Self)>, ConfigError> {
        match std::env::current_dir() {
            Ok(dir) => Self::find_from(&dir),
            Err(_) => Ok(None),
        }
    }

    /// Find `pylite.toml` in `start` or the nearest ancestor holding one.
    pub fn find_from(start: &Path) -> Result<Option<(PathBuf, Self)>, ConfigError> {
        for dir in start.ancestors() {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.is_file() {
                let cfg = Self::load_from(&config_path)?;
                return Ok(Some((config_path, cfg)));
            }
        }
        Ok(None)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let cfg: Self =
            toml::from_str(&content).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.lexer.tab_width == Some(0) {
            return Err(ConfigError::ZeroTabWidth);
        }
        Ok(())
    }

    pub fn tab_width(&self) -> usize {
        self.lexer.tab_width.unwrap_or(DEFAULT_TAB_WIDTH)
    }

    pub fn stdin_name(&self) -> &str {
        self.diagnostics.file_name.as_deref().unwrap_or(STDIN_NAME)
    }

    pub fn default_template() -> &'static str {
        r#"# pylite configuration

[lexer]
# tab_width = 4

[diagnostics]
# Name shown in tracebacks for programs read from stdin
# file_name = "<stdin>"
"#
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pylite-config-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn parse_full_config() {
        let toml_str = r#"
[lexer]
tab_width = 8

[diagnostics]
file_name = "main.py"
"#;
        let cfg: PyliteConfig = toml::from_str(toml_str).expect("should parse");
        assert_eq!(cfg.tab_width(), 8);
        assert_eq!(cfg.stdin_name(), "main.py");
    }

    #[test]
    fn missing_sections_use_defaults() {
        let cfg: PyliteConfig = toml::from_str("").expect("should parse");
        assert_eq!(cfg, PyliteConfig::default());
        assert_eq!(cfg.tab_width(), DEFAULT_TAB_WIDTH);
        assert_eq!(cfg.stdin_name(), "<stdin>");
    }

    #[test]
    fn template_parses_to_defaults() {
        let cfg: PyliteConfig = toml::from_str(PyliteConfig::default_template()).expect("should parse");
        assert_eq!(cfg, PyliteConfig::default());
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(toml::from_str::<PyliteConfig>("[providers]\nx = 1\n").is_err());
    }

    #[test]
    fn found_in_ancestor_directory() {
        let root = scratch_dir("ancestor");
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.join(CONFIG_FILE), "[lexer]\ntab_width = 2\n").unwrap();

        let (path, cfg) = PyliteConfig::find_from(&nested).unwrap().expect("config found");
        assert_eq!(path, root.join(CONFIG_FILE));
        assert_eq!(cfg.tab_width(), 2);
        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn invalid_files_report_their_path() {
        let root = scratch_dir("invalid");
        let path = root.join(CONFIG_FILE);
        std::fs::write(&path, "[lexer]\ntab_width = \"wide\"\n").unwrap();
        let err = PyliteConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("pylite.toml"));

        std::fs::write(&path, "[lexer]\ntab_width = 0\n").unwrap();
        assert!(matches!(PyliteConfig::load_from(&path), Err(ConfigError::ZeroTabWidth)));
        let _ = std::fs::remove_dir_all(&root);
    }
}
