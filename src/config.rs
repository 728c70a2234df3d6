use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::driver::DEFAULT_PLACEHOLDER;
use crate::error::{EnhanceError, Result};
use crate::style::Theme;

/// Where header records of a CSV/TSV file are placed in the loaded table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderPlacement {
    /// A separate header section
    #[default]
    Section,
    /// The top of the body, as an ordinary row
    Body,
}

/// Where log records go for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogDestination {
    Stderr,
    File(PathBuf),
    /// Interactive runs without a log file log nowhere, so nothing is
    /// written over the terminal UI
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filter_placeholder: String,
    pub header_placement: HeaderPlacement,
    /// Leading CSV/TSV records treated as header rows
    pub header_rows: usize,
    pub theme: String,
    pub theme_file: Option<PathBuf>,
    /// Log destination for the interactive UI; batch mode logs to stderr
    pub log_file: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            filter_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            header_placement: HeaderPlacement::Section,
            header_rows: 1,
            theme: "teal".to_string(),
            theme_file: None,
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

/// ~/.config/table-enhancer/config.toml
pub fn default_config_path() -> PathBuf {
    if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".config/table-enhancer/config.toml")
    } else {
        PathBuf::from(".config/table-enhancer/config.toml")
    }
}

impl Config {
    pub fn from_toml_str(path: &Path, text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| EnhanceError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path`, or from the default location when it exists.
    /// An explicit path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                Self::from_toml_str(path, &text)
            }
            None => {
                let path = default_config_path();
                if path.is_file() {
                    let text = std::fs::read_to_string(&path)?;
                    Self::from_toml_str(&path, &text)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn log_destination(&self, batch: bool) -> LogDestination {
        match (&self.log_file, batch) {
            (_, true) => LogDestination::Stderr,
            (Some(path), false) => LogDestination::File(path.clone()),
            (None, false) => LogDestination::Discard,
        }
    }

    /// Theme from `theme_file` if set, else the built-in named by `theme`
    pub fn resolve_theme(&self) -> Result<Theme> {
        if let Some(path) = &self.theme_file {
            return Theme::from_file(path);
        }
        Theme::by_name(&self.theme).ok_or_else(|| {
            EnhanceError::Theme(format!(
                "unknown theme '{}', expected one of: {}",
                self.theme,
                Theme::builtin_names().join(", ")
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_toml_str(
            Path::new("inline"),
            r#"
            header_placement = "body"
            theme = "dark"
            "#,
        )
        .unwrap();

        assert_eq!(config.header_placement, HeaderPlacement::Body);
        assert_eq!(config.theme, "dark");
        assert_eq!(config.filter_placeholder, "Search table...");
        assert_eq!(config.header_rows, 1);
        assert_eq!(config.resolve_theme().unwrap().name, "dark");
    }

    #[test]
    fn test_bad_config_names_the_file() {
        let err = Config::from_toml_str(Path::new("broken.toml"), "header_rows = \"two\"")
            .unwrap_err();
        assert!(err.to_string().contains("broken.toml"));
    }

    #[test]
    fn test_unknown_theme() {
        let config = Config {
            theme: "neon".to_string(),
            ..Config::default()
        };
        let err = config.resolve_theme().unwrap_err();
        assert!(err.to_string().contains("teal, dark, light"));
    }

    #[test]
    fn test_load_from_file_with_theme_file() {
        let mut theme_file = NamedTempFile::with_suffix(".toml").unwrap();
        let mut theme = Theme::light();
        theme.name = "custom".to_string();
        write!(theme_file, "{}", toml::to_string(&theme).unwrap()).unwrap();

        let mut config_file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(config_file, "filter_placeholder = \"Filter...\"").unwrap();
        writeln!(config_file, "theme_file = {:?}", theme_file.path().to_str().unwrap()).unwrap();

        let config = Config::load(Some(config_file.path())).unwrap();
        assert_eq!(config.filter_placeholder, "Filter...");
        assert_eq!(config.resolve_theme().unwrap().name, "custom");
    }

    #[test]
    fn test_log_destination() {
        let mut config = Config::default();
        assert_eq!(config.log_destination(true), LogDestination::Stderr);
        assert_eq!(config.log_destination(false), LogDestination::Discard);

        config.log_file = Some(PathBuf::from("/tmp/table-enhancer.log"));
        assert_eq!(
            config.log_destination(false),
            LogDestination::File(PathBuf::from("/tmp/table-enhancer.log"))
        );
        // batch output goes to stdout, so logs stay on stderr
        assert_eq!(config.log_destination(true), LogDestination::Stderr);
    }

    #[test]
    fn test_missing_explicit_config_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/table-enhancer.toml")));
        assert!(matches!(result, Err(EnhanceError::Io(_))));
    }
}
