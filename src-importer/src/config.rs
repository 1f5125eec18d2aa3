use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use hand_stats::StatKind;
use serde::{Deserialize, Serialize};

/// Whether a report sums a player's rows over every table size or only the
/// size of the table the hero sits at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SeatsStyle {
    #[default]
    All,
    Exact,
}

fn default_stats() -> Vec<String> {
    ["n", "vpip", "pfr", "three_B", "steal", "cb1", "f_cb1"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_parallel() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImportConfig {
    #[serde(default)]
    pub hero: Option<String>,
    #[serde(default)]
    pub seats_style: SeatsStyle,
    #[serde(default = "default_stats")]
    pub stats: Vec<String>,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            hero: None,
            seats_style: SeatsStyle::All,
            stats: default_stats(),
            parallel: default_parallel(),
        }
    }
}

impl ImportConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Stat names resolved against [`StatKind`]; the first unknown name fails.
    pub fn stat_kinds(&self) -> Result<Vec<StatKind>> {
        self.stats
            .iter()
            .map(|s| s.parse::<StatKind>().map_err(anyhow::Error::from))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_missing_fields() {
        let config: ImportConfig = serde_json::from_str(r#"{"hero": "dave"}"#).unwrap();
        assert_eq!(config.hero.as_deref(), Some("dave"));
        assert_eq!(config.seats_style, SeatsStyle::All);
        assert!(config.parallel);
        assert_eq!(config.stats, default_stats());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.json");
        fs::write(
            &path,
            r#"{"seats_style": "exact", "stats": ["vpip", "cr1"], "parallel": false}"#,
        )
        .unwrap();

        let config = ImportConfig::load(&path).unwrap();
        assert_eq!(config.seats_style, SeatsStyle::Exact);
        assert!(!config.parallel);
        assert_eq!(
            config.stat_kinds().unwrap(),
            vec![StatKind::Vpip, StatKind::CheckRaise1]
        );
    }

    #[test]
    fn test_unknown_stat_is_rejected() {
        let config = ImportConfig {
            stats: vec!["vpip".to_string(), "bogus".to_string()],
            ..ImportConfig::default()
        };
        let err = config.stat_kinds().unwrap_err();
        assert!(err.to_string().contains("bogus"), "error should name the stat: {}", err);
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = ImportConfig::load(Path::new("/nonexistent/import.json")).unwrap_err();
        assert!(err.to_string().contains("import.json"));
    }
}
