//! Report settings: defaults, optional JSON config file, CLI overrides

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parsers::LayoutRegistry;
use crate::services::ScoreProfile;
use crate::types::{ReportError, Result};

/// Cell rendering mode: pre-computed values or spreadsheet formulas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Pre-computed values
    #[default]
    Static,
    /// Spreadsheet formulas against the raw data sheet
    Formula,
}

impl ReportMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Formula => "formula",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "formula" => Ok(Self::Formula),
            other => Err(ReportError::Usage(format!(
                "Invalid mode '{}'. Use 'static' or 'formula'",
                other
            ))),
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Row limits of the ranked tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TopN {
    pub top_projects: usize,
    pub top_hubs: usize,
    pub top_performers: usize,
    pub trend_rows: usize,
    pub project_rows: usize,
}

impl Default for TopN {
    fn default() -> Self {
        Self {
            top_projects: 10,
            top_hubs: 10,
            top_performers: 20,
            trend_rows: 50,
            project_rows: 20,
        }
    }
}

impl TopN {
    fn entries(&self) -> [(&'static str, usize); 5] {
        [
            ("top_projects", self.top_projects),
            ("top_hubs", self.top_hubs),
            ("top_performers", self.top_performers),
            ("trend_rows", self.trend_rows),
            ("project_rows", self.project_rows),
        ]
    }
}

/// Settings shared by every report generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReportSettings {
    pub mode: ReportMode,
    pub top_n: TopN,
    /// Raw rows written to the project workbook in static mode
    pub raw_row_cap: usize,
    /// Score profile name; `None` lets each report pick its own
    pub profile: Option<String>,
    /// Record layout of `shipmentData` rows; `None` keeps the report's own
    pub layout: Option<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            mode: ReportMode::Static,
            top_n: TopN::default(),
            raw_row_cap: 10_000,
            profile: None,
            layout: None,
        }
    }
}

impl ReportSettings {
    /// Load settings from a JSON file; absent keys keep their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ReportError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let settings: Self = serde_json::from_str(&content)
            .map_err(|e| ReportError::Config(format!("{}: {}", path.display(), e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply command-line overrides on top of file/default values.
    ///
    /// `top` replaces every table limit except the trend table.
    pub fn with_overrides(
        mut self,
        mode: Option<ReportMode>,
        profile: Option<String>,
        layout: Option<String>,
        top: Option<usize>,
    ) -> Result<Self> {
        if let Some(mode) = mode {
            self.mode = mode;
        }
        if let Some(profile) = profile {
            self.profile = Some(profile);
        }
        if let Some(layout) = layout {
            self.layout = Some(layout);
        }
        if let Some(top) = top {
            self.top_n.top_projects = top;
            self.top_n.top_hubs = top;
            self.top_n.top_performers = top;
            self.top_n.project_rows = top;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in self.top_n.entries() {
            if value == 0 {
                return Err(ReportError::Config(format!("{} must be at least 1", name)));
            }
        }
        if self.raw_row_cap == 0 {
            return Err(ReportError::Config("raw_row_cap must be at least 1".into()));
        }
        if let Some(name) = &self.profile {
            ScoreProfile::named(name)?;
        }
        if let Some(name) = &self.layout {
            LayoutRegistry::new().resolve(name)?;
        }
        Ok(())
    }

    /// Layout name to parse shipment rows with
    pub fn layout_name<'a>(&'a self, report_default: &'a str) -> &'a str {
        self.layout.as_deref().unwrap_or(report_default)
    }

    /// Score profile to use, falling back to the report's own default
    pub fn score_profile(&self, report_default: &str) -> Result<ScoreProfile> {
        let profile = ScoreProfile::named(self.profile.as_deref().unwrap_or(report_default))?;
        profile.validate()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    // ========== ReportMode ==========

    #[test]
    fn test_mode_parse() {
        assert_eq!(ReportMode::parse("static").unwrap(), ReportMode::Static);
        assert_eq!(ReportMode::parse(" FORMULA ").unwrap(), ReportMode::Formula);
        let err = ReportMode::parse("dynamic").unwrap_err();
        assert!(matches!(err, ReportError::Usage(_)));
        assert!(err.to_string().contains("'static' or 'formula'"));
    }

    // ========== defaults ==========

    #[test]
    fn test_defaults() {
        let settings = ReportSettings::default();
        assert_eq!(settings.mode, ReportMode::Static);
        assert_eq!(settings.top_n.top_projects, 10);
        assert_eq!(settings.top_n.top_hubs, 10);
        assert_eq!(settings.top_n.top_performers, 20);
        assert_eq!(settings.top_n.trend_rows, 50);
        assert_eq!(settings.top_n.project_rows, 20);
        assert_eq!(settings.raw_row_cap, 10_000);
        assert_eq!(settings.layout_name("snake_case"), "snake_case");
        assert!(settings.validate().is_ok());
    }

    // ========== from_file ==========

    #[test]
    fn test_from_file_partial() {
        let file = write_config(r#"{"mode": "formula", "top_n": {"top_hubs": 5}}"#);
        let settings = ReportSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.mode, ReportMode::Formula);
        assert_eq!(settings.top_n.top_hubs, 5);
        assert_eq!(settings.top_n.top_projects, 10);
        assert_eq!(settings.raw_row_cap, 10_000);
    }

    #[test]
    fn test_from_file_rejects_unknown_keys() {
        let file = write_config(r#"{"colour": "blue"}"#);
        let err = ReportSettings::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_from_file_rejects_zero_limits() {
        let file = write_config(r#"{"raw_row_cap": 0}"#);
        assert!(ReportSettings::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_file_rejects_unknown_profile() {
        let file = write_config(r#"{"profile": "legacy"}"#);
        assert!(ReportSettings::from_file(file.path()).is_err());
    }

    #[test]
    fn test_from_file_layout() {
        let file = write_config(r#"{"layout": "snake_case"}"#);
        let settings = ReportSettings::from_file(file.path()).unwrap();
        assert_eq!(settings.layout_name("title_case"), "snake_case");

        let file = write_config(r#"{"layout": "kebab-case"}"#);
        let err = ReportSettings::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown layout 'kebab-case'"));
    }

    #[test]
    fn test_from_file_missing() {
        let err = ReportSettings::from_file(Path::new("/nonexistent/settings.json")).unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }

    // ========== overrides ==========

    #[test]
    fn test_cli_overrides_win() {
        let file = write_config(r#"{"mode": "formula", "profile": "fleet"}"#);
        let settings = ReportSettings::from_file(file.path())
            .unwrap()
            .with_overrides(
                Some(ReportMode::Static),
                Some("performance".into()),
                Some("title_case".into()),
                Some(3),
            )
            .unwrap();
        assert_eq!(settings.mode, ReportMode::Static);
        assert_eq!(settings.profile.as_deref(), Some("performance"));
        assert_eq!(settings.layout.as_deref(), Some("title_case"));
        assert_eq!(settings.top_n.top_projects, 3);
        assert_eq!(settings.top_n.top_performers, 3);
        assert_eq!(settings.top_n.trend_rows, 50);
    }

    #[test]
    fn test_zero_top_override_rejected() {
        let err = ReportSettings::default()
            .with_overrides(None, None, None, Some(0))
            .unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_score_profile_fallback() {
        let settings = ReportSettings::default();
        assert_eq!(settings.score_profile("fleet").unwrap().name, "fleet");

        let settings = ReportSettings {
            profile: Some("performance".into()),
            ..Default::default()
        };
        assert_eq!(settings.score_profile("fleet").unwrap().name, "performance");
    }
}
