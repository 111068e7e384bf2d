//! Brand theme supplied by the caller
//!
//! The retriever never analyses a theme; it only needs a stable textual
//! description to embed and to hand to prompt enhancement as grounding.

use crate::error::{BrandragError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Palette entries, usually hex codes
    #[serde(default)]
    pub colors: Vec<String>,
}

impl Theme {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_target_audience(mut self, audience: impl Into<String>) -> Self {
        self.target_audience = Some(audience.into());
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.colors = colors.into_iter().map(Into::into).collect();
        self
    }

    /// Load a theme from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| BrandragError::Io {
            source: e,
            context: format!("Failed to read theme file: {}", path.display()),
        })?;

        let theme: Theme = toml::from_str(&contents)?;
        if theme.name.trim().is_empty() {
            return Err(BrandragError::InvalidConfigValue {
                path: "name".to_string(),
                message: format!("Theme in {} has an empty name", path.display()),
            });
        }

        Ok(theme)
    }

    /// Synthesize the theme description used for embedding and grounding
    ///
    /// Same theme, same text. Blank optional fields and blank list entries
    /// are skipped.
    pub fn describe(&self) -> String {
        let mut parts = vec![format!("Brand theme \"{}\".", self.name.trim())];

        if let Some(description) = non_blank(&self.description) {
            parts.push(sentence(description));
        }
        if let Some(tone) = non_blank(&self.tone) {
            parts.push(format!("Tone: {}.", tone));
        }
        if let Some(audience) = non_blank(&self.target_audience) {
            parts.push(format!("Audience: {}.", audience));
        }
        if let Some(keywords) = joined(&self.keywords) {
            parts.push(format!("Keywords: {}.", keywords));
        }
        if let Some(colors) = joined(&self.colors) {
            parts.push(format!("Palette: {}.", colors));
        }

        parts.join(" ")
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn joined(values: &[String]) -> Option<String> {
    let values: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

fn sentence(text: &str) -> String {
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{}.", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_describe_name_only() {
        assert_eq!(Theme::new("Acme").describe(), "Brand theme \"Acme\".");
    }

    #[test]
    fn test_describe_full_theme() {
        let theme = Theme::new("Acme")
            .with_description("Bold outdoor gear")
            .with_tone("playful")
            .with_target_audience("young hikers")
            .with_keywords(["adventure", " ", "trail"])
            .with_colors(["#ff6600", "#003366"]);

        assert_eq!(
            theme.describe(),
            "Brand theme \"Acme\". Bold outdoor gear. Tone: playful. \
             Audience: young hikers. Keywords: adventure, trail. \
             Palette: #ff6600, #003366."
        );
    }

    #[test]
    fn test_describe_skips_blank_fields() {
        let theme = Theme::new("Acme")
            .with_description("Made to last!")
            .with_tone("   ");

        assert_eq!(theme.describe(), "Brand theme \"Acme\". Made to last!");
        assert_eq!(theme.describe(), theme.describe());
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "name = \"Acme\"\ntone = \"calm\"\nkeywords = [\"coffee\", \"morning\"]"
        )
        .unwrap();

        let theme = Theme::load(file.path()).unwrap();
        assert_eq!(theme.name, "Acme");
        assert_eq!(theme.tone.as_deref(), Some("calm"));
        assert_eq!(theme.keywords, vec!["coffee", "morning"]);
        assert!(theme.colors.is_empty());
    }

    #[test]
    fn test_load_rejects_empty_name() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"\"").unwrap();
        assert!(Theme::load(file.path()).is_err());
    }
}
