//! Skill configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{i18n::LanguageStrings, Result, SkillError};

/// Configuration for the Hello World skill
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillConfig {
    /// Locale used when the request's locale has no string table
    #[serde(default = "default_locale")]
    pub default_locale: Option<String>,
    /// Fragment appended to the response user agent
    #[serde(default = "default_user_agent")]
    pub custom_user_agent: Option<String>,
    /// Reject handler registrations that can never be reached
    #[serde(default)]
    pub strict_routing: bool,
    /// Load string tables from this file instead of the bundled ones
    #[serde(default)]
    pub language_strings_path: Option<PathBuf>,
}

fn default_locale() -> Option<String> {
    Some("en-US".to_string())
}

fn default_user_agent() -> Option<String> {
    Some("sample/hello-world/v1.2".to_string())
}

impl Default for SkillConfig {
    fn default() -> Self {
        Self {
            default_locale: default_locale(),
            custom_user_agent: default_user_agent(),
            strict_routing: false,
            language_strings_path: None,
        }
    }
}

impl SkillConfig {
    /// Create config from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let get_env = |key: &str| -> Option<String> {
            std::env::var(key)
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        Self {
            default_locale: get_env("SKILL_DEFAULT_LOCALE").or_else(default_locale),
            custom_user_agent: get_env("SKILL_USER_AGENT").or_else(default_user_agent),
            strict_routing: get_env("SKILL_STRICT_ROUTING")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
            language_strings_path: get_env("SKILL_LANGUAGE_STRINGS").map(PathBuf::from),
        }
    }

    /// String tables from the configured file, or the bundled ones
    pub fn language_strings(&self) -> Result<LanguageStrings> {
        match &self.language_strings_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    SkillError::Configuration(format!(
                        "cannot read language strings {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                LanguageStrings::from_json_str(&raw)
            }
            None => LanguageStrings::embedded(),
        }
    }
}
