//! Static data bundled into the binary: locale tables and APL documents

use rust_embed::RustEmbed;
use serde_json::Value;

use crate::{Result, SkillError};

const LANGUAGE_STRINGS: &str = "language_strings.json";

/// APL document shown by the "hello world with button" intent
pub const HELLO_WORLD_WITH_BUTTON_DOCUMENT: &str = "apl/hello_world_with_button.json";

#[derive(RustEmbed)]
#[folder = "resources/"]
pub struct SkillResources;

impl SkillResources {
    pub fn language_strings() -> Result<String> {
        Self::text(LANGUAGE_STRINGS)
    }

    /// Parse a bundled APL document
    pub fn apl_document(path: &str) -> Result<Value> {
        let raw = Self::text(path)?;
        serde_json::from_str(&raw).map_err(|e| {
            SkillError::Configuration(format!("invalid APL document '{}': {}", path, e))
        })
    }

    fn text(path: &str) -> Result<String> {
        let file = Self::get(path)
            .ok_or_else(|| SkillError::Configuration(format!("missing resource '{}'", path)))?;
        String::from_utf8(file.data.into_owned())
            .map_err(|e| SkillError::Configuration(format!("resource '{}' is not UTF-8: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_document_is_valid_apl() {
        let document = SkillResources::apl_document(HELLO_WORLD_WITH_BUTTON_DOCUMENT).unwrap();
        assert_eq!(document["type"], "APL");
        let text = document.to_string();
        assert!(text.contains("fadeHelloTextButton"));
        assert!(text.contains("helloTextComponent"));
    }

    #[test]
    fn test_missing_resource() {
        assert!(matches!(
            SkillResources::apl_document("apl/nope.json"),
            Err(SkillError::Configuration(_))
        ));
    }
}
