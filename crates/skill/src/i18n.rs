//! Localisation
//!
//! Resolves the request locale against the string tables and hands handlers a
//! [`Translator`] bound to the resolved locale. Tables use the same layout as
//! the skill's `languageStrings` resources:
//!
//! ```json
//! { "en": { "translation": { "WELCOME_MSG": "Welcome..." } } }
//! ```
//!
//! Lookups walk a fallback chain: exact tag (`en-GB`), its language (`en`),
//! then the default locale and its language.

use std::{collections::HashMap, sync::Arc};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{resources::SkillResources, Result, SkillError};

/// Namespace the tables are stored under
const TRANSLATION_NAMESPACE: &str = "translation";

/// Locale → (message key → template)
#[derive(Debug, Clone, Default)]
pub struct LanguageStrings {
    tables: HashMap<String, HashMap<String, String>>,
}

impl LanguageStrings {
    /// Tables bundled with the skill
    pub fn embedded() -> Result<Self> {
        let raw = SkillResources::language_strings()?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| SkillError::Configuration(format!("invalid language strings: {}", e)))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self> {
        let locales = value.as_object().ok_or_else(|| {
            SkillError::Configuration("language strings must be an object keyed by locale".into())
        })?;

        let mut tables = HashMap::new();
        for (locale, resources) in locales {
            let messages = resources.get(TRANSLATION_NAMESPACE).unwrap_or(resources);
            let mut table = HashMap::new();
            flatten_messages(locale, "", messages, &mut table)?;
            tables.insert(locale.clone(), table);
        }

        Ok(Self { tables })
    }

    pub fn insert(&mut self, locale: &str, key: &str, template: &str) {
        self.tables
            .entry(locale.to_string())
            .or_default()
            .insert(key.to_string(), template.to_string());
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.tables.contains_key(locale)
    }

    fn lookup(&self, locale: &str, key: &str) -> Option<&str> {
        self.tables.get(locale)?.get(key).map(String::as_str)
    }
}

fn flatten_messages(
    locale: &str,
    prefix: &str,
    value: &Value,
    table: &mut HashMap<String, String>,
) -> Result<()> {
    let entries = value.as_object().ok_or_else(|| {
        SkillError::Configuration(format!("strings for locale '{}' must be an object", locale))
    })?;

    for (key, entry) in entries {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match entry {
            Value::String(template) => {
                table.insert(full_key, template.clone());
            }
            Value::Object(_) => flatten_messages(locale, &full_key, entry, table)?,
            other => {
                return Err(SkillError::Configuration(format!(
                    "string '{}' for locale '{}' is not text: {}",
                    full_key, locale, other
                )));
            }
        }
    }
    Ok(())
}

/// Binds requests to a string table, falling back to a default locale
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    strings: Arc<LanguageStrings>,
    default_locale: Option<String>,
}

impl LocaleResolver {
    pub fn new(strings: Arc<LanguageStrings>, default_locale: Option<String>) -> Self {
        Self {
            strings,
            default_locale,
        }
    }

    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    /// Whether the default locale resolves to a table on its own
    pub fn has_default_table(&self) -> bool {
        self.default_locale
            .as_deref()
            .map(|locale| {
                locale_candidates(locale)
                    .iter()
                    .any(|candidate| self.strings.has_locale(candidate))
            })
            .unwrap_or(false)
    }

    /// Build the translator for a request locale
    pub fn resolve(&self, requested: Option<&str>) -> Result<Translator> {
        let mut chain: Vec<String> = Vec::new();
        let push = |candidate: String, chain: &mut Vec<String>| {
            if self.strings.has_locale(&candidate) && !chain.contains(&candidate) {
                chain.push(candidate);
            }
        };

        if let Some(locale) = requested {
            for candidate in locale_candidates(locale) {
                push(candidate, &mut chain);
            }
        }
        let requested_matched = !chain.is_empty();

        if let Some(default) = self.default_locale.as_deref() {
            for candidate in locale_candidates(default) {
                push(candidate, &mut chain);
            }
        }

        if chain.is_empty() {
            return Err(SkillError::Configuration(format!(
                "no string table for locale {:?} and no usable default locale ({:?})",
                requested, self.default_locale
            )));
        }

        if !requested_matched {
            debug!(
                requested = ?requested,
                resolved = %chain[0],
                "Locale not supported, using default locale"
            );
        }

        Ok(Translator {
            strings: self.strings.clone(),
            chain,
        })
    }
}

/// `en-GB` → [`en-GB`, `en`]
fn locale_candidates(locale: &str) -> Vec<String> {
    let mut candidates = vec![locale.to_string()];
    if let Some((language, _)) = locale.split_once(['-', '_']) {
        if !language.is_empty() {
            candidates.push(language.to_string());
        }
    }
    candidates
}

/// Text lookup bound to one request's resolved locale
#[derive(Debug, Clone)]
pub struct Translator {
    strings: Arc<LanguageStrings>,
    chain: Vec<String>,
}

impl Translator {
    /// The locale whose table is consulted first
    pub fn locale(&self) -> &str {
        &self.chain[0]
    }

    pub fn t(&self, key: &str) -> String {
        self.t_args(key, &[])
    }

    /// Look up `key` and interpolate `{{name}}` (escaped) / `{{- name}}` (raw) placeholders
    pub fn t_args(&self, key: &str, args: &[(&str, &str)]) -> String {
        match self.find(&[key]) {
            Some(template) => interpolate(template, args),
            None => self.missing(key),
        }
    }

    /// Pick `KEY_zero` / `KEY_one` / `KEY_other` by `count`, falling back to `KEY`
    pub fn t_plural(&self, key: &str, count: u64, args: &[(&str, &str)]) -> String {
        let zero = format!("{}_zero", key);
        let one = format!("{}_one", key);
        let other = format!("{}_other", key);

        let mut candidates: Vec<&str> = Vec::with_capacity(4);
        match count {
            0 => candidates.push(&zero),
            1 => candidates.push(&one),
            _ => {}
        }
        candidates.push(&other);
        candidates.push(key);

        let count_text = count.to_string();
        let mut all_args: Vec<(&str, &str)> = args.to_vec();
        all_args.push(("count", count_text.as_str()));

        match self.find(&candidates) {
            Some(template) => interpolate(template, &all_args),
            None => self.missing(key),
        }
    }

    fn find(&self, keys: &[&str]) -> Option<&str> {
        self.chain.iter().find_map(|locale| {
            keys.iter()
                .find_map(|key| self.strings.lookup(locale, key))
        })
    }

    fn missing(&self, key: &str) -> String {
        warn!(key, locale = %self.locale(), "Missing translation");
        key.to_string()
    }
}

fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        let Some(len) = rest[start + 2..].find("}}") else {
            break;
        };
        out.push_str(&rest[..start]);

        let placeholder = &rest[start..start + 2 + len + 2];
        let inner = rest[start + 2..start + 2 + len].trim();
        let (name, raw) = match inner.strip_prefix('-') {
            Some(name) => (name.trim(), true),
            None => (inner, false),
        };

        match args.iter().find(|(arg, _)| *arg == name) {
            Some((_, value)) if raw => out.push_str(value),
            Some((_, value)) => out.push_str(&xml_escape(value)),
            None => out.push_str(placeholder),
        }

        rest = &rest[start + 2 + len + 2..];
    }

    out.push_str(rest);
    out
}

/// Escape special XML characters so interpolated values are safe inside SSML
pub fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
