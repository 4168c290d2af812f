//! User preferences: theme, language and profile, over any key/value store.

pub mod lock;
pub mod store;

pub use store::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const THEME_KEY: &str = "theme";
pub const LANGUAGE_KEY: &str = "language";
pub const PROFILE_KEY: &str = "profile";

/// Language codes the interface can be switched to.
pub const SUPPORTED_LANGUAGES: [&str; 9] = ["en", "hi", "mr", "ta", "te", "kn", "pa", "gu", "bn"];

pub const DEFAULT_LANGUAGE: &str = "en";

/// UI colour theme.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(format!("Unknown theme: {}", s)),
        }
    }
}

/// Farmer profile shown in the dashboard header.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct UserProfile {
    pub name: String,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Typed access to the well-known preference keys.
pub struct Preferences<S: PreferenceStore> {
    store: S,
}

impl<S: PreferenceStore> Preferences<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stored theme; unreadable values fall back to the default.
    pub fn theme(&self) -> Result<Theme> {
        match self.store.get(THEME_KEY)? {
            Some(raw) => Ok(raw.parse().unwrap_or_else(|e| {
                tracing::warn!("{}; using default theme", e);
                Theme::default()
            })),
            None => Ok(Theme::default()),
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.set(THEME_KEY, &theme.to_string())
    }

    pub fn language(&self) -> Result<String> {
        Ok(self
            .store
            .get(LANGUAGE_KEY)?
            .filter(|l| SUPPORTED_LANGUAGES.contains(&l.as_str()))
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()))
    }

    pub fn set_language(&self, code: &str) -> Result<()> {
        let code = code.trim().to_lowercase();
        if !SUPPORTED_LANGUAGES.contains(&code.as_str()) {
            return Err(Error::Preference(format!(
                "Unsupported language '{}' (expected one of {})",
                code,
                SUPPORTED_LANGUAGES.join(", ")
            )));
        }
        self.store.set(LANGUAGE_KEY, &code)
    }

    pub fn profile(&self) -> Result<Option<UserProfile>> {
        match self.store.get(PROFILE_KEY)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn set_profile(&self, profile: &UserProfile) -> Result<()> {
        if profile.name.trim().is_empty() {
            return Err(Error::Preference("Profile name cannot be empty".to_string()));
        }
        self.store.set(PROFILE_KEY, &serde_json::to_string(profile)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefs() -> Preferences<MemoryPreferenceStore> {
        Preferences::new(MemoryPreferenceStore::new())
    }

    #[test]
    fn test_theme_defaults_and_roundtrip() {
        let p = prefs();
        assert_eq!(p.theme().unwrap(), Theme::Light);

        p.set_theme(Theme::Dark).unwrap();
        assert_eq!(p.theme().unwrap(), Theme::Dark);

        // Garbage written by another client falls back to the default
        p.store().set(THEME_KEY, "neon").unwrap();
        assert_eq!(p.theme().unwrap(), Theme::Light);
    }

    #[test]
    fn test_language_validation() {
        let p = prefs();
        assert_eq!(p.language().unwrap(), "en");

        p.set_language("HI").unwrap();
        assert_eq!(p.language().unwrap(), "hi");

        assert!(matches!(p.set_language("xx"), Err(Error::Preference(_))));
        assert_eq!(p.language().unwrap(), "hi");
    }

    #[test]
    fn test_profile() {
        let p = prefs();
        assert!(p.profile().unwrap().is_none());

        let profile = UserProfile {
            name: "Ramesh Patil".to_string(),
            village: Some("Shirur".to_string()),
            phone: None,
        };
        p.set_profile(&profile).unwrap();
        assert_eq!(p.profile().unwrap(), Some(profile));

        let blank = UserProfile::default();
        assert!(p.set_profile(&blank).is_err());
    }
}
