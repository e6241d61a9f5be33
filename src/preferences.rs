use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

use crate::errors::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Blue,
    Green,
    Orange,
    Purple,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Default,
        Theme::Blue,
        Theme::Green,
        Theme::Orange,
        Theme::Purple,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Blue => "blue",
            Theme::Green => "green",
            Theme::Orange => "orange",
            Theme::Purple => "purple",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.as_str() == wanted)
            .ok_or_else(|| ClientError::Validation(format!("Unknown theme: {}", s)))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preferences {
    #[serde(default, deserialize_with = "theme_or_default")]
    pub app_theme: Theme,
}

// Unknown or missing theme names fall back to the default theme
fn theme_or_default<'de, D>(deserializer: D) -> Result<Theme, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(match raw {
        Some(name) => match name.parse() {
            Ok(theme) => theme,
            Err(_) => {
                warn!(theme = %name, "unknown saved theme; using default");
                Theme::default()
            }
        },
        None => Theme::default(),
    })
}

/// JSON file holding client-side preferences.
#[derive(Debug, Clone)]
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means defaults.
    pub fn load(&self) -> Result<Preferences, ClientError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no preferences file; using defaults");
                Ok(Preferences::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, preferences: &Preferences) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let payload = serde_json::to_vec_pretty(preferences)?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    pub fn theme(&self) -> Result<Theme, ClientError> {
        Ok(self.load()?.app_theme)
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), ClientError> {
        let mut preferences = self.load()?;
        preferences.app_theme = theme;
        self.save(&preferences)
    }
}
