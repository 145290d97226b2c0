use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};
use tracing::warn;

pub const GALLERY_KEY: &str = "ai-try-on-gallery";
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        read_json_object(&self.path)
            .and_then(|payload| payload.get(key).and_then(Value::as_str).map(str::to_string))
    }

    pub fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut payload = read_json_object(&self.path).unwrap_or_default();
        payload.insert(key.to_string(), Value::String(value.to_string()));
        write_json_object(&self.path, &payload)
    }
}

fn read_json_object(path: &Path) -> Option<Map<String, Value>> {
    let raw = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(map)) => Some(map),
        Ok(_) => {
            warn!("Ignoring storage file {} without a JSON object", path.display());
            None
        }
        Err(err) => {
            warn!("Ignoring unreadable storage file {}: {}", path.display(), err);
            None
        }
    }
}

fn write_json_object(path: &Path, payload: &Map<String, Value>) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, serde_json::to_string_pretty(payload)?)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn load(store: &LocalStore) -> Self {
        store
            .get_item(THEME_KEY)
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    pub fn save(self, store: &LocalStore) -> anyhow::Result<()> {
        store.set_item(THEME_KEY, self.as_str())
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{other}', expected light or dark")),
        }
    }
}
