use std::env;
use std::path::PathBuf;

use anyhow::Result;
use once_cell::sync::Lazy;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub log_dir: PathBuf,
    pub gemini_api_key: String,
    pub gemini_api_base: String,
    pub gemini_text_model: String,
    pub gemini_image_model: String,
    pub gemini_safety_settings: String,
    pub gemini_request_timeout_secs: u64,
    pub storage_path: PathBuf,
    pub output_dir: PathBuf,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_path(name: &str, default: &str) -> PathBuf {
    let value = env_string(name, default);
    let trimmed = value.trim();
    if trimmed.is_empty() {
        PathBuf::from(default)
    } else {
        PathBuf::from(trimmed)
    }
}

fn normalize_gemini_safety_settings(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return "standard".to_string();
    }
    let lowered = trimmed.to_lowercase();
    match lowered.as_str() {
        "standard" | "permissive" => lowered,
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using standard.",
                trimmed
            );
            "standard".to_string()
        }
    }
}

fn normalize_api_base(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            log_dir: env_path("LOG_DIR", "logs"),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_api_base: normalize_api_base(env_string(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            )),
            gemini_text_model: env_string("GEMINI_TEXT_MODEL", "gemini-2.5-flash"),
            gemini_image_model: env_string("GEMINI_IMAGE_MODEL", "gemini-2.5-flash-image"),
            gemini_safety_settings: normalize_gemini_safety_settings(env_string(
                "GEMINI_SAFETY_SETTINGS",
                "standard",
            )),
            gemini_request_timeout_secs: env_u64("GEMINI_REQUEST_TIMEOUT_SECS", 120).max(1),
            storage_path: env_path("STORAGE_PATH", "tryon_storage.json"),
            output_dir: env_path("OUTPUT_DIR", "output"),
        })
    }

    pub fn has_gemini_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }
}
