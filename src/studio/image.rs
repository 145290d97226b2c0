use std::path::Path;

use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};

pub const PNG_MIME: &str = "image/png";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub base64: String,
    pub mime_type: String,
}

pub fn detect_mime_type(data: &[u8]) -> Option<String> {
    if data.len() > 12 {
        let ftyp = &data[4..12];
        if ftyp.starts_with(b"ftyp") {
            let brand = &ftyp[4..8];
            if brand == b"heic" || brand == b"heif" || brand == b"hevc" {
                return Some("image/heic".to_string());
            }
        }
    }

    infer::get(data).map(|kind| kind.mime_type().to_string())
}

fn normalize_mime_type(mime_type: &str) -> String {
    let lowered = mime_type.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "image/jpg" => "image/jpeg".to_string(),
        _ => lowered,
    }
}

impl ImageData {
    pub fn new(base64: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ImageData {
            base64: base64.into(),
            mime_type: normalize_mime_type(&mime_type.into()),
        }
    }

    pub fn png(base64: impl Into<String>) -> Self {
        ImageData::new(base64, PNG_MIME)
    }

    pub fn from_bytes(bytes: &[u8], mime_hint: Option<&str>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(anyhow!("Image data is empty"));
        }
        let mime_type = detect_mime_type(bytes)
            .or_else(|| mime_hint.map(str::to_string))
            .ok_or_else(|| anyhow!("Unable to determine image type"))?;
        let mime_type = normalize_mime_type(&mime_type);
        if !mime_type.starts_with("image/") {
            return Err(anyhow!("Unsupported file type {mime_type}, expected an image"));
        }
        Ok(ImageData {
            base64: general_purpose::STANDARD.encode(bytes),
            mime_type,
        })
    }

    pub async fn from_file(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image {}", path.display()))?;
        ImageData::from_bytes(&bytes, None)
            .with_context(|| format!("Failed to load image {}", path.display()))
    }

    pub fn from_data_uri(uri: &str) -> Option<Self> {
        let rest = uri.strip_prefix("data:")?;
        let (header, payload) = rest.split_once(',')?;
        let mime_type = header.strip_suffix(";base64")?;
        if mime_type.is_empty() || payload.is_empty() {
            return None;
        }
        Some(ImageData::new(payload, mime_type))
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64)
    }

    pub fn decode(&self) -> Result<Vec<u8>> {
        general_purpose::STANDARD
            .decode(self.base64.trim())
            .context("Image payload is not valid base64")
    }
}
