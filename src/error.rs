use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        ProviderError(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError(err.to_string())
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError(format!("Invalid JSON in provider response: {err}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    RenderProduct,
    GenerateTryOn,
    GenerateCreativePose,
    GenerateCreativeBackground,
    DescribePoseFromImage,
    DescribeBackgroundFromImage,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::RenderProduct => "render_product",
            Operation::GenerateTryOn => "generate_try_on",
            Operation::GenerateCreativePose => "generate_creative_pose",
            Operation::GenerateCreativeBackground => "generate_creative_background",
            Operation::DescribePoseFromImage => "describe_pose_from_image",
            Operation::DescribeBackgroundFromImage => "describe_background_from_image",
        }
    }

    fn fallback_message(self) -> String {
        match self {
            Operation::RenderProduct => {
                "Failed to render product. The image might be unclear or unsupported.".to_string()
            }
            Operation::GenerateTryOn => "Failed to generate image. Please try again.".to_string(),
            other => format!(
                "Failed to {}. Please try again.",
                other.as_str().replace('_', " ")
            ),
        }
    }
}

pub const RATE_LIMIT_MESSAGE: &str =
    "API request limit exceeded. Please wait a minute and try again.";
pub const SAFETY_MESSAGE: &str =
    "The request was blocked for safety reasons. Please try a different input.";

static QUOTA_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)quota").expect("valid quota pattern"));
static SAFETY_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)safety").expect("valid safety pattern"));

fn is_rate_limited(message: &str) -> bool {
    message.contains("429") || QUOTA_PATTERN.is_match(message)
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudioError {
    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,
    #[error("{}", SAFETY_MESSAGE)]
    SafetyBlocked,
    #[error("{message}")]
    Failed {
        operation: Operation,
        message: String,
    },
    #[error("{0}")]
    Validation(String),
}

impl StudioError {
    pub fn validation(message: impl Into<String>) -> Self {
        StudioError::Validation(message.into())
    }

    pub fn classify(err: &ProviderError, operation: Operation) -> Self {
        let message = err.message();
        if is_rate_limited(message) {
            return StudioError::RateLimited;
        }
        if SAFETY_PATTERN.is_match(message) {
            return StudioError::SafetyBlocked;
        }
        StudioError::Failed {
            operation,
            message: operation.fallback_message(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiStatus {
    Operational,
    Error(String),
}

impl ApiStatus {
    pub fn from_ping(result: Result<(), ProviderError>) -> Self {
        match result {
            Ok(()) => ApiStatus::Operational,
            Err(err) => {
                let message = err.message();
                let text = if message.contains("API key not valid") {
                    "API Status: Invalid API Key"
                } else if is_rate_limited(message) {
                    "API Status: Quota Exceeded"
                } else {
                    "API Status: Connection Failed"
                };
                ApiStatus::Error(text.to_string())
            }
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiStatus::Operational => "API Status: Operational",
            ApiStatus::Error(message) => message,
        }
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, ApiStatus::Operational)
    }
}
