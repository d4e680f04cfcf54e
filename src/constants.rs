/// API key validation constants
pub const API_KEY_LENGTH: usize = 39;
pub const API_KEY_PREFIX: &str = "AIza";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fast multimodal model used for task extraction
pub const DEFAULT_EXTRACT_MODEL: &str = "gemini-2.5-flash";

/// Reasoning model used for day planning
pub const DEFAULT_PLAN_MODEL: &str = "gemini-3-pro-preview";

/// Thinking token budget granted to the planning model
pub const DEFAULT_THINKING_BUDGET: u32 = 2048;

pub fn get_default_extract_model() -> String {
    std::env::var("LIFEORG_EXTRACT_MODEL").unwrap_or_else(|_| DEFAULT_EXTRACT_MODEL.to_string())
}

pub fn get_default_plan_model() -> String {
    std::env::var("LIFEORG_PLAN_MODEL").unwrap_or_else(|_| DEFAULT_PLAN_MODEL.to_string())
}

/// Get thinking budget from environment variable or default
pub fn get_thinking_budget() -> u32 {
    std::env::var("LIFEORG_THINKING_BUDGET")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_THINKING_BUDGET)
}

/// Earliest start time handed to the planner
pub const PLAN_DAY_START: &str = "09:00";

/// Settings storage
pub const APP_DIR_NAME: &str = ".lifeorg";
pub const SETTINGS_FILE_NAME: &str = "settings.json";
pub const THEME_KEY: &str = "theme";

/// Inline payload MIME types sent to the model
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";
pub const AUDIO_MIME_TYPE: &str = "audio/wav";

/// Image formats accepted for attachment (re-encoded to JPEG before upload)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

/// URLs for user guidance
pub const GEMINI_API_KEY_URL: &str = "https://makersuite.google.com/app/apikey";
pub const GEMINI_DOCS_URL: &str = "https://ai.google.dev/gemini-api/docs/api-key";
