use anyhow::Result;
use std::env;

use crate::constants::{
    API_KEY_ENV, API_KEY_LENGTH, API_KEY_PREFIX, GEMINI_API_KEY_URL, GEMINI_DOCS_URL,
};
use crate::logging::{log_error, log_info, log_warn};

/// Read the Gemini API key from the environment.
/// Prints setup guidance to stderr when it is missing.
pub fn get_api_key() -> Result<String> {
    match env::var(API_KEY_ENV) {
        Ok(key) if !key.trim().is_empty() => {
            log_info(&format!("Found {API_KEY_ENV} environment variable"));
            let key = key.trim().to_string();
            if !validate_api_key_format(&key) {
                eprintln!("⚠️  Warning: API key format seems incorrect.");
                eprintln!("   Expected format: {API_KEY_PREFIX}... ({API_KEY_LENGTH} characters)");
            }
            Ok(key)
        }
        Ok(_) => {
            log_error(&format!("{API_KEY_ENV} environment variable is empty"));
            handle_api_key_error()
        }
        Err(_) => {
            log_error(&format!("{API_KEY_ENV} environment variable not found"));
            handle_api_key_error()
        }
    }
}

fn handle_api_key_error() -> Result<String> {
    eprintln!();
    eprintln!("🔑 API Key Required");
    eprintln!("===================");
    eprintln!();
    eprintln!("Extracting tasks and planning your day needs a Google Gemini API key.");
    eprintln!();
    eprintln!("1. Visit: {GEMINI_API_KEY_URL}");
    eprintln!("2. Click 'Create API Key' and copy it");
    eprintln!("3. Export it before starting lifeorg:");
    eprintln!();
    eprintln!("  export {API_KEY_ENV}=\"your_api_key_here\"");
    eprintln!();
    eprintln!("📚 Documentation: {GEMINI_DOCS_URL}");
    eprintln!();

    Err(anyhow::anyhow!(
        "{API_KEY_ENV} environment variable is required. Visit {GEMINI_API_KEY_URL} to get your API key."
    ))
}

/// Google API keys start with "AIza" and are 39 characters long
pub fn validate_api_key_format(api_key: &str) -> bool {
    if api_key.len() != API_KEY_LENGTH {
        log_warn(&format!(
            "API key length is not {API_KEY_LENGTH} characters (expected for Google API keys)"
        ));
        return false;
    }

    if !api_key.starts_with(API_KEY_PREFIX) {
        log_warn(&format!(
            "API key does not start with '{API_KEY_PREFIX}' (expected for Google API keys)"
        ));
        return false;
    }

    if !api_key
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        log_warn("API key contains invalid characters");
        return false;
    }

    true
}
