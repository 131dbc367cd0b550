use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be positive")]
    NotPositive { field: &'static str },

    #[error("Invalid URL for {field}: '{url}' (expected http:// or https://)")]
    InvalidUrl { field: &'static str, url: String },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_debrid(config)?;
    validate_torrserver(config)?;
    validate_http(config)?;
    validate_urls(config)?;
    Ok(())
}

fn positive(field: &'static str, value: u64) -> Result<(), ValidationError> {
    if value == 0 {
        return Err(ValidationError::NotPositive { field });
    }
    Ok(())
}

/// Polling with a zero budget on any axis could never succeed
fn validate_debrid(config: &Config) -> Result<(), ValidationError> {
    positive("debrid.max_retries", config.debrid.max_retries.into())?;
    positive("debrid.polling_interval_ms", config.debrid.polling_interval_ms)?;
    positive("debrid.download_timeout_secs", config.debrid.download_timeout_secs)?;
    Ok(())
}

fn validate_torrserver(config: &Config) -> Result<(), ValidationError> {
    positive(
        "torrserver.metadata_attempts",
        config.torrserver.metadata_attempts.into(),
    )?;
    Ok(())
}

fn validate_http(config: &Config) -> Result<(), ValidationError> {
    positive("http.connect_timeout_secs", config.http.connect_timeout_secs)?;
    positive("http.request_timeout_secs", config.http.request_timeout_secs)?;
    Ok(())
}

fn validate_urls(config: &Config) -> Result<(), ValidationError> {
    check_scheme("realdebrid.base_url", &config.realdebrid.base_url)?;

    if let Some(url) = &config.credentials.torrserver_url {
        check_scheme("torrserverUrl", url)?;
    }

    Ok(())
}

fn check_scheme(field: &'static str, url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        return Ok(());
    }
    Err(ValidationError::InvalidUrl {
        field,
        url: url.to_string(),
    })
}
