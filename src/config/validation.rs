use super::models::Config;
use thiserror::Error;
use tokio::sync::Semaphore;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("downloads.max_concurrent must be at least 1")]
    ZeroConcurrency,

    #[error("downloads.max_concurrent ({actual}) exceeds the limit of {limit}")]
    ConcurrencyTooLarge { actual: usize, limit: usize },

    #[error("downloads.max_duration_secs must be positive")]
    ZeroDurationLimit,

    #[error("downloads.container_format '{0}' must be a non-empty alphanumeric extension")]
    InvalidContainerFormat(String),

    #[error("downloads.format_selector must not be empty")]
    EmptyFormatSelector,

    #[error("media.binary must not be empty")]
    EmptyBinary,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    let downloads = &config.downloads;

    if downloads.max_concurrent == 0 {
        return Err(ValidationError::ZeroConcurrency);
    }

    if downloads.max_concurrent > Semaphore::MAX_PERMITS {
        return Err(ValidationError::ConcurrencyTooLarge {
            actual: downloads.max_concurrent,
            limit: Semaphore::MAX_PERMITS,
        });
    }

    if downloads.max_duration_secs == 0 {
        return Err(ValidationError::ZeroDurationLimit);
    }

    let format = &downloads.container_format;
    if format.is_empty() || !format.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidContainerFormat(format.clone()));
    }

    if downloads.format_selector.trim().is_empty() {
        return Err(ValidationError::EmptyFormatSelector);
    }

    if config.media.binary.as_os_str().is_empty() {
        return Err(ValidationError::EmptyBinary);
    }

    Ok(())
}
