use crate::config::types::{Config, HttpConfig, OutputConfig, PagesConfig, RetryConfig, SiteConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
///
/// Called by the loader, and again by the CLI after command-line overrides
/// have been merged in.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_site_config(&config.site)?;
    validate_pages_config(&config.pages)?;
    validate_output_config(&config.output)?;
    validate_retry_config(&config.retry)?;
    validate_http_config(&config.http)?;
    Ok(())
}

/// Validates the origin description
fn validate_site_config(config: &SiteConfig) -> ConfigResult<()> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.category.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "category cannot be empty".to_string(),
        ));
    }

    if config.text_endpoint.trim_matches('/').is_empty() {
        return Err(ConfigError::Validation(
            "text-endpoint cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates catalog page bounds
fn validate_pages_config(config: &PagesConfig) -> ConfigResult<()> {
    if config.start < 1 {
        return Err(ConfigError::Validation(format!(
            "pages.start must be >= 1, got {}",
            config.start
        )));
    }

    if let Some(end) = config.end {
        if end < config.start {
            return Err(ConfigError::Validation(format!(
                "pages.end ({}) must not be before pages.start ({})",
                end, config.start
            )));
        }
    }

    Ok(())
}

/// Validates output locations
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.dest_folder.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "dest-folder cannot be empty".to_string(),
        ));
    }

    if config.books_dir.as_os_str().is_empty() || config.images_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "books-dir and images-dir cannot be empty".to_string(),
        ));
    }

    if config.results_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "results-file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the retry bound
fn validate_retry_config(config: &RetryConfig) -> ConfigResult<()> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates HTTP client settings
fn validate_http_config(config: &HttpConfig) -> ConfigResult<()> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout-secs must be > 0".to_string(),
        ));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        config.site.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.site.base_url = "ftp://tululu.org".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.site.base_url = "http://127.0.0.1:8080".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_category() {
        let mut config = Config::default();
        config.site.category = "/".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_page_bounds() {
        let mut config = Config::default();
        config.pages.start = 0;
        assert!(validate(&config).is_err());

        config.pages.start = 3;
        config.pages.end = Some(3);
        assert!(validate(&config).is_ok());

        config.pages.end = Some(2);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_retry_and_timeout() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;
        assert!(validate(&config).is_err());

        config.retry.max_attempts = 1;
        config.http.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }
}
