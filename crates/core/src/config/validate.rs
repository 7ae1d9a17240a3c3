use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Worker program and script are set
/// - Staging and uploads directories differ (cleanup must never touch uploads)
/// - Uploads URL prefix is an absolute path other than `/`
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.worker.program.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "worker.program cannot be empty".to_string(),
        ));
    }

    if config.worker.script.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "worker.script cannot be empty".to_string(),
        ));
    }

    if config.staging.dir == config.staging.uploads_dir {
        return Err(ConfigError::ValidationError(
            "staging.dir and staging.uploads_dir must be different directories".to_string(),
        ));
    }

    let prefix = config.staging.uploads_url_prefix.trim_end_matches('/');
    if !config.staging.uploads_url_prefix.starts_with('/') || prefix.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "staging.uploads_url_prefix must start with '/' and name a path, got {:?}",
            config.staging.uploads_url_prefix
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_validate_default_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_uploads_prefix() {
        let mut config = Config::default();
        config.staging.uploads_url_prefix = "/".to_string();
        assert!(validate_config(&config).is_err());
        config.staging.uploads_url_prefix = "uploads".to_string();
        assert!(validate_config(&config).is_err());
        config.staging.uploads_url_prefix = "/media/".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_program_fails() {
        let mut config = Config::default();
        config.worker.program = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_shared_staging_dir_fails() {
        let mut config = Config::default();
        config.staging.uploads_dir = PathBuf::from("temp/shared");
        config.staging.dir = PathBuf::from("temp/shared");
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("uploads_dir"));
    }
}
