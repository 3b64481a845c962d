use anyhow::Result;
use recdraft_infrastructure::ConfigService;

/// Renders the effective configuration as TOML.
pub fn show(service: &ConfigService) -> Result<String> {
    let config = service.get_config()?;
    let body = toml::to_string_pretty(&config)?;
    Ok(format!("# {}\n{}", service.path().display(), body))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_show_defaults_when_file_missing() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));

        let out = show(&service).unwrap();

        assert!(out.contains("interval_ms = 5000"));
        assert!(out.contains("debounce_ms = 1000"));
        assert!(out.contains("persist_validity = true"));
    }
}
