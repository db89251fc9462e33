mod types;

pub use types::*;

use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// Returns the config directory: `<config_dir>/gyrobot/`
pub fn config_dir() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("gyrobot");
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Returns the config file path: `<config_dir>/gyrobot/config.toml`
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load config from disk. A missing file yields the defaults, which are
/// written back so there is something to edit.
pub fn load_config() -> Result<AppConfig> {
    let path = config_path()?;
    if path.exists() {
        load_from(&path)
    } else {
        info!(?path, "No config found, writing defaults");
        let config = AppConfig::default();
        save_to(&path, &config)?;
        Ok(config)
    }
}

fn load_from(path: &Path) -> Result<AppConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config = parse_config(&contents)?;
    info!(?path, "Loaded config");
    Ok(config)
}

fn save_to(path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    info!(?path, "Saved config");
    Ok(())
}

/// Parse a TOML document. Sections and fields that are absent keep their defaults.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.tick_rate_hz, 120.0);
        assert_eq!(config.sensor.listen_addr, "0.0.0.0:8765");
        assert_eq!(config.control.natural_frequency, 8.0);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = parse_config(
            r#"
            tick_rate_hz = 60.0

            [control]
            damping_ratio = 1.3
            max_angular_acceleration = [30.0, 10.0, 8.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.tick_rate_hz, 60.0);
        assert_eq!(config.control.damping_ratio, 1.3);
        assert_eq!(config.control.natural_frequency, 8.0);
        assert_eq!(config.control.max_angular_acceleration.y, 10.0);
        assert_eq!(config.sensor.max_line_bytes, 4096);
    }

    #[test]
    fn saved_file_loads_back() {
        let dir = std::env::temp_dir().join(format!("gyrobot-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");

        let mut config = AppConfig::default();
        config.sensor.listen_addr = "127.0.0.1:9000".into();
        config.host.hold_position = glam::DVec3::new(1.0, 2.0, 3.0);
        save_to(&path, &config).unwrap();

        let loaded = load_from(&path).unwrap();
        assert_eq!(loaded.sensor.listen_addr, "127.0.0.1:9000");
        assert_eq!(loaded.host.hold_position, glam::DVec3::new(1.0, 2.0, 3.0));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn wrong_vector_length_is_rejected() {
        let err = parse_config("[host]\nhold_position = [1.0, 2.0]\n");
        assert!(err.is_err());
    }
}
