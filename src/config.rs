use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub attendance: AttendanceConfig,

    pub face_api: FaceApiConfig,

    pub mailer: MailerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/rollcall.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// In-time threshold seeded into the settings store on first read (HH:MM)
    pub default_in_time: String,

    /// Hour of day (0-23) from which absence marking becomes effective
    pub absence_cutoff_hour: u32,

    /// Minutes an issued OTP stays confirmable
    pub otp_ttl_minutes: u64,

    /// Minimum eye-center separation (image pixels) accepted by the
    /// proximity gate on the primary verification path
    pub min_eye_distance: f64,
}

impl Default for AttendanceConfig {
    fn default() -> Self {
        Self {
            default_in_time: "09:30".to_string(),
            absence_cutoff_hour: 14,
            otp_ttl_minutes: 10,
            min_eye_distance: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FaceApiConfig {
    pub base_url: String,

    /// Request timeout in seconds (default: 30)
    pub request_timeout_seconds: u32,
}

impl Default for FaceApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8100".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MailerConfig {
    pub enabled: bool,

    pub api_url: String,

    pub api_key: String,

    pub sender_email: String,

    pub sender_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_url: "https://api.brevo.com/v3/smtp/email".to_string(),
            api_key: String::new(),
            sender_email: "noreply@example.com".to_string(),
            sender_name: "Rollcall".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            attendance: AttendanceConfig::default(),
            face_api: FaceApiConfig::default(),
            mailer: MailerConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("rollcall").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".rollcall").join("config.toml"));
        }

        paths
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = PathBuf::from("config.toml");
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.attendance.absence_cutoff_hour > 23 {
            anyhow::bail!("attendance.absence_cutoff_hour must be between 0 and 23");
        }

        if chrono::NaiveTime::parse_from_str(&self.attendance.default_in_time, "%H:%M").is_err() {
            anyhow::bail!(
                "attendance.default_in_time must be HH:MM, got '{}'",
                self.attendance.default_in_time
            );
        }

        if self.mailer.enabled && self.mailer.api_key.is_empty() {
            anyhow::bail!("mailer.api_key cannot be empty when the mailer is enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.attendance.default_in_time, "09:30");
        assert_eq!(config.attendance.absence_cutoff_hour, 14);
        assert_eq!(config.attendance.otp_ttl_minutes, 10);
        assert_eq!(config.server.port, 5000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[attendance]"));
        assert!(toml_str.contains("[face_api]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [attendance]
            absence_cutoff_hour = 12
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.attendance.absence_cutoff_hour, 12);

        assert_eq!(config.face_api.base_url, "http://localhost:8100");
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut config = Config::default();
        config.attendance.default_in_time = "25:00".to_string();
        assert!(config.validate().is_err());
    }
}
