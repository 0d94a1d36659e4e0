use std::{env, fmt, fs, path, time::Duration};

use logger::LogSettings;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: Monitor,
    pub storage: Storage,
    pub notifications: Option<Notifications>,
    pub logging: LogSettings,
}

/// Timing and fan-out of the background engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Monitor {
    /// Seconds between two check sweeps
    pub sweep_interval_seconds: u64,
    /// Seconds between two log rotations
    pub rotation_interval_seconds: u64,
    /// Upper bound on probes in flight at once; 0 disables the bound
    pub max_concurrent_checks: usize,
    pub user_agent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Storage {
    pub data_dir: path::PathBuf,
    pub log_dir: path::PathBuf,
}

/// SMS gateway credentials. Alerts are only logged when this section is absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notifications {
    pub account_sid: String,
    pub auth_token: String,
    pub from_phone: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_country_code")]
    pub country_code: String,
}

fn default_api_base() -> String {
    "https://api.twilio.com".into()
}

fn default_country_code() -> String {
    "+1".into()
}

impl Default for Monitor {
    fn default() -> Self {
        Self {
            sweep_interval_seconds: 60,
            rotation_interval_seconds: 24 * 60 * 60,
            max_concurrent_checks: 32,
            user_agent: concat!("upwatch/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self { data_dir: ".data".into(), log_dir: ".logs".into() }
    }
}

impl Monitor {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }

    pub fn rotation_interval(&self) -> Duration {
        Duration::from_secs(self.rotation_interval_seconds)
    }

    /// `None` when fan-out is unbounded
    pub fn concurrency_limit(&self) -> Option<usize> {
        (self.max_concurrent_checks > 0).then_some(self.max_concurrent_checks)
    }
}

/// Used to ensure we are actually reading a toml file
fn normalize_toml_path(path: &path::Path) -> path::PathBuf {
    let mut path = path.to_path_buf();
    if path.extension().map(|ext| ext != "toml").unwrap_or(true) {
        path.set_extension("toml");
    }
    path
}

/// Get default config path ($XDG_CONFIG_HOME/upwatch/config.toml or
/// $HOME/.config/...)
fn default_config_path() -> Result<path::PathBuf, ConfigError> {
    let path = if let Ok(config_home) = env::var("XDG_CONFIG_HOME") {
        path::PathBuf::from(config_home)
    } else if let Some(home_dir) = env::home_dir() {
        home_dir.join(".config")
    } else {
        return Err(ConfigError::PathUnavailable);
    };

    Ok(path.join("upwatch/config.toml"))
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let write_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str, value: &dyn fmt::Display| {
                writeln!(f, "  {:indent$}{}: {}", "", label, value, indent = level * 2)
            }
        };
        let write_title_indented = |level: usize| {
            move |f: &mut fmt::Formatter<'_>, label: &str| {
                writeln!(f, "{:indent$}{}", "", label, indent = level * 2)
            }
        };

        let write_title_1 = write_title_indented(1);
        let write_1 = write_indented(1);

        writeln!(f, "Current Configuration:")?;
        write_title_1(f, "Monitor")?;
        write_1(f, "Sweep interval (s)", &self.monitor.sweep_interval_seconds)?;
        write_1(f, "Rotation interval (s)", &self.monitor.rotation_interval_seconds)?;
        match self.monitor.concurrency_limit() {
            Some(limit) => write_1(f, "Max concurrent checks", &limit)?,
            None => write_1(f, "Max concurrent checks", &"unbounded")?,
        }
        write_title_1(f, "Storage")?;
        write_1(f, "Data dir", &self.storage.data_dir.display())?;
        write_1(f, "Log dir", &self.storage.log_dir.display())?;
        write_title_1(f, "Notifications")?;
        match &self.notifications {
            Some(sms) => write_1(f, "SMS from", &sms.from_phone)?,
            None => write_1(f, "SMS", &"disabled")?,
        }

        Ok(())
    }
}

impl Config {
    /// Generate Config structure from file
    ///
    /// Creates a default config in ~/.config/upwatch/config.toml
    ///  or the specified path, with the name config.toml if one does not exist
    pub fn from_config(optional_path: Option<impl AsRef<path::Path>>) -> Result<Self, ConfigError> {
        let config_path: path::PathBuf = if let Some(path) = optional_path {
            normalize_toml_path(path.as_ref())
        } else {
            default_config_path()?
        };

        let config = if config_path.exists() {
            let raw_string = fs::read_to_string(&config_path).map_err(ConfigError::Read)?;
            toml::from_str(raw_string.as_str())?
        } else {
            let config = Self::default();
            config.write_config(&config_path)?;
            config
        };

        config.validate()?;
        Ok(config)
    }

    /// Serialize and write a config to a file
    pub fn write_config(&self, path: &path::Path) -> Result<(), ConfigError> {
        let config_str: String = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Write)?;
        }

        fs::write(path, config_str).map_err(ConfigError::Write)
    }

    /// Reject settings the timers cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.monitor.sweep_interval_seconds == 0 {
            return Err(ConfigError::Invalid("monitor.sweep_interval_seconds must be positive".into()));
        }
        if self.monitor.rotation_interval_seconds == 0 {
            return Err(ConfigError::Invalid(
                "monitor.rotation_interval_seconds must be positive".into(),
            ));
        }
        Ok(())
    }
}
