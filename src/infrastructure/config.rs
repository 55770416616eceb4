use crate::domain::models::SessionConfig;
use crate::infrastructure::error::InfraError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const POMODORO_JSON: &str = "pomodoro.json";
const SCHEMA_VERSION: u64 = 1;
const DEFAULT_TICK_MILLIS: u64 = 1_000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroConfig {
    pub schema: u8,
    pub defaults: SessionConfig,
    pub tick_millis: u64,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            schema: SCHEMA_VERSION as u8,
            defaults: SessionConfig::default(),
            tick_millis: DEFAULT_TICK_MILLIS,
        }
    }
}

impl PomodoroConfig {
    pub fn validate(&self) -> Result<(), InfraError> {
        self.defaults
            .validate()
            .map_err(|message| InfraError::InvalidConfig(format!("defaults.{message}")))?;
        if self.tick_millis == 0 {
            return Err(InfraError::InvalidConfig(
                "tickMillis must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_millis)
    }
}

pub fn ensure_default_config(config_dir: &Path) -> Result<(), InfraError> {
    let path = config_dir.join(POMODORO_JSON);
    if !path.exists() {
        let formatted = serde_json::to_string_pretty(&PomodoroConfig::default())?;
        fs::write(path, format!("{formatted}\n"))?;
    }
    Ok(())
}

pub fn load_config(config_dir: &Path) -> Result<PomodoroConfig, InfraError> {
    let path = config_dir.join(POMODORO_JSON);
    let raw = fs::read_to_string(&path)?;
    let parsed: serde_json::Value = serde_json::from_str(&raw)?;
    let schema = parsed
        .get("schema")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| InfraError::InvalidConfig(format!("missing schema in {}", path.display())))?;
    if schema != SCHEMA_VERSION {
        return Err(InfraError::InvalidConfig(format!(
            "unsupported schema {} in {}",
            schema,
            path.display()
        )));
    }

    let config: PomodoroConfig = serde_json::from_value(parsed)?;
    config.validate()?;
    Ok(config)
}
