use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_FOCUS_MINUTES: u32 = 25;
pub const DEFAULT_SHORT_BREAK_MINUTES: u32 = 5;
pub const DEFAULT_LONG_BREAK_MINUTES: u32 = 15;
pub const CYCLES_PER_LONG_BREAK: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Focus,
    ShortBreak,
    LongBreak,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::ShortBreak => "short_break",
            Self::LongBreak => "long_break",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Focus => "Focus",
            Self::ShortBreak => "Short break",
            Self::LongBreak => "Long break",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, Self::Focus)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub focus_minutes: u32,
    pub short_break_minutes: u32,
    pub long_break_minutes: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            focus_minutes: DEFAULT_FOCUS_MINUTES,
            short_break_minutes: DEFAULT_SHORT_BREAK_MINUTES,
            long_break_minutes: DEFAULT_LONG_BREAK_MINUTES,
        }
    }
}

impl SessionConfig {
    pub fn new(focus_minutes: u32, short_break_minutes: u32, long_break_minutes: u32) -> Self {
        Self {
            focus_minutes,
            short_break_minutes,
            long_break_minutes,
        }
    }

    pub fn with_overrides(
        &self,
        focus_minutes: Option<u32>,
        short_break_minutes: Option<u32>,
        long_break_minutes: Option<u32>,
    ) -> Self {
        Self {
            focus_minutes: focus_minutes.unwrap_or(self.focus_minutes),
            short_break_minutes: short_break_minutes.unwrap_or(self.short_break_minutes),
            long_break_minutes: long_break_minutes.unwrap_or(self.long_break_minutes),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        validate_minutes(self.focus_minutes, "focus_minutes")?;
        validate_minutes(self.short_break_minutes, "short_break_minutes")?;
        validate_minutes(self.long_break_minutes, "long_break_minutes")?;
        Ok(())
    }

    pub fn minutes_for(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Focus => self.focus_minutes,
            Stage::ShortBreak => self.short_break_minutes,
            Stage::LongBreak => self.long_break_minutes,
        }
    }

    pub fn seconds_for(&self, stage: Stage) -> u32 {
        self.minutes_for(stage).saturating_mul(60)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStatus {
    pub group_id: GroupId,
    pub stage: Stage,
    pub paused: bool,
    pub remaining_seconds: Option<u32>,
    pub cycles_completed: u32,
    pub config: SessionConfig,
    pub started_at: DateTime<Utc>,
    pub stage_started_at: DateTime<Utc>,
}

impl SessionStatus {
    pub fn effective_remaining_seconds(&self) -> u32 {
        self.remaining_seconds.unwrap_or_else(|| self.config.seconds_for(self.stage))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseTransition {
    pub from: Stage,
    pub to: Stage,
    pub cycles_completed: u32,
    pub stage_minutes: u32,
    pub message: String,
}

impl PhaseTransition {
    pub fn new(from: Stage, to: Stage, cycles_completed: u32, stage_minutes: u32) -> Self {
        let message = match to {
            Stage::ShortBreak => {
                format!("Focus session ended. Take a short break for {stage_minutes} minutes!")
            }
            Stage::LongBreak => {
                format!("Focus session ended. Take a long break for {stage_minutes} minutes!")
            }
            Stage::Focus => format!("Break ended. Focus for {stage_minutes} minutes!"),
        };
        Self {
            from,
            to,
            cycles_completed,
            stage_minutes,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Paused,
    Running { remaining_seconds: u32 },
    Transitioned(PhaseTransition),
}

impl TickOutcome {
    pub fn transition(&self) -> Option<&PhaseTransition> {
        match self {
            Self::Transitioned(transition) => Some(transition),
            _ => None,
        }
    }
}

const MAX_STAGE_MINUTES: u32 = u32::MAX / 60;

fn validate_minutes(value: u32, field_name: &str) -> Result<(), String> {
    if value == 0 {
        return Err(format!("{field_name} must be > 0"));
    }
    if value > MAX_STAGE_MINUTES {
        return Err(format!("{field_name} must be <= {MAX_STAGE_MINUTES}"));
    }
    Ok(())
}
