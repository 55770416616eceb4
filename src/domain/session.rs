use crate::domain::error::PomodoroError;
use crate::domain::models::{
    CYCLES_PER_LONG_BREAK, GroupId, PhaseTransition, SessionConfig, SessionStatus, Stage,
    TickOutcome,
};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct PomodoroSession {
    group_id: GroupId,
    config: SessionConfig,
    current_stage: Stage,
    cycles_completed: u32,
    paused: bool,
    remaining_seconds: Option<u32>,
    started_at: DateTime<Utc>,
    stage_started_at: DateTime<Utc>,
}

impl PomodoroSession {
    pub fn create(group_id: GroupId, config: SessionConfig) -> Result<Self, PomodoroError> {
        config.validate().map_err(PomodoroError::InvalidConfiguration)?;
        let now = Utc::now();
        Ok(Self {
            group_id,
            config,
            current_stage: Stage::Focus,
            cycles_completed: 0,
            paused: false,
            remaining_seconds: None,
            started_at: now,
            stage_started_at: now,
        })
    }

    pub fn group_id(&self) -> &GroupId {
        &self.group_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advances the countdown by one second.
    ///
    /// The first unpaused tick seeds the countdown from the focus duration and
    /// counts that second too, so a stage of `n` minutes ends on tick `n * 60`.
    pub fn tick(&mut self) -> TickOutcome {
        if self.paused {
            return TickOutcome::Paused;
        }

        let remaining = self
            .remaining_seconds
            .unwrap_or_else(|| self.config.seconds_for(Stage::Focus))
            .saturating_sub(1);
        if remaining > 0 {
            self.remaining_seconds = Some(remaining);
            return TickOutcome::Running {
                remaining_seconds: remaining,
            };
        }

        TickOutcome::Transitioned(self.advance_stage())
    }

    pub fn pause(&mut self) -> Result<(), PomodoroError> {
        if self.paused {
            return Err(PomodoroError::AlreadyPaused);
        }
        self.paused = true;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), PomodoroError> {
        if !self.paused {
            return Err(PomodoroError::NotPaused);
        }
        self.paused = false;
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            group_id: self.group_id.clone(),
            stage: self.current_stage,
            paused: self.paused,
            remaining_seconds: self.remaining_seconds,
            cycles_completed: self.cycles_completed,
            config: self.config,
            started_at: self.started_at,
            stage_started_at: self.stage_started_at,
        }
    }

    fn advance_stage(&mut self) -> PhaseTransition {
        let from = self.current_stage;
        let to = match from {
            Stage::Focus => {
                self.cycles_completed += 1;
                if self.cycles_completed % CYCLES_PER_LONG_BREAK == 0 {
                    Stage::LongBreak
                } else {
                    Stage::ShortBreak
                }
            }
            Stage::ShortBreak | Stage::LongBreak => Stage::Focus,
        };

        self.current_stage = to;
        self.remaining_seconds = Some(self.config.seconds_for(to));
        self.stage_started_at = Utc::now();

        PhaseTransition::new(
            from,
            to,
            self.cycles_completed,
            self.config.minutes_for(to),
        )
    }
}
