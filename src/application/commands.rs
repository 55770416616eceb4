use crate::application::bootstrap::bootstrap_workspace;
use crate::application::scheduler::SessionScheduler;
use crate::domain::error::PomodoroError;
use crate::domain::models::{GroupId, SessionConfig, SessionStatus};
use crate::infrastructure::config::PomodoroConfig;
use crate::infrastructure::error::InfraError;
use crate::infrastructure::notifier::PhaseNotifier;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

pub struct AppState<N> {
    config: PomodoroConfig,
    scheduler: SessionScheduler<N>,
}

impl<N> AppState<N>
where
    N: PhaseNotifier + 'static,
{
    pub fn new(workspace_root: &Path, notifier: Arc<N>) -> Result<Self, InfraError> {
        let bootstrap = bootstrap_workspace(workspace_root)?;
        info!(
            workspace_root = %bootstrap.workspace_root.display(),
            config_path = %bootstrap.config_path.display(),
            "Loaded pomodoro config"
        );
        Ok(Self::with_config(bootstrap.config, notifier))
    }

    pub fn with_config(config: PomodoroConfig, notifier: Arc<N>) -> Self {
        let scheduler = SessionScheduler::new(notifier).with_tick_period(config.tick_period());
        Self { config, scheduler }
    }

    pub fn config(&self) -> &PomodoroConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &SessionScheduler<N> {
        &self.scheduler
    }

    pub fn command_reply(
        &self,
        command: &str,
        result: Result<CommandReply, PomodoroError>,
    ) -> CommandReply {
        match result {
            Ok(reply) => reply,
            Err(error) => {
                warn!(command, error = %error, "Command rejected");
                error_reply(&error)
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandReply {
    pub content: String,
    pub ephemeral: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusView>,
}

impl CommandReply {
    fn public(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: false,
            status: None,
        }
    }

    fn ephemeral(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ephemeral: true,
            status: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatusView {
    pub title: String,
    pub status: String,
    pub current_stage: String,
    pub time_remaining: String,
    pub completed_cycles: u32,
}

impl From<&SessionStatus> for StatusView {
    fn from(status: &SessionStatus) -> Self {
        Self {
            title: "Pomodoro Status".to_string(),
            status: if status.paused { "Paused" } else { "Running" }.to_string(),
            current_stage: status.stage.label().to_string(),
            time_remaining: format_remaining(status.effective_remaining_seconds()),
            completed_cycles: status.cycles_completed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start {
        group_id: GroupId,
        focus_minutes: Option<u32>,
        short_break_minutes: Option<u32>,
        long_break_minutes: Option<u32>,
    },
    End {
        group_id: GroupId,
    },
    Pause {
        group_id: GroupId,
    },
    Resume {
        group_id: GroupId,
    },
    Status {
        group_id: GroupId,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "start_pomodoro",
            Self::End { .. } => "end_pomodoro",
            Self::Pause { .. } => "pause_pomodoro",
            Self::Resume { .. } => "resume_pomodoro",
            Self::Status { .. } => "pomodoro_status",
        }
    }
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Err("command must not be empty".to_string());
    };
    let group_id = parts
        .next()
        .map(GroupId::from)
        .ok_or_else(|| format!("{verb} requires a group id"))?;

    let command = match verb.to_ascii_lowercase().as_str() {
        "start" => {
            let mut minutes = [None; 3];
            for (index, slot) in minutes.iter_mut().enumerate() {
                if let Some(raw) = parts.next() {
                    let value = raw.parse::<u32>().map_err(|_| {
                        format!("duration #{} must be a whole number: {raw}", index + 1)
                    })?;
                    *slot = Some(value);
                }
            }
            Command::Start {
                group_id,
                focus_minutes: minutes[0],
                short_break_minutes: minutes[1],
                long_break_minutes: minutes[2],
            }
        }
        "end" => Command::End { group_id },
        "pause" => Command::Pause { group_id },
        "resume" => Command::Resume { group_id },
        "status" => Command::Status { group_id },
        other => return Err(format!("unknown command: {other}")),
    };

    if parts.next().is_some() {
        return Err(format!("too many arguments for {verb}"));
    }
    Ok(command)
}

pub fn dispatch<N>(state: &AppState<N>, command: Command) -> CommandReply
where
    N: PhaseNotifier + 'static,
{
    let name = command.name();
    let result = match command {
        Command::Start {
            group_id,
            focus_minutes,
            short_break_minutes,
            long_break_minutes,
        } => start_pomodoro_impl(
            state,
            group_id,
            focus_minutes,
            short_break_minutes,
            long_break_minutes,
        ),
        Command::End { group_id } => end_pomodoro_impl(state, &group_id),
        Command::Pause { group_id } => pause_pomodoro_impl(state, &group_id),
        Command::Resume { group_id } => resume_pomodoro_impl(state, &group_id),
        Command::Status { group_id } => pomodoro_status_impl(state, &group_id),
    };
    state.command_reply(name, result)
}

pub fn start_pomodoro_impl<N>(
    state: &AppState<N>,
    group_id: GroupId,
    focus_minutes: Option<u32>,
    short_break_minutes: Option<u32>,
    long_break_minutes: Option<u32>,
) -> Result<CommandReply, PomodoroError>
where
    N: PhaseNotifier + 'static,
{
    let config: SessionConfig = state.config.defaults.with_overrides(
        focus_minutes,
        short_break_minutes,
        long_break_minutes,
    );
    state.scheduler.start_session(group_id, config)?;
    Ok(CommandReply::public(format!(
        "Pomodoro session started! Focus for {} minutes.",
        config.focus_minutes
    )))
}

pub fn end_pomodoro_impl<N>(
    state: &AppState<N>,
    group_id: &GroupId,
) -> Result<CommandReply, PomodoroError>
where
    N: PhaseNotifier + 'static,
{
    state.scheduler.end_session(group_id)?;
    Ok(CommandReply::public("Pomodoro session ended."))
}

pub fn pause_pomodoro_impl<N>(
    state: &AppState<N>,
    group_id: &GroupId,
) -> Result<CommandReply, PomodoroError>
where
    N: PhaseNotifier + 'static,
{
    state.scheduler.pause_session(group_id)?;
    Ok(CommandReply::public("Pomodoro session paused."))
}

pub fn resume_pomodoro_impl<N>(
    state: &AppState<N>,
    group_id: &GroupId,
) -> Result<CommandReply, PomodoroError>
where
    N: PhaseNotifier + 'static,
{
    state.scheduler.resume_session(group_id)?;
    Ok(CommandReply::public("Pomodoro session resumed."))
}

pub fn pomodoro_status_impl<N>(
    state: &AppState<N>,
    group_id: &GroupId,
) -> Result<CommandReply, PomodoroError>
where
    N: PhaseNotifier + 'static,
{
    let status = state.scheduler.get_status(group_id)?;
    let view = StatusView::from(&status);
    Ok(CommandReply {
        content: format!(
            "{}: {} | {} | {} remaining | {} cycles completed",
            view.title, view.status, view.current_stage, view.time_remaining, view.completed_cycles
        ),
        ephemeral: false,
        status: Some(view),
    })
}

pub fn error_reply(error: &PomodoroError) -> CommandReply {
    let content = match error {
        PomodoroError::InvalidConfiguration(_) => {
            "Durations must be positive whole minutes.".to_string()
        }
        PomodoroError::SessionAlreadyExists(_) => {
            "A Pomodoro session is already in progress for this group.".to_string()
        }
        PomodoroError::NoActiveSession(_) => {
            "No active Pomodoro session for your group.".to_string()
        }
        PomodoroError::AlreadyPaused => "Session is already paused.".to_string(),
        PomodoroError::NotPaused => "Session is not paused.".to_string(),
        PomodoroError::LockPoisoned(_) | PomodoroError::RuntimeUnavailable(_) => {
            "The Pomodoro timer is unavailable right now.".to_string()
        }
    };
    CommandReply::ephemeral(content)
}

fn format_remaining(total_seconds: u32) -> String {
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::notifier::TracingNotifier;
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{Duration, sleep};

    static NEXT_TEMP_WORKSPACE: AtomicUsize = AtomicUsize::new(0);

    struct TempWorkspace {
        path: PathBuf,
    }

    impl TempWorkspace {
        fn new() -> Self {
            let sequence = NEXT_TEMP_WORKSPACE.fetch_add(1, Ordering::Relaxed);
            let path = std::env::temp_dir().join(format!(
                "pomogroup-command-tests-{}-{}",
                std::process::id(),
                sequence
            ));
            fs::create_dir_all(&path).expect("create temp workspace");
            Self { path }
        }

        fn app_state(&self) -> AppState<TracingNotifier> {
            AppState::new(&self.path, Arc::new(TracingNotifier)).expect("initialize app state")
        }
    }

    impl Drop for TempWorkspace {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.path);
        }
    }

    fn group() -> GroupId {
        GroupId::from("study-42")
    }

    #[tokio::test(start_paused = true)]
    async fn start_uses_configured_defaults() {
        let workspace = TempWorkspace::new();
        let state = workspace.app_state();
        assert!(workspace.path.join("config").join("pomodoro.json").exists());

        let reply = start_pomodoro_impl(&state, group(), None, None, None).expect("start");
        assert_eq!(reply.content, "Pomodoro session started! Focus for 25 minutes.");
        assert!(!reply.ephemeral);

        let status = state.scheduler().get_status(&group()).expect("status");
        assert_eq!(status.config, SessionConfig::new(25, 5, 15));
    }

    #[tokio::test(start_paused = true)]
    async fn start_applies_explicit_durations() {
        let state = AppState::with_config(PomodoroConfig::default(), Arc::new(TracingNotifier));
        let reply = start_pomodoro_impl(&state, group(), Some(50), Some(10), None).expect("start");
        assert_eq!(reply.content, "Pomodoro session started! Focus for 50 minutes.");

        let status = state.scheduler().get_status(&group()).expect("status");
        assert_eq!(status.config, SessionConfig::new(50, 10, 15));
    }

    #[tokio::test(start_paused = true)]
    async fn lifecycle_replies_follow_the_session_state() {
        let state = AppState::with_config(PomodoroConfig::default(), Arc::new(TracingNotifier));

        let missing = dispatch(&state, Command::Pause { group_id: group() });
        assert_eq!(missing.content, "No active Pomodoro session for your group.");
        assert!(missing.ephemeral);

        dispatch(
            &state,
            Command::Start {
                group_id: group(),
                focus_minutes: None,
                short_break_minutes: None,
                long_break_minutes: None,
            },
        );
        let duplicate = dispatch(
            &state,
            Command::Start {
                group_id: group(),
                focus_minutes: Some(10),
                short_break_minutes: None,
                long_break_minutes: None,
            },
        );
        assert_eq!(
            duplicate.content,
            "A Pomodoro session is already in progress for this group."
        );

        let not_paused = dispatch(&state, Command::Resume { group_id: group() });
        assert_eq!(not_paused.content, "Session is not paused.");

        let paused = dispatch(&state, Command::Pause { group_id: group() });
        assert_eq!(paused.content, "Pomodoro session paused.");
        let again = dispatch(&state, Command::Pause { group_id: group() });
        assert_eq!(again.content, "Session is already paused.");

        let resumed = dispatch(&state, Command::Resume { group_id: group() });
        assert_eq!(resumed.content, "Pomodoro session resumed.");

        let ended = dispatch(&state, Command::End { group_id: group() });
        assert_eq!(ended.content, "Pomodoro session ended.");
        let status = dispatch(&state, Command::Status { group_id: group() });
        assert_eq!(status.content, "No active Pomodoro session for your group.");
        assert!(status.status.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn status_reports_remaining_time_and_cycles() {
        let state = AppState::with_config(PomodoroConfig::default(), Arc::new(TracingNotifier));
        start_pomodoro_impl(&state, group(), Some(1), Some(1), Some(15)).expect("start");

        let before_first_tick = pomodoro_status_impl(&state, &group()).expect("status");
        let view = before_first_tick.status.expect("status view");
        assert_eq!(view.time_remaining, "0:01:00");
        assert_eq!(view.current_stage, "Focus");

        sleep(Duration::from_millis(75_500)).await;
        pause_pomodoro_impl(&state, &group()).expect("pause");

        let reply = pomodoro_status_impl(&state, &group()).expect("status");
        let view = reply.status.expect("status view");
        assert_eq!(view.status, "Paused");
        assert_eq!(view.current_stage, "Short break");
        assert_eq!(view.time_remaining, "0:00:45");
        assert_eq!(view.completed_cycles, 1);
    }

    #[test]
    fn invalid_durations_are_reported_without_a_session() {
        let state = AppState::with_config(PomodoroConfig::default(), Arc::new(TracingNotifier));
        let reply = dispatch(
            &state,
            Command::Start {
                group_id: group(),
                focus_minutes: Some(0),
                short_break_minutes: None,
                long_break_minutes: None,
            },
        );
        assert_eq!(reply.content, "Durations must be positive whole minutes.");
        assert!(reply.ephemeral);
        assert!(!state.scheduler().is_active(&group()));
    }

    #[test]
    fn parse_command_accepts_optional_durations() {
        assert_eq!(
            parse_command("start g1 50 10"),
            Ok(Command::Start {
                group_id: GroupId::from("g1"),
                focus_minutes: Some(50),
                short_break_minutes: Some(10),
                long_break_minutes: None,
            })
        );
        assert_eq!(
            parse_command("  STATUS g1 "),
            Ok(Command::Status {
                group_id: GroupId::from("g1")
            })
        );
    }

    #[test]
    fn parse_command_rejects_malformed_input() {
        assert!(parse_command("").is_err());
        assert!(parse_command("pause").is_err());
        assert!(parse_command("start g1 ten").is_err());
        assert!(parse_command("start g1 1 2 3 4").is_err());
        assert!(parse_command("end g1 now").is_err());
        assert!(parse_command("skip g1").is_err());
    }

    #[test]
    fn remaining_time_formats_like_a_clock() {
        assert_eq!(format_remaining(0), "0:00:00");
        assert_eq!(format_remaining(25 * 60), "0:25:00");
        assert_eq!(format_remaining(3_725), "1:02:05");
    }
}
