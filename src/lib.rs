pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::commands::{
    AppState, Command, CommandReply, StatusView, dispatch, parse_command,
};
pub use application::scheduler::{DEFAULT_TICK_PERIOD, SessionScheduler, SessionTicket};
pub use domain::error::PomodoroError;
pub use domain::models::{
    GroupId, PhaseTransition, SessionConfig, SessionStatus, Stage, TickOutcome,
};
pub use domain::session::PomodoroSession;
pub use infrastructure::config::PomodoroConfig;
pub use infrastructure::error::InfraError;
pub use infrastructure::notifier::{
    ChannelNotifier, NotifyError, PhaseNotification, PhaseNotifier, TracingNotifier,
};
