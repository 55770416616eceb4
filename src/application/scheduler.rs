use crate::domain::error::PomodoroError;
use crate::domain::models::{GroupId, PhaseTransition, SessionConfig, SessionStatus, TickOutcome};
use crate::domain::session::PomodoroSession;
use crate::infrastructure::notifier::PhaseNotifier;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time::{Duration, Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, info, warn};

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

type SharedSession = Arc<Mutex<PomodoroSession>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTicket {
    pub group_id: GroupId,
    pub session_id: String,
}

struct SessionEntry {
    session_id: String,
    session: SharedSession,
    tick_task: AbortHandle,
    delivery_task: AbortHandle,
}

impl SessionEntry {
    fn stop(&self) {
        self.tick_task.abort();
        self.delivery_task.abort();
    }
}

// Tick tasks never touch the registry and never await delivery; transitions
// go to a per-group delivery task so a slow notifier cannot hold back ticks.
pub struct SessionScheduler<N> {
    notifier: Arc<N>,
    tick_period: Duration,
    sessions: Mutex<HashMap<GroupId, SessionEntry>>,
    next_session: AtomicU64,
}

impl<N> SessionScheduler<N>
where
    N: PhaseNotifier + 'static,
{
    pub fn new(notifier: Arc<N>) -> Self {
        Self {
            notifier,
            tick_period: DEFAULT_TICK_PERIOD,
            sessions: Mutex::new(HashMap::new()),
            next_session: AtomicU64::new(1),
        }
    }

    pub fn with_tick_period(mut self, tick_period: Duration) -> Self {
        self.tick_period = tick_period;
        self
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    pub fn start_session(
        &self,
        group_id: GroupId,
        config: SessionConfig,
    ) -> Result<SessionTicket, PomodoroError> {
        let mut sessions = self.lock_sessions()?;
        if sessions.contains_key(&group_id) {
            debug!(group_id = %group_id, "Session already in progress");
            return Err(PomodoroError::SessionAlreadyExists(group_id));
        }

        let session = Arc::new(Mutex::new(PomodoroSession::create(
            group_id.clone(),
            config,
        )?));
        let runtime = Handle::try_current()
            .map_err(|error| PomodoroError::RuntimeUnavailable(error.to_string()))?;
        let session_id = self.next_session_id();

        let (transitions, pending) = mpsc::unbounded_channel();
        let delivery_task = runtime.spawn(deliver_transitions(
            group_id.clone(),
            pending,
            Arc::clone(&self.notifier),
        ));
        let tick_task = runtime.spawn(run_ticks(
            group_id.clone(),
            Arc::clone(&session),
            transitions,
            self.tick_period,
        ));
        sessions.insert(
            group_id.clone(),
            SessionEntry {
                session_id: session_id.clone(),
                session,
                tick_task: tick_task.abort_handle(),
                delivery_task: delivery_task.abort_handle(),
            },
        );

        info!(
            group_id = %group_id,
            session_id = %session_id,
            focus_minutes = config.focus_minutes,
            short_break_minutes = config.short_break_minutes,
            long_break_minutes = config.long_break_minutes,
            "Started pomodoro session"
        );
        Ok(SessionTicket {
            group_id,
            session_id,
        })
    }

    pub fn end_session(&self, group_id: &GroupId) -> Result<SessionStatus, PomodoroError> {
        let entry = self
            .lock_sessions()?
            .remove(group_id)
            .ok_or_else(|| PomodoroError::NoActiveSession(group_id.clone()))?;
        entry.stop();

        let status = lock_session(&entry.session)?.status();
        info!(
            group_id = %group_id,
            session_id = %entry.session_id,
            cycles_completed = status.cycles_completed,
            "Ended pomodoro session"
        );
        Ok(status)
    }

    pub fn pause_session(&self, group_id: &GroupId) -> Result<SessionStatus, PomodoroError> {
        let status = self.with_session(group_id, |session| {
            session.pause()?;
            Ok(session.status())
        })?;
        info!(group_id = %group_id, "Paused pomodoro session");
        Ok(status)
    }

    pub fn resume_session(&self, group_id: &GroupId) -> Result<SessionStatus, PomodoroError> {
        let status = self.with_session(group_id, |session| {
            session.resume()?;
            Ok(session.status())
        })?;
        info!(group_id = %group_id, "Resumed pomodoro session");
        Ok(status)
    }

    pub fn get_status(&self, group_id: &GroupId) -> Result<SessionStatus, PomodoroError> {
        self.with_session(group_id, |session| Ok(session.status()))
    }

    pub fn is_active(&self, group_id: &GroupId) -> bool {
        self.lock_sessions()
            .map(|sessions| sessions.contains_key(group_id))
            .unwrap_or(false)
    }

    pub fn active_groups(&self) -> Vec<GroupId> {
        let Ok(sessions) = self.lock_sessions() else {
            return Vec::new();
        };
        let mut groups = sessions.keys().cloned().collect::<Vec<_>>();
        groups.sort();
        groups
    }

    pub fn shutdown(&self) -> usize {
        let Ok(mut sessions) = self.lock_sessions() else {
            return 0;
        };
        let count = sessions.len();
        for (group_id, entry) in sessions.drain() {
            entry.stop();
            info!(
                group_id = %group_id,
                session_id = %entry.session_id,
                "Stopped pomodoro session"
            );
        }
        count
    }

    fn with_session<T>(
        &self,
        group_id: &GroupId,
        operation: impl FnOnce(&mut PomodoroSession) -> Result<T, PomodoroError>,
    ) -> Result<T, PomodoroError> {
        let sessions = self.lock_sessions()?;
        let entry = sessions
            .get(group_id)
            .ok_or_else(|| PomodoroError::NoActiveSession(group_id.clone()))?;
        let mut session = lock_session(&entry.session)?;
        operation(&mut *session)
    }

    fn lock_sessions(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<GroupId, SessionEntry>>, PomodoroError> {
        self.sessions.lock().map_err(|error| {
            PomodoroError::LockPoisoned(format!("session registry lock poisoned: {error}"))
        })
    }

    fn next_session_id(&self) -> String {
        let sequence = self.next_session.fetch_add(1, Ordering::Relaxed);
        format!("pom-{}-{sequence}", Utc::now().timestamp_micros())
    }
}

impl<N> Drop for SessionScheduler<N> {
    fn drop(&mut self) {
        let sessions = match self.sessions.get_mut() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        for entry in sessions.values() {
            entry.stop();
        }
    }
}

async fn run_ticks(
    group_id: GroupId,
    session: SharedSession,
    transitions: mpsc::UnboundedSender<PhaseTransition>,
    tick_period: Duration,
) {
    let mut ticker = interval_at(Instant::now() + tick_period, tick_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

    loop {
        ticker.tick().await;

        let outcome = match tick_session(&session) {
            Ok(outcome) => outcome,
            Err(error) => {
                error!(group_id = %group_id, error = %error, "Stopping tick task");
                return;
            }
        };
        let TickOutcome::Transitioned(transition) = outcome else {
            continue;
        };

        info!(
            group_id = %group_id,
            from = %transition.from,
            to = %transition.to,
            cycles_completed = transition.cycles_completed,
            "Stage changed"
        );
        if transitions.send(transition).is_err() {
            warn!(group_id = %group_id, "Delivery task gone, dropping phase notification");
        }
    }
}

async fn deliver_transitions<N>(
    group_id: GroupId,
    mut pending: mpsc::UnboundedReceiver<PhaseTransition>,
    notifier: Arc<N>,
) where
    N: PhaseNotifier + 'static,
{
    while let Some(transition) = pending.recv().await {
        if let Err(error) = notifier
            .on_phase_change(&group_id, transition.to, &transition.message)
            .await
        {
            warn!(group_id = %group_id, error = %error, "Failed to deliver phase notification");
        }
    }
}

fn tick_session(session: &Mutex<PomodoroSession>) -> Result<TickOutcome, PomodoroError> {
    Ok(lock_session(session)?.tick())
}

fn lock_session(
    session: &Mutex<PomodoroSession>,
) -> Result<MutexGuard<'_, PomodoroSession>, PomodoroError> {
    session
        .lock()
        .map_err(|error| PomodoroError::LockPoisoned(format!("session lock poisoned: {error}")))
}
