use crate::domain::models::{GroupId, Stage};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery channel closed")]
    ChannelClosed,
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseNotification {
    pub group_id: GroupId,
    pub stage: Stage,
    pub message: String,
}

impl PhaseNotification {
    pub fn render(&self, audience_mention: Option<&str>) -> String {
        match audience_mention.map(str::trim).filter(|value| !value.is_empty()) {
            Some(mention) => format!("{mention} {}", self.message),
            None => self.message.clone(),
        }
    }
}

#[async_trait]
pub trait PhaseNotifier: Send + Sync {
    async fn on_phase_change(
        &self,
        group_id: &GroupId,
        stage: Stage,
        message: &str,
    ) -> Result<(), NotifyError>;
}

#[derive(Debug, Default, Clone)]
pub struct TracingNotifier;

#[async_trait]
impl PhaseNotifier for TracingNotifier {
    async fn on_phase_change(
        &self,
        group_id: &GroupId,
        stage: Stage,
        message: &str,
    ) -> Result<(), NotifyError> {
        info!(group_id = %group_id, stage = %stage, notification = message, "Phase changed");
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<PhaseNotification>,
}

impl ChannelNotifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<PhaseNotification>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl PhaseNotifier for ChannelNotifier {
    async fn on_phase_change(
        &self,
        group_id: &GroupId,
        stage: Stage,
        message: &str,
    ) -> Result<(), NotifyError> {
        self.sender
            .send(PhaseNotification {
                group_id: group_id.clone(),
                stage,
                message: message.to_string(),
            })
            .map_err(|_| NotifyError::ChannelClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_notifier_forwards_notifications() {
        let (notifier, mut receiver) = ChannelNotifier::channel();
        notifier
            .on_phase_change(&GroupId::from("g1"), Stage::ShortBreak, "take five")
            .await
            .expect("deliver");

        let delivered = receiver.recv().await.expect("notification");
        assert_eq!(delivered.group_id, GroupId::from("g1"));
        assert_eq!(delivered.stage, Stage::ShortBreak);
        assert_eq!(delivered.render(Some("@study-session")), "@study-session take five");
        assert_eq!(delivered.render(Some("  ")), "take five");
    }

    #[tokio::test]
    async fn channel_notifier_reports_closed_receiver() {
        let (notifier, receiver) = ChannelNotifier::channel();
        drop(receiver);
        let result = notifier
            .on_phase_change(&GroupId::from("g1"), Stage::Focus, "focus")
            .await;
        assert!(matches!(result, Err(NotifyError::ChannelClosed)));
    }
}
