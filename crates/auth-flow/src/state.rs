//! Per-user conversation state with TTL expiration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// What the bot expects from a user's next text input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversationState {
    /// Free text is ignored unless it matches a menu command.
    #[default]
    Idle,
    /// Next input is validated as a phone number.
    AwaitingPhone,
    /// Next input is the verification code.
    AwaitingCode,
    /// Next input is the two-factor password.
    AwaitingTwoFactor,
}

/// Phone-format precondition: leading plus sign and a minimum length.
///
/// Everything stricter is the provider's call.
pub fn is_plausible_phone_number(text: &str) -> bool {
    text.starts_with('+') && text.chars().count() >= 10
}

struct StateEntry {
    state: ConversationState,
    expires_at: Instant,
}

/// In-memory conversation state tracker with automatic TTL expiration.
///
/// Abandoned flows expire instead of accumulating; expiry is checked lazily
/// on read and a background task sweeps the map periodically.
#[derive(Clone)]
pub struct ConversationTracker {
    states: Arc<RwLock<HashMap<i64, StateEntry>>>,
    ttl: Duration,
}

impl ConversationTracker {
    /// Create a new tracker and spawn its cleanup task.
    pub fn new(ttl: Duration) -> Self {
        let tracker = Self {
            states: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        };

        // Spawn cleanup task
        let cleanup_tracker = tracker.clone();
        tokio::spawn(async move {
            cleanup_tracker.cleanup_loop().await;
        });

        info!("Conversation tracker initialized (ttl={:?})", ttl);

        tracker
    }

    async fn cleanup_loop(&self) {
        let cleanup_interval = Duration::from_secs(60);

        loop {
            tokio::time::sleep(cleanup_interval).await;
            let removed = self.sweep().await;
            if removed > 0 {
                debug!("Cleaned up {} expired conversation states", removed);
            }
        }
    }

    /// Remove expired entries; returns how many were dropped.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut states = self.states.write().await;
        let before = states.len();
        states.retain(|_, entry| entry.expires_at > now);
        before - states.len()
    }

    /// Current state for a user; `Idle` when absent or expired.
    pub async fn get(&self, user_id: i64) -> ConversationState {
        let states = self.states.read().await;
        let now = Instant::now();

        states
            .get(&user_id)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.state)
            .unwrap_or_default()
    }

    /// Transition a user's state, refreshing its TTL.
    ///
    /// Setting `Idle` removes the entry; a terminated flow leaves nothing
    /// behind.
    pub async fn set(&self, user_id: i64, state: ConversationState) {
        let mut states = self.states.write().await;

        if state == ConversationState::Idle {
            states.remove(&user_id);
            return;
        }

        states.insert(
            user_id,
            StateEntry {
                state,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop a user's state, returning to `Idle`.
    pub async fn clear(&self, user_id: i64) {
        self.states.write().await.remove(&user_id);
    }

    /// Number of users mid-flow.
    pub async fn active_count(&self) -> usize {
        let states = self.states.read().await;
        let now = Instant::now();
        states
            .values()
            .filter(|entry| entry.expires_at > now)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_precondition() {
        assert!(is_plausible_phone_number("+15551234567"));
        assert!(is_plausible_phone_number("+441234567"));

        // No leading plus
        assert!(!is_plausible_phone_number("15551234567"));
        // Too short
        assert!(!is_plausible_phone_number("+1555123"));
        assert!(!is_plausible_phone_number(""));
    }

    #[tokio::test]
    async fn test_default_state_is_idle() {
        let tracker = ConversationTracker::new(Duration::from_secs(3600));
        assert_eq!(tracker.get(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let tracker = ConversationTracker::new(Duration::from_secs(3600));

        tracker.set(1, ConversationState::AwaitingPhone).await;
        assert_eq!(tracker.get(1).await, ConversationState::AwaitingPhone);

        tracker.set(1, ConversationState::AwaitingCode).await;
        assert_eq!(tracker.get(1).await, ConversationState::AwaitingCode);

        // Other users are unaffected
        assert_eq!(tracker.get(2).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_setting_idle_removes_entry() {
        let tracker = ConversationTracker::new(Duration::from_secs(3600));

        tracker.set(1, ConversationState::AwaitingCode).await;
        tracker.set(1, ConversationState::Idle).await;

        assert_eq!(tracker.active_count().await, 0);
    }

    #[tokio::test]
    async fn test_state_expires_after_ttl() {
        let tracker = ConversationTracker::new(Duration::from_millis(50));

        tracker.set(1, ConversationState::AwaitingCode).await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(tracker.get(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_activity_refreshes_ttl() {
        let tracker = ConversationTracker::new(Duration::from_millis(100));

        tracker.set(1, ConversationState::AwaitingCode).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        tracker.set(1, ConversationState::AwaitingCode).await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(tracker.get(1).await, ConversationState::AwaitingCode);
    }

    #[tokio::test]
    async fn test_sweep_removes_expired() {
        let tracker = ConversationTracker::new(Duration::from_millis(10));

        tracker.set(1, ConversationState::AwaitingPhone).await;
        tracker.set(2, ConversationState::AwaitingCode).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(tracker.sweep().await, 2);
    }
}
