//! Easter-egg gesture that reveals the master-key prompt.
//!
//! Ten clicks inside a rolling 20 second window open the prompt; the prompt
//! dismisses itself after 10 seconds. The pure state types take `now`
//! explicitly. [`GestureSession`] drives them from the tokio clock and
//! schedules one expiry check per deadline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;

pub const GESTURE_WINDOW: Duration = Duration::from_secs(20);
pub const REVEAL_THRESHOLD: u32 = 10;
pub const PROMPT_TIMEOUT: Duration = Duration::from_secs(10);

// Window expiry is strict (elapsed > GESTURE_WINDOW), so checks wake just past it.
const EXPIRY_SLACK: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureWindow {
    started_at: Instant,
    count: u32,
}

impl GestureWindow {
    fn open(now: Instant) -> Self {
        Self {
            started_at: now,
            count: 1,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn expires_at(&self) -> Instant {
        self.started_at + GESTURE_WINDOW
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started_at) > GESTURE_WINDOW
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Counting(u32),
    Revealed,
}

#[derive(Debug, Default)]
pub struct GestureDetector {
    window: Option<GestureWindow>,
}

impl GestureDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_click(&mut self, now: Instant) -> ClickOutcome {
        match self.window {
            Some(mut window) if !window.is_expired(now) => {
                window.count += 1;
                if window.count >= REVEAL_THRESHOLD {
                    self.window = None;
                    ClickOutcome::Revealed
                } else {
                    self.window = Some(window);
                    ClickOutcome::Counting(window.count)
                }
            }
            _ => {
                self.window = Some(GestureWindow::open(now));
                ClickOutcome::Counting(1)
            }
        }
    }

    /// Drop a window that ran out without further clicks. Returns true if it did.
    pub fn expire(&mut self, now: Instant) -> bool {
        match self.window {
            Some(window) if window.is_expired(now) => {
                self.window = None;
                true
            }
            _ => false,
        }
    }

    pub fn count(&self) -> u32 {
        self.window.map_or(0, |w| w.count)
    }

    pub fn window(&self) -> Option<GestureWindow> {
        self.window
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.window.map(|w| w.expires_at())
    }
}

/// The master-key prompt opened by the gesture.
#[derive(Debug, Default)]
pub struct RevealPrompt {
    opened_at: Option<Instant>,
}

impl RevealPrompt {
    pub fn open(&mut self, now: Instant) {
        self.opened_at = Some(now);
    }

    pub fn close(&mut self) {
        self.opened_at = None;
    }

    pub fn is_open(&self, now: Instant) -> bool {
        self.opened_at
            .is_some_and(|at| now.saturating_duration_since(at) < PROMPT_TIMEOUT)
    }

    pub fn closes_at(&self) -> Option<Instant> {
        self.opened_at.map(|at| at + PROMPT_TIMEOUT)
    }

    pub fn dismiss_if_expired(&mut self, now: Instant) -> bool {
        if self.opened_at.is_some() && !self.is_open(now) {
            self.opened_at = None;
            return true;
        }
        false
    }
}

#[derive(Debug, Default)]
struct GateState {
    detector: GestureDetector,
    prompt: RevealPrompt,
}

/// Gesture detector and prompt driven by the tokio clock.
///
/// Pending timers are aborted when they are superseded and when the session
/// is dropped.
pub struct GestureSession {
    state: Arc<Mutex<GateState>>,
    window_check: Option<JoinHandle<()>>,
    prompt_check: Option<JoinHandle<()>>,
}

impl GestureSession {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(GateState::default())),
            window_check: None,
            prompt_check: None,
        }
    }

    pub async fn click(&mut self) -> ClickOutcome {
        let now = Instant::now();
        let (outcome, window_deadline, prompt_deadline) = {
            let mut state = self.state.lock().await;
            let outcome = state.detector.register_click(now);
            // An already open prompt keeps its original auto-close deadline.
            let opened = outcome == ClickOutcome::Revealed && !state.prompt.is_open(now);
            if opened {
                tracing::debug!("gesture threshold reached, opening prompt");
                state.prompt.open(now);
            }
            (outcome, state.detector.next_deadline(), opened.then(|| now + PROMPT_TIMEOUT))
        };

        self.schedule_window_check(window_deadline);
        if prompt_deadline.is_some() {
            self.schedule_prompt_check(prompt_deadline);
        }
        outcome
    }

    pub async fn count(&self) -> u32 {
        self.state.lock().await.detector.count()
    }

    pub async fn prompt_open(&self) -> bool {
        self.state.lock().await.prompt.is_open(Instant::now())
    }

    /// Close the prompt early, after a successful login or a cancel.
    pub async fn close_prompt(&mut self) {
        self.state.lock().await.prompt.close();
        if let Some(handle) = self.prompt_check.take() {
            handle.abort();
        }
    }

    fn schedule_window_check(&mut self, deadline: Option<Instant>) {
        if let Some(handle) = self.window_check.take() {
            handle.abort();
        }
        let Some(deadline) = deadline else { return };

        let state = Arc::clone(&self.state);
        self.window_check = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline + EXPIRY_SLACK).await;
            if state.lock().await.detector.expire(Instant::now()) {
                tracing::debug!("gesture window expired");
            }
        }));
    }

    fn schedule_prompt_check(&mut self, deadline: Option<Instant>) {
        if let Some(handle) = self.prompt_check.take() {
            handle.abort();
        }
        let Some(deadline) = deadline else { return };

        let state = Arc::clone(&self.state);
        self.prompt_check = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if state.lock().await.prompt.dismiss_if_expired(Instant::now()) {
                tracing::debug!("reveal prompt timed out");
            }
        }));
    }
}

impl Default for GestureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for GestureSession {
    fn drop(&mut self) {
        for handle in [self.window_check.take(), self.prompt_check.take()]
            .into_iter()
            .flatten()
        {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_first_click_opens_window() {
        let t0 = Instant::now();
        let mut detector = GestureDetector::new();
        assert_eq!(detector.count(), 0);
        assert!(detector.window().is_none());

        assert_eq!(detector.register_click(t0), ClickOutcome::Counting(1));
        assert_eq!(detector.window().map(|w| w.started_at()), Some(t0));
        assert_eq!(detector.next_deadline(), Some(t0 + GESTURE_WINDOW));
    }

    #[test]
    fn test_ten_clicks_reveal_once() {
        let t0 = Instant::now();
        let mut detector = GestureDetector::new();
        let outcomes: Vec<_> = (0..10)
            .map(|i| detector.register_click(t0 + secs(i)))
            .collect();

        assert_eq!(outcomes[8], ClickOutcome::Counting(9));
        assert_eq!(outcomes[9], ClickOutcome::Revealed);
        assert_eq!(
            outcomes.iter().filter(|o| **o == ClickOutcome::Revealed).count(),
            1
        );
        assert_eq!(detector.count(), 0);
        assert!(detector.window().is_none());

        // The next click starts a fresh window.
        assert_eq!(detector.register_click(t0 + secs(11)), ClickOutcome::Counting(1));
    }

    #[test]
    fn test_click_at_window_edge_still_counts() {
        let t0 = Instant::now();
        let mut detector = GestureDetector::new();
        detector.register_click(t0);
        assert_eq!(detector.register_click(t0 + GESTURE_WINDOW), ClickOutcome::Counting(2));
    }

    #[test]
    fn test_click_after_window_restarts_count() {
        let t0 = Instant::now();
        let mut detector = GestureDetector::new();
        for i in 0..9 {
            detector.register_click(t0 + Duration::from_millis(i * 100));
        }
        assert_eq!(detector.count(), 9);

        let late = t0 + GESTURE_WINDOW + Duration::from_millis(1);
        assert_eq!(detector.register_click(late), ClickOutcome::Counting(1));
        assert_eq!(detector.window().map(|w| w.started_at()), Some(late));
    }

    #[test]
    fn test_expire_only_after_window() {
        let t0 = Instant::now();
        let mut detector = GestureDetector::new();
        assert!(!detector.expire(t0));

        detector.register_click(t0);
        detector.register_click(t0 + secs(1));
        assert!(!detector.expire(t0 + GESTURE_WINDOW));
        assert_eq!(detector.count(), 2);

        assert!(detector.expire(t0 + secs(21)));
        assert_eq!(detector.count(), 0);
        assert!(detector.next_deadline().is_none());
    }

    #[test]
    fn test_prompt_times_out() {
        let t0 = Instant::now();
        let mut prompt = RevealPrompt::default();
        assert!(!prompt.is_open(t0));

        prompt.open(t0);
        assert!(prompt.is_open(t0 + secs(9)));
        assert!(!prompt.dismiss_if_expired(t0 + secs(9)));
        assert!(!prompt.is_open(t0 + PROMPT_TIMEOUT));
        assert!(prompt.dismiss_if_expired(t0 + PROMPT_TIMEOUT));
        assert!(prompt.closes_at().is_none());
    }

    #[test]
    fn test_prompt_close() {
        let t0 = Instant::now();
        let mut prompt = RevealPrompt::default();
        prompt.open(t0);
        prompt.close();
        assert!(!prompt.is_open(t0));
        assert!(!prompt.dismiss_if_expired(t0 + secs(30)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_resets_after_idle_window() {
        let mut session = GestureSession::new();
        for _ in 0..3 {
            session.click().await;
        }
        assert_eq!(session.count().await, 3);

        tokio::time::sleep(secs(19)).await;
        assert_eq!(session.count().await, 3);

        tokio::time::sleep(secs(2)).await;
        assert_eq!(session.count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_reveals_and_prompt_auto_closes() {
        let mut session = GestureSession::new();
        for _ in 0..9 {
            assert!(matches!(session.click().await, ClickOutcome::Counting(_)));
            tokio::time::sleep(Duration::from_millis(500)).await;
        }
        assert_eq!(session.click().await, ClickOutcome::Revealed);
        assert_eq!(session.count().await, 0);
        assert!(session.prompt_open().await);

        tokio::time::sleep(secs(9)).await;
        assert!(session.prompt_open().await);

        tokio::time::sleep(secs(2)).await;
        assert!(!session.prompt_open().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_reveal_keeps_prompt_deadline() {
        let mut session = GestureSession::new();
        for _ in 0..10 {
            session.click().await;
        }
        assert!(session.prompt_open().await);

        tokio::time::sleep(secs(5)).await;
        for _ in 0..9 {
            session.click().await;
        }
        assert_eq!(session.click().await, ClickOutcome::Revealed);

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        assert!(!session.prompt_open().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_close_prompt() {
        let mut session = GestureSession::new();
        for _ in 0..10 {
            session.click().await;
        }
        assert!(session.prompt_open().await);

        session.close_prompt().await;
        assert!(!session.prompt_open().await);
    }
}
