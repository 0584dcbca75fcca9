//! Application state for the interactive rating view
//!
//! Mirrors the tracker's published state, handles keyboard input and records
//! refresh requests for the event loop to act on.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::watch;

use crate::tracker::{AggregateState, TrackerConfig};

/// Main application struct for the interactive view
pub struct App {
    /// Latest state received from the tracker
    pub state: AggregateState,
    /// Handles being tracked, for labels
    pub config: TrackerConfig,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag indicating a refresh has been requested
    pub refresh_requested: bool,
    receiver: watch::Receiver<AggregateState>,
}

impl App {
    /// Creates an App following `receiver`
    pub fn new(receiver: watch::Receiver<AggregateState>, config: TrackerConfig) -> Self {
        let state = receiver.borrow().clone();
        Self {
            state,
            config,
            should_quit: false,
            refresh_requested: false,
            receiver,
        }
    }

    /// Pulls the newest tracker state; returns true if it changed
    pub fn sync(&mut self) -> bool {
        if !self.receiver.has_changed().unwrap_or(false) {
            return false;
        }
        self.state = self.receiver.borrow_and_update().clone();
        true
    }

    /// Returns and clears a pending refresh request
    pub fn take_refresh_request(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Handles keyboard input and updates state accordingly
    ///
    /// # Key Bindings
    /// - `q`, `Esc` or `Ctrl-C`: Quit the application
    /// - `r`: Refresh ratings (ignored while a cycle is loading)
    pub fn handle_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                if !self.state.loading {
                    self.refresh_requested = true;
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::Ratings;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn config() -> TrackerConfig {
        TrackerConfig {
            codeforces_handle: "alice".to_string(),
            codechef_handle: "bob".to_string(),
            fallback: Ratings::default(),
        }
    }

    fn ready_state() -> AggregateState {
        AggregateState {
            loading: false,
            ..AggregateState::initial(Ratings::default())
        }
    }

    #[test]
    fn test_quit_keys() {
        for event in [
            key(KeyCode::Char('q')),
            key(KeyCode::Esc),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let (_tx, rx) = watch::channel(ready_state());
            let mut app = App::new(rx, config());
            app.handle_key(event);
            assert!(app.should_quit);
        }
    }

    #[test]
    fn test_refresh_ignored_while_loading() {
        let (_tx, rx) = watch::channel(AggregateState::initial(Ratings::default()));
        let mut app = App::new(rx, config());

        app.handle_key(key(KeyCode::Char('r')));
        assert!(!app.take_refresh_request());
    }

    #[test]
    fn test_refresh_request_is_taken_once() {
        let (_tx, rx) = watch::channel(ready_state());
        let mut app = App::new(rx, config());

        app.handle_key(key(KeyCode::Char('r')));
        assert!(app.take_refresh_request());
        assert!(!app.take_refresh_request());
    }

    #[test]
    fn test_sync_follows_tracker_state() {
        let (tx, rx) = watch::channel(AggregateState::initial(Ratings::default()));
        let mut app = App::new(rx, config());
        assert!(!app.sync());

        tx.send_modify(|state| {
            state.loading = false;
            state.ratings.codeforces = 1600;
        });

        assert!(app.sync());
        assert!(!app.state.loading);
        assert_eq!(app.state.ratings.codeforces, 1600);
    }
}
