//! Dashboard session state machine (fetch/render).
//!
//! Ensures only one fetch runs at a time and that rendering never
//! overlaps a fetch. Used by the dashboard.

/// Presentation session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Fetching,
    Rendering,
}

impl SessionState {
    /// True if a refresh can be started.
    pub fn can_start_refresh(self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// True if a render from the store can be started.
    pub fn can_start_render(self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// State after the user asks for a refresh. Stays put when busy.
    pub fn on_refresh_requested(self) -> Self {
        if self.can_start_refresh() {
            SessionState::Fetching
        } else {
            self
        }
    }

    /// State after a fetch cycle (fetch + save) ends, successful or not.
    pub fn on_fetch_done(self) -> Self {
        match self {
            SessionState::Fetching => SessionState::Idle,
            other => other,
        }
    }

    /// State after a render is requested. Stays put when busy.
    pub fn on_render_requested(self) -> Self {
        if self.can_start_render() {
            SessionState::Rendering
        } else {
            self
        }
    }

    /// State after the view has been produced.
    pub fn on_render_done(self) -> Self {
        SessionState::Idle
    }
}
