//! Confirmation dialog with fade transitions.
//!
//! # Invariants
//! - Phase changes are driven only by `set_visible` and `advance`.
//! - `opacity` stays within `0.0..=1.0`; reversing mid-fade keeps it.
//! - Actions are only reported while the dialog is on screen.

use std::time::Duration;

/// Length of one full fade-in or fade-out.
pub const FADE_DURATION: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Hidden,
    FadingIn,
    Visible,
    FadingOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogAction {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct ConfirmDialog {
    title: String,
    body: String,
    phase: DialogPhase,
    opacity: f32,
}

impl ConfirmDialog {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            phase: DialogPhase::Hidden,
            opacity: 0.0,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn phase(&self) -> DialogPhase {
        self.phase
    }

    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    pub fn is_presented(&self) -> bool {
        self.phase != DialogPhase::Hidden
    }

    /// Starts a fade toward the requested visibility.
    pub fn set_visible(&mut self, visible: bool) {
        self.phase = match (visible, self.phase) {
            (true, DialogPhase::Hidden | DialogPhase::FadingOut) => DialogPhase::FadingIn,
            (false, DialogPhase::Visible | DialogPhase::FadingIn) => DialogPhase::FadingOut,
            (_, phase) => phase,
        };
    }

    /// Advances the running fade by `elapsed` and returns the new phase.
    pub fn advance(&mut self, elapsed: Duration) -> DialogPhase {
        let step = elapsed.as_secs_f32() / FADE_DURATION.as_secs_f32();
        match self.phase {
            DialogPhase::FadingIn => {
                self.opacity = (self.opacity + step).min(1.0);
                if self.opacity >= 1.0 {
                    self.phase = DialogPhase::Visible;
                }
            }
            DialogPhase::FadingOut => {
                self.opacity = (self.opacity - step).max(0.0);
                if self.opacity <= 0.0 {
                    self.phase = DialogPhase::Hidden;
                }
            }
            DialogPhase::Hidden | DialogPhase::Visible => {}
        }
        self.phase
    }

    pub fn confirm(&self) -> Option<DialogAction> {
        self.is_presented().then_some(DialogAction::Confirmed)
    }

    pub fn cancel(&self) -> Option<DialogAction> {
        self.is_presented().then_some(DialogAction::Cancelled)
    }
}
