//! Slideshow state machine

use super::events::Event;

/// Slideshow states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// Showing the image at the cursor, waiting for a trigger
    #[default]
    Idle,
    /// Cursor moved, next image loading
    Advancing,
}

impl State {
    /// Process an event and return the next state
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use State::*;

        match (self, event) {
            (Idle, Trigger(_)) => Advancing,
            (Advancing, Presented) => Idle,

            // Triggers while loading are ignored; the button flag keeps them
            _ => self,
        }
    }
}
