//! Events that drive the slideshow state machine

/// Why the slideshow advanced, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvanceReason {
    /// BOOT button pressed since the last evaluation
    Button,
    /// Touch pressure above zero on this tick
    Touch,
    /// Interval elapsed since the last advance
    Timeout,
}

/// Events that can trigger state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// An advance trigger fired
    Trigger(AdvanceReason),
    /// Selection finished (shown or given up); the panel is stable again
    Presented,
}
