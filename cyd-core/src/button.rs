//! Button press handoff between an interrupt context and the main loop
//!
//! Exactly one producer sets the flag (the GPIO edge handler) and exactly one
//! consumer takes it (the slideshow loop). `take` is a single atomic swap, so
//! a press that lands while the loop is busy decoding is kept for the next
//! tick and is reported once.

use portable_atomic::{AtomicBool, Ordering};

/// Single-writer, single-reader "button was pressed" flag
#[derive(Debug)]
pub struct ButtonFlag {
    pressed: AtomicBool,
}

impl ButtonFlag {
    /// Create a cleared flag (usable in a `static`)
    pub const fn new() -> Self {
        Self {
            pressed: AtomicBool::new(false),
        }
    }

    /// Record a press (producer side)
    pub fn set(&self) {
        self.pressed.store(true, Ordering::Release);
    }

    /// Read and clear the flag in one step (consumer side)
    pub fn take(&self) -> bool {
        self.pressed.swap(false, Ordering::AcqRel)
    }

    /// Peek without clearing
    pub fn is_set(&self) -> bool {
        self.pressed.load(Ordering::Acquire)
    }
}

impl Default for ButtonFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears() {
        let flag = ButtonFlag::new();
        assert!(!flag.take());

        flag.set();
        assert!(flag.is_set());
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_repeated_presses_coalesce() {
        let flag = ButtonFlag::new();
        flag.set();
        flag.set();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn test_static_flag_across_threads() {
        static FLAG: ButtonFlag = ButtonFlag::new();

        std::thread::spawn(|| FLAG.set()).join().unwrap();
        assert!(FLAG.take());
    }
}
