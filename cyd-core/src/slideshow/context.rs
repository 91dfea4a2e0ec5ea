//! Slideshow context
//!
//! Holds everything the advance loop mutates: the cursor, the catalog (whose
//! count is cached at startup), the time of the last advance and the state.
//! The button flag is shared with the interrupt-side producer.

use alloc::vec::Vec;

use super::events::{AdvanceReason, Event};
use super::machine::State;
use crate::button::ButtonFlag;
use crate::catalog::{wrap_index, Catalog, CatalogError, ImageSource, Selection};
use crate::config::SlideshowConfig;
use crate::traits::{ImagePresenter, Storage};

/// Outcome of one advance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceReport {
    /// Trigger that caused the advance (`None` for the initial image)
    pub reason: Option<AdvanceReason>,
    /// Every selection attempted, in order; the last one is the result
    pub selections: Vec<Selection>,
}

impl AdvanceReport {
    /// The selection that reached the panel, if any
    pub fn shown(&self) -> Option<&Selection> {
        self.selections.last().filter(|s| s.is_shown())
    }

    /// Attempts that did not reach the panel
    pub fn failures(&self) -> impl Iterator<Item = &Selection> {
        self.selections.iter().filter(|s| !s.is_shown())
    }
}

/// Slideshow context
pub struct Slideshow<'f, C = Catalog> {
    source: C,
    cursor: usize,
    last_advance_ms: u64,
    interval_ms: u64,
    state: State,
    button: &'f ButtonFlag,
}

impl<'f> Slideshow<'f, Catalog> {
    /// Count the catalog and build a slideshow positioned on the first image
    ///
    /// Fails if the root directory cannot be opened or holds no JPEG files;
    /// the firmware treats both as fatal.
    pub fn start<S: Storage>(
        storage: &mut S,
        button: &'f ButtonFlag,
        config: &SlideshowConfig,
        now_ms: u64,
    ) -> Result<Self, CatalogError> {
        let catalog = Catalog::scan(storage)?;
        Ok(Self::with_source(catalog, button, config.interval_ms, now_ms))
    }
}

impl<'f, C: ImageSource> Slideshow<'f, C> {
    /// Build around an existing image source
    pub fn with_source(source: C, button: &'f ButtonFlag, interval_ms: u32, now_ms: u64) -> Self {
        Self {
            source,
            cursor: 0,
            last_advance_ms: now_ms,
            interval_ms: interval_ms as u64,
            state: State::Idle,
            button,
        }
    }

    /// Current cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of images counted at startup
    pub fn len(&self) -> usize {
        self.source.len()
    }

    /// Check if the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Current state
    pub fn state(&self) -> State {
        self.state
    }

    /// Present the image at the cursor without moving it first
    pub fn show_current<S: Storage, P: ImagePresenter>(
        &mut self,
        storage: &mut S,
        presenter: &mut P,
        now_ms: u64,
    ) -> AdvanceReport {
        let selections = self.present_from(storage, presenter, self.cursor);
        self.last_advance_ms = now_ms;
        AdvanceReport {
            reason: None,
            selections,
        }
    }

    /// Evaluate the advance triggers for this tick
    ///
    /// The button flag is taken on every call, so a press is reported exactly
    /// once even when another trigger also fired. Returns the highest
    /// priority reason: button, then touch, then timeout.
    pub fn poll_trigger(&mut self, now_ms: u64, pressure: u16) -> Option<AdvanceReason> {
        let pressed = self.button.take();
        if pressed {
            return Some(AdvanceReason::Button);
        }
        if pressure > 0 {
            return Some(AdvanceReason::Touch);
        }
        if now_ms.saturating_sub(self.last_advance_ms) >= self.interval_ms {
            return Some(AdvanceReason::Timeout);
        }
        None
    }

    /// Move to the next image and present it
    ///
    /// Entries that fail to open or decode are skipped and the following
    /// index is tried, at most once per catalog entry. A missing entry or an
    /// unopenable root ends the advance with the previous image on screen,
    /// but the cursor still moves so the next trigger tries the entry after
    /// it. The interval restarts from `now_ms` either way.
    pub fn advance<S: Storage, P: ImagePresenter>(
        &mut self,
        storage: &mut S,
        presenter: &mut P,
        reason: AdvanceReason,
        now_ms: u64,
    ) -> AdvanceReport {
        self.state = self.state.transition(Event::Trigger(reason));

        let next = wrap_index(self.cursor + 1, self.source.len());
        self.cursor = next;
        let selections = self.present_from(storage, presenter, next);

        self.last_advance_ms = now_ms;
        self.state = self.state.transition(Event::Presented);

        AdvanceReport {
            reason: Some(reason),
            selections,
        }
    }

    /// Evaluate the triggers and advance at most once
    pub fn tick<S: Storage, P: ImagePresenter>(
        &mut self,
        storage: &mut S,
        presenter: &mut P,
        now_ms: u64,
        pressure: u16,
    ) -> Option<AdvanceReport> {
        let reason = self.poll_trigger(now_ms, pressure)?;
        Some(self.advance(storage, presenter, reason, now_ms))
    }

    fn present_from<S: Storage, P: ImagePresenter>(
        &mut self,
        storage: &mut S,
        presenter: &mut P,
        start: usize,
    ) -> Vec<Selection> {
        let count = self.source.len();
        let mut selections = Vec::new();
        let mut index = wrap_index(start, count);

        for _ in 0..count.max(1) {
            let selection = self.source.select(storage, presenter, index);
            let retry = matches!(selection, Selection::Failed { .. });

            if let Selection::Shown { index: shown, .. } | Selection::Failed { index: shown, .. } =
                &selection
            {
                self.cursor = *shown;
            }
            selections.push(selection);

            if !retry {
                break;
            }
            index = wrap_index(index + 1, count);
        }

        selections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CachedCatalog;
    use crate::mock::{MemStorage, RecordingPresenter};
    use crate::traits::{PresentError, StorageError};

    const INTERVAL: u32 = 10_000;

    fn config() -> SlideshowConfig {
        SlideshowConfig::default()
    }

    fn three() -> MemStorage {
        MemStorage::with_root_files(&["a.jpg", "notes.txt", "b.JPG", "c.jpg"])
    }

    fn shown_name(report: &AdvanceReport) -> &str {
        match report.shown() {
            Some(Selection::Shown { name, .. }) => name.as_str(),
            other => panic!("expected Shown, got {:?}", other),
        }
    }

    #[test]
    fn test_start_counts_catalog() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        assert_eq!(show.len(), 3);
        assert_eq!(show.cursor(), 0);
        assert_eq!(show.state(), State::Idle);
    }

    #[test]
    fn test_start_without_images_fails() {
        let flag = ButtonFlag::new();
        let mut storage = MemStorage::with_root_files(&["notes.txt"]);
        storage.add_dir("/ALBUM.JPG");

        let result = Slideshow::start(&mut storage, &flag, &config(), 0);
        assert!(matches!(result, Err(CatalogError::Empty)));
    }

    #[test]
    fn test_start_root_unavailable() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        storage.root_unavailable = true;

        let result = Slideshow::start(&mut storage, &flag, &config(), 0);
        assert!(matches!(
            result,
            Err(CatalogError::RootUnavailable(StorageError::Device))
        ));
    }

    #[test]
    fn test_show_current_presents_first_image() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        let report = show.show_current(&mut storage, &mut presenter, 5);
        assert_eq!(report.reason, None);
        assert_eq!(shown_name(&report), "a.jpg");
        assert_eq!(show.cursor(), 0);
    }

    #[test]
    fn test_no_trigger_no_advance() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        assert!(show.tick(&mut storage, &mut presenter, 9_999, 0).is_none());
        assert_eq!(show.cursor(), 0);
        assert!(presenter.attempts.is_empty());
    }

    #[test]
    fn test_timeout_trigger() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 1_000).unwrap();

        assert_eq!(show.poll_trigger(10_999, 0), None);
        assert_eq!(show.poll_trigger(11_000, 0), Some(AdvanceReason::Timeout));

        let report = show.tick(&mut storage, &mut presenter, 11_000, 0).unwrap();
        assert_eq!(report.reason, Some(AdvanceReason::Timeout));
        assert_eq!(shown_name(&report), "b.JPG");

        // Interval restarts from the advance
        assert_eq!(show.poll_trigger(20_999, 0), None);
        assert_eq!(show.poll_trigger(21_000, 0), Some(AdvanceReason::Timeout));
    }

    #[test]
    fn test_touch_trigger() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        let report = show.tick(&mut storage, &mut presenter, 10, 420).unwrap();
        assert_eq!(report.reason, Some(AdvanceReason::Touch));
        assert_eq!(show.cursor(), 1);
    }

    #[test]
    fn test_all_triggers_advance_once() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        flag.set();
        let report = show.tick(&mut storage, &mut presenter, 50_000, 900).unwrap();

        assert_eq!(report.reason, Some(AdvanceReason::Button));
        assert_eq!(show.cursor(), 1);
        assert_eq!(presenter.shown, ["b.JPG"]);
        assert!(!flag.is_set());

        // Same instant, touch released: nothing left to fire
        assert!(show.tick(&mut storage, &mut presenter, 50_000, 0).is_none());
        assert_eq!(show.cursor(), 1);
    }

    #[test]
    fn test_press_during_decode_seen_next_tick_once() {
        // Presenter that presses the button while "decoding"
        struct PressingPresenter<'a> {
            flag: &'a ButtonFlag,
            inner: RecordingPresenter,
        }

        impl ImagePresenter for PressingPresenter<'_> {
            fn present<F: crate::traits::ReadFile>(
                &mut self,
                name: &str,
                file: &mut F,
            ) -> Result<(), PresentError> {
                self.flag.set();
                self.inner.present(name, file)
            }
        }

        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = PressingPresenter {
            flag: &flag,
            inner: RecordingPresenter::new(),
        };
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        let first = show.tick(&mut storage, &mut presenter, 10_000, 0).unwrap();
        assert_eq!(first.reason, Some(AdvanceReason::Timeout));
        assert!(flag.is_set());

        // Swap presenter so the next decode does not press again
        let mut quiet = RecordingPresenter::new();
        let second = show.tick(&mut storage, &mut quiet, 10_020, 0).unwrap();
        assert_eq!(second.reason, Some(AdvanceReason::Button));

        assert!(show.tick(&mut storage, &mut quiet, 10_040, 0).is_none());
        assert_eq!(show.cursor(), 2);
    }

    #[test]
    fn test_cursor_wraps() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        for now in 1..=4u64 {
            flag.set();
            show.tick(&mut storage, &mut presenter, now, 0).unwrap();
        }

        assert_eq!(presenter.shown, ["b.JPG", "c.jpg", "a.jpg", "b.JPG"]);
        assert_eq!(show.cursor(), 1);
    }

    #[test]
    fn test_decode_failure_skips_to_next() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::failing(&["b.JPG"]);
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        flag.set();
        let report = show.tick(&mut storage, &mut presenter, 1, 0).unwrap();

        assert_eq!(shown_name(&report), "c.jpg");
        assert_eq!(report.failures().count(), 1);
        assert_eq!(show.cursor(), 2);
        assert_eq!(storage.open_files(), 0);
    }

    #[test]
    fn test_all_failing_keeps_previous_image() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::failing(&["a.jpg", "b.JPG", "c.jpg"]);
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        flag.set();
        let report = show.tick(&mut storage, &mut presenter, 1, 0).unwrap();

        assert!(report.shown().is_none());
        assert_eq!(report.selections.len(), 3);
        assert_eq!(presenter.attempts, ["b.JPG", "c.jpg", "a.jpg"]);
        assert_eq!(show.state(), State::Idle);
        assert_eq!(storage.open_files(), 0);
    }

    #[test]
    fn test_missing_entry_stops_advance() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        storage.remove("c.jpg");
        storage.remove("b.JPG");

        flag.set();
        let report = show.tick(&mut storage, &mut presenter, 1, 0).unwrap();

        assert_eq!(report.selections, [Selection::Missing { index: 1 }]);
        assert!(presenter.attempts.is_empty());
        assert_eq!(show.cursor(), 1);
        assert_eq!(show.state(), State::Idle);
    }

    #[test]
    fn test_missing_entries_walk_back_to_start() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        storage.remove("b.JPG");
        storage.remove("c.jpg");

        let mut reports = Vec::new();
        for now in 1..=3u64 {
            flag.set();
            reports.push(show.tick(&mut storage, &mut presenter, now, 0).unwrap());
        }

        assert_eq!(reports[0].selections, [Selection::Missing { index: 1 }]);
        assert_eq!(reports[1].selections, [Selection::Missing { index: 2 }]);
        assert_eq!(shown_name(&reports[2]), "a.jpg");
        assert_eq!(presenter.shown, ["a.jpg"]);
        assert_eq!(show.cursor(), 0);
    }

    #[test]
    fn test_unavailable_root_still_moves_cursor() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        storage.root_unavailable = true;
        flag.set();
        let report = show.tick(&mut storage, &mut presenter, 1, 0).unwrap();
        assert!(matches!(report.selections[..], [Selection::Unavailable(_)]));
        assert_eq!(show.cursor(), 1);

        storage.root_unavailable = false;
        flag.set();
        let report = show.tick(&mut storage, &mut presenter, 2, 0).unwrap();
        assert_eq!(shown_name(&report), "c.jpg");
    }

    #[test]
    fn test_trigger_accepted_right_after_advance() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let mut show = Slideshow::start(&mut storage, &flag, &config(), 0).unwrap();

        show.advance(&mut storage, &mut presenter, AdvanceReason::Touch, 5);
        assert_eq!(show.state(), State::Idle);

        flag.set();
        assert_eq!(show.poll_trigger(5, 0), Some(AdvanceReason::Button));
    }

    #[test]
    fn test_cached_source_behaves_the_same() {
        let flag = ButtonFlag::new();
        let mut storage = three();
        let mut presenter = RecordingPresenter::new();
        let cached = CachedCatalog::scan(&mut storage).unwrap();
        let mut show = Slideshow::with_source(cached, &flag, INTERVAL, 0);

        show.tick(&mut storage, &mut presenter, 10_000, 0).unwrap();
        show.tick(&mut storage, &mut presenter, 10_001, 1).unwrap();
        assert_eq!(presenter.shown, ["b.JPG", "c.jpg"]);
    }
}
