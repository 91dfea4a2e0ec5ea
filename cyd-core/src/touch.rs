//! Touch calibration and the touch echo loop body

use crate::config::{DisplayConfig, TouchConfig};
use crate::traits::{DisplayError, DisplayExt, RawPoint, TextDisplay, TouchError, TouchSensor};

/// Linearly remap `value` from `[in_min, in_max]` to `[out_min, out_max]`
///
/// Integer arithmetic, truncating toward zero. Values outside the input
/// range extrapolate; callers clamp if needed.
pub fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// A touch position in screen pixels, with the raw pressure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
    pub pressure: u16,
}

/// Raw-to-screen calibration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub x_min: u16,
    pub x_max: u16,
    pub y_min: u16,
    pub y_max: u16,
    pub width: u16,
    pub height: u16,
}

impl Calibration {
    /// Build from the board configuration
    pub fn from_config(touch: &TouchConfig, display: &DisplayConfig) -> Self {
        Self {
            x_min: touch.x_min,
            x_max: touch.x_max,
            y_min: touch.y_min,
            y_max: touch.y_max,
            width: display.width,
            height: display.height,
        }
    }

    /// Map a raw sample to screen coordinates (1-based, like the panel demos)
    pub fn map(&self, raw: RawPoint) -> ScreenPoint {
        ScreenPoint {
            x: map_range(
                raw.x as i32,
                self.x_min as i32,
                self.x_max as i32,
                1,
                self.width as i32,
            ),
            y: map_range(
                raw.y as i32,
                self.y_min as i32,
                self.y_max as i32,
                1,
                self.height as i32,
            ),
            pressure: raw.z,
        }
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::from_config(&TouchConfig::default(), &DisplayConfig::default())
    }
}

/// Errors from one echo poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EchoError {
    Touch(TouchError),
    Display(DisplayError),
}

impl From<TouchError> for EchoError {
    fn from(e: TouchError) -> Self {
        EchoError::Touch(e)
    }
}

impl From<DisplayError> for EchoError {
    fn from(e: DisplayError) -> Self {
        EchoError::Display(e)
    }
}

/// Touch echo: read a touch and print it centered on the screen
#[derive(Debug, Clone, Copy)]
pub struct TouchEcho {
    calibration: Calibration,
}

impl TouchEcho {
    /// Row of the first readout line
    pub const FIRST_ROW: u8 = 3;

    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    /// Poll the sensor once
    ///
    /// If the panel is touched, clears the display, draws the X, Y and
    /// pressure lines and returns the mapped point. The caller logs it and
    /// waits out the debounce delay.
    pub fn poll<T: TouchSensor, D: TextDisplay>(
        &self,
        touch: &mut T,
        display: &mut D,
    ) -> Result<Option<ScreenPoint>, EchoError> {
        if !touch.touched()? {
            return Ok(None);
        }

        let point = self.calibration.map(touch.read_raw()?);

        display.clear()?;
        display.draw_value(Self::FIRST_ROW, "X", point.x)?;
        display.draw_value(Self::FIRST_ROW + 2, "Y", point.y)?;
        display.draw_value(Self::FIRST_ROW + 4, "Pressure", point.pressure as i32)?;

        Ok(Some(point))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockTouch, RecordingDisplay};
    use proptest::prelude::*;

    fn cyd() -> Calibration {
        Calibration {
            x_min: 200,
            x_max: 3700,
            y_min: 240,
            y_max: 3800,
            width: 320,
            height: 240,
        }
    }

    #[test]
    fn test_map_range_endpoints() {
        assert_eq!(map_range(200, 200, 3700, 1, 320), 1);
        assert_eq!(map_range(3700, 200, 3700, 1, 320), 320);
    }

    #[test]
    fn test_map_range_truncates() {
        // 1750 * 319 / 3500 = 159.5
        assert_eq!(map_range(1950, 200, 3700, 1, 320), 160);
    }

    #[test]
    fn test_map_range_degenerate_input() {
        assert_eq!(map_range(500, 100, 100, 1, 320), 1);
    }

    #[test]
    fn test_calibration_corners() {
        let cal = cyd();
        let low = cal.map(RawPoint { x: 200, y: 240, z: 500 });
        assert_eq!((low.x, low.y, low.pressure), (1, 1, 500));

        let high = cal.map(RawPoint { x: 3700, y: 3800, z: 500 });
        assert_eq!((high.x, high.y), (320, 240));
    }

    #[test]
    fn test_calibration_midpoint() {
        let mid = cyd().map(RawPoint { x: 1950, y: 2020, z: 1 });
        assert!((mid.x - 160).abs() <= 1);
        assert!((mid.y - 120).abs() <= 1);
    }

    #[test]
    fn test_default_calibration_matches_board() {
        assert_eq!(Calibration::default(), cyd());
    }

    #[test]
    fn test_echo_idle_draws_nothing() {
        let echo = TouchEcho::new(cyd());
        let mut touch = MockTouch::idle();
        let mut display = RecordingDisplay::new(15);

        assert_eq!(echo.poll(&mut touch, &mut display), Ok(None));
        assert_eq!(display.clears, 0);
        assert!(display.lines.is_empty());
    }

    #[test]
    fn test_echo_draws_three_lines() {
        let echo = TouchEcho::new(cyd());
        let mut touch = MockTouch::pressed(3700, 240, 812);
        let mut display = RecordingDisplay::new(15);

        let point = echo.poll(&mut touch, &mut display).unwrap().unwrap();
        assert_eq!((point.x, point.y, point.pressure), (320, 1, 812));

        assert_eq!(display.clears, 1);
        assert_eq!(
            display.lines,
            [
                (3, "X = 320".into()),
                (5, "Y = 1".into()),
                (7, "Pressure = 812".into()),
            ]
        );
    }

    #[test]
    fn test_echo_bus_error() {
        let echo = TouchEcho::new(cyd());
        let mut touch = MockTouch::idle();
        touch.fail = true;
        let mut display = RecordingDisplay::new(15);

        assert_eq!(
            echo.poll(&mut touch, &mut display),
            Err(EchoError::Touch(TouchError::Bus))
        );
    }

    proptest! {
        #[test]
        fn prop_map_monotonic(a in 200u16..=3700, b in 200u16..=3700) {
            let cal = cyd();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let p_lo = cal.map(RawPoint { x: lo, y: 240, z: 1 });
            let p_hi = cal.map(RawPoint { x: hi, y: 240, z: 1 });
            prop_assert!(p_lo.x <= p_hi.x);
        }

        #[test]
        fn prop_map_in_screen_range(x in 200u16..=3700, y in 240u16..=3800) {
            let p = cyd().map(RawPoint { x, y, z: 1 });
            prop_assert!((1..=320).contains(&p.x));
            prop_assert!((1..=240).contains(&p.y));
        }
    }
}
