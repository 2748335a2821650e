//! Multi-turn crank angle from a wrapping 16-bit angle reading.
//!
//! The sensor sits on the crankshaft and only reports position within one
//! turn. [`CrankState`] counts wraps of the raw reading and a cam pulse
//! resynchronises the count, giving a continuous angle over a cam cycle
//! (nominally 0-720° for a four-stroke engine).
//!
//! Wraps are inferred from the difference between consecutive samples, so
//! the crank must turn less than half a revolution between two samples or
//! the wrap direction is misread.

use crate::utils::raw_to_degrees;

/// A jump larger than this between two samples is read as a wrap
const HALF_TURN: i32 = 32767;

/// Level change seen on the cam pulse input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Inactive to active
    Rising,
    /// Active to inactive
    Falling,
}

/// One unwrapped crank sample
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CrankSample {
    /// Continuous crank angle in degrees
    pub degrees: f32,
    /// Revolution count after this sample
    pub revolutions: i8,
    /// A forward wrap consumed an armed cam pulse and reset the count
    pub synchronized: bool,
}

/// Wrap counter and cam pulse handshake
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CrankState {
    previous: Option<u16>,
    revolutions: i8,
    pulse_armed: bool,
    pulse_active: bool,
}

impl CrankState {
    /// Fresh tracker; the first observed sample only seeds the wrap detector
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous: None,
            revolutions: 0,
            pulse_armed: false,
            pulse_active: false,
        }
    }

    /// Revolutions counted since start or the last cam resync
    #[must_use]
    pub const fn revolutions(&self) -> i8 {
        self.revolutions
    }

    /// A cam pulse was seen and waits for the next forward wrap
    #[must_use]
    pub const fn pulse_armed(&self) -> bool {
        self.pulse_armed
    }

    /// The cam input is currently active
    #[must_use]
    pub const fn pulse_active(&self) -> bool {
        self.pulse_active
    }

    /// Feed a new raw angle and return the continuous crank angle
    ///
    /// The first sample only seeds the previous value; it never counts as
    /// a wrap.
    pub fn observe(&mut self, raw: u16) -> CrankSample {
        let mut synchronized = false;

        if let Some(previous) = self.previous {
            let diff = i32::from(raw) - i32::from(previous);
            if diff < -HALF_TURN {
                self.revolutions = self.revolutions.wrapping_add(1);
                if self.pulse_armed {
                    self.revolutions = 0;
                    self.pulse_armed = false;
                    synchronized = true;
                }
                #[cfg(feature = "defmt")]
                defmt::trace!("forward wrap, revolutions = {}", self.revolutions);
            } else if diff > HALF_TURN {
                self.revolutions = self.revolutions.wrapping_sub(1);
                #[cfg(feature = "defmt")]
                defmt::trace!("backward wrap, revolutions = {}", self.revolutions);
            }
        }
        self.previous = Some(raw);

        CrankSample {
            degrees: raw_to_degrees(raw) + 360.0 * f32::from(self.revolutions),
            revolutions: self.revolutions,
            synchronized,
        }
    }

    /// Update the pulse flags from the current cam input level
    ///
    /// A rising edge arms the resync; a falling edge only clears the
    /// active flag, the arm is consumed by [`Self::observe`].
    pub fn update_cam(&mut self, active: bool) -> Option<Edge> {
        match (self.pulse_active, active) {
            (false, true) => {
                self.pulse_active = true;
                self.pulse_armed = true;
                Some(Edge::Rising)
            }
            (true, false) => {
                self.pulse_active = false;
                Some(Edge::Falling)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        a - b < 0.01 && b - a < 0.01
    }

    #[test]
    fn forward_wrap_counts_once() {
        let mut state = CrankState::new();
        let mut counts = heapless::Vec::<i8, 64>::new();
        let mut raw: u16 = 60_000;
        for _ in 0..40 {
            counts.push(state.observe(raw).revolutions).unwrap();
            raw = raw.wrapping_add(1000);
        }
        // 60000 + 6 * 1000 = 66000 is the first sample past the wrap
        let wrap_at = counts.iter().position(|&c| c == 1).unwrap();
        assert_eq!(wrap_at, 6);
        assert!(counts[..wrap_at].iter().all(|&c| c == 0));
        assert!(counts[wrap_at..].iter().all(|&c| c == 1));
    }

    #[test]
    fn backward_wrap_counts_once() {
        let mut state = CrankState::new();
        let mut raw: u16 = 3000;
        let mut last = 0;
        let mut changes = 0;
        for _ in 0..40 {
            let revolutions = state.observe(raw).revolutions;
            if revolutions != last {
                changes += 1;
                last = revolutions;
            }
            raw = raw.wrapping_sub(1000);
        }
        assert_eq!(changes, 1);
        assert_eq!(state.revolutions(), -1);
    }

    #[test]
    fn armed_pulse_resets_on_forward_wrap() {
        let mut state = CrankState::new();
        for raw in [0, 30_000, 60_000, 10, 30_000, 60_000, 10] {
            state.observe(raw);
        }
        assert_eq!(state.revolutions(), 2);

        assert_eq!(state.update_cam(true), Some(Edge::Rising));
        assert!(state.pulse_armed());
        assert!(!state.observe(30_000).synchronized);
        assert!(!state.observe(60_000).synchronized);

        let sample = state.observe(20);
        assert!(sample.synchronized);
        assert_eq!(sample.revolutions, 0);
        assert!(!state.pulse_armed());
    }

    #[test]
    fn backward_wrap_keeps_pulse_armed() {
        let mut state = CrankState::new();
        state.observe(100);
        state.update_cam(true);
        let sample = state.observe(65_000);
        assert_eq!(sample.revolutions, -1);
        assert!(!sample.synchronized);
        assert!(state.pulse_armed());
    }

    #[test]
    fn falling_edge_leaves_arm_alone() {
        let mut state = CrankState::new();
        assert_eq!(state.update_cam(false), None);
        assert_eq!(state.update_cam(true), Some(Edge::Rising));
        assert_eq!(state.update_cam(true), None);
        assert_eq!(state.update_cam(false), Some(Edge::Falling));
        assert!(!state.pulse_active());
        assert!(state.pulse_armed());
    }

    #[test]
    fn unwraps_across_top_dead_centre() {
        let mut state = CrankState::new();
        let samples = [65_000, 65_530, 10, 50].map(|raw| state.observe(raw));

        assert_eq!(samples.map(|s| s.revolutions), [0, 0, 1, 1]);
        let expected = [357.06, 359.97, 360.05, 360.27];
        for (sample, degrees) in samples.iter().zip(expected) {
            assert!(approx(sample.degrees, degrees), "{}", sample.degrees);
        }
    }
}
