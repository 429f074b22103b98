//! The settle animation: the eased flight of a released item to its
//! destination, with the grip tilt decaying to zero on the way.

use std::time::{Duration, Instant};

use crate::engine::geometry::Point;

/// Position and tilt of the floating item at one instant of the settle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Top-left corner in viewport coordinates.
    pub pos: Point,
    /// Remaining tilt as a signed fraction of the full grip tilt.
    pub tilt: f64,
}

/// A pure interpolator from a start pose to a destination.
///
/// Duration is distance-proportional rather than fixed, so long moves take
/// visibly longer while short moves stay above a floor that still reads as
/// motion. Sampling is a pure function of elapsed time; the caller applies
/// each pose to its rendering surface once per frame.
#[derive(Debug, Clone)]
pub struct SettleAnimation {
    start: Point,
    dest: Point,
    tilt: f64,
    duration: Duration,
    started: Instant,
}

impl SettleAnimation {
    /// `speed` is in pixels per millisecond, already scaled by the commit or
    /// cancel multiplier.
    pub fn new(
        start: Point,
        dest: Point,
        tilt: f64,
        speed: f64,
        min_duration: Duration,
        started: Instant,
    ) -> SettleAnimation {
        let distance = start.distance(dest);
        let duration = Duration::from_secs_f64(distance / speed / 1000.0).max(min_duration);
        SettleAnimation { start, dest, tilt, duration, started }
    }

    pub fn dest(&self) -> Point { self.dest }

    pub fn duration(&self) -> Duration { self.duration }

    pub fn finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) > self.duration
    }

    pub fn sample(&self, now: Instant) -> Pose {
        let elapsed = now.saturating_duration_since(self.started);
        let t = (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0);
        let x = ease_out_expo(t);
        Pose {
            pos: Point::new(
                blend(self.start.x, self.dest.x, x),
                blend(self.start.y, self.dest.y, x),
            ),
            tilt: self.tilt * (1.0 - x),
        }
    }
}

fn ease_out_expo(t: f64) -> f64 {
    if t >= 1.0 { 1.0 } else { 1.0 - f64::powf(2.0, -10.0 * t) }
}

fn blend(a: f64, b: f64, s: f64) -> f64 { (1.0 - s) * a + s * b }
