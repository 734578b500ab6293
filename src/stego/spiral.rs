//! Spiral pixel traversal.
//!
//! Visits every coordinate of a `width x height` grid exactly once, starting at
//! the center pixel `(width / 2, height / 2)` and walking outward in square
//! rings. Legs alternate horizontal/vertical and grow by one every two legs:
//! 1, 1, 2, 2, 3, 3, ...
//!
//! Clockwise starts right then down; counterclockwise mirrors it, starting
//! left then up. Steps outside the image are never emitted; legs (or the
//! out-of-range parts of legs) are skipped arithmetically, so the cost is
//! proportional to the pixel count plus the number of legs walked.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use super::image::ExtractError;

/// Spiral direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Clockwise,
    Counterclockwise,
}

impl Direction {
    /// Both directions, in reporting order.
    pub const ALL: [Direction; 2] = [Direction::Clockwise, Direction::Counterclockwise];

    /// Lowercase label used in file names and provenance tags.
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Clockwise => "clockwise",
            Direction::Counterclockwise => "counterclockwise",
        }
    }

    /// Human-readable name used in reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Direction::Clockwise => "Clockwise",
            Direction::Counterclockwise => "Counter-clockwise",
        }
    }

    /// Unit step of leg number `leg`.
    fn heading(self, leg: u64) -> (i64, i64) {
        let sign = match self {
            Direction::Clockwise => 1,
            Direction::Counterclockwise => -1,
        };
        match leg % 4 {
            0 => (sign, 0),
            1 => (0, sign),
            2 => (-sign, 0),
            _ => (0, -sign),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "clockwise" | "cw" => Ok(Direction::Clockwise),
            "counterclockwise" | "counter-clockwise" | "ccw" => Ok(Direction::Counterclockwise),
            _ => Err(ExtractError::InvalidDirection(s.to_string())),
        }
    }
}

/// Length of leg number `leg`.
fn leg_length(leg: u64) -> i64 {
    (leg / 2) as i64 + 1
}

/// Steps `t` in `1..=len` for which `origin + delta * t` lies in `0..bound`.
fn axis_window(origin: i64, delta: i64, bound: i64, len: i64) -> Option<(i64, i64)> {
    let (lo, hi) = match delta {
        0 if (0..bound).contains(&origin) => (1, len),
        0 => return None,
        d if d > 0 => ((-origin).max(1), (bound - 1 - origin).min(len)),
        _ => ((origin - bound + 1).max(1), origin.min(len)),
    };
    (lo <= hi).then_some((lo, hi))
}

/// Iterator over spiral coordinates `(x, y)`.
///
/// Yields exactly `width * height` items, each coordinate once.
#[derive(Debug, Clone)]
pub struct SpiralIter {
    width: i64,
    height: i64,
    direction: Direction,
    /// Position at the start of the current leg.
    x: i64,
    y: i64,
    leg: u64,
    /// Next and last in-bounds step of the current leg.
    window: Option<(i64, i64)>,
    remaining: usize,
    center_pending: bool,
}

impl SpiralIter {
    pub fn new(width: u32, height: u32, direction: Direction) -> Self {
        let mut iter = Self {
            width: width as i64,
            height: height as i64,
            direction,
            x: (width / 2) as i64,
            y: (height / 2) as i64,
            leg: 0,
            window: None,
            remaining: (width as usize) * (height as usize),
            center_pending: width > 0 && height > 0,
        };
        iter.window = iter.leg_window();
        iter
    }

    fn leg_window(&self) -> Option<(i64, i64)> {
        let (dx, dy) = self.direction.heading(self.leg);
        let len = leg_length(self.leg);
        let (lo_x, hi_x) = axis_window(self.x, dx, self.width, len)?;
        let (lo_y, hi_y) = axis_window(self.y, dy, self.height, len)?;
        let (lo, hi) = (lo_x.max(lo_y), hi_x.min(hi_y));
        (lo <= hi).then_some((lo, hi))
    }

    fn advance_leg(&mut self) {
        let (dx, dy) = self.direction.heading(self.leg);
        let len = leg_length(self.leg);
        self.x += dx * len;
        self.y += dy * len;
        self.leg += 1;
        self.window = self.leg_window();
    }
}

impl Iterator for SpiralIter {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        if self.center_pending {
            self.center_pending = false;
            self.remaining -= 1;
            return Some((self.x as u32, self.y as u32));
        }

        // Terminates: every lattice point lies on the spiral, so some later leg
        // always crosses the grid while coordinates remain.
        while self.window.is_none() {
            self.advance_leg();
        }

        let (next, last) = self.window?;
        let (dx, dy) = self.direction.heading(self.leg);
        let point = ((self.x + dx * next) as u32, (self.y + dy * next) as u32);

        self.window = (next < last).then_some((next + 1, last));
        self.remaining -= 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for SpiralIter {}

/// Collects the full spiral visiting order for an image.
pub fn spiral_coordinates(width: u32, height: u32, direction: Direction) -> Vec<(u32, u32)> {
    SpiralIter::new(width, height, direction).collect()
}
