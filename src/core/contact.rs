use crate::core::body::{Body, RADIUS};
use crate::error::{Error, Result};
use ordered_float::NotNan;
use std::cmp::Ordering;

/// Kinds of contact the event scan can select.
///
/// Tie-breaking for deterministic ordering prefers `Pair` < `Wall` when times
/// are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Disk-disk contact between bodies `i` and `j` (`i < j`).
    Pair { i: usize, j: usize },
    /// Disk-boundary contact for body `i` on the given axis (0 = x, 1 = y);
    /// `high` selects the far boundary over the near one.
    Wall { i: usize, axis: usize, high: bool },
}

impl ContactKind {
    #[inline]
    fn order_key(&self) -> (u8, usize, usize) {
        match *self {
            ContactKind::Pair { i, j } => (0, i, j),
            ContactKind::Wall { i, axis, high } => (1, i, axis * 2 + usize::from(high)),
        }
    }
}

/// A candidate next event with a total, deterministic ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub time: NotNan<f64>,
    pub kind: ContactKind,
}

impl Contact {
    /// Create a contact candidate, rejecting NaN times.
    pub fn new(time: f64, kind: ContactKind) -> Result<Self> {
        let time = NotNan::new(time)
            .map_err(|_| Error::InvalidParam("contact time cannot be NaN".into()))?;
        Ok(Self { time, kind })
    }

    /// Returns the raw f64 contact time.
    #[inline]
    pub fn time_f64(&self) -> f64 {
        self.time.into_inner()
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.time.cmp(&other.time) {
            Ordering::Equal => self.kind.order_key().cmp(&other.kind.order_key()),
            o => o,
        }
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Time until body `a` and body `b` first touch, as the earlier root of the
/// contact quadratic.
///
/// This is the RAW root: it may be negative (contact in the past), infinite,
/// or the result of a degenerate 0/0 division. A negative discriminant (the
/// paths never close to 2·RADIUS) yields `+∞`. The event scan filters to
/// finite positive values; the collision-commit guard consumes the raw value
/// unfiltered.
pub fn pair_contact_time(a: &Body, b: &Body) -> f64 {
    let p = a.point.x - b.point.x;
    let q = a.point.y - b.point.y;

    let dvx = a.velocity.x - b.velocity.x;
    let dvy = a.velocity.y - b.velocity.y;

    let o = dvx * q - dvy * p;
    let r = dvx * dvx + dvy * dvy;
    let sqrt_d = (4.0 * RADIUS * RADIUS * r - o * o).sqrt();

    if sqrt_d.is_nan() {
        return f64::INFINITY;
    }

    let s = dvx * p + dvy * q;

    (-s - sqrt_d) / r
}

/// Time for coordinate `point` moving at `velocity` to reach `target`.
///
/// Returns `+∞` unless the solution is strictly positive (receding or
/// stationary coordinates never produce an event).
pub fn wall_contact_time(point: f64, velocity: f64, target: f64) -> f64 {
    let k = (target - point) / velocity;

    if k > 0.0 {
        return k;
    }

    f64::INFINITY
}
