use crate::error::{Error, Result};
use ordered_float::NotNan;
use serde::Serialize;
use std::cmp::Ordering;

/// Something that happened to one or two particles during a step.
///
/// Ids are particle ids, not indices, so events stay meaningful after the
/// particle list is compacted at the end of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    /// Particle `id` was reflected off the vessel boundary (`axis` 0 = x, 1 = y)
    /// or off an internal wall.
    WallBounce { id: u32, axis: u8 },
    /// Elastic (or reacting) collision between particles `i` and `j`.
    Collision { i: u32, j: u32 },
    /// `a` and `b` were consumed and replaced by `product`.
    Reaction { a: u32, b: u32, product: u32 },
    /// `product` split back into `a` and `b`.
    Dissociation { product: u32, a: u32, b: u32 },
}

/// An event stamped with the step in which it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Event {
    pub step: u64,
    pub kind: EventKind,
}

impl Event {
    #[inline]
    pub fn new(step: u64, kind: EventKind) -> Self {
        Self { step, kind }
    }
}

/// An overlapping pair found by the pair scan, with its penetration depth.
///
/// `i < j` are indices into the particle list as it was at detection time.
/// Ordering is deterministic: deeper contacts sort first, ties broken by `(i, j)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub depth: NotNan<f64>,
    pub i: usize,
    pub j: usize,
}

impl Contact {
    /// Create a new contact, validating that depth is not NaN and the pair is ordered.
    pub fn new(depth: f64, i: usize, j: usize) -> Result<Self> {
        if i >= j {
            return Err(Error::InvalidParam(
                "contact indices must satisfy i < j".into(),
            ));
        }
        let depth =
            NotNan::new(depth).map_err(|_| Error::InvalidParam("contact depth cannot be NaN".into()))?;
        Ok(Self { depth, i, j })
    }
}

impl Ord for Contact {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.depth.cmp(&self.depth) {
            Ordering::Equal => (self.i, self.j).cmp(&(other.i, other.j)),
            o => o,
        }
    }
}

impl PartialOrd for Contact {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
