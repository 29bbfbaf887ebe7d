use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed spatial dimension (2D).
pub const DIM: usize = 2;

/// Chemical identity of a particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    A,
    B,
    /// Result of an A + B reaction.
    Product,
}

impl Element {
    /// True for the unordered pair {A, B}, the only pair that may react.
    #[inline]
    pub fn reacts_with(self, other: Element) -> bool {
        matches!(
            (self, other),
            (Element::A, Element::B) | (Element::B, Element::A)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Element::A => "A",
            Element::B => "B",
            Element::Product => "Product",
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A disc-shaped particle in the vessel.
///
/// Fields:
/// - `id`: stable identifier, never reused within a run
/// - `element`: A, B or Product
/// - `r`: position vector [x, y]
/// - `v`: velocity vector [vx, vy]
/// - `radius`: collision radius (> 0)
/// - `mass`: particle mass (> 0)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Stable particle identifier.
    pub id: u32,
    /// Element type.
    pub element: Element,
    /// Position (x, y).
    pub r: [f64; DIM],
    /// Velocity (vx, vy).
    pub v: [f64; DIM],
    /// Collision radius (> 0).
    pub radius: f64,
    /// Mass (> 0).
    pub mass: f64,
}

impl Particle {
    /// Create a new particle after validating invariants.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if `radius` or `mass` is non-positive or any component is NaN/inf.
    pub fn new(
        id: u32,
        element: Element,
        r: [f64; DIM],
        v: [f64; DIM],
        radius: f64,
        mass: f64,
    ) -> Result<Self> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParam("radius must be finite and > 0".into()));
        }
        if !mass.is_finite() || mass <= 0.0 {
            return Err(Error::InvalidParam("mass must be finite and > 0".into()));
        }
        if !r.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("position must be finite".into()));
        }
        if !v.iter().all(|x| x.is_finite()) {
            return Err(Error::InvalidParam("velocity must be finite".into()));
        }
        Ok(Self {
            id,
            element,
            r,
            v,
            radius,
            mass,
        })
    }

    /// Returns the particle's kinetic energy: 1/2 m |v|^2.
    #[inline]
    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.speed_sq()
    }

    /// Returns the momentum vector m v.
    #[inline]
    pub fn momentum(&self) -> [f64; DIM] {
        [self.mass * self.v[0], self.mass * self.v[1]]
    }

    #[inline]
    pub fn speed_sq(&self) -> f64 {
        self.v.iter().map(|&c| c * c).sum()
    }

    /// Returns true if every position and velocity component is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.r.iter().chain(self.v.iter()).all(|x| x.is_finite())
    }
}
