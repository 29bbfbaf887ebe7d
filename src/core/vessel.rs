use crate::core::particle::{Particle, DIM};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Something inside the vessel that particles cannot pass through.
///
/// Implementors are queried read-only from the step loop, so they must not hold
/// interior mutability.
pub trait Obstacle: Debug + Send + Sync {
    /// True if a disc of `radius` centred at `r` overlaps the obstacle.
    fn blocks_particle(&self, r: &[f64; DIM], radius: f64) -> bool;

    /// Push `p` back out of the obstacle and reflect it if it is running into it.
    ///
    /// `from` is where the particle's centre was before its latest move; the
    /// particle is kept on that side unless the move carried it through an
    /// opening. Returns the axis whose velocity component was flipped, if any.
    fn deflect(&self, p: &mut Particle, from: &[f64; DIM]) -> Option<u8>;

    /// True if the segment between two centres passes through the obstacle,
    /// in which case the two particles cannot touch.
    fn separates(&self, a: &[f64; DIM], b: &[f64; DIM]) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    /// Wall along y at `x = position`.
    Vertical,
    /// Wall along x at `y = position`.
    Horizontal,
}

/// Axis-aligned internal wall segment, optionally with a hole.
///
/// A particle whose centre lies inside the hole span passes through freely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub orientation: Orientation,
    /// Coordinate of the wall on its normal axis.
    pub position: f64,
    /// Extent along the wall axis.
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub hole: Option<(f64, f64)>,
}

impl Wall {
    /// Wall spanning the whole vessel at `x = position`.
    pub fn vertical(position: f64, height: f64) -> Self {
        Self {
            orientation: Orientation::Vertical,
            position,
            start: 0.0,
            end: height,
            hole: None,
        }
    }

    /// Wall spanning the whole vessel at `y = position`.
    pub fn horizontal(position: f64, width: f64) -> Self {
        Self {
            orientation: Orientation::Horizontal,
            position,
            start: 0.0,
            end: width,
            hole: None,
        }
    }

    pub fn with_hole(mut self, from: f64, to: f64) -> Self {
        self.hole = Some((from, to));
        self
    }

    /// Check the wall lies inside a `width` x `height` vessel and is well formed.
    pub fn validate(&self, width: f64, height: f64) -> Result<()> {
        let (normal_len, along_len) = match self.orientation {
            Orientation::Vertical => (width, height),
            Orientation::Horizontal => (height, width),
        };
        let finite = [self.position, self.start, self.end]
            .iter()
            .chain(self.hole.iter().flat_map(|(a, b)| [a, b]))
            .all(|x| x.is_finite());
        if !finite {
            return Err(Error::Config("wall coordinates must be finite".into()));
        }
        if self.position <= 0.0 || self.position >= normal_len {
            return Err(Error::Config(format!(
                "wall position {} lies outside the vessel",
                self.position
            )));
        }
        if self.start < 0.0 || self.end > along_len || self.start >= self.end {
            return Err(Error::Config(format!(
                "wall extent [{}, {}] must be increasing and inside [0, {}]",
                self.start, self.end, along_len
            )));
        }
        if let Some((a, b)) = self.hole {
            if a >= b || a < self.start || b > self.end {
                return Err(Error::Config(format!(
                    "wall hole [{a}, {b}] must be increasing and inside the wall extent"
                )));
            }
        }
        Ok(())
    }

    /// (normal axis, along axis)
    #[inline]
    fn axes(&self) -> (usize, usize) {
        match self.orientation {
            Orientation::Vertical => (0, 1),
            Orientation::Horizontal => (1, 0),
        }
    }

    #[inline]
    fn in_hole(&self, along: f64) -> bool {
        self.hole.is_some_and(|(a, b)| a <= along && along <= b)
    }
}

impl Obstacle for Wall {
    fn blocks_particle(&self, r: &[f64; DIM], radius: f64) -> bool {
        let (n, t) = self.axes();
        (r[n] - self.position).abs() < radius
            && self.start <= r[t]
            && r[t] <= self.end
            && !self.in_hole(r[t])
    }

    fn deflect(&self, p: &mut Particle, from: &[f64; DIM]) -> Option<u8> {
        let (n, t) = self.axes();
        let (before, after) = (from[n] - self.position, p.r[n] - self.position);
        let through_hole = before * after < 0.0 && !self.separates(from, &p.r);
        let side = if before == 0.0 || through_hole {
            after
        } else {
            before
        };
        if side == 0.0 {
            return None;
        }
        let side = side.signum();
        let blocked = side * after < p.radius
            && self.start <= p.r[t]
            && p.r[t] <= self.end
            && !self.in_hole(p.r[t]);
        if !blocked {
            return None;
        }
        p.r[n] = self.position + side * p.radius;
        // A particle shoved onto the wall while already moving away keeps its course.
        if side * p.v[n] < 0.0 {
            p.v[n] = -p.v[n];
            Some(n as u8)
        } else {
            None
        }
    }

    fn separates(&self, a: &[f64; DIM], b: &[f64; DIM]) -> bool {
        let (n, t) = self.axes();
        let (da, db) = (a[n] - self.position, b[n] - self.position);
        if da * db >= 0.0 {
            return false;
        }
        let s = da / (da - db);
        let cross = a[t] + s * (b[t] - a[t]);
        self.start <= cross && cross <= self.end && !self.in_hole(cross)
    }
}

/// Axis-aligned box `[0, width] x [0, height]` plus internal obstacles.
///
/// Immutable once built; the simulation shares it behind an `Arc`.
#[derive(Debug)]
pub struct Vessel {
    width: f64,
    height: f64,
    obstacles: Vec<Box<dyn Obstacle>>,
}

impl Vessel {
    /// Create an empty box.
    ///
    /// Errors:
    /// - `Error::InvalidParam` if either dimension is non-positive or non-finite.
    pub fn new(width: f64, height: f64) -> Result<Self> {
        if !width.is_finite() || width <= 0.0 || !height.is_finite() || height <= 0.0 {
            return Err(Error::InvalidParam(
                "vessel dimensions must be finite and > 0".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            obstacles: Vec::new(),
        })
    }

    pub fn with_obstacle(mut self, obstacle: Box<dyn Obstacle>) -> Self {
        self.obstacles.push(obstacle);
        self
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    #[inline]
    pub fn size(&self) -> [f64; DIM] {
        [self.width, self.height]
    }

    pub fn obstacles(&self) -> &[Box<dyn Obstacle>] {
        &self.obstacles
    }

    /// True if a disc of `radius` centred at `r` lies inside the box, allowing `tol` slack.
    pub fn contains(&self, r: &[f64; DIM], radius: f64, tol: f64) -> bool {
        r.iter()
            .zip(self.size())
            .all(|(&x, l)| x >= radius - tol && x <= l - radius + tol)
    }

    /// True if a disc at `r` would leave the box or overlap any obstacle.
    pub fn blocks_particle(&self, r: &[f64; DIM], radius: f64) -> bool {
        !self.contains(r, radius, 0.0)
            || self
                .obstacles
                .iter()
                .any(|o| o.blocks_particle(r, radius))
    }

    /// True if any obstacle lies between the two centres.
    pub fn separates(&self, a: &[f64; DIM], b: &[f64; DIM]) -> bool {
        self.obstacles.iter().any(|o| o.separates(a, b))
    }

    /// Reflect `p` off the box boundary, x axis before y, and clamp it inside.
    ///
    /// The velocity component is flipped only if it still points outward.
    /// Returns, per axis, whether the velocity was reflected.
    pub fn confine(&self, p: &mut Particle) -> [bool; DIM] {
        let mut bounced = [false; DIM];
        for (k, l) in self.size().into_iter().enumerate() {
            let lo = p.radius;
            let hi = l - p.radius;
            if p.r[k] < lo {
                p.r[k] = lo;
                if p.v[k] < 0.0 {
                    p.v[k] = -p.v[k];
                    bounced[k] = true;
                }
            } else if p.r[k] > hi {
                p.r[k] = hi;
                if p.v[k] > 0.0 {
                    p.v[k] = -p.v[k];
                    bounced[k] = true;
                }
            }
        }
        bounced
    }
}
