#![allow(dead_code)]

use collider::core::{Element, Particle};
use collider::Config;

/// A 20 x 10 vessel with radius-1.5 particles and no randomness in placement.
pub fn small_vessel() -> Config {
    Config {
        vessel_width: 20.0,
        vessel_height: 10.0,
        particle_radius: 1.5,
        ..Config::default()
    }
}

pub fn particle(id: u32, element: Element, r: [f64; 2], v: [f64; 2]) -> Particle {
    Particle {
        id,
        element,
        r,
        v,
        radius: 1.5,
        mass: 1.0,
    }
}
