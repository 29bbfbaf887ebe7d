//! Simulation configuration.
//!
//! Every key has a default, so a TOML file only needs to name what it changes:
//!
//! ```toml
//! n_particles_a = 30
//! n_particles_b = 20
//! reaction_probability = 0.25
//! random_seed = 7
//!
//! [[walls]]
//! orientation = "vertical"
//! position = 50.0
//! start = 0.0
//! end = 100.0
//! hole = [40.0, 60.0]
//! ```

use crate::core::vessel::{Vessel, Wall};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Speed relaxation toward a bath temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThermostatConfig {
    /// Target temperature (k_B = 1), > 0.
    pub temperature: f64,
    /// Fraction of the gap to the equilibrium speed closed each step, in (0, 1].
    pub coupling: f64,
}

/// Product splitting back into A + B on energetic collisions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DissociationConfig {
    /// Minimum centre-of-mass collision energy, > 0.
    pub energy_threshold: f64,
    /// Chance a qualifying collision splits the product, in [0, 1].
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Signed so that negative counts from a config file are reported, not truncated.
    pub n_particles_a: i64,
    pub n_particles_b: i64,
    pub vessel_width: f64,
    pub vessel_height: f64,
    pub particle_radius: f64,
    pub particle_mass_a: f64,
    pub particle_mass_b: f64,
    /// Initial speeds are drawn uniformly from `[min, max]`.
    pub initial_speed_range: (f64, f64),
    pub reaction_probability: f64,
    pub random_seed: u64,
    /// Radius of reaction products; `particle_radius` when unset.
    pub product_radius: Option<f64>,
    /// Combined kinetic energy an A/B pair needs before it may react.
    pub activation_energy: f64,
    /// Constant acceleration along +y.
    pub gravity: f64,
    pub thermostat: Option<ThermostatConfig>,
    pub dissociation: Option<DissociationConfig>,
    pub walls: Vec<Wall>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            n_particles_a: 20,
            n_particles_b: 20,
            vessel_width: 100.0,
            vessel_height: 100.0,
            particle_radius: 1.5,
            particle_mass_a: 1.0,
            particle_mass_b: 1.0,
            initial_speed_range: (0.5, 1.5),
            reaction_probability: 0.5,
            random_seed: 0,
            product_radius: None,
            activation_energy: 0.0,
            gravity: 0.0,
            thermostat: None,
            dissociation: None,
            walls: Vec::new(),
        }
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::Config(format!(
            "{name} must be finite and > 0, got {value}"
        )));
    }
    Ok(())
}

fn probability(name: &str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::Config(format!(
            "{name} must lie in [0, 1], got {value}"
        )));
    }
    Ok(())
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every parameter, failing on the first invalid one.
    pub fn validate(&self) -> Result<()> {
        if self.n_particles_a < 0 || self.n_particles_b < 0 {
            return Err(Error::Config(format!(
                "particle counts must be >= 0, got A={} B={}",
                self.n_particles_a, self.n_particles_b
            )));
        }
        let total = self
            .n_particles_a
            .checked_add(self.n_particles_b)
            .and_then(|n| u32::try_from(n).ok());
        if total.is_none() {
            return Err(Error::Config("too many particles".into()));
        }
        positive("vessel_width", self.vessel_width)?;
        positive("vessel_height", self.vessel_height)?;
        positive("particle_radius", self.particle_radius)?;
        positive("particle_mass_a", self.particle_mass_a)?;
        positive("particle_mass_b", self.particle_mass_b)?;
        if let Some(r) = self.product_radius {
            positive("product_radius", r)?;
        }

        let diameter = 2.0 * self.particle_radius.max(self.product_radius());
        if diameter > self.vessel_width || diameter > self.vessel_height {
            return Err(Error::Config(format!(
                "a {}x{} vessel cannot hold a particle of diameter {diameter}",
                self.vessel_width, self.vessel_height
            )));
        }

        let (lo, hi) = self.initial_speed_range;
        if !lo.is_finite() || !hi.is_finite() || lo < 0.0 || lo > hi {
            return Err(Error::Config(format!(
                "initial_speed_range must satisfy 0 <= min <= max, got ({lo}, {hi})"
            )));
        }

        probability("reaction_probability", self.reaction_probability)?;
        if !self.activation_energy.is_finite() || self.activation_energy < 0.0 {
            return Err(Error::Config(format!(
                "activation_energy must be finite and >= 0, got {}",
                self.activation_energy
            )));
        }
        if !self.gravity.is_finite() {
            return Err(Error::Config("gravity must be finite".into()));
        }

        if let Some(t) = &self.thermostat {
            positive("thermostat.temperature", t.temperature)?;
            if !(t.coupling > 0.0 && t.coupling <= 1.0) {
                return Err(Error::Config(format!(
                    "thermostat.coupling must lie in (0, 1], got {}",
                    t.coupling
                )));
            }
        }
        if let Some(d) = &self.dissociation {
            positive("dissociation.energy_threshold", d.energy_threshold)?;
            probability("dissociation.probability", d.probability)?;
        }
        for wall in &self.walls {
            wall.validate(self.vessel_width, self.vessel_height)?;
        }
        Ok(())
    }

    pub fn product_radius(&self) -> f64 {
        self.product_radius.unwrap_or(self.particle_radius)
    }

    /// Build the vessel described by this config.
    pub fn vessel(&self) -> Result<Vessel> {
        let vessel = Vessel::new(self.vessel_width, self.vessel_height)
            .map_err(|e| Error::Config(e.to_string()))?;
        Ok(self
            .walls
            .iter()
            .cloned()
            .fold(vessel, |v, wall| v.with_obstacle(Box::new(wall))))
    }
}
