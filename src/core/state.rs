use crate::core::event::Event;
use crate::core::particle::{Element, Particle, DIM};
use crate::core::vessel::Vessel;
use crate::error::{Error, Result};
use serde::Serialize;
use std::sync::Arc;

/// Slack allowed when checking that particles stayed inside the vessel.
pub const BOUNDS_TOLERANCE: f64 = 1e-9;

/// Running totals since initialization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    /// Resolved colliding pairs, one per pair per step (reacting collisions included).
    pub collision_count: u64,
    pub reaction_count: u64,
    /// Products currently present.
    pub product_count: u64,
    pub wall_bounce_count: u64,
    pub dissociation_count: u64,
}

/// The four tracked metrics plus the context a plotting layer needs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub step: u64,
    pub particle_count: usize,
    pub temperature: f64,
    pub collision_count: u64,
    pub reaction_count: u64,
    pub product_count: u64,
}

/// Everything that changes during a run.
///
/// Cloning a state is how snapshots are taken; the vessel is shared, not copied.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub(crate) step: u64,
    pub(crate) particles: Vec<Particle>,
    pub(crate) counters: Counters,
    pub(crate) events: Vec<Event>,
    pub(crate) next_id: u32,
    pub(crate) vessel: Arc<Vessel>,
}

/// Hand out `*next` as a fresh particle id and advance it.
///
/// `u32::MAX` is never handed out.
pub(crate) fn allocate_id(next: &mut u32) -> Result<u32> {
    let id = *next;
    *next = id.checked_add(1).ok_or(Error::IdsExhausted(id))?;
    Ok(id)
}

impl SimulationState {
    pub(crate) fn new(vessel: Arc<Vessel>, particles: Vec<Particle>) -> Self {
        let next_id = particles
            .iter()
            .map(|p| p.id.saturating_add(1))
            .max()
            .unwrap_or(0);
        let product_count = particles
            .iter()
            .filter(|p| p.element == Element::Product)
            .count() as u64;
        Self {
            step: 0,
            particles,
            counters: Counters {
                product_count,
                ..Counters::default()
            },
            events: Vec::new(),
            next_id,
            vessel,
        }
    }

    /// Number of completed steps.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn counters(&self) -> Counters {
        self.counters
    }

    pub fn collision_count(&self) -> u64 {
        self.counters.collision_count
    }

    pub fn reaction_count(&self) -> u64 {
        self.counters.reaction_count
    }

    pub fn product_count(&self) -> u64 {
        self.counters.product_count
    }

    pub fn vessel(&self) -> &Vessel {
        &self.vessel
    }

    /// Events of the most recent step only.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn num_particles(&self) -> usize {
        self.particles.len()
    }

    /// Number of particles of the given element.
    pub fn count(&self, element: Element) -> usize {
        self.particles
            .iter()
            .filter(|p| p.element == element)
            .count()
    }

    /// Temperature proxy: mean kinetic energy per particle (0 for an empty vessel).
    pub fn temperature(&self) -> f64 {
        if self.particles.is_empty() {
            return 0.0;
        }
        self.total_kinetic_energy() / self.particles.len() as f64
    }

    pub fn total_kinetic_energy(&self) -> f64 {
        self.particles.iter().map(|p| p.kinetic_energy()).sum()
    }

    pub fn total_momentum(&self) -> [f64; DIM] {
        self.particles.iter().fold([0.0; DIM], |mut acc, p| {
            let m = p.momentum();
            acc[0] += m[0];
            acc[1] += m[1];
            acc
        })
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            step: self.step,
            particle_count: self.particles.len(),
            temperature: self.temperature(),
            collision_count: self.counters.collision_count,
            reaction_count: self.counters.reaction_count,
            product_count: self.counters.product_count,
        }
    }

    /// Verify every particle is finite and inside the vessel.
    ///
    /// Errors:
    /// - `Error::PhysicsInvariant` naming the first offending particle.
    pub fn check_invariants(&self) -> Result<()> {
        for p in &self.particles {
            if !p.is_finite() {
                return Err(Error::PhysicsInvariant(format!(
                    "particle {} has non-finite state at step {}: r={:?} v={:?}",
                    p.id, self.step, p.r, p.v
                )));
            }
            if !self.vessel.contains(&p.r, p.radius, BOUNDS_TOLERANCE) {
                return Err(Error::PhysicsInvariant(format!(
                    "particle {} left the vessel at step {}: r={:?}",
                    p.id, self.step, p.r
                )));
            }
        }
        Ok(())
    }
}
