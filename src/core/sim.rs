use crate::config::{Config, DissociationConfig, ThermostatConfig};
use crate::core::event::{Contact, Event, EventKind};
use crate::core::particle::{Element, Particle, DIM};
use crate::core::state::{allocate_id, SimulationState};
use crate::core::vessel::Vessel;
use crate::error::{Error, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::f64::consts::TAU;
use std::iter::FusedIterator;
use std::sync::Arc;

/// Fixed time step.
pub const DT: f64 = 1.0;

/// Below this centre distance two particles are treated as coincident.
const EPS_DIST: f64 = 1e-12;

/// Rejection-sampling budget per particle during placement.
const MAX_PLACEMENT_ATTEMPTS: usize = 100_000;

/// The update rules, fixed at initialization.
///
/// `step` is a function of the state and an explicitly passed random source; the
/// engine itself holds no mutable state.
#[derive(Debug, Clone)]
pub struct Engine {
    reaction_probability: f64,
    activation_energy: f64,
    product_radius: f64,
    fragment_radius: f64,
    mass_a: f64,
    mass_b: f64,
    gravity: f64,
    thermostat: Option<ThermostatConfig>,
    dissociation: Option<DissociationConfig>,
}

impl Engine {
    /// Extract the rules from an already validated config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            reaction_probability: config.reaction_probability,
            activation_energy: config.activation_energy,
            product_radius: config.product_radius(),
            fragment_radius: config.particle_radius,
            mass_a: config.particle_mass_a,
            mass_b: config.particle_mass_b,
            gravity: config.gravity,
            thermostat: config.thermostat,
            dissociation: config.dissociation,
        }
    }

    /// Advance `state` by one time unit.
    ///
    /// Order within a step: motion, wall reflection, pair scan, contact resolution
    /// (reactions, dissociation, elastic bounces), thermostat, containment.
    ///
    /// Errors:
    /// - `Error::PhysicsInvariant` if a particle ends the step outside the vessel or non-finite.
    /// - `Error::IdsExhausted` if a product or fragment cannot be given a fresh id.
    pub fn step<R: Rng + ?Sized>(&self, state: &mut SimulationState, rng: &mut R) -> Result<()> {
        let step = state.step + 1;
        let mut events = Vec::new();

        let origins: Vec<[f64; DIM]> = state.particles.iter().map(|p| p.r).collect();
        self.drift(state);
        bounce_walls(state, &origins, step, &mut events);

        let contacts = find_contacts(&state.vessel, &state.particles)?;
        let origins = self.resolve_contacts(state, contacts, step, rng, &mut events)?;

        if let Some(thermostat) = &self.thermostat {
            for p in &mut state.particles {
                relax_speed(p, thermostat);
            }
        }

        // Separation and fragment placement may have pushed particles past a wall.
        bounce_walls(state, &origins, step, &mut events);

        state.step = step;
        state.events = events;
        log::trace!(
            "step {}: n={} collisions={} reactions={} products={}",
            step,
            state.particles.len(),
            state.counters.collision_count,
            state.counters.reaction_count,
            state.counters.product_count
        );
        state.check_invariants()
    }

    fn drift(&self, state: &mut SimulationState) {
        for p in &mut state.particles {
            p.v[1] += self.gravity * DT;
            for k in 0..DIM {
                p.r[k] += p.v[k] * DT;
            }
        }
    }

    /// Resolve `contacts` in order, then drop consumed particles and append new ones.
    ///
    /// Returns, for every particle left afterwards, where its centre was before
    /// resolution moved anything (the parent's position for new particles).
    fn resolve_contacts<R: Rng + ?Sized>(
        &self,
        state: &mut SimulationState,
        contacts: Vec<Contact>,
        step: u64,
        rng: &mut R,
        events: &mut Vec<Event>,
    ) -> Result<Vec<[f64; DIM]>> {
        let settled: Vec<[f64; DIM]> = state.particles.iter().map(|p| p.r).collect();
        let mut consumed = vec![false; state.particles.len()];
        let mut spawned: Vec<(Particle, [f64; DIM])> = Vec::new();

        for Contact { i, j, .. } in contacts {
            if consumed[i] || consumed[j] {
                continue;
            }
            let (pi, pj) = pair_mut(&mut state.particles, i, j);
            let r_sum = pi.radius + pj.radius;
            let (n, dist) = contact_normal(pi, pj);
            // Earlier separations in this step may already have pulled the pair apart.
            if dist >= r_sum {
                continue;
            }

            let u = sub(&pj.v, &pi.v);
            if dot(&u, &n) < 0.0 {
                state.counters.collision_count += 1;
                events.push(Event::new(step, EventKind::Collision { i: pi.id, j: pj.id }));

                if self.reacts(pi, pj, rng) {
                    let product = self.combine(pi, pj, allocate_id(&mut state.next_id)?);
                    log::debug!(
                        "step {step}: {} {} + {} {} -> product {}",
                        pi.element,
                        pi.id,
                        pj.element,
                        pj.id,
                        product.id
                    );
                    events.push(Event::new(
                        step,
                        EventKind::Reaction {
                            a: pi.id,
                            b: pj.id,
                            product: product.id,
                        },
                    ));
                    state.counters.reaction_count += 1;
                    state.counters.product_count += 1;
                    consumed[i] = true;
                    consumed[j] = true;
                    let origin = [
                        0.5 * (settled[i][0] + settled[j][0]),
                        0.5 * (settled[i][1] + settled[j][1]),
                    ];
                    spawned.push((product, origin));
                    continue;
                }

                let reduced_mass = pi.mass * pj.mass / (pi.mass + pj.mass);
                let collision_energy = 0.5 * reduced_mass * dot(&u, &u);
                resolve_elastic(pi, pj, &n);

                for (idx, p) in [(i, &*pi), (j, &*pj)] {
                    if !self.dissociates(p, collision_energy, rng) {
                        continue;
                    }
                    let ids = [
                        allocate_id(&mut state.next_id)?,
                        allocate_id(&mut state.next_id)?,
                    ];
                    let (a, b) = self.split(p, &n, ids);
                    log::debug!(
                        "step {step}: product {} -> A {} + B {}",
                        p.id,
                        a.id,
                        b.id
                    );
                    events.push(Event::new(
                        step,
                        EventKind::Dissociation {
                            product: p.id,
                            a: a.id,
                            b: b.id,
                        },
                    ));
                    state.counters.dissociation_count += 1;
                    state.counters.product_count -= 1;
                    consumed[idx] = true;
                    spawned.push((a, settled[idx]));
                    spawned.push((b, settled[idx]));
                }
            }

            separate(pi, pj, &n, r_sum - dist);
        }

        let mut idx = 0;
        state.particles.retain(|_| {
            let keep = !consumed[idx];
            idx += 1;
            keep
        });
        let mut origins: Vec<[f64; DIM]> = settled
            .into_iter()
            .zip(consumed)
            .filter_map(|(r, gone)| (!gone).then_some(r))
            .collect();
        for (p, origin) in spawned {
            state.particles.push(p);
            origins.push(origin);
        }
        Ok(origins)
    }

    /// A/B pair with enough energy, then a draw against the reaction probability.
    ///
    /// The random source is only consulted for eligible pairs.
    fn reacts<R: Rng + ?Sized>(&self, a: &Particle, b: &Particle, rng: &mut R) -> bool {
        a.element.reacts_with(b.element)
            && a.kinetic_energy() + b.kinetic_energy() >= self.activation_energy
            && rng.random::<f64>() < self.reaction_probability
    }

    fn dissociates<R: Rng + ?Sized>(&self, p: &Particle, energy: f64, rng: &mut R) -> bool {
        match &self.dissociation {
            Some(d) if p.element == Element::Product => {
                energy >= d.energy_threshold && rng.random::<f64>() < d.probability
            }
            _ => false,
        }
    }

    /// Merge a reacting pair into one product at their midpoint with their total momentum.
    fn combine(&self, a: &Particle, b: &Particle, id: u32) -> Particle {
        let mass = a.mass + b.mass;
        let mut r = [0.0; DIM];
        let mut v = [0.0; DIM];
        for k in 0..DIM {
            r[k] = 0.5 * (a.r[k] + b.r[k]);
            v[k] = (a.mass * a.v[k] + b.mass * b.v[k]) / mass;
        }
        Particle {
            id,
            element: Element::Product,
            r,
            v,
            radius: self.product_radius,
            mass,
        }
    }

    /// Split a product into an A and a B placed either side of it along the
    /// collision tangent.
    ///
    /// The fragments share the product's momentum (exactly, when the product's
    /// mass equals `mass_a + mass_b`) and fly apart with the threshold energy as
    /// relative kinetic energy.
    fn split(&self, p: &Particle, n: &[f64; DIM], ids: [u32; 2]) -> (Particle, Particle) {
        let t = [-n[1], n[0]];
        let total = self.mass_a + self.mass_b;
        let reduced_mass = self.mass_a * self.mass_b / total;
        let threshold = self.dissociation.map_or(0.0, |d| d.energy_threshold);
        let rel_speed = (2.0 * threshold / reduced_mass).sqrt();

        let mut a = Particle {
            id: ids[0],
            element: Element::A,
            r: p.r,
            v: p.v,
            radius: self.fragment_radius,
            mass: self.mass_a,
        };
        let mut b = Particle {
            id: ids[1],
            element: Element::B,
            mass: self.mass_b,
            ..a.clone()
        };
        for k in 0..DIM {
            a.r[k] += t[k] * self.fragment_radius;
            b.r[k] -= t[k] * self.fragment_radius;
            a.v[k] += t[k] * rel_speed * self.mass_b / total;
            b.v[k] -= t[k] * rel_speed * self.mass_a / total;
        }
        (a, b)
    }
}

/// Reflect every particle off the vessel boundary and internal obstacles.
///
/// `origins[i]` is where particle `i` was before its latest move; obstacles keep
/// it on that side.
fn bounce_walls(
    state: &mut SimulationState,
    origins: &[[f64; DIM]],
    step: u64,
    events: &mut Vec<Event>,
) {
    let vessel = &state.vessel;
    let counters = &mut state.counters;
    for (p, from) in state.particles.iter_mut().zip(origins) {
        let id = p.id;
        let mut record = |axis: u8| {
            counters.wall_bounce_count += 1;
            events.push(Event::new(step, EventKind::WallBounce { id, axis }));
        };
        let bounced = vessel.confine(p);
        for k in (0..DIM).filter(|&k| bounced[k]) {
            record(k as u8);
        }
        for obstacle in vessel.obstacles() {
            if let Some(axis) = obstacle.deflect(p, from) {
                record(axis);
            }
        }
    }
}

/// Naive O(n^2) scan for overlapping pairs, deepest first.
///
/// Pairs with an obstacle between their centres never touch.
fn find_contacts(vessel: &Vessel, particles: &[Particle]) -> Result<Vec<Contact>> {
    let mut contacts = Vec::new();
    for i in 0..particles.len() {
        for j in (i + 1)..particles.len() {
            let (pi, pj) = (&particles[i], &particles[j]);
            let d = sub(&pj.r, &pi.r);
            let r_sum = pi.radius + pj.radius;
            let dist_sq = dot(&d, &d);
            if dist_sq < r_sum * r_sum && !vessel.separates(&pi.r, &pj.r) {
                contacts.push(Contact::new(r_sum - dist_sq.sqrt(), i, j)?);
            }
        }
    }
    contacts.sort();
    Ok(contacts)
}

/// Unit normal from `a` to `b` and the centre distance.
fn contact_normal(a: &Particle, b: &Particle) -> ([f64; DIM], f64) {
    let d = sub(&b.r, &a.r);
    let dist = dot(&d, &d).sqrt();
    if dist <= EPS_DIST {
        log::warn!(
            "particles {} and {} have coincident centres; using the x axis as contact normal",
            a.id,
            b.id
        );
        return ([1.0, 0.0], dist);
    }
    ([d[0] / dist, d[1] / dist], dist)
}

/// Elastic collision along the line of centres `n` (pointing from `a` to `b`).
///
/// Only the normal velocity components change; momentum and kinetic energy are conserved.
fn resolve_elastic(a: &mut Particle, b: &mut Particle, n: &[f64; DIM]) {
    let (ma, mb) = (a.mass, b.mass);
    let u_n = dot(&sub(&b.v, &a.v), n);
    let fa = (2.0 * mb / (ma + mb)) * u_n;
    let fb = (2.0 * ma / (ma + mb)) * u_n;
    for (k, &nk) in n.iter().enumerate() {
        a.v[k] += fa * nk;
        b.v[k] -= fb * nk;
    }
}

/// Push an overlapping pair apart along `n`, half the overlap each.
fn separate(a: &mut Particle, b: &mut Particle, n: &[f64; DIM], overlap: f64) {
    if overlap <= 0.0 {
        return;
    }
    let half = 0.5 * overlap;
    for (k, &nk) in n.iter().enumerate() {
        a.r[k] -= half * nk;
        b.r[k] += half * nk;
    }
}

/// Blend the particle's speed toward the bath's equilibrium speed, keeping its direction.
fn relax_speed(p: &mut Particle, thermostat: &ThermostatConfig) {
    let v_eq = (2.0 * thermostat.temperature / p.mass).sqrt();
    let alpha = thermostat.coupling;
    let direction = p.v[1].atan2(p.v[0]);
    p.v[0] = alpha * v_eq * direction.cos() + (1.0 - alpha) * p.v[0];
    p.v[1] = alpha * v_eq * direction.sin() + (1.0 - alpha) * p.v[1];
}

// ============ Simulation driver ============

/// A simulation run: state, rules, and the seeded random source that drives them.
#[derive(Debug, Clone)]
pub struct Simulation {
    engine: Engine,
    state: SimulationState,
    rng: ChaCha8Rng,
}

/// Validate `config` and populate the vessel with `n_particles_a` A and
/// `n_particles_b` B particles at random non-overlapping positions.
///
/// A particles get ids `0..n_A`, B particles follow. Each velocity has a uniform
/// random direction and a speed uniform in `initial_speed_range`.
///
/// Errors:
/// - `Error::Config` for invalid parameters or if the vessel is too crowded to place everyone.
pub fn initialize(config: &Config) -> Result<Simulation> {
    config.validate()?;
    let vessel = config.vessel()?;
    let mut rng = ChaCha8Rng::seed_from_u64(config.random_seed);

    let counts = [
        (Element::A, config.n_particles_a, config.particle_mass_a),
        (Element::B, config.n_particles_b, config.particle_mass_b),
    ];
    let radius = config.particle_radius;
    let (speed_lo, speed_hi) = config.initial_speed_range;
    let mut particles: Vec<Particle> =
        Vec::with_capacity((config.n_particles_a + config.n_particles_b) as usize);
    let mut id = 0u32;
    for (element, count, mass) in counts {
        for _ in 0..count {
            let r = place(&vessel, &particles, radius, &mut rng).ok_or_else(|| {
                Error::Config(format!(
                    "failed to place particle {id} without overlap; try fewer particles or a larger vessel"
                ))
            })?;
            let speed = rng.random_range(speed_lo..=speed_hi);
            let angle = rng.random_range(0.0..TAU);
            let v = [speed * angle.cos(), speed * angle.sin()];
            particles.push(Particle::new(id, element, r, v, radius, mass)?);
            id += 1;
        }
    }

    log::info!(
        "initialized {} A + {} B particles in a {}x{} vessel ({} walls), seed {}",
        config.n_particles_a,
        config.n_particles_b,
        config.vessel_width,
        config.vessel_height,
        config.walls.len(),
        config.random_seed
    );

    Ok(Simulation {
        engine: Engine::from_config(config),
        state: SimulationState::new(Arc::new(vessel), particles),
        rng,
    })
}

/// Like [`initialize`], but with caller-placed particles instead of random ones.
///
/// The particle-count fields of `config` are ignored. Particles keep their order.
/// A centre inside the box but closer to a side than its radius is moved in
/// until the disc fits, the same clamp a wall bounce applies.
///
/// Errors:
/// - `Error::Config` for invalid parameters, invalid particles, centres outside
///   the box, discs overlapping an internal wall, duplicate ids, or the id
///   `u32::MAX` (reserved so new products can still be numbered).
pub fn initialize_with(config: &Config, mut particles: Vec<Particle>) -> Result<Simulation> {
    config.validate()?;
    let vessel = config.vessel()?;
    let size = vessel.size();

    let mut seen = HashSet::with_capacity(particles.len());
    for p in &mut particles {
        Particle::new(p.id, p.element, p.r, p.v, p.radius, p.mass)
            .map_err(|e| Error::Config(format!("particle {}: {e}", p.id)))?;
        if p.id == u32::MAX {
            return Err(Error::Config(format!(
                "particle id {} is reserved",
                u32::MAX
            )));
        }
        if !seen.insert(p.id) {
            return Err(Error::Config(format!("duplicate particle id {}", p.id)));
        }
        if p.r.iter().zip(size).any(|(&x, l)| x < 0.0 || x > l) {
            return Err(Error::Config(format!(
                "particle {} at {:?} lies outside the vessel",
                p.id, p.r
            )));
        }
        let placed = p.r;
        for (x, l) in p.r.iter_mut().zip(size) {
            *x = x.max(p.radius).min(l - p.radius);
        }
        if placed != p.r {
            log::debug!(
                "particle {} moved from {:?} to {:?} to fit the vessel",
                p.id,
                placed,
                p.r
            );
        }
        if vessel.blocks_particle(&p.r, p.radius) {
            return Err(Error::Config(format!(
                "particle {} at {:?} does not fit: it overlaps a wall or is wider than the vessel",
                p.id, p.r
            )));
        }
    }

    log::info!(
        "initialized {} placed particles in a {}x{} vessel, seed {}",
        particles.len(),
        config.vessel_width,
        config.vessel_height,
        config.random_seed
    );

    Ok(Simulation {
        engine: Engine::from_config(config),
        state: SimulationState::new(Arc::new(vessel), particles),
        rng: ChaCha8Rng::seed_from_u64(config.random_seed),
    })
}

impl Simulation {
    /// Advance by one time unit.
    pub fn step(&mut self) -> Result<()> {
        self.engine.step(&mut self.state, &mut self.rng)
    }

    /// Advance by `n_steps` time units, stopping at the first error.
    pub fn advance(&mut self, n_steps: usize) -> Result<()> {
        for _ in 0..n_steps {
            self.step()?;
        }
        Ok(())
    }

    /// Lazily yield a snapshot after each of the next `n_steps` steps.
    ///
    /// Consumes the simulation; start over with [`initialize`] to replay.
    pub fn run(self, n_steps: usize) -> Run {
        Run {
            sim: Some(self),
            remaining: n_steps,
        }
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn into_state(self) -> SimulationState {
        self.state
    }
}

/// Snapshot iterator returned by [`Simulation::run`].
///
/// Yields `Ok(state)` after each step; a failed step is yielded once as `Err`
/// and ends the sequence.
#[derive(Debug)]
pub struct Run {
    sim: Option<Simulation>,
    remaining: usize,
}

impl Iterator for Run {
    type Item = Result<SimulationState>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let sim = self.sim.as_mut()?;
        self.remaining -= 1;
        match sim.step() {
            Ok(()) => Some(Ok(sim.state.clone())),
            Err(e) => {
                self.sim = None;
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

impl FusedIterator for Run {}

// ============ Utility helpers ============

#[inline]
fn dot(a: &[f64; DIM], b: &[f64; DIM]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[inline]
fn sub(a: &[f64; DIM], b: &[f64; DIM]) -> [f64; DIM] {
    [a[0] - b[0], a[1] - b[1]]
}

/// Mutable references to two distinct particles, `i < j`.
#[inline]
fn pair_mut(particles: &mut [Particle], i: usize, j: usize) -> (&mut Particle, &mut Particle) {
    let (left, right) = particles.split_at_mut(j);
    (&mut left[i], &mut right[0])
}

/// Rejection-sample a free spot for a disc of `radius`.
fn place(
    vessel: &Vessel,
    existing: &[Particle],
    radius: f64,
    rng: &mut ChaCha8Rng,
) -> Option<[f64; DIM]> {
    let size = vessel.size();
    for _ in 0..MAX_PLACEMENT_ATTEMPTS {
        let mut r = [0.0_f64; DIM];
        for (k, r_k) in r.iter_mut().enumerate() {
            *r_k = rng.random_range(radius..=size[k] - radius);
        }
        if !vessel.blocks_particle(&r, radius) && !overlaps_existing(existing, &r, radius) {
            return Some(r);
        }
    }
    None
}

fn overlaps_existing(existing: &[Particle], r: &[f64; DIM], radius: f64) -> bool {
    existing.iter().any(|p| {
        let d = sub(r, &p.r);
        let min = radius + p.radius;
        dot(&d, &d) < min * min
    })
}
