mod common;

use approx::assert_abs_diff_eq;
use collider::core::{initialize_with, Element, Wall, BOUNDS_TOLERANCE};
use collider::{initialize, Config, Result};
use common::particle;

/// An oblique elastic collision away from the walls conserves total momentum and
/// kinetic energy.
#[test]
fn elastic_collision_conserves_momentum_and_energy() -> Result<()> {
    let config = Config {
        reaction_probability: 0.0,
        ..Config::default()
    };
    let mut heavy = particle(1, Element::B, [52.0, 50.5], [-1.0, 0.0]);
    heavy.mass = 2.5;
    let mut sim = initialize_with(
        &config,
        vec![particle(0, Element::A, [48.0, 50.0], [1.0, 0.2]), heavy],
    )?;
    let p0 = sim.state().total_momentum();
    let e0 = sim.state().total_kinetic_energy();

    sim.step()?;
    assert_eq!(sim.state().collision_count(), 1);
    let p1 = sim.state().total_momentum();
    let e1 = sim.state().total_kinetic_energy();
    assert_abs_diff_eq!(p0[0], p1[0], epsilon = 1e-12);
    assert_abs_diff_eq!(p0[1], p1[1], epsilon = 1e-12);
    assert_abs_diff_eq!(e0, e1, epsilon = 1e-12);
    Ok(())
}

/// Without reactions or a thermostat, collisions and wall bounces leave the
/// temperature proxy unchanged over a long run.
#[test]
fn temperature_constant_without_reactions() -> Result<()> {
    let config = Config {
        n_particles_a: 40,
        n_particles_b: 40,
        vessel_width: 60.0,
        vessel_height: 60.0,
        reaction_probability: 0.0,
        random_seed: 5,
        ..Config::default()
    };
    let mut sim = initialize(&config)?;
    let t0 = sim.state().temperature();
    sim.advance(500)?;
    let t1 = sim.state().temperature();
    assert!(sim.state().collision_count() > 0);
    assert!(
        ((t1 - t0) / t0).abs() < 1e-9,
        "temperature drifted: T0={t0}, T1={t1}"
    );
    Ok(())
}

/// Every particle stays inside the vessel at every step, including with reactions,
/// gravity and an internal wall in play.
#[test]
fn particles_stay_in_bounds() -> Result<()> {
    let config = Config {
        n_particles_a: 40,
        n_particles_b: 40,
        vessel_width: 80.0,
        vessel_height: 50.0,
        reaction_probability: 0.3,
        product_radius: Some(2.0),
        gravity: 0.005,
        walls: vec![Wall::vertical(40.0, 50.0).with_hole(20.0, 30.0)],
        random_seed: 2024,
        ..Config::default()
    };
    let sim = initialize(&config)?;
    for snapshot in sim.run(500) {
        let state = snapshot?;
        for p in state.particles() {
            for (k, &l) in [config.vessel_width, config.vessel_height].iter().enumerate() {
                assert!(
                    p.r[k] >= p.radius - BOUNDS_TOLERANCE && p.r[k] <= l - p.radius + BOUNDS_TOLERANCE,
                    "particle {} out of bounds at step {}: {:?}",
                    p.id,
                    state.step(),
                    p.r
                );
            }
        }
    }
    Ok(())
}

/// Particles travelling in separate horizontal lanes never meet, so the collision
/// count stays zero for the whole run.
#[test]
fn no_contact_means_no_collisions() -> Result<()> {
    let config = Config {
        reaction_probability: 1.0,
        ..Config::default()
    };
    let mut sim = initialize_with(
        &config,
        vec![
            particle(0, Element::A, [10.0, 20.0], [1.0, 0.0]),
            particle(1, Element::B, [30.0, 40.0], [-1.3, 0.0]),
            particle(2, Element::A, [50.0, 60.0], [0.7, 0.0]),
            particle(3, Element::B, [70.0, 80.0], [-0.4, 0.0]),
        ],
    )?;
    for _ in 0..1000 {
        sim.step()?;
        assert_eq!(sim.state().collision_count(), 0);
    }
    assert!(sim.state().counters().wall_bounce_count > 0);
    Ok(())
}

/// A product that takes a hard enough hit splits back into one A and one B,
/// keeping the system's momentum.
#[test]
fn energetic_collision_dissociates_product() -> Result<()> {
    let config = Config {
        vessel_width: 20.0,
        vessel_height: 20.0,
        dissociation: Some(collider::config::DissociationConfig {
            energy_threshold: 0.5,
            probability: 1.0,
        }),
        ..Config::default()
    };
    let mut product = particle(0, Element::Product, [10.0, 10.0], [0.0, 0.0]);
    product.mass = 2.0;
    let mut sim = initialize_with(
        &config,
        vec![product, particle(1, Element::A, [14.0, 10.0], [-2.0, 0.0])],
    )?;
    assert_eq!(sim.state().product_count(), 1);
    let p0 = sim.state().total_momentum();

    sim.step()?;
    let state = sim.state();
    assert_eq!(state.product_count(), 0);
    assert_eq!(state.counters().dissociation_count, 1);
    assert_eq!(state.count(Element::A), 2);
    assert_eq!(state.count(Element::B), 1);
    assert_eq!(state.count(Element::Product), 0);
    let p1 = state.total_momentum();
    assert_abs_diff_eq!(p0[0], p1[0], epsilon = 1e-12);
    assert_abs_diff_eq!(p0[1], p1[1], epsilon = 1e-12);
    Ok(())
}
