mod common;

use collider::core::{initialize_with, Element, EventKind};
use collider::{initialize, Config, Result};
use common::{particle, small_vessel};

/// Two equal-mass A particles on a line, closing at speed 1 each, meet at the
/// midpoint and swap velocities; the collision is counted exactly once.
#[test]
fn head_on_equal_masses_swap_velocities() -> Result<()> {
    let mut sim = initialize_with(
        &small_vessel(),
        vec![
            particle(0, Element::A, [2.0, 5.0], [1.0, 0.0]),
            particle(1, Element::A, [8.0, 5.0], [-1.0, 0.0]),
        ],
    )?;

    sim.step()?;
    assert_eq!(sim.state().collision_count(), 0, "gap 4 > radius sum 3 after one step");

    sim.step()?;
    let state = sim.state();
    assert_eq!(state.collision_count(), 1);
    let ps = state.particles();
    let midpoint = 0.5 * (ps[0].r[0] + ps[1].r[0]);
    assert!((midpoint - 5.0).abs() < 1e-12, "collided around x = {midpoint}");
    assert_eq!(ps[0].v, [-1.0, 0.0]);
    assert_eq!(ps[1].v, [1.0, 0.0]);
    assert_eq!(
        state.events(),
        &[collider::core::Event::new(2, EventKind::Collision { i: 0, j: 1 })]
    );

    // Separating afterwards: no double counting.
    sim.step()?;
    assert_eq!(sim.state().collision_count(), 1);
    Ok(())
}

/// Particles started on the vessel corner and edge are pulled inside, then close
/// in along x, meet near the middle and reverse.
#[test]
fn head_on_from_the_vessel_edge() -> Result<()> {
    let mut sim = initialize_with(
        &small_vessel(),
        vec![
            particle(0, Element::A, [0.0, 0.0], [1.0, 0.0]),
            particle(1, Element::A, [10.0, 0.0], [-1.0, 0.0]),
        ],
    )?;
    assert_eq!(sim.state().particles()[0].r, [1.5, 1.5]);
    assert_eq!(sim.state().particles()[1].r, [10.0, 1.5]);

    sim.advance(2)?;
    assert_eq!(sim.state().collision_count(), 0);

    sim.step()?;
    let state = sim.state();
    assert_eq!(state.collision_count(), 1);
    let ps = state.particles();
    let midpoint = 0.5 * (ps[0].r[0] + ps[1].r[0]);
    assert!((midpoint - 5.0).abs() < 1.0, "collided around x = {midpoint}");
    assert_eq!(ps[0].v, [-1.0, 0.0]);
    assert_eq!(ps[1].v, [1.0, 0.0]);

    sim.advance(2)?;
    assert_eq!(sim.state().collision_count(), 1);
    Ok(())
}

/// With reaction_probability = 1 a colliding A/B pair always becomes one product.
#[test]
fn certain_reaction_creates_one_product() -> Result<()> {
    let config = Config {
        reaction_probability: 1.0,
        ..small_vessel()
    };
    let mut sim = initialize_with(
        &config,
        vec![
            particle(0, Element::A, [5.0, 5.0], [1.0, 0.0]),
            particle(1, Element::B, [9.0, 5.0], [-1.0, 0.0]),
        ],
    )?;
    sim.step()?;

    let state = sim.state();
    assert_eq!(state.product_count(), 1);
    assert_eq!(state.reaction_count(), 1);
    assert_eq!(state.collision_count(), 1);
    assert_eq!(state.num_particles(), 1, "two reactants become one product");

    let product = &state.particles()[0];
    assert_eq!(product.element, Element::Product);
    assert_eq!(product.id, 2, "products get a fresh id");
    assert_eq!(product.mass, 2.0);
    assert_eq!(product.r, [7.0, 5.0]);
    assert_eq!(product.v, [0.0, 0.0]);
    assert!(state
        .events()
        .iter()
        .any(|e| e.kind == EventKind::Reaction { a: 0, b: 1, product: 2 }));
    Ok(())
}

/// The product carries the combined momentum of unequal reactants.
#[test]
fn product_velocity_conserves_momentum() -> Result<()> {
    let config = Config {
        reaction_probability: 1.0,
        particle_mass_b: 3.0,
        ..small_vessel()
    };
    let mut b = particle(1, Element::B, [9.0, 5.0], [-0.5, 0.25]);
    b.mass = 3.0;
    let mut sim = initialize_with(
        &config,
        vec![particle(0, Element::A, [5.0, 5.0], [1.5, 0.0]), b],
    )?;
    let before = sim.state().total_momentum();
    sim.step()?;
    let after = sim.state().total_momentum();
    assert_eq!(sim.state().product_count(), 1);
    assert!((before[0] - after[0]).abs() < 1e-12);
    assert!((before[1] - after[1]).abs() < 1e-12);
    Ok(())
}

/// With reaction_probability = 0 nothing ever reacts, however often A meets B.
#[test]
fn zero_probability_never_reacts() -> Result<()> {
    let config = Config {
        n_particles_a: 30,
        n_particles_b: 30,
        vessel_width: 60.0,
        vessel_height: 60.0,
        reaction_probability: 0.0,
        random_seed: 11,
        ..Config::default()
    };
    let mut sim = initialize(&config)?;
    sim.advance(300)?;

    let state = sim.state();
    assert!(state.collision_count() > 0, "a dense gas should collide");
    assert_eq!(state.product_count(), 0);
    assert_eq!(state.reaction_count(), 0);
    assert_eq!(state.count(Element::A), 30);
    assert_eq!(state.count(Element::B), 30);
    Ok(())
}

/// Slow A/B pairs below the activation energy bounce instead of reacting.
#[test]
fn activation_energy_gates_reactions() -> Result<()> {
    let pair = || {
        vec![
            particle(0, Element::A, [5.0, 5.0], [1.0, 0.0]),
            particle(1, Element::B, [9.0, 5.0], [-1.0, 0.0]),
        ]
    };
    // Combined kinetic energy of the pair is 1.0.
    let mut cold = initialize_with(
        &Config {
            reaction_probability: 1.0,
            activation_energy: 1.5,
            ..small_vessel()
        },
        pair(),
    )?;
    cold.step()?;
    assert_eq!(cold.state().collision_count(), 1);
    assert_eq!(cold.state().reaction_count(), 0);
    assert_eq!(cold.state().particles()[0].v, [-1.0, 0.0]);

    let mut hot = initialize_with(
        &Config {
            reaction_probability: 1.0,
            activation_energy: 0.5,
            ..small_vessel()
        },
        pair(),
    )?;
    hot.step()?;
    assert_eq!(hot.state().reaction_count(), 1);
    Ok(())
}
