//! Core simulation data structures and the step engine.
//!
//! Particles live in a 2D vessel and advance in fixed unit time steps. The
//! engine resolves wall bounces, elastic pair collisions and A + B -> Product
//! reactions, and keeps running counters for reporting.

pub mod event;
pub mod particle;
pub mod sim;
pub mod state;
pub mod vessel;

pub use event::{Contact, Event, EventKind};
pub use particle::{Element, Particle, DIM};
pub use sim::{initialize, initialize_with, Engine, Run, Simulation, DT};
pub use state::{Counters, Metrics, SimulationState, BOUNDS_TOLERANCE};
pub use vessel::{Obstacle, Orientation, Vessel, Wall};
