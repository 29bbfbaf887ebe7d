//! Toy 2D particle collision simulation with an A + B -> Product reaction.
//!
//! ```no_run
//! use collider::{initialize, Config};
//!
//! # fn main() -> collider::error::Result<()> {
//! let sim = initialize(&Config::default())?;
//! for snapshot in sim.run(100) {
//!     let m = snapshot?.metrics();
//!     println!("{} {} {}", m.step, m.temperature, m.product_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use crate::config::Config;
pub use crate::core::{
    initialize, initialize_with, Element, Metrics, Particle, Simulation, SimulationState,
};
pub use crate::error::{Error, Result};
