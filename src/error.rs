use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the collision simulation.
///
/// Library code returns these instead of panicking. Configuration problems surface
/// before the first step; a step can only fail with `PhysicsInvariant` or
/// `IdsExhausted`.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid initialization parameters; the simulation does not start.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Invalid argument to a lower-level constructor.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// A particle ended a step outside the vessel or with non-finite state.
    /// Signals a resolution bug and is not recoverable.
    #[error("physics invariant violated: {0}")]
    PhysicsInvariant(String),

    /// No fresh id is left for a product or dissociation fragment.
    #[error("particle ids exhausted (next id would follow {0})")]
    IdsExhausted(u32),

    /// Malformed TOML configuration.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Propagated I/O errors (e.g., reading a configuration file).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
