use thiserror::Error;

/// Errors surfaced to callers of the simulation core.
///
/// Stochastic dead ends (no prey found, a birth that does not fire, zero
/// population pressure) are ordinary control flow, not errors. Breaches of
/// internal invariants are bugs: the engine reports them through
/// [`SimError::InvariantBreach`] from [`crate::grid::Grid::validate`] and
/// treats them as fatal inside the tick itself.
#[derive(Debug, Error)]
pub enum SimError {
    /// Rejected construction or seeding input; never partially applied.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A species id the registry has never issued.
    #[error("unknown species id {0}")]
    UnknownSpecies(u32),

    /// The grid and a stored cell disagree about the cell's own state.
    #[error("internal invariant breach: {0}")]
    InvariantBreach(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed simulation config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("malformed species file: {0}")]
    SpeciesParse(#[from] serde_json::Error),
}
