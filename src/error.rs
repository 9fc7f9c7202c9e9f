//! Error types for configuration loading and inventory resolution.

use std::fmt::Write;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that make a configuration unusable.
///
/// All of these are fatal at startup: the dashboard never opens with a
/// partially resolved inventory.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document could not be read from disk.
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid YAML or has the wrong top-level shape.
    #[error("Malformed configuration: {0}")]
    Malformed(String),

    /// `poll-interval` is below the minimum.
    #[error("Cannot set poll interval below {min} seconds (got {got})")]
    PollInterval { got: i64, min: u64 },

    /// A metric name not known to the registry.
    #[error("Found invalid metric `{0}`")]
    UnknownMetric(String),

    /// A metric that cannot run without a custom command.
    #[error("Metric `{0}` requires a command")]
    MissingCommand(String),

    /// A node's `connection` block could not be decoded.
    #[error("{node}: failed to parse connection: {cause}")]
    Connection { node: String, cause: String },

    /// Password and private key login configured on the same node.
    #[error("{node}: cannot specify both password login and private key login on same connection")]
    ConflictingCredentials { node: String },

    /// `children` is present but is not a mapping of host names.
    #[error("{node}: failed to parse children, expected a mapping")]
    Children { node: String },

    /// A node value that is neither a mapping nor empty.
    #[error("{node}: expected a mapping or an empty value")]
    Node { node: String },

    /// A field with the wrong type (e.g. a list as an alias).
    #[error("{node}: invalid `{field}`")]
    Field { node: String, field: &'static str },

    /// The same address resolved twice.
    #[error("{node}: duplicate host address `{address}`")]
    DuplicateHost { node: String, address: String },

    /// The tree nests deeper than the resolver allows.
    #[error("{node}: inventory nested deeper than {max} levels")]
    TooDeep { node: String, max: usize },

    /// The inventory resolved to no hosts at all.
    #[error("No hosts configured")]
    NoHosts,

    /// Several independent problems found in one pass.
    #[error("{}", format_many(.0))]
    Multiple(Vec<ConfigError>),
}

impl ConfigError {
    /// Collapse a list of errors into a single error.
    ///
    /// Returns `None` when the list is empty.
    pub fn from_many(mut errors: Vec<ConfigError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(ConfigError::Multiple(errors)),
        }
    }
}

fn format_many(errors: &[ConfigError]) -> String {
    let mut out = format!("{} configuration errors:", errors.len());
    for err in errors {
        let _ = write!(out, "\n  - {}", err);
    }
    out
}
