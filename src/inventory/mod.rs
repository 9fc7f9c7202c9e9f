//! Host inventory: the configuration tree and its resolution.
//!
//! The `hosts` section of the document is an Ansible-style tree of groups
//! and hosts. Groups carry `children` and may override the connection used
//! below them; leaves are hosts.
//!
//! ```text
//! hosts (Value)
//!      │
//!      ▼
//! Node::decode_root()        structural checks, errors collected
//!      │
//!      ▼
//! resolve(&node, &inherited) connection inheritance, credential checks
//!      │
//!      ▼
//! Vec<Host>                  traversal order, one per leaf
//! ```

pub mod connection;
pub mod resolve;
pub mod tree;

pub use connection::{ConnectionBlock, ConnectionSpec, Strategy, DEFAULT_SSH_PORT};
pub use resolve::resolve;
pub use tree::Node;

/// A single host of the fleet, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Node key; unique across the inventory.
    pub address: String,
    /// Optional display label.
    pub alias: Option<String>,
    /// How to reach this host.
    pub connection: ConnectionSpec,
}

impl Host {
    /// Alias for display, or a dash when none is set.
    pub fn display_alias(&self) -> &str {
        self.alias.as_deref().unwrap_or("-")
    }
}
