//! Typed inventory tree decoded from the `hosts` section of the document.
//!
//! The YAML tree is loosely typed; it is decoded exactly once into [`Node`]
//! so that resolution works on a closed set of shapes.

use serde_yaml::{Mapping, Value};
use tracing::warn;

use super::connection::ConnectionBlock;
use crate::error::ConfigError;

/// Name given to the top of the tree in error messages.
pub const ROOT_NAME: &str = "root";

/// Deepest nesting accepted below the root.
pub const MAX_DEPTH: usize = 32;

/// One node of the inventory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A single addressable host.
    Leaf {
        alias: Option<String>,
        connection: Option<ConnectionBlock>,
    },
    /// A group that only carries settings for its children.
    Group {
        connection: Option<ConnectionBlock>,
        children: Vec<(String, Node)>,
    },
}

impl Node {
    /// Returns the connection override declared on this node, if any.
    pub fn connection(&self) -> Option<&ConnectionBlock> {
        match self {
            Node::Leaf { connection, .. } | Node::Group { connection, .. } => connection.as_ref(),
        }
    }

    /// Number of leaves below (and including) this node.
    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Group { children, .. } => children.iter().map(|(_, c)| c.leaf_count()).sum(),
        }
    }

    /// Decode the root of the tree.
    ///
    /// The root is always treated as a group. Every structural problem found
    /// anywhere in the tree is collected; decoding carries on past a bad
    /// subtree so that siblings are still checked.
    pub fn decode_root(value: &Value) -> Result<Node, ConfigError> {
        let mut errors = Vec::new();
        let node = match value {
            Value::Null => Node::Group {
                connection: None,
                children: Vec::new(),
            },
            Value::Mapping(map) => {
                let connection = decode_connection(ROOT_NAME, map, &mut errors);
                let children = match map.get("children") {
                    Some(children) => decode_children(ROOT_NAME, children, 1, &mut errors),
                    None => Vec::new(),
                };
                Node::Group {
                    connection,
                    children,
                }
            }
            _ => {
                errors.push(ConfigError::Node {
                    node: ROOT_NAME.to_string(),
                });
                Node::Group {
                    connection: None,
                    children: Vec::new(),
                }
            }
        };

        match ConfigError::from_many(errors) {
            Some(err) => Err(err),
            None => Ok(node),
        }
    }
}

/// Join a parent path and a child key for messages (`root:web:web-1`).
pub fn child_path(parent: &str, key: &str) -> String {
    format!("{}:{}", parent, key)
}

fn decode_node(path: &str, value: &Value, depth: usize, errors: &mut Vec<ConfigError>) -> Node {
    let map = match value {
        // A bare key with nothing under it is a host with default settings.
        Value::Null => {
            return Node::Leaf {
                alias: None,
                connection: None,
            }
        }
        Value::Mapping(map) => map,
        _ => {
            errors.push(ConfigError::Node {
                node: path.to_string(),
            });
            return Node::Leaf {
                alias: None,
                connection: None,
            };
        }
    };

    let connection = decode_connection(path, map, errors);

    for key in map.keys() {
        match key.as_str() {
            Some("connection" | "children" | "alias") => {}
            _ => warn!(node = path, key = ?key, "Ignoring unknown inventory key"),
        }
    }

    if let Some(children) = map.get("children") {
        if map.contains_key("alias") {
            warn!(node = path, "Ignoring alias on a group node");
        }
        return Node::Group {
            connection,
            children: decode_children(path, children, depth + 1, errors),
        };
    }

    let alias = match map.get("alias") {
        None | Some(Value::Null) => None,
        Some(value) => match scalar_to_string(value) {
            Some(alias) => Some(alias),
            None => {
                errors.push(ConfigError::Field {
                    node: path.to_string(),
                    field: "alias",
                });
                None
            }
        },
    };

    Node::Leaf { alias, connection }
}

fn decode_children(
    path: &str,
    value: &Value,
    depth: usize,
    errors: &mut Vec<ConfigError>,
) -> Vec<(String, Node)> {
    if depth > MAX_DEPTH {
        errors.push(ConfigError::TooDeep {
            node: path.to_string(),
            max: MAX_DEPTH,
        });
        return Vec::new();
    }

    let Value::Mapping(children) = value else {
        errors.push(ConfigError::Children {
            node: path.to_string(),
        });
        return Vec::new();
    };

    let mut decoded = Vec::with_capacity(children.len());
    for (key, child) in children {
        let Some(name) = scalar_to_string(key).filter(|n| !n.is_empty()) else {
            errors.push(ConfigError::Children {
                node: path.to_string(),
            });
            continue;
        };
        let child_path = child_path(path, &name);
        let node = decode_node(&child_path, child, depth, errors);
        decoded.push((name, node));
    }
    decoded
}

fn decode_connection(
    path: &str,
    map: &Mapping,
    errors: &mut Vec<ConfigError>,
) -> Option<ConnectionBlock> {
    let value = map.get("connection")?;
    if !value.is_mapping() {
        errors.push(ConfigError::Connection {
            node: path.to_string(),
            cause: "expected a mapping".to_string(),
        });
        return None;
    }
    match serde_yaml::from_value::<ConnectionBlock>(value.clone()) {
        Ok(block) => Some(block),
        Err(e) => {
            errors.push(ConfigError::Connection {
                node: path.to_string(),
                cause: e.to_string(),
            });
            None
        }
    }
}

pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
