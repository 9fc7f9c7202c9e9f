//! Resolution of the inventory tree into a flat host list.

use std::collections::HashSet;

use tracing::debug;

use super::connection::{ConnectionProblem, ConnectionSpec};
use super::tree::{child_path, Node, ROOT_NAME};
use super::Host;
use crate::error::ConfigError;

/// Walk the tree and produce one [`Host`] per leaf, in traversal order.
///
/// Each node's `connection` block replaces the connection inherited from its
/// parent for that node and everything below it. Problems are collected for
/// the whole tree before failing.
pub fn resolve(tree: &Node, inherited: &ConnectionSpec) -> Result<Vec<Host>, ConfigError> {
    let mut resolver = Resolver::default();
    resolver.visit(ROOT_NAME, None, tree, inherited);

    if let Some(err) = ConfigError::from_many(resolver.errors) {
        return Err(err);
    }
    Ok(resolver.hosts)
}

#[derive(Default)]
struct Resolver {
    hosts: Vec<Host>,
    seen: HashSet<String>,
    errors: Vec<ConfigError>,
}

impl Resolver {
    fn visit(&mut self, path: &str, key: Option<&str>, node: &Node, inherited: &ConnectionSpec) {
        let overridden;
        let current = match node.connection() {
            Some(block) => match ConnectionSpec::from_block(block) {
                Ok(spec) => {
                    overridden = spec;
                    &overridden
                }
                Err(problem) => {
                    self.errors.push(connection_error(path, problem));
                    // Keep walking with the parent's connection so that the
                    // rest of the subtree is still checked.
                    inherited
                }
            },
            None => inherited,
        };

        match node {
            Node::Group { children, .. } => {
                for (name, child) in children {
                    self.visit(&child_path(path, name), Some(name), child, current);
                }
            }
            Node::Leaf { alias, .. } => {
                let Some(address) = key else {
                    return;
                };
                if !self.seen.insert(address.to_string()) {
                    self.errors.push(ConfigError::DuplicateHost {
                        node: path.to_string(),
                        address: address.to_string(),
                    });
                    return;
                }

                let host = Host {
                    address: address.to_string(),
                    alias: alias.clone(),
                    connection: current.bound_to(address),
                };
                debug!(address = %host.address, connection = ?host.connection, "Resolved host");
                self.hosts.push(host);
            }
        }
    }
}

fn connection_error(path: &str, problem: ConnectionProblem) -> ConfigError {
    match problem {
        ConnectionProblem::ConflictingCredentials => ConfigError::ConflictingCredentials {
            node: path.to_string(),
        },
        ConnectionProblem::UnknownType(kind) => ConfigError::Connection {
            node: path.to_string(),
            cause: format!("unknown connection type `{}`", kind),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::Strategy;

    fn resolve_yaml(yaml: &str) -> Result<Vec<Host>, ConfigError> {
        let value: serde_yaml::Value = serde_yaml::from_str(yaml).unwrap();
        let tree = Node::decode_root(&value)?;
        resolve(&tree, &ConnectionSpec::local())
    }

    fn find<'a>(hosts: &'a [Host], address: &str) -> &'a Host {
        hosts.iter().find(|h| h.address == address).unwrap()
    }

    #[test]
    fn test_web_and_db_scenario() {
        let hosts = resolve_yaml(
            r#"
connection:
  type: local
children:
  web:
    connection:
      type: ssh
      port: 2222
  db: {}
"#,
        )
        .unwrap();

        assert_eq!(hosts.len(), 2);

        let web = find(&hosts, "web");
        assert_eq!(web.connection.strategy, Strategy::RemoteShell);
        assert_eq!(web.connection.port, 2222);
        assert_eq!(web.connection.target_host, "web");

        let db = find(&hosts, "db");
        assert_eq!(db.connection.strategy, Strategy::Local);
        assert_eq!(db.connection.target_host, "db");
    }

    #[test]
    fn test_one_host_per_leaf_in_traversal_order() {
        let hosts = resolve_yaml(
            r#"
children:
  frontend:
    children:
      web-1:
      web-2:
        alias: canary
  backend:
    children:
      api:
        children:
          api-1:
      db-1:
"#,
        )
        .unwrap();

        let addresses: Vec<&str> = hosts.iter().map(|h| h.address.as_str()).collect();
        assert_eq!(addresses, ["web-1", "web-2", "api-1", "db-1"]);
        assert!(!addresses.contains(&"frontend"));
        assert_eq!(find(&hosts, "web-2").alias.as_deref(), Some("canary"));
        assert_eq!(find(&hosts, "web-1").alias, None);
    }

    #[test]
    fn test_override_does_not_leak_to_siblings() {
        let hosts = resolve_yaml(
            r#"
connection:
  type: ssh
  username: ops
children:
  special:
    connection:
      type: ssh
      username: admin
      port: 2200
    children:
      s-1:
      s-2:
  regular:
    children:
      r-1:
"#,
        )
        .unwrap();

        for address in ["s-1", "s-2"] {
            let conn = &find(&hosts, address).connection;
            assert_eq!(conn.username.as_deref(), Some("admin"));
            assert_eq!(conn.port, 2200);
        }
        let regular = &find(&hosts, "r-1").connection;
        assert_eq!(regular.username.as_deref(), Some("ops"));
        assert_eq!(regular.port, 22);
    }

    #[test]
    fn test_override_replaces_whole_connection() {
        let hosts = resolve_yaml(
            r#"
connection:
  type: ssh
  username: ops
  private_key_path: /keys/ops
children:
  box:
    connection:
      type: local
"#,
        )
        .unwrap();
        let conn = &hosts[0].connection;
        assert_eq!(conn.strategy, Strategy::Local);
        assert!(conn.username.is_none());
        assert!(conn.private_key_path.is_none());
    }

    #[test]
    fn test_leaf_level_override() {
        let hosts = resolve_yaml(
            r#"
children:
  edge:
    connection:
      type: ssh
      password: secret
"#,
        )
        .unwrap();
        assert_eq!(hosts[0].connection.strategy, Strategy::RemoteShell);
        assert_eq!(hosts[0].connection.password.as_deref(), Some("secret"));
    }

    #[test]
    fn test_conflicting_credentials_reported_with_node() {
        let err = resolve_yaml(
            r#"
children:
  group:
    connection:
      type: ssh
      password: p
      private_key_path: /k
    children:
      h-1:
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ConflictingCredentials { ref node } if node == "root:group"
        ));
    }

    #[test]
    fn test_resolution_errors_accumulate() {
        let err = resolve_yaml(
            r#"
children:
  a:
    connection:
      type: carrier-pigeon
  b:
    connection:
      type: ssh
      password: p
      private_key_path: /k
  c:
"#,
        )
        .unwrap_err();
        let ConfigError::Multiple(errors) = err else {
            panic!("expected multiple errors, got {err:?}");
        };
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn test_duplicate_addresses_rejected() {
        let err = resolve_yaml(
            r#"
children:
  east:
    children:
      shared:
  west:
    children:
      shared:
"#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::DuplicateHost { ref node, ref address }
                if node == "root:west:shared" && address == "shared"
        ));
    }

    #[test]
    fn test_empty_tree_has_no_hosts() {
        assert!(resolve_yaml("{}").unwrap().is_empty());
        assert!(resolve_yaml("children: {}").unwrap().is_empty());
    }

    #[test]
    fn test_hosts_own_their_connection() {
        let hosts = resolve_yaml("children:\n  a:\n  b:\n").unwrap();
        assert_ne!(hosts[0].connection, hosts[1].connection);
        assert_eq!(hosts[0].connection.target_host, "a");
        assert_eq!(hosts[1].connection.target_host, "b");
    }
}
