//! Managed server identities and the actions they may require

use std::collections::BTreeMap;
use std::fmt;

use model_tree::{PathElement, Resource};
use serde::{Deserialize, Serialize};

use crate::domain::{GROUP, SERVER_CONFIG, SOCKET_BINDING_GROUP, STATUS};

/// A managed server process
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerIdentity {
    pub host: String,
    pub server_group: String,
    pub server: String,
}

impl ServerIdentity {
    pub fn new(
        host: impl Into<String>,
        server_group: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            server_group: server_group.into(),
            server: server.into(),
        }
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.host, self.server, self.server_group)
    }
}

/// Action a server must take to pick up configuration changes
///
/// Ordered so that `Restart` outranks `Reload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequiredAction {
    Reload,
    Restart,
}

impl fmt::Display for RequiredAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reload => write!(f, "reload-required"),
            Self::Restart => write!(f, "restart-required"),
        }
    }
}

/// A required action addressed to one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerAction {
    pub server: ServerIdentity,
    pub action: RequiredAction,
}

/// Collects required actions per server, keeping the strongest
#[derive(Debug, Clone, Default)]
pub struct ServerSignals {
    actions: BTreeMap<ServerIdentity, RequiredAction>,
}

impl ServerSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `action` for `server`; a restart is never downgraded.
    pub fn require(&mut self, server: ServerIdentity, action: RequiredAction) {
        self.actions
            .entry(server)
            .and_modify(|current| *current = (*current).max(action))
            .or_insert(action);
    }

    pub fn get(&self, server: &ServerIdentity) -> Option<RequiredAction> {
        self.actions.get(server).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Drain into a list sorted by server identity.
    pub fn into_actions(self) -> Vec<ServerAction> {
        self.actions
            .into_iter()
            .map(|(server, action)| ServerAction { server, action })
            .collect()
    }
}

/// A server configured on the local host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub identity: ServerIdentity,
    /// Socket binding group overriding the server group's
    pub socket_binding_group: Option<String>,
    pub running: bool,
}

/// Servers configured on one host, read from `host=<name>/server-config=*`
#[derive(Debug, Clone, Default)]
pub struct ServerInventory {
    servers: Vec<ServerConfig>,
}

impl ServerInventory {
    /// Read the server configurations of `host` from the domain root.
    ///
    /// A missing host yields an empty inventory. Servers whose `status` is
    /// `stopped` or `disabled` are not running.
    pub fn from_host(root: &Resource, host: &str) -> Self {
        let Some(host_resource) = root.child(&PathElement::new(crate::domain::HOST, host)) else {
            return Self::default();
        };
        let servers = host_resource
            .children(SERVER_CONFIG)
            .filter_map(|(name, config)| {
                let group = config.attribute(GROUP)?.as_str()?;
                let status = config
                    .attribute(STATUS)
                    .and_then(|v| v.as_str())
                    .unwrap_or("started");
                Some(ServerConfig {
                    identity: ServerIdentity::new(host, group, name),
                    socket_binding_group: config
                        .attribute(SOCKET_BINDING_GROUP)
                        .and_then(|v| v.as_str())
                        .map(str::to_string),
                    running: !matches!(
                        status.to_ascii_lowercase().as_str(),
                        "stopped" | "disabled"
                    ),
                })
            })
            .collect();
        Self { servers }
    }

    pub fn servers(&self) -> &[ServerConfig] {
        &self.servers
    }

    /// Servers that are currently running.
    pub fn running(&self) -> impl Iterator<Item = &ServerConfig> {
        self.servers.iter().filter(|s| s.running)
    }

    /// Running servers belonging to `group`.
    pub fn running_in_group<'a>(&'a self, group: &'a str) -> impl Iterator<Item = &'a ServerConfig> {
        self.running()
            .filter(move |s| s.identity.server_group == group)
    }
}
