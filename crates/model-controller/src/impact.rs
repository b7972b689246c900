//! Mapping model changes to the servers they affect

use model_tree::{PathAddress, Resource};
use tracing::debug;

use crate::context::{ModelChange, OperationContext};
use crate::domain::{
    BOOT_TIME, DEPLOYMENT, HOST, INTERFACE, JVM, PATH, PROFILE, SERVER_CONFIG, SERVER_GROUP,
    SOCKET_BINDING_GROUP, SYSTEM_PROPERTY,
};
use crate::error::Result;
use crate::handler::RuntimeEffect;
use crate::includes::includes_closure;
use crate::server::{RequiredAction, ServerConfig, ServerIdentity, ServerInventory};

/// Flags servers on the local host that must reload or restart after a change
///
/// Runs in the `Runtime` stage, so it sees the model after every change of
/// the pass. Removals are judged by the removed resource.
#[derive(Debug, Clone)]
pub struct ServerImpact {
    host: String,
}

impl ServerImpact {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// Actions required by `change`, one entry per affected running server.
    pub fn impacts(
        &self,
        root: &Resource,
        change: &ModelChange,
    ) -> Vec<(ServerIdentity, RequiredAction)> {
        let address = change.address();
        let Some(first) = address.first() else {
            return Vec::new();
        };
        let inventory = ServerInventory::from_host(root, &self.host);
        let reload_all = |servers: Vec<&ServerConfig>| -> Vec<(ServerIdentity, RequiredAction)> {
            servers
                .into_iter()
                .map(|s| (s.identity.clone(), RequiredAction::Reload))
                .collect()
        };

        match first.key.as_str() {
            PROFILE => reload_all(
                inventory
                    .running()
                    .filter(|s| {
                        group_attribute(root, &s.identity.server_group, PROFILE)
                            .is_some_and(|profile| {
                                includes_closure(root, PROFILE, &profile).contains(&first.value)
                            })
                    })
                    .collect(),
            ),
            SOCKET_BINDING_GROUP => reload_all(
                inventory
                    .running()
                    .filter(|s| {
                        s.socket_binding_group
                            .clone()
                            .or_else(|| {
                                group_attribute(
                                    root,
                                    &s.identity.server_group,
                                    SOCKET_BINDING_GROUP,
                                )
                            })
                            .is_some_and(|group| {
                                includes_closure(root, SOCKET_BINDING_GROUP, &group)
                                    .contains(&first.value)
                            })
                    })
                    .collect(),
            ),
            SERVER_GROUP => {
                let Some(action) = server_group_action(root, change) else {
                    return Vec::new();
                };
                inventory
                    .running_in_group(&first.value)
                    .map(|s| (s.identity.clone(), action))
                    .collect()
            }
            SYSTEM_PROPERTY => {
                if system_property_is_boot_time(root, change, 1) {
                    reload_all(inventory.running().collect())
                } else {
                    Vec::new()
                }
            }
            INTERFACE | PATH => reload_all(inventory.running().collect()),
            HOST if first.value == self.host => {
                let Some(config) = address.elements().get(1).filter(|e| e.key == SERVER_CONFIG)
                else {
                    return Vec::new();
                };
                let action = match address.elements().get(2) {
                    Some(child) if child.key == JVM => RequiredAction::Restart,
                    _ => RequiredAction::Reload,
                };
                inventory
                    .running()
                    .filter(|s| s.identity.server == config.value)
                    .map(|s| (s.identity.clone(), action))
                    .collect()
            }
            _ => Vec::new(),
        }
    }
}

impl RuntimeEffect for ServerImpact {
    fn apply(&self, context: &mut dyn OperationContext, change: &ModelChange) -> Result<()> {
        let impacts = self.impacts(context.root(), change);
        for (server, action) in impacts {
            debug!(address = %change.address(), %server, %action, "Server impacted");
            match action {
                RequiredAction::Reload => context.reload_required(server),
                RequiredAction::Restart => context.restart_required(server),
            }
        }
        Ok(())
    }
}

fn group_attribute(root: &Resource, group: &str, attribute: &str) -> Option<String> {
    root.child(&model_tree::PathElement::new(SERVER_GROUP, group))?
        .attribute(attribute)?
        .as_str()
        .map(str::to_string)
}

fn server_group_action(root: &Resource, change: &ModelChange) -> Option<RequiredAction> {
    let Some(child) = change.address().elements().get(1) else {
        return Some(RequiredAction::Reload);
    };
    match child.key.as_str() {
        JVM => Some(RequiredAction::Restart),
        DEPLOYMENT => None,
        SYSTEM_PROPERTY => {
            system_property_is_boot_time(root, change, 2).then_some(RequiredAction::Reload)
        }
        _ => Some(RequiredAction::Reload),
    }
}

/// Whether the system property at depth `depth` of the change address takes
/// effect at boot. Properties default to boot-time; toggling the flag itself
/// always counts.
fn system_property_is_boot_time(root: &Resource, change: &ModelChange, depth: usize) -> bool {
    let address = change.address();
    let property = PathAddress::from_elements(address.iter().take(depth).cloned());

    if let ModelChange::AttributeWritten { name, .. } = change {
        if name == BOOT_TIME && *address == property {
            return true;
        }
    }
    let resource = match change {
        ModelChange::Removed { previous, .. } if *address == property => Some(previous),
        _ => root.navigate(&property).ok(),
    };
    resource
        .and_then(|r| r.attribute(BOOT_TIME))
        .and_then(|v| v.as_bool())
        .unwrap_or(true)
}
