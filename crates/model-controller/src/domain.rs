//! Domain resource names and the default domain wiring

use std::sync::Arc;

use model_tree::{PathAddress, PathElement, ResourceRegistration};

use crate::error::Result;
use crate::handler::{
    HandlerRegistry, ModelVerifier, RequiredAttributes, RuntimeEffect, StepHandler,
};
use crate::impact::ServerImpact;
use crate::includes::{IncludesValidator, IncludesVerifier};
use crate::operation::OperationKind;

pub use model_tree::HOST;

pub const PROFILE: &str = "profile";
pub const SOCKET_BINDING_GROUP: &str = "socket-binding-group";
pub const SERVER_GROUP: &str = "server-group";
pub const SERVER_CONFIG: &str = "server-config";
pub const SERVER: &str = "server";
pub const SYSTEM_PROPERTY: &str = "system-property";
pub const INTERFACE: &str = "interface";
pub const PATH: &str = "path";
pub const JVM: &str = "jvm";
pub const DEPLOYMENT: &str = "deployment";
pub const SUBSYSTEM: &str = "subsystem";
pub const STACK: &str = "stack";
pub const PROTOCOL: &str = "protocol";

// Attributes
pub const INCLUDES: &str = "includes";
pub const GROUP: &str = "group";
pub const STATUS: &str = "status";
pub const BOOT_TIME: &str = "boot-time";

/// Registration of the domain model.
///
/// JGroups protocol stacks keep their protocols in order, and servers below a
/// host are proxies for the running processes.
pub fn domain_registration() -> Result<ResourceRegistration> {
    let mut root = ResourceRegistration::new();

    let profile =
        root.register_sub_model(PathElement::wildcard(PROFILE), ResourceRegistration::new())?;
    let jgroups = profile.register_sub_model(
        PathElement::new(SUBSYSTEM, "jgroups"),
        ResourceRegistration::new(),
    )?;
    jgroups.register_sub_model(
        PathElement::wildcard(STACK),
        ResourceRegistration::new().with_ordered_child_type(PROTOCOL),
    )?;

    let host =
        root.register_sub_model(PathElement::wildcard(HOST), ResourceRegistration::new())?;
    host.register_sub_model(PathElement::wildcard(SERVER), ResourceRegistration::remote())?;

    Ok(root)
}

/// Handlers for a domain controller running on `host`.
///
/// Every operation verifies includes of profiles and socket binding groups
/// and flags impacted servers. Adding a server configuration requires its
/// `group`.
pub fn domain_handlers(host: impl Into<String>) -> HandlerRegistry {
    domain_handlers_with(host, IncludesValidator::default())
}

/// Like [`domain_handlers`], validating includes of the types `includes`
/// covers.
pub fn domain_handlers_with(
    host: impl Into<String>,
    includes: IncludesValidator,
) -> HandlerRegistry {
    let verifier: Arc<dyn ModelVerifier> = Arc::new(IncludesVerifier::new(includes));
    let impact: Arc<dyn RuntimeEffect> = Arc::new(ServerImpact::new(host));
    let decorate = |handler: StepHandler| {
        handler
            .with_verifier(Arc::clone(&verifier))
            .with_effect(Arc::clone(&impact))
    };

    let mut registry = HandlerRegistry::new();
    for kind in OperationKind::ALL {
        registry.register(kind, Arc::new(decorate(StepHandler::for_kind(kind))));
    }
    let server_config = PathAddress::from_elements([
        PathElement::wildcard(HOST),
        PathElement::wildcard(SERVER_CONFIG),
    ]);
    registry.register_override(
        server_config,
        OperationKind::Add,
        Arc::new(decorate(
            StepHandler::for_kind(OperationKind::Add)
                .with_validator(Arc::new(RequiredAttributes::new([GROUP]))),
        )),
    );
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocols_are_ordered_in_every_stack() {
        let registration = domain_registration().unwrap();
        let stack: PathAddress = "/profile=full/subsystem=jgroups/stack=tcp".parse().unwrap();
        let resource = registration.create_resource(&stack);
        assert!(resource.is_ordered_child_type(PROTOCOL));

        let other: PathAddress = "/profile=full/subsystem=logging".parse().unwrap();
        assert!(registration.create_resource(&other).ordered_child_types().is_empty());
    }

    #[test]
    fn running_servers_are_proxies() {
        let registration = domain_registration().unwrap();
        let server: PathAddress = "/host=primary/server=one".parse().unwrap();
        assert!(registration.create_resource(&server).is_proxy());
        let config: PathAddress = "/host=primary/server-config=one".parse().unwrap();
        assert!(!registration.create_resource(&config).is_proxy());
    }
}
