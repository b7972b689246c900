//! A small domain model covering every resource type the controller
//! reacts to.

use model_tree::Resource;
use serde_json::json;

use crate::tree::TreeBuilder;

/// Name of the host the fixture's servers run on.
pub const LOCAL_HOST: &str = "primary";

/// JGroups `tcp` stack with its protocols in order.
pub fn tcp_stack(protocols: &[&str]) -> TreeBuilder {
    protocols
        .iter()
        .fold(TreeBuilder::ordered(&["protocol"]), |stack, name| {
            stack.leaf("protocol", name)
        })
}

/// Build the domain.
///
/// - `profile=base`: logging and a jgroups `tcp` stack
///   (`TCP, MPING, MERGE3, FD_ALL`)
/// - `profile=full`: includes `base`, adds `ejb3`
/// - `socket-binding-group=standard-sockets`
/// - `server-group=main` (profile `full`) with a `jvm`
/// - `server-group=other` (profile `base`)
/// - `system-property=domain.prop`, `interface=public`
/// - `host=primary` with running `server-one` in `main`, running
///   `server-two` in `other`, stopped `server-three` in `main`, and a proxy
///   for the `server-one` process
pub fn sample_domain() -> Resource {
    let base = TreeBuilder::new()
        .child(
            "subsystem",
            "logging",
            TreeBuilder::new().attr("level", json!("INFO")),
        )
        .child(
            "subsystem",
            "jgroups",
            TreeBuilder::new().child(
                "stack",
                "tcp",
                tcp_stack(&["TCP", "MPING", "MERGE3", "FD_ALL"]),
            ),
        );
    let full = TreeBuilder::new()
        .attr("includes", json!(["base"]))
        .child(
            "subsystem",
            "ejb3",
            TreeBuilder::new().attr("default-slsb-instance-pool", json!("slsb-strict-max-pool")),
        );

    let host = TreeBuilder::new()
        .child(
            "server-config",
            "server-one",
            TreeBuilder::new()
                .attr("group", json!("main"))
                .attr("status", json!("started")),
        )
        .child(
            "server-config",
            "server-two",
            TreeBuilder::new().attr("group", json!("other")),
        )
        .child(
            "server-config",
            "server-three",
            TreeBuilder::new()
                .attr("group", json!("main"))
                .attr("status", json!("stopped")),
        )
        .proxy("server", "server-one");

    TreeBuilder::new()
        .child("profile", "base", base)
        .child("profile", "full", full)
        .child(
            "socket-binding-group",
            "standard-sockets",
            TreeBuilder::new().attr("default-interface", json!("public")),
        )
        .child(
            "server-group",
            "main",
            TreeBuilder::new()
                .attr("profile", json!("full"))
                .attr("socket-binding-group", json!("standard-sockets"))
                .child(
                    "jvm",
                    "default",
                    TreeBuilder::new().attr("heap-size", json!("64m")),
                ),
        )
        .child(
            "server-group",
            "other",
            TreeBuilder::new()
                .attr("profile", json!("base"))
                .attr("socket-binding-group", json!("standard-sockets")),
        )
        .child(
            "system-property",
            "domain.prop",
            TreeBuilder::new().attr("value", json!("1")),
        )
        .child(
            "interface",
            "public",
            TreeBuilder::new().attr("inet-address", json!("127.0.0.1")),
        )
        .child("host", LOCAL_HOST, host)
        .build()
}
