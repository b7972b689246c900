//! End-to-end reconciliation between a primary and a secondary
//!
//! The primary describes its model for the secondary, the description
//! travels as JSON through a file, and the secondary reconciles its own
//! model on disk. Repeated rounds must converge and only signal the
//! secondary's own servers.

use model_controller::{RequiredAction, ServerAction, ServerIdentity};
use model_sync::{ModelStore, Reconciler, SyncOptions, SyncReport};
use model_test_utils::{TestDir, TreeBuilder, names, sample_domain};
use model_tree::{DescribedResource, IgnoredResources, ModelReader, PathAddress, PathElement, Resource};
use pretty_assertions::assert_eq;
use serde_json::json;

const SECONDARY: &str = "secondary";

fn address(s: &str) -> PathAddress {
    s.parse().unwrap()
}

fn secondary_options() -> SyncOptions {
    let mut ignored = IgnoredResources::new();
    ignored.ignore_name("profile", "legacy");
    SyncOptions {
        host: SECONDARY.to_string(),
        ignored,
        ..SyncOptions::default()
    }
}

/// A secondary that only knows its own host and a profile it keeps to itself.
fn secondary_model() -> Resource {
    TreeBuilder::new()
        .child(
            "profile",
            "legacy",
            TreeBuilder::new().attr("owner", json!("secondary")),
        )
        .child(
            "host",
            SECONDARY,
            TreeBuilder::new().child(
                "server-config",
                "s1",
                TreeBuilder::new()
                    .attr("group", json!("main"))
                    .attr("status", json!("started")),
            ),
        )
        .build()
}

/// Primary side of one round: describe and ship as JSON.
fn ship(dir: &TestDir, primary: &Resource, options: &SyncOptions) -> DescribedResource {
    let described = ModelReader::describe_for_secondary(primary, options.ignored.clone());
    dir.write("incoming.json", &described.to_json_string().unwrap());
    described
}

/// Secondary side of one round: load, reconcile, save.
fn receive(dir: &TestDir, options: &SyncOptions) -> SyncReport {
    let live = ModelStore::new(dir.path().join("live.json"));
    let incoming = ModelStore::new(dir.path().join("incoming.json")).load().unwrap();

    let reconciler = Reconciler::new(options.clone());
    let controller = reconciler.controller(live.load_resource().unwrap()).unwrap();
    let report = reconciler.apply(&controller, &incoming).unwrap();
    live.save_resource(&controller.into_root().unwrap()).unwrap();
    report
}

fn s1(action: RequiredAction) -> Vec<ServerAction> {
    vec![ServerAction {
        server: ServerIdentity::new(SECONDARY, "main", "s1"),
        action,
    }]
}

#[test]
fn test_secondary_converges_over_several_rounds() {
    let dir = TestDir::new();
    let options = secondary_options();
    let live = ModelStore::new(dir.path().join("live.json"));
    live.save_resource(&secondary_model()).unwrap();

    let mut primary = sample_domain();
    primary
        .register_child(
            PathElement::new("profile", "legacy"),
            TreeBuilder::new().attr("owner", json!("primary")).build(),
        )
        .unwrap();

    // Round 1: initial connect. The new jvm makes s1 restart.
    let sent = ship(&dir, &primary, &options);
    let report = receive(&dir, &options);
    assert!(!report.is_noop());
    assert_eq!(report.server_actions, s1(RequiredAction::Restart));
    assert_eq!(report.incoming_digest, sent.digest().unwrap());

    let secondary = live.load_resource().unwrap();
    assert_eq!(
        ModelReader::describe_for_secondary(&secondary, options.ignored.clone()),
        sent
    );
    // Local and ignored resources are untouched
    assert_eq!(
        secondary
            .navigate(&address("/profile=legacy"))
            .unwrap()
            .attribute("owner"),
        Some(&json!("secondary"))
    );
    assert_eq!(names(&secondary, "host"), [SECONDARY]);

    // Round 2: reorder the tcp stack and touch the included profile.
    {
        let tcp = address("/profile=base/subsystem=jgroups/stack=tcp");
        let stack = primary.navigate_mut(&tcp).unwrap();
        let merge = stack
            .remove_child(&PathElement::new("protocol", "MERGE3"))
            .unwrap();
        stack
            .register_child_at(PathElement::new("protocol", "MERGE3"), 0, merge)
            .unwrap();
        primary
            .navigate_mut(&address("/profile=base/subsystem=logging"))
            .unwrap()
            .write_attribute("level", json!("WARN"));
    }
    ship(&dir, &primary, &options);
    let report = receive(&dir, &options);
    assert_eq!(report.server_actions, s1(RequiredAction::Reload));

    let secondary = live.load_resource().unwrap();
    let stack = secondary
        .navigate(&address("/profile=base/subsystem=jgroups/stack=tcp"))
        .unwrap();
    assert_eq!(names(stack, "protocol"), ["MERGE3", "TCP", "MPING", "FD_ALL"]);

    // Round 3: nothing changed on the primary.
    ship(&dir, &primary, &options);
    let report = receive(&dir, &options);
    assert!(report.is_noop());
    assert!(report.server_actions.is_empty());
}

#[test]
fn test_rejected_round_leaves_the_secondary_file_unchanged() {
    let dir = TestDir::new();
    let options = secondary_options();
    let live = ModelStore::new(dir.path().join("live.json"));
    live.save_resource(&sample_domain()).unwrap();
    let before = live.load().unwrap();

    let mut primary = sample_domain();
    primary
        .register_child(
            PathElement::new("profile", "alt"),
            TreeBuilder::new()
                .child(
                    "subsystem",
                    "logging",
                    TreeBuilder::new().attr("level", json!("DEBUG")),
                )
                .build(),
        )
        .unwrap();
    primary
        .navigate_mut(&address("/profile=full"))
        .unwrap()
        .write_attribute("includes", json!(["base", "alt"]));
    let incoming = ship(&dir, &primary, &options);

    let reconciler = Reconciler::new(options.clone());
    let controller = reconciler.controller(live.load_resource().unwrap()).unwrap();
    let err = reconciler.apply(&controller, &incoming).unwrap_err();

    let message = err.to_string();
    for part in ["full", "base", "alt", "subsystem=logging"] {
        assert!(message.contains(part), "{message}");
    }
    assert_eq!(DescribedResource::of(&controller.into_root().unwrap()), before);
    assert_eq!(live.load().unwrap(), before);
}
