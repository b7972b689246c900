//! Tests for reconciliation planning

use model_controller::ModelOperation;
use model_sync::{Planner, SyncOptions, SyncPlan};
use model_test_utils::domain::tcp_stack;
use model_test_utils::{TreeBuilder, sample_domain};
use model_tree::{DescribedResource, IgnoredResources};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

fn described(builder: TreeBuilder) -> DescribedResource {
    DescribedResource::of(&builder.build())
}

fn with_stack(protocols: &[&str]) -> DescribedResource {
    described(TreeBuilder::new().child("stack", "tcp", tcp_stack(protocols)))
}

fn options(local_indexed_add: bool) -> SyncOptions {
    SyncOptions {
        local_indexed_add,
        ..SyncOptions::default()
    }
}

fn plan(options: &SyncOptions, original: &DescribedResource, incoming: &DescribedResource) -> SyncPlan {
    Planner::new(options).plan(original, incoming)
}

mod idempotence_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::indexed(true)]
    #[case::append_only(false)]
    fn test_planning_a_model_against_itself_is_empty(#[case] indexed: bool) {
        let model = DescribedResource::of(&sample_domain());
        assert!(plan(&options(indexed), &model, &model).is_empty());
    }
}

mod attribute_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_changed_added_and_removed_attributes() {
        let original = described(
            TreeBuilder::new()
                .attr("a", json!(1))
                .attr("b", json!("x")),
        );
        let incoming = described(
            TreeBuilder::new()
                .attr("a", json!(2))
                .attr("c", json!(true)),
        );

        insta::assert_snapshot!(plan(&options(true), &original, &incoming), @r"
        /:write-attribute(a=2)
        /:write-attribute(c=true)
        /:undefine-attribute(b)
        ");
    }

    #[test]
    fn test_equal_values_produce_nothing() {
        let original = described(TreeBuilder::new().attr("a", json!({"nested": [1, 2]})));
        let incoming = described(TreeBuilder::new().attr("a", json!({"nested": [1, 2]})));
        assert!(plan(&options(true), &original, &incoming).is_empty());
    }

    #[test]
    fn test_surviving_ordered_child_gets_attribute_updates() {
        let original = described(TreeBuilder::new().child(
            "stack",
            "tcp",
            TreeBuilder::ordered(&["protocol"])
                .child("protocol", "A", TreeBuilder::new().attr("x", json!(1)))
                .leaf("protocol", "B"),
        ));
        let incoming = described(TreeBuilder::new().child(
            "stack",
            "tcp",
            TreeBuilder::ordered(&["protocol"])
                .child("protocol", "A", TreeBuilder::new().attr("x", json!(2)))
                .leaf("protocol", "B"),
        ));

        insta::assert_snapshot!(
            plan(&options(true), &original, &incoming),
            @"/stack=tcp/protocol=A:write-attribute(x=2)"
        );
    }
}

mod ordered_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insertion_at_head_with_indexed_add() {
        let result = plan(&options(true), &with_stack(&["B", "C"]), &with_stack(&["A", "B", "C"]));
        insta::assert_snapshot!(result, @"/stack=tcp/protocol=A:add(add-index=0)");
    }

    #[test]
    fn test_insertion_at_head_without_indexed_add_rebuilds() {
        let result = plan(&options(false), &with_stack(&["B", "C"]), &with_stack(&["A", "B", "C"]));
        insta::assert_snapshot!(result, @r"
        /stack=tcp/protocol=B:remove
        /stack=tcp/protocol=C:remove
        /stack=tcp/protocol=A:add()
        /stack=tcp/protocol=B:add()
        /stack=tcp/protocol=C:add()
        ");
    }

    #[test]
    fn test_reorder_only_moves_the_displaced_child() {
        let result = plan(
            &options(true),
            &with_stack(&["A", "B", "C", "D"]),
            &with_stack(&["B", "C", "D", "A"]),
        );
        insta::assert_snapshot!(result, @r"
        /stack=tcp/protocol=A:remove
        /stack=tcp/protocol=A:add(add-index=3)
        ");
    }

    #[test]
    fn test_reorder_only_without_indexed_add_rebuilds() {
        let result = plan(
            &options(false),
            &with_stack(&["A", "B", "C", "D"]),
            &with_stack(&["B", "C", "D", "A"]),
        );
        insta::assert_snapshot!(result, @r"
        /stack=tcp/protocol=A:remove
        /stack=tcp/protocol=B:remove
        /stack=tcp/protocol=C:remove
        /stack=tcp/protocol=D:remove
        /stack=tcp/protocol=B:add()
        /stack=tcp/protocol=C:add()
        /stack=tcp/protocol=D:add()
        /stack=tcp/protocol=A:add()
        ");
    }

    #[test]
    fn test_reorder_with_rename() {
        let result = plan(
            &options(true),
            &with_stack(&["A", "B", "C", "D"]),
            &with_stack(&["D", "X", "A", "C"]),
        );
        insta::assert_snapshot!(result, @r"
        /stack=tcp/protocol=B:remove
        /stack=tcp/protocol=D:remove
        /stack=tcp/protocol=D:add(add-index=0)
        /stack=tcp/protocol=X:add(add-index=1)
        ");
    }

    #[rstest]
    #[case::append(&["A", "B"], &["A", "B", "C"], &["/stack=tcp/protocol=C:add()"])]
    #[case::remove_and_append(
        &["A", "X", "B"],
        &["A", "B", "C"],
        &["/stack=tcp/protocol=X:remove", "/stack=tcp/protocol=C:add()"]
    )]
    #[case::remove_tail(&["A", "B", "C"], &["A", "B"], &["/stack=tcp/protocol=C:remove"])]
    fn test_survivors_forming_a_prefix_are_kept_without_indexed_add(
        #[case] before: &[&str],
        #[case] after: &[&str],
        #[case] expected: &[&str],
    ) {
        let result = plan(&options(false), &with_stack(before), &with_stack(after));
        let rendered: Vec<String> = result.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_removal_cascades_through_nested_ordered_grandchildren() {
        let original = described(
            TreeBuilder::new()
                .child("stack", "tcp", tcp_stack(&["TCP", "MPING"]))
                .child("stack", "udp", tcp_stack(&["UDP", "PING"])),
        );
        let incoming = with_stack(&["TCP", "MPING"]);

        insta::assert_snapshot!(plan(&options(true), &original, &incoming), @"/stack=udp:remove");
    }

    #[test]
    fn test_new_subtree_is_added_top_down_in_sequence_order() {
        let original = with_stack(&["TCP"]);
        let incoming = described(
            TreeBuilder::new()
                .child("stack", "tcp", tcp_stack(&["TCP"]))
                .child(
                    "stack",
                    "udp",
                    tcp_stack(&["UDP", "PING"]).attr("transport", json!("UDP")),
                ),
        );

        let result = plan(&options(true), &original, &incoming);
        insta::assert_snapshot!(result, @r#"
        /stack=udp:add(transport="UDP")
        /stack=udp/protocol=UDP:add()
        /stack=udp/protocol=PING:add()
        "#);
        assert!(result.iter().all(|op| !op.address().is_empty()));
    }
}

mod ordering_tag_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Addresses of the adds that mark their collection ordered.
    fn ordered_adds(plan: &SyncPlan) -> Vec<String> {
        plan.iter()
            .filter(|op| matches!(op, ModelOperation::Add { ordered: true, .. }))
            .map(|op| op.address().to_string())
            .collect()
    }

    #[rstest]
    #[case::indexed(true)]
    #[case::append_only(false)]
    fn test_adds_into_a_new_top_level_ordered_collection_are_flagged(#[case] indexed: bool) {
        let original = described(TreeBuilder::new());
        let incoming = described(TreeBuilder::ordered(&["chain"]).leaf("chain", "a").leaf("chain", "b"));

        let result = plan(&options(indexed), &original, &incoming);
        assert_eq!(ordered_adds(&result), ["/chain=a", "/chain=b"]);
    }

    #[test]
    fn test_only_the_top_add_of_a_subtree_is_flagged() {
        let original = described(TreeBuilder::new().child("subsystem", "logging", TreeBuilder::new()));
        let incoming = described(TreeBuilder::new().child(
            "subsystem",
            "logging",
            TreeBuilder::ordered(&["handler"]).child("handler", "h1", tcp_stack(&["X"])),
        ));

        let result = plan(&options(true), &original, &incoming);
        insta::assert_snapshot!(result, @r"
        /subsystem=logging/handler=h1:add(add-index=0)
        /subsystem=logging/handler=h1/protocol=X:add()
        ");
        assert_eq!(ordered_adds(&result), ["/subsystem=logging/handler=h1"]);
    }

    #[rstest]
    #[case::indexed(true, "/stack=tcp/protocol=A:add(add-index=0)")]
    #[case::append_only(false, "/stack=tcp/protocol=A:add()")]
    fn test_unordered_live_collection_is_rebuilt(#[case] indexed: bool, #[case] first_add: &str) {
        let original = described(TreeBuilder::new().child(
            "stack",
            "tcp",
            TreeBuilder::new().leaf("protocol", "A").leaf("protocol", "B"),
        ));
        let incoming = with_stack(&["A", "B"]);

        let result = plan(&options(indexed), &original, &incoming);
        let rendered: Vec<String> = result.iter().map(ToString::to_string).collect();
        assert_eq!(rendered[..2], ["/stack=tcp/protocol=A:remove", "/stack=tcp/protocol=B:remove"]);
        assert_eq!(rendered[2], first_add);
        assert_eq!(ordered_adds(&result), ["/stack=tcp/protocol=A", "/stack=tcp/protocol=B"]);
    }

    #[test]
    fn test_index_counts_skipped_siblings() {
        let stack = |builder: TreeBuilder| described(TreeBuilder::new().child("stack", "tcp", builder));
        let original = stack(TreeBuilder::ordered(&["protocol"]).leaf("protocol", "A").proxy("protocol", "P"));
        let incoming = stack(
            TreeBuilder::ordered(&["protocol"])
                .leaf("protocol", "A")
                .proxy("protocol", "P")
                .leaf("protocol", "B"),
        );

        insta::assert_snapshot!(plan(&options(true), &original, &incoming), @"/stack=tcp/protocol=B:add(add-index=2)");
    }

    #[test]
    fn test_index_counts_ignored_top_level_siblings() {
        let original = described(TreeBuilder::ordered(&["chain"]).leaf("chain", "mine"));
        let incoming = described(
            TreeBuilder::ordered(&["chain"])
                .leaf("chain", "mine")
                .leaf("chain", "theirs")
                .leaf("chain", "new"),
        );
        let mut ignored = IgnoredResources::new();
        ignored.ignore_name("chain", "theirs");
        let options = SyncOptions {
            ignored,
            ..SyncOptions::default()
        };

        insta::assert_snapshot!(plan(&options, &original, &incoming), @"/chain=new:add(add-index=2)");
    }
}

mod filtering_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_local_types_ignored_resources_and_proxies_are_left_alone() {
        let original = described(
            TreeBuilder::new()
                .child("host", "primary", TreeBuilder::new().attr("a", json!(1)))
                .child("profile", "legacy", TreeBuilder::new().attr("v", json!(1)))
                .proxy("server", "one"),
        );
        let incoming = described(
            TreeBuilder::new()
                .child("host", "other", TreeBuilder::new())
                .child("profile", "legacy", TreeBuilder::new().attr("v", json!(2)))
                .leaf("profile", "new"),
        );
        let mut ignored = IgnoredResources::new();
        ignored.ignore_name("profile", "legacy");
        let options = SyncOptions {
            ignored,
            ..SyncOptions::default()
        };

        insta::assert_snapshot!(plan(&options, &original, &incoming), @"/profile=new:add()");
    }

    #[test]
    fn test_incoming_proxies_are_not_added() {
        let original = described(TreeBuilder::new());
        let incoming = described(TreeBuilder::new().proxy("server", "one"));
        assert!(plan(&options(true), &original, &incoming).is_empty());
    }
}
