//! Property-based tests for virtual path resolution and fetch-mode
//! classification.
//!
//! These tests use proptest to generate random trees and paths and verify
//! that the navigation invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use std::collections::BTreeMap;
    use std::collections::BTreeSet;
    use std::path::Path;

    use crate::config::{NodeSpec, WorkspaceDocument};
    use crate::fetch_mode::{classify_fetch_mode, FetchMode};
    use crate::path::normalize_lexically;
    use crate::resolver::PathResolver;
    use crate::tree::WorkspaceTree;
    use proptest::prelude::*;
    use tempfile::TempDir;

    /// Two-level trees: unique top-level names, each with unique children.
    fn tree_strategy() -> impl Strategy<Value = BTreeMap<String, BTreeSet<String>>> {
        prop::collection::btree_map(
            "[a-z][a-z0-9-]{0,7}",
            prop::collection::btree_set("[a-z][a-z0-9_]{0,7}", 0..4),
            1..5,
        )
    }

    fn build(shape: &BTreeMap<String, BTreeSet<String>>) -> WorkspaceTree {
        let nodes = shape
            .iter()
            .map(|(name, children)| NodeSpec {
                children: children.iter().map(NodeSpec::new).collect(),
                ..NodeSpec::new(name.clone())
            })
            .collect();
        let document = WorkspaceDocument {
            repos_dir: None,
            nodes,
        };
        WorkspaceTree::from_document(Path::new("/ws/.repotree.yaml"), &document).unwrap()
    }

    // ============================================================================
    // Virtual path properties
    // ============================================================================

    proptest! {
        /// Property: any number of `..` from the root stays at the root
        #[test]
        fn parent_of_root_is_clamped(ups in 1usize..20, absolute in any::<bool>()) {
            let mut tree = build(&BTreeMap::from([("a".to_string(), BTreeSet::new())]));
            let path = format!("{}{}", if absolute { "/" } else { "" }, vec![".."; ups].join("/"));
            let root = tree.root();
            prop_assert_eq!(tree.resolve(&path).unwrap(), root);
        }

        /// Property: every node's rendered path resolves back to the node
        #[test]
        fn virtual_path_round_trips(shape in tree_strategy()) {
            let mut tree = build(&shape);
            let ids: Vec<_> = tree.descendants(tree.root()).into_iter().map(|(id, _)| id).collect();
            for id in ids {
                let path = tree.virtual_path(id);
                prop_assert_eq!(tree.resolve(&path).unwrap(), id);
                prop_assert_eq!(tree.resolve(&format!("~{}", path.trim_end_matches('/'))).unwrap(), id);
            }
        }

        /// Property: climbing to the root and back down lands on the same node
        #[test]
        fn relative_climb_returns_to_node(shape in tree_strategy(), extra_ups in 0usize..3) {
            let mut tree = build(&shape);
            let ids: Vec<_> = tree.descendants(tree.root()).into_iter().map(|(id, _)| id).collect();
            for id in ids {
                let depth = tree.depth(id);
                let ups = vec![".."; depth + extra_ups].join("/");
                let relative = if depth == 0 {
                    ".".to_string()
                } else {
                    format!("{}/{}", ups, tree.segments(id).join("/"))
                };
                prop_assert_eq!(tree.resolve_virtual_path(id, &relative).unwrap(), id);
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Property: physical_to_virtual inverts the physical layout
        #[test]
        fn physical_path_round_trips(shape in tree_strategy()) {
            let temp_dir = TempDir::new().unwrap();
            let mut tree = build(&shape);
            let resolver = PathResolver::new(temp_dir.path());
            let ids: Vec<_> = tree.descendants(tree.root()).into_iter().map(|(id, _)| id).collect();
            for id in ids {
                let physical = resolver.physical_path(&tree, id);
                prop_assert_eq!(resolver.physical_to_virtual(&mut tree, &physical).unwrap(), Some(id));
            }
        }
    }

    // ============================================================================
    // Fetch mode properties
    // ============================================================================

    proptest! {
        /// Property: a marker suffix on the repository name makes a node eager
        #[test]
        fn marker_suffix_is_eager(
            stem in "[a-z][a-z0-9]{0,10}",
            marker in prop::sample::select(vec!["munorepo", "monorepo", "MonoRepo"]),
            sep in prop::sample::select(vec!["-", "_", "."]),
            git_suffix in any::<bool>(),
        ) {
            let url = format!(
                "git@github.com:acme/{}{}{}{}",
                stem, sep, marker, if git_suffix { ".git" } else { "" }
            );
            prop_assert_eq!(classify_fetch_mode(Some(&url), None), FetchMode::Eager);
        }

        /// Property: an explicit mode always wins over the URL
        #[test]
        fn explicit_mode_wins(url in "[a-z:/.@-]{0,40}", eager in any::<bool>()) {
            let explicit = if eager { FetchMode::Eager } else { FetchMode::Lazy };
            prop_assert_eq!(classify_fetch_mode(Some(&url), Some(explicit)), explicit);
        }

        /// Property: names without a marker token stay lazy
        #[test]
        fn plain_names_are_lazy(stem in "[a-l][a-l0-9-]{0,12}") {
            let url = format!("https://example.com/acme/{}.git", stem);
            prop_assert_eq!(classify_fetch_mode(Some(&url), None), FetchMode::Lazy);
        }

        /// Property: lexical normalization is idempotent
        #[test]
        fn normalize_is_idempotent(parts in prop::collection::vec(prop::sample::select(vec!["a", "b", ".", ".."]), 0..10)) {
            let path = format!("/{}", parts.join("/"));
            let once = normalize_lexically(Path::new(&path));
            let twice = normalize_lexically(&once);
            prop_assert_eq!(once, twice);
        }
    }
}
