//! Tests for deployment ordering, graph reduction and traversal queries

use meta_descriptor::{DependsDescriptor, PluginDescriptor};
use meta_graph::{DependencyGraph, Error, PluginDependency};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;

fn req(name: &str) -> PluginDependency {
    PluginDependency::required(name)
}

fn opt(name: &str) -> PluginDependency {
    PluginDependency::optional(name)
}

// ============================================================================
// Deployment order
// ============================================================================

#[test]
fn test_missing_optional_dependency_is_not_an_error() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("A", [opt("B")]);
    assert_eq!(graph.deployment_order().unwrap(), vec!["A"]);
}

#[test]
fn test_missing_required_dependency_fails() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("A", [req("B")]);
    assert_eq!(
        graph.deployment_order().unwrap_err(),
        Error::MissingDependency {
            plugin: "A".to_string(),
            dependency: "B".to_string(),
        }
    );
}

#[test]
fn test_transitive_missing_dependency_names_the_direct_dependent() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("A", [req("B")]);
    graph.add_plugin("B", [req("C")]);
    assert_eq!(
        graph.deployment_order().unwrap_err(),
        Error::MissingDependency {
            plugin: "B".to_string(),
            dependency: "C".to_string(),
        }
    );
}

#[test]
fn test_three_plugin_cycle_reports_every_member() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("A", [req("B")]);
    graph.add_plugin("B", [req("C")]);
    graph.add_plugin("C", [req("A")]);

    let Error::CircularDependency { path } = graph.deployment_order().unwrap_err() else {
        panic!("expected a circular dependency");
    };
    for plugin in ["A", "B", "C"] {
        assert!(path.contains(plugin), "{path} should mention {plugin}");
    }
}

#[test]
fn test_present_optional_dependency_orders_first() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("a-tomcat", [opt("z-apache")]);
    graph.add_plugin("z-apache", []);
    assert_eq!(
        graph.deployment_order().unwrap(),
        vec!["z-apache", "a-tomcat"]
    );
}

#[test]
fn test_realistic_plugin_set() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("Platforms", []);
    graph.add_plugin("JMX", [req("Platforms")]);
    graph.add_plugin("JBossAS", [PluginDependency::new("JMX", true, true)]);
    graph.add_plugin("Hibernate", [req("JMX"), opt("JBossAS")]);
    graph.add_plugin("Tomcat", [req("JMX"), opt("Apache")]);

    assert_eq!(
        graph.deployment_order().unwrap(),
        vec!["Platforms", "JMX", "Tomcat", "JBossAS", "Hibernate"]
    );
    assert_eq!(graph.use_classes_dependency("JBossAS"), Some("JMX"));
    assert_eq!(graph.use_classes_dependency("Hibernate"), Some("JMX"));
}

#[test]
fn test_order_is_reproducible() {
    let build = || {
        let mut graph = DependencyGraph::new();
        for name in ["zebra", "alpha", "mid"] {
            graph.add_plugin(name, []);
        }
        graph.add_plugin("top", [req("mid"), req("zebra")]);
        graph
    };
    let first = build().deployment_order().unwrap();
    let second = build().deployment_order().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_from_descriptors() {
    let mut jmx = PluginDescriptor::new("jmx");
    jmx.depends.push(DependsDescriptor::required("platform"));
    jmx.depends.push(DependsDescriptor::required("jmx"));
    let platform = PluginDescriptor::new("platform");

    let graph = DependencyGraph::from_descriptors([&jmx, &platform]);
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.plugin_dependencies("jmx"), vec!["platform"]);
    assert_eq!(graph.deployment_order().unwrap(), vec!["platform", "jmx"]);
}

// ============================================================================
// Reduction
// ============================================================================

#[test]
fn test_reduce_graph_drops_incomplete_plugins() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("X", [req("missing")]);
    graph.add_plugin("Y", []);
    graph.add_plugin("Z", [req("X")]);
    graph.add_plugin("W", [opt("X"), req("Y")]);

    let reduced = graph.reduce_graph();
    assert!(reduced.contains("Y"));
    assert!(reduced.contains("W"));
    assert!(!reduced.contains("X"));
    assert!(!reduced.contains("Z"));
    assert_eq!(reduced.deployment_order().unwrap(), vec!["Y", "W"]);
}

#[test]
fn test_reduce_graph_drops_cycles() {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("a", [req("b")]);
    graph.add_plugin("b", [req("a")]);
    graph.add_plugin("c", []);

    let reduced = graph.reduce_graph();
    assert_eq!(reduced.plugins().collect::<Vec<_>>(), vec!["c"]);
    assert!(reduced.is_complete().unwrap());
}

// ============================================================================
// Traversal queries
// ============================================================================

fn traversal_graph() -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    graph.add_plugin("platform", []);
    graph.add_plugin("jmx", [req("platform")]);
    graph.add_plugin("jboss", [req("jmx")]);
    graph.add_plugin("hibernate", [opt("jboss"), opt("ghost")]);
    graph.add_plugin("tomcat", [req("jmx")]);
    graph
}

#[rstest]
#[case("platform", &[])]
#[case("jmx", &["platform"])]
#[case("hibernate", &["jboss", "jmx", "platform"])]
fn test_all_dependencies(#[case] plugin: &str, #[case] expected: &[&str]) {
    assert_eq!(traversal_graph().all_dependencies(plugin), expected);
}

#[rstest]
#[case("platform", &["hibernate", "jboss", "jmx", "tomcat"])]
#[case("jboss", &["hibernate"])]
#[case("tomcat", &[])]
fn test_all_dependents(#[case] plugin: &str, #[case] expected: &[&str]) {
    assert_eq!(traversal_graph().all_dependents(plugin), expected);
}

#[test]
fn test_optional_dependents_of_absent_plugin() {
    assert_eq!(traversal_graph().optional_dependents("ghost"), vec!["hibernate"]);
    assert!(traversal_graph().optional_dependents("jmx").is_empty());
}

// ============================================================================
// Properties
// ============================================================================

/// Random acyclic graph: plugin `pN` may only depend on `pM` with `M < N`,
/// plus optional edges to plugins that are never added.
fn acyclic_graph() -> impl Strategy<Value = Vec<Vec<(usize, bool)>>> {
    (1usize..10).prop_flat_map(|n| {
        (0..n)
            .map(|i| proptest::collection::vec((0..i.max(1) + 2, any::<bool>()), 0..4))
            .collect::<Vec<_>>()
    })
}

fn build(layout: &[Vec<(usize, bool)>]) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for (i, deps) in layout.iter().enumerate() {
        let deps = deps.iter().filter_map(|&(target, required)| {
            if target < i {
                Some(PluginDependency::new(format!("p{target}"), required, false))
            } else if !required {
                Some(PluginDependency::optional(format!("ghost{target}")))
            } else {
                None
            }
        });
        graph.add_plugin(format!("p{i}"), deps);
    }
    graph
}

proptest! {
    #[test]
    fn prop_plugins_follow_their_dependencies(layout in acyclic_graph()) {
        let graph = build(&layout);
        let order = graph.deployment_order().unwrap();

        prop_assert_eq!(order.len(), graph.len());
        let position = |name: &str| order.iter().position(|p| p == name);
        for plugin in graph.plugins() {
            let here = position(plugin).unwrap();
            for dep in graph.dependencies(plugin) {
                if let Some(there) = position(&dep.name) {
                    prop_assert!(there < here, "{} must deploy before {}", dep.name, plugin);
                }
            }
        }
    }

    #[test]
    fn prop_acyclic_graph_is_complete(layout in acyclic_graph()) {
        let graph = build(&layout);
        prop_assert!(graph.is_complete().unwrap());
        prop_assert_eq!(graph.reduce_graph().len(), graph.len());
    }
}
