//! Dependency graph builder
//!
//! Kahn's algorithm over the accepted contracts of one batch. Pure,
//! synchronous, deterministic given a fixed input order. A cycle is always
//! detected and reported with exactly the unresolved node names, never
//! silently broken or arbitrarily ordered.

use planforge_core::{AgentContract, DependencyGraph, Edge, Error, Result};
use std::collections::{HashMap, HashSet, VecDeque};

/// Build the cycle-free roadmap over accepted contracts.
pub fn build(contracts: &[AgentContract]) -> Result<DependencyGraph> {
    let pairs: Vec<(String, Vec<String>)> = contracts
        .iter()
        .map(|c| (c.enhancement_area.clone(), c.depends_on.clone()))
        .collect();
    build_pairs(&pairs)
}

/// Build from bare (name, depends_on) pairs. Dependency names that are not
/// nodes in this batch are ignored for graph purposes (they contribute no
/// edge and no in-degree), never treated as satisfied.
pub fn build_pairs(items: &[(String, Vec<String>)]) -> Result<DependencyGraph> {
    let nodes: Vec<String> = items.iter().map(|(name, _)| name.clone()).collect();

    let node_set: HashSet<&str> = nodes.iter().map(String::as_str).collect();
    if node_set.len() != nodes.len() {
        return Err(Error::validation(
            "batch",
            "enhancement_area names are not unique",
        ));
    }

    let mut edges: Vec<Edge> = Vec::new();
    let mut in_degree: HashMap<&str, usize> = nodes.iter().map(|n| (n.as_str(), 0)).collect();
    // dependency -> dependents, lists kept in batch input order
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for (name, depends_on) in items {
        for dep in depends_on {
            if !node_set.contains(dep.as_str()) {
                continue;
            }
            edges.push(Edge::new(dep.clone(), name.clone()));
            *in_degree.get_mut(name.as_str()).unwrap() += 1;
            dependents
                .entry(dep.as_str())
                .or_default()
                .push(name.as_str());
        }
    }

    // Seed with zero-in-degree nodes in batch input order for deterministic
    // tie-breaking.
    let mut queue: VecDeque<&str> = nodes
        .iter()
        .map(String::as_str)
        .filter(|n| in_degree[n] == 0)
        .collect();

    let mut build_order: Vec<String> = Vec::with_capacity(nodes.len());
    while let Some(node) = queue.pop_front() {
        build_order.push(node.to_string());
        if let Some(deps) = dependents.get(node) {
            for &dependent in deps {
                let degree = in_degree.get_mut(dependent).unwrap();
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(dependent);
                }
            }
        }
    }

    if build_order.len() < nodes.len() {
        let ordered: HashSet<&str> = build_order.iter().map(String::as_str).collect();
        let unresolved: Vec<String> = nodes
            .iter()
            .filter(|n| !ordered.contains(n.as_str()))
            .cloned()
            .collect();
        return Err(Error::Cycle { nodes: unresolved });
    }

    Ok(DependencyGraph {
        nodes,
        edges,
        build_order,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use planforge_core::{Governance, ImplementationPlan};

    fn contract(name: &str, deps: &[&str]) -> AgentContract {
        AgentContract {
            enhancement_area: name.into(),
            objective: format!("objective for {}", name),
            implementation_plan: ImplementationPlan {
                modules: vec![format!("{}_mod", name)],
                architecture: "incremental".into(),
            },
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            sources: vec![],
            governance: Governance {
                security: "n/a".into(),
                compliance: "n/a".into(),
                ethics: "n/a".into(),
            },
            validation_criteria: vec![],
            confidence_score: 0.9,
        }
    }

    fn position(order: &[String], name: &str) -> usize {
        order.iter().position(|n| n == name).unwrap()
    }

    #[test]
    fn independent_areas_have_no_edges() {
        let graph = build(&[
            contract("a", &[]),
            contract("b", &[]),
            contract("c", &[]),
        ])
        .unwrap();
        assert_eq!(graph.build_order.len(), 3);
        assert!(graph.edges.is_empty());
        // Input order preserved when nothing constrains it.
        assert_eq!(graph.build_order, vec!["a", "b", "c"]);
    }

    #[test]
    fn chain_orders_dependencies_first() {
        let graph = build(&[
            contract("a", &["b"]),
            contract("b", &["c"]),
            contract("c", &[]),
        ])
        .unwrap();
        assert_eq!(graph.build_order, vec!["c", "b", "a"]);
        assert_eq!(
            graph.edges,
            vec![Edge::new("b", "a"), Edge::new("c", "b")]
        );
    }

    #[test]
    fn every_edge_respected_in_diamond() {
        let graph = build(&[
            contract("top", &[]),
            contract("left", &["top"]),
            contract("right", &["top"]),
            contract("join", &["left", "right"]),
        ])
        .unwrap();
        for edge in &graph.edges {
            assert!(
                position(&graph.build_order, &edge.from)
                    < position(&graph.build_order, &edge.to),
                "edge {:?} violated in {:?}",
                edge,
                graph.build_order
            );
        }
    }

    #[test]
    fn two_cycle_fails_with_exact_set() {
        let err = build(&[contract("a", &["b"]), contract("b", &["a"])]).unwrap_err();
        match err {
            Error::Cycle { nodes } => {
                assert_eq!(nodes, vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn cycle_reports_only_unresolved_subset() {
        let err = build(&[
            contract("standalone", &[]),
            contract("x", &["y"]),
            contract("y", &["x"]),
            contract("after", &["standalone"]),
        ])
        .unwrap_err();
        match err {
            Error::Cycle { nodes } => {
                assert_eq!(nodes, vec!["x".to_string(), "y".to_string()]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let err = build(&[contract("a", &["a"])]).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
    }

    #[test]
    fn out_of_batch_dependency_is_ignored_not_satisfied() {
        let graph = build(&[contract("a", &["not-in-batch"])]).unwrap();
        assert!(graph.edges.is_empty());
        assert_eq!(graph.build_order, vec!["a"]);
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = build(&[contract("a", &[]), contract("a", &[])]).unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn deterministic_for_fixed_input_order() {
        let contracts = vec![
            contract("n1", &[]),
            contract("n2", &["n1"]),
            contract("n3", &["n1"]),
            contract("n4", &["n2", "n3"]),
        ];
        let a = build(&contracts).unwrap();
        let b = build(&contracts).unwrap();
        assert_eq!(a.build_order, b.build_order);
        assert_eq!(a.build_order, vec!["n1", "n2", "n3", "n4"]);
    }
}
