//! Dependencies between par instruments.
//!
//! Par key `A` depends on par key `B` when the par rate of `A` moves with
//! the zero factor that `B` calibrates. Converting a par shock on `A`
//! therefore needs the zero shift of `B` first.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::par::ParSensitivities;
use crate::scenarios::RiskFactorKey;

/// Result of [`DependencyGraph::topological_order`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyOrder {
    /// Keys in an order where every key follows its dependencies.
    pub ordered: Vec<RiskFactorKey>,
    /// Keys on or downstream of a cycle.
    pub unresolved: BTreeSet<RiskFactorKey>,
}

impl DependencyOrder {
    /// Whether every key was ordered.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Directed graph over par keys.
///
/// Self-dependencies are dropped: a par rate depending on its own zero
/// pillar is the expected diagonal of the Jacobian, not an ordering
/// constraint.
///
/// # Examples
///
/// ```
/// use pricer_risk::scenarios::RiskFactorKey;
/// use pricer_risk::stress::DependencyGraph;
///
/// let short = RiskFactorKey::discount("EUR", 0);
/// let long = RiskFactorKey::discount("EUR", 1);
///
/// let mut graph = DependencyGraph::new();
/// graph.add_edge(&short, &long);
///
/// let order = graph.topological_order();
/// assert_eq!(order.ordered, vec![short, long]);
/// assert!(order.is_complete());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    // key -> keys it depends on
    dependencies: BTreeMap<RiskFactorKey, BTreeSet<RiskFactorKey>>,
}

impl DependencyGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Graph implied by par sensitivities.
    ///
    /// Every par key is a node. `A` depends on `B` when `B` is itself a par
    /// key and `|∂A/∂B| > threshold`.
    ///
    /// # Arguments
    ///
    /// * `sensitivities` - (par key, zero key) → ∂par/∂zero
    /// * `threshold` - Sensitivities at or below this magnitude are ignored
    pub fn from_sensitivities(sensitivities: &ParSensitivities, threshold: f64) -> Self {
        let mut graph = Self::new();
        for (par_key, _) in sensitivities.keys() {
            graph.add_node(par_key.clone());
        }
        for ((par_key, zero_key), value) in sensitivities {
            if par_key != zero_key
                && value.abs() > threshold
                && graph.dependencies.contains_key(zero_key)
            {
                graph.add_edge(zero_key, par_key);
            }
        }
        graph
    }

    /// Adds a key without dependencies.
    pub fn add_node(&mut self, key: RiskFactorKey) {
        self.dependencies.entry(key).or_default();
    }

    /// Records that `dependent` needs `dependency` first. Both keys become
    /// nodes; self-loops are ignored.
    pub fn add_edge(&mut self, dependency: &RiskFactorKey, dependent: &RiskFactorKey) {
        self.add_node(dependency.clone());
        if dependency == dependent {
            return;
        }
        self.dependencies
            .entry(dependent.clone())
            .or_default()
            .insert(dependency.clone());
    }

    /// Keys `key` depends on.
    pub fn dependencies(&self, key: &RiskFactorKey) -> Option<&BTreeSet<RiskFactorKey>> {
        self.dependencies.get(key)
    }

    /// Whether `key` is a node.
    pub fn contains(&self, key: &RiskFactorKey) -> bool {
        self.dependencies.contains_key(key)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Whether the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(BTreeSet::len).sum()
    }

    /// Orders keys so that dependencies come first (Kahn's algorithm).
    ///
    /// Keys that become ready at the same time are emitted in key order,
    /// so the result is deterministic. On a cycle the sort stops once no
    /// key is ready; the remaining keys are returned in
    /// [`DependencyOrder::unresolved`].
    pub fn topological_order(&self) -> DependencyOrder {
        let mut in_degree: BTreeMap<&RiskFactorKey, usize> = BTreeMap::new();
        let mut dependents: BTreeMap<&RiskFactorKey, Vec<&RiskFactorKey>> = BTreeMap::new();

        for (key, deps) in &self.dependencies {
            in_degree.insert(key, deps.len());
            for dep in deps {
                dependents.entry(dep).or_default().push(key);
            }
        }

        let mut queue: VecDeque<&RiskFactorKey> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(&key, _)| key)
            .collect();

        let mut ordered = Vec::with_capacity(self.dependencies.len());
        while let Some(current) = queue.pop_front() {
            ordered.push(current.clone());
            for &dependent in dependents.get(current).into_iter().flatten() {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(dependent);
                    }
                }
            }
        }

        let unresolved = in_degree
            .into_iter()
            .filter(|(_, degree)| *degree > 0)
            .map(|(key, _)| key.clone())
            .collect();

        DependencyOrder { ordered, unresolved }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(i: usize) -> RiskFactorKey {
        RiskFactorKey::discount("EUR", i)
    }

    fn position(order: &[RiskFactorKey], key: &RiskFactorKey) -> usize {
        order.iter().position(|k| k == key).unwrap()
    }

    // ========================================
    // Construction
    // ========================================

    #[test]
    fn test_from_sensitivities_ignores_diagonal_and_noise() {
        let sensitivities: ParSensitivities = [
            ((key(0), key(0)), 1.0),
            ((key(1), key(0)), -0.5),
            ((key(1), key(1)), 1.0),
            ((key(0), key(1)), 1e-14),
        ]
        .into_iter()
        .collect();

        let graph = DependencyGraph::from_sensitivities(&sensitivities, 1e-10);

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert!(graph.dependencies(&key(0)).unwrap().is_empty());
        assert!(graph.dependencies(&key(1)).unwrap().contains(&key(0)));
    }

    #[test]
    fn test_zero_key_without_par_instrument_is_not_a_node() {
        let usd_zero = RiskFactorKey::discount("USD", 0);
        let cds = RiskFactorKey::survival("CPTY_A", 0);
        let sensitivities: ParSensitivities =
            [((cds.clone(), cds.clone()), 0.9), ((cds.clone(), usd_zero.clone()), 0.01)]
                .into_iter()
                .collect();

        let graph = DependencyGraph::from_sensitivities(&sensitivities, 1e-10);

        assert_eq!(graph.len(), 1);
        assert!(!graph.contains(&usd_zero));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_self_loop_ignored() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&key(0), &key(0));
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.topological_order().is_complete());
    }

    // ========================================
    // Ordering
    // ========================================

    #[test]
    fn test_chain_order() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&key(1), &key(2));
        graph.add_edge(&key(0), &key(1));
        graph.add_node(key(3));

        let order = graph.topological_order();

        assert!(order.is_complete());
        assert_eq!(order.ordered, vec![key(0), key(3), key(1), key(2)]);
    }

    #[test]
    fn test_cycle_terminates_with_unresolved() {
        let mut graph = DependencyGraph::new();
        graph.add_node(key(0));
        graph.add_edge(&key(1), &key(2));
        graph.add_edge(&key(2), &key(1));
        graph.add_edge(&key(2), &key(3));

        let order = graph.topological_order();

        assert_eq!(order.ordered, vec![key(0)]);
        assert_eq!(order.unresolved, [key(1), key(2), key(3)].into_iter().collect());
        assert!(!order.is_complete());
    }

    #[test]
    fn test_empty_graph() {
        let order = DependencyGraph::new().topological_order();
        assert!(order.ordered.is_empty());
        assert!(order.is_complete());
    }

    proptest! {
        #[test]
        fn prop_acyclic_graph_fully_ordered(
            n in 1usize..12,
            edges in proptest::collection::vec((0usize..12, 0usize..12), 0..40),
        ) {
            let mut graph = DependencyGraph::new();
            for i in 0..n {
                graph.add_node(key(i));
            }
            // lower index -> higher index keeps the graph acyclic
            for &(a, b) in &edges {
                let (a, b) = (a % n, b % n);
                if a < b {
                    graph.add_edge(&key(a), &key(b));
                }
            }

            let order = graph.topological_order();

            prop_assert!(order.is_complete());
            prop_assert_eq!(order.ordered.len(), n);
            for (node, deps) in &graph.dependencies {
                let at = position(&order.ordered, node);
                for dep in deps {
                    prop_assert!(position(&order.ordered, dep) < at);
                }
            }
        }

        #[test]
        fn prop_cycle_emits_fewer_nodes(n in 2usize..12, start in 0usize..12) {
            let mut graph = DependencyGraph::new();
            for i in 0..n {
                graph.add_edge(&key(i), &key((i + 1) % n));
            }
            graph.add_node(key(n + start));

            let order = graph.topological_order();

            prop_assert!(order.ordered.len() < graph.len());
            prop_assert_eq!(order.ordered.len() + order.unresolved.len(), graph.len());
        }
    }
}
