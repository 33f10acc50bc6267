//! Topological analysis of the processor network.
//!
//! Provides:
//! - Evaluation order over non-exempt connections
//! - Cycle detection naming every processor on a cycle
//! - Downstream closures for incremental evaluation

use crate::core::error::{NetworkError, NetworkResult, ProcessorId};
use crate::network::structure::ProcessorNetwork;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Analyzer for network topology.
pub struct TopologyAnalyzer<'a> {
    network: &'a ProcessorNetwork,
}

impl<'a> TopologyAnalyzer<'a> {
    pub fn new(network: &'a ProcessorNetwork) -> Self {
        Self { network }
    }

    /// Build the dependency graph. Nodes are added in processor insertion
    /// order; coprocessor and feedback connections are left out.
    fn dependency_graph(&self) -> (DiGraph<ProcessorId, ()>, HashMap<ProcessorId, NodeIndex>) {
        let mut graph = DiGraph::new();
        let mut index = HashMap::new();
        for id in self.network.processor_ids() {
            index.insert(id, graph.add_node(id));
        }
        for connection in self.network.connections().iter().filter(|c| !c.exempt) {
            if let (Some(&from), Some(&to)) = (
                index.get(&connection.from.processor),
                index.get(&connection.to.processor),
            ) {
                graph.update_edge(from, to, ());
            }
        }
        (graph, index)
    }

    /// Processors ordered so that every producer comes before its consumers.
    pub fn evaluation_order(&self) -> NetworkResult<Vec<ProcessorId>> {
        let (graph, _) = self.dependency_graph();
        match toposort(&graph, None) {
            Ok(order) => Ok(order.into_iter().map(|n| graph[n]).collect()),
            Err(_) => Err(NetworkError::NetworkCycle {
                processors: self
                    .cycle_members()
                    .into_iter()
                    .map(|id| self.network.name_of(id))
                    .collect(),
            }),
        }
    }

    /// Processors taking part in a cycle, in insertion order.
    pub fn cycle_members(&self) -> Vec<ProcessorId> {
        let (graph, _) = self.dependency_graph();
        let mut members: HashSet<ProcessorId> = HashSet::new();
        for component in tarjan_scc(&graph) {
            let cyclic = component.len() > 1
                || component
                    .first()
                    .is_some_and(|&n| graph.contains_edge(n, n));
            if cyclic {
                members.extend(component.into_iter().map(|n| graph[n]));
            }
        }
        self.network
            .processor_ids()
            .into_iter()
            .filter(|id| members.contains(id))
            .collect()
    }

    pub fn has_cycle(&self) -> bool {
        !self.cycle_members().is_empty()
    }

    /// `roots` and everything reachable from them over any connection.
    pub fn downstream_closure(
        &self,
        roots: impl IntoIterator<Item = ProcessorId>,
    ) -> HashSet<ProcessorId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<ProcessorId> = roots.into_iter().collect();
        while let Some(current) = queue.pop_front() {
            if visited.insert(current) {
                for connection in self.network.connections_from(current) {
                    queue.push_back(connection.to.processor);
                }
            }
        }
        visited
    }

    /// Processors `id` reads from directly, excluding exempt connections.
    pub fn dependencies(&self, id: ProcessorId) -> Vec<ProcessorId> {
        let mut deps: Vec<ProcessorId> = Vec::new();
        for connection in self.network.connections_to(id).filter(|c| !c.exempt) {
            if !deps.contains(&connection.from.processor) {
                deps.push(connection.from.processor);
            }
        }
        deps
    }

    /// Processors without non-exempt inputs.
    pub fn sources(&self) -> Vec<ProcessorId> {
        self.network
            .processor_ids()
            .into_iter()
            .filter(|&id| self.dependencies(id).is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::structure::ProcessorNetwork;
    use crate::registry::Registry;

    fn passthrough_chain(names: &[&str]) -> (Registry, ProcessorNetwork, Vec<ProcessorId>) {
        let registry = Registry::with_builtins();
        let mut network = ProcessorNetwork::new();
        let ids: Vec<ProcessorId> = names
            .iter()
            .map(|name| network.add(&registry, "Passthrough", Some(name)).unwrap())
            .collect();
        for pair in ids.windows(2) {
            network.connect(pair[0], "output", pair[1], "input").unwrap();
        }
        (registry, network, ids)
    }

    #[test]
    fn test_linear_order() {
        let registry = Registry::with_builtins();
        let mut network = ProcessorNetwork::new();
        // Inserted out of data-flow order on purpose
        let sharpen = network.add(&registry, "Sharpen", None).unwrap();
        let blur = network.add(&registry, "Blur", None).unwrap();
        network.connect(blur, "image.output", sharpen, "image.input").unwrap();

        let order = TopologyAnalyzer::new(&network).evaluation_order().unwrap();
        assert_eq!(order, vec![blur, sharpen]);
    }

    #[test]
    fn test_cycle_names_members() {
        let (registry, mut network, ids) = passthrough_chain(&["A", "B", "C"]);
        let d = network.add(&registry, "Passthrough", Some("D")).unwrap();
        network.connect(ids[2], "output", d, "input").unwrap();
        network.connect(ids[2], "output", ids[0], "input").unwrap();

        let err = TopologyAnalyzer::new(&network).evaluation_order().unwrap_err();
        assert_eq!(
            err,
            NetworkError::NetworkCycle {
                processors: vec!["A".into(), "B".into(), "C".into()]
            }
        );
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let (_registry, mut network, ids) = passthrough_chain(&["A"]);
        network.connect(ids[0], "output", ids[0], "input").unwrap();
        assert_eq!(TopologyAnalyzer::new(&network).cycle_members(), ids);
    }

    #[test]
    fn test_downstream_closure() {
        let (_registry, network, ids) = passthrough_chain(&["A", "B", "C"]);
        let analyzer = TopologyAnalyzer::new(&network);

        let closure = analyzer.downstream_closure([ids[1]]);
        assert_eq!(closure.len(), 2);
        assert!(closure.contains(&ids[1]) && closure.contains(&ids[2]));
        assert_eq!(analyzer.sources(), vec![ids[0]]);
        assert_eq!(analyzer.dependencies(ids[2]), vec![ids[1]]);
    }
}
