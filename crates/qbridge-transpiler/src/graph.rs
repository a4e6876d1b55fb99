//! The conversion graph and path resolution.
//!
//! Nodes are program types; edges carry one-hop converter functions.
//! Resolution is deliberately shallow: identity, then a direct edge, then
//! `source -> bridge -> target` for each configured bridge in order.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::{TranspileResult, TranspilerError};
use crate::program::{ProgramType, QuantumProgram};

/// A one-hop converter.
pub type ConvertFn = fn(QuantumProgram) -> TranspileResult<QuantumProgram>;

/// A registered edge.
#[derive(Debug, Clone, Copy)]
pub struct ConversionEdge {
    /// Type the converter accepts.
    pub source: ProgramType,
    /// Type the converter produces.
    pub target: ProgramType,
    /// The converter itself.
    pub convert: ConvertFn,
}

impl ConversionEdge {
    /// `(source, target)`.
    pub fn endpoints(&self) -> (ProgramType, ProgramType) {
        (self.source, self.target)
    }

    /// Run the converter.
    pub fn apply(&self, program: QuantumProgram) -> TranspileResult<QuantumProgram> {
        debug!(source = %self.source, target = %self.target, "applying conversion edge");
        (self.convert)(program)
    }
}

/// Directed graph of program types and converters.
#[derive(Debug, Clone)]
pub struct ConversionGraph {
    graph: DiGraph<ProgramType, ConvertFn>,
    nodes: FxHashMap<ProgramType, NodeIndex>,
    bridges: Vec<ProgramType>,
}

impl Default for ConversionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionGraph {
    /// An empty graph bridged through [`ProgramType::Qbridge`].
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            nodes: FxHashMap::default(),
            bridges: vec![ProgramType::Qbridge],
        }
    }

    fn node(&mut self, ty: ProgramType) -> NodeIndex {
        if let Some(&index) = self.nodes.get(&ty) {
            return index;
        }
        let index = self.graph.add_node(ty);
        self.nodes.insert(ty, index);
        index
    }

    /// Register an edge, replacing any existing converter for the pair.
    pub fn add_edge(&mut self, source: ProgramType, target: ProgramType, convert: ConvertFn) {
        let a = self.node(source);
        let b = self.node(target);
        self.graph.update_edge(a, b, convert);
    }

    /// Remove an edge. Returns whether it existed.
    pub fn remove_edge(&mut self, source: ProgramType, target: ProgramType) -> bool {
        let (Some(&a), Some(&b)) = (self.nodes.get(&source), self.nodes.get(&target)) else {
            return false;
        };
        match self.graph.find_edge(a, b) {
            Some(edge) => self.graph.remove_edge(edge).is_some(),
            None => false,
        }
    }

    /// The direct edge between two types, if registered.
    pub fn edge(&self, source: ProgramType, target: ProgramType) -> Option<ConversionEdge> {
        let a = *self.nodes.get(&source)?;
        let b = *self.nodes.get(&target)?;
        let edge = self.graph.find_edge(a, b)?;
        Some(ConversionEdge {
            source,
            target,
            convert: self.graph[edge],
        })
    }

    /// Every registered edge.
    pub fn edges(&self) -> Vec<ConversionEdge> {
        self.graph
            .edge_references()
            .map(|edge| ConversionEdge {
                source: self.graph[edge.source()],
                target: self.graph[edge.target()],
                convert: *edge.weight(),
            })
            .collect()
    }

    /// Bridge types in the order they are tried.
    pub fn bridges(&self) -> &[ProgramType] {
        &self.bridges
    }

    /// Replace the bridge list. Order decides ties between equally
    /// short routes.
    pub fn set_bridges(&mut self, bridges: Vec<ProgramType>) {
        self.bridges = bridges;
    }

    /// Resolve a conversion request into at most two edges.
    pub fn resolve_path(
        &self,
        source: ProgramType,
        target: ProgramType,
    ) -> TranspileResult<Vec<ConversionEdge>> {
        if source == target {
            return Ok(vec![]);
        }
        if let Some(edge) = self.edge(source, target) {
            return Ok(vec![edge]);
        }
        for &bridge in &self.bridges {
            if bridge == source || bridge == target {
                continue;
            }
            if let (Some(first), Some(second)) =
                (self.edge(source, bridge), self.edge(bridge, target))
            {
                debug!(%source, %target, %bridge, "resolved path through bridge");
                return Ok(vec![first, second]);
            }
        }
        Err(TranspilerError::NoConversionPath {
            from: source,
            to: target,
        })
    }

    /// Whether `resolve_path` would succeed.
    pub fn is_convertible(&self, source: ProgramType, target: ProgramType) -> bool {
        self.resolve_path(source, target).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(program: QuantumProgram) -> TranspileResult<QuantumProgram> {
        Ok(program)
    }

    fn endpoints(path: &[ConversionEdge]) -> Vec<(ProgramType, ProgramType)> {
        path.iter().map(ConversionEdge::endpoints).collect()
    }

    #[test]
    fn test_identity_path() {
        let graph = ConversionGraph::new();
        assert!(
            graph
                .resolve_path(ProgramType::Qasm2, ProgramType::Qasm2)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_direct_edge_preferred() {
        let mut graph = ConversionGraph::new();
        graph.add_edge(ProgramType::Qasm2, ProgramType::Qasm3, identity);
        graph.add_edge(ProgramType::Qasm2, ProgramType::Qbridge, identity);
        graph.add_edge(ProgramType::Qbridge, ProgramType::Qasm3, identity);

        let path = graph
            .resolve_path(ProgramType::Qasm2, ProgramType::Qasm3)
            .unwrap();
        assert_eq!(endpoints(&path), vec![(ProgramType::Qasm2, ProgramType::Qasm3)]);
    }

    #[test]
    fn test_bridge_path() {
        let mut graph = ConversionGraph::new();
        graph.add_edge(ProgramType::IonQ, ProgramType::Qbridge, identity);
        graph.add_edge(ProgramType::Qbridge, ProgramType::Qasm2, identity);

        let path = graph
            .resolve_path(ProgramType::IonQ, ProgramType::Qasm2)
            .unwrap();
        assert_eq!(
            endpoints(&path),
            vec![
                (ProgramType::IonQ, ProgramType::Qbridge),
                (ProgramType::Qbridge, ProgramType::Qasm2)
            ]
        );
    }

    #[test]
    fn test_bridge_order_breaks_ties() {
        let mut graph = ConversionGraph::new();
        for bridge in [ProgramType::Qbridge, ProgramType::Qasm3] {
            graph.add_edge(ProgramType::IonQ, bridge, identity);
            graph.add_edge(bridge, ProgramType::Qasm2, identity);
        }
        graph.set_bridges(vec![ProgramType::Qasm3, ProgramType::Qbridge]);

        let path = graph
            .resolve_path(ProgramType::IonQ, ProgramType::Qasm2)
            .unwrap();
        assert_eq!(path[0].target, ProgramType::Qasm3);
    }

    #[test]
    fn test_no_search_beyond_two_hops() {
        let mut graph = ConversionGraph::new();
        graph.add_edge(ProgramType::Qasm2, ProgramType::Qasm3, identity);
        graph.add_edge(ProgramType::Qasm3, ProgramType::OpenQasm3, identity);
        graph.add_edge(ProgramType::OpenQasm3, ProgramType::Qbridge, identity);

        let err = graph
            .resolve_path(ProgramType::Qasm2, ProgramType::Qbridge)
            .unwrap_err();
        assert!(matches!(
            err,
            TranspilerError::NoConversionPath {
                from: ProgramType::Qasm2,
                to: ProgramType::Qbridge
            }
        ));
    }

    #[test]
    fn test_remove_edge() {
        let mut graph = ConversionGraph::new();
        graph.add_edge(ProgramType::Qasm2, ProgramType::Qasm3, identity);
        graph.add_edge(ProgramType::Qasm2, ProgramType::Qasm3, identity);
        assert_eq!(graph.edges().len(), 1);

        assert!(graph.remove_edge(ProgramType::Qasm2, ProgramType::Qasm3));
        assert!(!graph.remove_edge(ProgramType::Qasm2, ProgramType::Qasm3));
        assert!(!graph.is_convertible(ProgramType::Qasm2, ProgramType::Qasm3));
    }
}
