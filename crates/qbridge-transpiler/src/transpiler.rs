//! The conversion engine.

use std::sync::LazyLock;

use tracing::{debug, info_span, warn};

use crate::classify::ProgramTypeRegistry;
use crate::config::TranspilerConfig;
use crate::conversions::register_defaults;
use crate::error::TranspileResult;
use crate::graph::{ConversionEdge, ConversionGraph};
use crate::program::{ProgramType, QuantumProgram};

static DEFAULT: LazyLock<Transpiler> = LazyLock::new(Transpiler::new);

/// Classifies programs and runs them along resolved conversion paths.
///
/// A `Transpiler` is immutable once built; share it freely across threads.
#[derive(Debug, Clone)]
pub struct Transpiler {
    registry: ProgramTypeRegistry,
    graph: ConversionGraph,
}

impl Default for Transpiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Transpiler {
    /// A transpiler with every built-in program type and edge.
    pub fn new() -> Self {
        let mut graph = ConversionGraph::new();
        register_defaults(&mut graph);
        Self {
            registry: ProgramTypeRegistry::with_defaults(),
            graph,
        }
    }

    /// Assemble a transpiler from explicit parts.
    pub fn from_parts(registry: ProgramTypeRegistry, graph: ConversionGraph) -> Self {
        Self { registry, graph }
    }

    /// The default transpiler with bridges and disabled edges applied.
    pub fn from_config(config: &TranspilerConfig) -> Self {
        let mut transpiler = Self::new();
        for conversion in &config.disabled_conversions {
            if !transpiler
                .graph
                .remove_edge(conversion.source, conversion.target)
            {
                warn!(%conversion, "disabled conversion is not registered");
            }
        }
        transpiler.graph.set_bridges(config.bridges.clone());
        transpiler
    }

    /// The process-wide default transpiler.
    pub fn global() -> &'static Transpiler {
        &DEFAULT
    }

    /// Program types and their recognizers.
    pub fn registry(&self) -> &ProgramTypeRegistry {
        &self.registry
    }

    /// Registered conversions and the bridge order.
    pub fn graph(&self) -> &ConversionGraph {
        &self.graph
    }

    /// Tag a program with its type.
    pub fn classify(&self, program: &QuantumProgram) -> TranspileResult<ProgramType> {
        let ty = self.registry.classify(program)?;
        debug!(kind = program.kind(), program_type = %ty, "classified program");
        Ok(ty)
    }

    /// Resolve the edges leading from `source` to `target`.
    pub fn resolve_path(
        &self,
        source: ProgramType,
        target: ProgramType,
    ) -> TranspileResult<Vec<ConversionEdge>> {
        self.graph.resolve_path(source, target)
    }

    /// Convert a program to the target type.
    pub fn convert(
        &self,
        program: QuantumProgram,
        target: ProgramType,
    ) -> TranspileResult<QuantumProgram> {
        let source = self.classify(&program)?;
        let path = self.resolve_path(source, target)?;
        let _span = info_span!("convert", %source, %target, hops = path.len()).entered();
        path.iter()
            .try_fold(program, |program, edge| edge.apply(program))
    }

    /// Convert using a target alias such as `"ionq"` or `"qasm3"`.
    pub fn convert_to(&self, program: QuantumProgram, target: &str) -> TranspileResult<QuantumProgram> {
        self.convert(program, target.parse()?)
    }
}

/// Classify with the default transpiler.
pub fn classify(program: &QuantumProgram) -> TranspileResult<ProgramType> {
    Transpiler::global().classify(program)
}

/// Convert with the default transpiler.
pub fn convert(
    program: impl Into<QuantumProgram>,
    target: ProgramType,
) -> TranspileResult<QuantumProgram> {
    Transpiler::global().convert(program.into(), target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionRef;
    use crate::error::TranspilerError;

    #[test]
    fn test_identity_conversion_returns_input() {
        let source = "OPENQASM 3.0;\nqubit q;\n";
        let out = convert(source, ProgramType::Qasm3).unwrap();
        assert_eq!(out.as_text(), Some(source));
    }

    #[test]
    fn test_convert_to_alias() {
        let out = Transpiler::global()
            .convert_to("OPENQASM 3.0; qubit q; h q;".into(), "ionq")
            .unwrap();
        assert_eq!(out.as_json().unwrap()["qubits"], 1);
    }

    #[test]
    fn test_disabled_conversion_falls_back_to_bridge() {
        let config = TranspilerConfig {
            disabled_conversions: vec![ConversionRef {
                source: ProgramType::Qasm2,
                target: ProgramType::Qasm3,
            }],
            ..TranspilerConfig::default()
        };
        let transpiler = Transpiler::from_config(&config);
        let path = transpiler
            .resolve_path(ProgramType::Qasm2, ProgramType::Qasm3)
            .unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path[0].target, ProgramType::Qbridge);
    }

    #[test]
    fn test_no_bridges_means_direct_only() {
        let config = TranspilerConfig {
            bridges: vec![],
            ..TranspilerConfig::default()
        };
        let transpiler = Transpiler::from_config(&config);
        assert!(matches!(
            transpiler.resolve_path(ProgramType::IonQ, ProgramType::Qasm2),
            Err(TranspilerError::NoConversionPath { .. })
        ));
    }
}
