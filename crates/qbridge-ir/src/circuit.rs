//! High-level circuit builder API.
//!
//! [`Circuit`] is the in-memory bridge representation: every program
//! format converts to and from it.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::error::{IrError, IrResult};
use crate::gate::{Gate, GateSet, StandardGate};
use crate::instruction::{Instruction, InstructionKind};
use crate::normalized::{
    BARRIER, GPHASE, MEASURE, NormalizedInstruction, NormalizedProgram, RESET,
};
use crate::parameter::ParameterExpression;
use crate::qubit::{ClbitId, QubitId};

/// A quantum circuit over a dense register of qubits and classical bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    /// Name of the circuit.
    name: String,
    /// Number of qubits.
    num_qubits: u32,
    /// Number of classical bits.
    num_clbits: u32,
    /// Instructions in program order.
    instructions: Vec<Instruction>,
}

impl Circuit {
    /// Create a new empty circuit.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_size(name, 0, 0)
    }

    /// Create a circuit with a given number of qubits and classical bits.
    pub fn with_size(name: impl Into<String>, num_qubits: u32, num_clbits: u32) -> Self {
        Self {
            name: name.into(),
            num_qubits,
            num_clbits,
            instructions: vec![],
        }
    }

    /// Add a quantum register; returns the new qubit ids.
    pub fn add_qreg(&mut self, size: u32) -> Vec<QubitId> {
        let start = self.num_qubits;
        self.num_qubits += size;
        (start..self.num_qubits).map(QubitId).collect()
    }

    /// Add a classical register; returns the new bit ids.
    pub fn add_creg(&mut self, size: u32) -> Vec<ClbitId> {
        let start = self.num_clbits;
        self.num_clbits += size;
        (start..self.num_clbits).map(ClbitId).collect()
    }

    /// Append an instruction after checking its operands.
    pub fn apply(&mut self, instruction: Instruction) -> IrResult<&mut Self> {
        self.validate(&instruction)?;
        self.instructions.push(instruction);
        Ok(self)
    }

    fn validate(&self, instruction: &Instruction) -> IrResult<()> {
        let gate_name = instruction.as_gate().map(Gate::name);

        if let InstructionKind::Gate(gate) = &instruction.kind {
            let expected = gate.num_qubits();
            let got = instruction.qubits.len() as u32;
            if expected != got {
                return Err(IrError::QubitCountMismatch {
                    gate_name: gate.name(),
                    expected,
                    got,
                });
            }
        }

        for (i, &qubit) in instruction.qubits.iter().enumerate() {
            if qubit.0 >= self.num_qubits {
                return Err(IrError::QubitOutOfRange {
                    qubit,
                    num_qubits: self.num_qubits,
                    gate_name,
                });
            }
            if instruction.qubits[..i].contains(&qubit) {
                return Err(IrError::DuplicateQubit { qubit, gate_name });
            }
        }

        for clbit in &instruction.clbits {
            if clbit.0 >= self.num_clbits {
                return Err(IrError::ClbitOutOfRange {
                    clbit: clbit.0,
                    num_clbits: self.num_clbits,
                });
            }
        }
        Ok(())
    }

    // =========================================================================
    // Single-qubit gates
    // =========================================================================

    /// Apply Hadamard gate.
    pub fn h(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::H, qubit))
    }

    /// Apply Pauli-X gate.
    pub fn x(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::X, qubit))
    }

    /// Apply Pauli-Y gate.
    pub fn y(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Y, qubit))
    }

    /// Apply Pauli-Z gate.
    pub fn z(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::Z, qubit))
    }

    /// Apply S gate.
    pub fn s(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::S, qubit))
    }

    /// Apply T gate.
    pub fn t(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::T, qubit))
    }

    /// Apply sqrt(X) gate.
    pub fn sx(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(StandardGate::SX, qubit))
    }

    /// Apply Rx rotation.
    pub fn rx(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rx(theta.into()),
            qubit,
        ))
    }

    /// Apply Ry rotation.
    pub fn ry(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Ry(theta.into()),
            qubit,
        ))
    }

    /// Apply Rz rotation.
    pub fn rz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::Rz(theta.into()),
            qubit,
        ))
    }

    /// Apply universal U(θ, φ, λ) gate.
    pub fn u(
        &mut self,
        theta: impl Into<ParameterExpression>,
        phi: impl Into<ParameterExpression>,
        lambda: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::U(theta.into(), phi.into(), lambda.into()),
            qubit,
        ))
    }

    // =========================================================================
    // Multi-qubit gates
    // =========================================================================

    /// Apply CNOT gate.
    pub fn cx(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CX, control, target))
    }

    /// Apply CZ gate.
    pub fn cz(&mut self, control: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::CZ, control, target))
    }

    /// Apply SWAP gate.
    pub fn swap(&mut self, q1: QubitId, q2: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(StandardGate::Swap, q1, q2))
    }

    /// Apply controlled-phase gate.
    pub fn cp(
        &mut self,
        theta: impl Into<ParameterExpression>,
        control: QubitId,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::CP(theta.into()),
            control,
            target,
        ))
    }

    /// Apply ZZ rotation.
    pub fn rzz(
        &mut self,
        theta: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::RZZ(theta.into()),
            q1,
            q2,
        ))
    }

    /// Apply Toffoli gate.
    pub fn ccx(&mut self, c1: QubitId, c2: QubitId, target: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(StandardGate::CCX, [c1, c2, target]))
    }

    /// Apply X controlled on every qubit in `controls`.
    pub fn mcx(
        &mut self,
        controls: impl IntoIterator<Item = QubitId>,
        target: QubitId,
    ) -> IrResult<&mut Self> {
        let mut qubits: Vec<_> = controls.into_iter().collect();
        let gate = Gate::Standard(StandardGate::X).controlled(qubits.len() as u32);
        qubits.push(target);
        self.apply(Instruction::gate(gate, qubits))
    }

    // =========================================================================
    // Trapped-ion native gates
    // =========================================================================

    /// Apply GPI(φ), φ in turns.
    pub fn gpi(
        &mut self,
        phase: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::GPI(phase.into()),
            qubit,
        ))
    }

    /// Apply GPI2(φ), φ in turns.
    pub fn gpi2(
        &mut self,
        phase: impl Into<ParameterExpression>,
        qubit: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::single_qubit_gate(
            StandardGate::GPI2(phase.into()),
            qubit,
        ))
    }

    /// Apply MS(φ0, φ1, θ).
    pub fn ms(
        &mut self,
        phase0: impl Into<ParameterExpression>,
        phase1: impl Into<ParameterExpression>,
        angle: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::MS(phase0.into(), phase1.into(), angle.into()),
            q1,
            q2,
        ))
    }

    /// Apply native ZZ(θ).
    pub fn zz(
        &mut self,
        angle: impl Into<ParameterExpression>,
        q1: QubitId,
        q2: QubitId,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::two_qubit_gate(
            StandardGate::ZZ(angle.into()),
            q1,
            q2,
        ))
    }

    // =========================================================================
    // Other operations
    // =========================================================================

    /// Apply an arbitrary gate.
    pub fn gate(
        &mut self,
        gate: impl Into<Gate>,
        qubits: impl IntoIterator<Item = QubitId>,
    ) -> IrResult<&mut Self> {
        self.apply(Instruction::gate(gate, qubits))
    }

    /// Measure a qubit to a classical bit.
    pub fn measure(&mut self, qubit: QubitId, clbit: ClbitId) -> IrResult<&mut Self> {
        self.apply(Instruction::measure(qubit, clbit))
    }

    /// Measure all qubits to corresponding classical bits, growing the
    /// classical register if needed.
    pub fn measure_all(&mut self) -> IrResult<&mut Self> {
        self.num_clbits = self.num_clbits.max(self.num_qubits);
        let instruction = Instruction::measure_all(
            (0..self.num_qubits).map(QubitId),
            (0..self.num_qubits).map(ClbitId),
        )?;
        self.apply(instruction)
    }

    /// Reset a qubit to |0⟩.
    pub fn reset(&mut self, qubit: QubitId) -> IrResult<&mut Self> {
        self.apply(Instruction::reset(qubit))
    }

    /// Apply a barrier to specified qubits.
    pub fn barrier(&mut self, qubits: impl IntoIterator<Item = QubitId>) -> IrResult<&mut Self> {
        self.apply(Instruction::barrier(qubits))
    }

    // =========================================================================
    // Normalized instruction streams
    // =========================================================================

    /// Build a circuit from an extracted instruction stream.
    ///
    /// Uncontrolled single-qubit gates with several targets expand to one
    /// instruction per target, in target order.
    pub fn from_normalized(program: &NormalizedProgram) -> IrResult<Self> {
        let mut circuit = Self::with_size("circuit", program.num_qubits, program.num_clbits);
        for inst in &program.instructions {
            circuit.push_normalized(inst)?;
        }
        Ok(circuit)
    }

    fn push_normalized(&mut self, inst: &NormalizedInstruction) -> IrResult<()> {
        match inst.gate.as_str() {
            MEASURE if inst.clbits.is_empty() => {
                // Bare `measure q;` discards the outcome.
                self.apply(Instruction {
                    kind: InstructionKind::Measure,
                    qubits: inst.qubits().into_iter().map(QubitId).collect(),
                    clbits: vec![],
                })?;
            }
            MEASURE => {
                let instruction = Instruction::measure_all(
                    inst.qubits().into_iter().map(QubitId),
                    inst.clbits.iter().copied().map(ClbitId),
                )?;
                self.apply(instruction)?;
            }
            RESET => {
                for qubit in inst.qubits() {
                    self.apply(Instruction::reset(QubitId(qubit)))?;
                }
            }
            BARRIER => {
                self.apply(Instruction::barrier(inst.qubits().into_iter().map(QubitId)))?;
            }
            GPHASE => {}
            _ => {
                let gate = inst.resolve()?.controlled(inst.controls.len() as u32);
                let broadcast = inst.controls.is_empty()
                    && gate.num_qubits() == 1
                    && inst.targets.len() > 1;
                if broadcast {
                    for &target in &inst.targets {
                        self.apply(Instruction::gate(gate.clone(), [QubitId(target)]))?;
                    }
                } else {
                    self.apply(Instruction::gate(
                        gate,
                        inst.qubits().into_iter().map(QubitId),
                    ))?;
                }
            }
        }
        Ok(())
    }

    /// Flatten into a normalized instruction stream. Gates with controls
    /// that have no dedicated variant list them in `controls`.
    pub fn to_normalized(&self) -> NormalizedProgram {
        let indices = |ids: &[QubitId]| ids.iter().map(|q| q.0).collect::<Vec<_>>();
        let instructions = self
            .instructions
            .iter()
            .map(|inst| match &inst.kind {
                InstructionKind::Gate(Gate::Standard(gate)) => {
                    NormalizedInstruction::new(gate.name(), indices(&inst.qubits))
                        .with_params(gate.parameters().into_iter().cloned())
                }
                InstructionKind::Gate(Gate::Controlled { base, num_controls }) => {
                    let (controls, targets) = inst.qubits.split_at(*num_controls as usize);
                    NormalizedInstruction::new(base.name(), indices(targets))
                        .with_controls(indices(controls))
                        .with_params(base.parameters().into_iter().cloned())
                }
                InstructionKind::Measure => NormalizedInstruction {
                    clbits: inst.clbits.iter().map(|c| c.0).collect(),
                    ..NormalizedInstruction::new(MEASURE, indices(&inst.qubits))
                },
                InstructionKind::Reset => NormalizedInstruction::new(RESET, indices(&inst.qubits)),
                InstructionKind::Barrier => {
                    NormalizedInstruction::barrier(indices(&inst.qubits))
                }
            })
            .collect();

        NormalizedProgram {
            num_qubits: self.num_qubits,
            num_clbits: self.num_clbits,
            instructions,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the circuit name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the circuit.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Get the number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits as usize
    }

    /// Get the number of classical bits.
    pub fn num_clbits(&self) -> usize {
        self.num_clbits as usize
    }

    /// Instructions in program order.
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Number of gate instructions.
    pub fn gate_count(&self) -> usize {
        self.instructions.iter().filter(|i| i.is_gate()).count()
    }

    /// Whether the circuit contains measurements.
    pub fn has_measurements(&self) -> bool {
        self.instructions.iter().any(Instruction::is_measure)
    }

    /// The vocabularies used by the circuit's gates.
    pub fn gate_sets(&self) -> Vec<GateSet> {
        let mut sets = vec![];
        for gate in self.instructions.iter().filter_map(Instruction::as_gate) {
            let set = gate.gate_set();
            if !sets.contains(&set) {
                sets.push(set);
            }
        }
        sets
    }

    /// Circuit depth: the longest chain of instructions sharing a qubit
    /// or classical bit. Barriers count as a layer.
    pub fn depth(&self) -> usize {
        let mut qubit_depth = vec![0usize; self.num_qubits as usize];
        let mut clbit_depth = vec![0usize; self.num_clbits as usize];
        let mut depth = 0;
        for inst in &self.instructions {
            let start = inst
                .qubits
                .iter()
                .map(|q| qubit_depth[q.index()])
                .chain(inst.clbits.iter().map(|c| clbit_depth[c.0 as usize]))
                .max()
                .unwrap_or(0);
            let level = start + 1;
            for q in &inst.qubits {
                qubit_depth[q.index()] = level;
            }
            for c in &inst.clbits {
                clbit_depth[c.0 as usize] = level;
            }
            depth = depth.max(level);
        }
        depth
    }

    // =========================================================================
    // Pre-built circuits
    // =========================================================================

    /// Create a Bell state circuit.
    pub fn bell() -> IrResult<Self> {
        let mut circuit = Self::with_size("bell", 2, 2);
        circuit
            .h(QubitId(0))?
            .cx(QubitId(0), QubitId(1))?
            .measure(QubitId(0), ClbitId(0))?
            .measure(QubitId(1), ClbitId(1))?;
        Ok(circuit)
    }

    /// Create a GHZ state circuit (without measurements).
    pub fn ghz(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("ghz", n, 0);
        if n == 0 {
            return Ok(circuit);
        }
        circuit.h(QubitId(0))?;
        for i in 0..n - 1 {
            circuit.cx(QubitId(i), QubitId(i + 1))?;
        }
        Ok(circuit)
    }

    /// Create a QFT circuit (without measurements).
    pub fn qft(n: u32) -> IrResult<Self> {
        let mut circuit = Self::with_size("qft", n, 0);
        for i in 0..n {
            circuit.h(QubitId(i))?;
            for j in (i + 1)..n {
                let angle = PI / f64::from(1u32 << (j - i));
                circuit.cp(angle, QubitId(j), QubitId(i))?;
            }
        }
        for i in 0..n / 2 {
            circuit.swap(QubitId(i), QubitId(n - 1 - i))?;
        }
        Ok(circuit)
    }
}
