//! Statevector simulation engine.
//!
//! Basis index bit `k` holds qubit `k`.

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use qbridge_ir::{Circuit, Gate, Instruction, InstructionKind, QubitId};
use tracing::trace;

use crate::error::{SimError, SimResult};
use crate::matrix::base_matrix;

/// Largest register the dense engine accepts.
pub const MAX_QUBITS: usize = 24;

/// A statevector representing a quantum state.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The state amplitudes (2^n complex numbers).
    amplitudes: Array1<Complex64>,
    /// Number of qubits.
    num_qubits: usize,
}

impl Statevector {
    /// Create a new statevector initialized to |0...0⟩.
    pub fn new(num_qubits: usize) -> SimResult<Self> {
        Self::basis(num_qubits, 0)
    }

    /// The computational basis state `|index⟩`.
    pub(crate) fn basis(num_qubits: usize, index: usize) -> SimResult<Self> {
        if num_qubits > MAX_QUBITS {
            return Err(SimError::TooManyQubits {
                num_qubits,
                max: MAX_QUBITS,
            });
        }
        let mut amplitudes = Array1::zeros(1 << num_qubits);
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Ok(Self {
            amplitudes,
            num_qubits,
        })
    }

    /// Simulate a circuit from |0...0⟩.
    pub fn from_circuit(circuit: &Circuit) -> SimResult<Self> {
        let ops = unitary_part(circuit)?;
        let mut state = Self::new(circuit.num_qubits())?;
        for (gate, qubits) in &ops {
            state.apply_gate(gate, qubits)?;
        }
        Ok(state)
    }

    /// Register width.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    pub fn amplitudes(&self) -> &Array1<Complex64> {
        &self.amplitudes
    }

    /// Measurement probabilities of each basis state.
    pub fn probabilities(&self) -> Array1<f64> {
        self.amplitudes.mapv(|a| a.norm_sqr())
    }

    /// Apply a gate; `qubits` lists controls first.
    pub fn apply_gate(&mut self, gate: &Gate, qubits: &[QubitId]) -> SimResult<()> {
        let (base, num_controls) = gate.split_controls();
        let matrix = base_matrix(&base)?;
        let (controls, targets) = qubits.split_at(num_controls as usize);
        let controls: Vec<usize> = controls.iter().map(|q| q.0 as usize).collect();
        let targets: Vec<usize> = targets.iter().map(|q| q.0 as usize).collect();
        self.apply_matrix(&matrix, &targets, &controls);
        Ok(())
    }

    /// Apply a `2^k × 2^k` matrix to `targets` (first target is the most
    /// significant local bit) wherever every control qubit is set.
    pub fn apply_matrix(&mut self, matrix: &Array2<Complex64>, targets: &[usize], controls: &[usize]) {
        let k = targets.len();
        let dim = 1usize << k;
        debug_assert_eq!(matrix.dim(), (dim, dim));

        let ctrl_mask = controls.iter().fold(0usize, |m, &c| m | (1 << c));
        let tgt_mask = targets.iter().fold(0usize, |m, &t| m | (1 << t));
        let offsets: Vec<usize> = (0..dim)
            .map(|local| {
                targets
                    .iter()
                    .enumerate()
                    .filter(|(pos, _)| (local >> (k - 1 - pos)) & 1 == 1)
                    .fold(0usize, |acc, (_, &t)| acc | (1 << t))
            })
            .collect();

        let mut local = Array1::<Complex64>::zeros(dim);
        for base in 0..self.amplitudes.len() {
            if base & tgt_mask != 0 || base & ctrl_mask != ctrl_mask {
                continue;
            }
            for (l, &offset) in offsets.iter().enumerate() {
                local[l] = self.amplitudes[base | offset];
            }
            let out = matrix.dot(&local);
            for (l, &offset) in offsets.iter().enumerate() {
                self.amplitudes[base | offset] = out[l];
            }
        }
    }
}

/// The gates of a circuit with terminal measurements and barriers removed.
///
/// Fails on resets and on any gate that touches an already-measured qubit.
pub(crate) fn unitary_part(circuit: &Circuit) -> SimResult<Vec<(&Gate, &[QubitId])>> {
    let mut measured = vec![false; circuit.num_qubits()];
    let mut ops = Vec::with_capacity(circuit.gate_count());
    for (index, Instruction { kind, qubits, .. }) in circuit.instructions().iter().enumerate() {
        match kind {
            InstructionKind::Barrier => {}
            InstructionKind::Reset => return Err(SimError::Reset { index }),
            InstructionKind::Measure => {
                for q in qubits {
                    measured[q.0 as usize] = true;
                }
            }
            InstructionKind::Gate(gate) => {
                if qubits.iter().any(|q| measured[q.0 as usize]) {
                    return Err(SimError::MidCircuitMeasurement { index });
                }
                ops.push((gate, qubits.as_slice()));
            }
        }
    }
    trace!(gates = ops.len(), "extracted unitary part");
    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbridge_ir::ClbitId;
    use std::f64::consts::FRAC_1_SQRT_2;

    fn approx_eq(a: Complex64, b: Complex64) -> bool {
        (a - b).norm() < 1e-10
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2).unwrap();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(1.0, 0.0)));
        assert!(sv.amplitudes.iter().skip(1).all(|a| approx_eq(*a, Complex64::new(0.0, 0.0))));
    }

    #[test]
    fn test_bell_state() {
        let sv = Statevector::from_circuit(&Circuit::bell().unwrap()).unwrap();
        assert!(approx_eq(sv.amplitudes[0], Complex64::new(FRAC_1_SQRT_2, 0.0)));
        assert!(approx_eq(sv.amplitudes[1], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[2], Complex64::new(0.0, 0.0)));
        assert!(approx_eq(sv.amplitudes[3], Complex64::new(FRAC_1_SQRT_2, 0.0)));
    }

    #[test]
    fn test_control_and_target_order() {
        // Qubit 1 controls qubit 0.
        let mut circuit = Circuit::with_size("c", 2, 0);
        circuit.x(QubitId(1)).unwrap();
        circuit.cx(QubitId(1), QubitId(0)).unwrap();
        let sv = Statevector::from_circuit(&circuit).unwrap();
        assert!(approx_eq(sv.amplitudes[0b11], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_multi_controlled_x() {
        let mut circuit = Circuit::with_size("mcx", 4, 0);
        for q in 0..3 {
            circuit.x(QubitId(q)).unwrap();
        }
        circuit
            .mcx([QubitId(0), QubitId(1), QubitId(2)], QubitId(3))
            .unwrap();
        let sv = Statevector::from_circuit(&circuit).unwrap();
        assert!(approx_eq(sv.amplitudes[0b1111], Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn test_probabilities_of_ghz() {
        let sv = Statevector::from_circuit(&Circuit::ghz(3).unwrap()).unwrap();
        let probs = sv.probabilities();
        assert!((probs[0] - 0.5).abs() < 1e-10);
        assert!((probs[7] - 0.5).abs() < 1e-10);
        assert!((probs.sum() - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_mid_circuit_measurement_rejected() {
        let mut circuit = Circuit::with_size("m", 1, 1);
        circuit.h(QubitId(0)).unwrap();
        circuit.measure(QubitId(0), ClbitId(0)).unwrap();
        circuit.h(QubitId(0)).unwrap();
        assert!(matches!(
            Statevector::from_circuit(&circuit),
            Err(SimError::MidCircuitMeasurement { index: 2 })
        ));
    }

    #[test]
    fn test_reset_rejected() {
        let mut circuit = Circuit::with_size("r", 1, 0);
        circuit.reset(QubitId(0)).unwrap();
        assert!(matches!(
            Statevector::from_circuit(&circuit),
            Err(SimError::Reset { index: 0 })
        ));
    }

    #[test]
    fn test_too_many_qubits() {
        assert!(matches!(
            Statevector::new(MAX_QUBITS + 1),
            Err(SimError::TooManyQubits { .. })
        ));
    }
}
