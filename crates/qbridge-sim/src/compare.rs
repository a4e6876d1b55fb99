//! Comparison of states and unitaries up to global phase.

use ndarray::{Array, Array2, Dimension, Zip};
use num_complex::Complex64;
use qbridge_ir::Circuit;
use tracing::debug;

use crate::error::SimResult;
use crate::statevector::{Statevector, unitary_part};

/// Whether `a` and `b` agree element-wise within `atol` after removing a
/// global phase.
///
/// The phase is fixed by the first element of `a` whose magnitude exceeds
/// `atol`. Arrays of different shapes never agree.
pub fn allclose_up_to_global_phase<D: Dimension>(
    a: &Array<Complex64, D>,
    b: &Array<Complex64, D>,
    atol: f64,
) -> bool {
    if a.shape() != b.shape() {
        return false;
    }
    let Some((pivot_a, pivot_b)) = a
        .iter()
        .zip(b.iter())
        .find(|(x, _)| x.norm() > atol)
    else {
        // `a` is numerically zero.
        return b.iter().all(|y| y.norm() <= atol);
    };
    if pivot_b.norm() <= atol {
        return false;
    }
    let ratio = pivot_b / pivot_a;
    let phase = ratio / ratio.norm();
    Zip::from(a)
        .and(b)
        .all(|x, y| (x * phase - y).norm() <= atol)
}

/// The unitary of a circuit's gates; column `j` is the image of `|j⟩`.
pub fn circuit_unitary(circuit: &Circuit) -> SimResult<Array2<Complex64>> {
    let ops = unitary_part(circuit)?;
    let n = circuit.num_qubits();
    let dim = 1usize << n;
    let mut unitary = Array2::zeros((dim, dim));
    for column in 0..dim {
        let mut state = Statevector::basis(n, column)?;
        for (gate, qubits) in &ops {
            state.apply_gate(gate, qubits)?;
        }
        unitary.column_mut(column).assign(state.amplitudes());
    }
    Ok(unitary)
}

/// Whether two circuits act identically up to global phase.
///
/// Registers of up to `max_unitary_qubits` qubits compare full unitaries;
/// larger ones compare the states prepared from |0...0⟩.
pub fn circuits_allclose(
    a: &Circuit,
    b: &Circuit,
    atol: f64,
    max_unitary_qubits: usize,
) -> SimResult<bool> {
    if a.num_qubits() != b.num_qubits() {
        debug!(left = a.num_qubits(), right = b.num_qubits(), "qubit counts differ");
        return Ok(false);
    }
    if a.num_qubits() <= max_unitary_qubits {
        let (ua, ub) = (circuit_unitary(a)?, circuit_unitary(b)?);
        Ok(allclose_up_to_global_phase(&ua, &ub, atol))
    } else {
        let (sa, sb) = (Statevector::from_circuit(a)?, Statevector::from_circuit(b)?);
        Ok(allclose_up_to_global_phase(
            sa.amplitudes(),
            sb.amplitudes(),
            atol,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use qbridge_ir::QubitId;
    use std::f64::consts::PI;

    #[test]
    fn test_global_phase_ignored() {
        let a = array![Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.8)];
        let phase = Complex64::from_polar(1.0, 1.234);
        let b = a.mapv(|x| x * phase);
        assert!(allclose_up_to_global_phase(&a, &b, 1e-9));
    }

    #[test]
    fn test_relative_phase_detected() {
        let a = array![Complex64::new(0.6, 0.0), Complex64::new(0.0, 0.8)];
        let b = array![Complex64::new(0.6, 0.0), Complex64::new(0.0, -0.8)];
        assert!(!allclose_up_to_global_phase(&a, &b, 1e-9));
    }

    #[test]
    fn test_shape_mismatch() {
        let a = array![Complex64::new(1.0, 0.0)];
        let b = array![Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0)];
        assert!(!allclose_up_to_global_phase(&a, &b, 1e-9));
    }

    #[test]
    fn test_unitary_of_cx() {
        let mut circuit = Circuit::with_size("cx", 2, 0);
        circuit.cx(QubitId(0), QubitId(1)).unwrap();
        let u = circuit_unitary(&circuit).unwrap();
        // |01⟩ (qubit 0 set) maps to |11⟩.
        assert_eq!(u[[0b11, 0b01]], Complex64::new(1.0, 0.0));
        assert_eq!(u[[0b00, 0b00]], Complex64::new(1.0, 0.0));
    }

    #[test]
    fn test_rz_equals_phase_up_to_global_phase() {
        let mut a = Circuit::with_size("rz", 1, 0);
        a.rz(PI / 3.0, QubitId(0)).unwrap();
        let mut b = Circuit::with_size("p", 1, 0);
        b.gate(qbridge_ir::StandardGate::P((PI / 3.0).into()), [QubitId(0)])
            .unwrap();
        assert!(circuits_allclose(&a, &b, 1e-9, 10).unwrap());
        // Statevector path: |0⟩ is an eigenstate of both.
        assert!(circuits_allclose(&a, &b, 1e-9, 0).unwrap());
    }

    #[test]
    fn test_different_circuits() {
        let mut a = Circuit::with_size("x", 1, 0);
        a.x(QubitId(0)).unwrap();
        let b = Circuit::with_size("id", 1, 0);
        assert!(!circuits_allclose(&a, &b, 1e-9, 10).unwrap());
        assert!(!circuits_allclose(&a, &Circuit::with_size("w", 2, 0), 1e-9, 10).unwrap());
    }
}
