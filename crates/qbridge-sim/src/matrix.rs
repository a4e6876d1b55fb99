//! Gate matrices.
//!
//! Multi-qubit matrices are indexed with the gate's first operand as the
//! most significant bit, so `CX` on `[c, t]` is the textbook
//! `[[1,0,0,0],[0,1,0,0],[0,0,0,1],[0,0,1,0]]`. Native phases and angles
//! are in turns.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use ndarray::{Array2, array, s};
use num_complex::Complex64;
use qbridge_ir::{Gate, ParameterExpression, StandardGate};

use crate::error::{SimError, SimResult};

const ZERO: Complex64 = Complex64::new(0.0, 0.0);
const ONE: Complex64 = Complex64::new(1.0, 0.0);
const I: Complex64 = Complex64::new(0.0, 1.0);

/// The full matrix of a gate, controls included.
pub fn gate_matrix(gate: &Gate) -> SimResult<Array2<Complex64>> {
    let (base, num_controls) = gate.split_controls();
    Ok(controlled(&base_matrix(&base)?, num_controls))
}

/// Embed `base` under `num_controls` leading controls.
pub fn controlled(base: &Array2<Complex64>, num_controls: u32) -> Array2<Complex64> {
    if num_controls == 0 {
        return base.clone();
    }
    let block = base.nrows();
    let dim = block << num_controls;
    let mut matrix = Array2::eye(dim);
    matrix
        .slice_mut(s![dim - block.., dim - block..])
        .assign(base);
    matrix
}

/// Matrix of a standard gate.
pub(crate) fn base_matrix(gate: &StandardGate) -> SimResult<Array2<Complex64>> {
    let value = |p: &ParameterExpression| -> SimResult<f64> {
        p.as_f64().ok_or_else(|| SimError::SymbolicParameter {
            gate: gate.name().to_string(),
            expression: p.to_string(),
        })
    };

    let matrix = match gate {
        StandardGate::I => Array2::eye(2),
        StandardGate::X => array![[ZERO, ONE], [ONE, ZERO]],
        StandardGate::Y => array![[ZERO, -I], [I, ZERO]],
        StandardGate::Z => diag(&[ONE, -ONE]),
        StandardGate::H => {
            let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
            array![[h, h], [h, -h]]
        }
        StandardGate::S => diag(&[ONE, I]),
        StandardGate::Sdg => diag(&[ONE, -I]),
        StandardGate::T => diag(&[ONE, Complex64::from_polar(1.0, PI / 4.0)]),
        StandardGate::Tdg => diag(&[ONE, Complex64::from_polar(1.0, -PI / 4.0)]),
        StandardGate::SX => {
            let (a, b) = (Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5));
            array![[a, b], [b, a]]
        }
        StandardGate::SXdg => {
            let (a, b) = (Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5));
            array![[a, b], [b, a]]
        }
        StandardGate::Rx(theta) => {
            let (c, s) = half_angle(value(theta)?);
            array![[c, -I * s], [-I * s, c]]
        }
        StandardGate::Ry(theta) => {
            let (c, s) = half_angle(value(theta)?);
            array![[c, -s], [s, c]]
        }
        StandardGate::Rz(theta) => {
            let t = value(theta)?;
            diag(&[
                Complex64::from_polar(1.0, -t / 2.0),
                Complex64::from_polar(1.0, t / 2.0),
            ])
        }
        StandardGate::P(theta) => diag(&[ONE, Complex64::from_polar(1.0, value(theta)?)]),
        StandardGate::U(theta, phi, lambda) => {
            let (c, s) = half_angle(value(theta)?);
            let (phi, lambda) = (value(phi)?, value(lambda)?);
            array![
                [c, -Complex64::from_polar(1.0, lambda) * s],
                [
                    Complex64::from_polar(1.0, phi) * s,
                    Complex64::from_polar(1.0, phi + lambda) * c
                ]
            ]
        }
        StandardGate::Swap => array![
            [ONE, ZERO, ZERO, ZERO],
            [ZERO, ZERO, ONE, ZERO],
            [ZERO, ONE, ZERO, ZERO],
            [ZERO, ZERO, ZERO, ONE]
        ],
        StandardGate::RXX(theta) => {
            let (c, s) = half_angle(value(theta)?);
            let off = -I * s;
            array![
                [c, ZERO, ZERO, off],
                [ZERO, c, off, ZERO],
                [ZERO, off, c, ZERO],
                [off, ZERO, ZERO, c]
            ]
        }
        StandardGate::RYY(theta) => {
            let (c, s) = half_angle(value(theta)?);
            let (even, odd) = (I * s, -I * s);
            array![
                [c, ZERO, ZERO, even],
                [ZERO, c, odd, ZERO],
                [ZERO, odd, c, ZERO],
                [even, ZERO, ZERO, c]
            ]
        }
        StandardGate::RZZ(theta) => {
            let t = value(theta)?;
            let (a, b) = (
                Complex64::from_polar(1.0, -t / 2.0),
                Complex64::from_polar(1.0, t / 2.0),
            );
            diag(&[a, b, b, a])
        }
        StandardGate::GPI(phi) => {
            let phase = turns(value(phi)?);
            array![[ZERO, phase.conj()], [phase, ZERO]]
        }
        StandardGate::GPI2(phi) => {
            let phase = turns(value(phi)?);
            let h = Complex64::new(FRAC_1_SQRT_2, 0.0);
            array![[h, -I * h * phase.conj()], [-I * h * phase, h]]
        }
        StandardGate::MS(phi0, phi1, theta) => {
            let (phi0, phi1) = (value(phi0)?, value(phi1)?);
            let angle = PI * value(theta)?;
            let c = Complex64::new(angle.cos(), 0.0);
            let s = -I * angle.sin();
            let sum = turns(phi0 + phi1);
            let diff = turns(phi0 - phi1);
            array![
                [c, ZERO, ZERO, s * sum.conj()],
                [ZERO, c, s * diff.conj(), ZERO],
                [ZERO, s * diff, c, ZERO],
                [s * sum, ZERO, ZERO, c]
            ]
        }
        StandardGate::ZZ(theta) => {
            let t = PI * value(theta)?;
            let (a, b) = (Complex64::from_polar(1.0, -t), Complex64::from_polar(1.0, t));
            diag(&[a, b, b, a])
        }
        StandardGate::CX
        | StandardGate::CY
        | StandardGate::CZ
        | StandardGate::CH
        | StandardGate::CRx(_)
        | StandardGate::CRy(_)
        | StandardGate::CRz(_)
        | StandardGate::CP(_)
        | StandardGate::CCX
        | StandardGate::CSwap => {
            let (base, num_controls) = gate.split_controls();
            controlled(&base_matrix(&base)?, num_controls)
        }
    };
    Ok(matrix)
}

fn diag(entries: &[Complex64]) -> Array2<Complex64> {
    Array2::from_diag(&ndarray::ArrayView1::from(entries))
}

fn half_angle(theta: f64) -> (Complex64, Complex64) {
    let half = theta / 2.0;
    (Complex64::new(half.cos(), 0.0), Complex64::new(half.sin(), 0.0))
}

/// `e^{2πi·t}` for a value in turns.
fn turns(t: f64) -> Complex64 {
    Complex64::from_polar(1.0, 2.0 * PI * t)
}
