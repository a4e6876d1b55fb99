//! Value-domain checks for native gate parameters.

use qbridge_ir::ParameterExpression;

use crate::error::{IonQError, IonQResult};

/// Phases are in turns and must lie in `[-1, 1]`.
pub const PHASE_RANGE: (f64, f64) = (-1.0, 1.0);

/// Entangling angles are in turns and must lie in `[0, 0.25]`.
pub const ANGLE_RANGE: (f64, f64) = (0.0, 0.25);

/// Check a phase value.
pub fn phase(gate: &str, value: f64) -> IonQResult<f64> {
    if (PHASE_RANGE.0..=PHASE_RANGE.1).contains(&value) {
        Ok(value)
    } else {
        Err(IonQError::InvalidPhase {
            gate: gate.to_string(),
            value: value.to_string(),
        })
    }
}

/// Check an angle value.
pub fn angle(gate: &str, value: f64) -> IonQResult<f64> {
    if (ANGLE_RANGE.0..=ANGLE_RANGE.1).contains(&value) {
        Ok(value)
    } else {
        Err(IonQError::InvalidAngle {
            gate: gate.to_string(),
            value: value.to_string(),
        })
    }
}

/// Evaluate and check a phase parameter. Symbolic values are invalid.
pub fn phase_param(gate: &str, param: &ParameterExpression) -> IonQResult<f64> {
    let value = param.as_f64().ok_or_else(|| IonQError::InvalidPhase {
        gate: gate.to_string(),
        value: param.to_string(),
    })?;
    phase(gate, value)
}

/// Evaluate and check an angle parameter. Symbolic values are invalid.
pub fn angle_param(gate: &str, param: &ParameterExpression) -> IonQResult<f64> {
    let value = param.as_f64().ok_or_else(|| IonQError::InvalidAngle {
        gate: gate.to_string(),
        value: param.to_string(),
    })?;
    angle(gate, value)
}

/// Evaluate a QIS rotation in radians.
pub fn rotation_param(gate: &str, param: &ParameterExpression) -> IonQResult<f64> {
    param.as_f64().ok_or_else(|| IonQError::SymbolicParameter {
        gate: gate.to_string(),
        value: param.to_string(),
    })
}
