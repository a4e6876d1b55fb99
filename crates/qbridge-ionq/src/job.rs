//! The IonQ job-description record.
//!
//! ```json
//! {"qubits": 2, "gateset": "qis", "circuit": [
//!     {"gate": "h", "target": 0},
//!     {"gate": "cnot", "control": 0, "target": 1}
//! ]}
//! ```
//!
//! Native phases and angles are in turns; QIS rotations are in radians.

use qbridge_ir::GateSet;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::IonQResult;

/// One entry of the `circuit` array.
///
/// Only the fields a gate uses are present; the rest are omitted on
/// serialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IonQOperation {
    /// Gate name (`h`, `cnot`, `gpi`, `ms`, ...).
    pub gate: String,
    /// Single target qubit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u32>,
    /// Target qubits of two-qubit gates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<u32>>,
    /// Single control qubit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control: Option<u32>,
    /// Several control qubits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub controls: Option<Vec<u32>>,
    /// QIS rotation angle in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    /// Native single-qubit phase in turns.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "turns"
    )]
    pub phase: Option<f64>,
    /// Native `ms` phases in turns.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "turn_list"
    )]
    pub phases: Option<Vec<f64>>,
    /// Native entangling angle in turns.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "turns"
    )]
    pub angle: Option<f64>,
}

impl IonQOperation {
    /// A bare gate record.
    pub fn new(gate: impl Into<String>) -> Self {
        Self {
            gate: gate.into(),
            ..Self::default()
        }
    }

    /// Set the single target.
    #[must_use]
    pub fn on(mut self, target: u32) -> Self {
        self.target = Some(target);
        self
    }

    /// Set the target pair.
    #[must_use]
    pub fn on_pair(mut self, a: u32, b: u32) -> Self {
        self.targets = Some(vec![a, b]);
        self
    }

    /// Attach controls: one becomes `control`, several become `controls`.
    #[must_use]
    pub fn controlled_by(mut self, controls: &[u32]) -> Self {
        match controls {
            [] => {}
            [c] => self.control = Some(*c),
            many => self.controls = Some(many.to_vec()),
        }
        self
    }

    /// Set the QIS rotation.
    #[must_use]
    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = Some(rotation);
        self
    }

    /// Control qubits in order, whichever field holds them.
    pub fn control_qubits(&self) -> Vec<u32> {
        match (&self.control, &self.controls) {
            (_, Some(many)) => many.clone(),
            (Some(c), None) => vec![*c],
            (None, None) => vec![],
        }
    }
}

/// An IonQ job description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IonQProgram {
    /// Number of qubits.
    pub qubits: u32,
    /// Gate records in program order.
    pub circuit: Vec<IonQOperation>,
    /// Vocabulary of every record in `circuit`.
    #[serde(default = "default_gateset")]
    pub gateset: GateSet,
}

/// A value in turns. Whole values are written as integers, so a zero
/// phase reads `"phase": 0`.
struct Turn(f64);

impl Serialize for Turn {
    #[allow(clippy::cast_possible_truncation)]
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

#[allow(clippy::ref_option)]
fn turns<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    value.map(Turn).serialize(serializer)
}

#[allow(clippy::ref_option)]
fn turn_list<S: Serializer>(values: &Option<Vec<f64>>, serializer: S) -> Result<S::Ok, S::Error> {
    values
        .as_ref()
        .map(|values| values.iter().copied().map(Turn).collect::<Vec<_>>())
        .serialize(serializer)
}

fn default_gateset() -> GateSet {
    GateSet::Qis
}

impl IonQProgram {
    /// Read a job from a JSON value.
    pub fn from_json(value: &Value) -> IonQResult<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }

    /// Write the job as a JSON value.
    pub fn to_json(&self) -> IonQResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// Whether a JSON value has the shape of an IonQ job: an object with
/// `qubits` and `circuit` keys.
pub fn is_ionq_job(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("qubits") && obj.get("circuit").is_some_and(Value::is_array))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_skips_unused_fields() {
        let op = IonQOperation::new("cnot").on(1).controlled_by(&[0]);
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json, json!({"gate": "cnot", "control": 0, "target": 1}));
    }

    #[test]
    fn test_multiple_controls() {
        let op = IonQOperation::new("cnot").on(2).controlled_by(&[0, 1]);
        assert_eq!(op.control, None);
        assert_eq!(op.control_qubits(), vec![0, 1]);
    }

    #[test]
    fn test_gateset_defaults_to_qis() {
        let job = IonQProgram::from_json(&json!({"qubits": 1, "circuit": []})).unwrap();
        assert_eq!(job.gateset, GateSet::Qis);
    }

    #[test]
    fn test_integer_phases_deserialize() {
        let job = IonQProgram::from_json(&json!({
            "qubits": 1,
            "gateset": "native",
            "circuit": [{"gate": "gpi", "target": 0, "phase": 0}]
        }))
        .unwrap();
        assert_eq!(job.circuit[0].phase, Some(0.0));
        assert_eq!(job.gateset, GateSet::Native);
    }

    #[test]
    fn test_whole_turns_serialize_as_integers() {
        let op = IonQOperation {
            phases: Some(vec![0.0, -1.0]),
            angle: Some(0.25),
            ..IonQOperation::new("ms").on_pair(0, 1)
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(
            json,
            json!({"gate": "ms", "targets": [0, 1], "phases": [0, -1], "angle": 0.25})
        );

        let gpi = IonQOperation {
            phase: Some(0.0),
            ..IonQOperation::new("gpi").on(0)
        };
        assert_eq!(serde_json::to_string(&gpi).unwrap(), r#"{"gate":"gpi","target":0,"phase":0}"#);

        let rz = IonQOperation::new("rz").on(0).with_rotation(1.0);
        assert_eq!(serde_json::to_value(&rz).unwrap()["rotation"], json!(1.0));
    }

    #[test]
    fn test_job_shape() {
        assert!(is_ionq_job(&json!({"qubits": 1, "circuit": []})));
        assert!(!is_ionq_job(&json!({"qubits": 1})));
        assert!(!is_ionq_job(&json!([1, 2])));
    }
}
