//! Emit `OpenQASM` text from a [`Circuit`].

use std::collections::BTreeSet;
use std::f64::consts::PI;

use qbridge_ir::{Circuit, Gate, Instruction, InstructionKind, ParameterExpression, StandardGate};

use crate::error::{ParseError, ParseResult};

/// Emit a circuit as `OpenQASM` 3.0.
///
/// Free parameter symbols become `input float[64]` declarations.
/// Gates missing from `stdgates.inc` (`sxdg`, `rxx`, `ryy`, `rzz` and
/// the native `gpi`, `gpi2`, `ms`, `zz`) are written by name.
pub fn emit(circuit: &Circuit) -> ParseResult<String> {
    let mut emitter = Emitter::new();
    emitter.emit_circuit(circuit)?;
    Ok(emitter.output)
}

/// Emit a circuit as `OpenQASM` 2.0.
///
/// Native and `ryy` gates are defined in terms of `qelib1.inc`. Symbolic
/// parameters, discarded measurements and controlled gates with no
/// qelib1 spelling are rejected.
pub fn emit_qasm2(circuit: &Circuit) -> ParseResult<String> {
    let mut emitter = Qasm2Emitter::new();
    emitter.emit_circuit(circuit)?;
    Ok(emitter.output)
}

struct Emitter {
    output: String,
}

impl Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> ParseResult<()> {
        self.writeln("OPENQASM 3.0;");
        self.writeln("include \"stdgates.inc\";");

        let symbols = circuit_symbols(circuit);
        if !symbols.is_empty() {
            self.writeln("");
            for symbol in &symbols {
                self.writeln(&format!("input float[64] {symbol};"));
            }
        }
        self.writeln("");

        if circuit.num_qubits() > 0 {
            self.writeln(&format!("qubit[{}] q;", circuit.num_qubits()));
        }
        if circuit.num_clbits() > 0 {
            self.writeln(&format!("bit[{}] c;", circuit.num_clbits()));
        }
        self.writeln("");

        for instruction in circuit.instructions() {
            self.emit_instruction(instruction)?;
        }
        Ok(())
    }

    fn emit_instruction(&mut self, inst: &Instruction) -> ParseResult<()> {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let head = match gate {
                    Gate::Standard(StandardGate::U(..)) => "U".to_string(),
                    Gate::Standard(g) => g.name().to_string(),
                    Gate::Controlled { base, num_controls } => {
                        let modifier = if *num_controls == 1 {
                            "ctrl".to_string()
                        } else {
                            format!("ctrl({num_controls})")
                        };
                        let name = match base {
                            StandardGate::U(..) => "U",
                            other => other.name(),
                        };
                        format!("{modifier} @ {name}")
                    }
                };
                let line = format!(
                    "{head}{} {};",
                    format_params(&gate.parameters()),
                    format_qubits(inst)
                );
                self.writeln(&line);
            }
            InstructionKind::Measure if inst.clbits.is_empty() => {
                for q in &inst.qubits {
                    self.writeln(&format!("measure q[{}];", q.0));
                }
            }
            InstructionKind::Measure => {
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    self.writeln(&format!("c[{}] = measure q[{}];", c.0, q.0));
                }
            }
            InstructionKind::Reset => {
                for q in &inst.qubits {
                    self.writeln(&format!("reset q[{}];", q.0));
                }
            }
            InstructionKind::Barrier => {
                self.writeln(&format!("barrier {};", format_qubits(inst)));
            }
        }
        Ok(())
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

/// Gate definitions for gates `qelib1.inc` lacks, in dependency order.
const QASM2_DEFINITIONS: &[(&str, &str)] = &[
    ("gpi", "gate gpi(phi) a { u3(pi, 2*pi*phi, pi - 2*pi*phi) a; }"),
    (
        "gpi2",
        "gate gpi2(phi) a { u3(pi/2, 2*pi*phi - pi/2, pi/2 - 2*pi*phi) a; }",
    ),
    (
        "ryy",
        "gate ryy(theta) a, b { rx(pi/2) a; rx(pi/2) b; cx a, b; rz(theta) b; cx a, b; rx(-pi/2) a; rx(-pi/2) b; }",
    ),
    (
        "zz",
        "gate zz(theta) a, b { cx a, b; rz(2*pi*theta) b; cx a, b; }",
    ),
    (
        "ms",
        "gate ms(phi0, phi1, theta) a, b { rz(-2*pi*phi0) a; rz(-2*pi*phi1) b; h a; h b; cx a, b; rz(2*pi*theta) b; cx a, b; h a; h b; rz(2*pi*phi0) a; rz(2*pi*phi1) b; }",
    ),
];

/// `OpenQASM` 2.0 emitter.
struct Qasm2Emitter {
    output: String,
}

impl Qasm2Emitter {
    fn new() -> Self {
        Self {
            output: String::new(),
        }
    }

    fn emit_circuit(&mut self, circuit: &Circuit) -> ParseResult<()> {
        if let Some(symbol) = circuit_symbols(circuit).into_iter().next() {
            return Err(ParseError::UnsupportedConstruct(format!(
                "symbolic parameter '{symbol}' in OpenQASM 2"
            )));
        }

        self.writeln("OPENQASM 2.0;");
        self.writeln("include \"qelib1.inc\";");

        let used: BTreeSet<&str> = circuit
            .instructions()
            .iter()
            .filter_map(Instruction::as_gate)
            .filter_map(|g| match g {
                Gate::Standard(s) => Some(s.name()),
                Gate::Controlled { .. } => None,
            })
            .collect();
        for (name, def) in QASM2_DEFINITIONS {
            if used.contains(name) {
                self.writeln(def);
            }
        }
        self.writeln("");

        if circuit.num_qubits() > 0 {
            self.writeln(&format!("qreg q[{}];", circuit.num_qubits()));
        }
        if circuit.num_clbits() > 0 {
            self.writeln(&format!("creg c[{}];", circuit.num_clbits()));
        }
        self.writeln("");

        for instruction in circuit.instructions() {
            self.emit_instruction(instruction)?;
        }
        Ok(())
    }

    fn emit_instruction(&mut self, inst: &Instruction) -> ParseResult<()> {
        match &inst.kind {
            InstructionKind::Gate(gate) => {
                let name = qasm2_gate_name(gate)?;
                let line = format!(
                    "{name}{} {};",
                    format_params(&gate.parameters()),
                    format_qubits(inst)
                );
                self.writeln(&line);
            }
            InstructionKind::Measure if inst.clbits.is_empty() => {
                return Err(ParseError::UnsupportedConstruct(
                    "measurement without a classical target in OpenQASM 2".into(),
                ));
            }
            InstructionKind::Measure => {
                for (q, c) in inst.qubits.iter().zip(&inst.clbits) {
                    self.writeln(&format!("measure q[{}] -> c[{}];", q.0, c.0));
                }
            }
            InstructionKind::Reset => {
                for q in &inst.qubits {
                    self.writeln(&format!("reset q[{}];", q.0));
                }
            }
            InstructionKind::Barrier => {
                self.writeln(&format!("barrier {};", format_qubits(inst)));
            }
        }
        Ok(())
    }

    fn writeln(&mut self, line: &str) {
        self.output.push_str(line);
        self.output.push('\n');
    }
}

fn qasm2_gate_name(gate: &Gate) -> ParseResult<&'static str> {
    match gate {
        Gate::Standard(StandardGate::U(..)) => Ok("u3"),
        Gate::Standard(StandardGate::P(_)) => Ok("u1"),
        Gate::Standard(StandardGate::CP(_)) => Ok("cu1"),
        Gate::Standard(g) => Ok(g.name()),
        Gate::Controlled { base, num_controls } => match (base, num_controls) {
            (StandardGate::SX, 1) => Ok("csx"),
            (StandardGate::U(..), 1) => Ok("cu3"),
            (StandardGate::X, 3) => Ok("c3x"),
            (StandardGate::X, 4) => Ok("c4x"),
            (StandardGate::SX, 3) => Ok("c3sqrtx"),
            _ => Err(ParseError::UnsupportedConstruct(format!(
                "gate '{}' has no OpenQASM 2 equivalent",
                gate.name()
            ))),
        },
    }
}

fn circuit_symbols(circuit: &Circuit) -> BTreeSet<String> {
    circuit
        .instructions()
        .iter()
        .filter_map(Instruction::as_gate)
        .flat_map(|g| g.parameters().into_iter().flat_map(ParameterExpression::symbols))
        .collect()
}

fn format_qubits(inst: &Instruction) -> String {
    inst.qubits
        .iter()
        .map(|q| format!("q[{}]", q.0))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_params(params: &[&ParameterExpression]) -> String {
    if params.is_empty() {
        return String::new();
    }
    let formatted: Vec<String> = params.iter().map(|p| emit_param(p)).collect();
    format!("({})", formatted.join(", "))
}

/// Format a parameter, recognising simple multiples of pi.
fn emit_param(param: &ParameterExpression) -> String {
    match param.as_f64() {
        Some(value) => format_angle(value),
        None => param.to_string(),
    }
}

fn format_angle(value: f64) -> String {
    const DENOMINATORS: [i64; 6] = [1, 2, 3, 4, 6, 8];
    if value == 0.0 {
        return "0".into();
    }
    let turns = value / PI;
    for den in DENOMINATORS {
        let num = (turns * den as f64).round();
        if num == 0.0 || num.abs() > 16.0 {
            continue;
        }
        if ((num / den as f64) * PI - value).abs() <= 1e-12 * value.abs().max(1.0) {
            let num = num as i64;
            let sign = if num < 0 { "-" } else { "" };
            let coeff = match num.abs() {
                1 => String::new(),
                n => format!("{n}*"),
            };
            return if den == 1 {
                format!("{sign}{coeff}pi")
            } else {
                format!("{sign}{coeff}pi/{den}")
            };
        }
    }
    // Debug formatting is the shortest string that reads back exactly.
    format!("{value:?}")
}
