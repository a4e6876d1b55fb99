//! `OpenQASM` 2 and 3 front end for qbridge
//!
//! This crate parses `OpenQASM` source into a syntax tree, extracts a flat
//! instruction stream from it, prints syntax trees back out as QASM3, and
//! emits QASM2 or QASM3 text from a [`Circuit`](qbridge_ir::Circuit).
//!
//! # Supported Features
//!
//! | Feature | Status | Example |
//! |---------|--------|---------|
//! | Version declaration | ✅ | `OPENQASM 3.0;`, `OPENQASM 2.0;` |
//! | Register declarations | ✅ | `qubit[5] q;`, `qreg q[5];`, `creg c[5];` |
//! | Standard gates | ✅ | `h q[0];`, `cx q[0], q[1];` |
//! | Broadcasting | ✅ | `h q;`, `cx a, b;` |
//! | Gate definitions | ✅ | `gate bell a, b { h a; cx a, b; }` |
//! | Modifiers | ✅ | `ctrl @ inv @ s q[0], q[1];`, `pow(2) @ t q;` |
//! | Classical constants | ✅ | `const int n = 4;` |
//! | Loops | ✅ | `for int i in [0:n - 1] { ... }` |
//! | Subroutines | ✅ | `def layer(qubit a, float x) { ... }` |
//! | Free parameters | ✅ | `input float theta;` |
//! | Measurements | ✅ | `c = measure q;`, `measure q -> c;` |
//! | Barriers and reset | ✅ | `barrier q;`, `reset q[0];` |
//! | Classical feedback | ❌ | `if (c == 1) x q;` |
//! | Opaque gates | ❌ | `opaque magic q;` |
//!
//! # Example: Parsing QASM
//!
//! ```rust
//! use qbridge_qasm::parse_circuit;
//!
//! let qasm = r#"
//!     OPENQASM 3.0;
//!     include "stdgates.inc";
//!     qubit[2] q;
//!     bit[2] c;
//!     h q[0];
//!     cx q[0], q[1];
//!     c = measure q;
//! "#;
//!
//! let circuit = parse_circuit(qasm).unwrap();
//! assert_eq!(circuit.num_qubits(), 2);
//! assert!(circuit.has_measurements());
//! ```
//!
//! # Example: QASM2 to QASM3
//!
//! ```rust
//! use qbridge_qasm::{parse, to_qasm3};
//!
//! let program = parse(r#"OPENQASM 2.0; include "qelib1.inc"; qreg q[1]; sxdg q[0];"#).unwrap();
//! let qasm3 = to_qasm3(&program);
//! assert!(qasm3.starts_with("OPENQASM 3.0;"));
//! assert!(qasm3.contains("gate sxdg a { inv @ sx a; }"));
//! assert!(qasm3.contains("qubit[1] q;"));
//! ```
//!
//! # Example: Round-Trip
//!
//! ```rust
//! use qbridge_qasm::{emit, parse_circuit};
//!
//! let original = r#"
//! OPENQASM 3.0;
//! include "stdgates.inc";
//! qubit[3] q;
//! h q[0];
//! cx q[0], q[1];
//! cx q[1], q[2];
//! "#;
//!
//! let circuit = parse_circuit(original).unwrap();
//! let emitted = emit(&circuit).unwrap();
//! let reparsed = parse_circuit(&emitted).unwrap();
//! assert_eq!(circuit.instructions(), reparsed.instructions());
//! ```

mod ast;
mod emitter;
mod error;
mod extract;
mod lexer;
mod parser;
mod printer;

use qbridge_ir::{Circuit, NormalizedProgram};

pub use ast::Program;
pub use emitter::{emit, emit_qasm2};
pub use error::{ParseError, ParseResult};
pub use extract::extract;
pub use lexer::header_version;
pub use printer::to_qasm3;

/// Parse QASM source into a syntax tree.
pub fn parse(source: &str) -> ParseResult<Program> {
    parser::parse_program(source)
}

/// Parse QASM source and extract its instruction stream.
pub fn extract_source(source: &str) -> ParseResult<NormalizedProgram> {
    extract(&parse(source)?)
}

/// Parse QASM source into a [`Circuit`].
pub fn parse_circuit(source: &str) -> ParseResult<Circuit> {
    let normalized = extract_source(source)?;
    Ok(Circuit::from_normalized(&normalized)?)
}

// Re-export AST types for advanced users
pub mod syntax {
    pub use crate::ast::*;
}
