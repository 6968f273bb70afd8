use serde::{Deserialize, Serialize};

/// A malformed module reported by the upstream parser. The module is
/// skipped; analysis of the rest continues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParserError {
    SyntaxError { message: String },
    CannotReadFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    ParserError,
    DuplicateModuleId,
    InconsistentArity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub module: String,
    pub message: String,
}
