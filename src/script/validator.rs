//! Build-script validation
//!
//! A replayable script has exactly one `FROM`, as its first instruction,
//! followed by `RUN` steps.

use crate::parser::Instruction;

/// A problem found in a build script
#[derive(Debug, Clone)]
pub struct ScriptValidationError {
    pub line: Option<usize>,
    pub message: String,
    pub severity: ValidationSeverity,
}

/// Severity level for validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

impl std::fmt::Display for ScriptValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            ValidationSeverity::Error => "ERROR",
            ValidationSeverity::Warning => "WARNING",
        };
        if let Some(line) = self.line {
            write!(f, "{} (line {}): {}", prefix, line, self.message)
        } else {
            write!(f, "{}: {}", prefix, self.message)
        }
    }
}

pub fn validate_instructions(instructions: &[Instruction]) -> Vec<ScriptValidationError> {
    let mut errors = Vec::new();

    let first = match instructions.first() {
        Some(first) => first,
        None => {
            errors.push(ScriptValidationError {
                line: None,
                message: "Script has no FROM instruction".to_string(),
                severity: ValidationSeverity::Error,
            });
            return errors;
        }
    };

    if !matches!(first, Instruction::From { .. }) {
        errors.push(ScriptValidationError {
            line: Some(first.line()),
            message: "Script must start with FROM".to_string(),
            severity: ValidationSeverity::Error,
        });
    }

    for instruction in instructions.iter().skip(1) {
        if let Instruction::From { line, image } = instruction {
            errors.push(ScriptValidationError {
                line: Some(*line),
                message: format!("Multiple FROM instructions are not supported: {}", image),
                severity: ValidationSeverity::Error,
            });
        }
    }

    if !instructions.iter().any(|i| matches!(i, Instruction::Run { .. })) {
        errors.push(ScriptValidationError {
            line: None,
            message: "Script has no RUN steps".to_string(),
            severity: ValidationSeverity::Warning,
        });
    }

    errors
}

/// Check if a script has any validation errors (not just warnings)
pub fn has_errors(errors: &[ScriptValidationError]) -> bool {
    errors
        .iter()
        .any(|e| e.severity == ValidationSeverity::Error)
}

pub fn has_warnings(errors: &[ScriptValidationError]) -> bool {
    errors
        .iter()
        .any(|e| e.severity == ValidationSeverity::Warning)
}
