//! Build scripts
//!
//! Loading, validating, and replaying the scripts `:write` produces.

pub mod runner;
pub mod validator;

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::{CyclopsError, Result};
use crate::parser::{parse_instructions, Instruction, Step};

pub use crate::parser::BuildScript;
pub use runner::{replay, ReplayReport};
pub use validator::{
    has_errors, has_warnings, validate_instructions, ScriptValidationError, ValidationSeverity,
};

impl BuildScript {
    /// Parse and validate script source. Warnings are logged, errors are fatal.
    pub fn parse(source: &str) -> Result<Self> {
        let instructions = parse_instructions(source)?;
        let problems = validate_instructions(&instructions);

        if has_warnings(&problems) {
            for warning in problems.iter().filter(|p| p.severity == ValidationSeverity::Warning) {
                warn!("{}", warning);
            }
        }
        if has_errors(&problems) {
            let messages: Vec<String> = problems
                .iter()
                .filter(|p| p.severity == ValidationSeverity::Error)
                .map(|p| p.to_string())
                .collect();
            return Err(CyclopsError::ParseError(messages.join("; ")));
        }

        let mut from = String::new();
        let mut steps = Vec::new();
        for instruction in instructions {
            match instruction {
                Instruction::From { image, .. } => from = image,
                Instruction::Run { line, command } => steps.push(Step { line, command }),
            }
        }
        Ok(BuildScript { from, steps })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::parse(&source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::render_script;
    use std::io::Write;

    #[test]
    fn test_parse_build_script() {
        let script = BuildScript::parse("FROM ubuntu:trusty\n# setup\nRUN apt-get update\n").unwrap();
        assert_eq!(script.from, "ubuntu:trusty");
        assert_eq!(
            script.steps,
            vec![Step { line: 3, command: "apt-get update".to_string() }]
        );
    }

    #[test]
    fn test_parse_accepts_script_with_only_warnings() {
        let script = BuildScript::parse("FROM alpine\n").unwrap();
        assert_eq!(script.from, "alpine");
        assert!(script.steps.is_empty());
    }

    #[test]
    fn test_parse_rejects_invalid_script() {
        let err = BuildScript::parse("RUN ls\n").unwrap_err();
        assert!(err.to_string().contains("Script must start with FROM"));
    }

    #[test]
    fn test_rendered_export_parses_back() {
        let lines = vec![
            "FROM ubuntu:trusty".to_string(),
            "RUN touch /tmp/foo".to_string(),
        ];
        let script = BuildScript::parse(&render_script(&lines)).unwrap();
        assert_eq!(script.from, "ubuntu:trusty");
        assert_eq!(script.steps[0].command, "touch /tmp/foo");
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "FROM alpine\nRUN ls\n").unwrap();
        let script = BuildScript::from_file(file.path()).unwrap();
        assert_eq!(script.steps.len(), 1);

        let missing = BuildScript::from_file(Path::new("/nonexistent/Dockerfile"));
        assert!(matches!(missing, Err(CyclopsError::IoError(_))));
    }
}
