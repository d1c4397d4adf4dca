//! Parsed forms of REPL input and build scripts

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// One line of REPL input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    /// Blank input
    Empty,
    Help,
    Quit,
    Commit,
    Print,
    History,
    /// Run without committing
    Eval(String),
    /// Run and commit on success
    Run(String),
    /// Switch the base image
    From(String),
    /// Export the lineage as a build script
    Write(PathBuf),
    /// Undo this many live entries
    Back(usize),
}

impl ReplCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ReplCommand::Empty => "",
            ReplCommand::Help => "help",
            ReplCommand::Quit => "quit",
            ReplCommand::Commit => "commit",
            ReplCommand::Print => "print",
            ReplCommand::History => "history",
            ReplCommand::Eval(_) => "eval",
            ReplCommand::Run(_) => "run",
            ReplCommand::From(_) => "from",
            ReplCommand::Write(_) => "write",
            ReplCommand::Back(_) => "back",
        }
    }
}

/// A build script: one base image and the steps layered on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildScript {
    pub from: String,
    pub steps: Vec<Step>,
}

/// One `RUN` instruction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based line in the source
    pub line: usize,
    pub command: String,
}

/// Instruction as it appears in the source, before validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    From { line: usize, image: String },
    Run { line: usize, command: String },
}

impl Instruction {
    pub fn line(&self) -> usize {
        match self {
            Instruction::From { line, .. } | Instruction::Run { line, .. } => *line,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::From { image, .. } => write!(f, "FROM {}", image),
            Instruction::Run { command, .. } => write!(f, "RUN {}", command),
        }
    }
}
