//! Parser module for REPL commands and build scripts

pub mod ast;
pub mod grammar;

pub use ast::*;
pub use grammar::{parse_command, parse_instructions, INVALID_COMMAND, MISSING_ARGUMENT};
