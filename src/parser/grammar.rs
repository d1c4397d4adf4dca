//! Pest grammar parser for REPL input and build scripts

use std::path::PathBuf;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::error::{CyclopsError, Result};
use crate::parser::ast::*;

#[derive(Parser)]
#[grammar = "../grammar/cyclops.pest"]
pub struct CyclopsParser;

pub const MISSING_ARGUMENT: &str = "Missing required argument for command";
pub const INVALID_COMMAND: &str = "Invalid command";

/// Parse one line of REPL input.
///
/// Lines not starting with `:` are shell commands to evaluate.
pub fn parse_command(input: &str) -> Result<ReplCommand> {
    let pairs = CyclopsParser::parse(Rule::line, input)
        .map_err(|e| CyclopsError::ParseError(e.to_string()))?;

    let line = pairs
        .into_iter()
        .next()
        .ok_or_else(|| CyclopsError::ParseError("Empty input".to_string()))?;

    let pair = match line.into_inner().find(|p| p.as_rule() != Rule::EOI) {
        Some(pair) => pair,
        None => return Ok(ReplCommand::Empty),
    };

    match pair.as_rule() {
        Rule::help_cmd => Ok(ReplCommand::Help),
        Rule::quit_cmd => Ok(ReplCommand::Quit),
        Rule::commit_cmd => Ok(ReplCommand::Commit),
        Rule::print_cmd => Ok(ReplCommand::Print),
        Rule::history_cmd => Ok(ReplCommand::History),
        Rule::eval_cmd => Ok(ReplCommand::Eval(required_argument(pair)?)),
        Rule::run_cmd => Ok(ReplCommand::Run(required_argument(pair)?)),
        Rule::from_cmd => Ok(ReplCommand::From(required_argument(pair)?)),
        Rule::write_cmd => Ok(ReplCommand::Write(PathBuf::from(required_argument(pair)?))),
        Rule::back_cmd => match argument(pair) {
            None => Ok(ReplCommand::Back(1)),
            Some(n) => n
                .parse()
                .map(ReplCommand::Back)
                .map_err(|_| CyclopsError::ParseError(format!("invalid number specified: {}", n))),
        },
        Rule::unknown_cmd => {
            let keyword = pair.into_inner().next().map(|k| k.as_str()).unwrap_or("");
            Err(CyclopsError::ParseError(format!("{} :{}", INVALID_COMMAND, keyword)))
        }
        Rule::shell_cmd => Ok(ReplCommand::Eval(pair.as_str().to_string())),
        rule => Err(CyclopsError::ParseError(format!("Unexpected rule: {:?}", rule))),
    }
}

fn argument(pair: Pair<Rule>) -> Option<String> {
    pair.into_inner()
        .find(|p| p.as_rule() == Rule::argument)
        .map(|p| p.as_str().trim_end().to_string())
        .filter(|s| !s.is_empty())
}

fn required_argument(pair: Pair<Rule>) -> Result<String> {
    argument(pair).ok_or_else(|| CyclopsError::ParseError(MISSING_ARGUMENT.to_string()))
}

/// Parse build-script source into its instructions, in order
pub fn parse_instructions(input: &str) -> Result<Vec<Instruction>> {
    let pairs = CyclopsParser::parse(Rule::script, input)
        .map_err(|e| CyclopsError::ParseError(e.to_string()))?;

    let script = pairs
        .into_iter()
        .next()
        .ok_or_else(|| CyclopsError::ParseError("Empty script".to_string()))?;

    let mut instructions = Vec::new();
    for pair in script.into_inner() {
        let rule = pair.as_rule();
        if rule != Rule::from_step && rule != Rule::run_step {
            continue;
        }

        let (line, _) = pair.line_col();
        let text = pair
            .into_inner()
            .next()
            .map(|p| p.as_str().trim_end().to_string())
            .ok_or_else(|| CyclopsError::ParseError(format!("line {}: missing argument", line)))?;

        instructions.push(match rule {
            Rule::from_step => Instruction::From { line, image: text },
            _ => Instruction::Run { line, command: text },
        });
    }

    Ok(instructions)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_err(input: &str) -> String {
        match parse_command(input).unwrap_err() {
            CyclopsError::ParseError(msg) => msg,
            other => panic!("Expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_commands_without_arguments() {
        let cases = [
            (":help me", ReplCommand::Help),
            (":help", ReplCommand::Help),
            (":h", ReplCommand::Help),
            (":quit", ReplCommand::Quit),
            (":q", ReplCommand::Quit),
            (":commit this", ReplCommand::Commit),
            (":commit", ReplCommand::Commit),
            (":c", ReplCommand::Commit),
            (":print this", ReplCommand::Print),
            (":print", ReplCommand::Print),
            (":p", ReplCommand::Print),
            (":history", ReplCommand::History),
            (":hs", ReplCommand::History),
            ("", ReplCommand::Empty),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_command(input).unwrap(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_parse_commands_with_arguments() {
        let eval = ReplCommand::Eval("apt-get update".to_string());
        let run = ReplCommand::Run("apt-get update".to_string());
        let from = ReplCommand::From("ubuntu:latest".to_string());
        let write = ReplCommand::Write(PathBuf::from("Dockerfile"));
        let cases = [
            (":eval apt-get update", eval.clone()),
            (":e apt-get update", eval.clone()),
            ("apt-get update", eval),
            (":run apt-get update", run.clone()),
            (":r apt-get update", run),
            (":from ubuntu:latest", from.clone()),
            (":f ubuntu:latest", from),
            (":write Dockerfile", write.clone()),
            (":w Dockerfile", write),
        ];
        for (input, expected) in cases {
            assert_eq!(parse_command(input).unwrap(), expected, "input: {:?}", input);
        }
    }

    #[test]
    fn test_parse_missing_argument() {
        for input in [":eval", ":e", ":run", ":r", ":from", ":f", ":write", ":w", ":run   "] {
            assert_eq!(parse_err(input), MISSING_ARGUMENT, "input: {:?}", input);
        }
    }

    #[test]
    fn test_parse_invalid_command() {
        assert_eq!(parse_err(":notreal"), "Invalid command :notreal");
        assert_eq!(parse_err(":helpme"), "Invalid command :helpme");
    }

    #[test]
    fn test_parse_back() {
        assert_eq!(parse_command(":back").unwrap(), ReplCommand::Back(1));
        assert_eq!(parse_command(":b").unwrap(), ReplCommand::Back(1));
        assert_eq!(parse_command(":b 3").unwrap(), ReplCommand::Back(3));
        assert_eq!(parse_command(":back 0").unwrap(), ReplCommand::Back(0));
        assert!(parse_err(":b two").starts_with("invalid number specified"));
        assert!(parse_err(":b -1").starts_with("invalid number specified"));
    }

    #[test]
    fn test_argument_keeps_inner_spacing() {
        assert_eq!(
            parse_command(":r echo  'a  b' ").unwrap(),
            ReplCommand::Run("echo  'a  b'".to_string())
        );
    }

    #[test]
    fn test_parse_instructions() {
        let source = "# base\nFROM ubuntu:trusty\n\n  run apt-get update\nRUN touch /tmp/foo   \n";
        let instructions = parse_instructions(source).unwrap();
        assert_eq!(
            instructions,
            vec![
                Instruction::From { line: 2, image: "ubuntu:trusty".to_string() },
                Instruction::Run { line: 4, command: "apt-get update".to_string() },
                Instruction::Run { line: 5, command: "touch /tmp/foo".to_string() },
            ]
        );
    }

    #[test]
    fn test_parse_instructions_crlf() {
        let instructions = parse_instructions("FROM alpine\r\nRUN ls\r\n").unwrap();
        assert_eq!(instructions.len(), 2);
        assert_eq!(instructions[1].to_string(), "RUN ls");
    }

    #[test]
    fn test_parse_instructions_rejects_unknown() {
        assert!(parse_instructions("FROM alpine\nCOPY . /app\n").is_err());
        assert!(parse_instructions("FROM alpine\nRUN\n").is_err());
    }
}
