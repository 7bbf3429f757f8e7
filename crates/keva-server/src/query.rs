//! Query parsing for the line-oriented text protocol.

use thiserror::Error;

use keva_common::types::CommandKind;

/// Errors produced while parsing a query line.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The line contained no tokens.
    #[error("empty query")]
    Empty,

    /// The first token is not a known command.
    #[error("unknown command {command:?}")]
    UnknownCommand {
        /// The token that was not recognized.
        command: String,
    },

    /// The command received the wrong number of arguments.
    #[error("{command} expects {expected} argument(s), got {actual}")]
    WrongArity {
        /// The command.
        command: CommandKind,
        /// How many arguments it takes.
        expected: usize,
        /// How many it got.
        actual: usize,
    },
}

/// A parsed query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The command.
    pub command: CommandKind,
    /// Its arguments: `[key, value]` for `SET`, `[key]` for `GET`/`DEL`.
    pub args: Vec<String>,
}

/// Parses one line of the text protocol.
pub fn parse(input: &str) -> Result<Query, QueryError> {
    let mut tokens = input.split_whitespace();
    let command = tokens.next().ok_or(QueryError::Empty)?;

    let command = match command {
        "SET" => CommandKind::Set,
        "GET" => CommandKind::Get,
        "DEL" => CommandKind::Del,
        other => {
            return Err(QueryError::UnknownCommand {
                command: other.to_string(),
            })
        }
    };

    let args: Vec<String> = tokens.map(str::to_string).collect();
    let expected = match command {
        CommandKind::Set => 2,
        CommandKind::Get | CommandKind::Del => 1,
    };
    if args.len() != expected {
        return Err(QueryError::WrongArity {
            command,
            expected,
            actual: args.len(),
        });
    }

    Ok(Query { command, args })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set() {
        let query = parse("SET key value").unwrap();
        assert_eq!(query.command, CommandKind::Set);
        assert_eq!(query.args, vec!["key", "value"]);
    }

    #[test]
    fn test_parse_get_del() {
        assert_eq!(parse("GET key").unwrap().command, CommandKind::Get);
        assert_eq!(parse("DEL key").unwrap().command, CommandKind::Del);
    }

    #[test]
    fn test_extra_whitespace() {
        let query = parse("  SET   key   value  ").unwrap();
        assert_eq!(query.args, vec!["key", "value"]);
    }

    #[test]
    fn test_empty() {
        assert_eq!(parse(""), Err(QueryError::Empty));
        assert_eq!(parse("   "), Err(QueryError::Empty));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            parse("set key value"),
            Err(QueryError::UnknownCommand { .. })
        ));
        assert!(matches!(
            parse("PING"),
            Err(QueryError::UnknownCommand { .. })
        ));
    }

    #[test]
    fn test_wrong_arity() {
        assert!(matches!(parse("SET key"), Err(QueryError::WrongArity { .. })));
        assert!(matches!(
            parse("GET key extra"),
            Err(QueryError::WrongArity { .. })
        ));
        assert!(matches!(parse("DEL"), Err(QueryError::WrongArity { .. })));
    }
}
