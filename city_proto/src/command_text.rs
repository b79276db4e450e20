use std::num::ParseIntError;

use thiserror::Error;

use crate::DEFAULT_ZOOM;

/// Commands accepted by the interactive prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Place {
        building_type: String,
        x: i32,
        y: i32,
    },
    Demolish {
        x: i32,
        y: i32,
    },
    Upgrade {
        x: i32,
        y: i32,
        level: i32,
    },
    Stats,
    Map,
    Buildings,
    Focus {
        x: i32,
        y: i32,
        zoom: i32,
    },
    Quit,
}

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
}

impl CommandParseError {
    /// Whether the line named a known command but with non-numeric arguments.
    pub fn is_invalid_number(&self) -> bool {
        matches!(self, CommandParseError::InvalidInteger { .. })
    }
}

/// Parses one prompt line. The whole line is lowercased, so building types
/// reach the engine in lowercase.
///
/// Argument counts are checked before any numeric conversion and extra
/// trailing tokens are ignored.
pub fn parse_repl_line(input: &str) -> Result<ReplCommand, CommandParseError> {
    let lowered = input.trim().to_lowercase();
    let parts: Vec<&str> = lowered.split_whitespace().collect();
    let Some((verb, args)) = parts.split_first() else {
        return Err(CommandParseError::Empty);
    };

    match *verb {
        "quit" | "exit" => Ok(ReplCommand::Quit),
        "stats" => Ok(ReplCommand::Stats),
        "map" => Ok(ReplCommand::Map),
        "buildings" => Ok(ReplCommand::Buildings),
        "place" => {
            let [building_type, x, y] = take_args(args, ["type", "x", "y"])?;
            Ok(ReplCommand::Place {
                building_type: building_type.to_string(),
                x: parse_i32(x, "place x")?,
                y: parse_i32(y, "place y")?,
            })
        }
        "demolish" => {
            let [x, y] = take_args(args, ["x", "y"])?;
            Ok(ReplCommand::Demolish {
                x: parse_i32(x, "demolish x")?,
                y: parse_i32(y, "demolish y")?,
            })
        }
        "upgrade" => {
            let [x, y, level] = take_args(args, ["x", "y", "level"])?;
            Ok(ReplCommand::Upgrade {
                x: parse_i32(x, "upgrade x")?,
                y: parse_i32(y, "upgrade y")?,
                level: parse_i32(level, "upgrade level")?,
            })
        }
        "focus" => {
            let [x, y] = take_args(args, ["x", "y"])?;
            let zoom = match args.get(2) {
                Some(token) => parse_i32(token, "focus zoom")?,
                None => DEFAULT_ZOOM,
            };
            Ok(ReplCommand::Focus {
                x: parse_i32(x, "focus x")?,
                y: parse_i32(y, "focus y")?,
                zoom,
            })
        }
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn take_args<'a, const N: usize>(
    args: &[&'a str],
    names: [&'static str; N],
) -> Result<[&'a str; N], CommandParseError> {
    let mut out = [""; N];
    for (index, name) in names.into_iter().enumerate() {
        out[index] = args
            .get(index)
            .copied()
            .ok_or(CommandParseError::MissingArgument(name))?;
    }
    Ok(out)
}

fn parse_i32(value: &str, context: &'static str) -> Result<i32, CommandParseError> {
    value
        .parse::<i32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}
