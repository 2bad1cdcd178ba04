// Line-oriented command parsing for the text front end.

use thiserror::Error;

use siegeplan_core::stats::{Platform, UnknownPlatform};

use crate::protocol::UserCommand;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Command(UserCommand),
    /// Print the map catalog.
    Maps,
    Help,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("unknown command `{0}` (type `help` for a list)")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),

    #[error(transparent)]
    Platform(#[from] UnknownPlatform),
}

pub const HELP: &str = "\
Commands:
  add <pc|xbl|psn> <username>   add a player and look up their stats
  remove <username>             remove a player
  map <name>                    select a map (resets the site)
  site <name>                   select a bomb site on the current map
  maps                          list maps and their sites
  generate                      generate an attack strategy
  show                          show the roster, scenario, and strategy
  help                          show this help
  quit                          exit";

/// Parse a single input line.
///
/// Arguments after the keyword are taken verbatim (internal spaces kept), so
/// `map club house` and `site Bar/Magazzino` work without quoting.
pub fn parse_line(line: &str) -> Result<Input, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Input::Empty);
    }

    let (keyword, rest) = match line.split_once(char::is_whitespace) {
        Some((k, r)) => (k, r.trim()),
        None => (line, ""),
    };

    let cmd = match keyword.to_ascii_lowercase().as_str() {
        "add" => {
            let (platform, username) = rest
                .split_once(char::is_whitespace)
                .ok_or(CommandError::Usage("add <pc|xbl|psn> <username>"))?;
            let platform: Platform = platform.parse()?;
            UserCommand::AddPlayer {
                username: username.trim().to_string(),
                platform,
            }
        }
        "remove" | "rm" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("remove <username>"));
            }
            UserCommand::RemovePlayer {
                username: rest.to_string(),
            }
        }
        "map" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("map <name>"));
            }
            UserCommand::SelectMap(rest.to_string())
        }
        "site" => {
            if rest.is_empty() {
                return Err(CommandError::Usage("site <name>"));
            }
            UserCommand::SelectSite(rest.to_string())
        }
        "generate" | "gen" => UserCommand::Generate,
        "show" => UserCommand::Show,
        "quit" | "exit" => UserCommand::Quit,
        "maps" => return Ok(Input::Maps),
        "help" | "?" => return Ok(Input::Help),
        other => return Err(CommandError::Unknown(other.to_string())),
    };
    Ok(Input::Command(cmd))
}
