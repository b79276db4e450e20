use std::io::{self, BufRead};

use city_proto::{parse_repl_line, CommandParseError, ReplCommand};
use tracing::{debug, warn};

use crate::client::CityClient;
use crate::transport::Transport;

const HELP: [&str; 8] = [
    "  place <type> <x> <y>  - Place building (House/road/PowerPlant/economic)",
    "  demolish <x> <y>      - Demolish building",
    "  upgrade <x> <y> <lvl> - Upgrade building",
    "  stats                 - Show city stats",
    "  map                   - Show map info",
    "  buildings             - List all buildings",
    "  focus <x> <y> [zoom]  - Focus camera",
    "  quit                  - Exit",
];

/// Why an interactive session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Quit,
    EndOfInput,
}

/// Runs the interactive prompt until `quit` or end of input.
///
/// Bad lines are reported and the session carries on; nothing typed at the
/// prompt can end it except `quit`.
pub fn run_repl<T, R>(client: &mut CityClient<T>, input: R) -> SessionEnd
where
    T: Transport,
    R: BufRead,
{
    let rule = "=".repeat(60);
    client.say("");
    client.say(&rule);
    client.say("INTERACTIVE MODE");
    client.say(&rule);
    client.say("");
    client.say("Commands:");
    for line in HELP {
        client.say(line);
    }
    client.say(&rule);

    client.get_map_info();

    let mut lines = input.lines();
    loop {
        client.say("");
        client.prompt("> ");

        let line = match lines.next() {
            Some(Ok(line)) => line,
            // The undecodable line is already consumed; the next read starts
            // on the following line.
            Some(Err(err)) if err.kind() == io::ErrorKind::InvalidData => {
                warn!(target: "city_client::repl", error = %err, "input.undecodable");
                client.say(format!("[failed] Error: {}", err));
                continue;
            }
            Some(Err(err)) => {
                warn!(target: "city_client::repl", error = %err, "input.read_failed");
                client.say(format!("[failed] Error: {}", err));
                return SessionEnd::EndOfInput;
            }
            None => return SessionEnd::EndOfInput,
        };

        match parse_repl_line(&line) {
            Ok(ReplCommand::Quit) => {
                client.say("Goodbye!");
                return SessionEnd::Quit;
            }
            Ok(command) => {
                debug!(target: "city_client::repl", ?command, "command.parsed");
                dispatch(client, command);
            }
            Err(CommandParseError::Empty) => {}
            Err(err) if err.is_invalid_number() => {
                debug!(target: "city_client::repl", error = %err, "command.rejected");
                client.say("[failed] Invalid coordinates (must be numbers)");
            }
            Err(err) => {
                debug!(target: "city_client::repl", error = %err, "command.rejected");
                client.say("[failed] Invalid command");
            }
        }
    }
}

fn dispatch<T: Transport>(client: &mut CityClient<T>, command: ReplCommand) {
    match command {
        ReplCommand::Place {
            building_type,
            x,
            y,
        } => {
            client.place_building(&building_type, x, y, "");
        }
        ReplCommand::Demolish { x, y } => {
            client.demolish(x, y);
        }
        ReplCommand::Upgrade { x, y, level } => {
            client.upgrade(x, y, level);
        }
        ReplCommand::Stats => {
            client.get_stats();
        }
        ReplCommand::Map => {
            client.get_map_info();
        }
        ReplCommand::Buildings => {
            client.get_buildings();
        }
        ReplCommand::Focus { x, y, zoom } => {
            client.focus_camera(x, y, zoom);
        }
        ReplCommand::Quit => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{accepting_engine, RecordingTransport, SharedBuffer};
    use crate::transport::RetryPolicy;
    use serde_json::json;
    use std::io::Cursor;

    fn session(script: &str) -> (SessionEnd, Vec<serde_json::Value>, String) {
        let output = SharedBuffer::default();
        let mut client = CityClient::new(
            RecordingTransport::new(accepting_engine),
            RetryPolicy::default(),
        )
        .with_output(output.clone());
        let end = run_repl(&mut client, Cursor::new(script.to_string()));
        (end, client.transport().requests(), output.contents())
    }

    #[test]
    fn non_numeric_coordinates_keep_the_session_alive() {
        let (end, requests, output) = session("place house x y\nstats\nquit\n");
        assert_eq!(end, SessionEnd::Quit);
        assert!(output.contains("Invalid coordinates (must be numbers)"));
        let actions: Vec<_> = requests.iter().map(|r| r["action"].clone()).collect();
        assert_eq!(actions, vec![json!("get_map"), json!("get_stats")]);
        assert!(output.ends_with("Goodbye!\n"));
    }

    #[test]
    fn commands_are_forwarded_lowercased() {
        let (_, requests, _) = session("PLACE House 3 4\nfocus 1 2\nupgrade 3 4 2\ndemolish 3 4\n");
        assert_eq!(
            requests[1],
            json!({
                "action": "place_building",
                "buildingType": "house",
                "x": 3,
                "y": 4,
                "LLMReasoning": "",
            })
        );
        assert_eq!(
            requests[2],
            json!({"action": "focus_position", "x": 1, "y": 2, "Upgrade": 5})
        );
        assert_eq!(requests[3]["action"], "upgrade");
        assert_eq!(requests[4]["action"], "demolish");
    }

    #[test]
    fn unknown_and_short_commands_are_invalid() {
        let (end, requests, output) = session("fly 1 2\ndemolish 4\n\n   \n");
        assert_eq!(end, SessionEnd::EndOfInput);
        assert_eq!(output.matches("[failed] Invalid command").count(), 2);
        assert_eq!(requests.len(), 1);
    }

    #[test]
    fn undecodable_line_is_reported_and_skipped() {
        let output = SharedBuffer::default();
        let mut client = CityClient::new(
            RecordingTransport::new(accepting_engine),
            RetryPolicy::default(),
        )
        .with_output(output.clone());
        let script: &[u8] = b"place caf\xe9 1 2\nstats\nquit\n";

        let end = run_repl(&mut client, Cursor::new(script));

        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(client.transport().actions(), vec!["get_map", "get_stats"]);
        let text = output.contents();
        assert!(text.contains("[failed] Error: stream did not contain valid UTF-8"));
        assert!(text.ends_with("Goodbye!\n"));
    }

    #[test]
    fn queries_print_summaries() {
        let (_, _, output) = session("map\nbuildings\nquit\n");
        assert!(output.contains("[map] Map: 50x50"));
        assert!(output.contains("   - House at (26, 25)"));
    }
}
