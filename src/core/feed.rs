//! Parser for the line-oriented event feed read by the desktop harness.
//!
//! ```text
//! sms <sender> <body...>
//! call idle|ringing|offhook
//! ack | stop | abort | reload | quit
//! ```

use std::time::Instant;

use lazy_static::lazy_static;
use regex::Regex;

use super::ack::model::CallState;
use super::coordinator::RelayEvent;

lazy_static! {
    // The body keeps its spacing verbatim; only the separator after the sender is consumed.
    static ref SMS_LINE: Regex = Regex::new(r"^sms\s+(\S+) (.*)$").expect("Invalid sms regex");
    static ref CALL_LINE: Regex =
        Regex::new(r"(?i)^call\s+(idle|ringing|offhook)\s*$").expect("Invalid call regex");
}

/// A parsed feed line. `Reload` asks the reader to load settings from disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedCommand {
    Event(RelayEvent),
    Reload,
}

/// Parse one feed line read at `received`. Unknown or blank lines yield `None`.
pub fn parse_feed_line(line: &str, received: Instant) -> Option<FeedCommand> {
    // Strip BOM and line endings, keep inner spacing
    let line = line.trim_start_matches('\u{feff}').trim_end_matches(['\r', '\n']);

    if let Some(caps) = SMS_LINE.captures(line) {
        return Some(FeedCommand::Event(RelayEvent::Message {
            sender: caps.get(1)?.as_str().to_string(),
            body: caps.get(2)?.as_str().to_string(),
        }));
    }

    if let Some(caps) = CALL_LINE.captures(line) {
        let state = match caps.get(1)?.as_str().to_lowercase().as_str() {
            "idle" => CallState::Idle,
            "ringing" => CallState::Ringing,
            _ => CallState::OffHook,
        };
        return Some(FeedCommand::Event(RelayEvent::CallState(state, received)));
    }

    let event = match line.trim().to_lowercase().as_str() {
        "ack" => RelayEvent::Acknowledge,
        "stop" => RelayEvent::StopSignal,
        "abort" => RelayEvent::AbortAcknowledgment,
        "reload" => return Some(FeedCommand::Reload),
        "quit" | "exit" => RelayEvent::Shutdown,
        _ => return None,
    };
    Some(FeedCommand::Event(event))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn event(line: &str) -> Option<RelayEvent> {
        match parse_feed_line(line, Instant::now())? {
            FeedCommand::Event(event) => Some(event),
            FeedCommand::Reload => None,
        }
    }

    #[test]
    fn test_parse_sms_keeps_body_spacing() {
        assert_eq!(
            event("sms +4711 Smoke  on floor\t3\n"),
            Some(RelayEvent::Message {
                sender: "+4711".to_string(),
                body: "Smoke  on floor\t3".to_string(),
            })
        );
    }

    #[test]
    fn test_parse_sms_empty_body() {
        let event = event("sms 112 ").unwrap();
        assert!(matches!(event, RelayEvent::Message { ref body, .. } if body.is_empty()));
    }

    #[test]
    fn test_parse_call_states_carry_read_time() {
        let t0 = Instant::now();
        let read_at = t0 + Duration::from_millis(1500);
        assert_eq!(
            parse_feed_line("call OFFHOOK", read_at),
            Some(FeedCommand::Event(RelayEvent::CallState(CallState::OffHook, read_at)))
        );
        assert_eq!(
            parse_feed_line("call ringing", t0),
            Some(FeedCommand::Event(RelayEvent::CallState(CallState::Ringing, t0)))
        );
        assert_eq!(
            parse_feed_line("call idle ", t0),
            Some(FeedCommand::Event(RelayEvent::CallState(CallState::Idle, t0)))
        );
        assert_eq!(parse_feed_line("call dropped", t0), None);
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(event("ack"), Some(RelayEvent::Acknowledge));
        assert_eq!(event(" STOP "), Some(RelayEvent::StopSignal));
        assert_eq!(event("abort"), Some(RelayEvent::AbortAcknowledgment));
        assert_eq!(event("quit"), Some(RelayEvent::Shutdown));
        assert_eq!(parse_feed_line("reload", Instant::now()), Some(FeedCommand::Reload));
        assert_eq!(parse_feed_line("", Instant::now()), None);
        assert_eq!(parse_feed_line("hello", Instant::now()), None);
    }
}
