use serde::{Deserialize, Serialize};

/// Lowest latency ever shown to the user, in milliseconds.
pub const LATENCY_FLOOR_MS: u32 = 10;

/// A simulated VPN endpoint. `id` is the stable identity; `latency_ms` is the
/// only field that changes after the initial load.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Node {
    pub id: String,
    pub name: String,
    pub country: String,
    pub latency_ms: u32,
    pub ip_address: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Latency,
    Country,
}

/// A parsed line of user input; the terminal stand-in for GUI events.
#[derive(Clone, Debug, PartialEq)]
pub enum UiCommand {
    Sort(SortKey),
    Filter(String),
    Connect(String),
    Disconnect,
    Quit,
}

impl UiCommand {
    pub fn parse(line: &str) -> Result<UiCommand, String> {
        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("");
        let rest = parts.next().unwrap_or("").trim();

        match verb {
            "sort" => match rest {
                "ping" | "latency" => Ok(UiCommand::Sort(SortKey::Latency)),
                "country" => Ok(UiCommand::Sort(SortKey::Country)),
                _ => Err("usage: sort ping|country".to_string()),
            },
            "filter" => Ok(UiCommand::Filter(rest.to_string())),
            "connect" => {
                if rest.is_empty() {
                    Err("usage: connect <node-id>".to_string())
                } else {
                    Ok(UiCommand::Connect(rest.to_string()))
                }
            }
            "disconnect" => Ok(UiCommand::Disconnect),
            "quit" | "exit" => Ok(UiCommand::Quit),
            other => Err(format!(
                "unknown command '{}' (sort, filter, connect, disconnect, quit)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sort_variants() {
        assert_eq!(
            UiCommand::parse("sort ping"),
            Ok(UiCommand::Sort(SortKey::Latency))
        );
        assert_eq!(
            UiCommand::parse("sort latency"),
            Ok(UiCommand::Sort(SortKey::Latency))
        );
        assert_eq!(
            UiCommand::parse("  sort country  "),
            Ok(UiCommand::Sort(SortKey::Country))
        );
        assert!(UiCommand::parse("sort name").is_err());
    }

    #[test]
    fn filter_keeps_rest_of_line() {
        assert_eq!(
            UiCommand::parse("filter united kingdom"),
            Ok(UiCommand::Filter("united kingdom".to_string()))
        );
        // Bare "filter" clears the filter.
        assert_eq!(
            UiCommand::parse("filter"),
            Ok(UiCommand::Filter(String::new()))
        );
    }

    #[test]
    fn connect_requires_an_id() {
        assert_eq!(
            UiCommand::parse("connect us-1"),
            Ok(UiCommand::Connect("us-1".to_string()))
        );
        assert!(UiCommand::parse("connect").is_err());
    }

    #[test]
    fn rejects_unknown_verbs_with_a_hint() {
        let err = UiCommand::parse("teleport jp-1").unwrap_err();
        assert!(err.contains("teleport"));
    }
}
