//! Line commands for the interactive sheet session

use crate::error::{Error, Result};
use crate::overlay::{SheetKind, SheetPayload};

/// One parsed session line
#[derive(Debug, Clone, PartialEq)]
pub enum SheetCommand {
    Open {
        kind: SheetKind,
        payload: Option<SheetPayload>,
    },
    Close(SheetKind),
    CloseAll,
    Prune,
    List,
    Help,
    Quit,
}

pub const SESSION_HELP: &str = "\
Commands:
  open <kind> [id] [key=value...]   open a detail sheet
  close <kind>                      close a sheet
  close-all                         close every sheet
  prune                             drop closed sheets
  list                              show sheets
  help                              show this help
  quit                              leave the session";

/// Parse a session line; blank lines are `None`
pub fn parse_line(line: &str) -> Result<Option<SheetCommand>> {
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let parsed = match command {
        "open" => {
            let kind = parse_kind(words.next())?;
            let payload = match words.next() {
                Some(id) => {
                    let mut payload = SheetPayload::new(id);
                    for pair in words {
                        let (key, value) = pair.split_once('=').ok_or_else(|| {
                            Error::Validation(format!("Expected key=value, got {}", pair))
                        })?;
                        payload = payload.with_field(key, value);
                    }
                    Some(payload)
                }
                None => None,
            };
            SheetCommand::Open { kind, payload }
        }
        "close" => SheetCommand::Close(parse_kind(words.next())?),
        "close-all" => SheetCommand::CloseAll,
        "prune" => SheetCommand::Prune,
        "list" | "ls" => SheetCommand::List,
        "help" | "?" => SheetCommand::Help,
        "quit" | "exit" => SheetCommand::Quit,
        other => {
            return Err(Error::Validation(format!("Unknown command: {}", other)));
        }
    };

    Ok(Some(parsed))
}

fn parse_kind(word: Option<&str>) -> Result<SheetKind> {
    word.ok_or_else(|| Error::Validation("Missing sheet kind".to_string()))?
        .parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open() {
        let command = parse_line("open merchant m-9 merchantName=Acme").unwrap().unwrap();
        assert_eq!(
            command,
            SheetCommand::Open {
                kind: SheetKind::Merchant,
                payload: Some(SheetPayload::new("m-9").with_field("merchantName", "Acme")),
            }
        );

        let command = parse_line("open provider").unwrap().unwrap();
        assert_eq!(
            command,
            SheetCommand::Open {
                kind: SheetKind::Provider,
                payload: None
            }
        );
    }

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(
            parse_line("close wallet-transactions").unwrap(),
            Some(SheetCommand::Close(SheetKind::WalletTransactions))
        );
        assert_eq!(parse_line("close-all").unwrap(), Some(SheetCommand::CloseAll));
        assert_eq!(parse_line("  ls ").unwrap(), Some(SheetCommand::List));
        assert_eq!(parse_line("quit").unwrap(), Some(SheetCommand::Quit));
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_line("open").is_err());
        assert!(parse_line("open currency c1").is_err());
        assert!(parse_line("open account a1 broken").is_err());
        assert!(parse_line("frobnicate").is_err());
    }
}
