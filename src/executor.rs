//! Per-target interaction protocol.
//!
//! A target is either a plain command send, or a compound
//! `"<command>,btn:<label>"` spec: send the command, give the bot a
//! fixed window to reply, then press the first inline button whose
//! label contains the configured substring.

use color_eyre::eyre::Result;
use tokio::time::{Duration, sleep};

use crate::registry::{Roster, Target, display_name};
use crate::report::Outcome;
use crate::session::Session;

/// Fixed window for a bot's reply to arrive before the button scan.
/// Always waited in full; this is a delay, not a race.
pub const BUTTON_WAIT: Duration = Duration::from_millis(5000);

/// How many recent messages to scan for the button.
pub const FETCH_LIMIT: usize = 5;

/// Separator between the command and the button label substring.
const BUTTON_SEPARATOR: &str = ",btn:";

/// A parsed command spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub command: String,
    /// Label substring to press after sending, if the compound form
    /// was used.
    pub button: Option<String>,
}

impl CommandSpec {
    /// Split on the first `,btn:` only; everything after it is the
    /// label substring, verbatim.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(BUTTON_SEPARATOR) {
            Some((command, label)) => Self {
                command: command.to_string(),
                button: Some(label.to_string()),
            },
            None => Self {
                command: raw.to_string(),
                button: None,
            },
        }
    }
}

/// Run one target's check-in interaction and classify the result.
///
/// Missing contact / missing command are recorded without touching the
/// network. Session errors propagate to the caller and abort the run;
/// retry policy (if any) belongs below the [`Session`] seam.
pub async fn execute(session: &dyn Session, target: &Target, roster: &Roster) -> Result<Outcome> {
    let contact = roster.lookup(&target.identifier);
    let name = display_name(target, contact);

    let Some(contact) = contact else {
        return Ok(Outcome::missing_contact(&target.identifier, &name));
    };

    if target.command.is_empty() {
        return Ok(Outcome::missing_command(&target.identifier, &name));
    }

    let spec = CommandSpec::parse(&target.command);
    session.send_message(&contact.identifier, &spec.command).await?;

    let Some(label) = &spec.button else {
        return Ok(Outcome::success(&target.identifier, &name));
    };

    sleep(BUTTON_WAIT).await;

    let messages = session
        .recent_messages(&contact.identifier, FETCH_LIMIT)
        .await?;

    // Linear scan over the flattened grids, newest message first.
    // At most one press per target: return on the first label match.
    for message in &messages {
        for button in message.buttons.iter().flatten() {
            if button.label.contains(label.as_str()) {
                session
                    .press_button(&contact.identifier, message.message_id, &button.data)
                    .await?;
                return Ok(Outcome::success(&target.identifier, &name));
            }
        }
    }

    Ok(Outcome::missing_button(&target.identifier, &name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compound_spec() {
        let spec = CommandSpec::parse("/sign,btn:Confirm");
        assert_eq!(spec.command, "/sign");
        assert_eq!(spec.button.as_deref(), Some("Confirm"));
    }

    #[test]
    fn test_parse_plain_spec() {
        let spec = CommandSpec::parse("/sign");
        assert_eq!(spec.command, "/sign");
        assert!(spec.button.is_none());
    }

    #[test]
    fn test_parse_splits_on_first_separator_only() {
        let spec = CommandSpec::parse("/go,btn:Claim,btn:Other");
        assert_eq!(spec.command, "/go");
        assert_eq!(spec.button.as_deref(), Some("Claim,btn:Other"));
    }

    #[test]
    fn test_parse_empty_label() {
        let spec = CommandSpec::parse("/go,btn:");
        assert_eq!(spec.command, "/go");
        assert_eq!(spec.button.as_deref(), Some(""));
    }
}
