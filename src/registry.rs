//! Target registry — turns the configured `[signin]` table and the
//! live roster snapshot into matchable, resolvable targets.
//!
//! Matching is literal string equality on the identifier (Telegram
//! handles are case-preserving, the config is expected to match them
//! exactly). Resolution is a pure join; nothing here talks to the
//! network.

use std::collections::HashMap;

/// Reserved config key that holds the default/placeholder command.
/// Never a real target.
pub const RESERVED_KEY: &str = "_";

/// Predicate for the reserved placeholder key, kept explicit so the
/// filtering happens exactly once at this boundary.
pub fn is_reserved_key(key: &str) -> bool {
    key == RESERVED_KEY
}

/// A configured check-in target.
#[derive(Debug, Clone)]
pub struct Target {
    /// Platform handle, e.g. `some_signin_bot`.
    pub identifier: String,
    /// Raw command spec from config (may carry a `,btn:` suffix).
    pub command: String,
    /// Display override from the `[alias]` table, if any.
    pub alias: Option<String>,
}

/// A live, reachable contact from the roster snapshot.
#[derive(Debug, Clone)]
pub struct ResolvedContact {
    pub identifier: String,
    pub display_name: String,
}

/// Point-in-time roster snapshot, keyed for exact-match lookup.
#[derive(Debug, Default)]
pub struct Roster {
    by_identifier: HashMap<String, ResolvedContact>,
}

impl Roster {
    pub fn new(contacts: Vec<ResolvedContact>) -> Self {
        let by_identifier = contacts
            .into_iter()
            .map(|c| (c.identifier.clone(), c))
            .collect();
        Self { by_identifier }
    }

    /// Exact, case-sensitive identifier lookup.
    pub fn lookup(&self, identifier: &str) -> Option<&ResolvedContact> {
        self.by_identifier.get(identifier)
    }

    pub fn len(&self) -> usize {
        self.by_identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_identifier.is_empty()
    }
}

/// Build the target list from the `[signin]` and `[alias]` tables.
///
/// Skips the reserved placeholder key and preserves the table's
/// insertion order — the run loop processes targets in config order.
pub fn targets_from_config(signin: &toml::Table, aliases: &toml::Table) -> Vec<Target> {
    signin
        .iter()
        .filter(|(key, _)| !is_reserved_key(key))
        .map(|(key, value)| Target {
            identifier: key.clone(),
            command: value.as_str().unwrap_or_default().to_string(),
            alias: aliases
                .get(key)
                .and_then(|v| v.as_str())
                .filter(|s| !s.is_empty())
                .map(String::from),
        })
        .collect()
}

/// Pick the name shown for a target: configured alias, then the live
/// contact's name, then the raw identifier. First non-empty wins.
pub fn display_name(target: &Target, contact: Option<&ResolvedContact>) -> String {
    if let Some(alias) = &target.alias
        && !alias.is_empty()
    {
        return alias.clone();
    }
    if let Some(contact) = contact
        && !contact.display_name.is_empty()
    {
        return contact.display_name.clone();
    }
    target.identifier.clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(&str, &str)]) -> toml::Table {
        let mut t = toml::Table::new();
        for (k, v) in pairs {
            t.insert(k.to_string(), toml::Value::String(v.to_string()));
        }
        t
    }

    #[test]
    fn test_reserved_key_is_skipped() {
        let signin = table(&[("_", "/sign"), ("bot_a", "/checkin")]);
        let targets = targets_from_config(&signin, &toml::Table::new());

        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].identifier, "bot_a");
    }

    #[test]
    fn test_targets_preserve_config_order() {
        let signin = table(&[("zeta", "/z"), ("alpha", "/a"), ("mid", "/m")]);
        let targets = targets_from_config(&signin, &toml::Table::new());

        let ids: Vec<_> = targets.iter().map(|t| t.identifier.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_alias_attached_from_alias_table() {
        let signin = table(&[("bot_a", "/checkin")]);
        let aliases = table(&[("bot_a", "Daily Bot")]);
        let targets = targets_from_config(&signin, &aliases);

        assert_eq!(targets[0].alias.as_deref(), Some("Daily Bot"));
    }

    #[test]
    fn test_empty_alias_is_ignored() {
        let signin = table(&[("bot_a", "/checkin")]);
        let aliases = table(&[("bot_a", "")]);
        let targets = targets_from_config(&signin, &aliases);

        assert!(targets[0].alias.is_none());
    }

    #[test]
    fn test_roster_lookup_is_case_sensitive() {
        let roster = Roster::new(vec![ResolvedContact {
            identifier: "Bot_A".into(),
            display_name: "Bot A".into(),
        }]);

        assert!(roster.lookup("Bot_A").is_some());
        assert!(roster.lookup("bot_a").is_none());
    }

    #[test]
    fn test_roster_size() {
        assert!(Roster::new(vec![]).is_empty());

        let roster = Roster::new(vec![ResolvedContact {
            identifier: "a".into(),
            display_name: "A".into(),
        }]);
        assert_eq!(roster.len(), 1);
        assert!(!roster.is_empty());
    }

    #[test]
    fn test_display_name_alias_wins() {
        let target = Target {
            identifier: "baz".into(),
            command: "/sign".into(),
            alias: Some("Foo".into()),
        };
        let contact = ResolvedContact {
            identifier: "baz".into(),
            display_name: "Bar".into(),
        };

        assert_eq!(display_name(&target, Some(&contact)), "Foo");
    }

    #[test]
    fn test_display_name_falls_back_to_contact() {
        let target = Target {
            identifier: "baz".into(),
            command: "/sign".into(),
            alias: None,
        };
        let contact = ResolvedContact {
            identifier: "baz".into(),
            display_name: "Bar".into(),
        };

        assert_eq!(display_name(&target, Some(&contact)), "Bar");
    }

    #[test]
    fn test_display_name_falls_back_to_identifier() {
        let target = Target {
            identifier: "baz".into(),
            command: "/sign".into(),
            alias: None,
        };

        assert_eq!(display_name(&target, None), "baz");
    }

    #[test]
    fn test_display_name_skips_empty_contact_name() {
        let target = Target {
            identifier: "baz".into(),
            command: "/sign".into(),
            alias: None,
        };
        let contact = ResolvedContact {
            identifier: "baz".into(),
            display_name: String::new(),
        };

        assert_eq!(display_name(&target, Some(&contact)), "baz");
    }
}
