//! Configuration loaded from `data/config.toml`.
//!
//! # Configuration file format
//!
//! `punch init` writes this skeleton; every section except `[account]`
//! credentials works with its defaults.
//!
//! ```toml
//! [account]
//! api_id = 0              # from my.telegram.org (required)
//! api_hash = ""           # from my.telegram.org (required)
//! phone = ""              # account phone number (required)
//! session = ""            # saved session string, filled after first login
//! # device_model / system_version / app_version / lang_code /
//! # system_lang_code — optional client fingerprint overrides.
//!
//! [gateway]
//! api_base = "http://127.0.0.1:8081"  # user-session HTTP gateway
//! timeout_secs = 30
//!
//! # Optional SOCKS proxy for gateway traffic — omit section to disable.
//! [proxy]
//! ip = "127.0.0.1"
//! port = 1080
//! # username = ""
//! # password = ""
//! socks_type = 5          # 4 or 5
//!
//! # Check-in targets: handle -> command. Processed in file order.
//! # "_" is a placeholder holding the default command, never sent.
//! [signin]
//! _ = "/sign"
//! # daily_bot = "/checkin"
//! # reward_bot = "/sign,btn:Confirm"   # press the matching button too
//!
//! # Optional display overrides for the report.
//! [alias]
//! # daily_bot = "Daily Check-in"
//!
//! [notify]
//! chat = ""               # where the HTML report is delivered
//! parse_mode = "html"
//! enabled = true
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::registry::{Target, is_reserved_key, targets_from_config};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PunchConfig {
    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub gateway: GatewayConfig,

    /// SOCKS proxy for gateway traffic (optional — omit to disable).
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,

    /// Check-in targets: identifier -> command spec, in file order.
    #[serde(default)]
    pub signin: toml::Table,

    /// Display-name overrides: identifier -> alias.
    #[serde(default)]
    pub alias: toml::Table,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Telegram account credentials and client fingerprint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountConfig {
    #[serde(default)]
    pub api_id: i64,
    #[serde(default)]
    pub api_hash: String,
    #[serde(default)]
    pub phone: String,
    /// Saved session string; empty on first run.
    #[serde(default)]
    pub session: String,

    #[serde(default)]
    pub device_model: String,
    #[serde(default)]
    pub system_version: String,
    #[serde(default)]
    pub app_version: String,
    #[serde(default)]
    pub lang_code: String,
    #[serde(default)]
    pub system_lang_code: String,
}

impl AccountConfig {
    /// The run must not start without these; see the precondition
    /// handling in `run`.
    pub fn has_credentials(&self) -> bool {
        self.api_id != 0 && !self.api_hash.is_empty() && !self.phone.is_empty()
    }
}

/// Gateway endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// SOCKS proxy configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// SOCKS protocol version: 4 or 5.
    #[serde(default = "default_socks_type")]
    pub socks_type: u8,
}

impl ProxyConfig {
    /// Proxy URL for the HTTP client.
    pub fn url(&self) -> String {
        let scheme = if self.socks_type == 4 { "socks4" } else { "socks5" };
        if self.username.is_empty() {
            format!("{scheme}://{}:{}", self.ip, self.port)
        } else {
            format!(
                "{scheme}://{}:{}@{}:{}",
                self.username, self.password, self.ip, self.port
            )
        }
    }
}

/// Report delivery configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    /// Named channel key (chat identifier) the report is sent to.
    #[serde(default)]
    pub chat: String,
    /// Content-type hint for the delivery, e.g. "html".
    #[serde(default = "default_parse_mode")]
    pub parse_mode: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            chat: String::new(),
            parse_mode: default_parse_mode(),
            enabled: true,
        }
    }
}

fn default_api_base() -> String {
    "http://127.0.0.1:8081".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_socks_type() -> u8 {
    5
}

fn default_parse_mode() -> String {
    "html".to_string()
}

fn default_true() -> bool {
    true
}

/// Default config skeleton written by `punch init`.
pub const DEFAULT_CONFIG: &str = r#"[account]
api_id = 0
api_hash = ""
phone = ""
session = ""

[gateway]
api_base = "http://127.0.0.1:8081"
timeout_secs = 30

# Check-in targets: handle -> command, processed in file order.
# "_" holds the default command placeholder and is never sent.
[signin]
_ = "/sign"

[alias]

[notify]
chat = ""
parse_mode = "html"
enabled = true
"#;

impl PunchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                color_eyre::eyre::eyre!(
                    "No config found at {}\n\n\
                     To set up punch:\n\
                     1. Run: punch init\n\
                     2. Fill in [account] api_id / api_hash / phone\n\
                        (create an app at my.telegram.org to get them)\n\
                     3. Add your bots under [signin], e.g.:\n\n\
                     [signin]\n\
                     daily_bot = \"/checkin\"\n\
                     reward_bot = \"/sign,btn:Confirm\"\n",
                    path.display()
                )
            } else {
                color_eyre::eyre::eyre!("failed to read {}: {e}", path.display())
            }
        })?;

        let config: PunchConfig = toml::from_str(&content)
            .map_err(|e| color_eyre::eyre::eyre!("failed to parse {}: {e}", path.display()))?;

        config.validate();
        Ok(config)
    }

    /// Write the default skeleton at `path`, creating parent
    /// directories. Refuses to overwrite an existing file.
    pub fn init_at(path: &Path) -> color_eyre::Result<()> {
        if path.exists() {
            color_eyre::eyre::bail!("config already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_CONFIG)?;
        Ok(())
    }

    /// Targets in config order, reserved key skipped, aliases attached.
    pub fn targets(&self) -> Vec<Target> {
        targets_from_config(&self.signin, &self.alias)
    }

    /// Print warnings for common configuration issues.
    /// Does not return errors — credentials are checked separately as
    /// a run precondition.
    fn validate(&self) {
        let real_targets = self.signin.keys().filter(|k| !is_reserved_key(k)).count();
        if real_targets == 0 {
            eprintln!("[punch] note: no targets under [signin] — nothing to check in");
        }

        for key in self.alias.keys() {
            if !self.signin.contains_key(key) {
                eprintln!("[punch] warning: [alias] entry '{key}' has no matching [signin] target");
            }
        }

        if self.notify.enabled && self.notify.chat.is_empty() {
            eprintln!("[punch] warning: notify.enabled is true but notify.chat is empty — report will not be delivered");
        }

        if let Some(proxy) = &self.proxy
            && proxy.socks_type != 4
            && proxy.socks_type != 5
        {
            eprintln!(
                "[punch] warning: proxy.socks_type is {}, expected 4 or 5",
                proxy.socks_type
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[account]
api_id = 12345
api_hash = "abcdef"
phone = "+10000000000"
session = "1BJWap..."

[gateway]
api_base = "http://127.0.0.1:9999"
timeout_secs = 10

[proxy]
ip = "10.0.0.1"
port = 1080
username = "u"
password = "p"

[signin]
_ = "/sign"
daily_bot = "/checkin"
reward_bot = "/sign,btn:Confirm"

[alias]
daily_bot = "Daily"

[notify]
chat = "my_notify_channel"
parse_mode = "html"
enabled = true
"#;
        let config: PunchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.account.api_id, 12345);
        assert!(config.account.has_credentials());
        assert_eq!(config.gateway.api_base, "http://127.0.0.1:9999");
        assert_eq!(config.gateway.timeout_secs, 10);
        assert_eq!(config.proxy.as_ref().unwrap().socks_type, 5);
        assert_eq!(config.notify.chat, "my_notify_channel");

        let targets = config.targets();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].identifier, "daily_bot");
        assert_eq!(targets[0].alias.as_deref(), Some("Daily"));
        assert_eq!(targets[1].command, "/sign,btn:Confirm");
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: PunchConfig = toml::from_str("").unwrap();
        assert!(!config.account.has_credentials());
        assert_eq!(config.gateway.api_base, "http://127.0.0.1:8081");
        assert_eq!(config.gateway.timeout_secs, 30);
        assert!(config.proxy.is_none());
        assert!(config.notify.enabled);
        assert_eq!(config.notify.parse_mode, "html");
        assert!(config.targets().is_empty());
    }

    #[test]
    fn test_signin_order_is_preserved() {
        let config: PunchConfig = toml::from_str(
            r#"
[signin]
zeta = "/z"
alpha = "/a"
mid = "/m"
"#,
        )
        .unwrap();

        let ids: Vec<_> = config
            .targets()
            .iter()
            .map(|t| t.identifier.clone())
            .collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_has_credentials_requires_all_three() {
        let mut account = AccountConfig {
            api_id: 1,
            api_hash: "h".into(),
            phone: "+1".into(),
            ..Default::default()
        };
        assert!(account.has_credentials());

        account.phone.clear();
        assert!(!account.has_credentials());
    }

    #[test]
    fn test_proxy_url_with_and_without_auth() {
        let mut proxy = ProxyConfig {
            ip: "10.0.0.1".into(),
            port: 1080,
            username: String::new(),
            password: String::new(),
            socks_type: 5,
        };
        assert_eq!(proxy.url(), "socks5://10.0.0.1:1080");

        proxy.username = "u".into();
        proxy.password = "p".into();
        assert_eq!(proxy.url(), "socks5://u:p@10.0.0.1:1080");

        proxy.socks_type = 4;
        assert!(proxy.url().starts_with("socks4://"));
    }

    #[test]
    fn test_default_skeleton_parses() {
        let config: PunchConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(!config.account.has_credentials());
        // The skeleton ships only the reserved placeholder.
        assert!(config.targets().is_empty());
        assert!(config.signin.contains_key("_"));
    }
}
