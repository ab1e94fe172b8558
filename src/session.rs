//! Session seam for the Telegram user-session gateway.
//!
//! The MTProto connection itself lives in an external gateway process;
//! this module speaks plain JSON to it via reqwest. The [`Session`]
//! trait is the boundary the orchestration is written against, so the
//! whole check-in flow is testable with a scripted mock.

use async_trait::async_trait;
use color_eyre::eyre::{Result, bail};
use serde::Deserialize;

use crate::config::{AccountConfig, GatewayConfig, ProxyConfig};
use crate::registry::ResolvedContact;

/// One clickable button from an inline keyboard.
#[derive(Debug, Clone)]
pub struct InlineButton {
    pub label: String,
    /// Opaque callback payload passed back on press.
    pub data: String,
}

/// A fetched message, optionally carrying an inline button grid
/// (rows of buttons, as laid out in the chat).
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: i64,
    pub buttons: Vec<Vec<InlineButton>>,
}

/// The capabilities the check-in loop needs from a live session.
#[async_trait]
pub trait Session: Send + Sync {
    /// Point-in-time snapshot of reachable bot/channel/group contacts.
    async fn roster(&self) -> Result<Vec<ResolvedContact>>;

    /// Send a plain text message to a contact.
    async fn send_message(&self, identifier: &str, text: &str) -> Result<()>;

    /// Send a formatted message (e.g. the HTML report) to a contact.
    /// `parse_mode` is a content-type hint such as `"html"`.
    async fn send_formatted(&self, identifier: &str, text: &str, parse_mode: &str) -> Result<()>;

    /// Fetch the most recent messages for a contact, newest first.
    ///
    /// Implementations must normalize to newest-first ordering
    /// regardless of what the underlying transport returns — the
    /// button scan depends on it.
    async fn recent_messages(&self, identifier: &str, limit: usize) -> Result<Vec<InboundMessage>>;

    /// Press an inline button on a previously fetched message.
    async fn press_button(&self, identifier: &str, message_id: i64, data: &str) -> Result<()>;

    /// Gracefully tear the session down.
    async fn disconnect(&self) -> Result<()>;
}

// --- Gateway wire types ---

#[derive(Debug, Deserialize)]
struct GatewayResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireDialog {
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    is_bot: bool,
    #[serde(default)]
    is_channel: bool,
    #[serde(default)]
    is_group: bool,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    message_id: i64,
    #[serde(default)]
    reply_markup: Option<WireKeyboard>,
}

#[derive(Debug, Deserialize)]
struct WireKeyboard {
    #[serde(default)]
    inline_keyboard: Vec<Vec<WireButton>>,
}

#[derive(Debug, Deserialize)]
struct WireButton {
    text: String,
    #[serde(default)]
    callback_data: Option<String>,
}

impl From<WireMessage> for InboundMessage {
    fn from(msg: WireMessage) -> Self {
        let buttons = msg
            .reply_markup
            .map(|kb| {
                kb.inline_keyboard
                    .into_iter()
                    .map(|row| {
                        row.into_iter()
                            .map(|b| InlineButton {
                                label: b.text,
                                data: b.callback_data.unwrap_or_default(),
                            })
                            .collect()
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            message_id: msg.message_id,
            buttons,
        }
    }
}

/// Session backed by the gateway's HTTP API.
pub struct TelegramSession {
    api_base: String,
    client: reqwest::Client,
}

impl TelegramSession {
    pub fn new(gateway: &GatewayConfig, proxy: Option<&ProxyConfig>) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(gateway.timeout_secs));

        if let Some(proxy) = proxy
            && !proxy.ip.is_empty()
            && proxy.port != 0
        {
            builder = builder.proxy(reqwest::Proxy::all(proxy.url())?);
        }

        Ok(Self {
            api_base: gateway.api_base.trim_end_matches('/').to_string(),
            client: builder.build()?,
        })
    }

    fn api_url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base)
    }

    /// POST a method call and unwrap the `{ok, result, description}`
    /// envelope.
    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&payload)
            .send()
            .await?;

        let body: GatewayResponse<T> = resp.json().await?;

        if !body.ok {
            let desc = body.description.unwrap_or_default();
            bail!("gateway error from {method}: {desc}");
        }

        match body.result {
            Some(result) => Ok(result),
            None => bail!("gateway returned ok without a result for {method}"),
        }
    }

    /// Like `call` but for methods whose result payload is irrelevant.
    async fn call_unit(&self, method: &str, payload: serde_json::Value) -> Result<()> {
        let resp = self
            .client
            .post(self.api_url(method))
            .json(&payload)
            .send()
            .await?;

        let body: GatewayResponse<serde_json::Value> = resp.json().await?;

        if !body.ok {
            let desc = body.description.unwrap_or_default();
            bail!("gateway error from {method}: {desc}");
        }

        Ok(())
    }

    /// Hand the account credentials to the gateway and start (or
    /// resume) the user session. The MTProto handshake happens on the
    /// gateway side.
    pub async fn connect(&self, account: &AccountConfig) -> Result<()> {
        self.call_unit(
            "start",
            serde_json::json!({
                "api_id": account.api_id,
                "api_hash": account.api_hash,
                "phone": account.phone,
                "session": account.session,
                "device_model": account.device_model,
                "system_version": account.system_version,
                "app_version": account.app_version,
                "lang_code": account.lang_code,
                "system_lang_code": account.system_lang_code,
            }),
        )
        .await
    }
}

#[async_trait]
impl Session for TelegramSession {
    async fn roster(&self) -> Result<Vec<ResolvedContact>> {
        let dialogs: Vec<WireDialog> = self.call("getDialogs", serde_json::json!({})).await?;

        Ok(dialogs
            .into_iter()
            .filter(|d| d.is_bot || d.is_channel || d.is_group)
            .filter_map(|d| {
                let username = d.username?;
                if username.is_empty() {
                    return None;
                }
                Some(ResolvedContact {
                    identifier: username,
                    display_name: d.name,
                })
            })
            .collect())
    }

    async fn send_message(&self, identifier: &str, text: &str) -> Result<()> {
        self.call_unit(
            "sendMessage",
            serde_json::json!({
                "peer": identifier,
                "message": text,
            }),
        )
        .await
    }

    async fn send_formatted(&self, identifier: &str, text: &str, parse_mode: &str) -> Result<()> {
        self.call_unit(
            "sendMessage",
            serde_json::json!({
                "peer": identifier,
                "message": text,
                "parse_mode": parse_mode,
            }),
        )
        .await
    }

    async fn recent_messages(&self, identifier: &str, limit: usize) -> Result<Vec<InboundMessage>> {
        let messages: Vec<WireMessage> = self
            .call(
                "getHistory",
                serde_json::json!({
                    "peer": identifier,
                    "limit": limit,
                }),
            )
            .await?;

        let mut messages: Vec<InboundMessage> =
            messages.into_iter().map(InboundMessage::from).collect();

        // Normalize to newest-first; the gateway's default ordering is
        // not part of its contract.
        messages.sort_by(|a, b| b.message_id.cmp(&a.message_id));

        Ok(messages)
    }

    async fn press_button(&self, identifier: &str, message_id: i64, data: &str) -> Result<()> {
        self.call_unit(
            "pressInlineButton",
            serde_json::json!({
                "peer": identifier,
                "message_id": message_id,
                "data": data,
            }),
        )
        .await
    }

    async fn disconnect(&self) -> Result<()> {
        self.call_unit("disconnect", serde_json::json!({})).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_error_description() {
        let body: GatewayResponse<Vec<WireDialog>> =
            serde_json::from_str(r#"{"ok": false, "description": "FLOOD_WAIT"}"#).unwrap();
        assert!(!body.ok);
        assert_eq!(body.description.as_deref(), Some("FLOOD_WAIT"));
        assert!(body.result.is_none());
    }

    #[test]
    fn test_wire_message_without_keyboard() {
        let msg: WireMessage = serde_json::from_str(r#"{"message_id": 7}"#).unwrap();
        let inbound = InboundMessage::from(msg);
        assert_eq!(inbound.message_id, 7);
        assert!(inbound.buttons.is_empty());
    }

    #[test]
    fn test_wire_message_keyboard_grid() {
        let msg: WireMessage = serde_json::from_str(
            r#"{
                "message_id": 9,
                "reply_markup": {
                    "inline_keyboard": [
                        [{"text": "Sign in", "callback_data": "cb:1"}],
                        [{"text": "Cancel"}]
                    ]
                }
            }"#,
        )
        .unwrap();

        let inbound = InboundMessage::from(msg);
        assert_eq!(inbound.buttons.len(), 2);
        assert_eq!(inbound.buttons[0][0].label, "Sign in");
        assert_eq!(inbound.buttons[0][0].data, "cb:1");
        // Buttons without callback data still flatten cleanly.
        assert_eq!(inbound.buttons[1][0].data, "");
    }

    #[test]
    fn test_dialog_defaults() {
        let dialog: WireDialog =
            serde_json::from_str(r#"{"username": "some_bot", "name": "Some Bot", "is_bot": true}"#)
                .unwrap();
        assert!(dialog.is_bot);
        assert!(!dialog.is_channel);
        assert_eq!(dialog.username.as_deref(), Some("some_bot"));
    }
}
