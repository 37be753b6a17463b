use std::fmt;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::form_urlencoded;

use crate::NotifyError;

/// Display handle of the bot behind the configured token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub username: String,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Lightweight reachability check against the messaging API.
    async fn check_identity(&self) -> Result<BotIdentity, NotifyError>;

    /// Sends one message to the configured chat. No retries.
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

#[derive(Clone)]
pub struct NotifySettings {
    pub api_base: String,
    pub token: String,
    pub chat_id: String,
    pub timeout: Duration,
    pub parse_mode: String,
    pub disable_web_page_preview: bool,
}

impl NotifySettings {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            api_base: "https://api.telegram.org".to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            timeout: Duration::from_secs(10),
            parse_mode: "Markdown".to_string(),
            disable_web_page_preview: false,
        }
    }
}

// The token is a credential; keep it out of logs.
impl fmt::Debug for NotifySettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifySettings")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("timeout", &self.timeout)
            .field("parse_mode", &self.parse_mode)
            .field("disable_web_page_preview", &self.disable_web_page_preview)
            .finish()
    }
}

/// Telegram Bot API notifier.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    settings: NotifySettings,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ApiReply<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

impl TelegramNotifier {
    pub fn new(settings: NotifySettings) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| NotifyError::ClientSetup(err.to_string()))?;
        Ok(Self { settings, client })
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.settings.api_base.trim_end_matches('/'),
            self.settings.token,
            method
        )
    }

    fn send_body(&self, text: &str) -> String {
        let preview = if self.settings.disable_web_page_preview {
            "true"
        } else {
            "false"
        };
        form_urlencoded::Serializer::new(String::new())
            .append_pair("chat_id", &self.settings.chat_id)
            .append_pair("text", text)
            .append_pair("parse_mode", &self.settings.parse_mode)
            .append_pair("disable_web_page_preview", preview)
            .finish()
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn check_identity(&self) -> Result<BotIdentity, NotifyError> {
        let response = self
            .client
            .get(self.endpoint("getMe"))
            .send()
            .await
            .map_err(transport_error)?;
        let reply: ApiReply<BotUser> = read_reply(response).await?;
        if !reply.ok {
            return Err(NotifyError::Rejected {
                description: reply.description,
            });
        }
        reply
            .result
            .and_then(|user| user.username)
            .map(|username| BotIdentity { username })
            .ok_or_else(|| NotifyError::Malformed("getMe result without username".into()))
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.endpoint("sendMessage"))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(self.send_body(text))
            .send()
            .await
            .map_err(transport_error)?;
        let reply: ApiReply<serde_json::Value> = read_reply(response).await?;
        if reply.ok {
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                description: reply.description,
            })
        }
    }
}

async fn read_reply<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<ApiReply<T>, NotifyError> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;
    let parsed = serde_json::from_slice::<ApiReply<T>>(&body);

    if !status.is_success() {
        return Err(NotifyError::HttpStatus {
            status: status.as_u16(),
            description: parsed.ok().and_then(|reply| reply.description),
        });
    }
    parsed.map_err(|err| NotifyError::Malformed(err.to_string()))
}

// reqwest errors carry the request URL, which embeds the bot token.
fn transport_error(err: reqwest::Error) -> NotifyError {
    NotifyError::Transport(err.without_url().to_string())
}
