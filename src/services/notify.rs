//! Lead notifications
//!
//! New leads are relayed to a Telegram chat through the Bot API
//! `sendMessage` method. Delivery is best effort: the same payload is tried
//! as a GET query, then a JSON POST, then a form POST, and the first
//! successful response wins.

use crate::config::TelegramConfig;
use crate::models::LeadRequest;
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use std::time::Duration;

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Error returned when every delivery attempt failed
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Failed to encode payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Destination for lead notifications
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an HTML-formatted message
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

/// Telegram Bot API notifier
pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(
        api_base: &str,
        bot_token: &str,
        chat_id: &str,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                bot_token
            ),
            chat_id: chat_id.to_string(),
        })
    }

    /// Build a notifier from configuration, `None` when token or chat id is missing
    pub fn from_config(config: &TelegramConfig) -> Result<Option<Self>, NotifyError> {
        if !config.is_enabled() {
            return Ok(None);
        }

        Self::new(
            &config.api_base,
            &config.bot_token,
            &config.chat_id,
            Duration::from_secs(config.timeout_secs),
        )
        .map(Some)
    }

    fn query_pairs<'a>(&'a self, text: &'a str) -> [(&'static str, &'a str); 4] {
        [
            ("chat_id", self.chat_id.as_str()),
            ("text", text),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ]
    }

    async fn send_get(&self, text: &str) -> Result<(), NotifyError> {
        self.client
            .get(&self.url)
            .query(&self.query_pairs(text))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn send_json(&self, text: &str) -> Result<(), NotifyError> {
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });

        let mut request = self
            .client
            .post(&self.url)
            .body(serde_json::to_vec(&payload)?)
            .build()?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));

        self.client.execute(request).await?.error_for_status()?;
        Ok(())
    }

    async fn send_form(&self, text: &str) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(&self.url)
            .form(&self.query_pairs(text))
            .build()?;
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));

        self.client.execute(request).await?.error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        match self.send_get(text).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!("Telegram GET attempt failed: {}", e),
        }

        match self.send_json(text).await {
            Ok(()) => return Ok(()),
            Err(e) => tracing::debug!("Telegram JSON attempt failed: {}", e),
        }

        self.send_form(text).await
    }
}

/// Escape `&`, `<` and `>` for Telegram HTML; quotes are left alone.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the notification text for a new lead
pub fn lead_message(lead: &LeadRequest) -> String {
    let mut lines = vec!["<b>Новая заявка с сайта</b>".to_string()];

    let fields = [
        ("Имя", &lead.full_name),
        ("Телефон", &lead.phone),
        ("Email", &lead.email),
        ("Направление", &lead.preferred_direction),
        ("Источник", &lead.source),
        ("Сообщение", &lead.message),
    ];
    for (label, value) in fields {
        let value = value.trim();
        if !value.is_empty() {
            lines.push(format!("<b>{}:</b> {}", label, escape_html(value)));
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn lead() -> LeadRequest {
        LeadRequest {
            id: 1,
            full_name: "Анна <Smith>".to_string(),
            email: String::new(),
            phone: "+7 900 000-00-00".to_string(),
            preferred_direction: "Бег & трейл".to_string(),
            message: "  ".to_string(),
            source: "landing".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a < b && c > d"), "a &lt; b &amp;&amp; c &gt; d");
        assert_eq!(escape_html(r#"say "hi" 'there'"#), r#"say "hi" 'there'"#);
    }

    #[test]
    fn test_lead_message_skips_empty_fields() {
        let text = lead_message(&lead());
        assert!(text.starts_with("<b>Новая заявка с сайта</b>"));
        assert!(text.contains("<b>Имя:</b> Анна &lt;Smith&gt;"));
        assert!(text.contains("<b>Направление:</b> Бег &amp; трейл"));
        assert!(!text.contains("Email"));
        assert!(!text.contains("Сообщение"));
    }

    #[test]
    fn test_disabled_config_builds_nothing() {
        let config = TelegramConfig {
            bot_token: "token".to_string(),
            chat_id: String::new(),
            ..TelegramConfig::default()
        };
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_url_joins_base_and_token() {
        let notifier =
            TelegramNotifier::new("http://127.0.0.1:9/", "123:abc", "42", Duration::from_secs(1))
                .unwrap();
        assert_eq!(notifier.url, "http://127.0.0.1:9/bot123:abc/sendMessage");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn escaped_text_has_no_raw_angle_brackets(text in "\\PC{0,80}") {
                let escaped = escape_html(&text);
                prop_assert!(!escaped.contains('<'));
                prop_assert!(!escaped.contains('>'));
            }

            #[test]
            fn plain_text_is_unchanged(text in "[a-zA-Zа-яА-Я0-9 .,!?\"']{0,80}") {
                prop_assert_eq!(escape_html(&text), text);
            }
        }
    }
}
