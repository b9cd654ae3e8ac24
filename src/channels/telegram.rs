//! Telegram Bot API adapters.
//!
//! [`TelegramIngestSource`] long-polls `getUpdates` for channel posts and
//! buffers them per source channel; [`TelegramPublisher`] republishes
//! accepted items into a single output channel.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::channels::{MessageSource, PublishReceipt, PublishRequest, PublishTarget};
use crate::config::SourceConfig;
use crate::error::ChannelError;
use crate::pipeline::types::{MediaRef, SourceMessage};
use crate::store::MediaKind;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Maximum caption length for media sends.
const TELEGRAM_MAX_CAPTION_LENGTH: usize = 1024;

fn api_url(bot_token: &str, method: &str) -> String {
    format!("https://api.telegram.org/bot{bot_token}/{method}")
}

fn fetch_err(source: &str, reason: impl std::fmt::Display) -> ChannelError {
    ChannelError::FetchFailed {
        source: source.to_string(),
        reason: reason.to_string(),
    }
}

// ── Ingest source ───────────────────────────────────────────────────

#[derive(Default)]
struct IngestState {
    /// Next getUpdates offset (last seen update_id + 1).
    offset: i64,
    /// Undelivered messages keyed by channel username.
    buffers: HashMap<String, VecDeque<SourceMessage>>,
}

/// Message source that pulls channel posts via the Bot API.
///
/// The bot must be an admin of each monitored channel; Telegram only
/// delivers `channel_post` updates to admins. One poll services all
/// sources; `fetch` drains the per-source buffer.
pub struct TelegramIngestSource {
    bot_token: String,
    client: reqwest::Client,
    state: Mutex<IngestState>,
}

impl TelegramIngestSource {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
            state: Mutex::new(IngestState::default()),
        }
    }

    /// One getUpdates round trip; routes channel posts into buffers.
    async fn poll_once(&self, state: &mut IngestState) -> Result<(), ChannelError> {
        let body = serde_json::json!({
            "offset": state.offset,
            "timeout": 0,
            "allowed_updates": ["channel_post"]
        });

        let resp = self
            .client
            .post(api_url(&self.bot_token, "getUpdates"))
            .json(&body)
            .send()
            .await
            .map_err(|e| fetch_err("telegram", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return Err(fetch_err("telegram", format!("getUpdates returned {status}")));
        }

        let data: serde_json::Value = resp.json().await.map_err(|e| fetch_err("telegram", e))?;

        let Some(results) = data.get("result").and_then(serde_json::Value::as_array) else {
            return Ok(());
        };

        for update in results {
            if let Some(uid) = update.get("update_id").and_then(serde_json::Value::as_i64) {
                state.offset = uid + 1;
            }
            let Some(post) = update.get("channel_post") else {
                continue;
            };
            let Some(msg) = parse_channel_post(post) else {
                continue;
            };
            state
                .buffers
                .entry(msg.source.clone())
                .or_default()
                .push_back(msg);
        }

        Ok(())
    }
}

/// Convert a `channel_post` update into a [`SourceMessage`].
///
/// Returns `None` for posts with no usable text (pure stickers, polls)
/// or no channel username.
fn parse_channel_post(post: &serde_json::Value) -> Option<SourceMessage> {
    let id = post.get("message_id")?.as_i64()?;
    let chat = post.get("chat")?;
    let username = chat.get("username")?.as_str()?.to_lowercase();
    let title = chat
        .get("title")
        .and_then(|t| t.as_str())
        .unwrap_or(&username)
        .to_string();

    let text = post
        .get("text")
        .or_else(|| post.get("caption"))
        .and_then(|t| t.as_str())?
        .to_string();

    let sent_at = post
        .get("date")
        .and_then(serde_json::Value::as_i64)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    // Photos arrive as size variants, smallest first; take the largest.
    let media = if let Some(sizes) = post.get("photo").and_then(|p| p.as_array()) {
        sizes
            .last()
            .and_then(|p| p.get("file_id"))
            .and_then(|f| f.as_str())
            .map(|file_id| MediaRef {
                kind: MediaKind::Photo,
                file_id: file_id.to_string(),
            })
    } else {
        post.get("video")
            .and_then(|v| v.get("file_id"))
            .and_then(|f| f.as_str())
            .map(|file_id| MediaRef {
                kind: MediaKind::Video,
                file_id: file_id.to_string(),
            })
    };

    let link = Some(format!("https://t.me/{username}/{id}"));

    Some(SourceMessage {
        id,
        source: username,
        sender_name: title,
        text,
        media,
        sent_at,
        link,
    })
}

#[async_trait]
impl MessageSource for TelegramIngestSource {
    async fn fetch(
        &self,
        source: &SourceConfig,
        limit: usize,
    ) -> Result<Vec<SourceMessage>, ChannelError> {
        let mut state = self.state.lock().await;
        self.poll_once(&mut state).await?;

        let key = source.name.to_lowercase();
        let Some(buffer) = state.buffers.get_mut(&key) else {
            return Ok(Vec::new());
        };

        let take = limit.min(buffer.len());
        let batch: Vec<SourceMessage> = buffer.drain(..take).collect();
        if !batch.is_empty() {
            debug!(source = %source.name, count = batch.len(), "Fetched messages");
        }
        Ok(batch)
    }

    async fn download_media(
        &self,
        media: &MediaRef,
        dest_dir: &Path,
    ) -> Result<PathBuf, ChannelError> {
        let media_err = |reason: String| ChannelError::MediaDownload {
            source: "telegram".to_string(),
            reason,
        };

        let resp = self
            .client
            .post(api_url(&self.bot_token, "getFile"))
            .json(&serde_json::json!({ "file_id": media.file_id }))
            .send()
            .await
            .map_err(|e| media_err(format!("getFile: {e}")))?;

        if !resp.status().is_success() {
            return Err(media_err(format!("getFile returned {}", resp.status())));
        }

        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| media_err(format!("getFile decode: {e}")))?;
        let file_path = data
            .get("result")
            .and_then(|r| r.get("file_path"))
            .and_then(|p| p.as_str())
            .ok_or_else(|| media_err("getFile response missing file_path".to_string()))?;

        let url = format!(
            "https://api.telegram.org/file/bot{}/{file_path}",
            self.bot_token
        );
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| media_err(format!("download: {e}")))?
            .bytes()
            .await
            .map_err(|e| media_err(format!("download body: {e}")))?;

        let file_name = Path::new(file_path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("media.bin");
        let dest = dest_dir.join(file_name);

        tokio::fs::create_dir_all(dest_dir)
            .await
            .map_err(|e| media_err(format!("create media dir: {e}")))?;
        tokio::fs::write(&dest, &bytes)
            .await
            .map_err(|e| media_err(format!("write {}: {e}", dest.display())))?;

        debug!(path = %dest.display(), bytes = bytes.len(), "Media downloaded");
        Ok(dest)
    }
}

// ── Publisher ───────────────────────────────────────────────────────

/// Publish target that reposts into one Telegram channel.
pub struct TelegramPublisher {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramPublisher {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        api_url(&self.bot_token, method)
    }

    fn publish_err(&self, reason: impl std::fmt::Display) -> ChannelError {
        ChannelError::PublishFailed {
            target: "telegram".to_string(),
            reason: reason.to_string(),
        }
    }

    /// Public message link, derivable only for username-addressed channels.
    fn message_link(&self, message_id: i64) -> Option<String> {
        self.chat_id
            .strip_prefix('@')
            .map(|username| format!("https://t.me/{username}/{message_id}"))
    }

    /// Extract the message id from a successful Bot API send response.
    async fn receipt_from(&self, resp: reqwest::Response) -> Result<PublishReceipt, ChannelError> {
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| self.publish_err(format!("decode response: {e}")))?;
        let url = data
            .get("result")
            .and_then(|r| r.get("message_id"))
            .and_then(serde_json::Value::as_i64)
            .and_then(|id| self.message_link(id));
        Ok(PublishReceipt { url })
    }

    /// Send text, trying Markdown first and falling back to plain text.
    async fn send_text(&self, text: &str) -> Result<PublishReceipt, ChannelError> {
        let text = truncate_chars(text, TELEGRAM_MAX_MESSAGE_LENGTH);

        let markdown_body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown"
        });
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&markdown_body)
            .send()
            .await
            .map_err(|e| self.publish_err(e))?;

        if resp.status().is_success() {
            return self.receipt_from(resp).await;
        }
        let markdown_status = resp.status();
        warn!(
            status = ?markdown_status,
            "sendMessage with Markdown failed; retrying without parse_mode"
        );

        let plain_body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });
        let resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| self.publish_err(e))?;

        if !resp.status().is_success() {
            let plain_err = resp.text().await.unwrap_or_default();
            return Err(self.publish_err(format!(
                "sendMessage failed (markdown: {markdown_status}, plain: {plain_err})"
            )));
        }
        self.receipt_from(resp).await
    }

    /// Send a media file with a caption via multipart upload.
    async fn send_media(
        &self,
        kind: MediaKind,
        path: &Path,
        caption: &str,
    ) -> Result<PublishReceipt, ChannelError> {
        let (method, field, default_name) = match kind {
            MediaKind::Photo => ("sendPhoto", "photo", "photo.jpg"),
            MediaKind::Video => ("sendVideo", "video", "video.mp4"),
            MediaKind::None => return self.send_text(caption).await,
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(default_name)
            .to_string();
        let file_bytes = tokio::fs::read(path)
            .await
            .map_err(|e| self.publish_err(format!("read {}: {e}", path.display())))?;
        let part = Part::bytes(file_bytes).file_name(file_name);

        let form = Form::new()
            .text("chat_id", self.chat_id.clone())
            .text(
                "caption",
                truncate_chars(caption, TELEGRAM_MAX_CAPTION_LENGTH),
            )
            .part(field, part);

        let resp = self
            .client
            .post(self.api_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.publish_err(e))?;

        if !resp.status().is_success() {
            let err = resp.text().await.unwrap_or_default();
            return Err(self.publish_err(format!("{method} failed: {err}")));
        }
        self.receipt_from(resp).await
    }
}

#[async_trait]
impl PublishTarget for TelegramPublisher {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ChannelError> {
        let mut text = request.text.clone();
        if let Some(link) = &request.source_link {
            text.push_str("\n\nSource: ");
            text.push_str(link);
        }
        if let Some(intent) = tweet_intent_url(&request.text) {
            text.push_str("\nPost to X: ");
            text.push_str(&intent);
        }

        let receipt = match &request.media {
            Some((kind, path)) => self.send_media(*kind, path, &text).await?,
            None => self.send_text(&text).await?,
        };

        info!(url = receipt.url.as_deref().unwrap_or("-"), "Item published");
        Ok(receipt)
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Truncate to a character budget without splitting a code point.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    text.chars().take(max_chars).collect()
}

/// Prefilled X/Twitter compose link for an item's text.
pub fn tweet_intent_url(text: &str) -> Option<String> {
    reqwest::Url::parse_with_params("https://twitter.com/intent/tweet", [("text", text)])
        .map(|u| u.to_string())
        .ok()
}

// ── Tests ───────────────────────────────────────────────────────────
