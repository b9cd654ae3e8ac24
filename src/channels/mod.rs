//! Channel abstractions: where messages come from and where accepted
//! items get republished.

pub mod telegram;

pub use telegram::{TelegramIngestSource, TelegramPublisher};

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::SourceConfig;
use crate::error::ChannelError;
use crate::pipeline::types::{MediaRef, SourceMessage};

/// Payload handed to a publish target.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub text: String,
    /// Downloaded media file, when the item carries one.
    pub media: Option<(crate::store::MediaKind, PathBuf)>,
    /// Link back to the original message, appended as attribution.
    pub source_link: Option<String>,
}

/// Receipt from a successful publish.
#[derive(Debug, Clone, Default)]
pub struct PublishReceipt {
    /// Public URL of the republished item, when the target can produce one.
    pub url: Option<String>,
}

/// Upstream message source.
///
/// `fetch` returns the newest unconsumed messages for one configured
/// source, oldest first, at most `limit` of them. Implementations own
/// their cursor; a message is handed out once.
#[async_trait]
pub trait MessageSource: Send + Sync {
    async fn fetch(
        &self,
        source: &SourceConfig,
        limit: usize,
    ) -> Result<Vec<SourceMessage>, ChannelError>;

    /// Download the referenced media into `dest_dir`, returning the local path.
    async fn download_media(
        &self,
        media: &MediaRef,
        dest_dir: &Path,
    ) -> Result<PathBuf, ChannelError>;
}

/// Downstream publish target for accepted items.
#[async_trait]
pub trait PublishTarget: Send + Sync {
    fn name(&self) -> &str;

    async fn publish(&self, request: &PublishRequest) -> Result<PublishReceipt, ChannelError>;
}
