//! Attachment download and encoding for multimodal classification.

use std::time::Duration;

use base64::Engine;
use futures::future::join_all;
use relayguard_core::defaults::IMAGE_MIME_TYPE;
use relayguard_core::{FileFetcher, Message};
use tracing::{trace, warn};

use super::types::ContentBlock;

/// An encoded image ready to be inlined into a chat request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePart {
    pub mime_type: String,
    pub base64_payload: String,
}

impl ImagePart {
    /// Encode raw bytes, resolving the media type from the declared type,
    /// then magic bytes, then the JPEG default.
    pub fn encode(data: &[u8], declared_mime: Option<&str>) -> Self {
        Self {
            mime_type: resolve_mime_type(data, declared_mime),
            base64_payload: base64::engine::general_purpose::STANDARD.encode(data),
        }
    }

    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.base64_payload)
    }

    pub fn to_content_block(&self) -> ContentBlock {
        ContentBlock::image_url(self.data_url())
    }
}

fn resolve_mime_type(data: &[u8], declared_mime: Option<&str>) -> String {
    if let Some(mime) = declared_mime.map(str::trim).filter(|m| !m.is_empty()) {
        return mime.to_string();
    }
    match infer::get(data) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            kind.mime_type().to_string()
        }
        _ => IMAGE_MIME_TYPE.to_string(),
    }
}

/// Download and encode every image attachment of a message.
///
/// Downloads run concurrently and each is bounded by `fetch_timeout`. A
/// failed or timed-out download is logged and the image left out; the
/// remaining images are returned in attachment order.
pub async fn collect_image_parts(
    fetcher: &dyn FileFetcher,
    message: &Message,
    fetch_timeout: Duration,
) -> Vec<ImagePart> {
    let downloads = message
        .attachments
        .iter()
        .filter_map(|attachment| attachment.image_source())
        .map(|(file_id, declared_mime)| async move {
            match tokio::time::timeout(fetch_timeout, fetcher.fetch_file(file_id)).await {
                Ok(Ok(data)) => {
                    trace!(
                        subsystem = "detect",
                        component = "images",
                        op = "fetch_image",
                        file_id,
                        bytes = data.len(),
                        "Fetched attachment for AI detection"
                    );
                    Some(ImagePart::encode(&data, declared_mime))
                }
                Ok(Err(e)) => {
                    warn!(
                        subsystem = "detect",
                        component = "images",
                        op = "fetch_image",
                        file_id,
                        error = %e,
                        "Failed to download file for AI spam detection"
                    );
                    None
                }
                Err(_) => {
                    warn!(
                        subsystem = "detect",
                        component = "images",
                        op = "fetch_image",
                        file_id,
                        timeout_ms = fetch_timeout.as_millis() as u64,
                        "Timed out downloading file for AI spam detection"
                    );
                    None
                }
            }
        });

    join_all(downloads).await.into_iter().flatten().collect()
}
