//! Single-slot image attachment staging.
//!
//! At most one image is staged at a time. Staging a new image silently
//! replaces the previous one; the slot is emptied after a successful image
//! turn or on explicit removal.

use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use uuid::Uuid;

use crate::error::ChatError;

/// Raw file selected by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct AttachmentFile {
    name: String,
    media_type: String,
    bytes: Arc<[u8]>,
}

impl std::fmt::Debug for AttachmentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachmentFile")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl AttachmentFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, guessing its media type from the extension.
    pub async fn from_path(path: &Path) -> Result<Self, ChatError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| ChatError::AttachmentUnreadable(format!("{}: {}", path.display(), e)))?;
        let media_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());
        Ok(Self::new(name, media_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Check the image-only and size invariants.
    pub fn validate(&self, max_bytes: u64) -> Result<(), ChatError> {
        if !self.media_type.starts_with("image/") {
            return Err(ChatError::InvalidAttachmentType(self.media_type.clone()));
        }
        if self.size() > max_bytes {
            return Err(ChatError::AttachmentTooLarge {
                size: self.size(),
                limit: max_bytes,
            });
        }
        Ok(())
    }
}

/// A validated image with its preview.
#[derive(Debug, Clone)]
pub struct StagedAttachment {
    id: Uuid,
    file: AttachmentFile,
    preview_uri: String,
}

impl StagedAttachment {
    /// Validate `file` and encode its `data:` URI preview off the async thread.
    pub async fn prepare(file: AttachmentFile, max_bytes: u64) -> Result<Self, ChatError> {
        file.validate(max_bytes)?;

        let bytes = Arc::clone(&file.bytes);
        let media_type = file.media_type.clone();
        let preview_uri = tokio::task::spawn_blocking(move || {
            format!("data:{};base64,{}", media_type, BASE64_STANDARD.encode(&bytes))
        })
        .await
        .map_err(|e| ChatError::AttachmentUnreadable(format!("preview encoding failed: {}", e)))?;

        Ok(Self {
            id: Uuid::new_v4(),
            file,
            preview_uri,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file(&self) -> &AttachmentFile {
        &self.file
    }

    pub fn preview_uri(&self) -> &str {
        &self.preview_uri
    }
}

/// The single attachment slot.
#[derive(Debug)]
pub struct AttachmentStaging {
    slot: Option<StagedAttachment>,
    max_bytes: u64,
}

impl AttachmentStaging {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            slot: None,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validate, preview and stage `file`, replacing any staged image.
    ///
    /// On failure the slot is left as it was.
    pub async fn stage(&mut self, file: AttachmentFile) -> Result<&StagedAttachment, ChatError> {
        let staged = StagedAttachment::prepare(file, self.max_bytes).await?;
        Ok(self.replace(staged))
    }

    /// Put an already prepared attachment into the slot.
    pub fn replace(&mut self, staged: StagedAttachment) -> &StagedAttachment {
        if let Some(previous) = &self.slot {
            tracing::debug!(previous = %previous.file.name, next = %staged.file.name, "Replacing staged attachment");
        }
        self.slot.insert(staged)
    }

    pub fn current(&self) -> Option<&StagedAttachment> {
        self.slot.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    /// Discard whatever is staged.
    pub fn clear(&mut self) {
        self.slot = None;
    }

    /// Discard the staged attachment only if it is still the one with `id`.
    ///
    /// Returns whether the slot was emptied.
    pub fn clear_if(&mut self, id: Uuid) -> bool {
        if self.slot.as_ref().is_some_and(|s| s.id == id) {
            self.slot = None;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
