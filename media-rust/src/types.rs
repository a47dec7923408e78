use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A file selected by the site owner as a replacement for an asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetFile {
    /// The original file name, kept for diagnostics when an upload fails.
    pub name: String,
    /// The MIME type reported for the file, e.g. "image/png".
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AssetFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Size of the file in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Opaque identifier of the project or content an asset belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct OwnerContext(pub String);

impl OwnerContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for OwnerContext {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OwnerContext {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for OwnerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

/// An image or video tracked by its original and current source URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    original_url: String,
    /// The URL currently displayed. Differs from `original_url` after a
    /// replacement.
    pub current_url: String,
    pub caption: Option<String>,
    pub owner_context: OwnerContext,
    pub is_placeholder: bool,
    pub kind: MediaKind,
}

impl Asset {
    pub fn new(original_url: impl Into<String>, owner_context: OwnerContext) -> Self {
        let original_url = original_url.into();
        Self {
            current_url: original_url.clone(),
            original_url,
            caption: None,
            owner_context,
            is_placeholder: false,
            kind: MediaKind::Image,
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn placeholder(mut self) -> Self {
        self.is_placeholder = true;
        self
    }

    /// The stable identity of the asset. Never changes.
    #[must_use]
    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    #[must_use]
    pub fn is_replaced(&self) -> bool {
        self.current_url != self.original_url
    }
}

/// Announces that every occurrence of `old_url` now shows `new_url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementEvent {
    pub old_url: String,
    pub new_url: String,
    pub timestamp: std::time::SystemTime,
}

impl ReplacementEvent {
    pub fn new(old_url: impl Into<String>, new_url: impl Into<String>) -> Self {
        Self {
            old_url: old_url.into(),
            new_url: new_url.into(),
            timestamp: std::time::SystemTime::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum CaptionSource {
    Manual,
    Generated,
    Placeholder,
}

/// Latch guarding caption auto-generation. Moves forward only:
/// `NotAttempted` -> `Pending` -> `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    NotAttempted,
    Pending,
    Done,
}

impl GenerationStatus {
    /// Whether generation has been attempted for this asset instance.
    #[must_use]
    pub fn attempted(self) -> bool {
        !matches!(self, Self::NotAttempted)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionState {
    pub text: String,
    pub source: CaptionSource,
    pub generation: GenerationStatus,
}

impl CaptionState {
    pub fn new(text: impl Into<String>, source: CaptionSource) -> Self {
        Self {
            text: text.into(),
            source,
            generation: GenerationStatus::NotAttempted,
        }
    }

    #[must_use]
    pub fn generation_attempted(&self) -> bool {
        self.generation.attempted()
    }
}

/// Input for the captioning endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct CaptionRequest {
    pub image_url: String,
    /// Free-form context that helps the model describe the image, such as
    /// the project title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
pub struct CaptionResponse {
    pub caption: String,
}

/// A freeform content block authored in a page section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Heading {
        text: String,
        level: u8,
    },
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    Video {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        caption: Option<String>,
    },
    /// Blocks produced by the rich-text editor that the core does not
    /// interpret.
    Custom {
        data: Value,
    },
}

/// Everything persisted for a single project. Last writer wins per key.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PersistedProjectState {
    /// `originalUrl` -> `currentUrl`
    #[serde(default)]
    pub image_replacements: BTreeMap<String, String>,
    /// `sectionKey` -> ordered blocks
    #[serde(default)]
    pub content_blocks: BTreeMap<String, Vec<ContentBlock>>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub removed_images: BTreeSet<String>,
}

impl PersistedProjectState {
    /// The URL an asset should display, or `None` if it has been removed.
    #[must_use]
    pub fn resolve<'a>(&'a self, original_url: &'a str) -> Option<&'a str> {
        if self.removed_images.contains(original_url) {
            return None;
        }
        Some(
            self.image_replacements
                .get(original_url)
                .map_or(original_url, String::as_str),
        )
    }
}
