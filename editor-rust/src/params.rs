use crate::{
    broadcaster::{CaptionBroadcaster, ReplacementBroadcaster},
    store::ContentPersistenceStore,
    viewer::ZoomLimits,
    MediaEditor,
};
use portfolio_media::{AssetUploader, CaptionGenerator, UploadValidator};
use std::{sync::Arc, time::Duration};

pub const DEFAULT_CAPTION_MIN_LENGTH: usize = 10;
pub const DEFAULT_EDIT_DEBOUNCE: Duration = Duration::from_millis(800);
pub const DEFAULT_SYNC_WINDOW: Duration = Duration::from_millis(200);
pub const DEFAULT_PLACEHOLDER_CAPTIONS: [&str; 5] = [
    "Click to add caption...",
    "Add a caption...",
    "Image caption",
    "Caption",
    "Untitled",
];

/// Parameters required to create a new media editor.
/// # Default Values
/// - `validator`: images only, at most 10 MiB
/// - `replacements`, `captions`, `store`: fresh, unshared instances
/// - `zoom`: 0.5 to 3.0 in steps of 0.25
/// - `caption_min_length`: 10
/// - `placeholder_captions`: `DEFAULT_PLACEHOLDER_CAPTIONS`
/// - `edit_debounce`: 800ms
/// - `sync_window`: 200ms
pub struct EditorParams {
    /// Stores replacement files.
    pub uploader: Arc<dyn AssetUploader>,
    /// Describes images that have no usable caption.
    pub generator: Arc<dyn CaptionGenerator>,
    pub validator: UploadValidator,
    /// Channel every mounted instance listens on for replacements.
    pub replacements: ReplacementBroadcaster,
    /// Channel for generated and settled captions.
    pub captions: CaptionBroadcaster,
    pub store: ContentPersistenceStore,
    pub zoom: ZoomLimits,
    /// Captions shorter than this, in characters, are regenerated.
    pub caption_min_length: usize,
    /// Default strings that mean "no real caption yet". Compared ignoring
    /// case and surrounding whitespace.
    pub placeholder_captions: Vec<String>,
    /// Quiet period before a manual caption edit counts as settled.
    pub edit_debounce: Duration,
    /// Store echoes of a local write arriving within this window are
    /// ignored.
    pub sync_window: Duration,
}

impl EditorParams {
    pub fn new(uploader: Arc<dyn AssetUploader>, generator: Arc<dyn CaptionGenerator>) -> Self {
        Self {
            uploader,
            generator,
            validator: UploadValidator::default(),
            replacements: ReplacementBroadcaster::new(),
            captions: CaptionBroadcaster::new(),
            store: ContentPersistenceStore::new(),
            zoom: ZoomLimits::default(),
            caption_min_length: DEFAULT_CAPTION_MIN_LENGTH,
            placeholder_captions: DEFAULT_PLACEHOLDER_CAPTIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
            edit_debounce: DEFAULT_EDIT_DEBOUNCE,
            sync_window: DEFAULT_SYNC_WINDOW,
        }
    }

    /// Set the upload validator
    #[must_use]
    pub fn validator(mut self, validator: UploadValidator) -> Self {
        self.validator = validator;
        self
    }

    /// Share an existing replacement channel
    #[must_use]
    pub fn replacements(mut self, replacements: ReplacementBroadcaster) -> Self {
        self.replacements = replacements;
        self
    }

    /// Share an existing caption channel
    #[must_use]
    pub fn captions(mut self, captions: CaptionBroadcaster) -> Self {
        self.captions = captions;
        self
    }

    /// Share an existing store
    #[must_use]
    pub fn store(mut self, store: ContentPersistenceStore) -> Self {
        self.store = store;
        self
    }

    /// Set the zoom limits. Unusable limits are repaired, see
    /// `ZoomLimits::normalized`.
    #[must_use]
    pub fn zoom(mut self, zoom: ZoomLimits) -> Self {
        self.zoom = zoom.normalized();
        self
    }

    #[must_use]
    pub fn caption_min_length(mut self, caption_min_length: usize) -> Self {
        self.caption_min_length = caption_min_length;
        self
    }

    /// Add a placeholder caption
    #[must_use]
    pub fn add_placeholder_caption(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder_captions.push(placeholder.into());
        self
    }

    #[must_use]
    pub fn edit_debounce(mut self, edit_debounce: Duration) -> Self {
        self.edit_debounce = edit_debounce;
        self
    }

    #[must_use]
    pub fn sync_window(mut self, sync_window: Duration) -> Self {
        self.sync_window = sync_window;
        self
    }

    #[must_use]
    pub fn build(self) -> MediaEditor {
        MediaEditor::new(self)
    }
}
