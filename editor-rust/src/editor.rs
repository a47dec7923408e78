use crate::{
    broadcaster::{CaptionBroadcaster, ReplacementBroadcaster},
    caption_controller::{
        CaptionController, CaptionControllerParams, CaptionPolicy, GenerationProgress,
    },
    instance::{ImageInstance, ImageInstanceParams},
    store::ContentPersistenceStore,
    viewer::{MediaViewer, ZoomLimits},
    EditorParams,
};
use portfolio_media::{AssetUploader, CaptionGenerator, UploadValidator};
use std::{sync::Arc, time::Duration};

/// Collaborators shared by every instance and controller of one page.
pub(crate) struct EditorServices {
    pub uploader: Arc<dyn AssetUploader>,
    pub generator: Arc<dyn CaptionGenerator>,
    pub validator: UploadValidator,
    pub replacements: ReplacementBroadcaster,
    pub captions: CaptionBroadcaster,
    pub store: ContentPersistenceStore,
    pub caption_policy: CaptionPolicy,
    pub edit_debounce: Duration,
    pub sync_window: Duration,
}

/// Entry point for a page: owns the shared channels and store and mounts
/// image instances and caption controllers wired to them.
#[derive(Clone)]
pub struct MediaEditor {
    services: Arc<EditorServices>,
    zoom: ZoomLimits,
}

impl MediaEditor {
    #[must_use]
    pub fn new(params: EditorParams) -> Self {
        let EditorParams {
            uploader,
            generator,
            validator,
            replacements,
            captions,
            store,
            zoom,
            caption_min_length,
            placeholder_captions,
            edit_debounce,
            sync_window,
        } = params;

        Self {
            services: Arc::new(EditorServices {
                uploader,
                generator,
                validator,
                replacements,
                captions,
                store,
                caption_policy: CaptionPolicy::new(placeholder_captions, caption_min_length),
                edit_debounce,
                sync_window,
            }),
            zoom,
        }
    }

    pub fn builder(
        uploader: Arc<dyn AssetUploader>,
        generator: Arc<dyn CaptionGenerator>,
    ) -> EditorParams {
        EditorParams::new(uploader, generator)
    }

    /// Create an instance and mount it: it adopts any persisted replacement
    /// and starts listening for replacements and store writes.
    #[must_use]
    pub fn mount_image(&self, params: ImageInstanceParams) -> Arc<ImageInstance> {
        let instance = Arc::new(ImageInstance::new(self.services.clone(), params));
        instance.mount();
        instance
    }

    /// Create a caption controller. Call `mount` on it to start
    /// auto-generation.
    #[must_use]
    pub fn caption_controller(&self, params: CaptionControllerParams) -> Arc<CaptionController> {
        Arc::new(CaptionController::new(self.services.clone(), params))
    }

    /// A closed viewer using this editor's zoom limits.
    #[must_use]
    pub fn viewer(&self) -> MediaViewer {
        MediaViewer::new(self.zoom)
    }

    /// Count generated captions per project from now on.
    #[must_use]
    pub fn track_generation_progress(&self) -> GenerationProgress {
        GenerationProgress::track(&self.services.captions)
    }

    #[must_use]
    pub fn store(&self) -> &ContentPersistenceStore {
        &self.services.store
    }

    #[must_use]
    pub fn replacements(&self) -> &ReplacementBroadcaster {
        &self.services.replacements
    }

    #[must_use]
    pub fn captions(&self) -> &CaptionBroadcaster {
        &self.services.captions
    }
}
