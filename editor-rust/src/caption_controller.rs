use crate::{
    broadcaster::{CaptionBroadcaster, Subscription},
    debounce::Debouncer,
    editor::EditorServices,
    opentelemetry::{trace_pipeline, PipelineSpanMethod},
};
use portfolio_media::{
    normalize_caption, CaptionRequest, CaptionSource, CaptionState, GenerationStatus,
    OwnerContext, ReplacementEvent,
};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, Weak},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptionEvent {
    /// A caption was generated for an image of a project.
    Generated {
        project_id: OwnerContext,
        image_url: String,
        caption: String,
    },
    /// A manual edit stopped changing for the debounce window.
    Settled {
        project_id: OwnerContext,
        image_url: String,
        caption: String,
    },
}

/// Decides whether a caption is usable or should be generated.
#[derive(Debug, Clone)]
pub struct CaptionPolicy {
    placeholders: Vec<String>,
    min_length: usize,
}

impl CaptionPolicy {
    pub fn new(placeholders: Vec<String>, min_length: usize) -> Self {
        Self {
            placeholders: placeholders
                .into_iter()
                .map(|placeholder| placeholder.trim().to_lowercase())
                .collect(),
            min_length,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self, caption: &str) -> bool {
        let caption = caption.trim().to_lowercase();
        self.placeholders.iter().any(|placeholder| *placeholder == caption)
    }

    /// Empty, placeholder and too-short captions need generating.
    #[must_use]
    pub fn needs_generation(&self, caption: &str) -> bool {
        let trimmed = caption.trim();
        trimmed.is_empty()
            || self.is_placeholder(trimmed)
            || trimmed.chars().count() < self.min_length
    }
}

pub struct CaptionControllerParams {
    pub project_id: OwnerContext,
    pub image_url: String,
    /// The caption the content currently carries, if any.
    pub caption: Option<String>,
    /// Passed to the generator to help describe the image.
    pub context: Option<String>,
}

impl CaptionControllerParams {
    pub fn new(project_id: impl Into<OwnerContext>, image_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            image_url: image_url.into(),
            caption: None,
            context: None,
        }
    }

    #[must_use]
    pub fn caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// What the caption area should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptionView {
    pub text: String,
    pub source: CaptionSource,
    pub generating: bool,
}

struct ControllerState {
    /// Follows replacements of the image.
    image_url: String,
    caption: CaptionState,
    mounted: bool,
    pending_edit: Option<String>,
    settled: Option<String>,
}

/// Owns the caption of one image instance.
///
/// Auto-generation runs at most once per controller, however often it is
/// mounted: the generation latch moves forward only and is never reset, even
/// when the caption is later cleared.
pub struct CaptionController {
    services: Arc<EditorServices>,
    project_id: OwnerContext,
    context: Option<String>,
    debouncer: Debouncer,
    state: Mutex<ControllerState>,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl CaptionController {
    pub(crate) fn new(services: Arc<EditorServices>, params: CaptionControllerParams) -> Self {
        let CaptionControllerParams {
            project_id,
            image_url,
            caption,
            context,
        } = params;

        let text = caption.unwrap_or_default();
        let source = if text.trim().is_empty() || services.caption_policy.is_placeholder(&text) {
            CaptionSource::Placeholder
        } else {
            CaptionSource::Manual
        };
        let debouncer = Debouncer::new(services.edit_debounce);

        Self {
            services,
            project_id,
            context,
            debouncer,
            state: Mutex::new(ControllerState {
                image_url,
                caption: CaptionState::new(text, source),
                mounted: false,
                pending_edit: None,
                settled: None,
            }),
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().expect("caption state poisoned")
    }

    /// Mount and, if the caption is unusable and generation has never been
    /// attempted, generate one. Returns the generated caption.
    pub async fn mount(self: &Arc<Self>) -> Option<String> {
        let newly_mounted = {
            let mut state = self.lock();
            !std::mem::replace(&mut state.mounted, true)
        };
        if newly_mounted {
            let weak: Weak<Self> = Arc::downgrade(self);
            let replacements = self.services.replacements.subscribe(move |event: &ReplacementEvent| {
                if let Some(controller) = weak.upgrade() {
                    controller.follow_replacement(event);
                }
            });
            self.subscriptions
                .lock()
                .expect("subscriptions poisoned")
                .push(replacements);
        }
        self.ensure_caption().await
    }

    /// Stop reacting. A pending generation result is discarded and a pending
    /// manual edit is settled immediately.
    pub fn unmount(&self) {
        self.debouncer.cancel();
        self.settle();
        self.lock().mounted = false;
        self.subscriptions
            .lock()
            .expect("subscriptions poisoned")
            .clear();
    }

    /// The URL captions are currently published for.
    #[must_use]
    pub fn image_url(&self) -> String {
        self.lock().image_url.clone()
    }

    #[must_use]
    pub fn caption(&self) -> CaptionState {
        self.lock().caption.clone()
    }

    #[must_use]
    pub fn generation_status(&self) -> GenerationStatus {
        self.lock().caption.generation
    }

    #[must_use]
    pub fn view(&self) -> CaptionView {
        let state = self.lock();
        CaptionView {
            text: state.caption.text.clone(),
            source: state.caption.source,
            generating: state.caption.generation == GenerationStatus::Pending,
        }
    }

    /// The last manual edit that settled.
    #[must_use]
    pub fn settled(&self) -> Option<String> {
        self.lock().settled.clone()
    }

    /// Whether the current caption would trigger generation.
    #[must_use]
    pub fn needs_generation(&self) -> bool {
        let state = self.lock();
        self.services
            .caption_policy
            .needs_generation(&state.caption.text)
    }

    async fn ensure_caption(&self) -> Option<String> {
        let (request, image_url) = {
            let mut state = self.lock();
            if state.caption.generation != GenerationStatus::NotAttempted
                || !self
                    .services
                    .caption_policy
                    .needs_generation(&state.caption.text)
            {
                return None;
            }
            state.caption.generation = GenerationStatus::Pending;
            let request = CaptionRequest {
                image_url: state.image_url.clone(),
                context: self.context.clone(),
            };
            (request, state.image_url.clone())
        };

        let result = trace_pipeline(
            PipelineSpanMethod::GenerateCaption,
            &self.project_id,
            &image_url,
            self.services.generator.generate(request),
        )
        .await;

        let (caption, image_url) = {
            let mut state = self.lock();
            state.caption.generation = GenerationStatus::Done;
            if !state.mounted {
                tracing::warn!(
                    image_url = %image_url,
                    "caption resolved after unmount; result ignored"
                );
                return None;
            }

            let response = match result {
                Ok(response) => response,
                Err(error) => {
                    tracing::warn!(image_url = %image_url, %error, "caption generation failed");
                    return None;
                }
            };
            let Some(caption) = normalize_caption(&response.caption) else {
                tracing::warn!(image_url = %image_url, "caption generator returned no text");
                return None;
            };

            // The owner typed a real caption while generation was pending.
            if state.caption.source == CaptionSource::Manual
                && !self
                    .services
                    .caption_policy
                    .needs_generation(&state.caption.text)
            {
                return None;
            }

            state.caption.text.clone_from(&caption);
            state.caption.source = CaptionSource::Generated;
            (caption, state.image_url.clone())
        };

        self.services.captions.publish(CaptionEvent::Generated {
            project_id: self.project_id.clone(),
            image_url,
            caption: caption.clone(),
        });
        Some(caption)
    }

    /// Apply a manual edit immediately; it settles once no further edit
    /// arrives within the debounce window. Must be called within a tokio
    /// runtime.
    pub fn edit(self: &Arc<Self>, text: impl Into<String>) {
        let text = text.into();
        {
            let mut state = self.lock();
            if !state.mounted {
                return;
            }
            state.caption.source = if text.trim().is_empty() {
                CaptionSource::Placeholder
            } else {
                CaptionSource::Manual
            };
            state.caption.text.clone_from(&text);
            state.pending_edit = Some(text);
        }

        let weak = Arc::downgrade(self);
        self.debouncer.schedule(move || {
            if let Some(controller) = weak.upgrade() {
                controller.settle();
            }
        });
    }

    fn settle(&self) {
        let (caption, image_url) = {
            let mut state = self.lock();
            let Some(caption) = state.pending_edit.take() else {
                return;
            };
            state.settled = Some(caption.clone());
            (caption, state.image_url.clone())
        };

        self.services.captions.publish(CaptionEvent::Settled {
            project_id: self.project_id.clone(),
            image_url,
            caption,
        });
    }

    fn follow_replacement(&self, event: &ReplacementEvent) {
        let mut state = self.lock();
        if state.mounted && state.image_url == event.old_url {
            state.image_url.clone_from(&event.new_url);
        }
    }
}

/// Counts generated captions per project, e.g. to drive a progress
/// indicator.
pub struct GenerationProgress {
    counts: Arc<Mutex<HashMap<OwnerContext, usize>>>,
    _subscription: Subscription,
}

impl GenerationProgress {
    #[must_use]
    pub fn track(captions: &CaptionBroadcaster) -> Self {
        let counts: Arc<Mutex<HashMap<OwnerContext, usize>>> = Arc::default();
        let subscription = captions.subscribe({
            let counts = counts.clone();
            move |event: &CaptionEvent| {
                if let CaptionEvent::Generated { project_id, .. } = event {
                    let mut counts = counts.lock().expect("progress poisoned");
                    *counts.entry(project_id.clone()).or_default() += 1;
                }
            }
        });

        Self {
            counts,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn generated(&self, project_id: &OwnerContext) -> usize {
        self.counts
            .lock()
            .expect("progress poisoned")
            .get(project_id)
            .copied()
            .unwrap_or_default()
    }
}
