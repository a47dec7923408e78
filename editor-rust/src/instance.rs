use crate::{
    broadcaster::Subscription,
    caption_controller::CaptionEvent,
    editor::EditorServices,
    opentelemetry::{trace_pipeline, PipelineSpanMethod},
    store::{StoreChange, StoreUpdate},
    sync_guard::{RemoteDecision, SyncGuard},
    viewer::{MediaViewer, ViewerItem},
    EditorError,
};
use portfolio_media::{Asset, AssetFile, ReplacementEvent};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::time::Instant;

/// Owner affordances an instance exposes. Every instance states them
/// explicitly; a denied action fails with `EditorError::CapabilityDenied`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceCapabilities {
    pub replace: bool,
    pub remove: bool,
    pub open_viewer: bool,
}

impl InstanceCapabilities {
    /// Visitors may only open the viewer.
    #[must_use]
    pub fn read_only() -> Self {
        Self {
            replace: false,
            remove: false,
            open_viewer: true,
        }
    }

    /// The site owner may replace and remove.
    #[must_use]
    pub fn owner() -> Self {
        Self {
            replace: true,
            remove: true,
            open_viewer: true,
        }
    }
}

impl Default for InstanceCapabilities {
    fn default() -> Self {
        Self::read_only()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstanceFault {
    /// The upload endpoint failed. `current_url` was left untouched.
    UploadFailed { file_name: String, message: String },
    /// The displayed URL could not be rendered.
    LoadFailed { url: String },
}

impl std::fmt::Display for InstanceFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UploadFailed { file_name, message } => {
                write!(f, "Failed to upload {file_name}: {message}")
            }
            Self::LoadFailed { url } => write!(f, "Failed to load {url}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InstanceStatus {
    #[default]
    Idle,
    Hovered,
    Uploading,
    Error(InstanceFault),
}

/// What the instance and its overlay should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceView {
    /// `None` when the image has been removed.
    pub src: Option<String>,
    pub caption: Option<String>,
    pub status: InstanceStatus,
    pub show_controls: bool,
    pub replace_enabled: bool,
    pub remove_enabled: bool,
    /// Dim the image and show a spinner while uploading.
    pub uploading: bool,
    pub error_message: Option<String>,
}

pub struct ImageInstanceParams {
    pub asset: Asset,
    /// The list the viewer browses when this instance is clicked. May be
    /// empty, in which case the viewer shows this instance alone.
    pub siblings: Vec<ViewerItem>,
    /// Position of this instance within `siblings`.
    pub index: usize,
    pub capabilities: InstanceCapabilities,
}

impl ImageInstanceParams {
    pub fn new(asset: Asset) -> Self {
        Self {
            asset,
            siblings: Vec::new(),
            index: 0,
            capabilities: InstanceCapabilities::default(),
        }
    }

    #[must_use]
    pub fn siblings(mut self, siblings: Vec<ViewerItem>, index: usize) -> Self {
        self.siblings = siblings;
        self.index = index;
        self
    }

    #[must_use]
    pub fn capabilities(mut self, capabilities: InstanceCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }
}

struct InstanceState {
    asset: Asset,
    status: InstanceStatus,
    upload_in_flight: bool,
    mounted: bool,
    /// Bumped whenever `current_url` changes.
    revision: u64,
    /// Mirrors the store's resolution of `original_url`. `None` = removed.
    sync: SyncGuard<Option<String>>,
}

/// One on-page occurrence of an asset.
///
/// `original_url` is fixed for the lifetime of the instance. `current_url`
/// changes only through `replace`, a matching replacement broadcast, or a
/// store write for the same original URL.
pub struct ImageInstance {
    services: Arc<EditorServices>,
    state: Mutex<InstanceState>,
    capabilities: InstanceCapabilities,
    siblings: Vec<ViewerItem>,
    index: usize,
    subscriptions: Mutex<Vec<Subscription>>,
}

impl ImageInstance {
    pub(crate) fn new(services: Arc<EditorServices>, params: ImageInstanceParams) -> Self {
        let ImageInstanceParams {
            asset,
            siblings,
            index,
            capabilities,
        } = params;
        let sync = SyncGuard::new(services.sync_window);

        Self {
            services,
            state: Mutex::new(InstanceState {
                asset,
                status: InstanceStatus::Idle,
                upload_in_flight: false,
                mounted: false,
                revision: 0,
                sync,
            }),
            capabilities,
            siblings,
            index,
            subscriptions: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InstanceState> {
        self.state.lock().expect("instance state poisoned")
    }

    /// Adopt the persisted state for this asset and subscribe to
    /// replacements, store writes and caption updates. Mounting twice is a
    /// no-op.
    pub fn mount(self: &Arc<Self>) {
        let project_id = {
            let mut state = self.lock();
            if state.mounted {
                return;
            }
            state.mounted = true;

            let resolved = self
                .services
                .store
                .resolve(&state.asset.owner_context, state.asset.original_url());
            apply_resolution(&mut state, resolved.clone());
            state.sync.record_local_write(resolved, Instant::now());
            state.asset.owner_context.clone()
        };

        let replacements = {
            let weak: Weak<Self> = Arc::downgrade(self);
            self.services
                .replacements
                .subscribe(move |event: &ReplacementEvent| {
                    if let Some(instance) = weak.upgrade() {
                        instance.apply_replacement(event);
                    }
                })
        };
        let store_updates = {
            let weak: Weak<Self> = Arc::downgrade(self);
            self.services
                .store
                .subscribe(&project_id, move |update: &StoreUpdate| {
                    if let Some(instance) = weak.upgrade() {
                        instance.apply_store_update(update);
                    }
                })
        };

        let captions = {
            let weak: Weak<Self> = Arc::downgrade(self);
            self.services.captions.subscribe(move |event: &CaptionEvent| {
                if let Some(instance) = weak.upgrade() {
                    instance.apply_caption(event);
                }
            })
        };

        let mut subscriptions = self.subscriptions.lock().expect("subscriptions poisoned");
        subscriptions.push(replacements);
        subscriptions.push(store_updates);
        subscriptions.push(captions);
    }

    /// Stop listening. A pending upload that resolves afterwards is ignored.
    pub fn unmount(&self) {
        self.lock().mounted = false;
        self.subscriptions
            .lock()
            .expect("subscriptions poisoned")
            .clear();
    }

    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.lock().mounted
    }

    #[must_use]
    pub fn asset(&self) -> Asset {
        self.lock().asset.clone()
    }

    #[must_use]
    pub fn original_url(&self) -> String {
        self.lock().asset.original_url().to_string()
    }

    #[must_use]
    pub fn current_url(&self) -> String {
        self.lock().asset.current_url.clone()
    }

    /// How many times the displayed URL has changed. Each replacement
    /// changes it exactly once, whichever channel delivered it first.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    #[must_use]
    pub fn status(&self) -> InstanceStatus {
        self.lock().status.clone()
    }

    #[must_use]
    pub fn capabilities(&self) -> InstanceCapabilities {
        self.capabilities
    }

    #[must_use]
    pub fn view(&self) -> InstanceView {
        let state = self.lock();
        let uploading = state.upload_in_flight;
        InstanceView {
            src: (!state.asset.is_placeholder).then(|| state.asset.current_url.clone()),
            caption: state.asset.caption.clone(),
            status: state.status.clone(),
            show_controls: state.status == InstanceStatus::Hovered
                && (self.capabilities.replace || self.capabilities.remove),
            replace_enabled: self.capabilities.replace && !uploading,
            remove_enabled: self.capabilities.remove && !uploading,
            uploading,
            error_message: match &state.status {
                InstanceStatus::Error(fault) => Some(fault.to_string()),
                _ => None,
            },
        }
    }

    /// Returns whether the status changed.
    pub fn hover(&self) -> bool {
        let mut state = self.lock();
        if state.status == InstanceStatus::Idle {
            state.status = InstanceStatus::Hovered;
            true
        } else {
            false
        }
    }

    /// Returns whether the status changed.
    pub fn unhover(&self) -> bool {
        let mut state = self.lock();
        if state.status == InstanceStatus::Hovered {
            state.status = InstanceStatus::Idle;
            true
        } else {
            false
        }
    }

    /// The rendered element failed to load `current_url`.
    pub fn report_load_failure(&self) {
        let mut state = self.lock();
        let url = state.asset.current_url.clone();
        tracing::debug!(url = %url, "image failed to load");
        state.status = InstanceStatus::Error(InstanceFault::LoadFailed { url });
    }

    /// The rendered element loaded. Clears a previous load failure.
    pub fn report_load_success(&self) {
        let mut state = self.lock();
        if matches!(
            state.status,
            InstanceStatus::Error(InstanceFault::LoadFailed { .. })
        ) {
            state.status = if state.upload_in_flight {
                InstanceStatus::Uploading
            } else {
                InstanceStatus::Idle
            };
        }
    }

    /// Open `viewer` on this instance's sibling list, with this instance's
    /// slot showing its current URL.
    pub fn click(&self, viewer: &mut MediaViewer) -> Result<(), EditorError> {
        if !self.capabilities.open_viewer {
            return Err(EditorError::CapabilityDenied("open_viewer"));
        }

        let (items, index) = {
            let state = self.lock();
            match state.status {
                InstanceStatus::Uploading => {
                    return Err(EditorError::NotInteractive("upload in progress"))
                }
                InstanceStatus::Error(_) => {
                    return Err(EditorError::NotInteractive("image failed"))
                }
                InstanceStatus::Idle | InstanceStatus::Hovered => {}
            }
            if state.asset.is_placeholder {
                return Err(EditorError::NotInteractive("image removed"));
            }

            let own_item = |fallback: Option<&ViewerItem>| ViewerItem {
                url: state.asset.current_url.clone(),
                caption: state
                    .asset
                    .caption
                    .clone()
                    .or_else(|| fallback.and_then(|item| item.caption.clone())),
                title: fallback.and_then(|item| item.title.clone()),
                kind: state.asset.kind,
            };

            if self.index < self.siblings.len() {
                let mut items = self.siblings.clone();
                items[self.index] = own_item(self.siblings.get(self.index));
                (items, self.index)
            } else {
                (vec![own_item(None)], 0)
            }
        };

        viewer.open(items, index)
    }

    /// Validate `file`, upload it and, on success, show it here and on every
    /// other instance displaying the same URL.
    ///
    /// A rejected file never enters `Uploading`. On failure `current_url` is
    /// unchanged and the instance shows the upload fault until retried.
    pub async fn replace(&self, file: AssetFile) -> Result<String, EditorError> {
        if !self.capabilities.replace {
            return Err(EditorError::CapabilityDenied("replace"));
        }

        let (owner_context, original_url, previous_url) = {
            let mut state = self.lock();
            if !state.mounted {
                return Err(EditorError::Unmounted);
            }
            if state.upload_in_flight {
                return Err(EditorError::UploadInProgress);
            }
            self.services.validator.validate(&file)?;

            state.upload_in_flight = true;
            state.status = InstanceStatus::Uploading;
            (
                state.asset.owner_context.clone(),
                state.asset.original_url().to_string(),
                state.asset.current_url.clone(),
            )
        };

        let file_name = file.name.clone();
        let result = trace_pipeline(
            PipelineSpanMethod::Replace,
            &owner_context,
            &original_url,
            self.services
                .uploader
                .upload(file, &owner_context, Some(&previous_url)),
        )
        .await;

        let (old_url, new_url) = {
            let mut state = self.lock();
            state.upload_in_flight = false;
            if !state.mounted {
                state.status = InstanceStatus::Idle;
                tracing::warn!(
                    original_url = %original_url,
                    "upload resolved after unmount; result ignored"
                );
                return Err(EditorError::Unmounted);
            }

            match result {
                Ok(new_url) => {
                    let old_url =
                        std::mem::replace(&mut state.asset.current_url, new_url.clone());
                    state.asset.is_placeholder = false;
                    state.status = InstanceStatus::Idle;
                    state.revision += 1;
                    state
                        .sync
                        .record_local_write(Some(new_url.clone()), Instant::now());
                    (old_url, new_url)
                }
                Err(error) => {
                    tracing::warn!(file_name = %file_name, %error, "upload failed");
                    state.status = InstanceStatus::Error(InstanceFault::UploadFailed {
                        file_name,
                        message: error.to_string(),
                    });
                    return Err(error.into());
                }
            }
        };

        // No await between the local update, the store write and the
        // broadcast.
        self.services
            .store
            .set_image_replacement(&owner_context, &original_url, &new_url);
        let delivered = self
            .services
            .replacements
            .publish(ReplacementEvent::new(old_url, new_url.clone()));
        tracing::debug!(original_url = %original_url, new_url = %new_url, delivered, "image replaced");

        Ok(new_url)
    }

    /// Remove the image, leaving a placeholder. Persisted for the project.
    pub fn remove(&self) -> Result<(), EditorError> {
        if !self.capabilities.remove {
            return Err(EditorError::CapabilityDenied("remove"));
        }

        let (owner_context, original_url) = {
            let mut state = self.lock();
            if !state.mounted {
                return Err(EditorError::Unmounted);
            }
            if state.upload_in_flight {
                return Err(EditorError::UploadInProgress);
            }
            state.asset.is_placeholder = true;
            state.status = InstanceStatus::Idle;
            state.sync.record_local_write(None, Instant::now());
            (
                state.asset.owner_context.clone(),
                state.asset.original_url().to_string(),
            )
        };

        self.services.store.remove_image(&owner_context, &original_url);
        Ok(())
    }

    /// Follow a replacement of the URL this instance currently shows. Matching
    /// on `current_url` lets successive replacements chain.
    fn apply_replacement(&self, event: &ReplacementEvent) -> bool {
        let mut state = self.lock();
        if !state.mounted || event.old_url == event.new_url {
            return false;
        }
        if state.asset.current_url != event.old_url {
            return false;
        }

        state.asset.current_url.clone_from(&event.new_url);
        state.revision += 1;
        clear_load_failure(&mut state);
        tracing::debug!(
            original_url = %state.asset.original_url(),
            new_url = %event.new_url,
            "instance followed replacement"
        );
        true
    }

    /// Show captions generated or settled for the image this instance
    /// displays.
    fn apply_caption(&self, event: &CaptionEvent) {
        let (CaptionEvent::Generated {
            project_id,
            image_url,
            caption,
        }
        | CaptionEvent::Settled {
            project_id,
            image_url,
            caption,
        }) = event;

        let mut state = self.lock();
        if !state.mounted || *project_id != state.asset.owner_context {
            return;
        }
        if *image_url != state.asset.current_url && image_url != state.asset.original_url() {
            return;
        }
        state.asset.caption = (!caption.trim().is_empty()).then(|| caption.clone());
    }

    fn apply_store_update(&self, update: &StoreUpdate) {
        let mut state = self.lock();
        if !state.mounted {
            return;
        }
        let relevant = match &update.change {
            StoreChange::ImageReplaced { original_url, .. }
            | StoreChange::ImageRemoved { original_url } => {
                original_url == state.asset.original_url()
            }
            StoreChange::Imported => true,
            StoreChange::ContentBlocks { .. } => false,
        };
        if !relevant {
            return;
        }
        let resolved = update
            .state
            .resolve(state.asset.original_url())
            .map(str::to_string);
        if state.sync.on_remote(&resolved, Instant::now()) == RemoteDecision::Skip {
            return;
        }
        apply_resolution(&mut state, resolved);
    }
}

fn apply_resolution(state: &mut InstanceState, resolved: Option<String>) {
    match resolved {
        Some(url) => {
            if state.asset.current_url != url {
                state.asset.current_url = url;
                state.asset.is_placeholder = false;
                state.revision += 1;
                clear_load_failure(state);
            }
        }
        None => state.asset.is_placeholder = true,
    }
}

fn clear_load_failure(state: &mut InstanceState) {
    if matches!(
        state.status,
        InstanceStatus::Error(InstanceFault::LoadFailed { .. })
    ) {
        state.status = if state.upload_in_flight {
            InstanceStatus::Uploading
        } else {
            InstanceStatus::Idle
        };
    }
}
