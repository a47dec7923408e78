mod broadcaster;
mod caption_controller;
mod debounce;
mod editor;
mod errors;
mod instance;
mod opentelemetry;
mod params;
mod store;
mod sync_guard;
mod viewer;

pub use broadcaster::{
    Broadcaster, CaptionBroadcaster, EventStream, ReplacementBroadcaster, Subscription,
};
pub use caption_controller::{
    CaptionController, CaptionControllerParams, CaptionEvent, CaptionPolicy, CaptionView,
    GenerationProgress,
};
pub use debounce::Debouncer;
pub use editor::MediaEditor;
pub use errors::EditorError;
pub use instance::{
    ImageInstance, ImageInstanceParams, InstanceCapabilities, InstanceFault, InstanceStatus,
    InstanceView,
};
pub use params::{
    EditorParams, DEFAULT_CAPTION_MIN_LENGTH, DEFAULT_EDIT_DEBOUNCE, DEFAULT_PLACEHOLDER_CAPTIONS,
    DEFAULT_SYNC_WINDOW,
};
pub use store::{ContentPersistenceStore, StoreChange, StoreUpdate};
pub use sync_guard::{RemoteDecision, SyncGuard};
pub use viewer::{MediaViewer, ViewerItem, ViewerKey, ViewerSession, ZoomLimits, DEFAULT_ZOOM};
