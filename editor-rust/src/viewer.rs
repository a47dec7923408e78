use crate::EditorError;
use portfolio_media::MediaKind;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One entry of the list a viewer session browses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewerItem {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub kind: MediaKind,
}

impl ViewerItem {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            caption: None,
            title: None,
            kind: MediaKind::Image,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            kind: MediaKind::Video,
            ..Self::image(url)
        }
    }

    #[must_use]
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Zoom bounds and increment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.5,
            max: 3.0,
            step: 0.25,
        }
    }
}

impl ZoomLimits {
    /// Limits that are safe to clamp with. Non-finite or non-positive values
    /// fall back to the defaults and swapped bounds are reordered.
    #[must_use]
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let usable = |value: f64, fallback: f64| {
            if value.is_finite() && value > 0.0 {
                value
            } else {
                fallback
            }
        };
        let min = usable(self.min, defaults.min);
        let max = usable(self.max, defaults.max);
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Self {
            min,
            max,
            step: usable(self.step, defaults.step),
        }
    }
}

pub const DEFAULT_ZOOM: f64 = 1.0;

/// Keys the viewer responds to while open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerKey {
    Close,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    Previous,
    Next,
}

impl ViewerKey {
    /// Map a DOM `KeyboardEvent.key` value.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "Escape" => Some(Self::Close),
            "+" | "=" => Some(Self::ZoomIn),
            "-" => Some(Self::ZoomOut),
            "0" => Some(Self::ResetZoom),
            "ArrowLeft" => Some(Self::Previous),
            "ArrowRight" => Some(Self::Next),
            _ => None,
        }
    }
}

/// State of an open viewer. Always seeded from `items[current_index]`; moving
/// to another item builds a fresh session.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewerSession {
    items: Arc<[ViewerItem]>,
    current_index: usize,
    current: ViewerItem,
    zoom_scale: f64,
}

impl ViewerSession {
    fn seed(items: Arc<[ViewerItem]>, index: usize) -> Self {
        let current = items[index].clone();
        Self {
            items,
            current_index: index,
            current,
            zoom_scale: DEFAULT_ZOOM,
        }
    }

    #[must_use]
    pub fn items(&self) -> &[ViewerItem] {
        &self.items
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The displayed item. Its URL, title and caption always belong to
    /// `items()[current_index()]`.
    #[must_use]
    pub fn current(&self) -> &ViewerItem {
        &self.current
    }

    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        self.zoom_scale
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
enum ViewerState {
    #[default]
    Closed,
    Open(ViewerSession),
}

/// Full-screen viewer with list navigation and zoom. Display only.
#[derive(Debug, Clone, Default)]
pub struct MediaViewer {
    state: ViewerState,
    limits: ZoomLimits,
}

impl MediaViewer {
    #[must_use]
    pub fn new(limits: ZoomLimits) -> Self {
        Self {
            state: ViewerState::Closed,
            limits: limits.normalized(),
        }
    }

    /// Open a session on `items[index]`, replacing any open session.
    pub fn open(&mut self, items: Vec<ViewerItem>, index: usize) -> Result<(), EditorError> {
        if items.is_empty() {
            return Err(EditorError::InvalidInput(
                "Cannot open the viewer without items".to_string(),
            ));
        }
        if index >= items.len() {
            return Err(EditorError::InvalidInput(format!(
                "Viewer index {index} is out of range for {} items",
                items.len()
            )));
        }

        tracing::debug!(index, items = items.len(), "viewer opened");
        self.state = ViewerState::Open(ViewerSession::seed(items.into(), index));
        Ok(())
    }

    /// Returns whether a session was open.
    pub fn close(&mut self) -> bool {
        let was_open = self.is_open();
        self.state = ViewerState::Closed;
        if was_open {
            tracing::debug!("viewer closed");
        }
        was_open
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        matches!(self.state, ViewerState::Open(_))
    }

    #[must_use]
    pub fn session(&self) -> Option<&ViewerSession> {
        match &self.state {
            ViewerState::Open(session) => Some(session),
            ViewerState::Closed => None,
        }
    }

    /// Current zoom. A closed viewer reports the default scale.
    #[must_use]
    pub fn zoom_scale(&self) -> f64 {
        self.session()
            .map_or(DEFAULT_ZOOM, ViewerSession::zoom_scale)
    }

    pub fn zoom_in(&mut self) -> Option<f64> {
        let step = self.limits.step;
        self.adjust_zoom(|scale| scale + step)
    }

    pub fn zoom_out(&mut self) -> Option<f64> {
        let step = self.limits.step;
        self.adjust_zoom(|scale| scale - step)
    }

    pub fn reset_zoom(&mut self) -> Option<f64> {
        self.adjust_zoom(|_| DEFAULT_ZOOM)
    }

    /// Move to the next item, wrapping to the first. Returns the new index.
    pub fn next(&mut self) -> Option<usize> {
        self.navigate(|index, len| (index + 1) % len)
    }

    /// Move to the previous item, wrapping to the last. Returns the new index.
    pub fn previous(&mut self) -> Option<usize> {
        self.navigate(|index, len| (index + len - 1) % len)
    }

    /// Apply a key press. Returns whether the key was handled; keys are
    /// ignored while the viewer is closed.
    pub fn handle_key(&mut self, key: ViewerKey) -> bool {
        if !self.is_open() {
            return false;
        }
        match key {
            ViewerKey::Close => self.close(),
            ViewerKey::ZoomIn => self.zoom_in().is_some(),
            ViewerKey::ZoomOut => self.zoom_out().is_some(),
            ViewerKey::ResetZoom => self.reset_zoom().is_some(),
            ViewerKey::Previous => self.previous().is_some(),
            ViewerKey::Next => self.next().is_some(),
        }
    }

    fn adjust_zoom(&mut self, f: impl FnOnce(f64) -> f64) -> Option<f64> {
        let ZoomLimits { min, max, .. } = self.limits;
        let ViewerState::Open(session) = &mut self.state else {
            return None;
        };
        // Videos are shown at their natural size.
        if session.current.kind == MediaKind::Video {
            return Some(session.zoom_scale);
        }
        session.zoom_scale = f(session.zoom_scale).clamp(min, max);
        Some(session.zoom_scale)
    }

    fn navigate(&mut self, step: impl FnOnce(usize, usize) -> usize) -> Option<usize> {
        let ViewerState::Open(session) = &self.state else {
            return None;
        };
        let len = session.len();
        if len < 2 {
            return Some(session.current_index);
        }

        let index = step(session.current_index, len);
        let next = ViewerSession::seed(session.items.clone(), index);
        tracing::debug!(index, url = %next.current.url, "viewer navigated");
        self.state = ViewerState::Open(next);
        Some(index)
    }
}
