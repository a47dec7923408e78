use crate::{
    broadcaster::{Broadcaster, Subscription},
    EditorError,
};
use portfolio_media::{ContentBlock, OwnerContext, PersistedProjectState};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex},
};

/// What a write changed. Subscribers receive it together with the full
/// project state after the write.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    ImageReplaced {
        original_url: String,
        new_url: String,
    },
    ImageRemoved {
        original_url: String,
    },
    ContentBlocks {
        section_key: String,
    },
    Imported,
}

#[derive(Debug, Clone)]
pub struct StoreUpdate {
    pub project_id: OwnerContext,
    pub change: StoreChange,
    pub state: Arc<PersistedProjectState>,
}

/// Keyed map from project to its persisted media and content state.
///
/// Every write reads the full project state, applies the change, writes the
/// full state back and then notifies that project's subscribers
/// synchronously. Last writer wins per key. Cloning yields another handle to
/// the same store.
#[derive(Clone, Default)]
pub struct ContentPersistenceStore {
    projects: Arc<Mutex<HashMap<OwnerContext, PersistedProjectState>>>,
    updates: Broadcaster<StoreUpdate>,
}

impl ContentPersistenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Full state of a project. Unknown projects yield an empty state.
    #[must_use]
    pub fn get(&self, project_id: &OwnerContext) -> PersistedProjectState {
        self.projects
            .lock()
            .expect("store poisoned")
            .get(project_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The URL `original_url` currently resolves to, or `None` when removed.
    #[must_use]
    pub fn resolve(&self, project_id: &OwnerContext, original_url: &str) -> Option<String> {
        let projects = self.projects.lock().expect("store poisoned");
        match projects.get(project_id) {
            Some(state) => state.resolve(original_url).map(str::to_string),
            None => Some(original_url.to_string()),
        }
    }

    #[must_use]
    pub fn content_blocks(&self, project_id: &OwnerContext, section_key: &str) -> Vec<ContentBlock> {
        self.projects
            .lock()
            .expect("store poisoned")
            .get(project_id)
            .and_then(|state| state.content_blocks.get(section_key).cloned())
            .unwrap_or_default()
    }

    pub fn set_image_replacement(&self, project_id: &OwnerContext, original_url: &str, new_url: &str) {
        self.write(
            project_id,
            StoreChange::ImageReplaced {
                original_url: original_url.to_string(),
                new_url: new_url.to_string(),
            },
            |state| {
                state.removed_images.remove(original_url);
                state
                    .image_replacements
                    .insert(original_url.to_string(), new_url.to_string());
            },
        );
    }

    pub fn remove_image(&self, project_id: &OwnerContext, original_url: &str) {
        self.write(
            project_id,
            StoreChange::ImageRemoved {
                original_url: original_url.to_string(),
            },
            |state| {
                state.image_replacements.remove(original_url);
                state.removed_images.insert(original_url.to_string());
            },
        );
    }

    pub fn set_content_blocks(
        &self,
        project_id: &OwnerContext,
        section_key: &str,
        blocks: Vec<ContentBlock>,
    ) {
        self.write(
            project_id,
            StoreChange::ContentBlocks {
                section_key: section_key.to_string(),
            },
            |state| {
                state
                    .content_blocks
                    .insert(section_key.to_string(), blocks);
            },
        );
    }

    /// Receive every update to `project_id`.
    pub fn subscribe<F>(&self, project_id: &OwnerContext, handler: F) -> Subscription
    where
        F: Fn(&StoreUpdate) + Send + Sync + 'static,
    {
        let project_id = project_id.clone();
        self.updates.subscribe(move |update: &StoreUpdate| {
            if update.project_id == project_id {
                handler(update);
            }
        })
    }

    /// Serialize every project as `{ projectId: { imageReplacements,
    /// contentBlocks } }`.
    pub fn export_json(&self) -> Result<String, EditorError> {
        let projects = self.projects.lock().expect("store poisoned");
        let ordered: BTreeMap<&OwnerContext, &PersistedProjectState> = projects.iter().collect();
        Ok(serde_json::to_string(&ordered)?)
    }

    /// Replace the state of every project present in `json`, notifying each
    /// project's subscribers. Projects absent from `json` are left untouched.
    pub fn import_json(&self, json: &str) -> Result<(), EditorError> {
        let imported: BTreeMap<OwnerContext, PersistedProjectState> = serde_json::from_str(json)?;
        for (project_id, state) in imported {
            self.write(&project_id, StoreChange::Imported, move |current| {
                *current = state;
            });
        }
        Ok(())
    }

    fn write<F>(&self, project_id: &OwnerContext, change: StoreChange, apply: F)
    where
        F: FnOnce(&mut PersistedProjectState),
    {
        let state = {
            let mut projects = self.projects.lock().expect("store poisoned");
            let mut state = projects.get(project_id).cloned().unwrap_or_default();
            apply(&mut state);
            projects.insert(project_id.clone(), state.clone());
            Arc::new(state)
        };

        tracing::debug!(project_id = %project_id, change = ?change, "store updated");

        self.updates.publish(StoreUpdate {
            project_id: project_id.clone(),
            change,
            state,
        });
    }
}

impl std::fmt::Debug for ContentPersistenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let projects = self.projects.lock().expect("store poisoned");
        f.debug_struct("ContentPersistenceStore")
            .field("projects", &projects.len())
            .finish()
    }
}
