use portfolio_editor::{ContentPersistenceStore, StoreChange, StoreUpdate};
use portfolio_media::{ContentBlock, OwnerContext};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

fn blocks(text: &str) -> Vec<ContentBlock> {
    vec![
        ContentBlock::Heading {
            text: "Overview".to_string(),
            level: 2,
        },
        ContentBlock::Text {
            text: text.to_string(),
        },
    ]
}

#[test]
fn writes_to_one_map_preserve_the_other() {
    let store = ContentPersistenceStore::new();
    let project = OwnerContext::new("p1");

    store.set_image_replacement(&project, "img-A.png", "new-A.png");
    store.set_content_blocks(&project, "intro", blocks("Hello"));
    store.set_image_replacement(&project, "img-B.png", "new-B.png");

    let state = store.get(&project);
    assert_eq!(state.image_replacements.len(), 2);
    assert_eq!(state.content_blocks.get("intro"), Some(&blocks("Hello")));
    assert_eq!(store.content_blocks(&project, "intro"), blocks("Hello"));
    assert!(store.content_blocks(&project, "missing").is_empty());
}

#[test]
fn last_writer_wins_per_key() {
    let store = ContentPersistenceStore::new();
    let project = OwnerContext::new("p1");

    store.set_image_replacement(&project, "img-A.png", "first.png");
    store.set_image_replacement(&project, "img-A.png", "second.png");

    assert_eq!(
        store.resolve(&project, "img-A.png").as_deref(),
        Some("second.png")
    );
    assert_eq!(
        store.resolve(&project, "img-Z.png").as_deref(),
        Some("img-Z.png")
    );
    assert_eq!(
        store.resolve(&OwnerContext::new("unknown"), "img-A.png").as_deref(),
        Some("img-A.png")
    );
}

#[test]
fn subscribers_are_notified_synchronously_for_their_project_only() {
    let store = ContentPersistenceStore::new();
    let p1 = OwnerContext::new("p1");
    let received: Arc<Mutex<Vec<StoreUpdate>>> = Arc::default();

    let subscription = store.subscribe(&p1, {
        let received = received.clone();
        move |update: &StoreUpdate| received.lock().unwrap().push(update.clone())
    });

    store.set_image_replacement(&p1, "img-A.png", "new-A.png");
    assert_eq!(received.lock().unwrap().len(), 1);

    store.set_image_replacement(&OwnerContext::new("p2"), "img-A.png", "other.png");
    store.set_content_blocks(&p1, "intro", blocks("Hi"));

    {
        let received = received.lock().unwrap();
        assert_eq!(received.len(), 2);
        assert_eq!(
            received[0].change,
            StoreChange::ImageReplaced {
                original_url: "img-A.png".to_string(),
                new_url: "new-A.png".to_string(),
            }
        );
        assert_eq!(
            received[1].change,
            StoreChange::ContentBlocks {
                section_key: "intro".to_string()
            }
        );
        // Each notification carries the full state after the write.
        assert_eq!(received[1].state.image_replacements.len(), 1);
        assert_eq!(received[1].state.content_blocks.len(), 1);
    }

    drop(subscription);
    store.set_content_blocks(&p1, "intro", blocks("Bye"));
    assert_eq!(received.lock().unwrap().len(), 2);
}

#[test]
fn removal_is_undone_by_a_later_replacement() {
    let store = ContentPersistenceStore::new();
    let project = OwnerContext::new("p1");

    store.set_image_replacement(&project, "img-A.png", "new-A.png");
    store.remove_image(&project, "img-A.png");
    assert_eq!(store.resolve(&project, "img-A.png"), None);
    assert!(store.get(&project).image_replacements.is_empty());

    store.set_image_replacement(&project, "img-A.png", "back.png");
    assert_eq!(
        store.resolve(&project, "img-A.png").as_deref(),
        Some("back.png")
    );
    assert!(store.get(&project).removed_images.is_empty());
}

#[test]
fn export_uses_the_persisted_shape() {
    let store = ContentPersistenceStore::new();
    let project = OwnerContext::new("p1");
    store.set_image_replacement(&project, "img-A.png", "new-A.png");
    store.set_content_blocks(
        &project,
        "gallery",
        vec![ContentBlock::Image {
            url: "img-A.png".to_string(),
            caption: Some("A dashboard.".to_string()),
        }],
    );

    let exported: Value =
        serde_json::from_str(&store.export_json().expect("export")).expect("valid json");

    assert_eq!(
        exported,
        json!({
            "p1": {
                "imageReplacements": { "img-A.png": "new-A.png" },
                "contentBlocks": {
                    "gallery": [
                        { "type": "image", "url": "img-A.png", "caption": "A dashboard." }
                    ]
                }
            }
        })
    );
}

#[test]
fn import_replaces_projects_and_notifies() {
    let source = ContentPersistenceStore::new();
    let project = OwnerContext::new("p1");
    source.set_image_replacement(&project, "img-A.png", "new-A.png");
    source.remove_image(&project, "img-B.png");
    let json = source.export_json().expect("export");

    let target = ContentPersistenceStore::new();
    target.set_content_blocks(&OwnerContext::new("p2"), "intro", blocks("Kept"));
    let changes: Arc<Mutex<Vec<StoreChange>>> = Arc::default();
    let _subscription = target.subscribe(&project, {
        let changes = changes.clone();
        move |update: &StoreUpdate| changes.lock().unwrap().push(update.change.clone())
    });

    target.import_json(&json).expect("import");

    assert_eq!(target.get(&project), source.get(&project));
    assert_eq!(
        target.content_blocks(&OwnerContext::new("p2"), "intro"),
        blocks("Kept")
    );
    assert_eq!(changes.lock().unwrap().clone(), vec![StoreChange::Imported]);
    assert!(target.import_json("not json").is_err());
}
