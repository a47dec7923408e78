#![allow(dead_code)]

use portfolio_editor::{EditorParams, MediaEditor};
use portfolio_media::media_test::{MockAssetUploader, MockCaptionGenerator};
use std::sync::{Arc, Once};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub struct Fixture {
    pub editor: MediaEditor,
    pub uploader: Arc<MockAssetUploader>,
    pub generator: Arc<MockCaptionGenerator>,
}

pub fn fixture() -> Fixture {
    fixture_with(|params| params)
}

/// Route editor logs to the test writer. Set `RUST_LOG=portfolio_editor=debug`
/// to see them.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::from_default_env())
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();
    });
}

pub fn fixture_with(configure: impl FnOnce(EditorParams) -> EditorParams) -> Fixture {
    init_tracing();
    let uploader = Arc::new(MockAssetUploader::new());
    let generator = Arc::new(MockCaptionGenerator::new());
    let editor = configure(MediaEditor::builder(uploader.clone(), generator.clone())).build();
    Fixture {
        editor,
        uploader,
        generator,
    }
}
