mod common;

use common::{fixture, fixture_with};
use futures::StreamExt;
use portfolio_editor::{CaptionControllerParams, CaptionEvent};
use portfolio_media::{
    media_test::MockCaptionResult, CaptionResponse, CaptionSource, GenerationStatus, MediaError,
    OwnerContext,
};
use std::time::Duration;

#[tokio::test]
async fn placeholder_caption_is_generated_once_with_trailing_period() {
    let fixture = fixture();
    let mut events = fixture.editor.captions().stream();
    fixture
        .generator
        .enqueue("A dashboard showing revenue trends");

    let controller = fixture.editor.caption_controller(
        CaptionControllerParams::new("fintech", "img-A.png")
            .caption("Click to add caption...")
            .context("Fintech app redesign"),
    );
    assert!(controller.needs_generation());

    let generated = controller.mount().await;

    assert_eq!(
        generated.as_deref(),
        Some("A dashboard showing revenue trends.")
    );
    let caption = controller.caption();
    assert_eq!(caption.text, "A dashboard showing revenue trends.");
    assert_eq!(caption.source, CaptionSource::Generated);
    assert!(caption.generation_attempted());

    let request = &fixture.generator.tracked_requests()[0];
    assert_eq!(request.image_url, "img-A.png");
    assert_eq!(request.context.as_deref(), Some("Fintech app redesign"));

    assert_eq!(
        events.next().await,
        Some(CaptionEvent::Generated {
            project_id: OwnerContext::new("fintech"),
            image_url: "img-A.png".to_string(),
            caption: "A dashboard showing revenue trends.".to_string(),
        })
    );

    controller.unmount();
    assert_eq!(controller.mount().await, None);
    assert_eq!(fixture.generator.call_count(), 1);
}

#[tokio::test]
async fn generation_is_attempted_at_most_once_even_after_failure() {
    let fixture = fixture();
    fixture
        .generator
        .enqueue(MockCaptionResult::error(MediaError::InvalidInput(
            "model unavailable".to_string(),
        )))
        .enqueue("Never requested");

    let controller = fixture
        .editor
        .caption_controller(CaptionControllerParams::new("p1", "img-A.png"));

    assert_eq!(controller.mount().await, None);
    assert_eq!(controller.caption().text, "");
    assert!(controller.needs_generation());
    assert_eq!(controller.generation_status(), GenerationStatus::Done);

    controller.unmount();
    assert_eq!(controller.mount().await, None);
    assert_eq!(fixture.generator.call_count(), 1);
}

#[tokio::test]
async fn usable_caption_is_kept() {
    let fixture = fixture();
    let controller = fixture.editor.caption_controller(
        CaptionControllerParams::new("p1", "img-A.png")
            .caption("Final onboarding screens for the mobile app."),
    );

    assert_eq!(controller.mount().await, None);
    assert_eq!(fixture.generator.call_count(), 0);
    assert_eq!(controller.caption().source, CaptionSource::Manual);
    assert_eq!(controller.generation_status(), GenerationStatus::NotAttempted);
}

#[tokio::test]
async fn short_caption_triggers_generation() {
    let fixture = fixture();
    fixture.generator.enqueue("Wireframes of the settings page");
    let controller = fixture
        .editor
        .caption_controller(CaptionControllerParams::new("p1", "img-A.png").caption("Shot"));

    assert_eq!(
        controller.mount().await.as_deref(),
        Some("Wireframes of the settings page.")
    );
}

#[tokio::test]
async fn placeholder_comparison_ignores_case_and_whitespace() {
    let fixture = fixture_with(|params| params.add_placeholder_caption("Describe this image"));
    fixture.generator.enqueue("A landing page hero section");
    let controller = fixture.editor.caption_controller(
        CaptionControllerParams::new("p1", "img-A.png").caption("  describe THIS image "),
    );

    assert_eq!(controller.caption().source, CaptionSource::Placeholder);
    assert!(controller.mount().await.is_some());
}

#[tokio::test]
async fn generating_indicator_shows_while_pending() {
    let fixture = fixture();
    let (deferred, sender) = MockCaptionResult::deferred();
    fixture.generator.enqueue(deferred);
    let controller = fixture
        .editor
        .caption_controller(CaptionControllerParams::new("p1", "img-A.png"));

    let handle = tokio::spawn({
        let controller = controller.clone();
        async move { controller.mount().await }
    });
    for _ in 0..50 {
        if controller.view().generating {
            break;
        }
        tokio::task::yield_now().await;
    }
    assert!(controller.view().generating);
    assert_eq!(controller.generation_status(), GenerationStatus::Pending);

    // A remount while pending does not start a second request.
    assert_eq!(controller.mount().await, None);

    sender
        .send(Ok(CaptionResponse {
            caption: "A color palette exploration. With notes.".to_string(),
        }))
        .expect("generation still pending");

    let generated = handle.await.expect("task");
    assert_eq!(generated.as_deref(), Some("A color palette exploration."));
    assert!(!controller.view().generating);
    assert_eq!(fixture.generator.call_count(), 1);
}

#[tokio::test]
async fn result_arriving_after_unmount_is_discarded() {
    let fixture = fixture();
    let mut events = fixture.editor.captions().stream();
    let (deferred, sender) = MockCaptionResult::deferred();
    fixture.generator.enqueue(deferred);
    let controller = fixture
        .editor
        .caption_controller(CaptionControllerParams::new("p1", "img-A.png"));

    let handle = tokio::spawn({
        let controller = controller.clone();
        async move { controller.mount().await }
    });
    for _ in 0..50 {
        if controller.view().generating {
            break;
        }
        tokio::task::yield_now().await;
    }

    controller.unmount();
    sender
        .send(Ok(CaptionResponse {
            caption: "Too late".to_string(),
        }))
        .expect("generation still pending");

    assert_eq!(handle.await.expect("task"), None);
    assert_eq!(controller.caption().text, "");
    assert_eq!(controller.generation_status(), GenerationStatus::Done);

    fixture.editor.captions().publish(CaptionEvent::Settled {
        project_id: OwnerContext::new("marker"),
        image_url: String::new(),
        caption: String::new(),
    });
    assert!(matches!(
        events.next().await,
        Some(CaptionEvent::Settled { .. })
    ));
}

#[tokio::test]
async fn manual_caption_typed_while_pending_wins() {
    let fixture = fixture();
    let (deferred, sender) = MockCaptionResult::deferred();
    fixture.generator.enqueue(deferred);
    let controller = fixture
        .editor
        .caption_controller(CaptionControllerParams::new("p1", "img-A.png"));

    let handle = tokio::spawn({
        let controller = controller.clone();
        async move { controller.mount().await }
    });
    for _ in 0..50 {
        if controller.view().generating {
            break;
        }
        tokio::task::yield_now().await;
    }

    controller.edit("Early sketches of the navigation model.");
    sender
        .send(Ok(CaptionResponse {
            caption: "Generated text".to_string(),
        }))
        .expect("generation still pending");

    assert_eq!(handle.await.expect("task"), None);
    assert_eq!(
        controller.caption().text,
        "Early sketches of the navigation model."
    );
    assert_eq!(controller.caption().source, CaptionSource::Manual);
}

#[tokio::test(start_paused = true)]
async fn manual_edits_settle_after_the_debounce_window() {
    let fixture = fixture();
    let mut events = fixture.editor.captions().stream();
    let controller = fixture.editor.caption_controller(
        CaptionControllerParams::new("p1", "img-A.png")
            .caption("Final onboarding screens for the mobile app."),
    );
    controller.mount().await;

    controller.edit("Final");
    tokio::time::sleep(Duration::from_millis(300)).await;
    controller.edit("Final onboarding");
    tokio::time::sleep(Duration::from_millis(300)).await;
    controller.edit("Final onboarding flow.");

    assert_eq!(controller.caption().text, "Final onboarding flow.");
    assert_eq!(controller.settled(), None);

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(controller.settled(), None);

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(controller.settled().as_deref(), Some("Final onboarding flow."));

    assert_eq!(
        events.next().await,
        Some(CaptionEvent::Settled {
            project_id: OwnerContext::new("p1"),
            image_url: "img-A.png".to_string(),
            caption: "Final onboarding flow.".to_string(),
        })
    );

    tokio::time::sleep(Duration::from_secs(5)).await;
    fixture.editor.captions().publish(CaptionEvent::Settled {
        project_id: OwnerContext::new("marker"),
        image_url: String::new(),
        caption: String::new(),
    });
    assert!(matches!(
        events.next().await,
        Some(CaptionEvent::Settled { project_id, .. }) if project_id == OwnerContext::new("marker")
    ));
}

#[tokio::test(start_paused = true)]
async fn unmount_settles_a_pending_edit() {
    let fixture = fixture();
    let controller = fixture.editor.caption_controller(
        CaptionControllerParams::new("p1", "img-A.png")
            .caption("Final onboarding screens for the mobile app."),
    );
    controller.mount().await;

    controller.edit("Edited right before leaving.");
    controller.unmount();

    assert_eq!(
        controller.settled().as_deref(),
        Some("Edited right before leaving.")
    );
}

#[tokio::test(start_paused = true)]
async fn clearing_a_generated_caption_does_not_regenerate() {
    let fixture = fixture();
    fixture.generator.enqueue("A dashboard showing revenue trends");
    let controller = fixture.editor.caption_controller(
        CaptionControllerParams::new("p1", "img-A.png").caption("Click to add caption..."),
    );
    controller.mount().await;

    controller.edit("");
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(controller.needs_generation());
    assert_eq!(controller.caption().source, CaptionSource::Placeholder);

    controller.unmount();
    assert_eq!(controller.mount().await, None);
    assert_eq!(fixture.generator.call_count(), 1);
}

#[tokio::test]
async fn progress_counts_generated_captions_per_project() {
    let fixture = fixture();
    let progress = fixture.editor.track_generation_progress();
    fixture
        .generator
        .enqueue("First image of the case study")
        .enqueue("Second image of the case study");

    for url in ["a.png", "b.png"] {
        let controller = fixture
            .editor
            .caption_controller(CaptionControllerParams::new("case-study", url));
        controller.mount().await;
    }

    assert_eq!(progress.generated(&OwnerContext::new("case-study")), 2);
    assert_eq!(progress.generated(&OwnerContext::new("other")), 0);
}
