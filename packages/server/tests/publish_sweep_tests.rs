//! Quorum evaluation and publish sweeps against in-memory doubles.

mod common;

use std::time::Duration;

use crate::common::*;
use server_core::domains::publishing::{
    PublishCoordinator, PublishError, QuorumEvaluator, SweepOutcome, SweepReport, SweepTrigger,
};
use server_core::domains::submissions::activities::{
    record_reaction, retract_reaction, withdraw_submission,
};
use server_core::domains::submissions::MessageDeleted;
use server_core::kernel::test_dependencies::{
    InMemorySubmissionRepository, MockChatPlatform, MockPublisher, PublishCall,
};
use server_core::kernel::{ServerDeps, TestDependencies};

async fn sweep(deps: &ServerDeps) -> SweepReport {
    match PublishCoordinator::new(deps.clone())
        .run_sweep(SweepTrigger::Scheduled)
        .await
        .unwrap()
    {
        SweepOutcome::Completed(report) => report,
        SweepOutcome::AlreadyRunning => panic!("unexpected concurrent sweep"),
    }
}

fn is_posted(test: &TestDependencies, ingested: &Ingested) -> bool {
    test.repository
        .submission(ingested.submission_id)
        .map(|s| s.posted)
        .unwrap_or(false)
}

// =============================================================================
// Quorum
// =============================================================================

#[tokio::test]
async fn one_approval_is_eligible_and_a_rejection_blocks_until_removed() {
    let (_test, deps) = test_deps();
    let quorum = QuorumEvaluator::new(deps.repository.clone());
    let ingested = ingest(&deps, message_with(None, vec![media("a.png", "image/png")])).await;

    assert!(!quorum.is_eligible(ingested.submission_id).await.unwrap());

    approve(&deps, &ingested, REVIEWER_A).await;
    assert!(quorum.is_eligible(ingested.submission_id).await.unwrap());

    reject(&deps, &ingested, REVIEWER_B).await;
    assert!(!quorum.is_eligible(ingested.submission_id).await.unwrap());
    assert!(quorum.eligible().await.unwrap().is_empty());

    unreject(&deps, &ingested, REVIEWER_B).await;
    assert!(quorum.is_eligible(ingested.submission_id).await.unwrap());
    assert_eq!(quorum.eligible().await.unwrap().len(), 1);
}

#[tokio::test]
async fn adding_then_removing_a_review_restores_prior_eligibility() {
    let (_test, deps) = test_deps();
    let quorum = QuorumEvaluator::new(deps.repository.clone());
    let ingested = ingest(&deps, message_with(None, vec![media("a.png", "image/png")])).await;

    for (reviewer, verdict) in [(REVIEWER_A, APPROVE), (REVIEWER_B, REJECT)] {
        let before = quorum.is_eligible(ingested.submission_id).await.unwrap();
        record_reaction(
            reaction(ingested.approval_message_id, reviewer, verdict),
            &deps,
        )
        .await
        .unwrap();
        retract_reaction(
            reaction(ingested.approval_message_id, reviewer, verdict),
            &deps,
        )
        .await
        .unwrap();
        assert_eq!(quorum.is_eligible(ingested.submission_id).await.unwrap(), before);
    }
}

#[tokio::test]
async fn rejection_first_then_approval_gives_the_same_result() {
    let (_test, deps) = test_deps();
    let quorum = QuorumEvaluator::new(deps.repository.clone());
    let ingested = ingest(&deps, message_with(None, vec![media("a.png", "image/png")])).await;

    reject(&deps, &ingested, REVIEWER_B).await;
    approve(&deps, &ingested, REVIEWER_A).await;
    assert!(!quorum.is_eligible(ingested.submission_id).await.unwrap());

    unreject(&deps, &ingested, REVIEWER_B).await;
    assert!(quorum.is_eligible(ingested.submission_id).await.unwrap());
}

// =============================================================================
// Sweeps
// =============================================================================

#[tokio::test]
async fn single_png_publishes_as_photo_and_is_marked_posted() {
    let lake = media("lake.png", "image/png");
    let test = TestDependencies::new()
        .mock_chat(MockChatPlatform::new().with_download(&lake.url, png_bytes()));
    let deps = test.into_server_deps();
    let ingested = ingest(&deps, message_with(Some("Lake"), vec![lake])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    let report = sweep(&deps).await;

    assert_eq!(report.eligible, 1);
    assert_eq!(report.published, 1);
    assert_eq!(report.failed, 0);

    let calls = test.publisher.calls();
    assert_eq!(calls.len(), 1);
    let PublishCall::Photo { media, caption } = &calls[0] else {
        panic!("expected photo publish, got {:?}", calls[0]);
    };
    assert_eq!(media.content_type, "image/jpeg");
    assert!(media.storage_ref.ends_with("lake.jpg"));
    let uploaded = test.media_store.get(&media.storage_ref).unwrap();
    assert_eq!(
        image::guess_format(&uploaded).unwrap(),
        image::ImageFormat::Jpeg
    );
    assert_eq!(caption, "Lake\n\nSubmitted by Ada");

    let submission = test.repository.submission(ingested.submission_id).unwrap();
    assert!(submission.posted);
    assert!(submission.posted_at.is_some());
    assert_eq!(submission.post_url.as_deref(), Some(report.urls[0].as_str()));

    let texts = test.chat.texts_in(submission.thread_id);
    let tail = &texts[texts.len() - 2..];
    assert_eq!(tail[0], "Attempting to publish...");
    assert_eq!(tail[1], format!("Success! Posted at <{}>", report.urls[0]));
}

#[tokio::test]
async fn single_video_publishes_as_video() {
    let (test, deps) = test_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("clip.mp4", "video/mp4")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    sweep(&deps).await;

    assert!(matches!(test.publisher.calls()[0], PublishCall::Video { .. }));
    assert!(is_posted(&test, &ingested));
}

#[tokio::test]
async fn mixed_images_publish_as_album_after_normalizing_to_jpeg() {
    let first = media("one.png", "image/png");
    let second = media("two.jpg", "image/jpeg");
    let third = media("three.png", "image/png");
    let test = TestDependencies::new().mock_chat(
        MockChatPlatform::new()
            .with_download(&first.url, png_bytes())
            .with_download(&second.url, jpeg_bytes())
            .with_download(&third.url, png_bytes()),
    );
    let deps = test.into_server_deps();

    let ingested = ingest(&deps, message_with(None, vec![first, second, third])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    let report = sweep(&deps).await;
    assert_eq!(report.published, 1);

    let calls = test.publisher.calls();
    let PublishCall::Album { media, .. } = &calls[0] else {
        panic!("expected album publish, got {:?}", calls[0]);
    };
    assert_eq!(media.len(), 3);
    assert!(media.iter().all(|m| m.content_type == "image/jpeg"));
    assert!(media[0].storage_ref.ends_with("one.jpg"));
    assert!(media[1].storage_ref.ends_with("two.jpg"));
    assert!(media[2].storage_ref.ends_with("three.jpg"));
    for m in media {
        let bytes = test.media_store.get(&m.storage_ref).unwrap();
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            image::ImageFormat::Jpeg
        );
    }
    assert!(is_posted(&test, &ingested));
}

#[tokio::test]
async fn videos_in_an_album_pass_through_unchanged() {
    let photo = media("one.jpg", "image/jpeg");
    let test = TestDependencies::new()
        .mock_chat(MockChatPlatform::new().with_download(&photo.url, jpeg_bytes()));
    let deps = test.into_server_deps();

    let ingested = ingest(
        &deps,
        message_with(None, vec![photo, media("two.mov", "video/quicktime")]),
    )
    .await;
    approve(&deps, &ingested, REVIEWER_A).await;
    sweep(&deps).await;

    let calls = test.publisher.calls();
    let PublishCall::Album { media, .. } = &calls[0] else {
        panic!("expected album publish, got {:?}", calls[0]);
    };
    assert_eq!(media[1].content_type, "video/quicktime");
    assert!(media[1].storage_ref.ends_with("two.mov"));
}

#[tokio::test]
async fn second_sweep_never_republishes() {
    let (test, deps) = test_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("a.jpg", "image/jpeg")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    let first = sweep(&deps).await;
    let second = sweep(&deps).await;

    assert_eq!(first.published, 1);
    assert_eq!(second, SweepReport::default());
    assert_eq!(test.publisher.calls().len(), 1);
    // Empty sweeps do not authenticate.
    assert_eq!(test.publisher.login_count(), 1);
}

#[tokio::test]
async fn posted_flag_is_never_cleared_by_later_reviews() {
    let (test, deps) = test_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("a.jpg", "image/jpeg")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;
    sweep(&deps).await;

    reject(&deps, &ingested, REVIEWER_B).await;
    unreject(&deps, &ingested, REVIEWER_B).await;
    unapprove(&deps, &ingested, REVIEWER_A).await;
    approve(&deps, &ingested, REVIEWER_A).await;
    let report = sweep(&deps).await;

    assert!(is_posted(&test, &ingested));
    assert_eq!(report.eligible, 0);
    assert_eq!(test.publisher.calls().len(), 1);
}

#[tokio::test]
async fn failed_login_aborts_the_sweep_without_attempts() {
    let test = TestDependencies::new().mock_publisher(MockPublisher::new().failing_login());
    let deps = test.into_server_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("a.png", "image/png")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;
    let messages_before = test.chat.messages().len();

    let coordinator = PublishCoordinator::new(deps.clone());
    let result = coordinator.run_sweep(SweepTrigger::Scheduled).await;

    assert!(matches!(result, Err(PublishError::Authentication(_))));
    let record = coordinator.last_sweep().await.unwrap();
    assert_eq!(record.trigger, SweepTrigger::Scheduled);
    assert!(record.report.is_none());
    assert!(record.error.is_some());
    assert_eq!(test.publisher.login_count(), 1);
    assert!(test.publisher.calls().is_empty());
    assert!(!is_posted(&test, &ingested));
    assert_eq!(test.chat.messages().len(), messages_before);
}

#[tokio::test]
async fn one_failure_does_not_stop_the_others() {
    let test = TestDependencies::new()
        .mock_publisher(MockPublisher::new().failing_uploads_containing("cursed"));
    let deps = test.into_server_deps();

    let photo = |name: &str| vec![media(name, "image/jpeg")];
    let good_before = ingest(&deps, message_with(Some("fine"), photo("a.jpg"))).await;
    let bad = ingest(&deps, message_with(Some("cursed"), photo("b.jpg"))).await;
    let good_after = ingest(&deps, message_with(Some("also fine"), photo("c.jpg"))).await;
    for ingested in [&good_before, &bad, &good_after] {
        approve(&deps, ingested, REVIEWER_A).await;
    }

    let report = sweep(&deps).await;

    assert_eq!(report.eligible, 3);
    assert_eq!(report.published, 2);
    assert_eq!(report.failed, 1);
    assert!(is_posted(&test, &good_before));
    assert!(is_posted(&test, &good_after));
    assert!(!is_posted(&test, &bad));

    let bad_thread = test.repository.submission(bad.submission_id).unwrap().thread_id;
    assert_eq!(
        test.chat.texts_in(bad_thread).last().unwrap(),
        "Error! See logs for details."
    );

    // Left unposted for the next sweep, which fails it again.
    let retry = sweep(&deps).await;
    assert_eq!(retry.eligible, 1);
    assert_eq!(retry.failed, 1);
}

#[tokio::test]
async fn undecodable_image_is_a_conversion_failure() {
    let (test, deps) = test_deps();
    // The default mock download yields placeholder bytes, not an image.
    let ingested = ingest(&deps, message_with(None, vec![media("a.png", "image/png")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    let report = sweep(&deps).await;

    assert_eq!(report.failed, 1);
    assert!(test.publisher.calls().is_empty());
    assert!(!is_posted(&test, &ingested));
    let thread_id = test.repository.submission(ingested.submission_id).unwrap().thread_id;
    assert_eq!(
        test.chat.texts_in(thread_id).last().unwrap(),
        "Error! See logs for details."
    );
}

#[tokio::test]
async fn failing_to_record_the_post_sends_no_success_notice() {
    let test = TestDependencies::new()
        .mock_repository(InMemorySubmissionRepository::new().failing_mark_posted());
    let deps = test.into_server_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("a.jpg", "image/jpeg")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    let report = sweep(&deps).await;

    assert_eq!(report.failed, 1);
    assert_eq!(test.publisher.calls().len(), 1);
    assert!(!is_posted(&test, &ingested));
    let thread_id = test.repository.submission(ingested.submission_id).unwrap().thread_id;
    assert!(test
        .chat
        .texts_in(thread_id)
        .iter()
        .all(|t| !t.starts_with("Success!")));
}

#[tokio::test]
async fn withdrawn_submissions_are_never_swept() {
    let (test, deps) = test_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("a.png", "image/png")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    withdraw_submission(
        MessageDeleted {
            message_id: ingested.origin_message_id,
        },
        &deps,
    )
    .await
    .unwrap();
    let report = sweep(&deps).await;

    assert_eq!(report.eligible, 0);
    assert!(test.publisher.calls().is_empty());
}

#[tokio::test]
async fn overlapping_sweeps_are_refused() {
    let (publisher, gate) = MockPublisher::new().with_login_gate();
    let test = TestDependencies::new().mock_publisher(publisher);
    let deps = test.into_server_deps();
    let ingested = ingest(&deps, message_with(None, vec![media("a.jpg", "image/jpeg")])).await;
    approve(&deps, &ingested, REVIEWER_A).await;

    let coordinator = PublishCoordinator::new(deps.clone());
    let running = coordinator.clone();
    let first = tokio::spawn(async move { running.run_sweep(SweepTrigger::Scheduled).await });

    tokio::time::timeout(Duration::from_secs(5), async {
        while !coordinator.is_sweep_running() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();

    let second = coordinator
        .run_sweep(SweepTrigger::Manual {
            requested_by: REVIEWER_A,
        })
        .await
        .unwrap();
    assert_eq!(second, SweepOutcome::AlreadyRunning);

    gate.add_permits(1);
    let first = first.await.unwrap().unwrap();
    let SweepOutcome::Completed(report) = first else {
        panic!("first sweep should complete");
    };
    assert_eq!(report.published, 1);
    assert_eq!(test.publisher.calls().len(), 1);
}

// =============================================================================
// End to end
// =============================================================================

#[tokio::test]
async fn veto_then_retraction_publishes_exactly_once() {
    let first = media("one.png", "image/png");
    let second = media("two.png", "image/png");
    let test = TestDependencies::new().mock_chat(
        MockChatPlatform::new()
            .with_download(&first.url, png_bytes())
            .with_download(&second.url, png_bytes()),
    );
    let deps = test.into_server_deps();

    let s1 = ingest(&deps, message_with(Some("Two photos"), vec![first, second])).await;
    approve(&deps, &s1, REVIEWER_A).await;
    reject(&deps, &s1, REVIEWER_B).await;

    let blocked = sweep(&deps).await;
    assert_eq!(blocked.eligible, 0);
    assert!(!is_posted(&test, &s1));

    unreject(&deps, &s1, REVIEWER_B).await;
    let published = sweep(&deps).await;
    assert_eq!(published.published, 1);
    assert!(is_posted(&test, &s1));

    let again = sweep(&deps).await;
    assert_eq!(again.eligible, 0);

    let calls = test.publisher.calls();
    assert_eq!(calls.len(), 1);
    assert!(matches!(calls[0], PublishCall::Album { .. }));
    assert_eq!(calls[0].caption(), "Two photos\n\nSubmitted by Ada");
}
