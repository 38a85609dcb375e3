//! Postgres repository behavior against a real database.
//!
//! Requires Docker: `cargo test -- --ignored`.

mod common;

use crate::common::{next_id, TestHarness};
use server_core::domains::submissions::models::{NewAttachment, NewReview, NewSubmission};
use server_core::kernel::BaseSubmissionRepository;
use test_context::test_context;

fn new_submission() -> NewSubmission {
    let origin = next_id() + 7_000_000_000;
    NewSubmission {
        origin_message_id: origin,
        thread_id: origin + 1,
        author_id: 501,
        author_display_name: "Ada".into(),
        content: Some("caption".into()),
    }
}

fn attachments(count: usize) -> Vec<NewAttachment> {
    (0..count)
        .map(|i| NewAttachment {
            external_attachment_id: i as i64,
            content_type: "image/png".into(),
            storage_ref: format!("dir{}/file{}.png", i, i),
        })
        .collect()
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn create_stores_attachments_in_order(ctx: &TestHarness) {
    let repo = ctx.repository();
    let (submission, saved) = repo
        .create_submission(&new_submission(), &attachments(3))
        .await
        .unwrap();

    assert!(!submission.posted);
    assert_eq!(submission.approval_message_id, None);
    let loaded = repo.attachments_for(submission.id).await.unwrap();
    assert_eq!(loaded, saved);
    assert_eq!(
        loaded.iter().map(|a| a.position).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn duplicate_origin_message_is_rejected(ctx: &TestHarness) {
    let repo = ctx.repository();
    let new = new_submission();
    repo.create_submission(&new, &attachments(1)).await.unwrap();
    assert!(repo.create_submission(&new, &attachments(1)).await.is_err());
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn approval_message_is_set_once_and_found(ctx: &TestHarness) {
    let repo = ctx.repository();
    let (submission, _) = repo
        .create_submission(&new_submission(), &attachments(1))
        .await
        .unwrap();
    let prompt = next_id() + 8_000_000_000;

    assert!(repo.set_approval_message(submission.id, prompt).await.unwrap());
    assert!(!repo.set_approval_message(submission.id, prompt + 1).await.unwrap());

    let found = repo.find_by_approval_message(prompt).await.unwrap().unwrap();
    assert_eq!(found.id, submission.id);
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn eligibility_query_follows_the_quorum_rule(ctx: &TestHarness) {
    let repo = ctx.repository();
    let (approved, _) = repo.create_submission(&new_submission(), &attachments(1)).await.unwrap();
    let (vetoed, _) = repo.create_submission(&new_submission(), &attachments(1)).await.unwrap();
    let (unreviewed, _) = repo.create_submission(&new_submission(), &attachments(1)).await.unwrap();

    for (id, reviewer, approval) in [
        (approved.id, 1, true),
        (approved.id, 2, true),
        (vetoed.id, 1, true),
        (vetoed.id, 2, false),
    ] {
        repo.add_review(&NewReview {
            submission_id: id,
            approval,
            reviewer_id: reviewer,
            reviewer_display_name: format!("r{}", reviewer),
        })
        .await
        .unwrap();
    }

    let eligible: Vec<_> = repo
        .find_publish_eligible()
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.id)
        .collect();
    assert!(eligible.contains(&approved.id));
    assert!(!eligible.contains(&vetoed.id));
    assert!(!eligible.contains(&unreviewed.id));

    assert!(repo.remove_review(vetoed.id, 2, false).await.unwrap());
    assert!(!repo.remove_review(vetoed.id, 2, false).await.unwrap());
    let eligible = repo.find_publish_eligible().await.unwrap();
    assert!(eligible.iter().any(|s| s.id == vetoed.id));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn mark_posted_is_one_way(ctx: &TestHarness) {
    let repo = ctx.repository();
    let (submission, _) = repo.create_submission(&new_submission(), &attachments(1)).await.unwrap();
    repo.add_review(&NewReview {
        submission_id: submission.id,
        approval: true,
        reviewer_id: 1,
        reviewer_display_name: "r1".into(),
    })
    .await
    .unwrap();

    assert!(repo.mark_posted(submission.id, "https://instagram.example/p/1").await.unwrap());
    assert!(!repo.mark_posted(submission.id, "https://instagram.example/p/2").await.unwrap());

    let stored = repo.find_submission(submission.id).await.unwrap().unwrap();
    assert!(stored.posted);
    assert_eq!(stored.post_url.as_deref(), Some("https://instagram.example/p/1"));
    assert!(!repo
        .find_publish_eligible()
        .await
        .unwrap()
        .iter()
        .any(|s| s.id == submission.id));
}

#[test_context(TestHarness)]
#[tokio::test]
#[ignore = "requires docker"]
async fn delete_cascades_to_attachments_and_reviews(ctx: &TestHarness) {
    let repo = ctx.repository();
    let (submission, _) = repo.create_submission(&new_submission(), &attachments(2)).await.unwrap();
    repo.add_review(&NewReview {
        submission_id: submission.id,
        approval: true,
        reviewer_id: 1,
        reviewer_display_name: "r1".into(),
    })
    .await
    .unwrap();

    repo.delete_submission(submission.id).await.unwrap();

    assert!(repo.find_submission(submission.id).await.unwrap().is_none());
    assert!(repo.attachments_for(submission.id).await.unwrap().is_empty());
    assert!(repo.reviews_for(submission.id).await.unwrap().is_empty());
}
