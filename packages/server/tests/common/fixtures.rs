//! Event builders and helpers shared by the integration tests.

#![allow(dead_code)]

use bytes::Bytes;
use image::{ImageBuffer, ImageFormat, Rgb, Rgba};
use server_core::common::SubmissionId;
use server_core::domains::submissions::activities::{
    ingest_message, record_reaction, retract_reaction, IntakeOutcome, ReviewOutcome,
};
use server_core::domains::submissions::{IncomingMedia, MessageCreated, ReactionEvent};
use server_core::kernel::test_dependencies::TEST_CHANNEL;
use server_core::kernel::{ServerDeps, TestDependencies};
use std::io::Cursor;
use std::sync::atomic::{AtomicI64, Ordering};

pub const APPROVE: &str = "\u{2705}";
pub const REJECT: &str = "\u{274C}";

pub const AUTHOR_ID: i64 = 501;
pub const REVIEWER_A: i64 = 601;
pub const REVIEWER_B: i64 = 602;

static NEXT_ID: AtomicI64 = AtomicI64::new(1_000);

pub fn next_id() -> i64 {
    NEXT_ID.fetch_add(1, Ordering::SeqCst)
}

pub fn media(filename: &str, content_type: &str) -> IncomingMedia {
    let id = next_id();
    IncomingMedia {
        attachment_id: id,
        filename: filename.to_string(),
        content_type: Some(content_type.to_string()),
        url: format!("https://cdn.example/{}/{}", id, filename),
    }
}

pub fn message_with(content: Option<&str>, attachments: Vec<IncomingMedia>) -> MessageCreated {
    MessageCreated {
        message_id: next_id(),
        channel_id: 42,
        channel_name: TEST_CHANNEL.to_string(),
        author_id: AUTHOR_ID,
        author_display_name: "Ada".to_string(),
        content: content.map(String::from),
        attachments,
    }
}

pub fn reaction(message_id: i64, user_id: i64, emoji: &str) -> ReactionEvent {
    ReactionEvent {
        message_id,
        user_id,
        emoji: emoji.to_string(),
        user_display_name: Some(format!("Reviewer {}", user_id)),
    }
}

pub fn png_bytes() -> Bytes {
    let img = ImageBuffer::from_pixel(8, 8, Rgba([10u8, 200, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    Bytes::from(out.into_inner())
}

pub fn jpeg_bytes() -> Bytes {
    let img = ImageBuffer::from_pixel(8, 8, Rgb([10u8, 20, 230]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    Bytes::from(out.into_inner())
}

/// An accepted submission and the id of its approval prompt.
pub struct Ingested {
    pub submission_id: SubmissionId,
    pub approval_message_id: i64,
    pub origin_message_id: i64,
}

/// Ingest a message and assert it was accepted with a prompt.
pub async fn ingest(deps: &ServerDeps, message: MessageCreated) -> Ingested {
    let origin_message_id = message.message_id;
    match ingest_message(message, deps).await.unwrap() {
        IntakeOutcome::Accepted {
            submission_id,
            approval_message_id: Some(approval_message_id),
            ..
        } => Ingested {
            submission_id,
            approval_message_id,
            origin_message_id,
        },
        other => panic!("expected accepted submission, got {:?}", other),
    }
}

pub async fn approve(deps: &ServerDeps, ingested: &Ingested, reviewer: i64) -> ReviewOutcome {
    record_reaction(reaction(ingested.approval_message_id, reviewer, APPROVE), deps)
        .await
        .unwrap()
}

pub async fn reject(deps: &ServerDeps, ingested: &Ingested, reviewer: i64) -> ReviewOutcome {
    record_reaction(reaction(ingested.approval_message_id, reviewer, REJECT), deps)
        .await
        .unwrap()
}

pub async fn unreject(deps: &ServerDeps, ingested: &Ingested, reviewer: i64) -> ReviewOutcome {
    retract_reaction(reaction(ingested.approval_message_id, reviewer, REJECT), deps)
        .await
        .unwrap()
}

pub async fn unapprove(deps: &ServerDeps, ingested: &Ingested, reviewer: i64) -> ReviewOutcome {
    retract_reaction(reaction(ingested.approval_message_id, reviewer, APPROVE), deps)
        .await
        .unwrap()
}

/// Fresh doubles plus the `ServerDeps` wired to them.
pub fn test_deps() -> (TestDependencies, ServerDeps) {
    let test = TestDependencies::new();
    let deps = test.into_server_deps();
    (test, deps)
}
