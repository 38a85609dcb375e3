// TestDependencies - mock implementations for testing
//
// Provides in-memory and recording doubles for every infrastructure trait so
// the submission and publishing domains can be exercised without Postgres,
// Discord or Instagram.

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

use super::{
    BaseChatPlatform, BaseMediaStore, BasePublisher, BaseSubmissionRepository, BotSettings,
    PublishMedia, PublishSession, ServerDeps,
};
use crate::common::{AttachmentId, ReviewId, SubmissionId};
use crate::domains::publishing::fold_eligible;
use crate::domains::submissions::models::{
    Attachment, NewAttachment, NewReview, NewSubmission, Review, Submission,
};

// =============================================================================
// In-memory Submission Repository
// =============================================================================

#[derive(Default)]
struct RepositoryState {
    submissions: Vec<Submission>,
    attachments: Vec<Attachment>,
    reviews: Vec<Review>,
}

/// Repository backed by vectors, with the same uniqueness and cascade rules
/// as the Postgres schema.
#[derive(Default)]
pub struct InMemorySubmissionRepository {
    state: Mutex<RepositoryState>,
    fail_create: Mutex<bool>,
    fail_mark_posted: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

impl InMemorySubmissionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every `create_submission` call fail with a storage error.
    pub fn failing_create(self) -> Self {
        *self.fail_create.lock().unwrap() = true;
        self
    }

    /// Make every `delete_submission` call fail with a storage error.
    pub fn failing_delete(self) -> Self {
        *self.fail_delete.lock().unwrap() = true;
        self
    }

    /// Make every `mark_posted` call fail with a storage error.
    pub fn failing_mark_posted(self) -> Self {
        *self.fail_mark_posted.lock().unwrap() = true;
        self
    }

    pub fn submissions(&self) -> Vec<Submission> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn submission(&self, id: SubmissionId) -> Option<Submission> {
        self.state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .find(|s| s.id == id)
            .cloned()
    }

    pub fn all_attachments(&self) -> Vec<Attachment> {
        self.state.lock().unwrap().attachments.clone()
    }

    pub fn all_reviews(&self) -> Vec<Review> {
        self.state.lock().unwrap().reviews.clone()
    }
}

#[async_trait]
impl BaseSubmissionRepository for InMemorySubmissionRepository {
    async fn create_submission(
        &self,
        new: &NewSubmission,
        attachments: &[NewAttachment],
    ) -> Result<(Submission, Vec<Attachment>)> {
        if *self.fail_create.lock().unwrap() {
            bail!("mock repository insert failure");
        }
        let mut state = self.state.lock().unwrap();
        if state
            .submissions
            .iter()
            .any(|s| s.origin_message_id == new.origin_message_id)
        {
            bail!(
                "duplicate key value violates unique constraint (origin_message_id = {})",
                new.origin_message_id
            );
        }

        let submission = Submission::from_new(new);
        let saved: Vec<Attachment> = attachments
            .iter()
            .enumerate()
            .map(|(position, a)| Attachment {
                id: AttachmentId::new(),
                submission_id: submission.id,
                position: position as i32,
                external_attachment_id: a.external_attachment_id,
                content_type: a.content_type.clone(),
                storage_ref: a.storage_ref.clone(),
            })
            .collect();

        state.submissions.push(submission.clone());
        state.attachments.extend(saved.iter().cloned());
        Ok((submission, saved))
    }

    async fn find_submission(&self, id: SubmissionId) -> Result<Option<Submission>> {
        Ok(self.submission(id))
    }

    async fn find_by_origin_message(&self, message_id: i64) -> Result<Option<Submission>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .find(|s| s.origin_message_id == message_id)
            .cloned())
    }

    async fn find_by_approval_message(&self, message_id: i64) -> Result<Option<Submission>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .submissions
            .iter()
            .find(|s| s.approval_message_id == Some(message_id))
            .cloned())
    }

    async fn set_approval_message(&self, id: SubmissionId, message_id: i64) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        match state
            .submissions
            .iter_mut()
            .find(|s| s.id == id && s.approval_message_id.is_none())
        {
            Some(submission) => {
                submission.approval_message_id = Some(message_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_posted(&self, id: SubmissionId, post_url: &str) -> Result<bool> {
        if *self.fail_mark_posted.lock().unwrap() {
            bail!("connection reset while marking {} posted", id);
        }
        let mut state = self.state.lock().unwrap();
        match state
            .submissions
            .iter_mut()
            .find(|s| s.id == id && !s.posted)
        {
            Some(submission) => {
                submission.posted = true;
                submission.posted_at = Some(Utc::now());
                submission.post_url = Some(post_url.to_string());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_submission(&self, id: SubmissionId) -> Result<()> {
        if *self.fail_delete.lock().unwrap() {
            bail!("mock repository delete failure");
        }
        let mut state = self.state.lock().unwrap();
        state.submissions.retain(|s| s.id != id);
        state.attachments.retain(|a| a.submission_id != id);
        state.reviews.retain(|r| r.submission_id != id);
        Ok(())
    }

    async fn attachments_for(&self, id: SubmissionId) -> Result<Vec<Attachment>> {
        let mut attachments: Vec<Attachment> = self
            .state
            .lock()
            .unwrap()
            .attachments
            .iter()
            .filter(|a| a.submission_id == id)
            .cloned()
            .collect();
        attachments.sort_by_key(|a| a.position);
        Ok(attachments)
    }

    async fn add_review(&self, new: &NewReview) -> Result<Review> {
        let mut state = self.state.lock().unwrap();
        if !state.submissions.iter().any(|s| s.id == new.submission_id) {
            bail!("foreign key violation: submission {} does not exist", new.submission_id);
        }
        let review = Review {
            id: ReviewId::new(),
            submission_id: new.submission_id,
            approval: new.approval,
            reviewer_id: new.reviewer_id,
            reviewer_display_name: new.reviewer_display_name.clone(),
            created_at: Utc::now(),
        };
        state.reviews.push(review.clone());
        Ok(review)
    }

    async fn remove_review(
        &self,
        submission_id: SubmissionId,
        reviewer_id: i64,
        approval: bool,
    ) -> Result<bool> {
        let mut state = self.state.lock().unwrap();
        let position = state.reviews.iter().position(|r| {
            r.submission_id == submission_id
                && r.reviewer_id == reviewer_id
                && r.approval == approval
        });
        match position {
            Some(index) => {
                state.reviews.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reviews_for(&self, id: SubmissionId) -> Result<Vec<Review>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .reviews
            .iter()
            .filter(|r| r.submission_id == id)
            .cloned()
            .collect())
    }

    async fn find_publish_eligible(&self) -> Result<Vec<Submission>> {
        let state = self.state.lock().unwrap();
        Ok(fold_eligible(state.submissions.clone(), &state.reviews))
    }
}

// =============================================================================
// Mock Chat Platform
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub id: i64,
    pub channel_id: i64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedReaction {
    pub channel_id: i64,
    pub message_id: i64,
    pub emoji: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedThread {
    pub id: i64,
    pub channel_id: i64,
    pub message_id: i64,
    pub name: String,
}

pub struct MockChatPlatform {
    next_id: AtomicI64,
    messages: Arc<Mutex<Vec<SentMessage>>>,
    reactions: Arc<Mutex<Vec<AddedReaction>>>,
    threads: Arc<Mutex<Vec<CreatedThread>>>,
    roles: Arc<Mutex<HashMap<i64, Vec<String>>>>,
    display_names: Arc<Mutex<HashMap<i64, String>>>,
    downloads: Arc<Mutex<Vec<String>>>,
    payloads: Arc<Mutex<HashMap<String, Bytes>>>,
    failing_downloads: Arc<Mutex<HashSet<String>>>,
    fail_threads: Arc<Mutex<bool>>,
    fail_messages: Arc<Mutex<bool>>,
}

impl MockChatPlatform {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(9_000_000),
            messages: Arc::new(Mutex::new(Vec::new())),
            reactions: Arc::new(Mutex::new(Vec::new())),
            threads: Arc::new(Mutex::new(Vec::new())),
            roles: Arc::new(Mutex::new(HashMap::new())),
            display_names: Arc::new(Mutex::new(HashMap::new())),
            downloads: Arc::new(Mutex::new(Vec::new())),
            payloads: Arc::new(Mutex::new(HashMap::new())),
            failing_downloads: Arc::new(Mutex::new(HashSet::new())),
            fail_threads: Arc::new(Mutex::new(false)),
            fail_messages: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_roles(self, user_id: i64, roles: &[&str]) -> Self {
        self.roles
            .lock()
            .unwrap()
            .insert(user_id, roles.iter().map(|r| r.to_string()).collect());
        self
    }

    pub fn with_display_name(self, user_id: i64, name: &str) -> Self {
        self.display_names
            .lock()
            .unwrap()
            .insert(user_id, name.to_string());
        self
    }

    /// Downloads of this URL return `data`. Other URLs return placeholder bytes.
    pub fn with_download(self, url: &str, data: Bytes) -> Self {
        self.payloads.lock().unwrap().insert(url.to_string(), data);
        self
    }

    /// Downloads of this URL fail.
    pub fn with_failing_download(self, url: &str) -> Self {
        self.failing_downloads
            .lock()
            .unwrap()
            .insert(url.to_string());
        self
    }

    pub fn with_failing_threads(self) -> Self {
        *self.fail_threads.lock().unwrap() = true;
        self
    }

    /// Toggle failure of every `send_message` call.
    pub fn set_messages_failing(&self, failing: bool) {
        *self.fail_messages.lock().unwrap() = failing;
    }

    pub fn messages(&self) -> Vec<SentMessage> {
        self.messages.lock().unwrap().clone()
    }

    /// Texts sent to one channel or thread, in order.
    pub fn texts_in(&self, channel_id: i64) -> Vec<String> {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.channel_id == channel_id)
            .map(|m| m.text.clone())
            .collect()
    }

    pub fn reactions(&self) -> Vec<AddedReaction> {
        self.reactions.lock().unwrap().clone()
    }

    pub fn threads(&self) -> Vec<CreatedThread> {
        self.threads.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }
}

impl Default for MockChatPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseChatPlatform for MockChatPlatform {
    async fn send_message(&self, channel_id: i64, text: &str) -> Result<i64> {
        if *self.fail_messages.lock().unwrap() {
            bail!("mock send_message failure");
        }
        let id = self.next_id();
        self.messages.lock().unwrap().push(SentMessage {
            id,
            channel_id,
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn create_thread(&self, channel_id: i64, message_id: i64, name: &str) -> Result<i64> {
        if *self.fail_threads.lock().unwrap() {
            bail!("mock create_thread failure");
        }
        let id = self.next_id();
        self.threads.lock().unwrap().push(CreatedThread {
            id,
            channel_id,
            message_id,
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn add_reaction(&self, channel_id: i64, message_id: i64, emoji: &str) -> Result<()> {
        self.reactions.lock().unwrap().push(AddedReaction {
            channel_id,
            message_id,
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn member_role_names(&self, user_id: i64) -> Result<Vec<String>> {
        Ok(self
            .roles
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn display_name(&self, user_id: i64) -> Result<String> {
        self.display_names
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown user {}", user_id))
    }

    async fn download_attachment(&self, url: &str) -> Result<Bytes> {
        self.downloads.lock().unwrap().push(url.to_string());
        if self.failing_downloads.lock().unwrap().contains(url) {
            bail!("mock download failure for {}", url);
        }
        if let Some(data) = self.payloads.lock().unwrap().get(url) {
            return Ok(data.clone());
        }
        Ok(Bytes::from(format!("bytes of {}", url)))
    }
}

// =============================================================================
// Mock Media Store
// =============================================================================

pub struct MockMediaStore {
    next: AtomicUsize,
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
    failing_names: Arc<Mutex<HashSet<String>>>,
}

impl MockMediaStore {
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
            objects: Arc::new(Mutex::new(HashMap::new())),
            failing_names: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Saving a file with this name fails.
    pub fn with_failing_file(self, file_name: &str) -> Self {
        self.failing_names
            .lock()
            .unwrap()
            .insert(file_name.to_string());
        self
    }

    /// Seed an object directly.
    pub fn insert(&self, storage_ref: &str, data: Bytes) {
        self.objects
            .lock()
            .unwrap()
            .insert(storage_ref.to_string(), data);
    }

    pub fn stored_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        refs.sort();
        refs
    }

    pub fn get(&self, storage_ref: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(storage_ref).cloned()
    }
}

impl Default for MockMediaStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMediaStore for MockMediaStore {
    async fn save(&self, file_name: &str, data: Bytes) -> Result<String> {
        if self.failing_names.lock().unwrap().contains(file_name) {
            bail!("mock media store failure for {}", file_name);
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let storage_ref = format!("mock-{}/{}", n, file_name);
        self.insert(&storage_ref, data);
        Ok(storage_ref)
    }

    async fn read(&self, storage_ref: &str) -> Result<Bytes> {
        self.get(storage_ref)
            .ok_or_else(|| anyhow!("no object at {}", storage_ref))
    }

    async fn save_derived(&self, source_ref: &str, extension: &str, data: Bytes) -> Result<String> {
        let stem = source_ref
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(source_ref);
        let derived = format!("{}.{}", stem, extension);
        self.insert(&derived, data);
        Ok(derived)
    }

    async fn delete(&self, storage_ref: &str) -> Result<()> {
        self.objects.lock().unwrap().remove(storage_ref);
        Ok(())
    }
}

// =============================================================================
// Mock Publisher
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishCall {
    Photo { media: PublishMedia, caption: String },
    Video { media: PublishMedia, caption: String },
    Album { media: Vec<PublishMedia>, caption: String },
}

impl PublishCall {
    pub fn caption(&self) -> &str {
        match self {
            PublishCall::Photo { caption, .. }
            | PublishCall::Video { caption, .. }
            | PublishCall::Album { caption, .. } => caption,
        }
    }
}

#[derive(Default)]
struct PublisherState {
    logins: usize,
    calls: Vec<PublishCall>,
    fail_login: bool,
    failing_captions: Vec<String>,
}

pub struct MockPublisher {
    state: Arc<Mutex<PublisherState>>,
    login_gate: Option<Arc<Semaphore>>,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(PublisherState::default())),
            login_gate: None,
        }
    }

    pub fn failing_login(self) -> Self {
        self.state.lock().unwrap().fail_login = true;
        self
    }

    /// Uploads whose caption contains `fragment` fail.
    pub fn failing_uploads_containing(self, fragment: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_captions
            .push(fragment.to_string());
        self
    }

    /// `login` waits for a permit on the returned semaphore.
    pub fn with_login_gate(mut self) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        self.login_gate = Some(gate.clone());
        (self, gate)
    }

    pub fn login_count(&self) -> usize {
        self.state.lock().unwrap().logins
    }

    pub fn calls(&self) -> Vec<PublishCall> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePublisher for MockPublisher {
    async fn login(&self) -> Result<Box<dyn PublishSession>> {
        if let Some(gate) = &self.login_gate {
            gate.acquire().await?.forget();
        }
        let mut state = self.state.lock().unwrap();
        state.logins += 1;
        if state.fail_login {
            bail!("invalid credentials");
        }
        Ok(Box::new(MockPublishSession {
            state: self.state.clone(),
        }))
    }
}

struct MockPublishSession {
    state: Arc<Mutex<PublisherState>>,
}

impl MockPublishSession {
    fn record(&self, call: PublishCall) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state
            .failing_captions
            .iter()
            .any(|f| call.caption().contains(f.as_str()))
        {
            bail!("upload rejected by platform");
        }
        state.calls.push(call);
        Ok(format!("https://instagram.example/p/{}", state.calls.len()))
    }
}

#[async_trait]
impl PublishSession for MockPublishSession {
    async fn publish_photo(&self, media: &PublishMedia, caption: &str) -> Result<String> {
        self.record(PublishCall::Photo {
            media: media.clone(),
            caption: caption.to_string(),
        })
    }

    async fn publish_video(&self, media: &PublishMedia, caption: &str) -> Result<String> {
        self.record(PublishCall::Video {
            media: media.clone(),
            caption: caption.to_string(),
        })
    }

    async fn publish_album(&self, media: &[PublishMedia], caption: &str) -> Result<String> {
        self.record(PublishCall::Album {
            media: media.to_vec(),
            caption: caption.to_string(),
        })
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

pub const TEST_BOT_USER_ID: i64 = 999;
pub const TEST_APPROVER_ROLE: &str = "Social Media Approver";
pub const TEST_CHANNEL: &str = "social-media";

#[derive(Clone)]
pub struct TestDependencies {
    pub repository: Arc<InMemorySubmissionRepository>,
    pub chat: Arc<MockChatPlatform>,
    pub media_store: Arc<MockMediaStore>,
    pub publisher: Arc<MockPublisher>,
    pub settings: BotSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            repository: Arc::new(InMemorySubmissionRepository::new()),
            chat: Arc::new(MockChatPlatform::new()),
            media_store: Arc::new(MockMediaStore::new()),
            publisher: Arc::new(MockPublisher::new()),
            settings: BotSettings {
                bot_user_id: TEST_BOT_USER_ID,
                allowed_channels: vec![TEST_CHANNEL.to_string()],
                approver_role: TEST_APPROVER_ROLE.to_string(),
                command_prefix: "/".to_string(),
            },
        }
    }

    pub fn mock_repository(mut self, repository: InMemorySubmissionRepository) -> Self {
        self.repository = Arc::new(repository);
        self
    }

    pub fn mock_chat(mut self, chat: MockChatPlatform) -> Self {
        self.chat = Arc::new(chat);
        self
    }

    pub fn mock_media_store(mut self, media_store: MockMediaStore) -> Self {
        self.media_store = Arc::new(media_store);
        self
    }

    pub fn mock_publisher(mut self, publisher: MockPublisher) -> Self {
        self.publisher = Arc::new(publisher);
        self
    }

    /// Build `ServerDeps` sharing the same doubles, so assertions can still
    /// read them afterwards.
    pub fn into_server_deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.repository.clone(),
            self.media_store.clone(),
            self.chat.clone(),
            self.publisher.clone(),
            self.settings.clone(),
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
