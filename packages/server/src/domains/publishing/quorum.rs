//! "At least one yes, no no's."

use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::SubmissionId;
use crate::domains::submissions::models::{Review, Submission};
use crate::kernel::BaseSubmissionRepository;

/// The eligibility predicate for one submission's current reviews.
pub fn satisfies_quorum(posted: bool, reviews: &[Review]) -> bool {
    !posted && reviews.iter().any(|r| r.approval) && !reviews.iter().any(|r| !r.approval)
}

/// Set-wise eligibility over all submissions and all reviews in one pass.
///
/// Returns eligible submissions in the order given.
pub fn fold_eligible(submissions: Vec<Submission>, reviews: &[Review]) -> Vec<Submission> {
    #[derive(Default)]
    struct Tally {
        approvals: usize,
        rejections: usize,
    }

    let mut tallies: HashMap<SubmissionId, Tally> = HashMap::new();
    for review in reviews {
        let tally = tallies.entry(review.submission_id).or_default();
        if review.approval {
            tally.approvals += 1;
        } else {
            tally.rejections += 1;
        }
    }

    submissions
        .into_iter()
        .filter(|s| !s.posted)
        .filter(|s| {
            tallies
                .get(&s.id)
                .is_some_and(|t| t.approvals > 0 && t.rejections == 0)
        })
        .collect()
}

/// Read-side quorum check. Holds no state; every call reads the repository.
#[derive(Clone)]
pub struct QuorumEvaluator {
    repository: Arc<dyn BaseSubmissionRepository>,
}

impl QuorumEvaluator {
    pub fn new(repository: Arc<dyn BaseSubmissionRepository>) -> Self {
        Self { repository }
    }

    pub async fn eligible(&self) -> Result<Vec<Submission>> {
        self.repository.find_publish_eligible().await
    }

    pub async fn is_eligible(&self, id: SubmissionId) -> Result<bool> {
        let Some(submission) = self.repository.find_submission(id).await? else {
            return Ok(false);
        };
        let reviews = self.repository.reviews_for(id).await?;
        Ok(satisfies_quorum(submission.posted, &reviews))
    }
}
