//! Publishing approved submissions to the external social platform.
//!
//! ```text
//! scheduler / publish-now command
//!     │
//!     └─► PublishCoordinator::run_sweep
//!             ├─► login (fails closed)
//!             └─► for each quorum-eligible submission → publish_one
//!                     ├─► re-check posted
//!                     ├─► PublishStrategy::select → photo | video | album
//!                     ├─► normalize images (album only)
//!                     └─► mark_posted, then success notice
//! ```

pub mod coordinator;
pub mod errors;
pub mod normalize;
pub mod quorum;
pub mod strategy;

pub use coordinator::{PublishCoordinator, SweepOutcome, SweepRecord, SweepReport, SweepTrigger};
pub use errors::PublishError;
pub use quorum::{fold_eligible, satisfies_quorum, QuorumEvaluator};
pub use strategy::PublishStrategy;
