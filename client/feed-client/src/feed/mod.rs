//! Post feeds and comment threads
//!
//! Each [`FeedStateManager`] owns one feed's post list (global, a user's profile,
//! or the viewer's saved posts). Separate screens hold separate managers and
//! keep their state independently.

mod comments;
mod inflight;
mod manager;

pub use comments::CommentThread;
pub(crate) use inflight::failed;
pub use inflight::{InFlight, InFlightGuard, OpTarget, Operation};
pub use manager::{Confirm, FeedStateManager, LikeStrategy};
