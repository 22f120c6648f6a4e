//! Per-target single-flight registry
//!
//! A mutating operation registers its target before the request is sent and the
//! returned guard releases it on drop, whatever the outcome. While a target is
//! registered, any other mutating operation on it fails fast with
//! [`ClientError::Busy`].

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::models::PostId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OpTarget {
    /// The feed's compose box; at most one create at a time
    Compose,
    Post(PostId),
    /// Comment submission on a post, independent of the post's own slot
    CommentOn(PostId),
    User(String),
}

impl fmt::Display for OpTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpTarget::Compose => write!(f, "new post"),
            OpTarget::Post(id) => write!(f, "post {}", id),
            OpTarget::CommentOn(id) => write!(f, "comments on post {}", id),
            OpTarget::User(username) => write!(f, "user {}", username),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Edit,
    Delete,
    Like,
    Save,
    Share,
    Comment,
    Follow,
    Unfollow,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Edit => "edit",
            Operation::Delete => "delete",
            Operation::Like => "like",
            Operation::Save => "save",
            Operation::Share => "share",
            Operation::Comment => "comment",
            Operation::Follow => "follow",
            Operation::Unfollow => "unfollow",
        };
        f.write_str(name)
    }
}

/// `map_err` hook that logs a failed operation and passes the error on
pub(crate) fn failed(op: Operation, target: OpTarget) -> impl Fn(ClientError) -> ClientError {
    move |e| {
        match &e {
            ClientError::Cancelled => debug!(%op, %target, "Operation cancelled"),
            _ => warn!(%op, %target, error = %e, "Operation failed"),
        }
        e
    }
}

#[derive(Debug, Default)]
pub struct InFlight {
    active: Mutex<HashMap<OpTarget, Operation>>,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_begin(&self, target: OpTarget, op: Operation) -> Result<InFlightGuard<'_>> {
        let mut active = self.active.lock();
        if let Some(current) = active.get(&target) {
            return Err(ClientError::Busy(format!(
                "{} ({} still submitting)",
                target, current
            )));
        }
        active.insert(target.clone(), op);
        Ok(InFlightGuard {
            registry: self,
            target,
        })
    }

    pub fn current(&self, target: &OpTarget) -> Option<Operation> {
        self.active.lock().get(target).copied()
    }

    pub fn is_active(&self, target: &OpTarget) -> bool {
        self.active.lock().contains_key(target)
    }
}

/// Releases its target when dropped
#[must_use]
pub struct InFlightGuard<'a> {
    registry: &'a InFlight,
    target: OpTarget,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.registry.active.lock().remove(&self.target);
    }
}
