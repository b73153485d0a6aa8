//! Global admission control: one active round, a deduplicated FIFO of
//! pending owners, and age-based dropping of stale requests.
//!
//! Pure state; the actor drives it and owns the only instance.

use std::collections::VecDeque;
use std::time::{Duration, SystemTime};

use crate::interest_group::Origin;

/// A request to run one round for `owner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRequest {
    pub owner: Origin,
    pub enqueued_at: SystemTime,
}

/// What happened to a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admit {
    /// The scheduler was idle; start this round now.
    Start(RoundRequest),
    /// Appended to the pending queue.
    Queued,
    /// The owner is already active or queued; nothing to do.
    Coalesced,
}

/// Result of finishing the active round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Advance {
    /// Round to start next, if any survived.
    pub next: Option<RoundRequest>,
    /// Requests dropped for being older than the max round duration.
    pub dropped: Vec<RoundRequest>,
}

#[derive(Debug, Clone)]
pub struct AdmissionQueue {
    active: Option<RoundRequest>,
    pending: VecDeque<RoundRequest>,
    max_round_duration: Duration,
}

impl AdmissionQueue {
    pub fn new(max_round_duration: Duration) -> Self {
        Self {
            active: None,
            pending: VecDeque::new(),
            max_round_duration,
        }
    }

    pub fn request(&mut self, owner: Origin, now: SystemTime) -> Admit {
        let mut outstanding = self.active.iter().chain(self.pending.iter());
        if outstanding.any(|r| r.owner == owner) {
            return Admit::Coalesced;
        }
        let req = RoundRequest {
            owner,
            enqueued_at: now,
        };
        if self.active.is_none() {
            self.active = Some(req.clone());
            Admit::Start(req)
        } else {
            self.pending.push_back(req);
            Admit::Queued
        }
    }

    /// The active round finished at `now`: pop the queue, dropping stale
    /// requests, and make the survivor (if any) active.
    pub fn complete(&mut self, now: SystemTime) -> Advance {
        self.active = None;
        let mut advance = Advance::default();
        while let Some(req) = self.pending.pop_front() {
            if self.is_stale(&req, now) {
                advance.dropped.push(req);
                continue;
            }
            self.active = Some(req.clone());
            advance.next = Some(req);
            break;
        }
        advance
    }

    fn is_stale(&self, req: &RoundRequest, now: SystemTime) -> bool {
        now.duration_since(req.enqueued_at)
            .is_ok_and(|age| age > self.max_round_duration)
    }

    pub fn active(&self) -> Option<&Origin> {
        self.active.as_ref().map(|r| &r.owner)
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_owners(&self) -> impl Iterator<Item = &Origin> {
        self.pending.iter().map(|r| &r.owner)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }
}
