//! Job-detail poll loop state.
//!
//! The loop itself is driven from outside: `update` asks this state whether a
//! fetch should be issued, and after each fetched snapshot whether another
//! cycle should be scheduled. Stopping is cooperative. A fetch already in
//! flight when the loop is stopped still lands and renders, but is not
//! rescheduled.

use std::collections::BTreeMap;
use std::time::Duration;

use syncwatch_logging::{watch_debug, watch_warn};

use crate::{JobSnapshot, MailboxId, MailboxStatus};

/// How a successful retry keeps a loop alive that would otherwise stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryResumePolicy {
    /// Continue for exactly one more cycle after the retry is acknowledged.
    #[default]
    OneShot,
    /// Keep polling while a retried mailbox is still reported `failed`, for at
    /// most `max_cycles` extra cycles per retried mailbox.
    UntilObserved { max_cycles: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSettings {
    pub interval: Duration,
    pub retry_resume: RetryResumePolicy,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            retry_resume: RetryResumePolicy::OneShot,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started { epoch: u64 },
    /// A loop is already running and nobody asked it to keep going.
    AlreadyActive,
    /// A loop is running with a pending force-continue; it will honour it.
    Resumed,
    /// The loop was stopped while its fetch was still outstanding. It is live
    /// again under the same epoch and that fetch's answer decides what follows.
    Reattached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleDecision {
    Continue,
    Stop,
}

/// Per job-detail view polling state.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollState {
    active: bool,
    force_continue: bool,
    epoch: u64,
    in_flight: bool,
    /// Retried mailboxes not yet seen leaving `failed`, with remaining cycles.
    awaiting: BTreeMap<MailboxId, u32>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh state whose epochs continue after `floor`, so answers and
    /// timers from a previous view can never match the new one.
    pub fn after_epoch(floor: u64) -> Self {
        Self {
            epoch: floor,
            ..Self::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn force_continue(&self) -> bool {
        self.force_continue
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn awaiting(&self) -> impl Iterator<Item = MailboxId> + '_ {
        self.awaiting.keys().copied()
    }

    /// Starts a loop unless one is already active. Starting consumes any
    /// pending force-continue: the first fetch of the new loop is the extra
    /// cycle the flag asked for.
    pub fn start(&mut self) -> StartOutcome {
        if self.active {
            if self.force_continue {
                return StartOutcome::Resumed;
            }
            return StartOutcome::AlreadyActive;
        }
        if self.in_flight {
            self.active = true;
            return StartOutcome::Reattached;
        }
        self.active = true;
        self.force_continue = false;
        self.in_flight = true;
        self.epoch += 1;
        StartOutcome::Started { epoch: self.epoch }
    }

    /// Requests a stop. Takes effect at the next decision point.
    pub fn stop(&mut self) {
        self.active = false;
        self.force_continue = false;
        self.awaiting.clear();
    }

    /// Returns true when a fetch for `epoch` should be issued now.
    pub fn begin_cycle(&mut self, epoch: u64) -> bool {
        if !self.active || epoch != self.epoch || self.in_flight {
            return false;
        }
        self.in_flight = true;
        true
    }

    /// Returns false for results belonging to a superseded loop.
    pub fn accepts(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    pub fn request_force_continue(&mut self) {
        self.force_continue = true;
    }

    pub fn await_mailbox(&mut self, policy: RetryResumePolicy, mailbox_id: MailboxId) {
        if let RetryResumePolicy::UntilObserved { max_cycles } = policy {
            self.awaiting.insert(mailbox_id, max_cycles);
        }
    }

    /// Decides whether to schedule another cycle after a snapshot landed.
    pub fn on_snapshot(&mut self, snapshot: &JobSnapshot) -> CycleDecision {
        self.in_flight = false;
        if !self.active {
            watch_debug!("poll: snapshot landed after stop; not rescheduling");
            return CycleDecision::Stop;
        }

        self.observe_awaited(snapshot);

        let keep_going =
            snapshot.status.is_active() || self.force_continue || !self.awaiting.is_empty();
        if keep_going {
            self.force_continue = false;
            CycleDecision::Continue
        } else {
            self.active = false;
            CycleDecision::Stop
        }
    }

    /// Fetch failures are terminal for the loop; there is no automatic retry.
    pub fn on_failure(&mut self) {
        self.in_flight = false;
        self.active = false;
        self.force_continue = false;
        self.awaiting.clear();
    }

    fn observe_awaited(&mut self, snapshot: &JobSnapshot) {
        self.awaiting.retain(|id, remaining| {
            let still_failed = snapshot
                .mailbox(*id)
                .is_some_and(|mb| mb.status == MailboxStatus::Failed);
            if !still_failed {
                watch_debug!("poll: retried mailbox {} observed leaving failed", id);
                return false;
            }
            if *remaining == 0 {
                watch_warn!(
                    "poll: retried mailbox {} still failed after grace cycles; giving up",
                    id
                );
                return false;
            }
            *remaining -= 1;
            true
        });
    }
}
