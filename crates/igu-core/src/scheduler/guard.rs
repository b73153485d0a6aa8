//! RAII guard that reports round completion to the scheduler when dropped.

use tokio::sync::mpsc::UnboundedSender;

use crate::interest_group::Origin;

use super::actor::Command;
use super::round::RoundReport;

/// Tells the actor a round is over, even if the round task panics.
pub(super) struct RoundCompletion {
    pub(super) tx: UnboundedSender<Command>,
    pub(super) owner: Origin,
    pub(super) report: Option<RoundReport>,
}

impl RoundCompletion {
    pub(super) fn new(tx: UnboundedSender<Command>, owner: Origin) -> Self {
        Self {
            tx,
            owner,
            report: None,
        }
    }

    pub(super) fn finish(mut self, report: RoundReport) {
        self.report = Some(report);
    }
}

impl Drop for RoundCompletion {
    fn drop(&mut self) {
        let report = self
            .report
            .take()
            .unwrap_or_else(|| RoundReport::empty(self.owner.clone()));
        let _ = self.tx.send(Command::RoundFinished(report));
    }
}
