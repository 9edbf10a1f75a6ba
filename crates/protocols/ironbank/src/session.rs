//! Single active-transaction slot
//!
//! At most one mint or redeem sequence may be pending per session. The slot
//! is taken by [`TxSession::begin`] and released when the returned
//! [`PendingConfirmation`] is dismissed, confirmed to completion, or dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chain_client::{PoolContract, TokenApprover};
use ironbank_core::{AppConfig, TxError};
use tokio::sync::watch;

use crate::orchestrator::{Orchestrator, SequenceOutcome, SequenceState};
use crate::tx_builder::TransactionPlan;

/// Releases the slot on drop
#[derive(Debug)]
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Per-user transaction session
#[derive(Debug, Clone)]
pub struct TxSession {
    active: Arc<AtomicBool>,
    orchestrator: Arc<Orchestrator>,
}

impl TxSession {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            orchestrator: Arc::new(orchestrator),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Orchestrator::from_config(config))
    }

    /// Whether a confirmation or sequence is pending
    pub fn is_busy(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SequenceState {
        self.orchestrator.state()
    }

    /// Sequence transitions, including the completion signal
    pub fn subscribe(&self) -> watch::Receiver<SequenceState> {
        self.orchestrator.subscribe()
    }

    /// See [`Orchestrator::acknowledge_unconfirmed`]
    pub fn acknowledge_unconfirmed(&self) -> bool {
        self.orchestrator.acknowledge_unconfirmed()
    }

    /// Take the slot for `plan`
    pub fn begin(&self, plan: TransactionPlan) -> Result<PendingConfirmation, TxError> {
        if self.active.swap(true, Ordering::SeqCst) {
            tracing::warn!(action = %plan.action, "Sequence already pending, refusing new one");
            return Err(TxError::SequenceInFlight);
        }
        let slot = SlotGuard(self.active.clone());

        let current = self.orchestrator.state();
        if !current.can_start() {
            tracing::warn!(
                action = %plan.action,
                state = current.name(),
                "Previous pool call unresolved, refusing new sequence"
            );
            return Err(TxError::InvalidState {
                state: current.name().to_string(),
            });
        }

        self.orchestrator.publish(SequenceState::Idle);
        tracing::info!(
            action = %plan.action,
            steps = plan.total_steps(),
            "Awaiting confirmation"
        );

        Ok(PendingConfirmation {
            plan,
            orchestrator: self.orchestrator.clone(),
            _slot: slot,
        })
    }
}

/// A plan shown to the user, not yet confirmed
#[derive(Debug)]
pub struct PendingConfirmation {
    plan: TransactionPlan,
    orchestrator: Arc<Orchestrator>,
    _slot: SlotGuard,
}

impl PendingConfirmation {
    pub fn plan(&self) -> &TransactionPlan {
        &self.plan
    }

    /// Cancel before any approval is sent
    pub fn dismiss(self) {
        tracing::info!(action = %self.plan.action, "Confirmation dismissed");
        self.orchestrator.publish(SequenceState::Cancelled);
    }

    /// Execute the frozen plan; the slot is held until it finishes
    pub async fn confirm(
        self,
        approver: &dyn TokenApprover,
        pool: &dyn PoolContract,
    ) -> Result<SequenceOutcome, TxError> {
        self.orchestrator.execute(&self.plan, approver, pool).await
    }
}
