//! Transaction orchestrator
//!
//! Runs a [`TransactionPlan`] one step at a time: every approval in order,
//! then the pool call. A step is only issued after the previous one
//! resolved successfully. The first failure ends the sequence in `Failed`;
//! approvals already mined stay on-chain and nothing is retried.
//!
//! A pool call that times out may still be mined, so it ends in
//! `Unconfirmed` instead. No new sequence starts from that state until the
//! caller has checked the chain and called
//! [`Orchestrator::acknowledge_unconfirmed`].
//!
//! Every transition is published on a watch channel.

use std::future::Future;
use std::time::Duration;

use chain_client::{PoolContract, TokenApprover};
use ironbank_core::{AppConfig, ChainError, TxError, TxHash};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::tx_builder::{PoolCall, TransactionPlan};

/// Sequence state machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SequenceState {
    Idle,
    /// Waiting for approval `step` (1-based) of `of`
    AwaitingApproval { step: usize, of: usize },
    AwaitingSubmission,
    Confirmed { tx_hash: TxHash },
    Failed { step: usize, error: String },
    /// Pool call `step` timed out after it was sent; it may still be mined
    Unconfirmed { step: usize, error: String },
    /// Dismissed before any approval was sent
    Cancelled,
}

impl SequenceState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Confirmed { .. }
                | Self::Failed { .. }
                | Self::Unconfirmed { .. }
                | Self::Cancelled
        )
    }

    pub fn is_running(&self) -> bool {
        matches!(
            self,
            Self::AwaitingApproval { .. } | Self::AwaitingSubmission
        )
    }

    /// Whether a new sequence may start from this state
    pub fn can_start(&self) -> bool {
        !self.is_running() && !matches!(self, Self::Unconfirmed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingApproval { .. } => "awaiting_approval",
            Self::AwaitingSubmission => "awaiting_submission",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed { .. } => "failed",
            Self::Unconfirmed { .. } => "unconfirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Hashes of a completed sequence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceOutcome {
    pub approval_hashes: Vec<TxHash>,
    pub tx_hash: TxHash,
}

/// Executes transaction plans against the approval and pool primitives
#[derive(Debug)]
pub struct Orchestrator {
    step_timeout: Duration,
    state_tx: watch::Sender<SequenceState>,
}

impl Orchestrator {
    pub fn new(step_timeout: Duration) -> Self {
        let (state_tx, _) = watch::channel(SequenceState::Idle);
        Self {
            step_timeout,
            state_tx,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(Duration::from_secs(config.step_timeout_secs))
    }

    pub fn state(&self) -> SequenceState {
        self.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SequenceState> {
        self.state_tx.subscribe()
    }

    pub(crate) fn publish(&self, state: SequenceState) {
        tracing::info!(state = state.name(), "Sequence transition");
        self.state_tx.send_replace(state);
    }

    fn fail(&self, step: usize, error: TxError) -> TxError {
        tracing::warn!(step, "Sequence failed: {}", error);
        self.publish(SequenceState::Failed {
            step,
            error: error.to_string(),
        });
        error
    }

    /// Clear an `Unconfirmed` outcome once the pool call's fate is known.
    /// Returns whether there was one to clear.
    pub fn acknowledge_unconfirmed(&self) -> bool {
        let cleared = self.state_tx.send_if_modified(|state| {
            if matches!(state, SequenceState::Unconfirmed { .. }) {
                *state = SequenceState::Idle;
                true
            } else {
                false
            }
        });
        if cleared {
            tracing::info!("Unconfirmed pool call acknowledged");
        }
        cleared
    }

    async fn bounded<T>(
        &self,
        what: &str,
        fut: impl Future<Output = chain_client::Result<T>>,
    ) -> chain_client::Result<T> {
        tokio::time::timeout(self.step_timeout, fut)
            .await
            .map_err(|_| ChainError::Timeout {
                what: format!("{} after {:?}", what, self.step_timeout),
            })?
    }

    /// Run `plan` to completion or to its first failure
    pub async fn execute(
        &self,
        plan: &TransactionPlan,
        approver: &dyn TokenApprover,
        pool: &dyn PoolContract,
    ) -> Result<SequenceOutcome, TxError> {
        let current = self.state();
        if !current.can_start() {
            return Err(TxError::InvalidState {
                state: current.name().to_string(),
            });
        }

        let of = plan.steps.len();
        let mut approval_hashes = Vec::with_capacity(of);

        for (index, step) in plan.steps.iter().enumerate() {
            let number = index + 1;
            self.publish(SequenceState::AwaitingApproval { step: number, of });
            tracing::info!(
                step = number,
                token = %step.token_symbol,
                amount = %step.amount,
                "Requesting approval"
            );

            let result = self
                .bounded(
                    &format!("approval of {}", step.token_symbol),
                    approver.approve(&step.token, &step.spender, step.amount),
                )
                .await;

            match result {
                Ok(hash) => approval_hashes.push(hash),
                Err(ChainError::Rejected { reason }) => {
                    return Err(self.fail(
                        number,
                        TxError::ApprovalRejected {
                            step: number,
                            token: step.token_symbol.clone(),
                            reason,
                        },
                    ));
                }
                Err(e) => {
                    return Err(self.fail(
                        number,
                        TxError::ApprovalFailed {
                            step: number,
                            token: step.token_symbol.clone(),
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }

        self.publish(SequenceState::AwaitingSubmission);
        tracing::info!(call = plan.call.method(), "Submitting pool call");

        let submitted = match plan.call {
            PoolCall::Mint {
                collateral_amount,
                share_amount,
                min_output_amount,
            } => {
                self.bounded(
                    "pool mint",
                    pool.mint(collateral_amount, share_amount, min_output_amount),
                )
                .await
            }
            PoolCall::Redeem {
                dollar_amount,
                min_share_amount,
                min_collateral_amount,
            } => {
                self.bounded(
                    "pool redeem",
                    pool.redeem(dollar_amount, min_share_amount, min_collateral_amount),
                )
                .await
            }
        };

        let step = plan.total_steps();
        let call = plan.call.method().to_string();
        let tx_hash = match submitted {
            Ok(hash) => hash,
            Err(e @ ChainError::Timeout { .. }) => {
                let error = TxError::SubmissionUnconfirmed {
                    call,
                    reason: e.to_string(),
                };
                tracing::warn!(step, "Pool call outcome unknown: {}", error);
                self.publish(SequenceState::Unconfirmed {
                    step,
                    error: error.to_string(),
                });
                return Err(error);
            }
            Err(e) => {
                return Err(self.fail(
                    step,
                    TxError::SubmissionFailed {
                        call,
                        reason: e.to_string(),
                    },
                ));
            }
        };

        self.publish(SequenceState::Confirmed {
            tx_hash: tx_hash.clone(),
        });

        Ok(SequenceOutcome {
            approval_hashes,
            tx_hash,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use ironbank_core::{Address, Amount, Ppm, TokenAddresses};

    use super::*;
    use crate::calculator::{MintMode, MintQuote, RedeemQuote};
    use crate::tx_builder::{build_mint_plan, build_redeem_plan};

    /// Records every call; fails approval number `fail_at` with `error`
    #[derive(Default)]
    pub(crate) struct FakeChain {
        pub calls: Mutex<Vec<String>>,
        pub fail_at: Option<(usize, ChainError)>,
        pub fail_submit: Option<ChainError>,
        pub delay: Option<Duration>,
        pub submit_delay: Option<Duration>,
    }

    impl FakeChain {
        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: String) -> usize {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.len()
        }
    }

    #[async_trait]
    impl TokenApprover for FakeChain {
        async fn approve(
            &self,
            _token: &Address,
            _spender: &Address,
            amount: Amount,
        ) -> chain_client::Result<TxHash> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let n = self.record(format!("approve {}", amount.raw()));
            match &self.fail_at {
                Some((step, error)) if *step == n => Err(error.clone()),
                _ => Ok(TxHash::new(format!("0xapprove{}", n))),
            }
        }
    }

    #[async_trait]
    impl PoolContract for FakeChain {
        async fn mint(
            &self,
            collateral_amount: Amount,
            share_amount: Amount,
            min_output_amount: Amount,
        ) -> chain_client::Result<TxHash> {
            // Counted as broadcast before the receipt wait
            self.record(format!(
                "mint {} {} {}",
                collateral_amount.raw(),
                share_amount.raw(),
                min_output_amount.raw()
            ));
            if let Some(delay) = self.submit_delay {
                tokio::time::sleep(delay).await;
            }
            match &self.fail_submit {
                Some(e) => Err(e.clone()),
                None => Ok(TxHash::new("0xmint")),
            }
        }

        async fn redeem(
            &self,
            dollar_amount: Amount,
            min_share_amount: Amount,
            min_collateral_amount: Amount,
        ) -> chain_client::Result<TxHash> {
            self.record(format!(
                "redeem {} {} {}",
                dollar_amount.raw(),
                min_share_amount.raw(),
                min_collateral_amount.raw()
            ));
            match &self.fail_submit {
                Some(e) => Err(e.clone()),
                None => Ok(TxHash::new("0xredeem")),
            }
        }
    }

    pub(crate) fn mint_plan() -> TransactionPlan {
        let quote = MintQuote {
            mode: MintMode::Standard,
            collateral_amount: Amount::from_raw(900_000_000),
            share_amount: Amount::from_raw(50_000_000),
            min_output_amount: Amount::from_raw(1_000_000_000),
        };
        build_mint_plan(&quote, &TokenAddresses::polygon(), Ppm::new(1_000), None)
    }

    fn redeem_plan() -> TransactionPlan {
        let quote = RedeemQuote {
            dollar_amount: Amount::from_raw(100_000_000),
            min_collateral_amount: Amount::from_raw(90_000_000),
            min_share_amount: Amount::from_raw(5_000_000),
        };
        build_redeem_plan(&quote, &TokenAddresses::polygon(), Ppm::new(1_000), None)
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_mint_sequence_confirms() {
        let chain = FakeChain::default();
        let orch = orchestrator();

        let outcome = orch.execute(&mint_plan(), &chain, &chain).await.unwrap();

        assert_eq!(
            chain.calls(),
            vec![
                "approve 900000000",
                "approve 50000000",
                "mint 900000000 50000000 1000000000"
            ]
        );
        assert_eq!(outcome.approval_hashes.len(), 2);
        assert_eq!(outcome.tx_hash, TxHash::new("0xmint"));
        assert_eq!(
            orch.state(),
            SequenceState::Confirmed {
                tx_hash: TxHash::new("0xmint")
            }
        );
    }

    #[tokio::test]
    async fn test_redeem_sequence_calls_redeem() {
        let chain = FakeChain::default();
        let orch = orchestrator();

        orch.execute(&redeem_plan(), &chain, &chain).await.unwrap();

        assert_eq!(
            chain.calls(),
            vec!["approve 100000000", "redeem 100000000 5000000 90000000"]
        );
    }

    #[tokio::test]
    async fn test_first_approval_failure_stops_sequence() {
        let chain = FakeChain {
            fail_at: Some((
                1,
                ChainError::Reverted {
                    reason: "out of gas".to_string(),
                },
            )),
            ..FakeChain::default()
        };
        let orch = orchestrator();

        let err = orch.execute(&mint_plan(), &chain, &chain).await.unwrap_err();

        assert!(matches!(err, TxError::ApprovalFailed { step: 1, .. }));
        assert_eq!(chain.calls(), vec!["approve 900000000"]);
        assert!(matches!(orch.state(), SequenceState::Failed { step: 1, .. }));
    }

    #[tokio::test]
    async fn test_rejected_second_approval() {
        let chain = FakeChain {
            fail_at: Some((
                2,
                ChainError::Rejected {
                    reason: "user denied".to_string(),
                },
            )),
            ..FakeChain::default()
        };
        let orch = orchestrator();

        let err = orch.execute(&mint_plan(), &chain, &chain).await.unwrap_err();

        assert!(matches!(
            err,
            TxError::ApprovalRejected { step: 2, ref token, .. } if token == "TITAN"
        ));
        assert_eq!(chain.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_submission_failure_keeps_approvals() {
        let chain = FakeChain {
            fail_submit: Some(ChainError::Reverted {
                reason: "slippage".to_string(),
            }),
            ..FakeChain::default()
        };
        let orch = orchestrator();

        let err = orch.execute(&redeem_plan(), &chain, &chain).await.unwrap_err();

        assert!(matches!(err, TxError::SubmissionFailed { ref call, .. } if call == "redeem"));
        assert_eq!(err.step(), None);
        assert!(matches!(orch.state(), SequenceState::Failed { step: 2, .. }));
        assert_eq!(chain.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_step_timeout() {
        let chain = FakeChain {
            delay: Some(Duration::from_millis(200)),
            ..FakeChain::default()
        };
        let orch = Orchestrator::new(Duration::from_millis(10));

        let err = orch.execute(&mint_plan(), &chain, &chain).await.unwrap_err();

        assert!(matches!(
            err,
            TxError::ApprovalFailed { step: 1, ref reason, .. }
                if reason.starts_with("Timed out") && reason.ends_with("after 10ms")
        ));
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn test_pool_call_timeout_is_unconfirmed() {
        let chain = FakeChain {
            submit_delay: Some(Duration::from_millis(200)),
            ..FakeChain::default()
        };
        let orch = Orchestrator::new(Duration::from_millis(20));

        let err = orch.execute(&mint_plan(), &chain, &chain).await.unwrap_err();

        assert!(matches!(
            err,
            TxError::SubmissionUnconfirmed { ref call, ref reason }
                if call == "mint" && reason.ends_with("after 20ms")
        ));
        assert!(matches!(orch.state(), SequenceState::Unconfirmed { step: 3, .. }));
        assert!(orch.state().is_terminal());

        // A restart must not send a second mint
        let retry = orch.execute(&mint_plan(), &FakeChain::default(), &chain).await;
        assert!(matches!(retry, Err(TxError::InvalidState { ref state }) if state == "unconfirmed"));
        assert_eq!(chain.calls().iter().filter(|c| c.starts_with("mint")).count(), 1);

        assert!(orch.acknowledge_unconfirmed());
        assert!(!orch.acknowledge_unconfirmed());
        assert_eq!(orch.state(), SequenceState::Idle);
    }

    #[tokio::test]
    async fn test_execute_refused_while_running() {
        let chain = FakeChain::default();
        let orch = orchestrator();
        orch.publish(SequenceState::AwaitingSubmission);

        let err = orch.execute(&mint_plan(), &chain, &chain).await.unwrap_err();

        assert!(matches!(err, TxError::InvalidState { ref state } if state == "awaiting_submission"));
        assert!(chain.calls().is_empty());
    }

    #[tokio::test]
    async fn test_subscriber_sees_terminal_state() {
        let chain = FakeChain::default();
        let orch = orchestrator();
        let mut rx = orch.subscribe();
        assert_eq!(*rx.borrow_and_update(), SequenceState::Idle);

        orch.execute(&redeem_plan(), &chain, &chain).await.unwrap();

        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_terminal());
    }
}
