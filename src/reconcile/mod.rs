//! Payment reconciliation
//!
//! Owns the lifecycle of a single pending order's payment confirmation.
//! One [`PaymentReconciler`] exists per checkout attempt; it determines the
//! channel from the order's payment method and drives the session to exactly
//! one terminal state:
//!
//! - `cash` hands off to manual confirmation immediately (no timers),
//! - `bank_transfer` polls the transfer-matching service until a match or
//!   the payment window expires,
//! - `vnpay` is reconciled out-of-band by the return callback in [`vnpay`].
//!
//! Teardown is cooperative through a [`CancellationToken`]; dropping the
//! session cannot leak a timer because the loop owns both the ticker and the
//! deadline and ends on the first terminal transition.

pub mod summary;
pub mod vnpay;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::ReconcileConfig;
use crate::domain::aggregates::order::{Order, PaymentMethod};
use crate::domain::events::{DomainEvent, PaymentEvent};
use crate::domain::value_objects::Money;
use crate::Result;
use self::summary::{OrderSummary, RecentOrderStore};

// =============================================================================
// Collaborators
// =============================================================================

/// One transfer reported by the matching service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransferMatch {
    pub reference: String,
    pub amount: Money,
    #[serde(default)]
    pub description: Option<String>,
}

/// Order details returned by the order service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order_code: String,
    pub final_amount: Money,
}

/// Transfer-matching service, polled once per tick.
///
/// A non-empty result is a positive match. Amount and sender verification is
/// the matching service's responsibility; this crate accepts its word.
/// Callers wanting a stronger guarantee can compare
/// [`TransferMatch::amount`] against the order before acting.
#[async_trait]
pub trait TransferLookup: Send + Sync {
    async fn find_transfers(&self, order_code: &str) -> Result<Vec<TransferMatch>>;
}

/// Order service, fetched once on a VNPAY success callback.
#[async_trait]
pub trait OrderLookup: Send + Sync {
    async fn get_order_by_code(&self, order_code: &str) -> Result<OrderDetails>;
}

// =============================================================================
// States and outcomes
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconcileState {
    /// Order received, channel not yet inspected.
    Determining,
    /// Cash order awaiting manual confirmation. Terminal here; no timeout.
    CashPending,
    /// Bank transfer, polling for a match.
    Polling,
    Success,
    Expired,
    /// VNPAY order handed to the external payment page.
    Redirected,
    /// Torn down before reaching a terminal state.
    Cancelled,
}

impl ReconcileState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReconcileState::Determining | ReconcileState::Polling)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileOutcome {
    CashPending,
    Success(OrderSummary),
    Expired { order_code: String },
    Redirected,
    Cancelled,
}

impl ReconcileOutcome {
    /// The single user notification for this outcome, if it carries one.
    ///
    /// `CashPending` and `Redirected` hand off to other flows and notify
    /// there; `Cancelled` is navigation-away and stays silent.
    pub fn notification(&self) -> Option<DomainEvent> {
        match self {
            ReconcileOutcome::Success(summary) => {
                Some(DomainEvent::Payment(PaymentEvent::Confirmed {
                    order_code: summary.order_code.clone(),
                    amount: summary.final_amount,
                }))
            }
            ReconcileOutcome::Expired { order_code } => {
                Some(DomainEvent::Payment(PaymentEvent::Expired {
                    order_code: order_code.clone(),
                }))
            }
            ReconcileOutcome::CashPending
            | ReconcileOutcome::Redirected
            | ReconcileOutcome::Cancelled => None,
        }
    }
}

// =============================================================================
// Session handle
// =============================================================================

/// Observable side of a running reconciliation: current state, the shared
/// deadline the countdown must render, and the teardown token. The countdown
/// and the expiry check read the same [`Instant`], so the UI and the logic
/// cannot disagree about when the window closes.
#[derive(Clone)]
pub struct ReconcileSession {
    state: watch::Receiver<ReconcileState>,
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl ReconcileSession {
    pub fn state(&self) -> ReconcileState {
        *self.state.borrow()
    }

    /// Wait for the next state transition and return the new state.
    pub async fn changed(&mut self) -> ReconcileState {
        let _ = self.state.changed().await;
        self.state()
    }

    /// Deadline of the payment window; `None` for cash and VNPAY orders.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Tear the session down. Safe to call from any exit point; the polling
    /// loop observes the token on its next suspension point and ignores any
    /// lookup still in flight.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

// =============================================================================
// Controller
// =============================================================================

/// Payment channel with its timing resolved at construction. Only the bank
/// transfer channel carries a deadline, so the polling loop never has to
/// re-derive one.
#[derive(Clone, Copy, Debug)]
enum Channel {
    Cash,
    Vnpay,
    BankTransfer { deadline: Instant },
}

pub struct PaymentReconciler {
    order: Order,
    config: ReconcileConfig,
    transfers: Arc<dyn TransferLookup>,
    summaries: Arc<dyn RecentOrderStore>,
    cancel: CancellationToken,
    state_tx: watch::Sender<ReconcileState>,
    state_rx: watch::Receiver<ReconcileState>,
    channel: Channel,
}

impl PaymentReconciler {
    pub fn new(
        order: Order,
        config: ReconcileConfig,
        transfers: Arc<dyn TransferLookup>,
        summaries: Arc<dyn RecentOrderStore>,
    ) -> Self {
        let (state_tx, state_rx) = watch::channel(ReconcileState::Determining);
        // Fixed at construction so every consumer sees one deadline value.
        let channel = match order.payment_method {
            PaymentMethod::Cash => Channel::Cash,
            PaymentMethod::Vnpay => Channel::Vnpay,
            PaymentMethod::BankTransfer => Channel::BankTransfer {
                deadline: Instant::now() + config.payment_window,
            },
        };
        Self {
            order,
            config,
            transfers,
            summaries,
            cancel: CancellationToken::new(),
            state_tx,
            state_rx,
            channel,
        }
    }

    pub fn session(&self) -> ReconcileSession {
        ReconcileSession {
            state: self.state_rx.clone(),
            cancel: self.cancel.clone(),
            deadline: match self.channel {
                Channel::BankTransfer { deadline } => Some(deadline),
                Channel::Cash | Channel::Vnpay => None,
            },
        }
    }

    /// Drive the session to its terminal outcome. Consumes the controller:
    /// one instance, one checkout attempt, one terminal transition.
    pub async fn run(self) -> ReconcileOutcome {
        match self.channel {
            Channel::Cash => {
                self.set_state(ReconcileState::CashPending);
                tracing::info!(
                    order_code = %self.order.order_code,
                    "cash order, awaiting manual confirmation"
                );
                ReconcileOutcome::CashPending
            }
            Channel::Vnpay => {
                self.set_state(ReconcileState::Redirected);
                tracing::info!(
                    order_code = %self.order.order_code,
                    "vnpay order, reconciled by return callback"
                );
                ReconcileOutcome::Redirected
            }
            Channel::BankTransfer { deadline } => self.poll_for_transfer(deadline).await,
        }
    }

    async fn poll_for_transfer(self, deadline: Instant) -> ReconcileOutcome {
        self.set_state(ReconcileState::Polling);
        tracing::info!(
            order_code = %self.order.order_code,
            window_secs = self.config.payment_window.as_secs(),
            "polling for transfer match"
        );

        // Delay keeps ticks serialized behind a slow lookup instead of
        // bursting to catch up.
        let mut ticker = time::interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return self.finish_cancelled(),
                _ = time::sleep_until(deadline) => return self.finish_expired(),
                _ = ticker.tick() => {
                    match self.transfers.find_transfers(&self.order.order_code).await {
                        Ok(matches) if !matches.is_empty() => {
                            // The lookup may have resolved after teardown;
                            // a dead session must not transition.
                            if self.cancel.is_cancelled() {
                                return self.finish_cancelled();
                            }
                            return self.finish_success(&matches);
                        }
                        Ok(_) => {
                            tracing::debug!(
                                order_code = %self.order.order_code,
                                "no transfer match yet"
                            );
                        }
                        Err(e) => {
                            // Transient: swallowed, retried on the next tick.
                            // Never conflated with Expired or Success.
                            tracing::warn!(
                                order_code = %self.order.order_code,
                                error = %e,
                                "transfer lookup failed, retrying next tick"
                            );
                        }
                    }
                    if self.cancel.is_cancelled() {
                        return self.finish_cancelled();
                    }
                    // Wall-clock check, independent of the countdown but
                    // derived from the same deadline.
                    if Instant::now() >= deadline {
                        return self.finish_expired();
                    }
                }
            }
        }
    }

    fn finish_success(&self, matches: &[TransferMatch]) -> ReconcileOutcome {
        let summary = OrderSummary {
            order_code: self.order.order_code.clone(),
            final_amount: self.order.final_amount,
        };
        if let Err(e) = self.summaries.save(&summary) {
            tracing::warn!(error = %e, "failed to persist recent order summary");
        }
        self.set_state(ReconcileState::Success);
        tracing::info!(
            order_code = %summary.order_code,
            matched = matches.len(),
            "payment confirmed by transfer match"
        );
        ReconcileOutcome::Success(summary)
    }

    fn finish_expired(&self) -> ReconcileOutcome {
        self.set_state(ReconcileState::Expired);
        tracing::info!(
            order_code = %self.order.order_code,
            "payment window expired before a transfer match"
        );
        ReconcileOutcome::Expired {
            order_code: self.order.order_code.clone(),
        }
    }

    fn finish_cancelled(&self) -> ReconcileOutcome {
        self.set_state(ReconcileState::Cancelled);
        tracing::debug!(order_code = %self.order.order_code, "reconciliation torn down");
        ReconcileOutcome::Cancelled
    }

    fn set_state(&self, state: ReconcileState) {
        self.state_tx.send_replace(state);
    }
}
