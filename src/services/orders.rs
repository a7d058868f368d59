//! Order status collaborator.
//!
//! Persistence of order state is external to the payment protocol; the
//! gateway retries IPN delivery at-least-once, so any implementation must
//! make the pending -> paid/failed transition an idempotent upsert keyed by
//! transaction reference. The bundled in-memory store serializes transitions
//! through the map's per-entry lock.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ServiceError;

/// Payment lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Paid,
    Failed,
}

/// One order as the payment subsystem sees it. Amounts are VND; the wire
/// representation (x 100) never leaves the protocol boundary.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderRecord {
    /// Transaction reference, shared with the gateway as `vnp_TxnRef`
    pub txn_ref: String,
    /// Order total in VND
    pub amount: i64,
    pub state: PaymentState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pay_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payment details carried by an accepted callback.
#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub success: bool,
    pub transaction_no: Option<String>,
    pub bank_code: Option<String>,
    pub pay_date: Option<String>,
    pub response_code: String,
}

/// Result of an `apply_payment` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The order was pending; it now carries the new state
    Applied(PaymentState),
    /// A previous callback already settled the order; nothing changed
    AlreadyProcessed(PaymentState),
}

/// Seam between callback processing and order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Record a pending order awaiting payment. Re-registering the same
    /// reference with the same amount is a no-op; with a different amount it
    /// is a conflict.
    async fn register(&self, txn_ref: &str, amount: i64) -> Result<(), ServiceError>;

    async fn find(&self, txn_ref: &str) -> Result<Option<OrderRecord>, ServiceError>;

    /// Idempotent settlement: the first transition out of pending wins,
    /// replays observe `AlreadyProcessed`.
    async fn apply_payment(
        &self,
        txn_ref: &str,
        update: PaymentUpdate,
    ) -> Result<ApplyOutcome, ServiceError>;
}

/// In-memory store used by the service shell and the test suite.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: DashMap<String, OrderRecord>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn register(&self, txn_ref: &str, amount: i64) -> Result<(), ServiceError> {
        match self.orders.entry(txn_ref.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(existing) => {
                if existing.get().amount == amount {
                    Ok(())
                } else {
                    Err(ServiceError::Conflict(format!(
                        "order {} already registered with a different amount",
                        txn_ref
                    )))
                }
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                let now = Utc::now();
                slot.insert(OrderRecord {
                    txn_ref: txn_ref.to_string(),
                    amount,
                    state: PaymentState::Pending,
                    transaction_no: None,
                    bank_code: None,
                    pay_date: None,
                    response_code: None,
                    created_at: now,
                    updated_at: now,
                });
                Ok(())
            }
        }
    }

    async fn find(&self, txn_ref: &str) -> Result<Option<OrderRecord>, ServiceError> {
        Ok(self.orders.get(txn_ref).map(|entry| entry.value().clone()))
    }

    async fn apply_payment(
        &self,
        txn_ref: &str,
        update: PaymentUpdate,
    ) -> Result<ApplyOutcome, ServiceError> {
        // The entry guard holds the shard lock for the whole transition, so
        // concurrent duplicate callbacks for one order serialize here.
        let mut entry = self
            .orders
            .get_mut(txn_ref)
            .ok_or_else(|| ServiceError::NotFound(format!("order {} not found", txn_ref)))?;

        if entry.state != PaymentState::Pending {
            return Ok(ApplyOutcome::AlreadyProcessed(entry.state));
        }

        let new_state = if update.success {
            PaymentState::Paid
        } else {
            PaymentState::Failed
        };
        entry.state = new_state;
        entry.transaction_no = update.transaction_no;
        entry.bank_code = update.bank_code;
        entry.pay_date = update.pay_date;
        entry.response_code = Some(update.response_code);
        entry.updated_at = Utc::now();

        Ok(ApplyOutcome::Applied(new_state))
    }
}
