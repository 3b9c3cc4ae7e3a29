/// Payment ledger
///
/// Every operation that moves money between balances lives here. Each one
/// runs in a single database transaction and locks the rows it reads before
/// deciding, so concurrent requests against the same balance serialize on
/// the row lock instead of overdrawing it.
///
/// # Flows
///
/// ```text
/// transfer:          sender -amount  → Transfer/Pending (net, commission) → task executing
/// accept_done_offer: Transfer Pending → Completed → task done → chat paid → receiver +net
/// settle_invoice:    Debit Pending → Completed → user +amount/100   (provider webhook)
/// ```
///
/// # Example
///
/// ```no_run
/// use rust_decimal::Decimal;
/// use taskhub_shared::ledger::Ledger;
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = Ledger::new(pool, Decimal::new(10, 2));
///
/// // Client 1 pays executor 2 for task 7
/// let txn = ledger.transfer(2, 1, 7, Decimal::new(10000, 2)).await?;
/// assert_eq!(txn.amount, Decimal::new(9000, 2));
///
/// // Client accepts the result, executor gets paid
/// ledger.accept_done_offer(txn.transaction_id, 7, 2).await?;
/// # Ok(())
/// # }
/// ```

use crate::models::balance::{Balance, BalanceAction};
use crate::models::chat::Chat;
use crate::models::task::{Task, TaskStatus};
use crate::models::transaction::{
    CreateTransaction, Transaction, TransactionStatus, TransactionType,
};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

/// Payment errors
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Balance not found for user {0}")]
    BalanceNotFound(i64),

    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds { available: Decimal, requested: Decimal },

    #[error("Transaction {0} not found")]
    TransactionNotFound(i32),

    #[error("Task {0} not found")]
    TaskNotFound(i32),

    #[error("Transaction is already {0:?}")]
    AlreadySettled(TransactionStatus),

    #[error("Amount must be positive with at most two decimal places")]
    InvalidAmount,
}

/// Notification body sent by the acquiring provider.
///
/// Only the fields the ledger needs; the rest of the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    pub invoice_id: String,
    pub status: String,

    /// Minor currency units (kopiyky). Only `success` needs it.
    #[serde(default)]
    pub amount: i64,
}

/// Result of applying a provider notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// Invoice completed, user credited; carries the new balance
    Credited(Decimal),

    /// Invoice unknown or no longer pending; nothing changed
    AlreadySettled,

    /// Invoice marked failed
    Failed,

    /// Status the ledger does not act on
    Ignored,
}

/// Splits `amount` into `(net, commission)`.
///
/// The commission is rounded to cents, halves away from zero, and the net
/// amount is whatever remains so the two always add up to `amount`.
pub fn split_commission(amount: Decimal, rate: Decimal) -> (Decimal, Decimal) {
    let commission = (amount * rate).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    (amount - commission, commission)
}

/// Checks that `amount` is a positive sum of whole cents.
///
/// Balances and transactions are stored as `NUMERIC(10, 2)`; a third
/// decimal would be rounded away on write and break `net + commission`.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, PaymentError> {
    if amount <= Decimal::ZERO || amount.normalize().scale() > 2 {
        return Err(PaymentError::InvalidAmount);
    }
    Ok(amount)
}

/// Converts provider minor units to a money amount.
pub fn from_minor_units(amount: i64) -> Decimal {
    Decimal::new(amount, 2)
}

/// Money movement service
#[derive(Debug, Clone)]
pub struct Ledger {
    db: PgPool,
    commission_rate: Decimal,
}

impl Ledger {
    pub fn new(db: PgPool, commission_rate: Decimal) -> Self {
        Ledger { db, commission_rate }
    }

    pub fn commission_rate(&self) -> Decimal {
        self.commission_rate
    }

    /// Client pays for a task.
    ///
    /// Debits the sender by the full `amount` and records a pending transfer
    /// of the net amount to `receiver_id`. The executor is credited only
    /// when the client accepts the work ([`Ledger::accept_done_offer`]).
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` when `amount` is not positive or has fractions of a cent
    /// - `BalanceNotFound` when the sender has no balance
    /// - `InsufficientFunds` when the balance does not cover `amount`
    /// - `TaskNotFound` when the task does not exist
    pub async fn transfer(
        &self,
        receiver_id: i64,
        sender_id: i64,
        task_id: i32,
        amount: Decimal,
    ) -> Result<Transaction, PaymentError> {
        let amount = validate_amount(amount)?;

        let mut tx = self.db.begin().await?;

        let balance = Balance::lock(&mut tx, sender_id)
            .await?
            .ok_or(PaymentError::BalanceNotFound(sender_id))?;

        if balance.balance_money < amount {
            return Err(PaymentError::InsufficientFunds {
                available: balance.balance_money,
                requested: amount,
            });
        }

        Balance::apply_delta(&mut tx, sender_id, -amount)
            .await?
            .ok_or(PaymentError::BalanceNotFound(sender_id))?;

        if !Task::assign_executor(&mut tx, task_id, receiver_id).await? {
            return Err(PaymentError::TaskNotFound(task_id));
        }

        let (net, commission) = split_commission(amount, self.commission_rate);

        let transaction = Transaction::create(
            &mut *tx,
            CreateTransaction {
                invoice_id: uuid::Uuid::new_v4().to_string(),
                amount: net,
                transaction_type: TransactionType::Transfer,
                transaction_status: TransactionStatus::Pending,
                sender_id: Some(sender_id),
                receiver_id: Some(receiver_id),
                task_id: Some(task_id),
                commission: Some(commission),
            },
        )
        .await?;

        tx.commit().await?;

        info!(
            transaction_id = transaction.transaction_id,
            sender_id,
            receiver_id,
            task_id,
            %amount,
            %commission,
            "Transfer recorded"
        );

        Ok(transaction)
    }

    /// Client accepts the finished work.
    ///
    /// Completes the pending transfer, closes the task, marks the deal's
    /// chat as paid and credits the executor with the net amount. Nothing is
    /// written when any step fails.
    pub async fn accept_done_offer(
        &self,
        transaction_id: i32,
        task_id: i32,
        receiver_id: i64,
    ) -> Result<Transaction, PaymentError> {
        let mut tx = self.db.begin().await?;

        let mut transaction = Transaction::lock(&mut tx, transaction_id)
            .await?
            .ok_or(PaymentError::TransactionNotFound(transaction_id))?;

        if transaction.transaction_status.is_final() {
            return Err(PaymentError::AlreadySettled(transaction.transaction_status));
        }

        Transaction::set_status(&mut tx, transaction_id, TransactionStatus::Completed).await?;
        transaction.transaction_status = TransactionStatus::Completed;

        Task::update_status(&mut *tx, task_id, TaskStatus::Done).await?;

        if let (Some(executor_id), Some(client_id)) = (transaction.receiver_id, transaction.sender_id) {
            let chats = Chat::mark_paid(&mut tx, task_id, executor_id, client_id).await?;
            if chats == 0 {
                warn!(task_id, executor_id, client_id, "No chat found for accepted deal");
            }
        }

        let new_balance = Balance::apply_delta(&mut tx, receiver_id, transaction.amount)
            .await?
            .ok_or(PaymentError::BalanceNotFound(receiver_id))?;

        tx.commit().await?;

        info!(
            transaction_id,
            task_id,
            receiver_id,
            amount = %transaction.amount,
            %new_balance,
            "Offer accepted, executor credited"
        );

        Ok(transaction)
    }

    /// Manual top-up or payout. Returns the new balance.
    pub async fn adjust_balance(
        &self,
        user_id: i64,
        amount: Decimal,
        action: BalanceAction,
    ) -> Result<Decimal, PaymentError> {
        let amount = validate_amount(amount)?;

        let mut tx = self.db.begin().await?;

        let balance = Balance::lock(&mut tx, user_id)
            .await?
            .ok_or(PaymentError::BalanceNotFound(user_id))?;

        let delta = match action {
            BalanceAction::Replenishment => amount,
            BalanceAction::Withdrawal => {
                if balance.balance_money < amount {
                    return Err(PaymentError::InsufficientFunds {
                        available: balance.balance_money,
                        requested: amount,
                    });
                }
                -amount
            }
        };

        let new_balance = Balance::apply_delta(&mut tx, user_id, delta)
            .await?
            .ok_or(PaymentError::BalanceNotFound(user_id))?;

        tx.commit().await?;

        info!(user_id, ?action, %amount, %new_balance, "Balance adjusted");
        Ok(new_balance)
    }

    /// Applies a provider notification for an invoice paid by `user_id`.
    ///
    /// A `success` credits the user only when it moves the invoice out of
    /// `Pending`, so a repeated notification does not credit twice. It must
    /// carry a positive amount; otherwise nothing is written and
    /// `InvalidAmount` is returned.
    pub async fn settle_invoice(
        &self,
        user_id: i64,
        payload: &WebhookPayload,
    ) -> Result<SettlementOutcome, PaymentError> {
        match payload.status.as_str() {
            "success" => {
                if payload.amount <= 0 {
                    return Err(PaymentError::InvalidAmount);
                }

                let mut tx = self.db.begin().await?;

                let settled = Transaction::settle_pending_invoice(
                    &mut tx,
                    &payload.invoice_id,
                    TransactionStatus::Completed,
                )
                .await?;

                if settled.is_none() {
                    tx.rollback().await?;
                    warn!(user_id, invoice_id = %payload.invoice_id, "Invoice not pending, skipping credit");
                    return Ok(SettlementOutcome::AlreadySettled);
                }

                let amount = from_minor_units(payload.amount);
                let new_balance = Balance::apply_delta(&mut tx, user_id, amount)
                    .await?
                    .ok_or(PaymentError::BalanceNotFound(user_id))?;

                tx.commit().await?;

                info!(user_id, invoice_id = %payload.invoice_id, %amount, "Invoice paid");
                Ok(SettlementOutcome::Credited(new_balance))
            }
            "failure" => {
                let mut conn = self.db.acquire().await?;
                Transaction::settle_pending_invoice(
                    &mut conn,
                    &payload.invoice_id,
                    TransactionStatus::Failed,
                )
                .await?;

                info!(user_id, invoice_id = %payload.invoice_id, "Invoice failed");
                Ok(SettlementOutcome::Failed)
            }
            other => {
                info!(user_id, invoice_id = %payload.invoice_id, status = other, "Invoice status ignored");
                Ok(SettlementOutcome::Ignored)
            }
        }
    }
}
