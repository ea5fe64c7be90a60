//! The ledger aggregate: transactions plus the running balance derived from them.
//!
//! Every mutation adjusts the stored balance by the signed delta of the change
//! and persists both halves through one [`WriteBatch`], while holding the
//! ledger lock for the whole read-modify-write cycle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fintrack_domain::{AmountError, Money, NewTransaction, Transaction, TransactionPatch};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    collection::position_of,
    storage::{collections, load_records, to_records, RecordStore, WriteBatch, BALANCE_KEY},
    time::Clock,
    CoreError,
};

/// Labels used for the entries the ledger creates on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    pub deposit_description: String,
    pub deposit_category: String,
    pub transfer_category: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            deposit_description: "Deposit".into(),
            deposit_category: "Deposit".into(),
            transfer_category: "Transfer".into(),
        }
    }
}

/// Result of a deposit or transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceChange {
    pub transaction: Transaction,
    pub balance: Money,
}

/// Outcome of comparing the stored balance with the one derived from transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub recorded: Option<Money>,
    pub computed: Money,
    pub corrected: bool,
}

struct LedgerState {
    transactions: Vec<Transaction>,
    balance: Money,
}

pub struct Ledger {
    store: Arc<dyn RecordStore>,
    clock: Arc<dyn Clock>,
    settings: LedgerSettings,
    lock: Mutex<()>,
}

impl Ledger {
    pub fn new(store: Arc<dyn RecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self::with_settings(store, clock, LedgerSettings::default())
    }

    pub fn with_settings(
        store: Arc<dyn RecordStore>,
        clock: Arc<dyn Clock>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            store,
            clock,
            settings,
            lock: Mutex::new(()),
        }
    }

    /// Returns all transactions, most recent `occurred_at` first.
    pub fn list_transactions(&self) -> Result<Vec<Transaction>, CoreError> {
        let _guard = self.guard();
        let mut transactions: Vec<Transaction> =
            load_records(self.store.as_ref(), collections::TRANSACTIONS)?;
        transactions.reverse();
        transactions.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
        Ok(transactions)
    }

    pub fn transaction(&self, id: Uuid) -> Result<Transaction, CoreError> {
        let _guard = self.guard();
        self.load_state()?
            .transactions
            .into_iter()
            .find(|txn| txn.id == id)
            .ok_or_else(|| CoreError::not_found("Transaction", id))
    }

    pub fn balance(&self) -> Result<Money, CoreError> {
        let _guard = self.guard();
        Ok(self.load_state()?.balance)
    }

    /// Records a new transaction and moves the balance by its signed amount.
    pub fn create(&self, input: NewTransaction) -> Result<Transaction, CoreError> {
        input.amount.ensure_positive()?;
        let _guard = self.guard();
        self.create_locked(input)
    }

    /// Applies `patch` to an existing transaction.
    ///
    /// The old contribution is reversed before the new one is applied, so kind
    /// and amount changes move the balance by exactly the difference.
    pub fn update(&self, id: Uuid, patch: TransactionPatch) -> Result<Transaction, CoreError> {
        if let Some(amount) = patch.amount {
            amount.ensure_positive()?;
        }
        let _guard = self.guard();
        let mut state = self.load_state()?;
        let index = position_of(&state.transactions, id)
            .ok_or_else(|| CoreError::not_found("Transaction", id))?;

        let txn = &mut state.transactions[index];
        let previous = txn.signed_amount();
        patch.apply_to(txn, self.clock.now());
        let updated = txn.clone();
        state.balance = state
            .balance
            .checked_sub(previous)
            .and_then(|balance| balance.checked_add(updated.signed_amount()))
            .map_err(|err| overflow(&err))?;

        self.commit(&state)?;
        info!(transaction_id = %id, balance = %state.balance, "Transaction updated");
        Ok(updated)
    }

    /// Removes a transaction and reverses its contribution. Returns the removed entry.
    pub fn delete(&self, id: Uuid) -> Result<Transaction, CoreError> {
        let _guard = self.guard();
        let mut state = self.load_state()?;
        let index = position_of(&state.transactions, id)
            .ok_or_else(|| CoreError::not_found("Transaction", id))?;

        let removed = state.transactions.remove(index);
        state.balance = state
            .balance
            .checked_sub(removed.signed_amount())
            .map_err(|err| overflow(&err))?;

        self.commit(&state)?;
        info!(transaction_id = %id, balance = %state.balance, "Transaction deleted");
        Ok(removed)
    }

    /// Adds funds as an income entry in the deposit category.
    pub fn deposit(&self, amount: Money) -> Result<BalanceChange, CoreError> {
        amount.ensure_positive()?;
        let _guard = self.guard();
        let input = NewTransaction::income(self.settings.deposit_description.clone(), amount)
            .with_category(self.settings.deposit_category.clone());
        let transaction = self.create_locked(input)?;
        let balance = self.load_state()?.balance;
        Ok(BalanceChange {
            transaction,
            balance,
        })
    }

    /// Sends funds to `recipient` as an expense entry.
    ///
    /// Fails with [`CoreError::InsufficientFunds`] when `amount` exceeds the
    /// current balance; nothing is written in that case.
    pub fn transfer(&self, recipient: &str, amount: Money) -> Result<BalanceChange, CoreError> {
        amount.ensure_positive()?;
        let recipient = recipient.trim();
        if recipient.is_empty() {
            return Err(CoreError::Validation("recipient must not be empty".into()));
        }

        let _guard = self.guard();
        let available = self.load_state()?.balance;
        if amount > available {
            warn!(%amount, %available, "Transfer rejected");
            return Err(CoreError::InsufficientFunds {
                requested: amount,
                available,
            });
        }

        let input = NewTransaction::expense(format!("Transfer to {recipient}"), amount)
            .with_category(self.settings.transfer_category.clone());
        let transaction = self.create_locked(input)?;
        Ok(BalanceChange {
            balance: available - amount,
            transaction,
        })
    }

    /// Recomputes the balance from the transactions and stores it when it differs.
    pub fn reconcile(&self) -> Result<Reconciliation, CoreError> {
        let _guard = self.guard();
        let transactions: Vec<Transaction> =
            load_records(self.store.as_ref(), collections::TRANSACTIONS)?;
        let recorded = self.store.load_scalar(BALANCE_KEY)?.map(Money::new);
        let computed: Money = transactions.iter().map(Transaction::signed_amount).sum();

        let corrected = recorded != Some(computed);
        if corrected {
            self.store.save_scalar(BALANCE_KEY, computed.amount())?;
            warn!(
                recorded = ?recorded.map(|m| m.to_string()),
                %computed,
                "Balance drift corrected"
            );
        }
        Ok(Reconciliation {
            recorded,
            computed,
            corrected,
        })
    }

    fn create_locked(&self, input: NewTransaction) -> Result<Transaction, CoreError> {
        let mut state = self.load_state()?;
        let txn = Transaction::from_input(input, self.clock.now());
        state.balance = state
            .balance
            .checked_add(txn.signed_amount())
            .map_err(|err| overflow(&err))?;
        state.transactions.push(txn.clone());

        self.commit(&state)?;
        info!(
            transaction_id = %txn.id,
            kind = %txn.kind,
            amount = %txn.amount,
            balance = %state.balance,
            "Transaction recorded"
        );
        Ok(txn)
    }

    fn load_state(&self) -> Result<LedgerState, CoreError> {
        let transactions: Vec<Transaction> =
            load_records(self.store.as_ref(), collections::TRANSACTIONS)?;
        let balance = match self.store.load_scalar(BALANCE_KEY)? {
            Some(value) => Money::new(value),
            None => {
                debug!("No stored balance, deriving from transactions");
                transactions.iter().map(Transaction::signed_amount).sum()
            }
        };
        Ok(LedgerState {
            transactions,
            balance,
        })
    }

    fn commit(&self, state: &LedgerState) -> Result<(), CoreError> {
        let mut batch = WriteBatch::new();
        batch.put_collection(collections::TRANSACTIONS, to_records(&state.transactions)?);
        batch.put_scalar(BALANCE_KEY, state.balance.amount());
        self.store.commit(batch)
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn overflow(err: &AmountError) -> CoreError {
    warn!(error = %err, "Balance out of range, change rejected");
    CoreError::InvalidAmount(format!("balance would leave the supported range ({err})"))
}
