//! Wallet balances as a projection of an append-only transaction log.
//!
//! The `WalletStore` is the source of truth for all balance state. Every
//! credit or debit appends one [`WalletTransaction`] with before/after
//! snapshots and updates the cached balance in the same exclusive borrow,
//! so the projection can never drift from the log between operations —
//! and [`WalletStore::reconcile`] proves it hasn't.

use std::collections::HashMap;

use chrono::Utc;
use escrowgate_types::{
    AccountId, EscrowError, OrderId, ReleaseId, Result, TxDirection, TxId, TxKind, Wallet,
    WalletTransaction,
};
use rust_decimal::Decimal;

/// One requested ledger movement, before it is applied.
#[derive(Debug, Clone)]
pub struct Posting {
    pub account_id: AccountId,
    /// Strictly positive; direction comes from the credit/debit call.
    pub amount: Decimal,
    pub kind: TxKind,
    pub description: String,
    pub order_id: Option<OrderId>,
    pub release_id: Option<ReleaseId>,
}

/// Manages wallets and their append-only transaction log.
pub struct WalletStore {
    /// Cached balance projection, one entry per known wallet.
    balances: HashMap<AccountId, Decimal>,
    /// The append-only ledger. Never updated or deleted after creation.
    log: Vec<WalletTransaction>,
}

impl WalletStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            log: Vec::new(),
        }
    }

    /// Credit a wallet, creating it lazily on first use.
    ///
    /// # Errors
    /// Returns `InvalidAmount` if the amount is not strictly positive.
    pub fn credit(&mut self, posting: Posting) -> Result<TxId> {
        if posting.amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount(posting.amount));
        }
        let before = self.balance(posting.account_id);
        let after = before + posting.amount;
        Ok(self.append(posting, TxDirection::Credit, before, after))
    }

    /// Debit a wallet.
    ///
    /// # Errors
    /// - `InvalidAmount` if the amount is not strictly positive
    /// - `InsufficientBalance` if the wallet cannot cover the debit —
    ///   balances never go negative by construction
    pub fn debit(&mut self, posting: Posting) -> Result<TxId> {
        if posting.amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount(posting.amount));
        }
        let before = self.balance(posting.account_id);
        if before < posting.amount {
            return Err(EscrowError::InsufficientBalance {
                needed: posting.amount,
                available: before,
            });
        }
        let after = before - posting.amount;
        Ok(self.append(posting, TxDirection::Debit, before, after))
    }

    fn append(
        &mut self,
        posting: Posting,
        direction: TxDirection,
        before: Decimal,
        after: Decimal,
    ) -> TxId {
        let tx = WalletTransaction {
            id: TxId::new(),
            account_id: posting.account_id,
            amount: posting.amount,
            direction,
            kind: posting.kind,
            description: posting.description,
            order_id: posting.order_id,
            release_id: posting.release_id,
            balance_before: before,
            balance_after: after,
            created_at: Utc::now(),
        };
        tracing::debug!(
            account = %tx.account_id,
            kind = %tx.kind,
            amount = %tx.signed_amount(),
            balance = %after,
            "ledger line appended"
        );
        let id = tx.id;
        self.balances.insert(posting.account_id, after);
        self.log.push(tx);
        id
    }

    /// Current balance of an account. Unknown accounts read as zero.
    #[must_use]
    pub fn balance(&self, account_id: AccountId) -> Decimal {
        self.balances.get(&account_id).copied().unwrap_or_default()
    }

    /// The wallet view of an account.
    #[must_use]
    pub fn wallet(&self, account_id: AccountId) -> Wallet {
        Wallet {
            account_id,
            balance: self.balance(account_id),
        }
    }

    /// Whether a wallet has been created (received at least one line).
    #[must_use]
    pub fn exists(&self, account_id: AccountId) -> bool {
        self.balances.contains_key(&account_id)
    }

    /// All ledger lines, oldest first.
    #[must_use]
    pub fn transactions(&self) -> &[WalletTransaction] {
        &self.log
    }

    /// Ledger lines for one account, oldest first.
    pub fn transactions_for(
        &self,
        account_id: AccountId,
    ) -> impl Iterator<Item = &WalletTransaction> {
        self.log.iter().filter(move |tx| tx.account_id == account_id)
    }

    /// Recompute an account's balance from its transaction log.
    #[must_use]
    pub fn derived_balance(&self, account_id: AccountId) -> Decimal {
        self.transactions_for(account_id)
            .map(WalletTransaction::signed_amount)
            .sum()
    }

    /// Verify the reconciliation invariant for one account: the cached
    /// balance equals the sum of the log's signed amounts.
    ///
    /// # Errors
    /// Returns `LedgerDrift` if the projection disagrees with the log.
    pub fn reconcile(&self, account_id: AccountId) -> Result<()> {
        let cached = self.balance(account_id);
        let derived = self.derived_balance(account_id);
        if cached == derived {
            Ok(())
        } else {
            Err(EscrowError::LedgerDrift {
                account: account_id,
                cached,
                derived,
            })
        }
    }

    /// Verify the reconciliation invariant for every known wallet.
    pub fn reconcile_all(&self) -> Result<()> {
        for account_id in self.balances.keys() {
            self.reconcile(*account_id)?;
        }
        Ok(())
    }

    /// Number of wallets created so far.
    #[must_use]
    pub fn wallet_count(&self) -> usize {
        self.balances.len()
    }
}

impl Default for WalletStore {
    fn default() -> Self {
        Self::new()
    }
}
