//! The pending-release manager — the authoritative state machine for a
//! single fund movement.
//!
//! Confirm executes in two phases. The *precondition* phase (existence,
//! status, token, withdrawal balance, escrow transition) runs against
//! immutable borrows and returns before any state changes. The *commit*
//! phase flips the status, appends the audit entry, moves the money, flips
//! the order's escrow, and queues the notification — all under the same
//! exclusive borrow of the manager, the in-process analog of one store
//! transaction.
//!
//! The combination of (token presence + freshness) + (status precondition)
//! + (one atomic commit of audit + ledger + status) is what prevents the
//! two classic bugs in manual-approval systems: double payout from a
//! resubmitted confirm, and a ledger credit that lands while the release
//! stays PENDING.

use chrono::{DateTime, Utc};
use escrowgate_ledger::{AuditLog, LedgerEntry, MerchantLedger, Posting, WalletStore, split_fee};
use escrowgate_types::{
    AccountId, Actor, AuditAction, AuditId, AuditOutcome, ClientInfo, DisputeId, EngineConfig,
    EscrowError, EscrowStatus, FinancialAuditEntry, LedgerEntryId, Order, OrderId,
    PendingRelease, RecipientKind, ReleaseId, ReleaseKind, ReleaseStatus, Result,
    SettlementChannel, TriggerSource, TxId, TxKind,
};
use rust_decimal::Decimal;

use crate::orders::OrderStore;
use crate::outbox::{Notification, NotificationKind, Outbox};
use crate::store::ReleaseStore;
use crate::token::TokenService;

/// Parameters for creating a release. Upstream events build one of these.
#[derive(Debug, Clone)]
pub struct NewRelease {
    pub kind: ReleaseKind,
    pub amount: Decimal,
    pub recipient_id: AccountId,
    pub recipient_kind: RecipientKind,
    pub order_id: Option<OrderId>,
    pub dispute_id: Option<DisputeId>,
    pub triggered_by: TriggerSource,
    pub reason: String,
}

/// What happened to the merchant fee-split step of an approval.
///
/// A failure here deliberately does not roll back the primary payout —
/// retrying the whole approval would risk a double payout. It surfaces
/// structured, so callers and monitoring can route it to manual
/// reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeLedgerOutcome {
    /// The release had no partner-store fee split to record.
    NotApplicable,
    /// Split recorded; the merchant wallet credit is present for
    /// online-settled trades.
    Recorded {
        entry_id: LedgerEntryId,
        merchant_credit: Option<TxId>,
    },
    /// The split step failed after the primary payout committed.
    Failed { reason: String },
}

/// Result of a successful approval.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub release_id: ReleaseId,
    pub status: ReleaseStatus,
    pub amount_released: Decimal,
    pub recipient: AccountId,
    pub approved_by: AccountId,
    pub approved_at: DateTime<Utc>,
    pub audit_id: AuditId,
    pub fee_ledger: FeeLedgerOutcome,
    /// Human-readable outcome line for the reviewer.
    pub message: String,
}

/// Result of a successful rejection.
#[derive(Debug, Clone)]
pub struct RejectionOutcome {
    pub release_id: ReleaseId,
    pub status: ReleaseStatus,
    pub audit_id: AuditId,
    pub message: String,
}

/// Owns every store the approval flow mutates, so one `&mut self` call is
/// one atomic unit. No component reaches for ambient state.
pub struct ReleaseManager {
    config: EngineConfig,
    tokens: TokenService,
    releases: ReleaseStore,
    orders: OrderStore,
    wallets: WalletStore,
    audit: AuditLog,
    fee_ledger: MerchantLedger,
    outbox: Outbox,
}

impl ReleaseManager {
    /// Create a manager with empty stores.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let tokens = TokenService::new(&config.approval);
        Self {
            config,
            tokens,
            releases: ReleaseStore::new(),
            orders: OrderStore::new(),
            wallets: WalletStore::new(),
            audit: AuditLog::new(),
            fee_ledger: MerchantLedger::new(),
            outbox: Outbox::new(),
        }
    }

    // =====================================================================
    // Upstream event constructors
    // =====================================================================

    /// Register an order so the approval flow can touch its escrow.
    pub fn register_order(&mut self, order: Order) -> OrderId {
        self.orders.insert(order)
    }

    /// Deposit funds into a wallet (e.g. test fixtures, top-ups relayed by
    /// the host).
    pub fn deposit(&mut self, account: AccountId, amount: Decimal) -> Result<TxId> {
        self.wallets.credit(Posting {
            account_id: account,
            amount,
            kind: TxKind::Deposit,
            description: "Deposit".into(),
            order_id: None,
            release_id: None,
        })
    }

    /// Create a release from explicit parameters.
    ///
    /// # Errors
    /// - `InvalidAmount` unless the amount is strictly positive
    /// - `OrderNotFound` if a referenced order is not registered
    /// - `DuplicateRelease` if the referenced dispute already has one
    pub fn create(&mut self, new: NewRelease) -> Result<ReleaseId> {
        if new.amount <= Decimal::ZERO {
            return Err(EscrowError::InvalidAmount(new.amount));
        }
        if let Some(order_id) = new.order_id {
            self.orders.get(order_id)?;
        }
        let release = PendingRelease {
            id: ReleaseId::new(),
            kind: new.kind,
            amount: new.amount,
            recipient_id: new.recipient_id,
            recipient_kind: new.recipient_kind,
            order_id: new.order_id,
            dispute_id: new.dispute_id,
            status: ReleaseStatus::Pending,
            confirmation: None,
            triggered_by: new.triggered_by,
            reason: new.reason,
            created_at: Utc::now(),
            approved_at: None,
            approved_by: None,
            approved_by_role: None,
        };
        let id = self.releases.insert(release)?;
        tracing::info!(release = %id, kind = %new.kind, amount = %new.amount, trigger = %new.triggered_by, "release created");
        Ok(id)
    }

    /// A completed trade proposes releasing the seller's proceeds.
    ///
    /// # Errors
    /// `OrderNotFound` / `InvalidEscrowState` unless the order's funds are
    /// still HELD.
    pub fn on_trade_completed(&mut self, order_id: OrderId) -> Result<ReleaseId> {
        let order = self.orders.get(order_id)?;
        if order.escrow_status != EscrowStatus::Held {
            return Err(EscrowError::InvalidEscrowState {
                current: order.escrow_status,
                target: EscrowStatus::Released,
            });
        }
        let new = NewRelease {
            kind: ReleaseKind::ReleaseToSeller,
            amount: order.seller_proceeds(),
            recipient_id: order.seller,
            recipient_kind: RecipientKind::Seller,
            order_id: Some(order_id),
            dispute_id: None,
            triggered_by: TriggerSource::TradeCompleted,
            reason: format!("Trade completed for order {order_id}"),
        };
        self.create(new)
    }

    /// A user asks to withdraw wallet balance out of the platform.
    ///
    /// The balance check happens at confirm time, against the balance the
    /// wallet has then.
    pub fn request_withdrawal(
        &mut self,
        account: AccountId,
        recipient_kind: RecipientKind,
        amount: Decimal,
    ) -> Result<ReleaseId> {
        self.create(NewRelease {
            kind: ReleaseKind::Withdrawal,
            amount,
            recipient_id: account,
            recipient_kind,
            order_id: None,
            dispute_id: None,
            triggered_by: TriggerSource::WithdrawalRequested,
            reason: format!("Withdrawal requested by {account}"),
        })
    }

    /// A hub earned commission on a brokered trade.
    pub fn on_hub_commission(
        &mut self,
        order_id: OrderId,
        hub: AccountId,
        amount: Decimal,
    ) -> Result<ReleaseId> {
        self.orders.get(order_id)?;
        self.create(NewRelease {
            kind: ReleaseKind::HubCommission,
            amount,
            recipient_id: hub,
            recipient_kind: RecipientKind::Hub,
            order_id: Some(order_id),
            dispute_id: None,
            triggered_by: TriggerSource::HubCommission,
            reason: format!("Hub commission for order {order_id}"),
        })
    }

    // =====================================================================
    // The two-step confirmation protocol
    // =====================================================================

    /// First step: mint a confirmation token for a PENDING release.
    ///
    /// Re-initiating replaces the outstanding token; only the most recent
    /// one can confirm.
    ///
    /// # Errors
    /// `ReleaseNotFound` / `InvalidReleaseState` unless PENDING.
    pub fn initiate(&mut self, id: ReleaseId, actor: &Actor) -> Result<(String, DateTime<Utc>)> {
        self.initiate_at(id, actor, Utc::now())
    }

    /// [`Self::initiate`] with an explicit clock.
    pub fn initiate_at(
        &mut self,
        id: ReleaseId,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>)> {
        let release = self.releases.get(id)?;
        if release.status != ReleaseStatus::Pending {
            return Err(EscrowError::InvalidReleaseState {
                current: release.status,
            });
        }
        let token = self.tokens.issue(now);
        let value = token.token.clone();
        let expires_at = token.expires_at;
        self.releases.get_mut(id)?.confirmation = Some(token);
        tracing::info!(release = %id, actor = %actor.id, %expires_at, "approval initiated");
        Ok((value, expires_at))
    }

    /// Second step: confirm the release and move the money.
    ///
    /// # Errors
    /// `ReleaseNotFound`, `InvalidReleaseState`, `MissingToken`,
    /// `InvalidToken`, `TokenExpired`, `InsufficientBalance` (withdrawals),
    /// `InvalidEscrowState` — all raised before any mutation.
    pub fn confirm(
        &mut self,
        id: ReleaseId,
        presented: &str,
        actor: &Actor,
        client: &ClientInfo,
        notes: &str,
    ) -> Result<ApprovalOutcome> {
        self.confirm_at(id, presented, actor, client, notes, Utc::now())
    }

    /// [`Self::confirm`] with an explicit clock.
    #[allow(clippy::too_many_lines)]
    pub fn confirm_at(
        &mut self,
        id: ReleaseId,
        presented: &str,
        actor: &Actor,
        client: &ClientInfo,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<ApprovalOutcome> {
        // ----- precondition phase: no mutation past this comment's scope
        let release = self.releases.get(id)?;
        if release.status != ReleaseStatus::Pending {
            return Err(EscrowError::InvalidReleaseState {
                current: release.status,
            });
        }
        TokenService::validate(release, presented, now)?;

        let kind = release.kind;
        let amount = release.amount;
        let recipient = release.recipient_id;
        let order_id = release.order_id;

        if kind == ReleaseKind::Withdrawal {
            let available = self.wallets.balance(recipient);
            if available < amount {
                return Err(EscrowError::InsufficientBalance {
                    needed: amount,
                    available,
                });
            }
        }

        let escrow_target = match kind {
            ReleaseKind::ReleaseToSeller => Some(EscrowStatus::Released),
            ReleaseKind::RefundFull | ReleaseKind::RefundPartial => Some(EscrowStatus::Refunded),
            ReleaseKind::HubCommission | ReleaseKind::Withdrawal => None,
        };
        // Fee-split inputs, snapshotted while the order borrow is live.
        let mut fee_inputs: Option<(Option<AccountId>, AccountId, Decimal, SettlementChannel)> =
            None;
        if let Some(order_id) = order_id {
            let order = self.orders.get(order_id)?;
            if let Some(target) = escrow_target {
                if !order.escrow_status.can_transition_to(target) {
                    return Err(EscrowError::InvalidEscrowState {
                        current: order.escrow_status,
                        target,
                    });
                }
            }
            if kind == ReleaseKind::ReleaseToSeller {
                if let Some(merchant_id) = order.merchant_id {
                    fee_inputs =
                        Some((order.hub_id, merchant_id, order.fee_amount, order.channel));
                }
            }
        }

        // ----- commit phase: every step below is part of one atomic unit
        let release = self.releases.get_mut(id)?;
        let token = release.confirmation.take();
        release.status = ReleaseStatus::Approved;
        release.approved_at = Some(now);
        release.approved_by = Some(actor.id);
        release.approved_by_role = Some(actor.role);
        let first_click_at = token.map(|t| t.issued_at);

        let (tx_kind, description) = match kind {
            ReleaseKind::ReleaseToSeller => (TxKind::EscrowRelease, "Escrow release"),
            ReleaseKind::RefundFull | ReleaseKind::RefundPartial => {
                (TxKind::EscrowRefund, "Escrow refund")
            }
            ReleaseKind::HubCommission => (TxKind::HubCommission, "Hub commission"),
            ReleaseKind::Withdrawal => (TxKind::Withdrawal, "Withdrawal payout"),
        };
        let description = match order_id {
            Some(order_id) => format!("{description} for order {order_id}"),
            None => description.to_string(),
        };
        let posting = Posting {
            account_id: recipient,
            amount,
            kind: tx_kind,
            description,
            order_id,
            release_id: Some(id),
        };
        if kind == ReleaseKind::Withdrawal {
            self.wallets.debit(posting)?;
        } else {
            self.wallets.credit(posting)?;
        }

        let audit_id = self.audit.append(FinancialAuditEntry {
            id: AuditId::new(),
            action: AuditAction {
                kind,
                outcome: AuditOutcome::Approved,
            },
            release_id: id,
            order_id,
            amount,
            recipient_id: recipient,
            performed_by: actor.id,
            performed_by_role: actor.role,
            ip_address: client.ip_address,
            user_agent: client.user_agent.clone(),
            first_click_at,
            confirm_click_at: now,
            notes: notes.to_string(),
            created_at: now,
        });

        if let (Some(order_id), Some(target)) = (order_id, escrow_target) {
            self.orders.set_escrow_status(order_id, target)?;
        }

        let fee_ledger = match (order_id, fee_inputs) {
            (Some(order_id), Some((hub_id, merchant_id, fee_amount, channel))) => {
                self.record_fee_split(order_id, hub_id, merchant_id, fee_amount, channel, id)
            }
            _ => FeeLedgerOutcome::NotApplicable,
        };

        let message = match kind {
            ReleaseKind::ReleaseToSeller => format!("Released {amount} to seller {recipient}"),
            ReleaseKind::RefundFull | ReleaseKind::RefundPartial => {
                format!("Refunded {amount} to buyer {recipient}")
            }
            ReleaseKind::HubCommission => format!("Paid {amount} commission to hub {recipient}"),
            ReleaseKind::Withdrawal => {
                format!("Approved withdrawal of {amount} for {recipient}")
            }
        };
        self.outbox.push(
            recipient,
            NotificationKind::ReleaseApproved,
            id,
            message.clone(),
        );

        tracing::info!(
            release = %id,
            kind = %kind,
            %amount,
            %recipient,
            approved_by = %actor.id,
            "release approved"
        );

        Ok(ApprovalOutcome {
            release_id: id,
            status: ReleaseStatus::Approved,
            amount_released: amount,
            recipient,
            approved_by: actor.id,
            approved_at: now,
            audit_id,
            fee_ledger,
            message,
        })
    }

    /// Reject a PENDING release. No wallet is touched.
    ///
    /// # Errors
    /// `ReleaseNotFound` / `InvalidReleaseState` unless PENDING.
    pub fn reject(
        &mut self,
        id: ReleaseId,
        actor: &Actor,
        client: &ClientInfo,
        reason: &str,
    ) -> Result<RejectionOutcome> {
        let now = Utc::now();
        let release = self.releases.get(id)?;
        if release.status != ReleaseStatus::Pending {
            return Err(EscrowError::InvalidReleaseState {
                current: release.status,
            });
        }
        let kind = release.kind;
        let amount = release.amount;
        let recipient = release.recipient_id;
        let order_id = release.order_id;

        let release = self.releases.get_mut(id)?;
        let token = release.confirmation.take();
        release.status = ReleaseStatus::Rejected;

        let audit_id = self.audit.append(FinancialAuditEntry {
            id: AuditId::new(),
            action: AuditAction {
                kind,
                outcome: AuditOutcome::Rejected,
            },
            release_id: id,
            order_id,
            amount,
            recipient_id: recipient,
            performed_by: actor.id,
            performed_by_role: actor.role,
            ip_address: client.ip_address,
            user_agent: client.user_agent.clone(),
            first_click_at: token.map(|t| t.issued_at),
            confirm_click_at: now,
            notes: reason.to_string(),
            created_at: now,
        });

        let message = format!("Rejected {kind} of {amount} to {recipient}: {reason}");
        self.outbox.push(
            recipient,
            NotificationKind::ReleaseRejected,
            id,
            message.clone(),
        );
        tracing::info!(release = %id, rejected_by = %actor.id, %reason, "release rejected");

        Ok(RejectionOutcome {
            release_id: id,
            status: ReleaseStatus::Rejected,
            audit_id,
            message,
        })
    }

    // =====================================================================
    // Post-approval transitions
    // =====================================================================

    /// The external payout workflow finished a withdrawal.
    ///
    /// # Errors
    /// `InvalidReleaseState` unless an APPROVED WITHDRAWAL release.
    pub fn mark_paid(&mut self, id: ReleaseId) -> Result<()> {
        let release = self.releases.get_mut(id)?;
        if release.kind != ReleaseKind::Withdrawal
            || release.status != ReleaseStatus::Approved
        {
            return Err(EscrowError::InvalidReleaseState {
                current: release.status,
            });
        }
        release.status = ReleaseStatus::Paid;
        tracing::info!(release = %id, "withdrawal paid out");
        Ok(())
    }

    /// Post-approval bookkeeping finished.
    ///
    /// # Errors
    /// `InvalidReleaseState` unless APPROVED.
    pub fn complete(&mut self, id: ReleaseId) -> Result<()> {
        let release = self.releases.get_mut(id)?;
        if release.status != ReleaseStatus::Approved {
            return Err(EscrowError::InvalidReleaseState {
                current: release.status,
            });
        }
        release.status = ReleaseStatus::Completed;
        tracing::info!(release = %id, "release completed");
        Ok(())
    }

    /// Administrative cancellation. Allowed from any non-terminal state;
    /// audit-logged; touches no wallet.
    ///
    /// # Errors
    /// `InvalidReleaseState` if the release is already terminal.
    pub fn cancel(
        &mut self,
        id: ReleaseId,
        actor: &Actor,
        client: &ClientInfo,
        reason: &str,
    ) -> Result<AuditId> {
        let now = Utc::now();
        let release = self.releases.get(id)?;
        if release.status.is_terminal() {
            return Err(EscrowError::InvalidReleaseState {
                current: release.status,
            });
        }
        let kind = release.kind;
        let amount = release.amount;
        let recipient = release.recipient_id;
        let order_id = release.order_id;

        let release = self.releases.get_mut(id)?;
        release.confirmation = None;
        release.status = ReleaseStatus::Cancelled;

        let audit_id = self.audit.append(FinancialAuditEntry {
            id: AuditId::new(),
            action: AuditAction {
                kind,
                outcome: AuditOutcome::Cancelled,
            },
            release_id: id,
            order_id,
            amount,
            recipient_id: recipient,
            performed_by: actor.id,
            performed_by_role: actor.role,
            ip_address: client.ip_address,
            user_agent: client.user_agent.clone(),
            first_click_at: None,
            confirm_click_at: now,
            notes: reason.to_string(),
            created_at: now,
        });
        self.outbox.push(
            recipient,
            NotificationKind::ReleaseCancelled,
            id,
            format!("Cancelled {kind} of {amount}: {reason}"),
        );
        tracing::info!(release = %id, cancelled_by = %actor.id, "release cancelled");
        Ok(audit_id)
    }

    // =====================================================================
    // Fee split (the deliberate partial-success path)
    // =====================================================================

    fn record_fee_split(
        &mut self,
        order_id: OrderId,
        hub_id: Option<AccountId>,
        merchant_id: AccountId,
        fee_amount: Decimal,
        channel: SettlementChannel,
        release_id: ReleaseId,
    ) -> FeeLedgerOutcome {
        let split = match split_fee(fee_amount, self.config.fees.merchant_share_pct) {
            Ok(split) => split,
            Err(err) => {
                tracing::warn!(order = %order_id, %err, "fee split computation failed; payout already committed");
                return FeeLedgerOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };
        let entry = LedgerEntry::from_split(order_id, hub_id, merchant_id, fee_amount, split);
        let entry_id = match self.fee_ledger.record(entry) {
            Ok(entry_id) => entry_id,
            Err(err) => {
                tracing::warn!(order = %order_id, %err, "fee ledger entry rejected; payout already committed");
                return FeeLedgerOutcome::Failed {
                    reason: err.to_string(),
                };
            }
        };

        let merchant_credit = if channel == SettlementChannel::Online
            && split.merchant_cut > Decimal::ZERO
        {
            match self.wallets.credit(Posting {
                account_id: merchant_id,
                amount: split.merchant_cut,
                kind: TxKind::MerchantShare,
                description: format!("Merchant share for order {order_id}"),
                order_id: Some(order_id),
                release_id: Some(release_id),
            }) {
                Ok(tx_id) => Some(tx_id),
                Err(err) => {
                    tracing::warn!(order = %order_id, %err, "merchant wallet credit failed; payout already committed");
                    return FeeLedgerOutcome::Failed {
                        reason: err.to_string(),
                    };
                }
            }
        } else {
            None
        };

        FeeLedgerOutcome::Recorded {
            entry_id,
            merchant_credit,
        }
    }

    // =====================================================================
    // Read access
    // =====================================================================

    /// Look up a release.
    ///
    /// # Errors
    /// Returns `ReleaseNotFound` if absent.
    pub fn release(&self, id: ReleaseId) -> Result<&PendingRelease> {
        self.releases.get(id)
    }

    /// The wallet store.
    #[must_use]
    pub fn wallets(&self) -> &WalletStore {
        &self.wallets
    }

    /// The audit log.
    #[must_use]
    pub fn audit(&self) -> &AuditLog {
        &self.audit
    }

    /// The merchant fee ledger.
    #[must_use]
    pub fn fee_ledger(&self) -> &MerchantLedger {
        &self.fee_ledger
    }

    /// The order store.
    #[must_use]
    pub fn orders(&self) -> &OrderStore {
        &self.orders
    }

    /// The release store.
    #[must_use]
    pub fn releases(&self) -> &ReleaseStore {
        &self.releases
    }

    /// Take everything queued for notification delivery.
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.outbox.drain()
    }

    /// Peek at queued notifications.
    #[must_use]
    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use escrowgate_types::{ActorRole, FeePayer};

    fn admin() -> Actor {
        Actor {
            id: AccountId::new(),
            role: ActorRole::Admin,
        }
    }

    fn client() -> ClientInfo {
        ClientInfo::default()
    }

    fn manager() -> ReleaseManager {
        ReleaseManager::new(EngineConfig::default())
    }

    fn seller_order(
        manager: &mut ReleaseManager,
        channel: SettlementChannel,
        merchant_id: Option<AccountId>,
    ) -> (OrderId, AccountId) {
        let seller = AccountId::new();
        let order = Order::new(
            AccountId::new(),
            seller,
            Decimal::new(10000, 2),
            Decimal::new(500, 2),
            FeePayer::Buyer,
            channel,
            None,
            merchant_id,
        );
        (manager.register_order(order), seller)
    }

    fn initiate_and_confirm(
        manager: &mut ReleaseManager,
        id: ReleaseId,
        actor: &Actor,
    ) -> ApprovalOutcome {
        let (token, _) = manager.initiate(id, actor).unwrap();
        manager
            .confirm(id, &token, actor, &client(), "looks right")
            .unwrap()
    }

    #[test]
    fn trade_completion_release_pays_seller() {
        let mut mgr = manager();
        let (order_id, seller) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();

        let outcome = initiate_and_confirm(&mut mgr, release_id, &reviewer);

        assert_eq!(outcome.status, ReleaseStatus::Approved);
        assert_eq!(outcome.amount_released, Decimal::new(10000, 2));
        assert_eq!(outcome.recipient, seller);
        assert_eq!(outcome.fee_ledger, FeeLedgerOutcome::NotApplicable);
        assert_eq!(mgr.wallets().balance(seller), Decimal::new(10000, 2));
        assert_eq!(
            mgr.orders().get(order_id).unwrap().escrow_status,
            EscrowStatus::Released
        );

        // The token is single-use: the release left PENDING.
        let release = mgr.release(release_id).unwrap();
        assert!(release.confirmation.is_none());
        assert_eq!(release.approved_by, Some(reviewer.id));
    }

    #[test]
    fn second_confirm_sees_invalid_state_not_double_payout() {
        let mut mgr = manager();
        let (order_id, seller) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();
        let (token, _) = mgr.initiate(release_id, &reviewer).unwrap();
        mgr.confirm(release_id, &token, &reviewer, &client(), "")
            .unwrap();

        let err = mgr
            .confirm(release_id, &token, &reviewer, &client(), "")
            .unwrap_err();
        assert!(matches!(
            err,
            EscrowError::InvalidReleaseState {
                current: ReleaseStatus::Approved
            }
        ));
        // Paid exactly once.
        assert_eq!(mgr.wallets().balance(seller), Decimal::new(10000, 2));
        assert_eq!(mgr.wallets().transactions_for(seller).count(), 1);
    }

    #[test]
    fn reinitiate_invalidates_previous_token() {
        let mut mgr = manager();
        let (order_id, _) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();

        let (first, _) = mgr.initiate(release_id, &reviewer).unwrap();
        let (second, _) = mgr.initiate(release_id, &reviewer).unwrap();
        assert_ne!(first, second);

        let err = mgr
            .confirm(release_id, &first, &reviewer, &client(), "")
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidToken));

        // The fresh token still works.
        mgr.confirm(release_id, &second, &reviewer, &client(), "")
            .unwrap();
    }

    #[test]
    fn expired_token_fails_even_when_matching() {
        let mut mgr = manager();
        let (order_id, seller) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();
        let (token, expires_at) = mgr.initiate(release_id, &reviewer).unwrap();

        let err = mgr
            .confirm_at(
                release_id,
                &token,
                &reviewer,
                &client(),
                "",
                expires_at + chrono::Duration::seconds(1),
            )
            .unwrap_err();
        assert!(matches!(err, EscrowError::TokenExpired));
        // No partial effect.
        assert_eq!(mgr.wallets().balance(seller), Decimal::ZERO);
        assert!(mgr.release(release_id).unwrap().is_pending());
    }

    #[test]
    fn confirm_without_initiate_is_missing_token() {
        let mut mgr = manager();
        let (order_id, _) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();

        let err = mgr
            .confirm(release_id, "deadbeef", &admin(), &client(), "")
            .unwrap_err();
        assert!(matches!(err, EscrowError::MissingToken));
    }

    #[test]
    fn reject_touches_no_wallet() {
        let mut mgr = manager();
        let (order_id, seller) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();
        mgr.initiate(release_id, &reviewer).unwrap();

        let outcome = mgr
            .reject(release_id, &reviewer, &client(), "listing mismatch")
            .unwrap();
        assert_eq!(outcome.status, ReleaseStatus::Rejected);
        assert_eq!(mgr.wallets().balance(seller), Decimal::ZERO);
        assert_eq!(mgr.wallets().transactions().len(), 0);
        // Escrow untouched.
        assert_eq!(
            mgr.orders().get(order_id).unwrap().escrow_status,
            EscrowStatus::Held
        );
        // Audit entry recorded with the rejection action.
        let entry = mgr.audit().get(outcome.audit_id).unwrap();
        assert_eq!(entry.action.to_string(), "RELEASE_TO_SELLER_REJECTED");
        assert_eq!(entry.notes, "listing mismatch");
    }

    #[test]
    fn rejected_release_cannot_be_confirmed_later() {
        let mut mgr = manager();
        let (order_id, _) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();
        let (token, _) = mgr.initiate(release_id, &reviewer).unwrap();
        mgr.reject(release_id, &reviewer, &client(), "no").unwrap();

        let err = mgr
            .confirm(release_id, &token, &reviewer, &client(), "")
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidReleaseState { .. }));
    }

    #[test]
    fn withdrawal_debits_and_pays_out() {
        let mut mgr = manager();
        let account = AccountId::new();
        mgr.deposit(account, Decimal::new(30000, 2)).unwrap();
        let release_id = mgr
            .request_withdrawal(account, RecipientKind::Seller, Decimal::new(12000, 2))
            .unwrap();
        let reviewer = admin();

        let outcome = initiate_and_confirm(&mut mgr, release_id, &reviewer);
        assert_eq!(outcome.amount_released, Decimal::new(12000, 2));
        assert_eq!(mgr.wallets().balance(account), Decimal::new(18000, 2));

        mgr.mark_paid(release_id).unwrap();
        assert_eq!(
            mgr.release(release_id).unwrap().status,
            ReleaseStatus::Paid
        );
    }

    #[test]
    fn withdrawal_confirm_checks_balance_before_mutation() {
        let mut mgr = manager();
        let account = AccountId::new();
        mgr.deposit(account, Decimal::new(5000, 2)).unwrap();
        let release_id = mgr
            .request_withdrawal(account, RecipientKind::Seller, Decimal::new(12000, 2))
            .unwrap();
        let reviewer = admin();
        let (token, _) = mgr.initiate(release_id, &reviewer).unwrap();

        let err = mgr
            .confirm(release_id, &token, &reviewer, &client(), "")
            .unwrap_err();
        assert!(matches!(err, EscrowError::InsufficientBalance { .. }));
        // Nothing changed: still PENDING, token still outstanding, balance intact.
        let release = mgr.release(release_id).unwrap();
        assert!(release.is_pending());
        assert!(release.confirmation.is_some());
        assert_eq!(mgr.wallets().balance(account), Decimal::new(5000, 2));
        assert!(mgr.audit().is_empty());
    }

    #[test]
    fn mark_paid_rejects_non_withdrawal() {
        let mut mgr = manager();
        let (order_id, _) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();
        initiate_and_confirm(&mut mgr, release_id, &reviewer);

        let err = mgr.mark_paid(release_id).unwrap_err();
        assert!(matches!(err, EscrowError::InvalidReleaseState { .. }));
    }

    #[test]
    fn complete_after_approval() {
        let mut mgr = manager();
        let (order_id, _) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        initiate_and_confirm(&mut mgr, release_id, &admin());

        mgr.complete(release_id).unwrap();
        assert_eq!(
            mgr.release(release_id).unwrap().status,
            ReleaseStatus::Completed
        );
    }

    #[test]
    fn cancel_pending_writes_audit_and_blocks_confirm() {
        let mut mgr = manager();
        let (order_id, seller) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();
        let (token, _) = mgr.initiate(release_id, &reviewer).unwrap();

        let audit_id = mgr
            .cancel(release_id, &reviewer, &client(), "created in error")
            .unwrap();
        assert_eq!(
            mgr.audit().get(audit_id).unwrap().action.to_string(),
            "RELEASE_TO_SELLER_CANCELLED"
        );

        let err = mgr
            .confirm(release_id, &token, &reviewer, &client(), "")
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidReleaseState { .. }));
        assert_eq!(mgr.wallets().balance(seller), Decimal::ZERO);

        // Terminal: cancelling again is rejected.
        let err = mgr
            .cancel(release_id, &reviewer, &client(), "again")
            .unwrap_err();
        assert!(matches!(err, EscrowError::InvalidReleaseState { .. }));
    }

    #[test]
    fn partner_store_online_trade_splits_fee() {
        let mut mgr = manager();
        let merchant = AccountId::new();
        let (order_id, seller) =
            seller_order(&mut mgr, SettlementChannel::Online, Some(merchant));
        let release_id = mgr.on_trade_completed(order_id).unwrap();

        let outcome = initiate_and_confirm(&mut mgr, release_id, &admin());

        // 30% of the 5.00 fee.
        let FeeLedgerOutcome::Recorded {
            entry_id,
            merchant_credit,
        } = outcome.fee_ledger
        else {
            panic!("expected recorded fee split");
        };
        assert!(merchant_credit.is_some());
        assert_eq!(mgr.wallets().balance(merchant), Decimal::new(150, 2));
        assert_eq!(mgr.wallets().balance(seller), Decimal::new(10000, 2));

        let entry = mgr.fee_ledger().get(order_id).unwrap();
        assert_eq!(entry.id, entry_id);
        assert_eq!(entry.merchant_cut, Decimal::new(150, 2));
        assert_eq!(entry.platform_cut, Decimal::new(350, 2));
    }

    #[test]
    fn partner_store_in_store_trade_skips_merchant_credit() {
        let mut mgr = manager();
        let merchant = AccountId::new();
        let (order_id, _) =
            seller_order(&mut mgr, SettlementChannel::InStore, Some(merchant));
        let release_id = mgr.on_trade_completed(order_id).unwrap();

        let outcome = initiate_and_confirm(&mut mgr, release_id, &admin());

        let FeeLedgerOutcome::Recorded {
            merchant_credit, ..
        } = outcome.fee_ledger
        else {
            panic!("expected recorded fee split");
        };
        // Ledger entry exists, but the merchant settles outside our wallets.
        assert!(merchant_credit.is_none());
        assert_eq!(mgr.wallets().balance(merchant), Decimal::ZERO);
        assert!(mgr.fee_ledger().contains(order_id));
    }

    #[test]
    fn duplicate_fee_entry_degrades_without_rolling_back_payout() {
        let mut mgr = manager();
        let merchant = AccountId::new();
        let (order_id, seller) =
            seller_order(&mut mgr, SettlementChannel::Online, Some(merchant));
        let release_id = mgr.on_trade_completed(order_id).unwrap();

        // Seed a pre-existing entry for this order, as a retried confirm
        // elsewhere would have left behind.
        let split = split_fee(Decimal::new(500, 2), Decimal::new(30, 0)).unwrap();
        mgr.fee_ledger
            .record(LedgerEntry::from_split(
                order_id,
                None,
                merchant,
                Decimal::new(500, 2),
                split,
            ))
            .unwrap();

        let outcome = initiate_and_confirm(&mut mgr, release_id, &admin());

        // Primary payout committed; the fee step surfaced as degraded.
        assert_eq!(outcome.status, ReleaseStatus::Approved);
        assert_eq!(mgr.wallets().balance(seller), Decimal::new(10000, 2));
        assert!(matches!(
            outcome.fee_ledger,
            FeeLedgerOutcome::Failed { .. }
        ));
        // Exactly one entry for the order, and no merchant credit this round.
        assert_eq!(mgr.fee_ledger().len(), 1);
        assert_eq!(mgr.wallets().balance(merchant), Decimal::ZERO);
    }

    #[test]
    fn refund_flips_escrow_to_refunded() {
        let mut mgr = manager();
        let buyer = AccountId::new();
        let order = Order::new(
            buyer,
            AccountId::new(),
            Decimal::new(10000, 2),
            Decimal::new(500, 2),
            FeePayer::Buyer,
            SettlementChannel::Online,
            None,
            None,
        );
        let order_id = mgr.register_order(order);
        let release_id = mgr
            .create(NewRelease {
                kind: ReleaseKind::RefundFull,
                amount: Decimal::new(10000, 2),
                recipient_id: buyer,
                recipient_kind: RecipientKind::Buyer,
                order_id: Some(order_id),
                dispute_id: None,
                triggered_by: TriggerSource::DisputeResolved,
                reason: "dispute".into(),
            })
            .unwrap();

        initiate_and_confirm(&mut mgr, release_id, &admin());
        assert_eq!(
            mgr.orders().get(order_id).unwrap().escrow_status,
            EscrowStatus::Refunded
        );
        assert_eq!(mgr.wallets().balance(buyer), Decimal::new(10000, 2));
    }

    #[test]
    fn approval_queues_notification() {
        let mut mgr = manager();
        let (order_id, seller) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        initiate_and_confirm(&mut mgr, release_id, &admin());

        let notifications = mgr.drain_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].recipient, seller);
        assert_eq!(notifications[0].kind, NotificationKind::ReleaseApproved);
    }

    #[test]
    fn audit_entry_captures_click_timestamps() {
        let mut mgr = manager();
        let (order_id, _) = seller_order(&mut mgr, SettlementChannel::Online, None);
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        let reviewer = admin();

        let issued_at = Utc::now();
        let (token, _) = mgr.initiate_at(release_id, &reviewer, issued_at).unwrap();
        let confirmed_at = issued_at + chrono::Duration::seconds(37);
        let outcome = mgr
            .confirm_at(release_id, &token, &reviewer, &client(), "", confirmed_at)
            .unwrap();

        let entry = mgr.audit().get(outcome.audit_id).unwrap();
        assert_eq!(entry.first_click_at, Some(issued_at));
        assert_eq!(entry.confirm_click_at, confirmed_at);
        assert_eq!(
            entry.confirmation_latency(),
            Some(chrono::Duration::seconds(37))
        );
    }

    #[test]
    fn wallets_reconcile_after_mixed_operations() {
        let mut mgr = manager();
        let merchant = AccountId::new();
        let (order_id, seller) =
            seller_order(&mut mgr, SettlementChannel::Online, Some(merchant));
        let release_id = mgr.on_trade_completed(order_id).unwrap();
        initiate_and_confirm(&mut mgr, release_id, &admin());

        let withdrawal = mgr
            .request_withdrawal(seller, RecipientKind::Seller, Decimal::new(4000, 2))
            .unwrap();
        initiate_and_confirm(&mut mgr, withdrawal, &admin());

        mgr.wallets().reconcile_all().unwrap();
        assert_eq!(mgr.wallets().balance(seller), Decimal::new(6000, 2));
    }
}
