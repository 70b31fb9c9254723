use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::core::{money, AppError, Result};
use crate::modules::receivables::models::{
    AllocationLine, AllocationPlan, AllocationResult, LedgerEntry, PaymentMethod, Receipt,
};

/// Oldest-debt-first allocation of a payment over a client's ledger entries.
///
/// Planning is pure and all-or-nothing: either the whole payment can be placed,
/// or `OverAllocation` is returned and nothing is touched.
pub struct FifoAllocator;

impl FifoAllocator {
    /// Build the allocation plan for `payment_amount`.
    ///
    /// Eligible entries are open/partial entries of `client_id` with a positive
    /// outstanding balance, restricted to `eligible_ledger_ids` when given. They are
    /// consumed by ascending `ledger_date`, ties broken by ascending `id`.
    ///
    /// # Errors
    /// * `Validation` - payment is not positive or has more than 4 decimal places
    /// * `OverAllocation` - payment exceeds the eligible outstanding total
    ///   (including the case of no eligible entry at all)
    pub fn plan(
        client_id: &str,
        payment_amount: Decimal,
        entries: &[LedgerEntry],
        eligible_ledger_ids: Option<&[String]>,
    ) -> Result<AllocationPlan> {
        if payment_amount <= Decimal::ZERO {
            return Err(AppError::validation(format!(
                "Payment amount must be positive, got: {}",
                payment_amount
            )));
        }
        money::validate_scale("Payment amount", payment_amount).map_err(AppError::Validation)?;

        let selection: Option<HashSet<&str>> =
            eligible_ledger_ids.map(|ids| ids.iter().map(String::as_str).collect());

        let mut eligible: Vec<&LedgerEntry> = entries
            .iter()
            .filter(|e| e.client_id == client_id && e.is_eligible())
            .filter(|e| {
                selection
                    .as_ref()
                    .map_or(true, |ids| ids.contains(e.id.as_str()))
            })
            .collect();

        eligible.sort_by(|a, b| {
            a.ledger_date
                .cmp(&b.ledger_date)
                .then_with(|| a.id.cmp(&b.id))
        });

        let available = money::checked_sum(eligible.iter().map(|e| e.outstanding_amount))
            .ok_or_else(|| AppError::internal("Outstanding balance total overflows"))?;
        if payment_amount > available {
            warn!(
                client_id = client_id,
                requested = %payment_amount,
                available = %available,
                eligible_entries = eligible.len(),
                "Payment exceeds eligible outstanding balance"
            );
            return Err(AppError::OverAllocation {
                requested: payment_amount,
                available,
            });
        }

        let mut remaining = payment_amount;
        let mut lines = Vec::new();

        for entry in eligible {
            if remaining.is_zero() {
                break;
            }

            let applied = remaining.min(entry.outstanding_amount);
            remaining -= applied;

            debug!(
                ledger_entry_id = entry.id.as_str(),
                ledger_date = %entry.ledger_date,
                applied = %applied,
                "Allocating to ledger entry"
            );

            lines.push(AllocationLine {
                ledger_entry_id: entry.id.clone(),
                applied_amount: applied,
            });
        }

        Ok(AllocationPlan {
            client_id: client_id.to_string(),
            payment_amount,
            lines,
        })
    }

    /// Apply a plan to the entries it was built from.
    ///
    /// Returns the decremented entries and one receipt per plan line. Works on
    /// copies; the caller persists the result inside the same transaction the
    /// entries were read in.
    pub fn apply(
        plan: &AllocationPlan,
        entries: &[LedgerEntry],
        date: NaiveDate,
        method: PaymentMethod,
    ) -> Result<AllocationResult> {
        let mut updated_entries = Vec::with_capacity(plan.lines.len());
        let mut receipts = Vec::with_capacity(plan.lines.len());

        for line in &plan.lines {
            let mut entry = entries
                .iter()
                .find(|e| e.id == line.ledger_entry_id)
                .cloned()
                .ok_or_else(|| {
                    AppError::internal(format!(
                        "Planned ledger entry {} missing from locked set",
                        line.ledger_entry_id
                    ))
                })?;

            entry.apply_payment(line.applied_amount)?;

            receipts.push(Receipt::new(
                entry.id.clone(),
                plan.client_id.clone(),
                line.applied_amount,
                date,
                method,
            ));
            updated_entries.push(entry);
        }

        if plan.allocated_total() != plan.payment_amount {
            return Err(AppError::internal(format!(
                "Allocation plan places {} of a {} payment",
                plan.allocated_total(),
                plan.payment_amount
            )));
        }

        Ok(AllocationResult {
            plan: plan.clone(),
            updated_entries,
            receipts,
        })
    }
}
