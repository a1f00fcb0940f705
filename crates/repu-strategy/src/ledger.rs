//! Payment bookkeeping: which agreements and activities may be paid.

use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use repu_core::{ActivityId, AgreementId, DebitNote, Invoice};

/// Append-only payment eligibility sets.
///
/// An activity is either failed or (through its agreement) payable, never
/// both: whichever outcome is recorded first wins.
#[derive(Debug, Default)]
pub struct PaymentLedger {
    payable_agreements: HashSet<AgreementId>,
    payable_activities: HashSet<ActivityId>,
    failed_activities: HashSet<ActivityId>,
}

impl PaymentLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a verified task. Returns false if the activity already failed.
    pub fn mark_accepted(&mut self, agreement_id: &AgreementId, activity_id: &ActivityId) -> bool {
        if self.failed_activities.contains(activity_id) {
            warn!(
                agreement_id = %agreement_id,
                activity_id = %activity_id,
                "Ignoring acceptance of a failed activity"
            );
            return false;
        }
        self.payable_agreements.insert(agreement_id.clone());
        self.payable_activities.insert(activity_id.clone());
        true
    }

    /// Record a failed activity. Returns false if it was already accepted.
    pub fn mark_failed(&mut self, activity_id: &ActivityId) -> bool {
        if self.payable_activities.contains(activity_id) {
            warn!(activity_id = %activity_id, "Ignoring failure of an accepted activity");
            return false;
        }
        self.failed_activities.insert(activity_id.clone());
        true
    }

    pub fn is_agreement_payable(&self, agreement_id: &AgreementId) -> bool {
        self.payable_agreements.contains(agreement_id)
    }

    pub fn is_activity_failed(&self, activity_id: &ActivityId) -> bool {
        self.failed_activities.contains(activity_id)
    }

    /// Approved amount of a debit note: nothing for failed activities.
    pub fn approved_debit_amount(&self, debit_note: &DebitNote) -> Decimal {
        if self.is_activity_failed(&debit_note.activity_id) {
            Decimal::ZERO
        } else {
            debit_note.total_amount_due
        }
    }

    /// Approved amount of an invoice: only payable agreements are paid.
    pub fn approved_invoice_amount(&self, invoice: &Invoice) -> Decimal {
        if self.is_agreement_payable(&invoice.agreement_id) {
            invoice.amount
        } else {
            Decimal::ZERO
        }
    }

    pub fn payable_agreements(&self) -> usize {
        self.payable_agreements.len()
    }

    pub fn payable_activities(&self) -> usize {
        self.payable_activities.len()
    }

    pub fn failed_activities(&self) -> usize {
        self.failed_activities.len()
    }
}

/// Counters describing a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StrategySummary {
    pub offers_seen: usize,
    pub providers_seen: usize,
    pub providers_scored: usize,
    pub payable_agreements: usize,
    pub payable_activities: usize,
    pub failed_activities: usize,
}

impl fmt::Display for StrategySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "PAYABLE AGREEMENTS: {}", self.payable_agreements)?;
        write!(f, "FAILED ACTIVITIES: {}", self.failed_activities)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_failed_activity_is_never_paid() {
        let mut ledger = PaymentLedger::new();
        let agreement = AgreementId::new("agr-1");
        let activity = ActivityId::new("act-1");

        assert!(ledger.mark_failed(&activity));
        assert!(!ledger.mark_accepted(&agreement, &activity));

        let note = DebitNote::new(agreement.clone(), activity, dec!(0.3));
        assert_eq!(ledger.approved_debit_amount(&note), Decimal::ZERO);

        let invoice = Invoice::new(agreement, dec!(0.3));
        assert_eq!(ledger.approved_invoice_amount(&invoice), Decimal::ZERO);
    }

    #[test]
    fn test_accepted_agreement_is_paid_in_full() {
        let mut ledger = PaymentLedger::new();
        let agreement = AgreementId::new("agr-1");
        let activity = ActivityId::new("act-1");

        assert!(ledger.mark_accepted(&agreement, &activity));
        assert!(!ledger.mark_failed(&activity));

        let note = DebitNote::new(agreement.clone(), activity, dec!(0.25));
        assert_eq!(ledger.approved_debit_amount(&note), dec!(0.25));

        let invoice = Invoice::new(agreement, dec!(0.5));
        assert_eq!(ledger.approved_invoice_amount(&invoice), dec!(0.5));
        assert_eq!(ledger.payable_agreements(), 1);
        assert_eq!(ledger.payable_activities(), 1);
        assert_eq!(ledger.failed_activities(), 0);
    }

    #[test]
    fn test_unknown_documents() {
        let ledger = PaymentLedger::new();

        // Debit notes are paid unless flagged; invoices only when payable.
        let note = DebitNote::new(AgreementId::new("a"), ActivityId::new("b"), dec!(1));
        assert_eq!(ledger.approved_debit_amount(&note), dec!(1));

        let invoice = Invoice::new(AgreementId::new("a"), dec!(1));
        assert_eq!(ledger.approved_invoice_amount(&invoice), Decimal::ZERO);
    }

    #[test]
    fn test_summary_display() {
        let summary = StrategySummary {
            payable_agreements: 2,
            failed_activities: 1,
            ..StrategySummary::default()
        };
        assert_eq!(
            summary.to_string(),
            "PAYABLE AGREEMENTS: 2\nFAILED ACTIVITIES: 1"
        );
    }
}
