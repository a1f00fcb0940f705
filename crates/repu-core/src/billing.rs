//! Billing documents sent by providers.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ids::{ActivityId, AgreementId};

/// Interim billing document tied to one activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebitNote {
    /// Document identifier.
    pub id: String,
    /// Agreement the activity runs under.
    pub agreement_id: AgreementId,
    /// Activity being billed.
    pub activity_id: ActivityId,
    /// Amount claimed so far.
    pub total_amount_due: Decimal,
}

impl DebitNote {
    /// Create a new debit note.
    pub fn new(
        agreement_id: AgreementId,
        activity_id: ActivityId,
        total_amount_due: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agreement_id,
            activity_id,
            total_amount_due,
        }
    }
}

/// Final billing document tied to one agreement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Document identifier.
    pub id: String,
    /// Agreement being billed.
    pub agreement_id: AgreementId,
    /// Amount claimed.
    pub amount: Decimal,
}

impl Invoice {
    /// Create a new invoice.
    pub fn new(agreement_id: AgreementId, amount: Decimal) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agreement_id,
            amount,
        }
    }
}
