//! End-of-run report printed to stdout.

use std::fmt::Write as _;
use std::time::Duration;

use rust_decimal::Decimal;

use repu_core::{AgreementId, LinearPricing, ProviderId};
use repu_strategy::StrategySummary;
use repu_worker::TaskOutcome;

/// What happened to one agreement.
#[derive(Debug, Clone)]
pub struct AgreementReport {
    pub agreement_id: AgreementId,
    pub provider_id: ProviderId,
    pub outcome: String,
    pub amount_due: Decimal,
    pub debit_approved: Decimal,
    pub invoice_approved: Decimal,
}

/// Amount a provider may claim for an activity that ran for `elapsed`.
///
/// Local runs do not meter CPU, so both counters bill wall time, in whole
/// milliseconds.
pub fn billed_amount(pricing: &LinearPricing, elapsed: Duration) -> Decimal {
    let millis = i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX);
    let seconds = Decimal::new(millis, 3);
    pricing.cost(seconds, seconds)
}

/// Short label of an outcome for the report table.
pub fn outcome_label(outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Accepted(_) => "accepted".to_string(),
        TaskOutcome::Failed { reason, .. } => reason.to_string(),
        TaskOutcome::Drained => "no task".to_string(),
    }
}

/// Render the per-agreement table followed by the summary.
pub fn render(reports: &[AgreementReport], summary: &StrategySummary) -> String {
    let mut out = String::new();

    if !reports.is_empty() {
        let _ = writeln!(
            out,
            "{:<38} {:<24} {:>10} {:>10} {:>10}  OUTCOME",
            "AGREEMENT", "PROVIDER", "DUE", "DEBIT", "INVOICE"
        );
        for report in reports {
            let _ = writeln!(
                out,
                "{:<38} {:<24} {:>10} {:>10} {:>10}  {}",
                report.agreement_id.as_str(),
                report.provider_id.as_str(),
                report.amount_due.round_dp(6),
                report.debit_approved.round_dp(6),
                report.invoice_approved.round_dp(6),
                report.outcome
            );
        }
        out.push('\n');
    }

    let _ = writeln!(
        out,
        "offers: {}, providers: {}, scored: {}",
        summary.offers_seen, summary.providers_seen, summary.providers_scored
    );
    let _ = write!(out, "{}", summary);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    use repu_core::{FailureReason, TaskPhase};

    #[test]
    fn test_billed_amount_uses_wall_time() {
        let pricing = LinearPricing::new(dec!(0.5), dec!(0.01), dec!(0.001));
        let due = billed_amount(&pricing, Duration::from_millis(1500));
        assert_eq!(due, dec!(0.5165));
    }

    #[test]
    fn test_billed_amount_saturates_on_huge_durations() {
        let pricing = LinearPricing::new(dec!(1), dec!(0), dec!(0.001));
        let due = billed_amount(&pricing, Duration::MAX);

        let seconds = Decimal::new(i64::MAX, 3);
        assert_eq!(due, dec!(1) + dec!(0.001) * seconds);
        assert!(due > dec!(1));
    }

    #[test]
    fn test_outcome_labels() {
        let timeout = TaskOutcome::Failed {
            task: None,
            reason: FailureReason::Timeout {
                phase: TaskPhase::WarmingUp,
            },
        };
        assert_eq!(outcome_label(&timeout), "timeout while warming_up");
        assert_eq!(outcome_label(&TaskOutcome::Drained), "no task");
    }

    #[test]
    fn test_render_ends_with_summary() {
        let reports = vec![AgreementReport {
            agreement_id: AgreementId::new("agr-1"),
            provider_id: ProviderId::new("0xprovider0001"),
            outcome: "accepted".to_string(),
            amount_due: dec!(0.25),
            debit_approved: dec!(0.25),
            invoice_approved: dec!(0.25),
        }];
        let summary = StrategySummary {
            offers_seen: 4,
            payable_agreements: 1,
            ..StrategySummary::default()
        };

        let text = render(&reports, &summary);
        assert!(text.starts_with("AGREEMENT"));
        assert!(text.contains("0xprovider0001"));
        assert!(text.contains("offers: 4,"));
        let tail = "PAYABLE AGREEMENTS: 1\nFAILED ACTIVITIES: 0";
        assert!(text.ends_with(tail));
    }

    #[test]
    fn test_render_without_agreements() {
        let text = render(&[], &StrategySummary::default());
        assert!(!text.contains("AGREEMENT "));
        assert!(text.starts_with("offers: 0"));
    }
}
