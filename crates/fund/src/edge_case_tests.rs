// Test file - these are expected patterns in test code
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Edge Case Tests for the Fund Core
//!
//! Tests critical boundary conditions in:
//! - Balance derivation (FUND-B01 to FUND-B04)
//! - Initiation validation (FUND-I01 to FUND-I05)
//! - Webhook reconciliation ordering (FUND-W01 to FUND-W06)
//! - Status projection (FUND-P01 to FUND-P03)

#[cfg(test)]
mod balance_edge_cases {
    use crate::balance;

    // =========================================================================
    // FUND-B01: No contributions at all - total 0, remaining = target
    // =========================================================================
    #[test]
    fn test_fresh_member_balance() {
        let bal = balance::from_total(700, balance::total_paid([]));
        assert_eq!(bal.total_paid, 0);
        assert_eq!(bal.remaining, 700);
    }

    // =========================================================================
    // FUND-B02: Exact target - remaining 0, not negative
    // =========================================================================
    #[test]
    fn test_exact_target_boundary() {
        let bal = balance::from_total(700, balance::total_paid([300, 400]));
        assert_eq!(bal.total_paid, 700);
        assert_eq!(bal.remaining, 0);
    }

    // =========================================================================
    // FUND-B03: Last payment overshoots (allowed by one-payment tolerance)
    // =========================================================================
    #[test]
    fn test_overshoot_clamps_remaining() {
        // 650 paid, remaining 50, final payment of 50 was max allowed;
        // a prior revision allowed up to remaining so sum == target + 0.
        // With target bumped mid-drive, old totals can exceed new target.
        let bal = balance::from_total(700, balance::total_paid([650, 100]));
        assert_eq!(bal.total_paid, 750);
        assert_eq!(bal.remaining, 0);
    }

    // =========================================================================
    // FUND-B04: Adding completed rows never decreases the total
    // =========================================================================
    #[test]
    fn test_monotonic_accumulation() {
        let mut amounts: Vec<i64> = vec![];
        let mut previous = 0;
        for payment in [100, 1, 50_000, 249] {
            amounts.push(payment);
            let total = balance::total_paid(amounts.iter().copied());
            assert!(total > previous);
            previous = total;
        }
    }
}

#[cfg(test)]
mod initiation_edge_cases {
    use crate::error::FundError;
    use crate::initiate::{validate_amount, MAX_AMOUNT, MIN_AMOUNT};
    use crate::phone;

    // =========================================================================
    // FUND-I01: Amount exactly at both bounds is accepted
    // =========================================================================
    #[test]
    fn test_amount_at_bounds() {
        assert!(validate_amount(MIN_AMOUNT).is_ok());
        assert!(validate_amount(MAX_AMOUNT).is_ok());
    }

    // =========================================================================
    // FUND-I02: One unit outside either bound is rejected
    // =========================================================================
    #[test]
    fn test_amount_just_outside_bounds() {
        assert!(validate_amount(MIN_AMOUNT - 1).is_err());
        assert!(validate_amount(MAX_AMOUNT + 1).is_err());
    }

    // =========================================================================
    // FUND-I03: Validation errors are typed, never silently corrected
    // =========================================================================
    #[test]
    fn test_rejection_is_validation_error() {
        assert!(matches!(
            validate_amount(0).unwrap_err(),
            FundError::Validation(_)
        ));
        assert!(matches!(
            phone::normalize("12345").unwrap_err(),
            FundError::Validation(_)
        ));
    }

    // =========================================================================
    // FUND-I04: Phone input with internal whitespace still normalizes
    // =========================================================================
    #[test]
    fn test_phone_whitespace_tolerance() {
        assert_eq!(
            phone::normalize(" +254 712 345 678 ").unwrap(),
            "+254712345678"
        );
    }

    // =========================================================================
    // FUND-I05: Normalization is idempotent
    // =========================================================================
    #[test]
    fn test_phone_normalization_idempotent() {
        let once = phone::normalize("0712345678").unwrap();
        let twice = phone::normalize(&once).unwrap();
        assert_eq!(once, twice);
    }
}

#[cfg(test)]
mod webhook_edge_cases {
    use crate::model::ContributionStatus;
    use crate::webhook::{map_gateway_status, next_status};

    // =========================================================================
    // FUND-W01: Duplicate success delivery leaves the record unchanged
    // =========================================================================
    #[test]
    fn test_duplicate_success_is_noop() {
        let first = next_status(ContributionStatus::Processing, ContributionStatus::Completed);
        assert_eq!(first, Some(ContributionStatus::Completed));
        let replay = next_status(ContributionStatus::Completed, ContributionStatus::Completed);
        assert_eq!(replay, None);
    }

    // =========================================================================
    // FUND-W02: failed after completed must not regress (out-of-order)
    // =========================================================================
    #[test]
    fn test_late_failure_cannot_revert_completed() {
        assert_eq!(
            next_status(ContributionStatus::Completed, ContributionStatus::Failed),
            None
        );
        assert_eq!(
            next_status(
                ContributionStatus::Completed,
                ContributionStatus::Processing
            ),
            None
        );
    }

    // =========================================================================
    // FUND-W03: processing update after failed still allowed (retried charge)
    // =========================================================================
    #[test]
    fn test_failed_is_not_absorbing() {
        assert_eq!(
            next_status(ContributionStatus::Failed, ContributionStatus::Processing),
            Some(ContributionStatus::Processing)
        );
    }

    // =========================================================================
    // FUND-W04: unknown gateway statuses map to processing, never terminal
    // =========================================================================
    #[test]
    fn test_unknown_status_stays_nonterminal() {
        for status in ["queued", "reversed", "send_otp", ""] {
            assert_eq!(
                map_gateway_status(status),
                ContributionStatus::Processing,
                "{status}"
            );
        }
    }

    // =========================================================================
    // FUND-W05: the full delivery matrix for a processing record
    // =========================================================================
    #[test]
    fn test_processing_record_transitions() {
        let stored = ContributionStatus::Processing;
        assert_eq!(
            next_status(stored, map_gateway_status("success")),
            Some(ContributionStatus::Completed)
        );
        assert_eq!(
            next_status(stored, map_gateway_status("abandoned")),
            Some(ContributionStatus::Failed)
        );
        assert_eq!(next_status(stored, map_gateway_status("pending")), None);
    }

    // =========================================================================
    // FUND-W06: 700-target walkthrough at the status level
    // =========================================================================
    #[test]
    fn test_scenario_first_contribution() {
        use crate::balance;
        use crate::projection::{member_status, MemberStatus};

        // Member with target 700 and no history initiates 300.
        let target = 700;
        let before = balance::from_total(target, 0);
        assert!(300 <= before.remaining);

        // Gateway accepts, webhook later reports success.
        let stored = ContributionStatus::Processing;
        let next = next_status(stored, map_gateway_status("success")).unwrap();
        assert_eq!(next, ContributionStatus::Completed);

        // Projection after completion: 300 paid, 400 remaining, in progress.
        let after = balance::from_total(target, 300);
        assert_eq!(after.remaining, 400);
        assert_eq!(
            member_status(after.total_paid, target),
            MemberStatus::InProgress
        );

        // A follow-up initiation of 500 exceeds remaining and must fail.
        assert!(500 > after.remaining);
    }
}

#[cfg(test)]
mod projection_edge_cases {
    use crate::projection::{aggregate_public, member_status, MemberStatus};

    // =========================================================================
    // FUND-P01: one unit below target is still in progress
    // =========================================================================
    #[test]
    fn test_boundary_bucketing() {
        assert_eq!(member_status(699, 700), MemberStatus::InProgress);
        assert_eq!(member_status(700, 700), MemberStatus::Completed);
    }

    // =========================================================================
    // FUND-P02: bucket counts always sum to member count
    // =========================================================================
    #[test]
    fn test_bucket_counts_partition_members() {
        let totals = [700, 1400, 350, 1, 0];
        let stats = aggregate_public(8, &totals, 700);
        assert_eq!(
            stats.completed_count + stats.in_progress_count + stats.not_started_count,
            stats.member_count
        );
    }

    // =========================================================================
    // FUND-P03: zero-amount totals bucket as not started, not in progress
    // =========================================================================
    #[test]
    fn test_zero_total_counts_as_not_started() {
        let stats = aggregate_public(2, &[0], 700);
        assert_eq!(stats.in_progress_count, 0);
        assert_eq!(stats.not_started_count, 2);
    }
}
