use strum_macros::Display;

use crate::engine::error::EngineError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl LeaveStatus {
    /// `pending` is the only state a decision can move out of. Approved and
    /// rejected requests are final; resubmitting means a new request.
    pub fn transition(self, decision: Decision) -> Result<LeaveStatus, EngineError> {
        match (self, decision) {
            (LeaveStatus::Pending, Decision::Approve) => Ok(LeaveStatus::Approved),
            (LeaveStatus::Pending, Decision::Reject) => Ok(LeaveStatus::Rejected),
            (current, _) => Err(EngineError::StaleState { current }),
        }
    }

    pub fn is_final(self) -> bool {
        !matches!(self, LeaveStatus::Pending)
    }
}

impl LeaveRequest {
    /// Applies `decision` and records who made it. The balance needs no
    /// adjustment: approval keeps counting the already-counted pending days,
    /// rejection drops them from the next recompute.
    pub fn decide(&mut self, decision: Decision, reviewer: u64) -> Result<LeaveStatus, EngineError> {
        let next = self.status.transition(decision)?;
        self.status = next;
        self.reviewed_by = Some(reviewer);
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::calendar::LeavePeriod;
    use crate::engine::ledger::{can_submit, recompute_balance, DEFAULT_LOW_BALANCE_THRESHOLD};
    use crate::model::leave_request::LeaveKind;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn pending(id: u64, day: u32, days: Decimal) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 3,
            kind: LeaveKind::FullDay {
                date: NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            },
            reason: "family".into(),
            status: LeaveStatus::Pending,
            requested_days: days,
            created_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn pending_moves_to_either_final_state() {
        assert_eq!(
            LeaveStatus::Pending.transition(Decision::Approve),
            Ok(LeaveStatus::Approved)
        );
        assert_eq!(
            LeaveStatus::Pending.transition(Decision::Reject),
            Ok(LeaveStatus::Rejected)
        );
    }

    #[test]
    fn final_states_do_not_move() {
        for current in [LeaveStatus::Approved, LeaveStatus::Rejected] {
            assert!(current.is_final());
            for decision in [Decision::Approve, Decision::Reject] {
                assert_eq!(
                    current.transition(decision),
                    Err(EngineError::StaleState { current })
                );
            }
        }
    }

    #[test]
    fn decide_records_reviewer() {
        let mut request = pending(1, 3, dec!(1));
        assert_eq!(request.decide(Decision::Approve, 42), Ok(LeaveStatus::Approved));
        assert_eq!(request.reviewed_by, Some(42));
    }

    #[test]
    fn second_rejection_is_stale_and_frees_nothing_twice() {
        let period = LeavePeriod::new(2025, 3).unwrap();
        let mut requests = vec![pending(1, 3, dec!(1)), pending(2, 4, dec!(1))];

        requests[0].decide(Decision::Reject, 9).unwrap();
        let after_first = recompute_balance(3, period, dec!(4), &requests);

        let err = requests[0].decide(Decision::Reject, 10).unwrap_err();
        assert_eq!(
            err,
            EngineError::StaleState {
                current: LeaveStatus::Rejected
            }
        );
        assert_eq!(requests[0].reviewed_by, Some(9));
        assert_eq!(recompute_balance(3, period, dec!(4), &requests), after_first);
        assert_eq!(after_first.used_leaves, dec!(1));
    }

    #[test]
    fn balance_identity_holds_through_any_sequence() {
        let period = LeavePeriod::new(2025, 3).unwrap();
        let allowed = dec!(4);
        let mut requests: Vec<LeaveRequest> = Vec::new();
        let costs = [dec!(1), dec!(0.5), dec!(1), dec!(2), dec!(0.5), dec!(1)];

        for (i, cost) in costs.into_iter().enumerate() {
            let balance = recompute_balance(3, period, allowed, &requests);
            assert_eq!(balance.remaining_leaves + balance.used_leaves, allowed);

            if can_submit(&balance, cost, DEFAULT_LOW_BALANCE_THRESHOLD).is_ok() {
                requests.push(pending(i as u64 + 1, 3 + i as u32, cost));
            }
            let decision = if i % 2 == 0 { Decision::Approve } else { Decision::Reject };
            if let Some(last) = requests.last_mut() {
                let _ = last.decide(decision, 1);
            }

            let balance = recompute_balance(3, period, allowed, &requests);
            assert_eq!(balance.remaining_leaves + balance.used_leaves, allowed);
            assert!(balance.used_leaves >= Decimal::ZERO);
            assert!(balance.used_leaves <= allowed);
        }
    }
}
