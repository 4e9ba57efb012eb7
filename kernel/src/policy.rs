use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};
use vodca::References;

use crate::entity::{
    ActiveRentals, DueAt, LateFeeMultiplier, Penalty, Plan, Quota, Rental, RentalLimit, RentedAt,
};

const DAY_MILLIS: i128 = 86_400_000;

/// What a plan allows: how many open rentals, for how long, and how much lateness costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, References)]
pub struct RentalPolicy {
    rental_limit: RentalLimit,
    loan_duration: Option<Duration>,
    late_fee_multiplier: LateFeeMultiplier,
}

impl RentalPolicy {
    pub fn new(
        rental_limit: RentalLimit,
        loan_duration: Option<Duration>,
        late_fee_multiplier: LateFeeMultiplier,
    ) -> Self {
        Self {
            rental_limit,
            loan_duration,
            late_fee_multiplier,
        }
    }

    pub fn quota(&self, active_rentals: ActiveRentals) -> Quota {
        Quota::new(active_rentals, self.rental_limit)
    }

    /// `None` when the plan sets no maximum loan duration.
    pub fn due_at(&self, rented_at: &RentedAt) -> Option<DueAt> {
        self.loan_duration
            .map(|duration| DueAt::new(*rented_at.as_ref() + duration))
    }

    pub fn penalty(&self, due_at: Option<&DueAt>, now: &OffsetDateTime) -> Penalty {
        self.late_fee_multiplier.penalty(due_at, now)
    }
}

impl LateFeeMultiplier {
    /// `days_late × multiplier` once `now` is past `due_at`, zero otherwise.
    pub fn penalty(&self, due_at: Option<&DueAt>, now: &OffsetDateTime) -> Penalty {
        match due_at {
            Some(due_at) if due_at.as_ref() < now => {
                let days = Decimal::from(days_late(due_at, now));
                Penalty::new(days * *self.as_ref())
            }
            _ => Penalty::zero(),
        }
    }

    /// Fee accrued so far by a rental that is still out. Returned rentals settled theirs.
    pub fn current_penalty(&self, rental: &Rental, now: &OffsetDateTime) -> Penalty {
        if rental.is_open() {
            self.penalty(rental.due_at().as_ref(), now)
        } else {
            Penalty::zero()
        }
    }
}

impl From<&Plan> for RentalPolicy {
    fn from(plan: &Plan) -> Self {
        Self::new(
            *plan.rental_limit(),
            plan.loan_days().map(|days| days.duration()),
            plan.late_fee_multiplier(),
        )
    }
}

/// Whole days between `due_at` and `now`, rounded to nearest with halves going up.
/// Zero when `now` is not past `due_at`.
pub fn days_late(due_at: &DueAt, now: &OffsetDateTime) -> i64 {
    let millis = (*now - *due_at.as_ref()).whole_milliseconds();
    if millis <= 0 {
        return 0;
    }
    let days = (millis + DAY_MILLIS / 2) / DAY_MILLIS;
    i64::try_from(days).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod test {
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use time::Duration;

    use crate::entity::{
        ActiveRentals, CopyId, CustomerId, DueAt, LateFeeMultiplier, LoanDays, Penalty, Plan,
        PlanCode, PlanCost, PlanName, Rental, RentalId, RentalLimit, RentalStatus, RentedAt,
        ReturnedAt,
    };
    use crate::policy::{days_late, RentalPolicy};

    fn plan(code: &str, limit: i32, loan_days: Option<i32>) -> Plan {
        Plan::new(
            PlanCode::new(code),
            PlanName::new(format!("plan {code}")),
            PlanCost::new(Decimal::new(999, 2)),
            RentalLimit::new(limit),
            loan_days.map(LoanDays::new),
        )
    }

    #[test]
    fn multiplier_table() {
        assert_eq!(
            LateFeeMultiplier::for_plan(&PlanCode::new("D")),
            LateFeeMultiplier::new(Decimal::TWO)
        );
        assert_eq!(
            LateFeeMultiplier::for_plan(&PlanCode::new("I")),
            LateFeeMultiplier::new(Decimal::new(15, 1))
        );
        assert_eq!(
            LateFeeMultiplier::for_plan(&PlanCode::new("A")),
            LateFeeMultiplier::new(Decimal::ONE)
        );
        assert_eq!(
            LateFeeMultiplier::for_plan(&PlanCode::new("Z")),
            LateFeeMultiplier::new(Decimal::ONE)
        );
    }

    #[test]
    fn policy_from_plan() {
        let policy = RentalPolicy::from(&plan("I", 5, Some(7)));
        assert_eq!(policy.rental_limit(), &RentalLimit::new(5));
        assert_eq!(policy.loan_duration(), &Some(Duration::days(7)));

        let unlimited = RentalPolicy::from(&plan("A", 10, None));
        let rented_at = RentedAt::new(datetime!(2024-03-01 10:00 UTC));
        assert_eq!(unlimited.due_at(&rented_at), None);
        assert_eq!(
            policy.due_at(&rented_at),
            Some(DueAt::new(datetime!(2024-03-08 10:00 UTC)))
        );
    }

    #[test]
    fn rounding_goes_half_up() {
        let due_at = DueAt::new(datetime!(2024-03-01 00:00 UTC));
        assert_eq!(days_late(&due_at, &datetime!(2024-02-28 00:00 UTC)), 0);
        assert_eq!(days_late(&due_at, &datetime!(2024-03-01 11:59 UTC)), 0);
        assert_eq!(days_late(&due_at, &datetime!(2024-03-01 12:00 UTC)), 1);
        assert_eq!(days_late(&due_at, &datetime!(2024-03-03 11:00 UTC)), 2);
        assert_eq!(days_late(&due_at, &datetime!(2024-03-03 13:00 UTC)), 3);
    }

    #[test]
    fn beginner_plan_pays_double() {
        let policy = RentalPolicy::from(&plan("D", 2, Some(3)));
        let due_at = DueAt::new(datetime!(2024-03-01 00:00 UTC));
        let now = datetime!(2024-03-04 02:00 UTC);
        assert_eq!(
            policy.penalty(Some(&due_at), &now),
            Penalty::new(Decimal::from(6))
        );
    }

    #[test]
    fn intermediate_plan_keeps_fraction() {
        let policy = RentalPolicy::from(&plan("I", 2, Some(3)));
        let due_at = DueAt::new(datetime!(2024-03-01 00:00 UTC));
        let now = datetime!(2024-03-02 00:00 UTC);
        assert_eq!(
            policy.penalty(Some(&due_at), &now),
            Penalty::new(Decimal::new(15, 1))
        );
    }

    #[test]
    fn no_penalty_without_due_date_or_before_it() {
        let policy = RentalPolicy::from(&plan("D", 2, Some(3)));
        let now = datetime!(2024-03-04 02:00 UTC);
        assert!(policy.penalty(None, &now).is_zero());
        let due_at = DueAt::new(datetime!(2024-03-05 00:00 UTC));
        assert!(policy.penalty(Some(&due_at), &now).is_zero());
    }

    #[test]
    fn quota_boundary() {
        let policy = RentalPolicy::from(&plan("D", 2, Some(3)));
        assert!(policy.quota(ActiveRentals::new(1)).can_rent());
        assert!(!policy.quota(ActiveRentals::new(2)).can_rent());
    }

    #[test]
    fn status_and_current_penalty() {
        let policy = RentalPolicy::from(&plan("D", 2, Some(3)));
        let rental = Rental::new(
            RentalId::new(1),
            CustomerId::new(1),
            CopyId::new("C-1"),
            RentedAt::new(datetime!(2024-03-01 00:00 UTC)),
            Some(DueAt::new(datetime!(2024-03-04 00:00 UTC))),
            None,
        );
        let before = datetime!(2024-03-03 00:00 UTC);
        let after = datetime!(2024-03-06 00:00 UTC);
        assert_eq!(rental.status(&before), RentalStatus::Ongoing);
        assert_eq!(rental.status(&after), RentalStatus::Overdue);
        assert_eq!(
            policy.late_fee_multiplier().current_penalty(&rental, &after),
            Penalty::new(Decimal::from(4))
        );

        let returned = rental.reconstruct(|r| {
            r.returned_at = Some(ReturnedAt::new(datetime!(2024-03-05 00:00 UTC)))
        });
        assert_eq!(returned.status(&after), RentalStatus::Returned);
        assert!(policy
            .late_fee_multiplier()
            .current_penalty(&returned, &after)
            .is_zero());
    }
}
