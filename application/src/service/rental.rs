use error_stack::Report;
use kernel::interface::clock::{Clock, DependOnClock};
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};
use kernel::interface::query::{
    CopyQuery, CustomerQuery, DependOnCopyQuery, DependOnCustomerQuery, DependOnPlanQuery,
    DependOnQuotaQuery, DependOnRentalQuery, PlanQuery, QuotaQuery, RentalQuery,
};
use kernel::interface::update::{
    CopyModifier, DependOnCopyModifier, DependOnRentalModifier, RentalModifier,
};
use kernel::prelude::entity::{
    CopyId, CustomerId, FilmId, IsAvailable, LateFeeMultiplier, Penalty, Rental, RentedAt,
    ReturnedAt,
};
use kernel::prelude::policy::RentalPolicy;
use kernel::KernelError;

use crate::service::settle;
use crate::transfer::{
    CheckQuotaDto, ClientRentalDto, GetClientRentalsDto, QuotaDto, RentFilmDto, RentalDto,
    ReturnCopyDto, ReturnDto,
};

#[async_trait::async_trait]
pub trait RentService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnClock
    + DependOnCustomerQuery
    + DependOnPlanQuery
    + DependOnCopyQuery
    + DependOnRentalQuery
    + DependOnCopyModifier
    + DependOnRentalModifier
{
    /// Checks, in order, that the customer and its plan exist, that the plan quota leaves
    /// room, and that a copy is free. The first failing check decides the error.
    async fn rent_film(&self, dto: RentFilmDto) -> error_stack::Result<RentalDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let customer_id = CustomerId::new(dto.customer_id);
        let film_id = FilmId::new(dto.film_id);
        let result: error_stack::Result<Rental, KernelError> = async {
            let customer = self
                .customer_query()
                .lock_by_id(&mut con, &customer_id)
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound)
                        .attach_printable(format!("Customer {} not found", dto.customer_id))
                })?;
            let plan = self
                .plan_query()
                .find_by_code(&mut con, customer.plan_code())
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound).attach_printable(format!(
                        "Plan {} of customer {} not found",
                        customer.plan_code().as_ref(),
                        dto.customer_id
                    ))
                })?;
            let policy = RentalPolicy::from(&plan);

            let active = self
                .rental_query()
                .count_open_by_customer_id(&mut con, &customer_id)
                .await?;
            if !policy.quota(active).can_rent() {
                return Err(Report::new(KernelError::QuotaExceeded).attach_printable(format!(
                    "Customer {} already has {} open rentals",
                    dto.customer_id,
                    active.as_ref()
                )));
            }

            let mut copy = self
                .copy_query()
                .lock_available_by_film_id(&mut con, &film_id)
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NoAvailableCopy)
                        .attach_printable(format!("Film {} has no free copy", dto.film_id))
                })?;

            let rented_at = RentedAt::new(self.clock().now());
            let due_at = policy.due_at(&rented_at);
            let id = self.rental_modifier().next_id(&mut con).await?;
            let rental = Rental::new(
                id,
                customer_id,
                copy.id().clone(),
                rented_at,
                due_at,
                None,
            );
            self.rental_modifier().create(&mut con, &rental).await?;

            copy.substitute(|copy| *copy.available = IsAvailable::new(false));
            self.copy_modifier().update(&mut con, &copy).await?;
            Ok(rental)
        }
        .await;

        let rental = settle(con, result).await?;
        tracing::info!(
            "Customer {} rented copy {} (rental {})",
            dto.customer_id,
            rental.copy_id().as_ref(),
            rental.id().as_ref()
        );
        Ok(RentalDto::from(rental))
    }
}

impl<T> RentService for T where
    T: DependOnDatabaseConnection
        + DependOnClock
        + DependOnCustomerQuery
        + DependOnPlanQuery
        + DependOnCopyQuery
        + DependOnRentalQuery
        + DependOnCopyModifier
        + DependOnRentalModifier
{
}

#[async_trait::async_trait]
pub trait ReturnService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnClock
    + DependOnCustomerQuery
    + DependOnCopyQuery
    + DependOnRentalQuery
    + DependOnCopyModifier
    + DependOnRentalModifier
{
    /// Closes the open rental of the copy and reports the late fee owed.
    ///
    /// A copy that was never rented and one that is already back are indistinguishable
    /// and both fail with `NotFound`.
    async fn return_copy(&self, dto: ReturnCopyDto) -> error_stack::Result<ReturnDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let copy_id = CopyId::new(dto.copy_id);
        let result: error_stack::Result<(Penalty, ReturnedAt), KernelError> = async {
            let mut rental = self
                .rental_query()
                .lock_open_by_copy_id(&mut con, &copy_id)
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound).attach_printable(format!(
                        "No open rental for copy {}",
                        copy_id.as_ref()
                    ))
                })?;

            let now = self.clock().now();
            let returned_at = ReturnedAt::new(now);
            rental.substitute(|rental| *rental.returned_at = Some(returned_at));
            self.rental_modifier().update(&mut con, &rental).await?;

            let mut copy = self
                .copy_query()
                .find_by_id(&mut con, &copy_id)
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound)
                        .attach_printable(format!("Copy {} not found", copy_id.as_ref()))
                })?;
            copy.substitute(|copy| *copy.available = IsAvailable::new(true));
            self.copy_modifier().update(&mut con, &copy).await?;

            let customer = self
                .customer_query()
                .find_by_id(&mut con, rental.customer_id())
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound).attach_printable(format!(
                        "Customer {} of rental {} not found",
                        rental.customer_id().as_ref(),
                        rental.id().as_ref()
                    ))
                })?;
            let penalty = LateFeeMultiplier::for_plan(customer.plan_code())
                .penalty(rental.due_at().as_ref(), &now);
            Ok((penalty, returned_at))
        }
        .await;

        let (penalty, returned_at) = settle(con, result).await?;
        tracing::info!(
            "Copy {} returned with penalty {}",
            copy_id.as_ref(),
            penalty.as_ref()
        );
        Ok(ReturnDto::new(penalty, returned_at))
    }
}

impl<T> ReturnService for T where
    T: DependOnDatabaseConnection
        + DependOnClock
        + DependOnCustomerQuery
        + DependOnCopyQuery
        + DependOnRentalQuery
        + DependOnCopyModifier
        + DependOnRentalModifier
{
}

#[async_trait::async_trait]
pub trait GetRentalService:
    'static
    + Sync
    + Send
    + DependOnDatabaseConnection
    + DependOnClock
    + DependOnRentalQuery
    + DependOnQuotaQuery
{
    async fn get_client_rentals(
        &self,
        dto: GetClientRentalsDto,
    ) -> error_stack::Result<Vec<ClientRentalDto>, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let customer_id = CustomerId::new(dto.customer_id);
        let result = self
            .rental_query()
            .find_by_customer_id(&mut con, &customer_id)
            .await;
        let records = settle(con, result).await?;

        let now = self.clock().now();
        Ok(records
            .into_iter()
            .map(|record| {
                let rental = record.rental();
                let penalty =
                    LateFeeMultiplier::for_plan(record.plan_code()).current_penalty(rental, &now);
                let status = rental.status(&now);
                ClientRentalDto::new(record, penalty, status)
            })
            .collect())
    }

    /// Advisory pre-flight for `rent_film`. Nothing is locked or written.
    async fn check_quota(&self, dto: CheckQuotaDto) -> error_stack::Result<QuotaDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let customer_id = CustomerId::new(dto.customer_id);
        let result = self
            .quota_query()
            .find_by_customer_id(&mut con, &customer_id)
            .await
            .and_then(|quota| {
                quota.ok_or_else(|| {
                    Report::new(KernelError::NotFound)
                        .attach_printable(format!("Customer {} not found", dto.customer_id))
                })
            });

        settle(con, result).await.map(QuotaDto::from)
    }
}

impl<T> GetRentalService for T where
    T: DependOnDatabaseConnection + DependOnClock + DependOnRentalQuery + DependOnQuotaQuery
{
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use driver::database::{InMemoryDatabase, InMemoryRentalRepository, Seed, Snapshot};
    use kernel::interface::clock::DependOnClock;
    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::{CustomerQuery, DependOnCustomerQuery};
    use kernel::interface::update::RentalModifier;
    use kernel::prelude::entity::{CopyId, CustomerId, Rental, RentalStatus, RentedAt};
    use kernel::KernelError;
    use rust_decimal::Decimal;
    use time::macros::datetime;
    use time::Duration;

    use crate::service::{GetRentalService, RentService, ReturnService};
    use crate::transfer::{CheckQuotaDto, GetClientRentalsDto, QuotaDto, RentFilmDto, ReturnCopyDto};

    fn store() -> error_stack::Result<InMemoryDatabase, KernelError> {
        let db = InMemoryDatabase::new();
        db.clock().set(datetime!(2024-03-01 10:00 UTC));
        db.seed(
            Seed::new()
                .plan("D", 2, Some(3))
                .plan("A", 10, None)
                .customer(1, "D")
                .customer(2, "A")
                .customer(3, "X")
                .film(10, "Alien")
                .copy("ALN-1", 10, true)
                .copy("ALN-2", 10, true)
                .film(20, "Heat")
                .copy("HEA-1", 20, true)
                .film(30, "Ran")
                .copy("RAN-1", 30, true)
                .film(40, "Solaris"),
        )?;
        Ok(db)
    }

    fn rent(customer_id: i64, film_id: i64) -> RentFilmDto {
        RentFilmDto {
            customer_id,
            film_id,
        }
    }

    fn give_back(copy_id: &str) -> ReturnCopyDto {
        ReturnCopyDto {
            copy_id: copy_id.to_string(),
        }
    }

    fn kind<T>(result: error_stack::Result<T, KernelError>) -> Option<KernelError> {
        result.err().map(|report| *report.current_context())
    }

    fn assert_consistent(snapshot: &Snapshot) {
        for copy in snapshot.copies() {
            let open = snapshot
                .rentals()
                .filter(|rental| rental.is_open() && rental.copy_id() == copy.id())
                .count();
            assert!(open <= 1, "copy {:?} rented twice", copy.id());
            assert_eq!(copy.is_available(), open == 0, "copy {:?}", copy.id());
        }
    }

    #[tokio::test]
    async fn rent_then_return_on_time() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        let rental = db.rent_film(rent(1, 20)).await?;
        assert_eq!(rental.copy_id, "HEA-1");
        assert_eq!(rental.customer_id, 1);
        assert_eq!(rental.rented_at, datetime!(2024-03-01 10:00 UTC));
        assert_eq!(rental.due_at, Some(datetime!(2024-03-04 10:00 UTC)));

        let snapshot = db.snapshot()?;
        assert_eq!(snapshot.copy("HEA-1").map(|c| c.is_available()), Some(false));
        assert_consistent(&snapshot);

        db.clock().advance(Duration::days(1));
        let returned = db.return_copy(give_back(&rental.copy_id)).await?;
        assert_eq!(returned.penalty, Decimal::ZERO);
        assert_eq!(returned.returned_at, datetime!(2024-03-02 10:00 UTC));

        let snapshot = db.snapshot()?;
        assert_eq!(snapshot.copy("HEA-1").map(|c| c.is_available()), Some(true));
        assert_consistent(&snapshot);
        Ok(())
    }

    #[tokio::test]
    async fn late_return_on_beginner_plan() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        let rental = db.rent_film(rent(1, 30)).await?;
        db.clock().set(datetime!(2024-03-07 12:00 UTC));

        let returned = db.return_copy(give_back(&rental.copy_id)).await?;
        assert_eq!(returned.penalty, Decimal::from(6));
        Ok(())
    }

    #[tokio::test]
    async fn plan_without_due_date_never_pays() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        let rental = db.rent_film(rent(2, 30)).await?;
        assert_eq!(rental.due_at, None);

        db.clock().advance(Duration::days(100));
        let returned = db.return_copy(give_back(&rental.copy_id)).await?;
        assert_eq!(returned.penalty, Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn quota_boundary() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        let first = db.rent_film(rent(1, 10)).await?;
        db.rent_film(rent(1, 20)).await?;
        assert_eq!(
            kind(db.rent_film(rent(1, 30)).await),
            Some(KernelError::QuotaExceeded)
        );

        db.return_copy(give_back(&first.copy_id)).await?;
        let third = db.rent_film(rent(1, 30)).await?;
        assert_eq!(third.copy_id, "RAN-1");
        assert_consistent(&db.snapshot()?);
        Ok(())
    }

    #[tokio::test]
    async fn first_failing_check_wins() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        assert_eq!(
            kind(db.rent_film(rent(99, 10)).await),
            Some(KernelError::NotFound)
        );
        assert_eq!(
            kind(db.rent_film(rent(3, 10)).await),
            Some(KernelError::NotFound)
        );
        assert_eq!(
            kind(db.rent_film(rent(2, 40)).await),
            Some(KernelError::NoAvailableCopy)
        );
        assert_eq!(
            kind(db.rent_film(rent(2, 404)).await),
            Some(KernelError::NoAvailableCopy)
        );

        db.rent_film(rent(1, 10)).await?;
        db.rent_film(rent(1, 10)).await?;
        assert_eq!(
            kind(db.rent_film(rent(1, 40)).await),
            Some(KernelError::QuotaExceeded)
        );
        Ok(())
    }

    #[tokio::test]
    async fn failed_rent_leaves_store_untouched() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        db.rent_film(rent(2, 20)).await?;
        let before = db.snapshot()?;

        assert!(db.rent_film(rent(99, 10)).await.is_err());
        assert!(db.rent_film(rent(3, 10)).await.is_err());
        assert!(db.rent_film(rent(1, 20)).await.is_err());
        assert!(db.rent_film(rent(2, 40)).await.is_err());

        assert_eq!(db.snapshot()?, before);
        Ok(())
    }

    #[tokio::test]
    async fn return_requires_open_rental() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        assert_eq!(
            kind(db.return_copy(give_back("NOPE-1")).await),
            Some(KernelError::NotFound)
        );
        assert_eq!(
            kind(db.return_copy(give_back("ALN-1")).await),
            Some(KernelError::NotFound)
        );

        let rental = db.rent_film(rent(1, 10)).await?;
        db.return_copy(give_back(&rental.copy_id)).await?;
        let before = db.snapshot()?;
        assert_eq!(
            kind(db.return_copy(give_back(&rental.copy_id)).await),
            Some(KernelError::NotFound)
        );
        assert_eq!(db.snapshot()?, before);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_rents_never_share_a_copy() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut seed = Seed::new()
            .plan("A", 10, None)
            .film(50, "Stalker")
            .copy("STK-1", 50, true)
            .copy("STK-2", 50, true)
            .copy("STK-3", 50, true);
        for customer_id in 1..=10 {
            seed = seed.customer(customer_id, "A");
        }
        db.seed(seed)?;

        let handles = (1..=10)
            .map(|customer_id| {
                let db = db.clone();
                tokio::spawn(async move { db.rent_film(rent(customer_id, 50)).await })
            })
            .collect::<Vec<_>>();

        let mut copies = HashSet::new();
        let mut unavailable = 0;
        for handle in handles {
            match handle.await.expect("rent task panicked") {
                Ok(rental) => assert!(copies.insert(rental.copy_id), "copy handed out twice"),
                Err(report) => {
                    assert_eq!(report.current_context(), &KernelError::NoAvailableCopy);
                    unavailable += 1;
                }
            }
        }
        assert_eq!(copies.len(), 3);
        assert_eq!(unavailable, 7);
        assert_consistent(&db.snapshot()?);
        Ok(())
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_rents_respect_quota() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        let mut seed = Seed::new().plan("D", 2, Some(3)).customer(1, "D").film(60, "Ikiru");
        for index in 1..=5 {
            seed = seed.copy(format!("IKR-{index}"), 60, true);
        }
        db.seed(seed)?;

        let handles = (0..5)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move { db.rent_film(rent(1, 60)).await })
            })
            .collect::<Vec<_>>();

        let mut rented = 0;
        let mut exceeded = 0;
        for handle in handles {
            match handle.await.expect("rent task panicked") {
                Ok(_) => rented += 1,
                Err(report) => {
                    assert_eq!(report.current_context(), &KernelError::QuotaExceeded);
                    exceeded += 1;
                }
            }
        }
        assert_eq!(rented, 2);
        assert_eq!(exceeded, 3);
        let snapshot = db.snapshot()?;
        assert_eq!(snapshot.rentals().filter(|r| r.is_open()).count(), 2);
        assert_consistent(&snapshot);
        Ok(())
    }

    #[tokio::test]
    async fn client_rentals_newest_first() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        let alien = db.rent_film(rent(1, 10)).await?;
        db.clock().advance(Duration::hours(1));
        db.rent_film(rent(1, 20)).await?;
        db.clock().advance(Duration::hours(1));
        db.return_copy(give_back(&alien.copy_id)).await?;
        db.clock().set(datetime!(2024-03-06 10:00 UTC));

        let rentals = db
            .get_client_rentals(GetClientRentalsDto { customer_id: 1 })
            .await?;
        assert_eq!(rentals.len(), 2);

        let heat = &rentals[0];
        assert_eq!(heat.title, "Heat");
        assert_eq!(heat.status, RentalStatus::Overdue);
        assert_eq!(heat.returned_at, None);
        assert_eq!(heat.penalty, Decimal::from(4));

        let alien = &rentals[1];
        assert_eq!(alien.title, "Alien");
        assert_eq!(alien.status, RentalStatus::Returned);
        assert_eq!(alien.returned_at, Some(datetime!(2024-03-01 12:00 UTC)));
        assert_eq!(alien.penalty, Decimal::ZERO);

        let nobody = db
            .get_client_rentals(GetClientRentalsDto { customer_id: 99 })
            .await?;
        assert!(nobody.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn quota_snapshot() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        db.rent_film(rent(1, 10)).await?;

        let quota = db.check_quota(CheckQuotaDto { customer_id: 1 }).await?;
        assert_eq!(
            quota,
            QuotaDto {
                active_rentals: 1,
                max_active_rentals: 2,
                can_rent: true,
            }
        );

        db.rent_film(rent(1, 20)).await?;
        let quota = db.check_quota(CheckQuotaDto { customer_id: 1 }).await?;
        assert!(!quota.can_rent);

        assert_eq!(
            kind(db.check_quota(CheckQuotaDto { customer_id: 99 }).await),
            Some(KernelError::NotFound)
        );
        Ok(())
    }

    #[tokio::test]
    async fn storage_failure_at_commit_rolls_back() -> error_stack::Result<(), KernelError> {
        let db = store()?;
        // RAN-1 stays flagged available although a rental on it is still open
        let mut con = db.transact().await?;
        let id = InMemoryRentalRepository.next_id(&mut con).await?;
        let stray = Rental::new(
            id,
            CustomerId::new(2),
            CopyId::new("RAN-1"),
            RentedAt::new(datetime!(2024-02-01 10:00 UTC)),
            None,
            None,
        );
        InMemoryRentalRepository.create(&mut con, &stray).await?;
        con.commit().await?;
        let before = db.snapshot()?;

        let error = kind(db.rent_film(rent(1, 30)).await);
        assert_eq!(error, Some(KernelError::Internal));
        assert!(error.is_some_and(|error| error.is_storage()));
        assert_eq!(db.snapshot()?, before);

        // nothing stays locked after the failed commit
        db.rent_film(rent(1, 10)).await?;
        Ok(())
    }

    #[tokio::test]
    async fn lock_wait_timeout_rolls_back() -> error_stack::Result<(), KernelError> {
        let db = store()?.with_lock_wait(std::time::Duration::from_millis(100));
        let before = db.snapshot()?;

        let mut holder = db.transact().await?;
        let locked = db
            .customer_query()
            .lock_by_id(&mut holder, &CustomerId::new(1))
            .await?;
        assert!(locked.is_some());

        let error = kind(db.rent_film(rent(1, 10)).await);
        assert_eq!(error, Some(KernelError::Timeout));
        assert!(error.is_some_and(|error| error.is_storage()));
        assert_eq!(db.snapshot()?, before);

        holder.roll_back().await?;
        db.rent_film(rent(1, 10)).await?;
        Ok(())
    }
}
