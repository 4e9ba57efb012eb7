use kernel::interface::query::RentalQuery;
use kernel::interface::update::RentalModifier;
use kernel::prelude::entity::{ActiveRentals, CopyId, CustomerId, Rental, RentalId, RentalRecord};
use kernel::KernelError;

use crate::database::memory::{InMemoryTransaction, RowKey, Snapshot};

pub struct InMemoryRentalRepository;

pub(in crate::database) fn count_open(rows: &Snapshot, customer_id: &CustomerId) -> i64 {
    let count = rows
        .rentals
        .values()
        .filter(|rental| rental.customer_id() == customer_id && rental.is_open())
        .count();
    i64::try_from(count).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl RentalQuery for InMemoryRentalRepository {
    type Transaction = InMemoryTransaction;

    async fn lock_open_by_copy_id(
        &self,
        con: &mut InMemoryTransaction,
        copy_id: &CopyId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        let open = con.read(|rows| {
            rows.rentals
                .values()
                .find(|rental| rental.copy_id() == copy_id && rental.is_open())
                .map(|rental| *rental.id().as_ref())
        })?;
        let Some(id) = open else {
            return Ok(None);
        };
        con.lock(RowKey::Rental(id)).await?;
        // the holder we waited on may have closed it
        con.read(|rows| rows.rentals.get(&id).filter(|rental| rental.is_open()).cloned())
    }

    async fn count_open_by_customer_id(
        &self,
        con: &mut InMemoryTransaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<ActiveRentals, KernelError> {
        con.read(|rows| ActiveRentals::new(count_open(rows, customer_id)))
    }

    async fn find_by_customer_id(
        &self,
        con: &mut InMemoryTransaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Vec<RentalRecord>, KernelError> {
        con.read(|rows| {
            let Some(customer) = rows.customers.get(customer_id.as_ref()) else {
                return Vec::new();
            };
            let mut records = rows
                .rentals
                .values()
                .filter(|rental| rental.customer_id() == customer_id)
                .filter_map(|rental| {
                    let copy = rows.copies.get(rental.copy_id().as_ref())?;
                    let film = rows.films.get(copy.film_id().as_ref())?;
                    Some(RentalRecord::new(
                        rental.clone(),
                        film.clone(),
                        customer.plan_code().clone(),
                    ))
                })
                .collect::<Vec<_>>();
            records.sort_by(|a, b| {
                b.rental()
                    .rented_at()
                    .cmp(a.rental().rented_at())
                    .then_with(|| b.rental().id().cmp(a.rental().id()))
            });
            records
        })
    }
}

#[async_trait::async_trait]
impl RentalModifier for InMemoryRentalRepository {
    type Transaction = InMemoryTransaction;

    async fn next_id(
        &self,
        con: &mut InMemoryTransaction,
    ) -> error_stack::Result<RentalId, KernelError> {
        Ok(RentalId::new(con.next_sequence()))
    }

    async fn create(
        &self,
        con: &mut InMemoryTransaction,
        rental: &Rental,
    ) -> error_stack::Result<(), KernelError> {
        con.lock(RowKey::Rental(*rental.id().as_ref())).await?;
        con.stage_rental(rental.clone());
        Ok(())
    }

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        rental: &Rental,
    ) -> error_stack::Result<(), KernelError> {
        let id = *rental.id().as_ref();
        con.lock(RowKey::Rental(id)).await?;
        if con.read(|rows| rows.rentals.contains_key(&id))? {
            con.stage_rental(rental.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use time::macros::datetime;

    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::RentalQuery;
    use kernel::interface::update::RentalModifier;
    use kernel::prelude::entity::{CopyId, CustomerId, Rental, RentedAt, ReturnedAt};
    use kernel::KernelError;

    use crate::database::{InMemoryDatabase, InMemoryRentalRepository, Seed};

    #[tokio::test]
    async fn second_returner_sees_no_open_rental() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        db.seed(
            Seed::new()
                .plan("A", 3, Some(7))
                .customer(1, "A")
                .film(1, "Alien")
                .copy("ALN-1", 1, false),
        )?;

        let mut con = db.transact().await?;
        let id = InMemoryRentalRepository.next_id(&mut con).await?;
        let rental = Rental::new(
            id,
            CustomerId::new(1),
            CopyId::new("ALN-1"),
            RentedAt::new(datetime!(2024-01-01 10:00 UTC)),
            None,
            None,
        );
        InMemoryRentalRepository.create(&mut con, &rental).await?;
        con.commit().await?;

        let copy = CopyId::new("ALN-1");
        let mut first = db.transact().await?;
        let mut returned = InMemoryRentalRepository
            .lock_open_by_copy_id(&mut first, &copy)
            .await?
            .expect("an open rental");

        let second_db = db.clone();
        let second = tokio::spawn(async move {
            let mut con = second_db.transact().await?;
            let found = InMemoryRentalRepository
                .lock_open_by_copy_id(&mut con, &CopyId::new("ALN-1"))
                .await?;
            con.roll_back().await?;
            Ok::<_, error_stack::Report<KernelError>>(found)
        });
        tokio::time::sleep(Duration::from_millis(50)).await;

        returned.substitute(|rental| {
            *rental.returned_at = Some(ReturnedAt::new(datetime!(2024-01-02 10:00 UTC)))
        });
        InMemoryRentalRepository.update(&mut first, &returned).await?;
        first.commit().await?;

        let found = second.await.expect("second task panicked")?;
        assert!(found.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn history_is_newest_first() -> error_stack::Result<(), KernelError> {
        let db = InMemoryDatabase::new();
        db.seed(
            Seed::new()
                .plan("A", 3, None)
                .customer(1, "A")
                .film(1, "Alien")
                .copy("ALN-1", 1, true)
                .copy("ALN-2", 1, true),
        )?;

        let mut con = db.transact().await?;
        for (copy, at) in [
            ("ALN-1", datetime!(2024-01-01 10:00 UTC)),
            ("ALN-2", datetime!(2024-01-03 10:00 UTC)),
        ] {
            let id = InMemoryRentalRepository.next_id(&mut con).await?;
            let rental = Rental::new(
                id,
                CustomerId::new(1),
                CopyId::new(copy),
                RentedAt::new(at),
                None,
                None,
            );
            InMemoryRentalRepository.create(&mut con, &rental).await?;
        }
        con.commit().await?;

        let mut con = db.transact().await?;
        let records = InMemoryRentalRepository
            .find_by_customer_id(&mut con, &CustomerId::new(1))
            .await?;
        let copies = records
            .iter()
            .map(|record| record.rental().copy_id().as_ref().as_str())
            .collect::<Vec<_>>();
        assert_eq!(copies, vec!["ALN-2", "ALN-1"]);

        let none = InMemoryRentalRepository
            .find_by_customer_id(&mut con, &CustomerId::new(42))
            .await?;
        assert!(none.is_empty());
        Ok(())
    }
}
