use sqlx::PgConnection;

use kernel::interface::query::QuotaQuery;
use kernel::prelude::entity::{ActiveRentals, CustomerId, Quota, RentalLimit};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresQuotaRepository;

#[async_trait::async_trait]
impl QuotaQuery for PostgresQuotaRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_customer_id(
        &self,
        con: &mut PostgresTransaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Option<Quota>, KernelError> {
        PgQuotaInternal::find_by_customer_id(con, customer_id).await
    }
}

#[derive(sqlx::FromRow)]
struct QuotaRow {
    active_rentals: i64,
    rental_limit: i32,
}

impl From<QuotaRow> for Quota {
    fn from(value: QuotaRow) -> Self {
        Quota::new(
            ActiveRentals::new(value.active_rentals),
            RentalLimit::new(value.rental_limit),
        )
    }
}

pub(in crate::database) struct PgQuotaInternal;

impl PgQuotaInternal {
    async fn find_by_customer_id(
        con: &mut PgConnection,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Option<Quota>, KernelError> {
        let row = sqlx::query_as::<_, QuotaRow>(
            // language=postgresql
            r#"
            SELECT p.rental_limit,
                   (SELECT COUNT(*)
                    FROM rentals r
                    WHERE r.customer_id = c.id AND r.returned_at IS NULL) AS active_rentals
            FROM customers c
            JOIN plans p ON p.code = c.plan_code
            WHERE c.id = $1
            "#,
        )
        .bind(customer_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Quota::from))
    }
}

#[cfg(test)]
mod test {
    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::QuotaQuery;
    use kernel::prelude::entity::CustomerId;
    use kernel::KernelError;

    use crate::database::postgres::quota::PostgresQuotaRepository;
    use crate::database::postgres::{fixture, PostgresDatabase};

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn test() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let (customer_id, _) = fixture::seed(&mut con, &[]).await?;

        let quota = PostgresQuotaRepository
            .find_by_customer_id(&mut con, &CustomerId::new(customer_id))
            .await?
            .expect("seeded customer");
        assert_eq!(*quota.active_rentals().as_ref(), 0);
        assert_eq!(*quota.rental_limit().as_ref(), 2);
        assert!(quota.can_rent());

        let missing = PostgresQuotaRepository
            .find_by_customer_id(&mut con, &CustomerId::new(-1))
            .await?;
        assert!(missing.is_none());

        con.roll_back().await?;
        Ok(())
    }
}
