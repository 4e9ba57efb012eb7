use std::ops::{Deref, DerefMut};

use error_stack::ResultExt;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, Pool, Postgres};

use kernel::interface::clock::{DependOnClock, SystemClock};
use kernel::interface::database::{DatabaseConnection, Transaction};
use kernel::interface::query::{
    DependOnCopyQuery, DependOnCustomerQuery, DependOnFilmQuery, DependOnPlanQuery,
    DependOnQuotaQuery, DependOnRentalQuery,
};
use kernel::interface::update::{DependOnCopyModifier, DependOnRentalModifier};
use kernel::KernelError;

use crate::error::ConvertError;
use crate::{env, env_or};

pub use self::{copy::*, customer::*, film::*, plan::*, quota::*, rental::*};

mod copy;
mod customer;
mod film;
mod plan;
mod quota;
mod rental;

static POSTGRES_URL: &str = "POSTGRES_URL";
static POSTGRES_MAX_CONNECTIONS: &str = "POSTGRES_MAX_CONNECTIONS";

#[derive(Clone)]
pub struct PostgresDatabase {
    pool: Pool<Postgres>,
    clock: SystemClock,
}

impl PostgresDatabase {
    pub async fn new() -> error_stack::Result<Self, KernelError> {
        let url = env(POSTGRES_URL)?;
        let max_connections = env_or(POSTGRES_MAX_CONNECTIONS, "8")
            .parse::<u32>()
            .change_context_lazy(|| KernelError::Internal)
            .attach_printable_lazy(|| {
                format!("{} must be a positive integer", POSTGRES_MAX_CONNECTIONS)
            })?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await
            .convert_error()?;
        Ok(Self {
            pool,
            clock: SystemClock,
        })
    }

    pub async fn migrate(&self) -> error_stack::Result<(), KernelError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .convert_error()
    }
}

pub struct PostgresTransaction(sqlx::Transaction<'static, Postgres>);

impl Deref for PostgresTransaction {
    type Target = PgConnection;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for PostgresTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[async_trait::async_trait]
impl DatabaseConnection for PostgresDatabase {
    type Transaction = PostgresTransaction;
    async fn transact(&self) -> error_stack::Result<Self::Transaction, KernelError> {
        let mut transaction = self.pool.begin().await.convert_error()?;
        // 55P03 once exceeded, reported as KernelError::Timeout
        // language=postgresql
        sqlx::query("SET LOCAL lock_timeout = '5s'")
            .execute(&mut *transaction)
            .await
            .convert_error()?;
        Ok(PostgresTransaction(transaction))
    }
}

#[async_trait::async_trait]
impl Transaction for PostgresTransaction {
    async fn commit(self) -> error_stack::Result<(), KernelError> {
        self.0.commit().await.convert_error()
    }

    async fn roll_back(self) -> error_stack::Result<(), KernelError> {
        self.0.rollback().await.convert_error()
    }
}

impl DependOnClock for PostgresDatabase {
    type Clock = SystemClock;
    fn clock(&self) -> &Self::Clock {
        &self.clock
    }
}

impl DependOnCustomerQuery for PostgresDatabase {
    type CustomerQuery = PostgresCustomerRepository;
    fn customer_query(&self) -> &Self::CustomerQuery {
        &PostgresCustomerRepository
    }
}

impl DependOnPlanQuery for PostgresDatabase {
    type PlanQuery = PostgresPlanRepository;
    fn plan_query(&self) -> &Self::PlanQuery {
        &PostgresPlanRepository
    }
}

impl DependOnFilmQuery for PostgresDatabase {
    type FilmQuery = PostgresFilmRepository;
    fn film_query(&self) -> &Self::FilmQuery {
        &PostgresFilmRepository
    }
}

impl DependOnCopyQuery for PostgresDatabase {
    type CopyQuery = PostgresCopyRepository;
    fn copy_query(&self) -> &Self::CopyQuery {
        &PostgresCopyRepository
    }
}

impl DependOnCopyModifier for PostgresDatabase {
    type CopyModifier = PostgresCopyRepository;
    fn copy_modifier(&self) -> &Self::CopyModifier {
        &PostgresCopyRepository
    }
}

impl DependOnRentalQuery for PostgresDatabase {
    type RentalQuery = PostgresRentalRepository;
    fn rental_query(&self) -> &Self::RentalQuery {
        &PostgresRentalRepository
    }
}

impl DependOnRentalModifier for PostgresDatabase {
    type RentalModifier = PostgresRentalRepository;
    fn rental_modifier(&self) -> &Self::RentalModifier {
        &PostgresRentalRepository
    }
}

impl DependOnQuotaQuery for PostgresDatabase {
    type QuotaQuery = PostgresQuotaRepository;
    fn quota_query(&self) -> &Self::QuotaQuery {
        &PostgresQuotaRepository
    }
}

#[cfg(test)]
pub(in crate::database) mod fixture {
    use rand::Rng;
    use sqlx::PgConnection;

    use kernel::KernelError;

    use crate::error::ConvertError;

    pub fn random_id() -> i64 {
        rand::thread_rng().gen_range(1_000_000..i64::MAX)
    }

    /// Plan `F` (2 rentals, 3 days), one customer on it and one film with the given copies.
    /// Returns `(customer_id, film_id)`.
    pub async fn seed(
        con: &mut PgConnection,
        copies: &[&str],
    ) -> error_stack::Result<(i64, i64), KernelError> {
        let customer_id = random_id();
        let film_id = random_id();
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO plans (code, name, cost, rental_limit, loan_days)
            VALUES ('F', 'Fixture', 0, 2, 3)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .execute(&mut *con)
        .await
        .convert_error()?;
        // language=postgresql
        sqlx::query("INSERT INTO customers (id, plan_code) VALUES ($1, 'F')")
            .bind(customer_id)
            .execute(&mut *con)
            .await
            .convert_error()?;
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO films (id, title, release_year, duration)
            VALUES ($1, 'Fixture', 1979, 117)
            "#,
        )
        .bind(film_id)
        .execute(&mut *con)
        .await
        .convert_error()?;
        for copy in copies {
            // language=postgresql
            sqlx::query("INSERT INTO copies (id, film_id, available) VALUES ($1, $2, TRUE)")
                .bind(*copy)
                .bind(film_id)
                .execute(&mut *con)
                .await
                .convert_error()?;
        }
        Ok((customer_id, film_id))
    }

    pub fn copy_id(prefix: &str) -> String {
        format!("{}-{}", prefix, rand::thread_rng().gen_range(0..100_000_000u32))
    }
}
