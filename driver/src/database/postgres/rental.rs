use sqlx::PgConnection;
use time::OffsetDateTime;

use kernel::interface::query::RentalQuery;
use kernel::interface::update::RentalModifier;
use kernel::prelude::entity::{
    ActiveRentals, CopyId, CustomerId, DueAt, Film, FilmDuration, FilmId, FilmLanguage,
    FilmTitle, PlanCode, PosterUrl, ReleaseYear, Rental, RentalId, RentalRecord, RentedAt,
    ReturnedAt, Synopsis,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresRentalRepository;

#[async_trait::async_trait]
impl RentalQuery for PostgresRentalRepository {
    type Transaction = PostgresTransaction;

    async fn lock_open_by_copy_id(
        &self,
        con: &mut PostgresTransaction,
        copy_id: &CopyId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        PgRentalInternal::lock_open_by_copy_id(con, copy_id).await
    }

    async fn count_open_by_customer_id(
        &self,
        con: &mut PostgresTransaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<ActiveRentals, KernelError> {
        PgRentalInternal::count_open_by_customer_id(con, customer_id).await
    }

    async fn find_by_customer_id(
        &self,
        con: &mut PostgresTransaction,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Vec<RentalRecord>, KernelError> {
        PgRentalInternal::find_by_customer_id(con, customer_id).await
    }
}

#[async_trait::async_trait]
impl RentalModifier for PostgresRentalRepository {
    type Transaction = PostgresTransaction;

    async fn next_id(
        &self,
        con: &mut PostgresTransaction,
    ) -> error_stack::Result<RentalId, KernelError> {
        PgRentalInternal::next_id(con).await
    }

    async fn create(
        &self,
        con: &mut PostgresTransaction,
        rental: &Rental,
    ) -> error_stack::Result<(), KernelError> {
        PgRentalInternal::create(con, rental).await
    }

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        rental: &Rental,
    ) -> error_stack::Result<(), KernelError> {
        PgRentalInternal::update(con, rental).await
    }
}

#[derive(sqlx::FromRow)]
struct RentalRow {
    id: i64,
    customer_id: i64,
    copy_id: String,
    rented_at: OffsetDateTime,
    due_at: Option<OffsetDateTime>,
    returned_at: Option<OffsetDateTime>,
}

impl From<RentalRow> for Rental {
    fn from(value: RentalRow) -> Self {
        Rental::new(
            RentalId::new(value.id),
            CustomerId::new(value.customer_id),
            CopyId::new(value.copy_id),
            RentedAt::new(value.rented_at),
            value.due_at.map(DueAt::new),
            value.returned_at.map(ReturnedAt::new),
        )
    }
}

#[derive(sqlx::FromRow)]
struct RentalRecordRow {
    #[sqlx(flatten)]
    rental: RentalRow,
    film_id: i64,
    title: String,
    release_year: i32,
    duration: i32,
    language: Option<String>,
    synopsis: Option<String>,
    poster_url: Option<String>,
    plan_code: String,
}

impl From<RentalRecordRow> for RentalRecord {
    fn from(value: RentalRecordRow) -> Self {
        let film = Film::new(
            FilmId::new(value.film_id),
            FilmTitle::new(value.title),
            ReleaseYear::new(value.release_year),
            FilmDuration::new(value.duration),
            value.language.map(FilmLanguage::new),
            value.synopsis.map(Synopsis::new),
            value.poster_url.map(PosterUrl::new),
        );
        RentalRecord::new(
            Rental::from(value.rental),
            film,
            PlanCode::new(value.plan_code),
        )
    }
}

pub(in crate::database) struct PgRentalInternal;

impl PgRentalInternal {
    async fn lock_open_by_copy_id(
        con: &mut PgConnection,
        copy_id: &CopyId,
    ) -> error_stack::Result<Option<Rental>, KernelError> {
        tracing::debug!("locking open rental of copy {}", copy_id.as_ref());
        let row = sqlx::query_as::<_, RentalRow>(
            // language=postgresql
            r#"
            SELECT id, customer_id, copy_id, rented_at, due_at, returned_at
            FROM rentals
            WHERE copy_id = $1 AND returned_at IS NULL
            FOR UPDATE
            "#,
        )
        .bind(copy_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Rental::from))
    }

    async fn count_open_by_customer_id(
        con: &mut PgConnection,
        customer_id: &CustomerId,
    ) -> error_stack::Result<ActiveRentals, KernelError> {
        let count = sqlx::query_scalar::<_, i64>(
            // language=postgresql
            r#"
            SELECT COUNT(*)
            FROM rentals
            WHERE customer_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(customer_id.as_ref())
        .fetch_one(con)
        .await
        .convert_error()?;
        Ok(ActiveRentals::new(count))
    }

    async fn find_by_customer_id(
        con: &mut PgConnection,
        customer_id: &CustomerId,
    ) -> error_stack::Result<Vec<RentalRecord>, KernelError> {
        let rows = sqlx::query_as::<_, RentalRecordRow>(
            // language=postgresql
            r#"
            SELECT r.id, r.customer_id, r.copy_id, r.rented_at, r.due_at, r.returned_at,
                   f.id AS film_id, f.title, f.release_year, f.duration,
                   f.language, f.synopsis, f.poster_url,
                   c.plan_code
            FROM rentals r
            JOIN customers c ON c.id = r.customer_id
            JOIN copies cp ON cp.id = r.copy_id
            JOIN films f ON f.id = cp.film_id
            WHERE r.customer_id = $1
            ORDER BY r.rented_at DESC, r.id DESC
            "#,
        )
        .bind(customer_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(RentalRecord::from).collect())
    }

    async fn next_id(con: &mut PgConnection) -> error_stack::Result<RentalId, KernelError> {
        // language=postgresql
        let id = sqlx::query_scalar::<_, i64>("SELECT nextval('rentals_id_seq')")
            .fetch_one(con)
            .await
            .convert_error()?;
        Ok(RentalId::new(id))
    }

    async fn create(
        con: &mut PgConnection,
        rental: &Rental,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            INSERT INTO rentals (id, customer_id, copy_id, rented_at, due_at, returned_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(rental.id().as_ref())
        .bind(rental.customer_id().as_ref())
        .bind(rental.copy_id().as_ref())
        .bind(rental.rented_at().as_ref())
        .bind(rental.due_at().map(|due_at| *due_at.as_ref()))
        .bind(rental.returned_at().map(|returned_at| *returned_at.as_ref()))
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }

    async fn update(
        con: &mut PgConnection,
        rental: &Rental,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            UPDATE rentals
            SET returned_at = $2
            WHERE id = $1
            "#,
        )
        .bind(rental.id().as_ref())
        .bind(rental.returned_at().map(|returned_at| *returned_at.as_ref()))
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}
