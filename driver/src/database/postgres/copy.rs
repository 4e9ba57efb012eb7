use sqlx::PgConnection;

use kernel::interface::query::CopyQuery;
use kernel::interface::update::CopyModifier;
use kernel::prelude::entity::{CopyId, FilmCopy, FilmId, IsAvailable};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresCopyRepository;

#[async_trait::async_trait]
impl CopyQuery for PostgresCopyRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &CopyId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError> {
        PgCopyInternal::find_by_id(con, id).await
    }

    async fn find_by_film_id(
        &self,
        con: &mut PostgresTransaction,
        film_id: &FilmId,
    ) -> error_stack::Result<Vec<FilmCopy>, KernelError> {
        PgCopyInternal::find_by_film_id(con, film_id).await
    }

    async fn lock_available_by_film_id(
        &self,
        con: &mut PostgresTransaction,
        film_id: &FilmId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError> {
        PgCopyInternal::lock_available_by_film_id(con, film_id).await
    }
}

#[async_trait::async_trait]
impl CopyModifier for PostgresCopyRepository {
    type Transaction = PostgresTransaction;

    async fn update(
        &self,
        con: &mut PostgresTransaction,
        copy: &FilmCopy,
    ) -> error_stack::Result<(), KernelError> {
        PgCopyInternal::update(con, copy).await
    }
}

#[derive(sqlx::FromRow)]
struct CopyRow {
    id: String,
    film_id: i64,
    available: bool,
}

impl From<CopyRow> for FilmCopy {
    fn from(value: CopyRow) -> Self {
        FilmCopy::new(
            CopyId::new(value.id),
            FilmId::new(value.film_id),
            IsAvailable::new(value.available),
        )
    }
}

pub(in crate::database) struct PgCopyInternal;

impl PgCopyInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &CopyId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError> {
        let row = sqlx::query_as::<_, CopyRow>(
            // language=postgresql
            r#"
            SELECT id, film_id, available
            FROM copies
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(FilmCopy::from))
    }

    async fn find_by_film_id(
        con: &mut PgConnection,
        film_id: &FilmId,
    ) -> error_stack::Result<Vec<FilmCopy>, KernelError> {
        let rows = sqlx::query_as::<_, CopyRow>(
            // language=postgresql
            r#"
            SELECT id, film_id, available
            FROM copies
            WHERE film_id = $1
            ORDER BY id
            "#,
        )
        .bind(film_id.as_ref())
        .fetch_all(con)
        .await
        .convert_error()?;
        Ok(rows.into_iter().map(FilmCopy::from).collect())
    }

    async fn lock_available_by_film_id(
        con: &mut PgConnection,
        film_id: &FilmId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError> {
        let row = sqlx::query_as::<_, CopyRow>(
            // language=postgresql
            r#"
            SELECT id, film_id, available
            FROM copies
            WHERE film_id = $1 AND available
            ORDER BY id
            LIMIT 1
            FOR UPDATE SKIP LOCKED
            "#,
        )
        .bind(film_id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        tracing::debug!(
            "film {} available copy: {:?}",
            film_id.as_ref(),
            row.as_ref().map(|row| &row.id)
        );
        Ok(row.map(FilmCopy::from))
    }

    async fn update(
        con: &mut PgConnection,
        copy: &FilmCopy,
    ) -> error_stack::Result<(), KernelError> {
        // language=postgresql
        sqlx::query(
            r#"
            UPDATE copies
            SET available = $2
            WHERE id = $1
            "#,
        )
        .bind(copy.id().as_ref())
        .bind(copy.available().as_ref())
        .execute(con)
        .await
        .convert_error()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use kernel::interface::database::{DatabaseConnection, Transaction};
    use kernel::interface::query::CopyQuery;
    use kernel::interface::update::CopyModifier;
    use kernel::prelude::entity::{CopyId, FilmId, IsAvailable};
    use kernel::KernelError;

    use crate::database::postgres::copy::PostgresCopyRepository;
    use crate::database::postgres::{fixture, PostgresDatabase};

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn test() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let mut con = db.transact().await?;
        let copy_id = fixture::copy_id("CPY");
        let (_, film_id) = fixture::seed(&mut con, &[copy_id.as_str()]).await?;
        let id = CopyId::new(copy_id.clone());

        let mut copy = PostgresCopyRepository
            .find_by_id(&mut con, &id)
            .await?
            .expect("seeded copy");
        assert!(copy.is_available());

        copy.substitute(|copy| *copy.available = IsAvailable::new(false));
        PostgresCopyRepository.update(&mut con, &copy).await?;

        let copies = PostgresCopyRepository
            .find_by_film_id(&mut con, &FilmId::new(film_id))
            .await?;
        assert_eq!(copies, vec![copy]);

        let none = PostgresCopyRepository
            .lock_available_by_film_id(&mut con, &FilmId::new(film_id))
            .await?;
        assert!(none.is_none());

        con.roll_back().await?;
        Ok(())
    }

    #[test_with::env(POSTGRES_TEST)]
    #[tokio::test]
    async fn skip_locked() -> error_stack::Result<(), KernelError> {
        let db = PostgresDatabase::new().await?;
        db.migrate().await?;
        let first_copy = fixture::copy_id("SKP");
        let second_copy = fixture::copy_id("SKP");
        let mut seed = db.transact().await?;
        let (_, film_id) =
            fixture::seed(&mut seed, &[first_copy.as_str(), second_copy.as_str()]).await?;
        seed.commit().await?;
        let film_id = FilmId::new(film_id);

        let mut first = db.transact().await?;
        let mut second = db.transact().await?;
        let mut third = db.transact().await?;
        let a = PostgresCopyRepository
            .lock_available_by_film_id(&mut first, &film_id)
            .await?
            .expect("first copy");
        let b = PostgresCopyRepository
            .lock_available_by_film_id(&mut second, &film_id)
            .await?
            .expect("second copy");
        let c = PostgresCopyRepository
            .lock_available_by_film_id(&mut third, &film_id)
            .await?;

        assert_ne!(a.id(), b.id());
        assert!(c.is_none());

        first.roll_back().await?;
        second.roll_back().await?;
        third.roll_back().await?;
        Ok(())
    }
}
