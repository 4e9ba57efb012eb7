use sqlx::PgConnection;

use kernel::interface::query::FilmQuery;
use kernel::prelude::entity::{
    Film, FilmDuration, FilmId, FilmLanguage, FilmTitle, PosterUrl, ReleaseYear, Synopsis,
};
use kernel::KernelError;

use crate::database::postgres::PostgresTransaction;
use crate::error::ConvertError;

pub struct PostgresFilmRepository;

#[async_trait::async_trait]
impl FilmQuery for PostgresFilmRepository {
    type Transaction = PostgresTransaction;

    async fn find_by_id(
        &self,
        con: &mut PostgresTransaction,
        id: &FilmId,
    ) -> error_stack::Result<Option<Film>, KernelError> {
        PgFilmInternal::find_by_id(con, id).await
    }
}

#[derive(sqlx::FromRow)]
struct FilmRow {
    id: i64,
    title: String,
    release_year: i32,
    duration: i32,
    language: Option<String>,
    synopsis: Option<String>,
    poster_url: Option<String>,
}

impl From<FilmRow> for Film {
    fn from(value: FilmRow) -> Self {
        Film::new(
            FilmId::new(value.id),
            FilmTitle::new(value.title),
            ReleaseYear::new(value.release_year),
            FilmDuration::new(value.duration),
            value.language.map(FilmLanguage::new),
            value.synopsis.map(Synopsis::new),
            value.poster_url.map(PosterUrl::new),
        )
    }
}

pub(in crate::database) struct PgFilmInternal;

impl PgFilmInternal {
    async fn find_by_id(
        con: &mut PgConnection,
        id: &FilmId,
    ) -> error_stack::Result<Option<Film>, KernelError> {
        let row = sqlx::query_as::<_, FilmRow>(
            // language=postgresql
            r#"
            SELECT id, title, release_year, duration, language, synopsis, poster_url
            FROM films
            WHERE id = $1
            "#,
        )
        .bind(id.as_ref())
        .fetch_optional(con)
        .await
        .convert_error()?;
        Ok(row.map(Film::from))
    }
}
