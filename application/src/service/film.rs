use error_stack::Report;
use kernel::interface::database::{DatabaseConnection, DependOnDatabaseConnection};
use kernel::interface::query::{CopyQuery, DependOnCopyQuery, DependOnFilmQuery, FilmQuery};
use kernel::prelude::entity::FilmId;
use kernel::KernelError;

use crate::service::settle;
use crate::transfer::{FilmDetailDto, GetFilmDto};

#[async_trait::async_trait]
pub trait GetFilmService:
    'static + Sync + Send + DependOnDatabaseConnection + DependOnFilmQuery + DependOnCopyQuery
{
    async fn get_film(&self, dto: GetFilmDto) -> error_stack::Result<FilmDetailDto, KernelError> {
        let mut con = self.database_connection().transact().await?;

        let film_id = FilmId::new(dto.film_id);
        let result: error_stack::Result<FilmDetailDto, KernelError> = async {
            let film = self
                .film_query()
                .find_by_id(&mut con, &film_id)
                .await?
                .ok_or_else(|| {
                    Report::new(KernelError::NotFound)
                        .attach_printable(format!("Film {} not found", dto.film_id))
                })?;
            let copies = self
                .copy_query()
                .find_by_film_id(&mut con, &film_id)
                .await?;
            Ok(FilmDetailDto::new(film, &copies))
        }
        .await;

        settle(con, result).await
    }
}

impl<T> GetFilmService for T where
    T: DependOnDatabaseConnection + DependOnFilmQuery + DependOnCopyQuery
{
}
