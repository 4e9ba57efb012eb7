use kernel::interface::query::FilmQuery;
use kernel::prelude::entity::{Film, FilmId};
use kernel::KernelError;

use crate::database::memory::InMemoryTransaction;

pub struct InMemoryFilmRepository;

#[async_trait::async_trait]
impl FilmQuery for InMemoryFilmRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &FilmId,
    ) -> error_stack::Result<Option<Film>, KernelError> {
        con.read(|rows| rows.films.get(id.as_ref()).cloned())
    }
}
