use kernel::interface::query::CopyQuery;
use kernel::interface::update::CopyModifier;
use kernel::prelude::entity::{CopyId, FilmCopy, FilmId};
use kernel::KernelError;

use crate::database::memory::{InMemoryTransaction, RowKey};

pub struct InMemoryCopyRepository;

#[async_trait::async_trait]
impl CopyQuery for InMemoryCopyRepository {
    type Transaction = InMemoryTransaction;

    async fn find_by_id(
        &self,
        con: &mut InMemoryTransaction,
        id: &CopyId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError> {
        con.read(|rows| rows.copies.get(id.as_ref()).cloned())
    }

    async fn find_by_film_id(
        &self,
        con: &mut InMemoryTransaction,
        film_id: &FilmId,
    ) -> error_stack::Result<Vec<FilmCopy>, KernelError> {
        con.read(|rows| {
            rows.copies
                .values()
                .filter(|copy| copy.film_id() == film_id)
                .cloned()
                .collect()
        })
    }

    async fn lock_available_by_film_id(
        &self,
        con: &mut InMemoryTransaction,
        film_id: &FilmId,
    ) -> error_stack::Result<Option<FilmCopy>, KernelError> {
        con.lock_first_unlocked(|rows| {
            rows.copies
                .values()
                .filter(|copy| copy.film_id() == film_id && copy.is_available())
                .map(|copy| (RowKey::Copy(copy.id().as_ref().clone()), copy.clone()))
                .collect()
        })
    }
}

#[async_trait::async_trait]
impl CopyModifier for InMemoryCopyRepository {
    type Transaction = InMemoryTransaction;

    async fn update(
        &self,
        con: &mut InMemoryTransaction,
        copy: &FilmCopy,
    ) -> error_stack::Result<(), KernelError> {
        con.lock(RowKey::Copy(copy.id().as_ref().clone())).await?;
        if con.read(|rows| rows.copies.contains_key(copy.id().as_ref()))? {
            con.stage_copy(copy.clone());
        }
        Ok(())
    }
}
