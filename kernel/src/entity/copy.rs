mod availability;
mod id;

pub use self::{availability::*, id::*};
use crate::entity::FilmId;
use destructure::{Destructure, Mutation};
use serde::{Deserialize, Serialize};
use vodca::References;

/// A rentable instance of a film. `available` is false exactly while an open rental points at it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure, Mutation)]
pub struct FilmCopy {
    id: CopyId,
    film_id: FilmId,
    available: IsAvailable,
}

impl FilmCopy {
    pub fn new(id: CopyId, film_id: FilmId, available: IsAvailable) -> Self {
        Self {
            id,
            film_id,
            available,
        }
    }

    pub fn is_available(&self) -> bool {
        *self.available.as_ref()
    }
}
