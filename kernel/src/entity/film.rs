mod details;
mod duration;
mod id;
mod release_year;
mod title;

pub use self::{details::*, duration::*, id::*, release_year::*, title::*};
use destructure::Destructure;
use serde::{Deserialize, Serialize};
use vodca::References;

/// Catalog metadata. Read-only for the rental core.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize, References, Destructure)]
pub struct Film {
    id: FilmId,
    title: FilmTitle,
    release_year: ReleaseYear,
    duration: FilmDuration,
    language: Option<FilmLanguage>,
    synopsis: Option<Synopsis>,
    poster_url: Option<PosterUrl>,
}

impl Film {
    pub fn new(
        id: FilmId,
        title: FilmTitle,
        release_year: ReleaseYear,
        duration: FilmDuration,
        language: Option<FilmLanguage>,
        synopsis: Option<Synopsis>,
        poster_url: Option<PosterUrl>,
    ) -> Self {
        Self {
            id,
            title,
            release_year,
            duration,
            language,
            synopsis,
            poster_url,
        }
    }
}
