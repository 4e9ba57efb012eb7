use kernel::prelude::entity::{DestructFilm, Film, FilmCopy};

#[derive(Debug, Clone)]
pub struct FilmDetailDto {
    pub id: i64,
    pub title: String,
    pub release_year: i32,
    pub duration_minutes: i32,
    pub language: Option<String>,
    pub synopsis: Option<String>,
    pub poster_url: Option<String>,
    pub copies_total: usize,
    pub copies_available: usize,
}

impl FilmDetailDto {
    pub fn new(film: Film, copies: &[FilmCopy]) -> Self {
        let DestructFilm {
            id,
            title,
            release_year,
            duration,
            language,
            synopsis,
            poster_url,
        } = film.into_destruct();
        Self {
            id: id.into(),
            title: title.into(),
            release_year: release_year.into(),
            duration_minutes: duration.into(),
            language: language.map(Into::into),
            synopsis: synopsis.map(Into::into),
            poster_url: poster_url.map(Into::into),
            copies_total: copies.len(),
            copies_available: copies.iter().filter(|copy| copy.is_available()).count(),
        }
    }
}

pub struct GetFilmDto {
    pub film_id: i64,
}
