use crate::controller::Exhaust;
use application::transfer::FilmDetailDto;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct FilmResponse {
    id: i64,
    title: String,
    release_year: i32,
    duration_minutes: i32,
    language: Option<String>,
    synopsis: Option<String>,
    poster_url: Option<String>,
    copies_total: usize,
    copies_available: usize,
}

impl IntoResponse for FilmResponse {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub struct Presenter;

impl Exhaust<FilmDetailDto> for Presenter {
    type To = FilmResponse;
    fn emit(&self, input: FilmDetailDto) -> Self::To {
        FilmResponse {
            id: input.id,
            title: input.title,
            release_year: input.release_year,
            duration_minutes: input.duration_minutes,
            language: input.language,
            synopsis: input.synopsis,
            poster_url: input.poster_url,
            copies_total: input.copies_total,
            copies_available: input.copies_available,
        }
    }
}
