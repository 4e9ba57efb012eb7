use crate::controller::Intake;
use application::transfer::GetFilmDto;

#[derive(Debug)]
pub struct GetFilmRequest {
    id: i64,
}

impl GetFilmRequest {
    pub fn new(id: i64) -> Self {
        Self { id }
    }
}

pub struct Transformer;

impl Intake<GetFilmRequest> for Transformer {
    type To = GetFilmDto;
    fn emit(&self, input: GetFilmRequest) -> Self::To {
        GetFilmDto { film_id: input.id }
    }
}
