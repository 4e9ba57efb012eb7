mod request;
mod response;

use self::request::{GetFilmRequest, Transformer};
use self::response::Presenter;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use application::service::GetFilmService;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

pub trait FilmRouter {
    fn route_film(self) -> Self;
}

impl FilmRouter for Router<AppModule> {
    fn route_film(self) -> Self {
        self.route(
            "/films/:id",
            get(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(GetFilmRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_film(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
