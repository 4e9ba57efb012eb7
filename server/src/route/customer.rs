mod request;
mod response;

use self::request::{GetQuotaRequest, GetRentalsRequest, Transformer};
use self::response::Presenter;
use crate::controller::Controller;
use crate::error::ErrorStatus;
use crate::handler::AppModule;
use application::service::GetRentalService;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;

pub trait CustomerRouter {
    fn route_customer(self) -> Self;
}

impl CustomerRouter for Router<AppModule> {
    fn route_customer(self) -> Self {
        self.route(
            "/customers/:id/rentals",
            get(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(GetRentalsRequest::new(id))
                        .handle(|dto| async move { module.pgpool().get_client_rentals(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
        .route(
            "/customers/:id/quota",
            get(
                |State(module): State<AppModule>, Path(id): Path<i64>| async move {
                    Controller::new(Transformer, Presenter)
                        .intake(GetQuotaRequest::new(id))
                        .handle(|dto| async move { module.pgpool().check_quota(dto).await })
                        .await
                        .map_err(ErrorStatus::from)
                },
            ),
        )
    }
}
