mod customer;
mod film;
mod rental;

pub use self::{customer::CustomerRouter, film::FilmRouter, rental::RentalRouter};
