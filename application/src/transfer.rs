mod film;
mod rental;

pub use self::{film::*, rental::*};
