mod copy;
mod customer;
mod film;
mod plan;
mod quota;
mod rental;

pub use self::{copy::*, customer::*, film::*, plan::*, quota::*, rental::*};
