mod copy;
mod rental;

pub use self::{copy::*, rental::*};
