#[cfg(any(test, feature = "memory"))]
mod memory;
mod postgres;

#[cfg(any(test, feature = "memory"))]
pub use self::memory::*;
pub use self::postgres::*;
