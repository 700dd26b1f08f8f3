pub mod schema;
pub mod domain;
pub mod error;
pub mod ranking;
pub mod awards;
pub mod export;
pub mod prelude;
pub mod mock;

pub use error::*;
