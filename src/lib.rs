pub mod categorical;
pub mod dimred;
pub mod error;
pub mod indicator;
pub mod svd;
mod utils;

pub use categorical::{CategorySchema, CategoryValue, Observation};
pub use dimred::mca::{mca, MCABuilder, MCAOptions, MCAResult, RowScaling, MCA};
pub use error::MCAError;
