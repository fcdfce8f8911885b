pub mod display;
pub mod error;
pub mod rating;
pub mod time_value;
pub mod types;

#[cfg(feature = "acquisition")]
pub mod acquisition;

#[cfg(feature = "acquisition")]
pub mod report;

#[cfg(feature = "calculators")]
pub mod calculators;

#[cfg(feature = "records")]
pub mod records;

pub use error::DealModelError;
pub use types::*;

/// Standard result type for all deal-model operations
pub type DealModelResult<T> = Result<T, DealModelError>;
