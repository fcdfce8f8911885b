//! Acquisition deal model.
//!
//! A strict four-layer pipeline: [`structuring`] → [`debt`] → [`coverage`] →
//! [`projection`]. Layers 1–3 make up the single-year model that the
//! standalone calculators reuse; [`analysis`] runs the whole pipeline.

pub mod analysis;
pub mod coverage;
pub mod debt;
pub mod inputs;
pub mod projection;
pub mod scenarios;
#[cfg(feature = "sensitivity")]
pub mod sensitivity;
pub mod structuring;
pub mod valuation;

pub use analysis::{
    analyze, analyze_acquisition, analyze_acquisition_with_settings, analyze_with_settings,
    single_year,
};
pub use analysis::{CalculatedMetrics, SingleYearModel};
pub use inputs::{AcquisitionInputs, ValidatedInputs};
