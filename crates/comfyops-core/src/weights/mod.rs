//! Weight download domain types.
//!
//! These types define the interface between the download manager, its
//! fetch strategies and the adapters that render a run's report.

mod category;
mod entry;
mod errors;

pub use category::{CategoryHint, CategorySource, ModelCategory};
pub use entry::{DownloadOutcome, DownloadSummary, OutcomeKind, WeightUrlEntry};
pub use errors::{DownloadError, FetchError, InstallError};
