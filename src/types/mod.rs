//! Type definitions for mitra-report

mod aggregate;
mod analytics;
mod error;
mod period;
mod record;
mod status;

pub use aggregate::*;
pub use analytics::*;
pub use error::*;
pub use period::*;
pub use record::*;
pub use status::*;
