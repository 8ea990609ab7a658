//! Services for input loading, aggregation and ranking

pub mod aggregator;
pub mod data_loader;
pub mod normalizer;
pub mod period;
pub mod ranking;
pub mod scoring;

pub use aggregator::{Aggregator, Grouped};
pub use data_loader::{DataLoader, DataQuality, ReportInput};
pub use ranking::{rank, top_n_by, Direction, SortField, SortSpec};
pub use scoring::{
    activity_level, retention_level, HubCapacity, HubVolume, MetricStatus, PartnerTier,
    ProjectTier, ScoreBreakdown, ScoreInputs, ScoreProfile, TaskLevel,
};
