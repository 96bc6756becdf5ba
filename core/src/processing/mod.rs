pub mod frame_stats;
pub mod jump;
pub mod movement;
pub mod moving_average;
pub mod piv_align;
pub mod sanitize;
pub mod track_filter;
pub mod track_smooth;

pub use frame_stats::FrameAggregator;
pub use jump::JumpFilter;
pub use movement::MovementFilter;
pub use moving_average::GapAwareSmoother;
pub use piv_align::PivAligner;
pub use sanitize::{RowSanitizer, UpperLimitFilter};
pub use track_filter::{TrackFilter, TrackStatsAggregator};
pub use track_smooth::TrackSmoother;
