pub mod interp;
pub mod lowess;
pub mod rolling;
pub mod stats;

pub use interp::InterpHelper;
pub use lowess::LowessEngine;
pub use rolling::RollingHelper;
pub use stats::StatsHelper;
