pub mod log;
pub mod tally;

pub use log::LogManager;
pub use tally::StageTally;
