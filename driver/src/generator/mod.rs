pub mod event;

pub use event::{build_event_rows, GeneratorConfig};
