pub mod controller;
pub mod coordinator;
pub mod version;

pub use controller::SourceController;
pub use coordinator::{Coordinator, Handled, RunStats};
