pub mod alert_errors;
pub mod constants;
pub mod detector;
pub mod display;
pub mod logging;
pub mod observations;
pub mod settings;
pub mod time;

pub use alert_errors::{AlertError, DataFormatError};
pub use detector::export::ExportOptions;
pub use detector::{Detector, StaticShips};
pub use observations::{Dataset, Observation};
