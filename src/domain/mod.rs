pub mod catalog;
pub mod location;
pub mod observation;

pub use catalog::{MetricCatalog, MetricDefinition};
pub use location::{Location, LocationTable};
pub use observation::{ObservationSet, PollutantReading, date_key, is_fill_value};
