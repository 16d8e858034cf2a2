pub mod harvest;
pub mod harvester;

pub use harvest::{load_harvest_config, HarvestConfig};
pub use harvester::Args;
