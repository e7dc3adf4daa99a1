pub mod aoi;
pub mod features;
pub mod reader;

#[cfg(test)]
pub(crate) mod fixtures;

pub use aoi::{AreaOfInterest, filter_by_aoi, read_aoi};
pub use features::read_features;
pub use reader::Dsm;
