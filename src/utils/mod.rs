pub mod dataset;
pub mod float;
pub mod progress;
pub mod tap;
