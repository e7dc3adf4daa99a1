pub mod buffer;
pub mod feature;
pub mod projection;
pub mod raster;
pub mod spatial;
pub mod validator;
