pub mod logger;
pub mod panorama;
