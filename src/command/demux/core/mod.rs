mod core;
pub mod params;

pub use self::core::demultiplex;
