mod error;
mod log;

pub use error::{Error, Result};
pub use self::log::*;
