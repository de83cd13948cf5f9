mod type_utils;
mod value_utils;

pub use type_utils::*;
pub use value_utils::*;
