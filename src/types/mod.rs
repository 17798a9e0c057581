//! Core value types.

mod value;

pub use value::{DataType, Value};
