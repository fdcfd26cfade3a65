mod env;
mod interpreter;
mod value;

pub use crate::interpreter::Interpreter;
pub use crate::value::Value;
