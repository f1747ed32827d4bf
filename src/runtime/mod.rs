//! Tree-walking execution of smol programs

mod environment;
mod interpreter;
mod value;

pub use environment::Environment;
pub use interpreter::{
    Interpreter, InterpreterOptions, DEFAULT_MAX_LOOP_ITERATIONS, DISPLAY_HEIGHT, DISPLAY_WIDTH,
};
pub use value::Value;
