pub mod builtins;
pub mod environment;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod resolve;
pub mod stack;
pub mod value;

pub use builtins::{OutputEvent, OutputSink, RecordingSink, WriterSink};
pub use error::{RuntimeError, RuntimeResult};
pub use interpreter::{Interpreter, RunOptions};
