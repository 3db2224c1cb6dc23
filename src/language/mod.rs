pub mod ast;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;
pub mod typecheck;
pub mod types;

pub use parser::parse_program;
