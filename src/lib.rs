pub mod config;
pub mod language;
pub mod pipeline;
pub mod runtime;
pub mod tools;

#[cfg(test)]
mod tests;
