pub mod conformance;
pub mod diagnostics;
