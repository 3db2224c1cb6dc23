use thiserror::Error;

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("`{name}` is already declared in this scope")]
    DuplicateDeclaration { name: String },
    #[error("Unknown identifier `{name}`")]
    UnknownIdentifier { name: String },
    #[error("Array index {index} is out of range for length {len}")]
    ArrayIndexOutOfRange { index: i64, len: usize },
    #[error("Function `{name}` expected {expected} arguments but received {received}")]
    ArityMismatch {
        name: String,
        expected: usize,
        received: usize,
    },
    #[error("Type mismatch: {message}")]
    TypeMismatch { message: String },
    #[error("Record `{record}` has no field `{field}`")]
    UnknownField { record: String, field: String },
    #[error("Unknown type `{name}`")]
    UnknownType { name: String },
    #[error("Function `{name}` is declared but never defined")]
    UndefinedFunction { name: String },
    #[error("Function `{function}` reached its end without returning a value")]
    MissingReturn { function: String },
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Array bound `{bound}` is not a constant expression")]
    NonConstantArrayBound { bound: String },
    #[error("Call depth exceeded the limit of {limit}")]
    CallDepthExceeded { limit: usize },
    #[error("Failed to write program output: {0}")]
    Output(#[from] std::io::Error),
}

impl RuntimeError {
    pub fn mismatch(message: impl Into<String>) -> Self {
        RuntimeError::TypeMismatch {
            message: message.into(),
        }
    }

    /// Stable variant name, used by expectation files.
    pub fn kind(&self) -> &'static str {
        match self {
            RuntimeError::DuplicateDeclaration { .. } => "DuplicateDeclaration",
            RuntimeError::UnknownIdentifier { .. } => "UnknownIdentifier",
            RuntimeError::ArrayIndexOutOfRange { .. } => "ArrayIndexOutOfRange",
            RuntimeError::ArityMismatch { .. } => "ArityMismatch",
            RuntimeError::TypeMismatch { .. } => "TypeMismatch",
            RuntimeError::UnknownField { .. } => "UnknownField",
            RuntimeError::UnknownType { .. } => "UnknownType",
            RuntimeError::UndefinedFunction { .. } => "UndefinedFunction",
            RuntimeError::MissingReturn { .. } => "MissingReturn",
            RuntimeError::DivisionByZero => "DivisionByZero",
            RuntimeError::NonConstantArrayBound { .. } => "NonConstantArrayBound",
            RuntimeError::CallDepthExceeded { .. } => "CallDepthExceeded",
            RuntimeError::Output(_) => "Output",
        }
    }
}
