use thiserror::Error;

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("Invalid bracket: lower bound {lower} exceeds upper bound {upper}")]
    InvalidBracket { lower: f64, upper: f64 },

    #[error("Function has the same sign at both ends of [{lower}, {upper}]")]
    NoSignChange { lower: f64, upper: f64 },

    #[error("No root of the binary entropy for target {target}")]
    NoRoot { target: f64 },

    #[error("Invalid knob vector for {algorithm}: expected {expected} knobs, got {got}")]
    KnobArity {
        algorithm: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EstimatorError>;
