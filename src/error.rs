#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(
        "division by zero{}",
        .index.map(|i| format!(": x[{i}] is zero")).unwrap_or_default()
    )]
    DivisionByZero { index: Option<usize> },
    #[error("evaluation error: {0}")]
    Evaluation(String),
    #[error("input must be one dimensional, got {nrows}x{ncols}")]
    NotOneDimensional { nrows: usize, ncols: usize },
    #[error("block size must be at least one")]
    InvalidBlockSize,
    #[error("unknown strategy: {0}")]
    UnknownStrategy(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
