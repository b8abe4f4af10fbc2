use std::path::PathBuf;
use thiserror::Error;

pub mod codes;

pub use codes::{describe_error_code, ErrorCode};

/// The error type for graph construction and execution
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("broken stage chain: {stage} has no input before reaching the source")]
    BrokenChain { stage: String },

    #[error("stage #{0} does not belong to this chain")]
    UnknownStage(usize),

    #[error("{stage} is already connected")]
    AlreadyConnected { stage: String },

    #[error("source stage cannot be attached downstream of {upstream}")]
    SourceNotFirst { upstream: String },

    #[error("pipeline must start with a source stage, found {stage}")]
    NotASource { stage: String },

    #[error("connecting {upstream} to {downstream} would create a cycle")]
    ChainCycle { upstream: String, downstream: String },

    #[error("sort stage requires at least one key")]
    EmptySortKeys,

    #[error("invalid sort specification: {0}")]
    InvalidSortSpec(String),

    #[error("unknown join strategy: {0} (expected inner, left, right, outer or cross)")]
    UnknownStrategy(String),

    #[error("field '{field}' is missing from record")]
    MissingField { field: String },

    #[error("pipeline {pipeline} has not been computed yet")]
    NotComputed { pipeline: String },

    #[error("circular dependency detected involving pipeline {0}")]
    CircularDependency(String),

    #[error("no input file configured for {stage}")]
    MissingInput { stage: String },

    #[error("{stage} failed: {source}")]
    Operation {
        stage: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("not a record: {context}")]
    NotAnObject { context: String },

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON record at {}:{line}: {source}", path.display())]
    MalformedRecord {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),
}

impl GraphError {
    /// Numeric code from the [`ErrorCode`] registry
    pub fn code(&self) -> u16 {
        match self {
            Self::BrokenChain { .. } => ErrorCode::BUILD_BROKEN_CHAIN,
            Self::UnknownStage(_) => ErrorCode::BUILD_UNKNOWN_STAGE,
            Self::AlreadyConnected { .. } => ErrorCode::BUILD_ALREADY_CONNECTED,
            Self::SourceNotFirst { .. } => ErrorCode::BUILD_SOURCE_NOT_FIRST,
            Self::NotASource { .. } => ErrorCode::BUILD_NOT_A_SOURCE,
            Self::ChainCycle { .. } => ErrorCode::BUILD_CHAIN_CYCLE,
            Self::EmptySortKeys => ErrorCode::BUILD_EMPTY_SORT_KEYS,
            Self::InvalidSortSpec(_) => ErrorCode::BUILD_INVALID_SORT_SPEC,
            Self::UnknownStrategy(_) => ErrorCode::BUILD_UNKNOWN_STRATEGY,
            Self::MissingField { .. } => ErrorCode::EXEC_MISSING_FIELD,
            Self::NotComputed { .. } => ErrorCode::EXEC_NOT_COMPUTED,
            Self::CircularDependency(_) => ErrorCode::EXEC_CIRCULAR_DEPENDENCY,
            Self::MissingInput { .. } => ErrorCode::EXEC_MISSING_INPUT,
            Self::Operation { .. } => ErrorCode::EXEC_OPERATION_FAILED,
            Self::NotAnObject { .. } => ErrorCode::EXEC_NOT_AN_OBJECT,
            Self::Io { .. } => ErrorCode::IO_FAILED,
            Self::MalformedRecord { .. } => ErrorCode::IO_MALFORMED_RECORD,
            Self::Serialization(_) => ErrorCode::IO_SERIALIZATION,
            Self::Config(_) => ErrorCode::CONFIG_INVALID,
        }
    }

    /// Whether the error was raised while wiring stages rather than running them
    pub fn is_construction_error(&self) -> bool {
        (1000..2000).contains(&self.code())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
