use std::fmt;

/// Solver errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError
{
    /// Malformed or inconsistent configuration.
    Config(String),
    /// Operation invoked before initialization or after release.
    InvalidState(String),
    /// Block overlap, prox ranges not partitioning the variable,
    /// or an otherwise inconsistent problem structure.
    InvalidStructure(String),
    /// Runtime dimension disagreement.
    ShapeMismatch(String),
    /// Device allocation or driver failure.
    Resource(String),
    /// Non-finite values detected during iteration.
    NumericFailure(String),
}

impl fmt::Display for SolverError
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match &self {
            SolverError::Config(s)           => write!(f, "Config: {}", s),
            SolverError::InvalidState(s)     => write!(f, "InvalidState: {}", s),
            SolverError::InvalidStructure(s) => write!(f, "InvalidStructure: {}", s),
            SolverError::ShapeMismatch(s)    => write!(f, "ShapeMismatch: {}", s),
            SolverError::Resource(s)         => write!(f, "Resource: {}", s),
            SolverError::NumericFailure(s)   => write!(f, "NumericFailure: {}", s),
        }
    }
}

impl std::error::Error for SolverError {}
