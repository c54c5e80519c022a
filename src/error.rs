//! Error type shared by the codec, domains, and engines.
//!
//! Every failure in this crate is fatal to the search: a silently-bad state
//! would corrupt the visited bitmap and with it the optimality proof. There
//! is no recoverable path; callers propagate with `?` up to the binary.

use std::fmt;
use std::io;

/// The error type for instance loading and search execution.
#[derive(Debug)]
pub enum SolveError {
    /// Malformed instance text.
    Parse {
        /// 1-based line number in the instance stream.
        line: usize,
        /// What went wrong.
        msg: String,
    },
    /// The state space exceeds the representable rank width, or a layer
    /// radix failed the floating-point overflow cross-check.
    TooLarge(String),
    /// A fixed-capacity resource ran out: the DDD buffer could not repack,
    /// the in-memory queue wrapped onto itself, or an allocation failed.
    Capacity(String),
    /// An internal invariant was breached (encode produced a rank ≥ N,
    /// decode left the configuration inconsistent). These are bugs, not
    /// user errors.
    Invariant(String),
    /// A frontier file could not be read or written.
    Io(io::Error),
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { line, msg } => write!(f, "parse error at line {line}: {msg}"),
            Self::TooLarge(msg) => write!(f, "state space too large: {msg}"),
            Self::Capacity(msg) => write!(f, "capacity exhausted: {msg}"),
            Self::Invariant(msg) => write!(f, "invariant breached: {msg}"),
            Self::Io(err) => write!(f, "frontier i/o failed: {err}"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for SolveError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, SolveError>;
