//! Error taxonomy for the cut-sequencing engine.
//!
//! Three families surface to callers:
//!
//! - **Structural** errors (`UnknownCut`, `DuplicateCut`, `AmbiguousRemoval`) are
//!   raised synchronously by the mutation that detected them. The tree is left
//!   exactly as it was before the call.
//! - **Callable** errors wrap a failure returned by a user predicate or weight
//!   function, annotated with the cut that produced it. The walk for the current
//!   record stops there.
//! - **UnsetRoot** is returned by anything that needs a root before one exists.
//!
//! Export and snapshot I/O add `Io`, `Csv` and `Parse`.

use std::fmt;

use thiserror::Error;

/// Error type returned by user-supplied predicates, weights and side effects.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T> = std::result::Result<T, CutflowError>;

/// Which callable of a cut failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Evaluate,
    Weight,
}

impl fmt::Display for CallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStage::Evaluate => write!(f, "eval execution"),
            CallStage::Weight => write!(f, "weight computation"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CutflowError {
    #[error("Cutflow::{op}: {name} does not exist in cutflow")]
    UnknownCut { op: &'static str, name: String },
    #[error("Cutflow::{op}: {name} already exists in cutflow")]
    DuplicateCut { op: &'static str, name: String },
    #[error(
        "Cutflow::remove: {name} has both a left and right cut; use Cutflow::set_root or Cutflow::replace to modify it instead"
    )]
    AmbiguousRemoval { name: String },
    #[error("Cutflow::{op}: no root node set")]
    UnsetRoot { op: &'static str },
    #[error("cut '{cut}' raised an error during {stage}: {source}")]
    Callable {
        cut: String,
        stage: CallStage,
        #[source]
        source: BoxError,
    },
    #[error("side effect booked on cut '{cut}' failed: {source}")]
    Effect {
        cut: String,
        #[source]
        source: BoxError,
    },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("malformed cflow line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("invalid orientation '{0}' (expected TD or LR)")]
    InvalidOrientation(String),
}

impl CutflowError {
    /// True for errors raised by graph mutations (the tree is untouched).
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            CutflowError::UnknownCut { .. } | CutflowError::DuplicateCut { .. } | CutflowError::AmbiguousRemoval { .. }
        )
    }

    pub(crate) fn unknown(op: &'static str, name: impl Into<String>) -> Self {
        CutflowError::UnknownCut { op, name: name.into() }
    }

    pub(crate) fn duplicate(op: &'static str, name: impl Into<String>) -> Self {
        CutflowError::DuplicateCut { op, name: name.into() }
    }
}
