//! Cut sequencing for event selections.
//!
//! An analysis is a binary tree of [`Cut`]s held by a [`Cutflow`]. Each record
//! is pushed through the tree once: passing a cut sends it right, failing sends
//! it left. Every cut keeps raw and weighted pass/fail counts plus timing
//! statistics, and the whole tree can be dumped as text, `.cflow` snapshots,
//! per-path CSV tables or a mermaid flowchart.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use cutflow::{Cut, Cutflow, Direction};
//!
//! let value = Rc::new(Cell::new(0_i64));
//! let mut cutflow = Cutflow::with_root("analysis", Cut::new("base"));
//! let v = value.clone();
//! cutflow.insert("base", Cut::predicate("even", move || v.get() % 2 == 0), Direction::Right)?;
//!
//! for input in [2, 3, 4] {
//!     value.set(input);
//!     cutflow.run()?;
//! }
//! assert_eq!(cutflow.cut("even")?.n_pass(), 2);
//! # Ok::<(), cutflow::CutflowError>(())
//! ```
//!
//! [`Histflow`] wraps a cutflow and fires booked side effects whenever a record
//! passes a given cut.

#[macro_use]
mod macros;
mod api;
mod cut;
mod engine;
mod error;
mod histflow;
mod row_writer;
mod stats;

pub use api::{Exports, Orientation, ReportOptions};
pub use cut::{Behavior, Cut, CutId, Direction, PredicateFn, WeightFn};
pub use engine::{CutRef, CutTally, Cutflow, Debugger, EvalObserver, NoObserver, Outcome};
pub use error::{BoxError, CallStage, CutflowError, Result};
pub use histflow::{Condition, Effect, Histflow};
pub use row_writer::RowWriter;
pub use stats::RunningStat;
