//! The cut-sequencing engine.
//!
//! A [`Cutflow`] is a mutable binary tree of [`Cut`](crate::Cut)s. Each record
//! is pushed through it once, from the root down: a passing cut hands the record
//! to its right child, a failing cut to its left child, and the walk ends at the
//! first cut with no child on the chosen side.
//!
//! ## How the parts work together
//!
//! ```text
//!  Cut::predicate / Cut::weighted / cut!{..}
//!               │
//!               v
//!  set_root / insert / replace / remove          (tree.rs)
//!    - arena of cut slots (arena.rs)
//!    - name registry kept in bijection with the reachable cuts
//!               │
//!               v
//!  run / run_observed / run_for                  (evaluate.rs)
//!    - predicate + weight chain, timed per cut
//!    - pass/fail counters, raw and weighted
//!               │
//!      ┌────────┼─────────────────┐
//!      v        v                 v
//!  render    write_cflow       tally / absorb    (render.rs, export.rs,
//!  print     write_csv         read_cflow         snapshot.rs)
//!            write_mermaid
//! ```
//!
//! ## Responsibilities by module
//!
//! - `arena.rs`: slot storage addressed by [`CutId`](crate::CutId); slots are
//!   never reused.
//! - `tree.rs`: the `Cutflow` type, lookups and the four graph mutations.
//! - `evaluate.rs`: the evaluation walk and the [`EvalObserver`] hooks.
//! - `traverse.rs`: terminus and progeny searches, preorder walks.
//! - `render.rs`: the text tree dump.
//! - `export.rs`: `.cflow`, CSV and mermaid files.
//! - `snapshot.rs`: shard merging and reading `.cflow` files back.
//!
//! ## Debugging
//!
//! Mutations and exports log at `debug` level under the `cutflow` target; set
//! `RUST_LOG=cutflow=debug` with a logger installed to see them. For per-cut
//! tracing of the walk, install a debugger with [`Cutflow::set_debugger`] or
//! pass an [`EvalObserver`] to [`Cutflow::run_observed`].

#[path = "engine/arena.rs"]
mod arena;
#[path = "engine/evaluate.rs"]
mod evaluate;
#[path = "engine/export.rs"]
mod export;
#[path = "engine/render.rs"]
mod render;
#[path = "engine/snapshot.rs"]
mod snapshot;
#[path = "engine/traverse.rs"]
mod traverse;
#[path = "engine/tree.rs"]
mod tree;


pub use evaluate::{EvalObserver, NoObserver, Outcome};
pub use snapshot::CutTally;
pub use tree::{CutRef, Cutflow, Debugger};
