//! Cuts: the named decision stages of a cutflow.
//!
//! A cut pairs an identity (its unique `name`) with a [`Behavior`], the two
//! callables that decide whether a record passes and what weight it carries at
//! this stage. Counters and timing statistics are mutated only by the
//! evaluation walk in `engine/evaluate.rs`; links are owned by the `Cutflow`
//! that holds the cut and are reset whenever a cut is handed over to one.
//!
//! ```text
//!            parent
//!              │
//!      ┌──── cut ────┐
//!  fail│             │pass
//!    left          right
//! ```

use std::fmt::{self, Write as _};
use std::rc::Rc;

use crate::error::BoxError;
use crate::stats::RunningStat;

/// Stable handle to a cut stored in a `Cutflow`.
///
/// Handles are never reused: once the cut is removed or replaced, lookups with
/// its old handle fail. A handle belongs to the cutflow that issued it and
/// misses in every other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CutId {
    pub(crate) arena: u32,
    pub(crate) slot: usize,
}

impl fmt::Display for CutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot)
    }
}

/// Side of a cut: `Right` is followed on pass, `Left` on fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
}

impl From<bool> for Direction {
    fn from(passed: bool) -> Self {
        if passed { Direction::Right } else { Direction::Left }
    }
}

pub type PredicateFn = Rc<dyn Fn() -> Result<bool, BoxError>>;
pub type WeightFn = Rc<dyn Fn() -> Result<f64, BoxError>>;

/// What a cut does when a record reaches it.
#[derive(Clone)]
pub enum Behavior {
    /// Always passes with weight 1.0 (the conventional root).
    AlwaysPass,
    /// Caller-supplied predicate, weight 1.0.
    Predicate(PredicateFn),
    /// Caller-supplied predicate and weight.
    PredicateWithWeight(PredicateFn, WeightFn),
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::AlwaysPass => write!(f, "AlwaysPass"),
            Behavior::Predicate(_) => write!(f, "Predicate(<function>)"),
            Behavior::PredicateWithWeight(_, _) => write!(f, "PredicateWithWeight(<function>, <function>)"),
        }
    }
}

impl Behavior {
    pub(crate) fn evaluate(&self) -> Result<bool, BoxError> {
        match self {
            Behavior::AlwaysPass => Ok(true),
            Behavior::Predicate(eval) | Behavior::PredicateWithWeight(eval, _) => eval(),
        }
    }

    pub(crate) fn weight(&self) -> Result<f64, BoxError> {
        match self {
            Behavior::AlwaysPass | Behavior::Predicate(_) => Ok(1.0),
            Behavior::PredicateWithWeight(_, weight) => weight(),
        }
    }
}

/// A single selection stage.
#[derive(Debug, Clone)]
pub struct Cut {
    pub(crate) name: String,
    pub(crate) behavior: Behavior,
    pub(crate) parent: Option<CutId>,
    pub(crate) left: Option<CutId>,
    pub(crate) right: Option<CutId>,
    pub(crate) n_pass: u64,
    pub(crate) n_fail: u64,
    pub(crate) n_pass_weighted: f64,
    pub(crate) n_fail_weighted: f64,
    pub(crate) runtimes: RunningStat,
}

impl Cut {
    /// A cut that always passes with weight 1.0.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_behavior(name, Behavior::AlwaysPass)
    }

    pub fn with_behavior(name: impl Into<String>, behavior: Behavior) -> Self {
        Cut {
            name: name.into(),
            behavior,
            parent: None,
            left: None,
            right: None,
            n_pass: 0,
            n_fail: 0,
            n_pass_weighted: 0.0,
            n_fail_weighted: 0.0,
            runtimes: RunningStat::new(),
        }
    }

    /// A cut backed by an infallible predicate.
    pub fn predicate(name: impl Into<String>, eval: impl Fn() -> bool + 'static) -> Self {
        Self::try_predicate(name, move || Ok(eval()))
    }

    /// A cut backed by an infallible predicate and weight.
    pub fn weighted(
        name: impl Into<String>,
        eval: impl Fn() -> bool + 'static,
        weight: impl Fn() -> f64 + 'static,
    ) -> Self {
        Self::try_weighted(name, move || Ok(eval()), move || Ok(weight()))
    }

    /// A cut backed by a predicate that may fail.
    pub fn try_predicate(name: impl Into<String>, eval: impl Fn() -> Result<bool, BoxError> + 'static) -> Self {
        Self::with_behavior(name, Behavior::Predicate(Rc::new(eval)))
    }

    pub fn try_weighted(
        name: impl Into<String>,
        eval: impl Fn() -> Result<bool, BoxError> + 'static,
        weight: impl Fn() -> Result<f64, BoxError> + 'static,
    ) -> Self {
        Self::with_behavior(name, Behavior::PredicateWithWeight(Rc::new(eval), Rc::new(weight)))
    }

    /// Attach an infallible weight to this cut, keeping its predicate.
    pub fn with_weight(self, weight: impl Fn() -> f64 + 'static) -> Self {
        let weight: WeightFn = Rc::new(move || Ok(weight()));
        let behavior = match self.behavior {
            Behavior::AlwaysPass => Behavior::PredicateWithWeight(Rc::new(|| Ok(true)), weight),
            Behavior::Predicate(eval) | Behavior::PredicateWithWeight(eval, _) => {
                Behavior::PredicateWithWeight(eval, weight)
            }
        };
        Cut { behavior, ..self }
    }

    /// A fresh, unlinked cut named `new_name` that shares this cut's callables.
    ///
    /// Counters and timings start from zero.
    pub fn clone_as(&self, new_name: impl Into<String>) -> Cut {
        Self::with_behavior(new_name, self.behavior.clone())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> &Behavior {
        &self.behavior
    }

    pub fn parent(&self) -> Option<CutId> {
        self.parent
    }

    pub fn left(&self) -> Option<CutId> {
        self.left
    }

    pub fn right(&self) -> Option<CutId> {
        self.right
    }

    pub fn child(&self, direction: Direction) -> Option<CutId> {
        match direction {
            Direction::Left => self.left,
            Direction::Right => self.right,
        }
    }

    pub fn n_pass(&self) -> u64 {
        self.n_pass
    }

    pub fn n_fail(&self) -> u64 {
        self.n_fail
    }

    pub fn n_pass_weighted(&self) -> f64 {
        self.n_pass_weighted
    }

    pub fn n_fail_weighted(&self) -> f64 {
        self.n_fail_weighted
    }

    /// Wall-clock cost of each evaluation at this cut, in milliseconds.
    pub fn runtimes(&self) -> &RunningStat {
        &self.runtimes
    }

    /// True when every weighted counter equals its raw counterpart.
    pub fn is_unweighted(&self) -> bool {
        self.n_pass as f64 == self.n_pass_weighted && self.n_fail as f64 == self.n_fail_weighted
    }

    pub(crate) fn child_mut(&mut self, direction: Direction) -> &mut Option<CutId> {
        match direction {
            Direction::Left => &mut self.left,
            Direction::Right => &mut self.right,
        }
    }

    /// Drop all links, keeping identity, behavior and counters.
    pub(crate) fn detached(mut self) -> Cut {
        self.parent = None;
        self.left = None;
        self.right = None;
        self
    }

    /// Multi-line summary of this cut; `names` resolves linked handles.
    pub fn summary(&self, names: impl Fn(CutId) -> Option<String>) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "---- {} ----", self.name);
        let _ = writeln!(out, " - Pass (raw): {}", self.n_pass);
        let _ = writeln!(out, " - Fail (raw): {}", self.n_fail);
        if self.n_pass as f64 != self.n_pass_weighted {
            let _ = writeln!(out, " - Pass (wgt): {}", self.n_pass_weighted);
        }
        if self.n_fail as f64 != self.n_fail_weighted {
            let _ = writeln!(out, " - Fail (wgt): {}", self.n_fail_weighted);
        }
        let right = self.right.and_then(&names).unwrap_or_else(|| "None".to_string());
        let left = self.left.and_then(&names).unwrap_or_else(|| "None".to_string());
        let _ = writeln!(out, " - Right: {}", right);
        let _ = writeln!(out, " - Left: {}", left);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn default_cut_passes_with_unit_weight() {
        let cut = Cut::new("base");
        assert!(cut.behavior.evaluate().unwrap());
        assert_eq!(cut.behavior.weight().unwrap(), 1.0);
    }

    #[test]
    fn clone_as_shares_callables_with_fresh_counters() {
        let value = Rc::new(Cell::new(3));
        let v = value.clone();
        let mut odd = Cut::predicate("odd", move || v.get() % 2 == 1);
        odd.n_pass = 7;

        let copy = odd.clone_as("odd_again");
        assert_eq!(copy.name(), "odd_again");
        assert_eq!(copy.n_pass(), 0);
        assert!(copy.behavior.evaluate().unwrap());
        value.set(4);
        assert!(!copy.behavior.evaluate().unwrap());
        assert!(!odd.behavior.evaluate().unwrap());
    }

    #[test]
    fn with_weight_keeps_predicate() {
        let cut = Cut::predicate("never", || false).with_weight(|| 2.5);
        assert!(!cut.behavior.evaluate().unwrap());
        assert_eq!(cut.behavior.weight().unwrap(), 2.5);

        let base = Cut::new("base").with_weight(|| 0.5);
        assert!(base.behavior.evaluate().unwrap());
        assert_eq!(base.behavior.weight().unwrap(), 0.5);
    }

    #[test]
    fn summary_lists_weighted_counts_only_when_divergent() {
        let mut cut = Cut::new("sel");
        cut.n_pass = 2;
        cut.n_pass_weighted = 4.0;
        cut.n_fail = 1;
        cut.n_fail_weighted = 1.0;
        let text = cut.summary(|_| None);
        assert!(text.contains(" - Pass (wgt): 4\n"));
        assert!(!text.contains("Fail (wgt)"));
        assert!(text.ends_with(" - Right: None\n - Left: None\n"));
    }

    #[test]
    fn direction_from_outcome() {
        assert_eq!(Direction::from(true), Direction::Right);
        assert_eq!(Direction::from(false), Direction::Left);
    }
}
