//! The evaluation walk.
//!
//! One call to [`Cutflow::run`] is one top-to-bottom walk from the root:
//!
//! ```text
//! cut ── evaluate() + weight chain (timed) ──┬─ pass: n_pass += 1, n_pass_weighted += w ─> right
//!                                            └─ fail: n_fail += 1, n_fail_weighted += w ─> left
//! ```
//!
//! The walk stops at the first cut with no child on the taken side; that cut is
//! the walk's terminal and its outcome is the walk's outcome. The effective
//! weight of a cut is the product of its own weight and every ancestor's
//! weight, recomputed on every visit since the callables read per-record state.
//!
//! A failing callable is logged with the cut's name and returned as
//! [`CutflowError::Callable`]; counters already updated further up the walk are
//! kept.

use std::time::Instant;

use log::error;

use super::tree::{CutRef, Cutflow};
use crate::cut::{Cut, CutId};
use crate::error::{CallStage, CutflowError, Result};

/// Hooks into the evaluation walk.
///
/// Observers only look: they cannot change control flow or counters.
pub trait EvalObserver {
    /// Called with each cut right before it is evaluated.
    fn visit(&mut self, _cut: &Cut) {}

    /// Called after `cut` passed and its counters were updated, with the
    /// record's effective weight at `cut`.
    fn passed(&mut self, _cut: &Cut, _weight: f64) {}
}

/// An observer that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoObserver;

impl EvalObserver for NoObserver {}

/// Where a walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Last cut evaluated.
    pub terminus: CutId,
    /// Whether that cut passed.
    pub passed: bool,
}

impl Cutflow {
    /// Run the cutflow once for the current record.
    ///
    /// Returns whether the terminal cut of the walk passed.
    pub fn run(&mut self) -> Result<bool> {
        self.walk("run", &mut NoObserver).map(|outcome| outcome.passed)
    }

    /// Run once, reporting each step to `observer`.
    pub fn run_observed(&mut self, observer: &mut dyn EvalObserver) -> Result<Outcome> {
        self.walk("run", observer)
    }

    /// Run once and report whether the walk passed *through* `target`.
    pub fn run_for<'a>(&mut self, target: impl Into<CutRef<'a>>) -> Result<bool> {
        let target = self.resolve("run", target.into())?;
        self.walk_through(&[target], &mut NoObserver).map(|through| through == [true])
    }

    /// Run once and report, per target, whether the walk passed through it.
    pub fn run_for_all<'a, T>(&mut self, targets: impl IntoIterator<Item = T>) -> Result<Vec<bool>>
    where
        T: Into<CutRef<'a>>,
    {
        let targets = self.resolve_all("run", targets)?;
        self.walk_through(&targets, &mut NoObserver)
    }

    /// Effective weight of the current record at `target`.
    pub fn weight_at<'a>(&self, target: impl Into<CutRef<'a>>) -> Result<f64> {
        let id = self.resolve("weight_at", target.into())?;
        self.effective_weight(id)
    }

    pub(crate) fn resolve_all<'a, T>(
        &self,
        op: &'static str,
        targets: impl IntoIterator<Item = T>,
    ) -> Result<Vec<CutId>>
    where
        T: Into<CutRef<'a>>,
    {
        targets.into_iter().map(|target| self.resolve(op, target.into())).collect()
    }

    /// One walk; `n_pass` of each target is compared before and after.
    pub(crate) fn walk_through(&mut self, targets: &[CutId], observer: &mut dyn EvalObserver) -> Result<Vec<bool>> {
        let before: Vec<u64> = targets.iter().map(|&id| self.arena[id].n_pass).collect();
        self.walk("run", observer)?;
        Ok(targets.iter().zip(before).map(|(&id, n)| self.arena[id].n_pass > n).collect())
    }

    pub(crate) fn walk(&mut self, op: &'static str, observer: &mut dyn EvalObserver) -> Result<Outcome> {
        let mut current = self.root.ok_or(CutflowError::UnsetRoot { op })?;

        loop {
            if let Some(debugger) = self.debugger.as_mut() {
                debugger(&self.arena[current]);
            }
            observer.visit(&self.arena[current]);

            let start = Instant::now();
            let passed = self.result_of(current)?;
            let weight = self.effective_weight(current)?;
            let runtime_ms = start.elapsed().as_secs_f64() * 1e3;

            let cut = &mut self.arena[current];
            cut.runtimes.push(runtime_ms);
            let next = if passed {
                cut.n_pass += 1;
                cut.n_pass_weighted += weight;
                observer.passed(cut, weight);
                cut.right
            } else {
                cut.n_fail += 1;
                cut.n_fail_weighted += weight;
                cut.left
            };

            match next {
                Some(child) => current = child,
                None => return Ok(Outcome { terminus: current, passed }),
            }
        }
    }

    fn result_of(&self, id: CutId) -> Result<bool> {
        let cut = &self.arena[id];
        cut.behavior.evaluate().map_err(|source| {
            error!("Cut '{}' raised an exception during eval execution: {}", cut.name, source);
            CutflowError::Callable { cut: cut.name.clone(), stage: CallStage::Evaluate, source }
        })
    }

    /// Product of the weights from `id` up to the root.
    pub(crate) fn effective_weight(&self, id: CutId) -> Result<f64> {
        let mut weight = 1.0;
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let cut = &self.arena[current];
            weight *= cut.behavior.weight().map_err(|source| {
                error!("Cut '{}' raised an exception during weight computation: {}", cut.name, source);
                CutflowError::Callable { cut: cut.name.clone(), stage: CallStage::Weight, source }
            })?;
            cursor = cut.parent;
        }
        Ok(weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::Direction;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[test]
    fn run_without_root_fails() {
        let mut cutflow = Cutflow::new("empty");
        assert!(matches!(cutflow.run(), Err(CutflowError::UnsetRoot { op: "run" })));
    }

    #[test]
    fn weight_chain_multiplies_ancestors() {
        let mut cutflow = Cutflow::with_root("w", Cut::new("root").with_weight(|| 2.0));
        cutflow.insert("root", Cut::weighted("mid", || true, || 0.5), Direction::Right).unwrap();
        cutflow.insert("mid", Cut::weighted("leaf", || true, || 3.0), Direction::Right).unwrap();

        assert_eq!(cutflow.weight_at("leaf").unwrap(), 3.0);
        assert!(cutflow.run().unwrap());
        assert_eq!(cutflow.cut("leaf").unwrap().n_pass_weighted(), 3.0);
        assert_eq!(cutflow.cut("mid").unwrap().n_pass_weighted(), 1.0);
    }

    #[test]
    fn failing_predicate_is_annotated() {
        let mut cutflow = Cutflow::with_root("err", Cut::new("root"));
        cutflow.insert("root", Cut::try_predicate("bad", || Err("no such branch".into())), Direction::Right).unwrap();

        let err = cutflow.run().unwrap_err();
        match err {
            CutflowError::Callable { cut, stage, source } => {
                assert_eq!(cut, "bad");
                assert_eq!(stage, CallStage::Evaluate);
                assert_eq!(source.to_string(), "no such branch");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(cutflow.cut("root").unwrap().n_pass(), 1);
        assert_eq!(cutflow.cut("bad").unwrap().n_pass() + cutflow.cut("bad").unwrap().n_fail(), 0);
    }

    #[test]
    fn failing_ancestor_weight_names_the_ancestor() {
        let mut cutflow = Cutflow::with_root(
            "err",
            Cut::try_weighted("root", || Ok(true), || Err("missing scale factor".into())),
        );
        cutflow.insert("root", Cut::new("child"), Direction::Right).unwrap();
        let err = cutflow.weight_at("child").unwrap_err();
        assert!(matches!(err, CutflowError::Callable { ref cut, stage: CallStage::Weight, .. } if cut == "root"));
    }

    #[test]
    fn run_for_reports_pass_through() {
        let value = Rc::new(Cell::new(0));
        let v = value.clone();
        let mut cutflow = Cutflow::with_root("through", Cut::new("root"));
        cutflow.insert("root", Cut::predicate("positive", move || v.get() > 0), Direction::Right).unwrap();
        cutflow.insert("positive", Cut::new("tail"), Direction::Right).unwrap();

        value.set(1);
        assert!(cutflow.run_for("positive").unwrap());
        value.set(-1);
        assert!(!cutflow.run_for("positive").unwrap());
        value.set(5);
        assert_eq!(cutflow.run_for_all(["root", "positive", "tail"]).unwrap(), vec![true, true, true]);
        assert!(cutflow.run_for("missing").is_err());
    }

    #[test]
    fn observer_sees_visits_and_passes() {
        let mut cutflow = Cutflow::with_root("obs", Cut::new("root"));
        cutflow.insert("root", Cut::predicate("never", || false), Direction::Right).unwrap();

        #[derive(Default)]
        struct Trace {
            visited: Vec<String>,
            passed: Vec<(String, f64)>,
        }
        impl EvalObserver for Trace {
            fn visit(&mut self, cut: &Cut) {
                self.visited.push(cut.name().to_string());
            }
            fn passed(&mut self, cut: &Cut, weight: f64) {
                self.passed.push((cut.name().to_string(), weight));
            }
        }

        let mut trace = Trace::default();
        let outcome = cutflow.run_observed(&mut trace).unwrap();
        assert!(!outcome.passed);
        assert_eq!(cutflow.name_of(outcome.terminus), Some("never"));
        assert_eq!(trace.visited, ["root", "never"]);
        assert_eq!(trace.passed, [("root".to_string(), 1.0)]);
    }

    #[test]
    fn debugger_runs_on_every_walk() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        let mut cutflow = Cutflow::with_root("dbg", Cut::new("root"));
        cutflow.set_debugger(move |cut: &Cut| log.borrow_mut().push(cut.name().to_string()));
        cutflow.run().unwrap();
        cutflow.run().unwrap();
        assert_eq!(*seen.borrow(), ["root", "root"]);
    }

    #[test]
    fn timings_are_recorded_per_visit() {
        let mut cutflow = Cutflow::with_root("t", Cut::new("root"));
        for _ in 0..3 {
            cutflow.run().unwrap();
        }
        let runtimes = cutflow.cut("root").unwrap().runtimes();
        assert_eq!(runtimes.len(), 3);
        assert!(runtimes.min() >= 0.0);
    }
}
