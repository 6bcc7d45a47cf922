//! A cutflow that fires booked side effects as records pass through cuts.
//!
//! Effects are the glue to external aggregation (histogram filling and the
//! like): each booked effect receives the record's effective weight at the cut
//! it is booked on, right after that cut passed and its counters were updated.
//! Effects never change control flow or counters.
//!
//! Failure policy: effects are isolated from each other and from the walk. A
//! failing effect is logged at `warn` level and collected as
//! [`CutflowError::Effect`]; the remaining effects and the rest of the walk
//! still run. Collected failures are drained with
//! [`Histflow::take_effect_errors`].
//!
//! `Histflow` derefs to [`Cutflow`] for lookups, insertion and exports. Every
//! run variant (`run`, `run_observed`, `run_for`, `run_for_all`) fires the
//! schedule, and `set_root`, `replace` and `remove` keep it in step with the
//! tree. `Cutflow` methods reached explicitly through `Deref` bypass it.

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use log::{debug, warn};

use crate::cut::{Cut, CutId};
use crate::engine::{CutRef, Cutflow, EvalObserver, NoObserver, Outcome};
use crate::error::{BoxError, CutflowError, Result};

/// A side effect fed with the effective weight of the passing record.
pub type Effect = Box<dyn FnMut(f64) -> std::result::Result<(), BoxError>>;

/// Extra gate checked before a booked effect fires.
pub type Condition = Box<dyn Fn() -> bool>;

struct Booking {
    condition: Option<Condition>,
    effect: Effect,
}

pub struct Histflow {
    cutflow: Cutflow,
    schedule: HashMap<String, Vec<Booking>>,
    errors: Vec<CutflowError>,
}

impl fmt::Debug for Histflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let booked: usize = self.schedule.values().map(Vec::len).sum();
        f.debug_struct("Histflow")
            .field("cutflow", &self.cutflow)
            .field("booked", &booked)
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl From<Cutflow> for Histflow {
    fn from(cutflow: Cutflow) -> Self {
        Histflow { cutflow, schedule: HashMap::new(), errors: Vec::new() }
    }
}

impl Deref for Histflow {
    type Target = Cutflow;

    fn deref(&self) -> &Cutflow {
        &self.cutflow
    }
}

impl DerefMut for Histflow {
    fn deref_mut(&mut self) -> &mut Cutflow {
        &mut self.cutflow
    }
}

impl Histflow {
    pub fn new(name: impl Into<String>) -> Self {
        Cutflow::new(name).into()
    }

    pub fn with_root(name: impl Into<String>, root: Cut) -> Self {
        Cutflow::with_root(name, root).into()
    }

    pub fn into_inner(self) -> Cutflow {
        self.cutflow
    }

    /// Fire `effect` every time a record passes `target`.
    pub fn book<'a>(
        &mut self,
        target: impl Into<CutRef<'a>>,
        effect: impl FnMut(f64) -> std::result::Result<(), BoxError> + 'static,
    ) -> Result<()> {
        self.schedule_booking("book", target.into(), Booking { condition: None, effect: Box::new(effect) })
    }

    /// Like [`Histflow::book`], but only fire when `condition` holds for the
    /// current record.
    pub fn book_if<'a>(
        &mut self,
        target: impl Into<CutRef<'a>>,
        condition: impl Fn() -> bool + 'static,
        effect: impl FnMut(f64) -> std::result::Result<(), BoxError> + 'static,
    ) -> Result<()> {
        let booking = Booking { condition: Some(Box::new(condition)), effect: Box::new(effect) };
        self.schedule_booking("book", target.into(), booking)
    }

    /// Number of effects booked on `target`.
    pub fn booked<'a>(&self, target: impl Into<CutRef<'a>>) -> Result<usize> {
        let id = self.cutflow.resolve("booked", target.into())?;
        Ok(self.schedule.get(self.cut_name(id)).map_or(0, Vec::len))
    }

    /// Effect failures collected since the last call.
    pub fn take_effect_errors(&mut self) -> Vec<CutflowError> {
        mem::take(&mut self.errors)
    }

    /// Run once, firing the effects booked on every cut the record passes.
    pub fn run(&mut self) -> Result<bool> {
        self.run_observed(&mut NoObserver).map(|outcome| outcome.passed)
    }

    /// Run once, reporting each step to `observer` before the booked effects
    /// of a passing cut fire.
    pub fn run_observed(&mut self, observer: &mut dyn EvalObserver) -> Result<Outcome> {
        self.walk_with(observer, |cutflow, scheduler| cutflow.walk("run", scheduler))
    }

    /// Run once and report whether the record passed through `target`.
    pub fn run_for<'a>(&mut self, target: impl Into<CutRef<'a>>) -> Result<bool> {
        let target = self.cutflow.resolve("run", target.into())?;
        self.walk_with(&mut NoObserver, |cutflow, scheduler| cutflow.walk_through(&[target], scheduler))
            .map(|through| through == [true])
    }

    /// Run once and report, per target, whether the record passed through it.
    pub fn run_for_all<'a, T>(&mut self, targets: impl IntoIterator<Item = T>) -> Result<Vec<bool>>
    where
        T: Into<CutRef<'a>>,
    {
        let targets = self.cutflow.resolve_all("run", targets)?;
        self.walk_with(&mut NoObserver, |cutflow, scheduler| cutflow.walk_through(&targets, scheduler))
    }

    /// [`Cutflow::set_root`]; effects booked on a replaced root move to `cut`.
    pub fn set_root(&mut self, cut: Cut) -> Result<CutId> {
        let old = self.cutflow.root().map(|id| self.cut_name(id).to_string());
        let new_name = cut.name().to_string();
        let id = self.cutflow.set_root(cut)?;
        if let Some(old) = old {
            self.move_schedule(&old, new_name);
        }
        Ok(id)
    }

    /// [`Cutflow::replace`]; effects booked on `target` move to `cut`.
    pub fn replace<'a>(&mut self, target: impl Into<CutRef<'a>>, cut: Cut) -> Result<CutId> {
        let target = self.cutflow.resolve("replace", target.into())?;
        let old = self.cut_name(target).to_string();
        let new_name = cut.name().to_string();
        let id = self.cutflow.replace(target, cut)?;
        self.move_schedule(&old, new_name);
        Ok(id)
    }

    /// [`Cutflow::remove`]; effects booked on `target` are dropped.
    pub fn remove<'a>(&mut self, target: impl Into<CutRef<'a>>) -> Result<Cut> {
        let removed = self.cutflow.remove(target)?;
        if let Some(bookings) = self.schedule.remove(removed.name()) {
            debug!("[histflow:{}] dropped {} effect(s) booked on '{}'", self.cutflow.name(), bookings.len(), removed.name());
        }
        Ok(removed)
    }

    fn walk_with<T>(
        &mut self,
        observer: &mut dyn EvalObserver,
        walk: impl FnOnce(&mut Cutflow, &mut dyn EvalObserver) -> Result<T>,
    ) -> Result<T> {
        let mut scheduler = Scheduler { schedule: &mut self.schedule, errors: &mut self.errors, observer };
        walk(&mut self.cutflow, &mut scheduler)
    }

    fn schedule_booking(&mut self, op: &'static str, target: CutRef<'_>, booking: Booking) -> Result<()> {
        let id = self.cutflow.resolve(op, target)?;
        let name = self.cut_name(id).to_string();
        debug!("[histflow:{}] booked effect on '{}'", self.cutflow.name(), name);
        self.schedule.entry(name).or_default().push(booking);
        Ok(())
    }

    fn move_schedule(&mut self, old: &str, new: String) {
        if old == new {
            return;
        }
        if let Some(bookings) = self.schedule.remove(old) {
            self.schedule.entry(new).or_default().extend(bookings);
        }
    }

    fn cut_name(&self, id: CutId) -> &str {
        self.cutflow.arena[id].name()
    }
}

struct Scheduler<'a> {
    schedule: &'a mut HashMap<String, Vec<Booking>>,
    errors: &'a mut Vec<CutflowError>,
    observer: &'a mut dyn EvalObserver,
}

impl EvalObserver for Scheduler<'_> {
    fn visit(&mut self, cut: &Cut) {
        self.observer.visit(cut);
    }

    fn passed(&mut self, cut: &Cut, weight: f64) {
        self.observer.passed(cut, weight);
        let Some(bookings) = self.schedule.get_mut(cut.name()) else {
            return;
        };
        for booking in bookings.iter_mut() {
            if booking.condition.as_ref().is_some_and(|condition| !condition()) {
                continue;
            }
            if let Err(source) = (booking.effect)(weight) {
                warn!("side effect booked on '{}' failed: {}", cut.name(), source);
                self.errors.push(CutflowError::Effect { cut: cut.name().to_string(), source });
            }
        }
    }
}
