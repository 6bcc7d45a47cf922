//! The `Cutflow` container and its graph mutations.
//!
//! A cutflow owns its cuts through an [`Arena`] and keeps a name registry
//! (`record`) alongside the parent/child links. Every mutation keeps the two in
//! bijection: each registered name maps to exactly one cut reachable from the
//! root, and each reachable cut is registered under its own name.
//!
//! All mutations validate first and only then touch the graph, so a failed call
//! leaves links, counters and registry exactly as they were.
//!
//! ```text
//! insert(target, new, Right)      replace(target, new)       remove(target)
//!
//!   target                          parent                    parent
//!     │ right                         │                         │
//!    new            ==>              new       ==>            survivor
//!     │ right                       /   \
//!   old child                   left     right
//! ```

use std::collections::HashMap;
use std::fmt;

use log::debug;

use super::arena::Arena;
use crate::cut::{Cut, CutId, Direction};
use crate::error::{CutflowError, Result};

/// Observer installed with [`Cutflow::set_debugger`], called with each cut
/// right before it is evaluated.
pub type Debugger = Box<dyn FnMut(&Cut)>;

/// A target for a cutflow operation: a registered name or a live handle.
///
/// Handles are per cutflow; a handle issued by another cutflow never resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutRef<'a> {
    Name(&'a str),
    Id(CutId),
}

impl<'a> From<&'a str> for CutRef<'a> {
    fn from(name: &'a str) -> Self {
        CutRef::Name(name)
    }
}

impl<'a> From<&'a String> for CutRef<'a> {
    fn from(name: &'a String) -> Self {
        CutRef::Name(name.as_str())
    }
}

impl From<CutId> for CutRef<'_> {
    fn from(id: CutId) -> Self {
        CutRef::Id(id)
    }
}

/// An analysis represented as a binary tree of cuts.
pub struct Cutflow {
    pub(crate) name: String,
    pub(crate) arena: Arena,
    pub(crate) record: HashMap<String, CutId>,
    pub(crate) root: Option<CutId>,
    pub(crate) debugger: Option<Debugger>,
}

impl fmt::Debug for Cutflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cutflow")
            .field("name", &self.name)
            .field("root", &self.root.map(|id| self.arena[id].name()))
            .field("cuts", &self.record.len())
            .field("debugger", &self.debugger.as_ref().map(|_| "<function>"))
            .finish()
    }
}

impl Default for Cutflow {
    fn default() -> Self {
        Cutflow::new("cutflow")
    }
}

impl Cutflow {
    /// An empty cutflow; `name` is also the base name of its output files.
    pub fn new(name: impl Into<String>) -> Self {
        Cutflow { name: name.into(), arena: Arena::new(), record: HashMap::new(), root: None, debugger: None }
    }

    /// A cutflow whose root is `root`.
    pub fn with_root(name: impl Into<String>, root: Cut) -> Self {
        let mut cutflow = Cutflow::new(name);
        let id = cutflow.arena.insert(root.detached());
        cutflow.record.insert(cutflow.arena[id].name.clone(), id);
        cutflow.root = Some(id);
        cutflow
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> Option<CutId> {
        self.root
    }

    pub fn root_cut(&self) -> Option<&Cut> {
        self.root.map(|id| &self.arena[id])
    }

    /// Number of registered cuts.
    pub fn len(&self) -> usize {
        self.record.len()
    }

    pub fn is_empty(&self) -> bool {
        self.record.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.record.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.record.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn id_of(&self, name: &str) -> Option<CutId> {
        self.record.get(name).copied()
    }

    /// Look up a registered cut.
    pub fn cut<'a>(&self, target: impl Into<CutRef<'a>>) -> Result<&Cut> {
        let id = self.resolve("get_cut", target.into())?;
        Ok(&self.arena[id])
    }

    pub fn cut_by_id(&self, id: CutId) -> Option<&Cut> {
        self.arena.get(id)
    }

    /// Name of the cut behind a live handle.
    pub fn name_of(&self, id: CutId) -> Option<&str> {
        self.arena.get(id).map(Cut::name)
    }

    /// Install an observer consulted before every evaluation, on every run.
    pub fn set_debugger(&mut self, debugger: impl FnMut(&Cut) + 'static) {
        self.debugger = Some(Box::new(debugger));
    }

    pub fn clear_debugger(&mut self) {
        self.debugger = None;
    }

    pub(crate) fn resolve(&self, op: &'static str, target: CutRef<'_>) -> Result<CutId> {
        match target {
            CutRef::Name(name) => self.record.get(name).copied().ok_or_else(|| CutflowError::unknown(op, name)),
            CutRef::Id(id) => match self.arena.get(id) {
                Some(cut) if self.record.get(cut.name()) == Some(&id) => Ok(id),
                _ => Err(CutflowError::unknown(op, id.to_string())),
            },
        }
    }

    /// Install `cut` as the root.
    ///
    /// With an existing root, `cut` takes over the old root's children and the
    /// old root is dropped from the cutflow.
    pub fn set_root(&mut self, cut: Cut) -> Result<CutId> {
        match self.root {
            Some(old_root) => self.replace(old_root, cut),
            None => {
                if self.record.contains_key(&cut.name) {
                    return Err(CutflowError::duplicate("set_root", cut.name));
                }
                let cut = cut.detached();
                debug!("[cutflow:{}] set_root '{}'", self.name, cut.name);
                let id = self.arena.insert(cut);
                self.record.insert(self.arena[id].name.clone(), id);
                self.root = Some(id);
                Ok(id)
            }
        }
    }

    /// Splice `cut` into the edge `target -> target.child(direction)`.
    ///
    /// Any existing child on that side is re-attached to `cut` on the same side.
    pub fn insert<'a>(&mut self, target: impl Into<CutRef<'a>>, cut: Cut, direction: Direction) -> Result<CutId> {
        let target = self.resolve("insert", target.into())?;
        if self.record.contains_key(&cut.name) {
            return Err(CutflowError::duplicate("insert", cut.name));
        }

        let mut cut = cut.detached();
        let displaced = self.arena[target].child(direction);
        cut.parent = Some(target);
        *cut.child_mut(direction) = displaced;

        debug!(
            "[cutflow:{}] insert '{}' after '{}' ({:?})",
            self.name, cut.name, self.arena[target].name, direction
        );

        let id = self.arena.insert(cut);
        if let Some(child) = displaced {
            self.arena[child].parent = Some(id);
        }
        *self.arena[target].child_mut(direction) = Some(id);
        self.record.insert(self.arena[id].name.clone(), id);
        Ok(id)
    }

    /// Put `cut` where `target` is, inheriting its parent and both children.
    ///
    /// `target` is dropped, counters included; `cut` keeps its own counters.
    pub fn replace<'a>(&mut self, target: impl Into<CutRef<'a>>, cut: Cut) -> Result<CutId> {
        let target = self.resolve("replace", target.into())?;
        if cut.name != self.arena[target].name && self.record.contains_key(&cut.name) {
            return Err(CutflowError::duplicate("replace", cut.name));
        }

        let old = match self.arena.remove(target) {
            Some(old) => old,
            None => return Err(CutflowError::unknown("replace", target.to_string())),
        };
        debug!("[cutflow:{}] replace '{}' with '{}'", self.name, old.name, cut.name);

        let mut cut = cut.detached();
        cut.parent = old.parent;
        cut.left = old.left;
        cut.right = old.right;
        let id = self.arena.insert(cut);

        self.relink_parent_slot(old.parent, target, Some(id));
        for child in [old.left, old.right].into_iter().flatten() {
            self.arena[child].parent = Some(id);
        }
        if self.root == Some(target) {
            self.root = Some(id);
        }

        self.record.remove(&old.name);
        self.record.insert(self.arena[id].name.clone(), id);
        Ok(id)
    }

    /// Splice `target` out of the tree and hand it back, unlinked.
    ///
    /// Its single child (if any) takes its place; a root's single child becomes
    /// the new root, and removing a childless root empties the cutflow.
    ///
    /// Any cut with both children populated is rejected with
    /// [`CutflowError::AmbiguousRemoval`], not only the root: splicing one child
    /// up would leave the other subtree without a parent slot.
    pub fn remove<'a>(&mut self, target: impl Into<CutRef<'a>>) -> Result<Cut> {
        let target = self.resolve("remove", target.into())?;
        let (parent, left, right) = {
            let cut = &self.arena[target];
            (cut.parent, cut.left, cut.right)
        };
        if left.is_some() && right.is_some() {
            return Err(CutflowError::AmbiguousRemoval { name: self.arena[target].name.clone() });
        }

        let survivor = right.or(left);
        self.relink_parent_slot(parent, target, survivor);
        if let Some(child) = survivor {
            self.arena[child].parent = parent;
        }
        if self.root == Some(target) {
            self.root = survivor;
        }

        let removed = match self.arena.remove(target) {
            Some(cut) => cut,
            None => return Err(CutflowError::unknown("remove", target.to_string())),
        };
        debug!("[cutflow:{}] remove '{}'", self.name, removed.name);
        self.record.remove(&removed.name);
        Ok(removed.detached())
    }

    /// Point whichever child slot of `parent` held `old` at `new`.
    fn relink_parent_slot(&mut self, parent: Option<CutId>, old: CutId, new: Option<CutId>) {
        let Some(parent) = parent else {
            return;
        };
        let parent = &mut self.arena[parent];
        if parent.right == Some(old) {
            parent.right = new;
        } else if parent.left == Some(old) {
            parent.left = new;
        }
    }
}
