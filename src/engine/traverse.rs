//! Read-only walks over the cut graph.
//!
//! All walks are iterative; trees built by hand can be arbitrarily deep.

use super::tree::{CutRef, Cutflow};
use crate::cut::{CutId, Direction};
use crate::error::Result;

impl Cutflow {
    /// Follow `right` links from `start` until a cut without a right child.
    pub fn find_terminus<'a>(&self, start: impl Into<CutRef<'a>>) -> Result<CutId> {
        let start = self.resolve("find_terminus", start.into())?;
        Ok(self.terminus_of(start))
    }

    pub(crate) fn terminus_of(&self, start: CutId) -> CutId {
        let mut current = start;
        while let Some(next) = self.arena[current].right {
            current = next;
        }
        current
    }

    /// True iff `descendant` lives in the subtree hanging off
    /// `ancestor.child(direction)`.
    pub fn is_progeny<'a, 'b>(
        &self,
        ancestor: impl Into<CutRef<'a>>,
        descendant: impl Into<CutRef<'b>>,
        direction: Direction,
    ) -> Result<bool> {
        let ancestor = self.resolve("is_progeny", ancestor.into())?;
        let descendant = self.resolve("is_progeny", descendant.into())?;

        let mut stack: Vec<CutId> = self.arena[ancestor].child(direction).into_iter().collect();
        while let Some(id) = stack.pop() {
            if id == descendant {
                return Ok(true);
            }
            let cut = &self.arena[id];
            stack.extend(cut.left);
            stack.extend(cut.right);
        }
        Ok(false)
    }

    /// Cuts reachable from the root, each parent before its children.
    ///
    /// Siblings are visited in `first` then the other direction.
    pub(crate) fn preorder(&self, first: Direction) -> Vec<CutId> {
        let mut order = Vec::with_capacity(self.record.len());
        let mut stack: Vec<CutId> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            let cut = &self.arena[id];
            let (first_child, second_child) = match first {
                Direction::Right => (cut.right, cut.left),
                Direction::Left => (cut.left, cut.right),
            };
            stack.extend(second_child);
            stack.extend(first_child);
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::Cut;

    //   base
    //   ├─ pass: a ── pass: b
    //   │        └─ fail: a_fail
    //   └─ fail: base_fail
    fn branching() -> Cutflow {
        let mut cutflow = Cutflow::with_root("t", Cut::new("base"));
        cutflow.insert("base", Cut::new("a"), Direction::Right).unwrap();
        cutflow.insert("a", Cut::new("b"), Direction::Right).unwrap();
        cutflow.insert("a", Cut::new("a_fail"), Direction::Left).unwrap();
        cutflow.insert("base", Cut::new("base_fail"), Direction::Left).unwrap();
        cutflow
    }

    #[test]
    fn terminus_follows_right_links() {
        let cutflow = branching();
        let terminus = cutflow.find_terminus("base").unwrap();
        assert_eq!(cutflow.name_of(terminus), Some("b"));
        let terminus = cutflow.find_terminus("a_fail").unwrap();
        assert_eq!(cutflow.name_of(terminus), Some("a_fail"));
        assert!(cutflow.find_terminus("nope").is_err());
    }

    #[test]
    fn progeny_respects_direction() {
        let cutflow = branching();
        let cases = [
            ("base", "b", Direction::Right, true),
            ("base", "a_fail", Direction::Right, true),
            ("base", "b", Direction::Left, false),
            ("base", "base_fail", Direction::Left, true),
            ("a", "a_fail", Direction::Right, false),
            ("b", "base", Direction::Right, false),
            ("b", "b", Direction::Right, false),
        ];
        for (ancestor, descendant, direction, expected) in cases {
            assert_eq!(
                cutflow.is_progeny(ancestor, descendant, direction).unwrap(),
                expected,
                "is_progeny({ancestor}, {descendant}, {direction:?})"
            );
        }
    }

    #[test]
    fn preorder_orders_siblings() {
        let cutflow = branching();
        let names = |order: Vec<CutId>| order.into_iter().filter_map(|id| cutflow.name_of(id)).collect::<Vec<_>>();
        assert_eq!(names(cutflow.preorder(Direction::Right)), ["base", "a", "b", "a_fail", "base_fail"]);
        assert_eq!(names(cutflow.preorder(Direction::Left)), ["base", "base_fail", "a", "a_fail", "b"]);
    }
}
