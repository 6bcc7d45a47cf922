//! Text dump of a cutflow.
//!
//! ```text
//! Cutflow
//! └☑─base
//!    pass: 4 (raw)
//!    fail: 0 (raw)
//!    └☑─even
//!       pass: 3 (raw)
//!       fail: 1 (raw)
//!       └☑─positive
//!          pass: 2 (raw) 4 (wgt)
//!          fail: 1 (raw)
//! ```
//!
//! Depth first from the root, right (pass) child before left (fail) child.
//! `☑` marks a cut reached by passing its parent, `☒` one reached by failing.

use std::fmt::{self, Write as _};

use super::tree::Cutflow;
use crate::cut::{Cut, Direction};

const BRANCH_PASS_OPEN: &str = "├☑─";
const BRANCH_PASS_LAST: &str = "└☑─";
const BRANCH_FAIL: &str = "└☒─";
const INDENT_OPEN: &str = "│  ";
const INDENT_LAST: &str = "   ";

impl Cutflow {
    /// Render the tree; with `show_timing` each cut also shows its runtime
    /// statistics in milliseconds.
    pub fn render(&self, show_timing: bool) -> String {
        let mut out = String::from("Cutflow\n");
        let Some(root) = self.root else {
            return out;
        };

        let mut stack = vec![(root, Direction::Right, String::new())];
        while let Some((id, direction, tabs)) = stack.pop() {
            let cut = &self.arena[id];
            // A passing child with a failing sibling keeps the vertical rule open.
            let open = direction == Direction::Right
                && cut.parent.is_some_and(|parent| self.arena[parent].left.is_some());
            let marker = match direction {
                Direction::Right if open => BRANCH_PASS_OPEN,
                Direction::Right => BRANCH_PASS_LAST,
                Direction::Left => BRANCH_FAIL,
            };

            let _ = write!(out, "{tabs}{marker}{}", cut.name);
            if show_timing {
                let _ = write!(out, " {}", timing_line(cut));
            }
            out.push('\n');

            let tabs = format!("{tabs}{}", if open { INDENT_OPEN } else { INDENT_LAST });
            let _ = writeln!(out, "{tabs}{}", count_line("pass", cut.n_pass, cut.n_pass_weighted));
            let _ = writeln!(out, "{tabs}{}", count_line("fail", cut.n_fail, cut.n_fail_weighted));

            if let Some(left) = cut.left {
                stack.push((left, Direction::Left, tabs.clone()));
            }
            if let Some(right) = cut.right {
                stack.push((right, Direction::Right, tabs));
            }
        }
        out
    }

    /// Print [`Cutflow::render`] to stdout.
    pub fn print(&self, show_timing: bool) {
        print!("{}", self.render(show_timing));
    }
}

impl fmt::Display for Cutflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(false))
    }
}

fn count_line(label: &str, raw: u64, weighted: f64) -> String {
    if raw as f64 == weighted { format!("{label}: {raw} (raw)") } else { format!("{label}: {raw} (raw) {weighted} (wgt)") }
}

pub(crate) fn timing_line(cut: &Cut) -> String {
    let stat = &cut.runtimes;
    format!(
        "({} ms total, {} ms max, {} ms min, {} ± {} ms/event)",
        stat.sum(),
        stat.max(),
        stat.min(),
        stat.mean(),
        stat.stddev()
    )
}
