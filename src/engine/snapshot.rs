//! Counter snapshots: merging shards and reading `.cflow` files back.
//!
//! Cut callables are `Rc` closures, so a cutflow is built and run on one
//! thread. To process records on several threads, build one tree per thread,
//! collect each tree's [`CutTally`] list (plain data, `Send`) and
//! [`Cutflow::absorb`] them into a single tree for reporting.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use csv::ReaderBuilder;
use log::debug;

use super::export::NULL_LINK;
use super::tree::Cutflow;
use crate::cut::{Cut, CutId, Direction};
use crate::error::{CutflowError, Result};
use crate::stats::RunningStat;

/// Counters of one cut, detached from its callables.
#[derive(Debug, Clone, PartialEq)]
pub struct CutTally {
    pub name: String,
    pub n_pass: u64,
    pub n_fail: u64,
    pub n_pass_weighted: f64,
    pub n_fail_weighted: f64,
    pub runtimes: RunningStat,
}

impl From<&Cut> for CutTally {
    fn from(cut: &Cut) -> Self {
        CutTally {
            name: cut.name.clone(),
            n_pass: cut.n_pass,
            n_fail: cut.n_fail,
            n_pass_weighted: cut.n_pass_weighted,
            n_fail_weighted: cut.n_fail_weighted,
            runtimes: cut.runtimes,
        }
    }
}

impl Cutflow {
    /// Counters of every reachable cut, root first.
    pub fn tally(&self) -> Vec<CutTally> {
        self.preorder(Direction::Left).into_iter().map(|id| CutTally::from(&self.arena[id])).collect()
    }

    /// Add `tallies` into the cuts with the same names.
    ///
    /// Every name is checked before anything is added; an unknown name leaves
    /// all counters untouched.
    pub fn absorb(&mut self, tallies: &[CutTally]) -> Result<()> {
        let ids = tallies
            .iter()
            .map(|tally| self.resolve("absorb", tally.name.as_str().into()))
            .collect::<Result<Vec<CutId>>>()?;

        for (id, tally) in ids.into_iter().zip(tallies) {
            let cut = &mut self.arena[id];
            cut.n_pass += tally.n_pass;
            cut.n_fail += tally.n_fail;
            cut.n_pass_weighted += tally.n_pass_weighted;
            cut.n_fail_weighted += tally.n_fail_weighted;
            cut.runtimes.merge(&tally.runtimes);
        }
        debug!("[cutflow:{}] absorbed {} tallies", self.name, tallies.len());
        Ok(())
    }

    /// Rebuild a report-only cutflow from a `.cflow` file.
    ///
    /// Cuts come back as always-pass cuts with their counters and links
    /// restored; runtimes are not part of the format and start empty. The
    /// cutflow is named after the file stem.
    pub fn read_cflow(path: impl AsRef<Path>) -> Result<Cutflow> {
        let path = path.as_ref();
        let name = path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default();
        let mut rdr = ReaderBuilder::new().has_headers(false).flexible(true).from_path(path)?;

        let mut rows = Vec::new();
        for (idx, record) in rdr.records().enumerate() {
            let line = idx + 1;
            let record = record?;
            if record.len() != 8 {
                return Err(parse_error(line, format!("expected 8 fields, found {}", record.len())));
            }
            rows.push(Row {
                line,
                name: record[0].to_string(),
                n_pass: parse_field(line, "n_pass", &record[1])?,
                n_pass_weighted: parse_field(line, "n_pass_weighted", &record[2])?,
                n_fail: parse_field(line, "n_fail", &record[3])?,
                n_fail_weighted: parse_field(line, "n_fail_weighted", &record[4])?,
                parent: link(&record[5]),
                left: link(&record[6]),
                right: link(&record[7]),
            });
        }

        let mut cutflow = Cutflow::new(name);
        for row in &rows {
            if cutflow.record.contains_key(&row.name) {
                return Err(parse_error(row.line, format!("duplicate cut '{}'", row.name)));
            }
            let mut cut = Cut::new(row.name.clone());
            cut.n_pass = row.n_pass;
            cut.n_fail = row.n_fail;
            cut.n_pass_weighted = row.n_pass_weighted;
            cut.n_fail_weighted = row.n_fail_weighted;
            let id = cutflow.arena.insert(cut);
            cutflow.record.insert(row.name.clone(), id);
        }

        let lookup = |line: usize, name: &str, record: &HashMap<String, CutId>| {
            record.get(name).copied().ok_or_else(|| parse_error(line, format!("unknown cut '{name}'")))
        };
        for row in &rows {
            let id = cutflow.record[&row.name];
            let parent = row.parent.as_deref().map(|name| lookup(row.line, name, &cutflow.record)).transpose()?;
            let left = row.left.as_deref().map(|name| lookup(row.line, name, &cutflow.record)).transpose()?;
            let right = row.right.as_deref().map(|name| lookup(row.line, name, &cutflow.record)).transpose()?;

            if let Some(child) = left.filter(|&child| right == Some(child)) {
                let child = &cutflow.arena[child].name;
                return Err(parse_error(row.line, format!("'{child}' is both children of '{}'", row.name)));
            }
            match parent {
                None if cutflow.root.is_some() => {
                    return Err(parse_error(row.line, format!("second root '{}'", row.name)));
                }
                None => cutflow.root = Some(id),
                Some(_) => {}
            }
            for (child, side) in [(left, "left"), (right, "right")] {
                if let Some(child) = child {
                    let child_row = rows.iter().find(|r| cutflow.record[&r.name] == child);
                    if child_row.and_then(|r| r.parent.as_deref()) != Some(row.name.as_str()) {
                        return Err(parse_error(
                            row.line,
                            format!("{side} child '{}' does not name '{}' as parent", cutflow.arena[child].name, row.name),
                        ));
                    }
                }
            }

            let cut = &mut cutflow.arena[id];
            cut.parent = parent;
            cut.left = left;
            cut.right = right;
        }

        if rows.is_empty() {
            return Err(parse_error(0, "no cuts".to_string()));
        }
        let Some(root) = cutflow.root else {
            return Err(parse_error(1, "no root cut".to_string()));
        };
        let mut reached = HashSet::with_capacity(rows.len());
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !reached.insert(id) {
                return Err(parse_error(1, format!("cut '{}' is linked twice", cutflow.arena[id].name)));
            }
            let cut = &cutflow.arena[id];
            stack.extend(cut.left);
            stack.extend(cut.right);
        }
        if let Some(row) = rows.iter().find(|row| !reached.contains(&cutflow.record[&row.name])) {
            return Err(parse_error(row.line, format!("cut '{}' is unreachable from the root", row.name)));
        }
        debug!("[cutflow:{}] read {} cuts from {}", cutflow.name, rows.len(), path.display());
        Ok(cutflow)
    }
}

struct Row {
    line: usize,
    name: String,
    n_pass: u64,
    n_pass_weighted: f64,
    n_fail: u64,
    n_fail_weighted: f64,
    parent: Option<String>,
    left: Option<String>,
    right: Option<String>,
}

fn link(field: &str) -> Option<String> {
    (field != NULL_LINK).then(|| field.to_string())
}

fn parse_field<T: std::str::FromStr>(line: usize, field: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| parse_error(line, format!("invalid {field} '{value}'")))
}

fn parse_error(line: usize, reason: String) -> CutflowError {
    CutflowError::Parse { line, reason }
}
