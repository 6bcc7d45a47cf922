//! File exports: `.cflow` snapshots, per-terminus CSV tables and mermaid
//! flowcharts.
//!
//! Every export is a read-only view of the current counters, written under a
//! caller-chosen directory with the cutflow's name as base name:
//!
//! ```text
//! {dir}/{name}.cflow             one line per cut, root first, fail side first
//! {dir}/{name}_{terminus}.csv    one table per rightmost path
//! {dir}/{name}.mmd               fenced mermaid flowchart
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use super::tree::Cutflow;
use crate::api::{Exports, Orientation, ReportOptions};
use crate::cut::{CutId, Direction};
use crate::error::{CutflowError, Result};
use crate::row_writer::RowWriter;

pub(crate) const CSV_HEADERS: [&str; 3] = ["cut", "raw_events", "weighted_events"];
pub(crate) const NULL_LINK: &str = "null";

impl Cutflow {
    /// Write `{dir}/{name}.cflow`.
    ///
    /// Fields per line: name, n_pass, n_pass_weighted, n_fail, n_fail_weighted,
    /// then the parent, left and right names (`null` when absent).
    pub fn write_cflow(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        if self.root.is_none() {
            return Err(CutflowError::UnsetRoot { op: "write_cflow" });
        }
        let mut writer = RowWriter::create(dir.as_ref().join(format!("{}.cflow", self.name)), &[])?;
        for id in self.preorder(Direction::Left) {
            let cut = &self.arena[id];
            writer
                .push_col(&cut.name)
                .push_col(cut.n_pass)
                .push_col(cut.n_pass_weighted)
                .push_col(cut.n_fail)
                .push_col(cut.n_fail_weighted)
                .push_col(self.link_name(cut.parent))
                .push_col(self.link_name(cut.left))
                .push_col(self.link_name(cut.right));
            writer.write_row()?;
        }
        debug!("[cutflow:{}] wrote {}", self.name, writer.path().display());
        Ok(writer.path().to_path_buf())
    }

    /// Write one CSV table per rightmost path.
    ///
    /// A passing edge appends a row to the current table; a failing edge forks
    /// the current table into a new file named after the terminus of the
    /// failing branch. Shared ancestor rows are repeated in every table.
    pub fn write_csv(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let root = self.root.ok_or(CutflowError::UnsetRoot { op: "write_csv" })?;
        let dir = dir.as_ref();
        let first = RowWriter::create(self.csv_path(dir, root), &CSV_HEADERS)?;
        let mut written = vec![first.path().to_path_buf()];

        // Fail subtrees are exported before pass subtrees so a fork only ever
        // copies the rows above its branch point.
        let mut stack = vec![(root, Direction::Right, first)];
        while let Some((id, direction, mut writer)) = stack.pop() {
            let cut = &self.arena[id];
            if direction == Direction::Left {
                writer = writer.fork(self.csv_path(dir, id))?;
                written.push(writer.path().to_path_buf());
            }
            writer.push_col(&cut.name).push_col(cut.n_pass).push_col(cut.n_pass_weighted);
            writer.write_row()?;

            if let Some(right) = cut.right {
                stack.push((right, Direction::Right, writer.clone()));
            }
            if let Some(left) = cut.left {
                stack.push((left, Direction::Left, writer));
            }
        }

        for path in &written {
            debug!("[cutflow:{}] wrote {}", self.name, path.display());
        }
        Ok(written)
    }

    /// Write `{dir}/{name}.mmd`, a mermaid flowchart of the counters.
    pub fn write_mermaid(&self, dir: impl AsRef<Path>, orientation: Orientation) -> Result<PathBuf> {
        let text = self.mermaid(orientation)?;
        let path = dir.as_ref().join(format!("{}.mmd", self.name));
        let mut out = BufWriter::new(File::create(&path)?);
        out.write_all(text.as_bytes())?;
        out.flush()?;
        debug!("[cutflow:{}] wrote {}", self.name, path.display());
        Ok(path)
    }

    /// The mermaid markup written by [`Cutflow::write_mermaid`].
    pub fn mermaid(&self, orientation: Orientation) -> Result<String> {
        let root = self.root.ok_or(CutflowError::UnsetRoot { op: "write_mermaid" })?;
        let mut lines = vec!["```mermaid".to_string(), format!("graph {orientation}")];

        for id in self.preorder(Direction::Left) {
            let cut = &self.arena[id];
            let node = mermaid_id(&cut.name);
            if id == root {
                lines.push(format!("    {node}([\"{} <br/> (root node)\"])", cut.name));
            }
            let parent = cut.parent.map(|parent| &self.arena[parent]);
            if let Some(parent) = parent.filter(|parent| parent.left == Some(id)) {
                lines.push(format!("    {}Fail --> {node}{{{}}}", mermaid_id(&parent.name), cut.name));
            }
            lines.push(format!("    {node} -- Fail --> {node}Fail[/{}/]", sink_label(cut.n_fail, cut.n_fail_weighted)));
            if let Some(parent) = parent.filter(|parent| parent.right == Some(id)) {
                lines.push(format!("    {}Pass --> {node}{{{}}}", mermaid_id(&parent.name), cut.name));
            }
            lines.push(format!("    {node} -- Pass --> {node}Pass[/{}/]", sink_label(cut.n_pass, cut.n_pass_weighted)));
        }

        lines.push("```".to_string());
        let mut text = lines.join("\n");
        text.push('\n');
        Ok(text)
    }

    /// Write the selected exports under `options.output_dir`, creating it if
    /// needed, and return every file produced.
    pub fn write_reports(&self, options: &ReportOptions, exports: Exports) -> Result<Vec<PathBuf>> {
        let dir = options.output_dir.as_path();
        fs::create_dir_all(dir)?;

        let mut written = Vec::new();
        if exports.contains(Exports::CFLOW) {
            written.push(self.write_cflow(dir)?);
        }
        if exports.contains(Exports::CSV) {
            written.extend(self.write_csv(dir)?);
        }
        if exports.contains(Exports::MERMAID) {
            written.push(self.write_mermaid(dir, options.orientation)?);
        }
        info!("[cutflow:{}] exported {} file(s) to {}", self.name, written.len(), dir.display());
        Ok(written)
    }

    fn csv_path(&self, dir: &Path, id: CutId) -> PathBuf {
        let terminus = self.terminus_of(id);
        dir.join(format!("{}_{}.csv", self.name, self.arena[terminus].name))
    }

    fn link_name(&self, link: Option<CutId>) -> String {
        link.map_or_else(|| NULL_LINK.to_string(), |id| self.arena[id].name.clone())
    }
}

/// Mermaid node ids only allow word characters.
fn mermaid_id(name: &str) -> String {
    regex!(r"[^A-Za-z0-9_]").replace_all(name, "_").into_owned()
}

fn sink_label(raw: u64, weighted: f64) -> String {
    if raw as f64 == weighted { format!("{raw} raw") } else { format!("{raw} raw <br/> {weighted} wgt") }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cut::Cut;

    fn sample() -> Cutflow {
        let mut cutflow = Cutflow::with_root("ana", Cut::new("base"));
        cutflow.insert("base", Cut::new("pass_a"), Direction::Right).unwrap();
        cutflow.insert("pass_a", Cut::new("pass_b"), Direction::Right).unwrap();
        cutflow.insert("pass_a", Cut::new("fail_a"), Direction::Left).unwrap();
        cutflow.insert("fail_a", Cut::new("fail_a_pass"), Direction::Right).unwrap();
        cutflow.run().unwrap();
        cutflow
    }

    #[test]
    fn cflow_lists_topology_fail_side_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = sample().write_cflow(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("ana.cflow"));
        let text = fs::read_to_string(path).unwrap();
        let expected = "\
base,1,1,0,0,null,null,pass_a
pass_a,1,1,0,0,base,fail_a,pass_b
fail_a,0,0,0,0,pass_a,null,fail_a_pass
fail_a_pass,0,0,0,0,fail_a,null,null
pass_b,1,1,0,0,pass_a,null,null
";
        assert_eq!(text, expected);
    }

    #[test]
    fn csv_forks_on_failing_edges() {
        let dir = tempfile::tempdir().unwrap();
        let written = sample().write_csv(dir.path()).unwrap();
        assert_eq!(written, [dir.path().join("ana_pass_b.csv"), dir.path().join("ana_fail_a_pass.csv")]);

        let main = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(main, "cut,raw_events,weighted_events\nbase,1,1\npass_a,1,1\npass_b,1,1\n");
        let forked = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(
            forked,
            "cut,raw_events,weighted_events\nbase,1,1\npass_a,1,1\nfail_a,0,0\nfail_a_pass,0,0\n"
        );
    }

    #[test]
    fn mermaid_chains_sinks() {
        let mut cutflow = Cutflow::with_root("m", Cut::new("base"));
        cutflow.insert("base", Cut::weighted("sel one", || true, || 2.0), Direction::Right).unwrap();
        cutflow.run().unwrap();

        let text = cutflow.mermaid(Orientation::LeftRight).unwrap();
        let expected = "\
```mermaid
graph LR
    base([\"base <br/> (root node)\"])
    base -- Fail --> baseFail[/0 raw/]
    base -- Pass --> basePass[/1 raw/]
    basePass --> sel_one{sel one}
    sel_one -- Fail --> sel_oneFail[/0 raw/]
    sel_one -- Pass --> sel_onePass[/1 raw <br/> 2 wgt/]
```
";
        assert_eq!(text, expected);
    }

    #[test]
    fn exports_need_a_root() {
        let dir = tempfile::tempdir().unwrap();
        let cutflow = Cutflow::new("empty");
        assert!(matches!(cutflow.write_cflow(dir.path()), Err(CutflowError::UnsetRoot { op: "write_cflow" })));
        assert!(matches!(cutflow.write_csv(dir.path()), Err(CutflowError::UnsetRoot { .. })));
        assert!(cutflow.mermaid(Orientation::TopDown).is_err());
    }

    #[test]
    fn write_reports_honors_selection() {
        let dir = tempfile::tempdir().unwrap();
        let options = ReportOptions::default().output_dir(dir.path().join("out"));
        let written = sample().write_reports(&options, Exports::CFLOW | Exports::MERMAID).unwrap();
        assert_eq!(written.len(), 2);
        assert!(written.iter().all(|path| path.exists()));
        assert!(!dir.path().join("out/ana_pass_b.csv").exists());

        let written = sample().write_reports(&options, Exports::all()).unwrap();
        assert_eq!(written.len(), 4);
    }
}
