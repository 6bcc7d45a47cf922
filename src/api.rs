use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::CutflowError;

/// Flow direction of an exported mermaid diagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// `graph TD`
    #[default]
    TopDown,
    /// `graph LR`
    LeftRight,
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::TopDown => write!(f, "TD"),
            Orientation::LeftRight => write!(f, "LR"),
        }
    }
}

impl FromStr for Orientation {
    type Err = CutflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TD" => Ok(Orientation::TopDown),
            "LR" => Ok(Orientation::LeftRight),
            _ => Err(CutflowError::InvalidOrientation(s.to_string())),
        }
    }
}

bitflags::bitflags! {
    /// Which files [`Cutflow::write_reports`](crate::Cutflow::write_reports) produces.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Exports: u8 {
        const CFLOW   = 1 << 0;
        const CSV     = 1 << 1;
        const MERMAID = 1 << 2;
    }
}

impl Default for Exports {
    fn default() -> Self {
        Exports::all()
    }
}

/// Report settings supplied by whatever drives the cutflow.
///
/// ```
/// use cutflow::{Orientation, ReportOptions};
///
/// let opts = ReportOptions::default().output_dir("plots").orientation(Orientation::LeftRight);
/// assert_eq!(opts.orientation, Orientation::LeftRight);
/// assert!(!opts.show_timing);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    /// Directory the export files are written to.
    pub output_dir: PathBuf,
    pub orientation: Orientation,
    /// Append runtime statistics to each cut in text dumps.
    pub show_timing: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { output_dir: PathBuf::from("."), orientation: Orientation::TopDown, show_timing: false }
    }
}

impl ReportOptions {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn show_timing(mut self, show: bool) -> Self {
        self.show_timing = show;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_parses_case_insensitively() {
        let cases = [("TD", Orientation::TopDown), ("td", Orientation::TopDown), ("Lr", Orientation::LeftRight)];
        for (input, expected) in cases {
            assert_eq!(input.parse::<Orientation>().unwrap(), expected, "{input}");
            assert_eq!(expected.to_string(), input.to_ascii_uppercase());
        }
        let err = "BT".parse::<Orientation>().unwrap_err();
        assert_eq!(err.to_string(), "invalid orientation 'BT' (expected TD or LR)");
    }

    #[test]
    fn defaults() {
        let opts = ReportOptions::default();
        assert_eq!(opts.output_dir, PathBuf::from("."));
        assert_eq!(opts.orientation, Orientation::TopDown);
        assert!(!opts.show_timing);
        assert_eq!(Exports::default(), Exports::CFLOW | Exports::CSV | Exports::MERMAID);
    }
}
