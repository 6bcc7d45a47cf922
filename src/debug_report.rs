use std::path::PathBuf;

use cutflow::Cutflow;

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

pub fn print_report(source: &str, cutflow: &Cutflow, written: &[PathBuf], color: bool) {
    let palette = ansi::Palette::new(color);
    println!(
        "\n{}",
        palette.bold(palette.paint(format!("✂  Cutflow: \"{}\" ({} cuts, from {})", cutflow.name(), cutflow.len(), source), ansi::CYAN))
    );

    println!("\n{}", palette.paint("━━━ Tree ━━━", ansi::GRAY));
    print_tree(cutflow, &palette);

    println!("\n{}", palette.paint("━━━ Termini ━━━", ansi::GRAY));
    print_termini(cutflow, &palette);

    if !written.is_empty() {
        println!("\n{}", palette.paint("━━━ Exports ━━━", ansi::GRAY));
        for path in written {
            println!("  {} {}", palette.paint("✓", ansi::GREEN), palette.paint(path.display().to_string(), ansi::BLUE));
        }
    }
    println!();
}

fn print_tree(cutflow: &Cutflow, palette: &ansi::Palette) {
    // Skip the plain-text "Cutflow" heading; the section header replaces it.
    for line in cutflow.render(false).lines().skip(1) {
        println!("  {}", paint_tree_line(line, palette));
    }
}

fn paint_tree_line(line: &str, palette: &ansi::Palette) -> String {
    for (marker, color) in [("├☑─", ansi::GREEN), ("└☑─", ansi::GREEN), ("└☒─", ansi::YELLOW)] {
        if let Some((prefix, name)) = line.split_once(marker) {
            return format!("{}{}{}", palette.dim(prefix), palette.paint(marker, color), palette.bold(name));
        }
    }
    palette.dim(line)
}

fn print_termini(cutflow: &Cutflow, palette: &ansi::Palette) {
    let Some(root) = cutflow.root_cut() else {
        println!("{}", palette.dim("  No root cut"));
        return;
    };
    let total = root.n_pass() + root.n_fail();

    let mut leaves = 0;
    for name in cutflow.names() {
        let Ok(cut) = cutflow.cut(name) else {
            continue;
        };
        if cut.left().is_some() || cut.right().is_some() {
            continue;
        }
        leaves += 1;
        let efficiency = if total == 0 { 0.0 } else { cut.n_pass() as f64 / total as f64 * 100.0 };
        println!(
            "  {} {} {} {}",
            palette.paint(name, ansi::CYAN),
            palette.dim("│"),
            palette.paint(format!("{} raw / {} wgt", cut.n_pass(), cut.n_pass_weighted()), ansi::GREEN),
            palette.dim(format!("({efficiency:.2}% of {total})")),
        );
    }
    if leaves == 0 {
        println!("{}", palette.dim("  No terminal cuts"));
    }
}
