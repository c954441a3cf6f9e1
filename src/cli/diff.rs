//! Colorized diff output for configuration changes
//!
//! Compares the `set` lines of two configurations using the similar crate.

use colored::Colorize;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Colorized line diff between two sets of configuration lines
pub struct ConfigDiff {
    use_color: bool,
    context_lines: usize,
}

impl ConfigDiff {
    pub fn new(use_color: bool) -> Self {
        Self {
            use_color,
            context_lines: 3,
        }
    }

    /// Unified diff of `old` against `new`, empty when they are equal
    pub fn unified(&self, old: &[String], new: &[String], old_name: &str, new_name: &str) -> String {
        let old_text = joined(old);
        let new_text = joined(new);
        let diff = TextDiff::from_lines(&old_text, &new_text);
        if diff.iter_all_changes().all(|c| c.tag() == ChangeTag::Equal) {
            return String::new();
        }

        let mut output = String::new();
        self.push(&mut output, &format!("--- {}", old_name), ChangeTag::Delete);
        self.push(&mut output, &format!("+++ {}", new_name), ChangeTag::Insert);

        for hunk in diff
            .unified_diff()
            .context_radius(self.context_lines)
            .iter_hunks()
        {
            let header = hunk.header().to_string();
            if self.use_color {
                let _ = writeln!(output, "{}", header.cyan());
            } else {
                let _ = writeln!(output, "{}", header);
            }

            for change in hunk.iter_changes() {
                let sign = match change.tag() {
                    ChangeTag::Delete => '-',
                    ChangeTag::Insert => '+',
                    ChangeTag::Equal => ' ',
                };
                let line = format!("{}{}", sign, change.value().trim_end_matches('\n'));
                self.push(&mut output, &line, change.tag());
            }
        }

        output
    }

    /// Count of `(added, removed)` lines
    pub fn summary(&self, old: &[String], new: &[String]) -> (usize, usize) {
        let old_text = joined(old);
        let new_text = joined(new);
        let diff = TextDiff::from_lines(&old_text, &new_text);
        diff.iter_all_changes()
            .fold((0, 0), |(added, removed), change| match change.tag() {
                ChangeTag::Insert => (added + 1, removed),
                ChangeTag::Delete => (added, removed + 1),
                ChangeTag::Equal => (added, removed),
            })
    }

    fn push(&self, output: &mut String, line: &str, tag: ChangeTag) {
        let _ = match (self.use_color, tag) {
            (true, ChangeTag::Delete) => writeln!(output, "{}", line.red()),
            (true, ChangeTag::Insert) => writeln!(output, "{}", line.green()),
            _ => writeln!(output, "{}", line),
        };
    }
}

fn joined(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unified_diff() {
        let old = lines(&[
            "set routing-options router-id 192.0.2.1",
            "set routing-options nonstop-routing",
        ]);
        let new = lines(&[
            "set routing-options router-id 192.0.2.2",
            "set routing-options nonstop-routing",
        ]);

        let diff = ConfigDiff::new(false).unified(&old, &new, "prior", "config");
        assert!(diff.starts_with("--- prior\n+++ config\n"));
        assert!(diff.contains("-set routing-options router-id 192.0.2.1\n"));
        assert!(diff.contains("+set routing-options router-id 192.0.2.2\n"));
        assert!(diff.contains(" set routing-options nonstop-routing\n"));
    }

    #[test]
    fn test_no_changes() {
        let same = lines(&["set security zones security-zone dmz"]);
        let differ = ConfigDiff::new(false);
        assert_eq!(differ.unified(&same, &same, "a", "b"), "");
        assert_eq!(differ.summary(&same, &same), (0, 0));
    }

    #[test]
    fn test_summary() {
        let old = lines(&["set a", "set b"]);
        let new = lines(&["set a", "set c", "set d"]);
        assert_eq!(ConfigDiff::new(false).summary(&old, &new), (2, 1));
    }
}
