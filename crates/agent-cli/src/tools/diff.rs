//! Line diff for write previews

use crate::ui::{DIM, GREEN, RED, RESET};

/// Above this many LCS cells the changed region is shown as a full replace
const MAX_LCS_CELLS: usize = 4_000_000;
/// Unchanged lines shown around each change
const CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffLine<'a> {
    Same(&'a str),
    Added(&'a str),
    Removed(&'a str),
}

impl DiffLine<'_> {
    fn is_change(&self) -> bool {
        !matches!(self, DiffLine::Same(_))
    }
}

/// Line-level diff of `old` against `new`
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Vec<DiffLine<'a>> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();

    let a_mid = &a[prefix..a.len() - suffix];
    let b_mid = &b[prefix..b.len() - suffix];

    let mut out: Vec<DiffLine> = a[..prefix].iter().map(|l| DiffLine::Same(l)).collect();

    if a_mid.len().saturating_mul(b_mid.len()) > MAX_LCS_CELLS {
        out.extend(a_mid.iter().map(|l| DiffLine::Removed(l)));
        out.extend(b_mid.iter().map(|l| DiffLine::Added(l)));
    } else {
        out.extend(lcs_diff(a_mid, b_mid));
    }

    out.extend(a[a.len() - suffix..].iter().map(|l| DiffLine::Same(l)));
    out
}

fn lcs_diff<'a>(a: &[&'a str], b: &[&'a str]) -> Vec<DiffLine<'a>> {
    let (n, m) = (a.len(), b.len());
    let width = m + 1;
    // table[i * width + j] = LCS length of a[i..] and b[j..]
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let mut out = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            out.push(DiffLine::Same(a[i]));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            out.push(DiffLine::Removed(a[i]));
            i += 1;
        } else {
            out.push(DiffLine::Added(b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|l| DiffLine::Removed(l)));
    out.extend(b[j..].iter().map(|l| DiffLine::Added(l)));
    out
}

/// Count of (added, removed) lines
pub fn stats(lines: &[DiffLine]) -> (usize, usize) {
    lines.iter().fold((0, 0), |(add, del), line| match line {
        DiffLine::Added(_) => (add + 1, del),
        DiffLine::Removed(_) => (add, del + 1),
        DiffLine::Same(_) => (add, del),
    })
}

/// Render changes with a few lines of surrounding context. Long unchanged
/// stretches collapse to `...`.
pub fn render(lines: &[DiffLine], color: bool) -> String {
    if !lines.iter().any(DiffLine::is_change) {
        return "(no changes)".to_string();
    }

    let near_change = |idx: usize| {
        let lo = idx.saturating_sub(CONTEXT_LINES);
        let hi = (idx + CONTEXT_LINES + 1).min(lines.len());
        lines[lo..hi].iter().any(DiffLine::is_change)
    };

    let paint = |code: &str, text: String| {
        if color {
            format!("{}{}{}", code, text, RESET)
        } else {
            text
        }
    };

    let mut out = Vec::new();
    let mut skipping = false;
    for (idx, line) in lines.iter().enumerate() {
        match line {
            DiffLine::Added(text) => out.push(paint(GREEN, format!("+ {}", text))),
            DiffLine::Removed(text) => out.push(paint(RED, format!("- {}", text))),
            DiffLine::Same(text) if near_change(idx) => {
                out.push(paint(DIM, format!("  {}", text)));
                skipping = false;
                continue;
            }
            DiffLine::Same(_) => {
                if !skipping {
                    out.push(paint(DIM, "  ...".to_string()));
                    skipping = true;
                }
                continue;
            }
        }
        skipping = false;
    }
    out.join("\n")
}
