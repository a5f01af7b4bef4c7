//! Line-oriented unified diff between an expected and an actual rendering.
//!
//! Hunks carry no line numbers (`@@ @@`). Runs of more than five unchanged
//! lines that precede a change are collapsed to the run's last line; the
//! unchanged tail after the final change is kept in full.

use similar::{capture_diff_slices, Algorithm, ChangeTag, DiffTag};
use std::collections::HashMap;

/// Header placed in front of every diff.
pub const HEADER: &str = "\n--- Expected\n+++ Actual\n";

/// Unchanged lines longer than this run are collapsed.
const CONTEXT_RUN: usize = 5;

/// Diff two renderings line by line.
pub fn diff(expected: &str, actual: &str) -> String {
    let old = split_lines(expected);
    let new = split_lines(actual);
    let lines = changes(&old, &new);

    // Start index of each collapsible unchanged run -> index of its last line
    let mut runs: HashMap<usize, usize> = HashMap::new();
    let mut run_start: Option<usize> = None;
    for (i, (tag, _)) in lines.iter().enumerate() {
        if *tag == ChangeTag::Equal {
            run_start.get_or_insert(i);
        } else if let Some(start) = run_start.take() {
            if i - start > CONTEXT_RUN {
                runs.insert(start, i - 1);
            }
        }
    }

    let mut buffer = String::from(HEADER);
    let mut new_chunk = true;
    let mut i = runs.get(&0).copied().unwrap_or(0);
    while i < lines.len() {
        if let Some(&last) = runs.get(&i) {
            buffer.push('\n');
            new_chunk = true;
            i = last;
        }
        if new_chunk {
            buffer.push_str("@@ @@\n");
            new_chunk = false;
        }
        let (tag, line) = lines[i];
        let marker = match tag {
            ChangeTag::Equal => ' ',
            ChangeTag::Delete => '-',
            ChangeTag::Insert => '+',
        };
        buffer.push(marker);
        buffer.push_str(line);
        buffer.push('\n');
        i += 1;
    }
    buffer
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Line changes with every removal of a changed region ahead of its additions.
fn changes<'a>(old: &[&'a str], new: &[&'a str]) -> Vec<(ChangeTag, &'a str)> {
    let prefix = old.iter().zip(new).take_while(|(a, b)| a == b).count();
    let max_suffix = old.len().min(new.len()) - prefix;
    let suffix = old[prefix..]
        .iter()
        .rev()
        .zip(new[prefix..].iter().rev())
        .take(max_suffix)
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old[prefix..old.len() - suffix];
    let new_mid = &new[prefix..new.len() - suffix];

    let mut out: Vec<(ChangeTag, &'a str)> =
        old[..prefix].iter().map(|l| (ChangeTag::Equal, *l)).collect();

    let mut deleted: Vec<&'a str> = Vec::new();
    let mut inserted: Vec<&'a str> = Vec::new();
    for op in capture_diff_slices(Algorithm::Lcs, old_mid, new_mid) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                flush(&mut out, &mut deleted, &mut inserted);
                out.extend(old_mid[old_range].iter().map(|l| (ChangeTag::Equal, *l)));
            }
            DiffTag::Delete => deleted.extend_from_slice(&old_mid[old_range]),
            DiffTag::Insert => inserted.extend_from_slice(&new_mid[new_range]),
            DiffTag::Replace => {
                deleted.extend_from_slice(&old_mid[old_range]);
                inserted.extend_from_slice(&new_mid[new_range]);
            }
        }
    }
    flush(&mut out, &mut deleted, &mut inserted);

    out.extend(old[old.len() - suffix..].iter().map(|l| (ChangeTag::Equal, *l)));
    out
}

fn flush<'a>(
    out: &mut Vec<(ChangeTag, &'a str)>,
    deleted: &mut Vec<&'a str>,
    inserted: &mut Vec<&'a str>,
) {
    out.extend(deleted.drain(..).map(|l| (ChangeTag::Delete, l)));
    out.extend(inserted.drain(..).map(|l| (ChangeTag::Insert, l)));
}
