// Copyright 2026 The HugeSCM Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The text merge driver (C9): a line-oriented three-way merge with
//! git-style conflict markers, plus an external-driver escape hatch
//! (§4.8). Non-UTF-8 sides are decoded for merging and the result is
//! re-encoded to the charset side A (`ours`) was detected in.

use std::io::Write as _;
use std::ops::Range;
use std::process::Command;
use std::process::Stdio;

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use similar::Algorithm;
use similar::DiffOp;
use similar::DiffTag;
use similar::capture_diff_slices;

use crate::config::MergeConfig;
use crate::error::Error;
use crate::error::Result;

/// Runs the three-way text merge contract: `merge_text(O, A, B, labelO,
/// labelA, labelB) -> (merged_bytes, conflict)`. Delegates to the
/// configured external driver when one is set, otherwise runs the
/// built-in diff3-style line merge.
pub fn merge_text(
    config: &MergeConfig,
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
    label_base: &str,
    label_ours: &str,
    label_theirs: &str,
) -> Result<(Vec<u8>, bool)> {
    if let Some(driver) = &config.external_driver {
        return run_external_driver(driver, base, ours, theirs);
    }

    for (side, content) in [("base", base), ("ours", ours), ("theirs", theirs)] {
        // A NUL byte is the same binary-content signal git's own merge
        // machinery uses; such content never round-trips through a
        // line-oriented text merge.
        if content.contains(&0) {
            return Err(Error::NonTextContent(side));
        }
    }

    let ours_encoding = detect_encoding(ours);
    let (base_text, _, _) = detect_encoding(base).decode(base);
    let (ours_text, _, _) = ours_encoding.decode(ours);
    let (theirs_text, _, _) = detect_encoding(theirs).decode(theirs);

    let (merged, conflict) = diff3_merge(
        &base_text,
        &ours_text,
        &theirs_text,
        label_base,
        label_ours,
        label_theirs,
    );

    let (encoded, _, _) = ours_encoding.encode(&merged);
    Ok((encoded.into_owned(), conflict))
}

fn detect_encoding(content: &[u8]) -> &'static Encoding {
    Encoding::for_bom(content).map(|(enc, _)| enc).unwrap_or(UTF_8)
}

fn run_external_driver(
    driver: &std::path::Path,
    base: &[u8],
    ours: &[u8],
    theirs: &[u8],
) -> Result<(Vec<u8>, bool)> {
    let base_file = write_temp_input(base)?;
    let ours_file = write_temp_input(ours)?;
    let theirs_file = write_temp_input(theirs)?;

    let mut command = Command::new(driver);
    command
        .arg(base_file.path())
        .arg(ours_file.path())
        .arg(theirs_file.path())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    tracing::info!(?command, "running external merge driver");
    let output = command.output()?;
    tracing::info!(?command, status = ?output.status, "external merge driver exited");
    // A nonzero exit means the driver could not produce a clean merge;
    // its stdout is still the best-effort merged content (typically the
    // driver's own conflict markers).
    Ok((output.stdout, !output.status.success()))
}

fn write_temp_input(content: &[u8]) -> Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(content)?;
    file.flush()?;
    Ok(file)
}

/// One contiguous span of base lines that both `ours` and `theirs` left
/// byte-identical, anchoring the diff3 merge between it and the next one.
struct Anchor {
    base: Range<usize>,
    ours: Range<usize>,
    theirs: Range<usize>,
}

fn diff3_merge(
    base: &str,
    ours: &str,
    theirs: &str,
    label_base: &str,
    label_ours: &str,
    label_theirs: &str,
) -> (String, bool) {
    let base_lines: Vec<&str> = split_lines(base);
    let ours_lines: Vec<&str> = split_lines(ours);
    let theirs_lines: Vec<&str> = split_lines(theirs);

    let ops_a = capture_diff_slices(Algorithm::Myers, &base_lines, &ours_lines);
    let ops_b = capture_diff_slices(Algorithm::Myers, &base_lines, &theirs_lines);

    let eq_a = equal_ranges(&ops_a);
    let eq_b = equal_ranges(&ops_b);
    let mut anchors = stable_anchors(&eq_a, &eq_b);
    anchors.push(Anchor {
        base: base_lines.len()..base_lines.len(),
        ours: ours_lines.len()..ours_lines.len(),
        theirs: theirs_lines.len()..theirs_lines.len(),
    });

    let mut out = String::new();
    let mut conflict = false;
    let (mut cb, mut co, mut ct) = (0usize, 0usize, 0usize);

    for anchor in &anchors {
        if anchor.base.start > cb || anchor.ours.start > co || anchor.theirs.start > ct {
            let gap_base = join(&base_lines[cb..anchor.base.start]);
            let gap_ours = join(&ours_lines[co..anchor.ours.start]);
            let gap_theirs = join(&theirs_lines[ct..anchor.theirs.start]);
            if gap_ours == gap_theirs {
                out.push_str(&gap_ours);
            } else if gap_ours == gap_base {
                out.push_str(&gap_theirs);
            } else if gap_theirs == gap_base {
                out.push_str(&gap_ours);
            } else {
                conflict = true;
                out.push_str(&format!("<<<<<<< {label_ours}\n"));
                out.push_str(&gap_ours);
                out.push_str("|||||||");
                if !label_base.is_empty() {
                    out.push(' ');
                    out.push_str(label_base);
                }
                out.push('\n');
                out.push_str(&gap_base);
                out.push_str("=======\n");
                out.push_str(&gap_theirs);
                out.push_str(&format!(">>>>>>> {label_theirs}\n"));
            }
        }
        out.push_str(&join(&base_lines[anchor.base.clone()]));
        cb = anchor.base.end;
        co = anchor.ours.end;
        ct = anchor.theirs.end;
    }

    (out, conflict)
}

fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

fn join(lines: &[&str]) -> String {
    lines.concat()
}

fn equal_ranges(ops: &[DiffOp]) -> Vec<(Range<usize>, Range<usize>)> {
    ops.iter()
        .filter(|op| op.tag() == DiffTag::Equal)
        .map(|op| (op.old_range(), op.new_range()))
        .collect()
}

/// Intersects the two sides' unchanged-vs-base ranges: a base span only
/// counts as a stable anchor once both diffs agree it was left alone, so
/// anything outside an anchor is a region at least one side touched.
fn stable_anchors(
    eq_a: &[(Range<usize>, Range<usize>)],
    eq_b: &[(Range<usize>, Range<usize>)],
) -> Vec<Anchor> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < eq_a.len() && j < eq_b.len() {
        let (a_base, a_side) = &eq_a[i];
        let (b_base, b_side) = &eq_b[j];
        let lo = a_base.start.max(b_base.start);
        let hi = a_base.end.min(b_base.end);
        if lo < hi {
            let ours = (a_side.start + (lo - a_base.start))..(a_side.start + (hi - a_base.start));
            let theirs = (b_side.start + (lo - b_base.start))..(b_side.start + (hi - b_base.start));
            out.push(Anchor {
                base: lo..hi,
                ours,
                theirs,
            });
        }
        if a_base.end < b_base.end {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MergeConfig {
        MergeConfig::default()
    }

    #[test]
    fn non_overlapping_inserts_merge_cleanly() {
        let base = b"one\ntwo\nthree\n";
        let ours = b"1\none\ntwo\nthree\n";
        let theirs = b"one\ntwo\nthree\n4\n";
        let (merged, conflict) =
            merge_text(&config(), base, ours, theirs, "base", "ours", "theirs").unwrap();
        assert!(!conflict);
        assert_eq!(merged, b"1\none\ntwo\nthree\n4\n");
    }

    #[test]
    fn overlapping_edits_to_same_line_conflict() {
        let base = b"hello\n";
        let ours = b"hello ours\n";
        let theirs = b"hello theirs\n";
        let (merged, conflict) =
            merge_text(&config(), base, ours, theirs, "base", "ours", "theirs").unwrap();
        assert!(conflict);
        let text = String::from_utf8(merged).unwrap();
        assert!(text.contains("<<<<<<< ours"));
        assert!(text.contains("|||||||"));
        assert!(text.contains("======="));
        assert!(text.contains(">>>>>>> theirs"));
        assert!(text.contains("hello ours"));
        assert!(text.contains("hello theirs"));
    }

    #[test]
    fn identical_edit_on_both_sides_is_not_a_conflict() {
        let base = b"hello\n";
        let ours = b"hello world\n";
        let theirs = b"hello world\n";
        let (merged, conflict) =
            merge_text(&config(), base, ours, theirs, "base", "ours", "theirs").unwrap();
        assert!(!conflict);
        assert_eq!(merged, b"hello world\n");
    }

    #[test]
    fn embedded_nul_is_reported_as_non_text() {
        let base = b"a\0b";
        let err = merge_text(&config(), base, b"a", b"b", "base", "ours", "theirs").unwrap_err();
        assert!(matches!(err, Error::NonTextContent("base")));
    }
}
