//! Text-diff engine: character diffs rendered as diff-match-patch patch text.
//!
//! Uses the `similar` crate (Myers diff algorithm) over Unicode scalar values,
//! so a surrogate pair is never split across an edit. Patch coordinates are
//! emitted in UTF-16 code units, the convention of the consuming backend.

use std::time::Duration;

use similar::{Algorithm, ChangeTag, TextDiff};

/// diff-match-patch `Diff_EditCost`.
const EDIT_COST: usize = 4;
/// diff-match-patch `Patch_Margin`.
const PATCH_MARGIN: usize = 4;
/// diff-match-patch `Match_MaxBits`.
const MATCH_MAX_BITS: usize = 32;

/// Kind of a single text diff operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextOpKind {
    Equal,
    Delete,
    Insert,
}

/// A run of text that is kept, removed or added.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextOp {
    pub kind: TextOpKind,
    pub text: String,
}

impl TextOp {
    pub fn equal(text: impl Into<String>) -> Self {
        Self { kind: TextOpKind::Equal, text: text.into() }
    }

    pub fn delete(text: impl Into<String>) -> Self {
        Self { kind: TextOpKind::Delete, text: text.into() }
    }

    pub fn insert(text: impl Into<String>) -> Self {
        Self { kind: TextOpKind::Insert, text: text.into() }
    }
}

/// Errors signaled by a text-diff engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextDiffError {
    #[error("input too large for text diff: {len} chars exceeds limit of {limit}")]
    InputTooLarge { len: usize, limit: usize },

    #[error("text diff failed: {0}")]
    Engine(String),
}

/// The three-step contract of a text-diff engine.
///
/// Implementations must be side-effect free. Failures are reported as errors;
/// callers decide how to recover.
pub trait TextDiffEngine: Send + Sync {
    /// Compute raw diff operations turning `old` into `new`.
    fn compute_diff(&self, old: &str, new: &str) -> Result<Vec<TextOp>, TextDiffError>;

    /// Rewrite operations into a cheaper equivalent.
    fn optimize(&self, ops: Vec<TextOp>) -> Vec<TextOp>;

    /// Render operations as patch text.
    fn serialize(&self, ops: &[TextOp]) -> Result<String, TextDiffError>;

    /// Diff, optimize and serialize in one go.
    fn patch_text(&self, old: &str, new: &str) -> Result<String, TextDiffError> {
        let ops = self.compute_diff(old, new)?;
        self.serialize(&self.optimize(ops))
    }
}

/// Default engine producing diff-match-patch compatible patch text.
#[derive(Clone, Debug)]
pub struct DiffMatchPatchEngine {
    /// Upper bound on diff computation time; past it the diff is coarser.
    pub timeout: Option<Duration>,
    /// Combined input size, in chars, above which the engine refuses to run.
    pub max_input_chars: usize,
}

impl Default for DiffMatchPatchEngine {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(1)),
            max_input_chars: 1 << 20,
        }
    }
}

impl TextDiffEngine for DiffMatchPatchEngine {
    fn compute_diff(&self, old: &str, new: &str) -> Result<Vec<TextOp>, TextDiffError> {
        let len = old.chars().count() + new.chars().count();
        if len > self.max_input_chars {
            return Err(TextDiffError::InputTooLarge {
                len,
                limit: self.max_input_chars,
            });
        }

        let mut config = TextDiff::configure();
        config.algorithm(Algorithm::Myers);
        if let Some(timeout) = self.timeout {
            config.timeout(timeout);
        }
        let diff = config.diff_chars(old, new);

        let mut ops: Vec<TextOp> = Vec::new();
        for change in diff.iter_all_changes() {
            let kind = match change.tag() {
                ChangeTag::Equal => TextOpKind::Equal,
                ChangeTag::Delete => TextOpKind::Delete,
                ChangeTag::Insert => TextOpKind::Insert,
            };
            match ops.last_mut() {
                Some(last) if last.kind == kind => last.text.push_str(change.value()),
                _ => ops.push(TextOp { kind, text: change.value().to_string() }),
            }
        }
        Ok(cleanup_merge(ops))
    }

    fn optimize(&self, ops: Vec<TextOp>) -> Vec<TextOp> {
        cleanup_efficiency(ops)
    }

    fn serialize(&self, ops: &[TextOp]) -> Result<String, TextDiffError> {
        Ok(make_hunks(ops).iter().map(Hunk::render).collect())
    }
}

/// Length in UTF-16 code units.
pub fn utf16_len(text: &str) -> usize {
    text.chars().map(char::len_utf16).sum()
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Coalesce runs of edits between equalities into one delete and one insert,
/// moving any common prefix or suffix of the pair into the equalities.
fn cleanup_merge(ops: Vec<TextOp>) -> Vec<TextOp> {
    let mut out: Vec<TextOp> = Vec::with_capacity(ops.len());
    let mut deleted = String::new();
    let mut inserted = String::new();

    for op in ops {
        match op.kind {
            TextOpKind::Delete => deleted.push_str(&op.text),
            TextOpKind::Insert => inserted.push_str(&op.text),
            TextOpKind::Equal => {
                flush_edits(&mut out, &mut deleted, &mut inserted);
                push_equal(&mut out, &op.text);
            }
        }
    }
    flush_edits(&mut out, &mut deleted, &mut inserted);
    out
}

fn push_equal(out: &mut Vec<TextOp>, text: &str) {
    if text.is_empty() {
        return;
    }
    match out.last_mut() {
        Some(last) if last.kind == TextOpKind::Equal => last.text.push_str(text),
        _ => out.push(TextOp::equal(text)),
    }
}

fn flush_edits(out: &mut Vec<TextOp>, deleted: &mut String, inserted: &mut String) {
    if deleted.is_empty() && inserted.is_empty() {
        return;
    }

    let mut prefix = 0;
    let mut suffix = 0;
    if !deleted.is_empty() && !inserted.is_empty() {
        prefix = deleted
            .char_indices()
            .zip(inserted.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map_or(0, |((i, c), _)| i + c.len_utf8());
        suffix = deleted[prefix..]
            .chars()
            .rev()
            .zip(inserted[prefix..].chars().rev())
            .take_while(|(a, b)| a == b)
            .map(|(a, _)| a.len_utf8())
            .sum();
    }

    push_equal(out, &deleted[..prefix]);
    let del = &deleted[prefix..deleted.len() - suffix];
    let ins = &inserted[prefix..inserted.len() - suffix];
    if !del.is_empty() {
        out.push(TextOp::delete(del));
    }
    if !ins.is_empty() {
        out.push(TextOp::insert(ins));
    }
    push_equal(out, &deleted[deleted.len() - suffix..]);

    deleted.clear();
    inserted.clear();
}

/// Replace short equalities surrounded by edits with a delete/insert pair
/// when that makes the patch cheaper to express.
fn cleanup_efficiency(mut ops: Vec<TextOp>) -> Vec<TextOp> {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer: isize = 0;
    let (mut pre_ins, mut pre_del, mut post_ins, mut post_del) = (false, false, false, false);

    while (pointer as usize) < ops.len() {
        let at = pointer as usize;
        if ops[at].kind == TextOpKind::Equal {
            if char_len(&ops[at].text) < EDIT_COST && (post_ins || post_del) {
                equalities.push(at);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(ops[at].text.clone());
            } else {
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
        } else {
            if ops[at].kind == TextOpKind::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }

            let flags = [pre_ins, pre_del, post_ins, post_del];
            let split = match (&last_equality, equalities.last()) {
                (Some(equality), Some(&index)) => {
                    let all_four = flags.iter().all(|f| *f);
                    let three = flags.iter().filter(|f| **f).count() == 3;
                    (all_four || (char_len(equality) < EDIT_COST / 2 && three))
                        .then(|| (index, equality.clone()))
                }
                _ => None,
            };

            if let Some((index, equality)) = split {
                ops.insert(index, TextOp::delete(equality));
                ops[index + 1].kind = TextOpKind::Insert;
                equalities.pop();
                last_equality = None;
                if pre_ins && pre_del {
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                } else {
                    equalities.pop();
                    pointer = equalities.last().map_or(-1, |&i| i as isize);
                    post_ins = false;
                    post_del = false;
                }
                changed = true;
            }
        }
        pointer += 1;
    }

    if changed {
        cleanup_merge(ops)
    } else {
        ops
    }
}

/// One `@@ ... @@` block of a patch. Positions are in chars of the text the
/// hunk applies to; `offset16` is the same start position in UTF-16 units.
#[derive(Debug, Default)]
struct Hunk {
    ops: Vec<TextOp>,
    start: usize,
    length1: usize,
    offset16: usize,
}

impl Hunk {
    fn render(&self) -> String {
        let length1: usize = self
            .ops
            .iter()
            .filter(|op| op.kind != TextOpKind::Insert)
            .map(|op| utf16_len(&op.text))
            .sum();
        let length2: usize = self
            .ops
            .iter()
            .filter(|op| op.kind != TextOpKind::Delete)
            .map(|op| utf16_len(&op.text))
            .sum();

        let mut out = format!(
            "@@ -{} +{} @@\n",
            coords(self.offset16, length1),
            coords(self.offset16, length2)
        );
        for op in &self.ops {
            out.push(match op.kind {
                TextOpKind::Equal => ' ',
                TextOpKind::Delete => '-',
                TextOpKind::Insert => '+',
            });
            encode_uri_into(&mut out, &op.text);
            out.push('\n');
        }
        out
    }
}

fn coords(start: usize, length: usize) -> String {
    match length {
        0 => format!("{start},0"),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, length),
    }
}

/// Split diff operations into hunks with surrounding context.
fn make_hunks(ops: &[TextOp]) -> Vec<Hunk> {
    let text1: Vec<char> = ops
        .iter()
        .filter(|op| op.kind != TextOpKind::Insert)
        .flat_map(|op| op.text.chars())
        .collect();

    let mut hunks = Vec::new();
    let mut hunk = Hunk::default();
    let mut count1 = 0;
    let mut count2 = 0;
    let mut prepatch = text1.clone();
    let mut postpatch = text1;

    for (i, op) in ops.iter().enumerate() {
        let chars: Vec<char> = op.text.chars().collect();
        let len = chars.len();

        if hunk.ops.is_empty() && op.kind != TextOpKind::Equal {
            hunk.start = count1;
        }

        match op.kind {
            TextOpKind::Insert => {
                hunk.ops.push(op.clone());
                postpatch.splice(count2..count2, chars);
            }
            TextOpKind::Delete => {
                hunk.length1 += len;
                hunk.ops.push(op.clone());
                let end = (count2 + len).min(postpatch.len());
                postpatch.drain(count2..end);
            }
            TextOpKind::Equal => {
                if len <= 2 * PATCH_MARGIN && !hunk.ops.is_empty() && i + 1 != ops.len() {
                    hunk.ops.push(op.clone());
                    hunk.length1 += len;
                } else if len >= 2 * PATCH_MARGIN && !hunk.ops.is_empty() {
                    add_context(&mut hunk, &prepatch);
                    hunks.push(std::mem::take(&mut hunk));
                    prepatch.clone_from(&postpatch);
                    count1 = count2;
                }
            }
        }

        if op.kind != TextOpKind::Insert {
            count1 += len;
        }
        if op.kind != TextOpKind::Delete {
            count2 += len;
        }
    }

    if !hunk.ops.is_empty() {
        add_context(&mut hunk, &prepatch);
        hunks.push(hunk);
    }
    hunks
}

/// Grow context around the hunk until its pattern is unique in `text`
/// (bounded by the matcher's bit width), then add one more margin.
fn add_context(hunk: &mut Hunk, text: &[char]) {
    if text.is_empty() {
        return;
    }

    let start = hunk.start.min(text.len());
    let end = (start + hunk.length1).min(text.len());
    let mut padding = 0;
    let mut pattern = &text[start..end];
    while !occurs_once(text, pattern)
        && pattern.len() < MATCH_MAX_BITS - 2 * PATCH_MARGIN
    {
        padding += PATCH_MARGIN;
        pattern = &text[start.saturating_sub(padding)..(end + padding).min(text.len())];
    }
    padding += PATCH_MARGIN;

    let prefix_start = start.saturating_sub(padding);
    let prefix: String = text[prefix_start..start].iter().collect();
    let suffix: String = text[end..(end + padding).min(text.len())].iter().collect();
    let prefix_len = start - prefix_start;

    if !prefix.is_empty() {
        hunk.ops.insert(0, TextOp::equal(prefix));
    }
    if !suffix.is_empty() {
        hunk.ops.push(TextOp::equal(suffix));
    }

    hunk.start = prefix_start;
    hunk.length1 += prefix_len;
    hunk.offset16 = text[..prefix_start].iter().map(|c| c.len_utf16()).sum();
}

fn occurs_once(text: &[char], pattern: &[char]) -> bool {
    if pattern.is_empty() {
        return text.is_empty();
    }
    let mut matches = text.windows(pattern.len()).filter(|window| *window == pattern);
    matches.next().is_some() && matches.next().is_none()
}

/// `encodeURI` escaping, with spaces left readable.
fn encode_uri_into(out: &mut String, text: &str) {
    const UNESCAPED: &str = ";,/?:@&=+$-_.!~*'()# ";
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || UNESCAPED.contains(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{byte:02X}"));
            }
        }
    }
}
