#![forbid(unsafe_code)]

//! Character-offset transform for [`TextOp`].
//!
//! Pairwise rules, for `a` rebased over concurrent `b` (both authored at the
//! same version):
//!
//! | a \ b  | Insert                         | Delete                                  |
//! |--------|--------------------------------|-----------------------------------------|
//! | Insert | shift right unless `a` goes first (left, or tie and strong) | shift left by the deleted text before it; land on the cut if inside |
//! | Delete | shift right if the insert lands at or before it; split around an insert inside it | drop what `b` already removed |
//!
//! Sequences are transformed with the usual recursive decomposition, so
//! applying `a` then `b'` always yields the same text as `b` then `a'`.

use crate::delta::Delta;
use crate::error::TransformError;
use crate::transform::TransformEngine;

use super::{TextEdit, TextOp};

/// [`TransformEngine`] for plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextTransform;

impl TextTransform {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Transform two concurrent edit sequences against each other.
    ///
    /// Returns `(a', b')` where `a'` applies after `b` and `b'` after `a`.
    /// `strong` gives `a` the win on insert position ties.
    #[must_use]
    pub fn transform_edits(
        a: &[TextEdit],
        b: &[TextEdit],
        strong: bool,
    ) -> (Vec<TextEdit>, Vec<TextEdit>) {
        match (a, b) {
            ([], _) | (_, []) => (a.to_vec(), b.to_vec()),
            ([x], [y]) => transform_pair(x, y, strong),
            ([x], [y, rest @ ..]) => {
                let (x1, mut y1) = transform_pair(x, y, strong);
                let (x2, rest1) = Self::transform_edits(&x1, rest, strong);
                y1.extend(rest1);
                (x2, y1)
            }
            ([x, rest @ ..], _) => {
                let (mut x1, b1) = Self::transform_edits(std::slice::from_ref(x), b, strong);
                let (rest1, b2) = Self::transform_edits(rest, &b1, strong);
                x1.extend(rest1);
                (x1, b2)
            }
        }
    }
}

impl TransformEngine<TextOp> for TextTransform {
    fn transform(
        &self,
        deltas: Vec<Delta<TextOp>>,
        concurrent: &[Delta<TextOp>],
        strong: bool,
    ) -> Result<Vec<Delta<TextOp>>, TransformError> {
        let (Some(first_concurrent), Some(last_concurrent)) = (concurrent.first(), concurrent.last())
        else {
            return Ok(deltas);
        };
        match deltas.first() {
            Some(first) if first.base_version() != first_concurrent.base_version() => {
                return Err(TransformError::invalid(format!(
                    "deltas at version {} cannot be rebased over a change at version {}",
                    first.base_version(),
                    first_concurrent.base_version()
                )));
            }
            _ => {}
        }

        let mut other: Vec<TextEdit> = concurrent
            .iter()
            .flat_map(|delta| delta.operations().iter().map(|op| op.edit().clone()))
            .collect();
        let mut next = last_concurrent.end_version();

        let mut out = Vec::with_capacity(deltas.len());
        for delta in deltas {
            let edits: Vec<TextEdit> = delta
                .into_operations()
                .into_iter()
                .map(TextOp::into_edit)
                .collect();
            let (rebased, other_after) = Self::transform_edits(&edits, &other, strong);
            other = other_after;
            if rebased.is_empty() {
                continue;
            }
            let mut rebased = Delta::from_operations(
                rebased.into_iter().map(|edit| TextOp::new(next, edit)).collect(),
            );
            rebased.set_base_version(next);
            next = rebased.end_version();
            out.push(rebased);
        }
        Ok(out)
    }
}

fn transform_pair(a: &TextEdit, b: &TextEdit, a_wins: bool) -> (Vec<TextEdit>, Vec<TextEdit>) {
    use TextEdit::{Delete, Insert};

    match (a, b) {
        (Insert { position: p, text: s }, Insert { position: q, text: t }) => {
            if *p < *q || (*p == *q && a_wins) {
                (vec![a.clone()], vec![insert(q + char_len(s), t)])
            } else {
                (vec![insert(p + char_len(t), s)], vec![b.clone()])
            }
        }
        (Insert { position: p, text: s }, Delete { position: q, text: t }) => {
            insert_vs_delete(*p, s, *q, t)
        }
        (Delete { position: p, text: s }, Insert { position: q, text: t }) => {
            let (b1, a1) = insert_vs_delete(*q, t, *p, s);
            (a1, b1)
        }
        (Delete { position: p, text: s }, Delete { position: q, text: t }) => (
            delete_after_delete(*p, s, *q, t),
            delete_after_delete(*q, t, *p, s),
        ),
    }
}

/// Insert `s` at `p` against delete of `t` at `q`.
fn insert_vs_delete(p: usize, s: &str, q: usize, t: &str) -> (Vec<TextEdit>, Vec<TextEdit>) {
    let t_len = char_len(t);
    let end = q + t_len;
    if p <= q {
        (vec![insert(p, s)], vec![delete(q + char_len(s), t)])
    } else if p >= end {
        (vec![insert(p - t_len, s)], vec![delete(q, t)])
    } else {
        // Insert lands inside the deleted run: keep the inserted text and
        // delete around it.
        let cut = p - q;
        let head = take_chars(t, 0, cut);
        let tail = take_chars(t, cut, t_len);
        (
            vec![insert(q, s)],
            vec![delete(q, &head), delete(q + char_len(s), &tail)],
        )
    }
}

/// What remains of deleting `s` at `p` once `t` at `q` is already gone.
fn delete_after_delete(p: usize, s: &str, q: usize, t: &str) -> Vec<TextEdit> {
    let s_len = char_len(s);
    let p_end = p + s_len;
    let q_end = q + char_len(t);

    let before = q.clamp(p, p_end) - p;
    let after = q_end.clamp(p, p_end) - p;
    let mut kept = take_chars(s, 0, before);
    kept.push_str(&take_chars(s, after, s_len));
    if kept.is_empty() {
        return Vec::new();
    }
    let shift = if q < p { p.min(q_end) - q } else { 0 };
    vec![delete(p - shift, &kept)]
}

fn insert(position: usize, text: &str) -> TextEdit {
    TextEdit::Insert {
        position,
        text: text.to_owned(),
    }
}

fn delete(position: usize, text: &str) -> TextEdit {
    TextEdit::Delete {
        position,
        text: text.to_owned(),
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

fn take_chars(text: &str, from: usize, to: usize) -> String {
    text.chars().skip(from).take(to.saturating_sub(from)).collect()
}
