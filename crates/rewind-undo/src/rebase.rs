#![forbid(unsafe_code)]

//! Inverse computation and rebasing, shared by undo and redo.
//!
//! Reverting a stored batch walks its deltas newest first. Each delta is
//! reversed at its own end version, then carried forward through every
//! history delta recorded since. The survivors are re-positioned at the
//! current version and applied into one fresh batch, all inside a single
//! transaction.
//!
//! ```text
//! history:  d(v3) ── h1(v4) ── h2(v6) ── [now v9]
//! inverse:  d⁻¹@v4 ─T(h1)─► @v6 ─T(h2)─► @v9 ─apply─►
//! ```
//!
//! # Cancelled pairs
//!
//! A batch and the inverse a command later built for it cancel out. When
//! both halves lie in the walked history, the inverse steps over them:
//!
//! ```text
//! history:  r ── x ── c          c reverts r
//! walk:     · ── x″ ── ·         x″ = T(x, r⁻¹), r⁻¹ carried past x
//! ```
//!
//! Deltas recorded between the halves are first carried back across `r⁻¹`,
//! so the inverse only meets them in its own coordinates. Pairs nest. A pair
//! that interleaves with another one, or whose batches are not contiguous
//! runs, is transformed through like any other delta.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

use rewind_core::{
    Batch, BatchId, BatchType, DeltasFrom, Delta, Document, DocumentError, DocumentModel,
    Operation, Selection, TransformEngine, TransformError, Version,
};

use crate::stack::StackItem;

/// Outcome of reverting one stack entry.
#[derive(Debug, Clone)]
pub struct Reverted<O> {
    /// The committed inverse batch.
    pub batch: Batch<O>,
    /// The stored batch that was reverted.
    pub reverted: BatchId,
    /// Selection right before the revert ran.
    pub selection_before: Selection,
}

/// Carry `candidates`, authored at the base of the first history delta,
/// forward through `history`.
///
/// `partner` names the other half of the created/reverted pair a batch
/// belongs to; such pairs are stepped over as described in the module docs.
/// The result is positioned after the last history delta. Returns early
/// once nothing is left.
///
/// # Errors
///
/// Propagates the engine's [`TransformError`].
pub fn rebase<O, E, F>(
    engine: &E,
    mut candidates: Vec<Delta<O>>,
    history: DeltasFrom<'_, O>,
    strong: bool,
    partner: F,
) -> Result<Vec<Delta<O>>, TransformError>
where
    O: Operation,
    E: TransformEngine<O> + ?Sized,
    F: Fn(BatchId) -> Option<BatchId>,
{
    let window: Vec<&Delta<O>> = history.collect();
    let plans = plan_pairs(&window, &partner);
    let mut frames: Vec<Frame<O>> = Vec::new();

    let mut idx = 0;
    while idx < window.len() && !candidates.is_empty() {
        let delta = window[idx];
        let owner = delta.owner();

        if let Some(plan) = owner.and_then(|id| plans.get(&id)) {
            let mut inverse: Vec<Delta<O>> = window[idx..=plan.open_end]
                .iter()
                .rev()
                .map(|d| d.reversed())
                .collect();
            renumber(&mut inverse, window[plan.open_end].end_version());
            tracing::trace!(
                base = delta.base_version(),
                closer = %plan.closer,
                "stepping over cancelled pair"
            );
            frames.push(Frame {
                closer: plan.closer,
                close_end: plan.close_end,
                inverse,
            });
            idx = plan.open_end + 1;
            continue;
        }

        if frames.last().is_some_and(|frame| owner == Some(frame.closer)) {
            if let Some(frame) = frames.pop() {
                idx = frame.close_end + 1;
            }
            continue;
        }

        let base = delta.base_version();
        let mut concurrent = vec![delta.clone()];
        for frame in frames.iter_mut().rev() {
            if concurrent.is_empty() {
                break;
            }
            renumber(&mut frame.inverse, base);
            renumber(&mut concurrent, base);
            let stripped = engine.transform(concurrent.clone(), &frame.inverse, !strong)?;
            frame.inverse =
                engine.transform(std::mem::take(&mut frame.inverse), &concurrent, strong)?;
            concurrent = stripped;
        }
        if !concurrent.is_empty() {
            renumber(&mut candidates, base);
            renumber(&mut concurrent, base);
            candidates = engine.transform(candidates, &concurrent, strong)?;
            tracing::trace!(base, remaining = candidates.len(), "rebased over delta");
        }
        idx += 1;
    }

    if let Some(last) = window.last() {
        renumber(&mut candidates, last.end_version());
    }
    Ok(candidates)
}

/// An open cancelled pair: the first half's inverse, carried to the
/// current walk position.
struct Frame<O> {
    closer: BatchId,
    close_end: usize,
    inverse: Vec<Delta<O>>,
}

#[derive(Debug, Clone, Copy)]
struct PairPlan {
    open_end: usize,
    closer: BatchId,
    close_end: usize,
}

/// Find the pairs in `window` that can be stepped over, keyed by the batch
/// that opens them.
fn plan_pairs<O, F>(window: &[&Delta<O>], partner: &F) -> HashMap<BatchId, PairPlan>
where
    O: Operation,
    F: Fn(BatchId) -> Option<BatchId>,
{
    let mut runs: HashMap<BatchId, (usize, usize)> = HashMap::new();
    let mut scattered: HashSet<BatchId> = HashSet::new();
    for (idx, delta) in window.iter().enumerate() {
        let Some(owner) = delta.owner() else {
            continue;
        };
        match runs.get_mut(&owner) {
            Some(run) if run.1 + 1 == idx => run.1 = idx,
            Some(_) => {
                scattered.insert(owner);
            }
            None => {
                runs.insert(owner, (idx, idx));
            }
        }
    }

    let mut pairs: Vec<(BatchId, (usize, usize), BatchId, (usize, usize))> = runs
        .iter()
        .filter_map(|(&opener, &open)| {
            let closer = partner(opener)?;
            let &close = runs.get(&closer)?;
            let contiguous = !scattered.contains(&opener) && !scattered.contains(&closer);
            (contiguous && open.1 < close.0).then_some((opener, open, closer, close))
        })
        .collect();
    // Outer spans first, so every pair is checked against its enclosers.
    pairs.sort_by_key(|&(_, open, _, close)| (open.0, Reverse(close.1)));

    let mut spans: Vec<(usize, usize)> = Vec::new();
    let mut plans = HashMap::new();
    for (opener, open, closer, close) in pairs {
        let (start, end) = (open.0, close.1);
        let nests = spans
            .iter()
            .all(|&(s, e)| end < s || e < start || (s <= start && end <= e));
        if nests {
            spans.push((start, end));
            plans.insert(
                opener,
                PairPlan {
                    open_end: open.1,
                    closer,
                    close_end: close.1,
                },
            );
        }
    }
    plans
}

fn renumber<O: Operation>(deltas: &mut [Delta<O>], mut next: Version) {
    for delta in deltas {
        delta.set_base_version(next);
        next = delta.end_version();
    }
}

/// Revert `item` on `doc` and restore its selection, atomically.
///
/// `item` and the batch being built form a pair of their own on top of
/// those `partner` reports.
///
/// # Errors
///
/// Any [`DocumentError`]; the document is untouched when one is returned.
pub fn revert_item<M, E, F>(
    doc: &mut Document<M>,
    engine: &E,
    item: &StackItem<M::Op>,
    strong: bool,
    partner: F,
) -> Result<Reverted<M::Op>, DocumentError>
where
    M: DocumentModel,
    E: TransformEngine<M::Op> + ?Sized,
    F: Fn(BatchId) -> Option<BatchId>,
{
    let selection_before = doc.selection().clone();
    let mut tx = doc.transaction();
    let result = tx.begin_batch(BatchType::Undoable);
    let reverting = item.batch.id();
    let pairs = |id: BatchId| {
        if id == reverting {
            Some(result)
        } else if id == result {
            Some(reverting)
        } else {
            partner(id)
        }
    };

    for delta in item.batch.deltas().iter().rev() {
        let next = delta.end_version();
        let candidates = rebase(
            engine,
            vec![delta.reversed()],
            tx.history().deltas_from(next),
            strong,
            &pairs,
        )?;
        for candidate in candidates {
            tx.apply_delta(result, candidate)?;
        }
    }
    tx.set_selection(item.selection.clone());

    let batch = tx
        .batch(result)
        .cloned()
        .unwrap_or_else(|| Batch::new(result, BatchType::Undoable));
    tx.commit();
    Ok(Reverted {
        batch,
        reverted: item.batch.id(),
        selection_before,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewind_core::text::{TextBuffer, TextEdit, TextOp, TextTransform};

    fn committed(doc: &mut Document<TextBuffer>, op: TextOp) -> Batch<TextOp> {
        doc.apply_single(BatchType::Undoable, op).unwrap();
        doc.drain_commits().pop().unwrap().batch
    }

    fn typed(doc: &mut Document<TextBuffer>, position: usize, text: &str) -> Batch<TextOp> {
        committed(doc, TextOp::insert(0, position, text))
    }

    fn pair_of(first: BatchId, second: BatchId) -> impl Fn(BatchId) -> Option<BatchId> {
        move |id| {
            if id == first {
                Some(second)
            } else if id == second {
                Some(first)
            } else {
                None
            }
        }
    }

    #[test]
    fn revert_without_later_edits_is_plain_inverse() {
        let mut doc = Document::new(TextBuffer::from("abc"));
        let batch = typed(&mut doc, 1, "XY");
        let item = StackItem {
            batch,
            selection: Selection::caret(1),
        };
        let reverted = revert_item(&mut doc, &TextTransform, &item, true, |_| None).unwrap();
        assert_eq!(doc.model().as_str(), "abc");
        assert_eq!(doc.selection(), &Selection::caret(1));
        assert_eq!(reverted.reverted, item.batch.id());
        assert_eq!(reverted.batch.deltas().len(), 1);
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn revert_rebases_through_later_edits() {
        let mut doc = Document::new(TextBuffer::from("abc"));
        let batch = typed(&mut doc, 3, "!");
        typed(&mut doc, 0, ">>");
        let item = StackItem {
            batch,
            selection: Selection::default(),
        };
        revert_item(&mut doc, &TextTransform, &item, true, |_| None).unwrap();
        assert_eq!(doc.model().as_str(), ">>abc");
    }

    #[test]
    fn cancelled_pair_is_stepped_over() {
        let mut doc = Document::new(TextBuffer::from(""));
        let inserted = typed(&mut doc, 0, "abc");
        let erased = committed(&mut doc, TextOp::delete(0, 1, "b"));
        let restored = typed(&mut doc, 1, "b");
        let start = inserted.deltas()[0].end_version();
        let inverse = inserted.deltas()[0].reversed();

        let out = rebase(
            &TextTransform,
            vec![inverse.clone()],
            doc.history().deltas_from(start),
            true,
            pair_of(erased.id(), restored.id()),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].operations()[0].edit(), inverse.operations()[0].edit());
        assert_eq!(out[0].base_version(), doc.version());
    }

    #[test]
    fn edits_inside_a_cancelled_pair_are_carried_back_across_it() {
        let mut doc = Document::new(TextBuffer::from(""));
        typed(&mut doc, 0, "abc");
        let start = doc.version();
        let erased = committed(&mut doc, TextOp::delete(0, 0, "abc"));
        typed(&mut doc, 0, "X");
        let restored = typed(&mut doc, 0, "abc");
        assert_eq!(doc.model().as_str(), "abcX");

        let candidate = Delta::from_operations(vec![TextOp::delete(start, 1, "b")]);
        let out = rebase(
            &TextTransform,
            vec![candidate],
            doc.history().deltas_from(start),
            true,
            pair_of(erased.id(), restored.id()),
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(
            out[0].operations()[0].edit(),
            &TextEdit::Delete {
                position: 1,
                text: "b".into(),
            }
        );
    }

    #[test]
    fn interleaved_pairs_fall_back_to_plain_rebasing() {
        let mut doc = Document::new(TextBuffer::from("xyz"));
        let start = doc.version();
        let a = typed(&mut doc, 0, "a");
        let b = typed(&mut doc, 1, "b");
        let a_back = committed(&mut doc, TextOp::delete(0, 0, "a"));
        let b_back = committed(&mut doc, TextOp::delete(0, 0, "b"));
        assert_eq!(doc.model().as_str(), "xyz");

        let window: Vec<_> = doc.history().deltas_from(start).collect();
        let partner = |id: BatchId| {
            pair_of(a.id(), a_back.id())(id).or_else(|| pair_of(b.id(), b_back.id())(id))
        };
        let plans = plan_pairs(&window, &partner);
        assert!(plans.contains_key(&a.id()));
        assert!(!plans.contains_key(&b.id()));

        let candidate = Delta::from_operations(vec![TextOp::delete(start, 2, "z")]);
        let out = rebase(
            &TextTransform,
            vec![candidate],
            doc.history().deltas_from(start),
            true,
            partner,
        )
        .unwrap();
        let mut text = TextBuffer::from("xyz");
        for op in out.iter().flat_map(|d| d.operations()) {
            rewind_core::DocumentModel::apply(&mut text, op).unwrap();
        }
        assert_eq!(text.as_str(), "xy");
    }

    #[test]
    fn transform_failure_leaves_document_untouched() {
        let mut doc = Document::new(TextBuffer::from(""));
        let batch = typed(&mut doc, 0, "a");
        typed(&mut doc, 1, "b");
        let failing = |_: Vec<Delta<TextOp>>,
                       _: &[Delta<TextOp>],
                       _: bool|
         -> Result<Vec<Delta<TextOp>>, TransformError> {
            Err(TransformError::Unsupported {
                kind: "insert".into(),
            })
        };
        let item = StackItem {
            batch,
            selection: Selection::caret(0),
        };
        doc.set_selection(Selection::caret(2));
        let err = revert_item(&mut doc, &failing, &item, true, |_| None).unwrap_err();
        assert!(matches!(err, DocumentError::Transform(_)));
        assert_eq!(doc.model().as_str(), "ab");
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.selection(), &Selection::caret(2));
        assert_eq!(doc.pending_commits(), 0);
    }

    #[test]
    fn splitting_engine_output_is_applied_in_order() {
        let mut doc = Document::new(TextBuffer::from("abc"));
        let batch = typed(&mut doc, 3, "XY");
        typed(&mut doc, 0, "-");
        // Splits every rebased delta into one delta per character.
        let splitting = |deltas: Vec<Delta<TextOp>>,
                         concurrent: &[Delta<TextOp>],
                         strong: bool|
         -> Result<Vec<Delta<TextOp>>, TransformError> {
            let rebased = TextTransform.transform(deltas, concurrent, strong)?;
            let mut out = Vec::new();
            for delta in rebased {
                for op in delta.into_operations() {
                    if let TextEdit::Delete { position, text } = op.edit() {
                        for ch in text.chars() {
                            out.push(Delta::from_operations(vec![TextOp::delete(
                                0,
                                *position,
                                ch.to_string(),
                            )]));
                        }
                    } else {
                        out.push(Delta::from_operations(vec![op]));
                    }
                }
            }
            Ok(out)
        };
        let item = StackItem {
            batch,
            selection: Selection::default(),
        };
        let reverted = revert_item(&mut doc, &splitting, &item, true, |_| None).unwrap();
        assert_eq!(doc.model().as_str(), "-abc");
        assert_eq!(reverted.batch.deltas().len(), 2);
    }

    #[test]
    fn multi_delta_batch_reverts_without_self_rebasing() {
        let mut doc = Document::new(TextBuffer::from("abc"));
        doc.run_atomic(|tx| {
            let batch = tx.begin_batch(BatchType::Undoable);
            let base = tx.version();
            tx.apply_operation(batch, TextOp::delete(base, 0, "abc"))?;
            let base = tx.version();
            tx.apply_delta(
                batch,
                Delta::from_operations(vec![TextOp::insert(base, 0, "xyz")]),
            )?;
            Ok::<_, DocumentError>(())
        })
        .unwrap();
        let batch = doc.drain_commits().pop().unwrap().batch;
        assert_eq!(doc.model().as_str(), "xyz");

        let item = StackItem {
            batch,
            selection: Selection::default(),
        };
        revert_item(&mut doc, &TextTransform, &item, true, |_| None).unwrap();
        assert_eq!(doc.model().as_str(), "abc");
    }
}
