#![forbid(unsafe_code)]

//! The operational-transform seam.

use crate::delta::Delta;
use crate::error::TransformError;
use crate::operation::Operation;

/// Rebases deltas through a concurrent change.
///
/// Given deltas authored against some version and the deltas `concurrent`
/// applied at that same version, return equivalent deltas that apply after
/// `concurrent`. The output may be empty (the edit was absorbed) or longer
/// than the input (an edit was split). `strong` tells the engine whether the
/// deltas being transformed win position ties.
///
/// Implementations must be pure; the undo engine calls them repeatedly while
/// walking history.
pub trait TransformEngine<O: Operation> {
    fn transform(
        &self,
        deltas: Vec<Delta<O>>,
        concurrent: &[Delta<O>],
        strong: bool,
    ) -> Result<Vec<Delta<O>>, TransformError>;
}

impl<O, F> TransformEngine<O> for F
where
    O: Operation,
    F: Fn(Vec<Delta<O>>, &[Delta<O>], bool) -> Result<Vec<Delta<O>>, TransformError>,
{
    fn transform(
        &self,
        deltas: Vec<Delta<O>>,
        concurrent: &[Delta<O>],
        strong: bool,
    ) -> Result<Vec<Delta<O>>, TransformError> {
        self(deltas, concurrent, strong)
    }
}
