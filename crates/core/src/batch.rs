//! Batch partitioning and mint-run assembly.
//!
//! Pending purchases are cut into fixed-size [`Batch`]es. After each
//! purchase in a batch has been processed, the per-purchase results are
//! folded into [`MintRun`]s: maximal runs of successful purchases with
//! consecutive ids. Each run becomes exactly one mint call, so a failure
//! inside a batch splits the range instead of shifting URIs onto the
//! wrong purchases.

use crate::types::{Purchase, PurchaseId};

/// Purchases per batch unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 20;

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// A contiguous slice of the pending-purchase list.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Position of the first purchase in the full list.
    pub offset: usize,
    pub purchases: &'a [Purchase],
}

impl Batch<'_> {
    /// Position of the first purchase in the full list. Positions are only
    /// used to slice the list; mint bounds come from [`MintRun`].
    pub fn first_position(&self) -> usize {
        self.offset
    }

    /// Position of the last purchase in the full list.
    pub fn last_position(&self) -> usize {
        self.offset + self.purchases.len().saturating_sub(1)
    }

    pub fn len(&self) -> usize {
        self.purchases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.purchases.is_empty()
    }
}

/// Split `purchases` into order-preserving chunks of at most `max_size`.
///
/// A `max_size` of zero is treated as one.
pub fn partition(purchases: &[Purchase], max_size: usize) -> Vec<Batch<'_>> {
    let size = max_size.max(1);
    purchases
        .chunks(size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            offset: i * size,
            purchases: chunk,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MintRun
// ---------------------------------------------------------------------------

/// One mint call: a consecutive id range with one token URI per id.
///
/// `from_index` and `to_index_inclusive` are purchase ids, which the
/// contract uses as the index into its purchase records. They are not
/// positions in the `listPurchases()` result: once fulfilled purchases
/// drop out of that list, position and id diverge, and only ids name the
/// right records.
///
/// Fields are private so `token_uris.len() == to - from + 1` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintRun {
    from_index: PurchaseId,
    to_index_inclusive: PurchaseId,
    token_uris: Vec<String>,
}

impl MintRun {
    /// Start a run with a single purchase.
    pub fn single(id: PurchaseId, token_uri: String) -> Self {
        Self {
            from_index: id,
            to_index_inclusive: id,
            token_uris: vec![token_uri],
        }
    }

    /// Append the next purchase if its id directly follows the run.
    ///
    /// Returns the URI back when the id does not extend the range.
    pub fn try_extend(&mut self, id: PurchaseId, token_uri: String) -> Result<(), String> {
        match self.to_index_inclusive.checked_add(1) {
            Some(next) if next == id => {
                self.to_index_inclusive = id;
                self.token_uris.push(token_uri);
                Ok(())
            }
            _ => Err(token_uri),
        }
    }

    pub fn from_index(&self) -> PurchaseId {
        self.from_index
    }

    pub fn to_index_inclusive(&self) -> PurchaseId {
        self.to_index_inclusive
    }

    pub fn token_uris(&self) -> &[String] {
        &self.token_uris
    }

    pub fn len(&self) -> usize {
        self.token_uris.len()
    }

    pub fn is_empty(&self) -> bool {
        self.token_uris.is_empty()
    }
}

/// Fold ordered per-purchase results into mint runs.
///
/// `Some(uri)` marks a purchase that completed every publishing step;
/// `None` marks a failure, which closes the current run. A gap in ids
/// also closes it.
pub fn assemble_runs<I>(results: I) -> Vec<MintRun>
where
    I: IntoIterator<Item = (PurchaseId, Option<String>)>,
{
    let mut runs = Vec::new();
    let mut current: Option<MintRun> = None;

    for (id, uri) in results {
        let Some(uri) = uri else {
            runs.extend(current.take());
            continue;
        };

        current = match current.take() {
            Some(mut run) => match run.try_extend(id, uri) {
                Ok(()) => Some(run),
                Err(uri) => {
                    runs.push(run);
                    Some(MintRun::single(id, uri))
                }
            },
            None => Some(MintRun::single(id, uri)),
        };
    }

    runs.extend(current);
    runs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
