//! This module contains a crossword-specific implementation of the AC-3 algorithm for establishing
//! arc consistency. For our purposes, the grid is arc-consistent when every remaining option for
//! every slot has, for each crossing slot, at least one remaining option in that crossing slot
//! with the same letter in the shared cell. For example, if 1D doesn't have any options starting
//! with the letter A, we want to remove any options for 1A that start with the letter A.
//!
//! We keep revising arcs until no more eliminations are possible. This is a necessary condition
//! for a fill to exist, not a sufficient one, so it's used to prune the search rather than to
//! replace it.

use log::{debug, trace};
use std::collections::{HashSet, VecDeque};
use thiserror::Error;

use crate::domains::Domains;
use crate::grid_config::GridConfig;
use crate::types::SlotId;
use crate::util::build_glyph_counts_for_cell;
use crate::word_list::WordList;

/// An ordered pair of crossing slots `(x, y)`. Revising it makes `x` consistent with `y`.
pub type SlotArc = (SlotId, SlotId);

/// Result from a successful call to `establish_arc_consistency`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArcConsistencySuccess {
    /// How many arcs were revised.
    pub revisions: usize,

    /// How many options were removed across all slots.
    pub eliminations: usize,
}

/// Result from a failed call to `establish_arc_consistency`: revising an arc left `slot_id` with
/// no options, so the grid can't be filled from this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("arc consistency emptied the domain of slot {slot_id}")]
pub struct ArcConsistencyFailure {
    pub slot_id: SlotId,
}

/// Result from a call to `establish_arc_consistency`.
pub type ArcConsistencyResult = Result<ArcConsistencySuccess, ArcConsistencyFailure>;

/// Make slot `x` consistent with slot `y`: remove every option for `x` whose letter in the shared
/// cell doesn't appear in that cell in any of `y`'s options. Returns the number of options
/// removed. If the slots don't cross, nothing changes.
pub fn revise(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    x: SlotId,
    y: SlotId,
) -> usize {
    let Some((x_cell, y_cell)) = config.overlap(x, y) else {
        return 0;
    };

    let x_length = config.slot(x).length;
    let y_length = config.slot(y).length;

    // Which glyphs does `y` still offer at the crossing? Each `x` option needs at least one.
    let supported_glyphs =
        build_glyph_counts_for_cell(word_list, y_length, domains.options(y), y_cell);

    domains.retain(x, |word_id| {
        let glyph = word_list.word(x_length, word_id).glyphs[x_cell];
        supported_glyphs[glyph] > 0
    })
}

/// Prune `domains` until every arc is consistent. If `arcs` is `None`, start with every arc in the
/// grid; otherwise start with just the given arcs (e.g. the arcs pointing into a slot whose domain
/// was just reduced), which is enough if the rest of the grid was consistent beforehand.
///
/// Whenever revising `(x, y)` shrinks `x`, every arc `(z, x)` for the other neighbors `z` of `x`
/// is requeued. An arc already waiting in the queue isn't added twice; that only saves work,
/// since revising an arc with nothing to remove is a no-op.
pub fn establish_arc_consistency(
    config: &GridConfig,
    word_list: &WordList,
    domains: &mut Domains,
    arcs: Option<Vec<SlotArc>>,
) -> ArcConsistencyResult {
    let initial_arcs = arcs.unwrap_or_else(|| config.arcs());

    let mut queue: VecDeque<SlotArc> = VecDeque::with_capacity(initial_arcs.len());
    let mut queued: HashSet<SlotArc> = HashSet::with_capacity(initial_arcs.len());
    for arc in initial_arcs {
        if queued.insert(arc) {
            queue.push_back(arc);
        }
    }

    let mut result = ArcConsistencySuccess::default();

    while let Some((x, y)) = queue.pop_front() {
        queued.remove(&(x, y));
        result.revisions += 1;

        let removed = revise(config, word_list, domains, x, y);
        if removed == 0 {
            continue;
        }

        trace!("Revising ({x}, {y}) removed {removed} options from slot {x}");
        result.eliminations += removed;

        if domains.option_count(x) == 0 {
            debug!(
                "Arc consistency failed: slot {} has no options left",
                config.slot(x).to_key()
            );
            return Err(ArcConsistencyFailure { slot_id: x });
        }

        for &z in config.neighbors(x) {
            if z != y && queued.insert((z, x)) {
                queue.push_back((z, x));
            }
        }
    }

    debug!(
        "Arc consistency established after {} revisions ({} eliminations)",
        result.revisions, result.eliminations
    );

    Ok(result)
}
