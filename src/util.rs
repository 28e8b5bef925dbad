use smallvec::SmallVec;

use crate::types::WordId;
use crate::word_list::WordList;
use crate::MAX_GLYPH_COUNT;

/// Number of options containing each glyph at a single cell of a slot, indexed by `GlyphId`. A
/// nonzero count means the glyph is still available at that cell.
pub type GlyphCounts = SmallVec<[u32; MAX_GLYPH_COUNT]>;

/// Count, for one cell of a slot, how many of the given options place each glyph there.
#[must_use]
pub fn build_glyph_counts_for_cell(
    word_list: &WordList,
    slot_length: usize,
    options: &[WordId],
    cell_idx: usize,
) -> GlyphCounts {
    let mut result: GlyphCounts = (0..word_list.glyphs.len()).map(|_| 0).collect();

    for &word_id in options {
        result[word_list.word(slot_length, word_id).glyphs[cell_idx]] += 1;
    }

    result
}
