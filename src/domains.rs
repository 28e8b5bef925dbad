//! The domain store: for each slot, the words still considered legal for it. Domains start out as
//! every word of the right length (node consistency) and only ever shrink from there.

use log::{debug, trace};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::grid_config::GridConfig;
use crate::types::{SlotId, WordId};
use crate::word_list::WordList;

/// Returned when filtering leaves some slot without a single candidate, meaning the grid can't be
/// filled from this state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no candidate words remain for slot {slot_id}")]
pub struct DomainWipeout {
    pub slot_id: SlotId,
}

/// The candidate words for each slot, as ids into the `WordList` bucket matching the slot's
/// length. Each domain holds distinct ids; order is only meaningful as the order in which search
/// tries candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    options: Vec<Vec<WordId>>,
}

impl Domains {
    /// Enforce node consistency: each slot's domain becomes exactly the words whose length matches
    /// the slot's length. Words are compared as given, with no case folding or normalization. If
    /// any slot ends up with no candidates, the grid is unsatisfiable and we report the first such
    /// slot.
    pub fn initialize(config: &GridConfig, word_list: &WordList) -> Result<Domains, DomainWipeout> {
        let options: Vec<Vec<WordId>> = config
            .slots()
            .map(|slot| {
                word_list
                    .words_of_length(slot.length)
                    .iter()
                    .enumerate()
                    .filter(|(_, word)| word.len() == slot.length)
                    .map(|(word_id, _)| word_id)
                    .collect()
            })
            .collect();

        let domains = Domains { options };

        if let Some(slot_id) = domains.first_empty_slot() {
            debug!(
                "Node consistency failed: no words of length {} for slot {}",
                config.slot(slot_id).length,
                config.slot(slot_id).to_key()
            );
            return Err(DomainWipeout { slot_id });
        }

        debug!(
            "Node consistency established: {} options across {} slots",
            domains.total_option_count(),
            domains.slot_count()
        );

        Ok(domains)
    }

    /// Build domains directly from per-slot option lists.
    #[must_use]
    pub fn from_options(options: Vec<Vec<WordId>>) -> Domains {
        Domains { options }
    }

    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.options.len()
    }

    /// The remaining candidates for a slot.
    #[must_use]
    pub fn options(&self, slot_id: SlotId) -> &[WordId] {
        &self.options[slot_id]
    }

    /// How many candidates remain for a slot?
    #[must_use]
    pub fn option_count(&self, slot_id: SlotId) -> usize {
        self.options[slot_id].len()
    }

    #[must_use]
    pub fn total_option_count(&self) -> usize {
        self.options.iter().map(Vec::len).sum()
    }

    /// The first slot with no candidates left, if any.
    #[must_use]
    pub fn first_empty_slot(&self) -> Option<SlotId> {
        self.options.iter().position(Vec::is_empty)
    }

    /// Keep only the candidates for which `keep` returns true, returning how many were removed.
    pub fn retain(&mut self, slot_id: SlotId, mut keep: impl FnMut(WordId) -> bool) -> usize {
        let before = self.options[slot_id].len();
        self.options[slot_id].retain(|&word_id| {
            let kept = keep(word_id);
            if !kept {
                trace!("Eliminating word {word_id} from slot {slot_id}");
            }
            kept
        });
        before - self.options[slot_id].len()
    }

    /// Remove a single candidate, returning whether it was present.
    pub fn remove(&mut self, slot_id: SlotId, word_id: WordId) -> bool {
        self.retain(slot_id, |other_word_id| other_word_id != word_id) > 0
    }

    /// Shrink a slot's domain to the given word alone.
    pub fn restrict(&mut self, slot_id: SlotId, word_id: WordId) {
        self.options[slot_id] = vec![word_id];
    }

    /// Reorder every domain at random. This changes which fill the search finds first but never
    /// which words are available.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for options in &mut self.options {
            options.shuffle(rng);
        }
    }

    /// The remaining candidates for a slot, as strings.
    pub fn words<'a>(
        &'a self,
        config: &GridConfig,
        word_list: &'a WordList,
        slot_id: SlotId,
    ) -> impl Iterator<Item = &'a str> + 'a {
        let length = config.slot(slot_id).length;
        self.options[slot_id]
            .iter()
            .map(move |&word_id| word_list.word(length, word_id).string.as_str())
    }
}
