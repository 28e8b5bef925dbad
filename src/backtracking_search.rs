//! This module implements grid-filling using a recursive backtracking search. Before searching we
//! establish node consistency (word length) and arc consistency (crossing letters) to prune every
//! slot's domain. The search then assigns one slot at a time, choosing the unassigned slot with the
//! fewest remaining options (breaking ties in favor of the slot with the most crossings), and
//! rejecting any word that clashes with a crossing slot's word or repeats a word used elsewhere.
//!
//! Optionally, each choice can also be propagated through the rest of the grid by re-running arc
//! consistency on a private copy of the domains ("maintaining arc consistency"), so that dead ends
//! are detected before the search commits to further choices.

use log::{debug, trace};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;

use crate::arc_consistency::{establish_arc_consistency, ArcConsistencyFailure, SlotArc};
use crate::domains::{DomainWipeout, Domains};
use crate::grid_config::{GridConfig, Slot};
use crate::types::{SlotId, WordId};
use crate::util::build_glyph_counts_for_cell;
use crate::word_list::WordList;
use crate::CHECK_INVARIANTS;

/// How many search states should we visit between checks of the deadline, abort flag, etc.?
pub const INTERRUPT_FREQUENCY: usize = 10;

/// A struct tracking stats about the filling process.
#[derive(Debug, Clone, Default)]
pub struct Statistics {
    pub states: usize,
    pub backtracks: usize,
    pub arc_consistency_runs: usize,
    pub total_time: Duration,
    pub initial_arc_consistency_time: Duration,
    pub search_time: Duration,
}

/// The order in which candidate words are tried for a chosen slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueOrdering {
    /// Try words in domain order.
    #[default]
    DomainOrder,

    /// Try first the words that rule out the fewest options in unassigned crossing slots.
    LeastConstraining,
}

/// Configuration for a fill operation. The defaults run the plain search with no time limit.
#[derive(Debug, Clone, Default)]
pub struct FillOptions {
    /// Re-run arc consistency after every choice, on a copy of the domains owned by that branch.
    pub maintain_arc_consistency: bool,

    pub value_ordering: ValueOrdering,

    /// If given, shuffle every domain with this seed before searching, so different seeds give
    /// different fills.
    pub shuffle_seed: Option<u64>,

    pub timeout: Option<Duration>,

    /// Give up after this many backtracks.
    pub max_backtracks: Option<usize>,

    /// An optional flag that can be set from another thread to cancel the fill.
    pub abort: Option<Arc<AtomicBool>>,
}

/// A struct recording a slot assignment made during a fill process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Choice {
    pub slot_id: SlotId,
    pub word_id: WordId,
}

/// A partial or complete mapping from slots to the words chosen for them. Word ids refer to the
/// `WordList` bucket matching each slot's length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    words: Vec<Option<WordId>>,
    assigned_count: usize,
}

impl Assignment {
    /// An empty assignment for a grid with `slot_count` slots.
    #[must_use]
    pub fn new(slot_count: usize) -> Assignment {
        Assignment {
            words: vec![None; slot_count],
            assigned_count: 0,
        }
    }

    /// Assign a word to a slot, replacing any previous word.
    pub fn assign(&mut self, slot_id: SlotId, word_id: WordId) {
        if self.words[slot_id].replace(word_id).is_none() {
            self.assigned_count += 1;
        }
    }

    /// Remove a slot's word, returning it if there was one.
    pub fn unassign(&mut self, slot_id: SlotId) -> Option<WordId> {
        let previous = self.words[slot_id].take();
        if previous.is_some() {
            self.assigned_count -= 1;
        }
        previous
    }

    #[must_use]
    pub fn get(&self, slot_id: SlotId) -> Option<WordId> {
        self.words[slot_id]
    }

    #[must_use]
    pub fn is_assigned(&self, slot_id: SlotId) -> bool {
        self.words[slot_id].is_some()
    }

    /// The number of assigned slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assigned_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assigned_count == 0
    }

    /// Does every slot have a word?
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.assigned_count == self.words.len()
    }

    /// Iterate over `(slot, word)` pairs for assigned slots, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (SlotId, WordId)> + '_ {
        self.words
            .iter()
            .enumerate()
            .filter_map(|(slot_id, word_id)| word_id.map(|word_id| (slot_id, word_id)))
    }

    #[must_use]
    pub fn choices(&self) -> Vec<Choice> {
        self.iter()
            .map(|(slot_id, word_id)| Choice { slot_id, word_id })
            .collect()
    }

    /// The word assigned to a slot, as a string.
    #[must_use]
    pub fn word<'a>(
        &self,
        config: &GridConfig,
        word_list: &'a WordList,
        slot_id: SlotId,
    ) -> Option<&'a str> {
        self.get(slot_id).map(|word_id| {
            word_list
                .word(config.slot(slot_id).length, word_id)
                .string
                .as_str()
        })
    }

    /// The assignment as a map from slot to word string.
    #[must_use]
    pub fn to_word_map(&self, config: &GridConfig, word_list: &WordList) -> HashMap<Slot, String> {
        self.iter()
            .map(|(slot_id, word_id)| {
                let slot = *config.slot(slot_id);
                (slot, word_list.word(slot.length, word_id).string.clone())
            })
            .collect()
    }
}

/// Do these two slot assignments clash? They do if they're the same word, or if the slots cross
/// and the words disagree on the shared cell.
#[must_use]
pub fn choices_conflict(
    config: &GridConfig,
    word_list: &WordList,
    first: Choice,
    second: Choice,
) -> bool {
    let first_length = config.slot(first.slot_id).length;
    let second_length = config.slot(second.slot_id).length;

    if first_length == second_length && first.word_id == second.word_id {
        return true;
    }

    config
        .overlap(first.slot_id, second.slot_id)
        .is_some_and(|(first_cell, second_cell)| {
            word_list.word(first_length, first.word_id).glyphs[first_cell]
                != word_list.word(second_length, second.word_id).glyphs[second_cell]
        })
}

/// Is the word assigned to `slot_id` compatible with every other assigned slot? Since consistency
/// is pairwise, checking only the pairs involving the latest slot is enough to keep an
/// already-consistent assignment consistent.
#[must_use]
pub fn is_consistent_with(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    slot_id: SlotId,
) -> bool {
    let Some(word_id) = assignment.get(slot_id) else {
        return true;
    };
    let choice = Choice { slot_id, word_id };

    assignment
        .iter()
        .filter(|&(other_slot_id, _)| other_slot_id != slot_id)
        .all(|(other_slot_id, other_word_id)| {
            !choices_conflict(
                config,
                word_list,
                choice,
                Choice {
                    slot_id: other_slot_id,
                    word_id: other_word_id,
                },
            )
        })
}

/// Check every pair of assigned slots: crossing letters must agree and no word may be used twice.
#[must_use]
pub fn is_consistent(config: &GridConfig, word_list: &WordList, assignment: &Assignment) -> bool {
    let choices = assignment.choices();

    choices.iter().enumerate().all(|(idx, &first)| {
        choices[idx + 1..]
            .iter()
            .all(|&second| !choices_conflict(config, word_list, first, second))
    })
}

/// Pick the next slot to fill: the unassigned slot with the fewest remaining options, breaking ties
/// by the most crossings and then by the lowest slot id.
#[must_use]
pub fn select_unassigned_slot(
    config: &GridConfig,
    assignment: &Assignment,
    domains: &Domains,
) -> Option<SlotId> {
    (0..config.slot_count())
        .filter(|&slot_id| !assignment.is_assigned(slot_id))
        .min_by_key(|&slot_id| (domains.option_count(slot_id), Reverse(config.degree(slot_id))))
}

/// List the candidate words for a slot in the order the search should try them.
#[must_use]
pub fn order_domain_values(
    config: &GridConfig,
    word_list: &WordList,
    assignment: &Assignment,
    domains: &Domains,
    slot_id: SlotId,
    ordering: ValueOrdering,
) -> Vec<WordId> {
    let mut options = domains.options(slot_id).to_vec();

    if ordering == ValueOrdering::LeastConstraining {
        let slot_length = config.slot(slot_id).length;

        // For each unassigned crossing slot, count the options offering each glyph at the shared
        // cell; anything that doesn't match our word's glyph there would be ruled out.
        let crossing_counts: Vec<_> = config
            .neighbors(slot_id)
            .iter()
            .filter(|&&other_slot_id| !assignment.is_assigned(other_slot_id))
            .filter_map(|&other_slot_id| {
                let (cell, other_cell) = config.overlap(slot_id, other_slot_id)?;
                let counts = build_glyph_counts_for_cell(
                    word_list,
                    config.slot(other_slot_id).length,
                    domains.options(other_slot_id),
                    other_cell,
                );
                Some((cell, domains.option_count(other_slot_id), counts))
            })
            .collect();

        options.sort_by_cached_key(|&word_id| {
            let word = word_list.word(slot_length, word_id);
            crossing_counts
                .iter()
                .map(|(cell, option_count, counts)| {
                    option_count - counts[word.glyphs[*cell]] as usize
                })
                .sum::<usize>()
        });
    }

    options
}

/// A struct representing the results of a fill operation.
#[derive(Debug)]
pub struct FillSuccess {
    pub statistics: Statistics,
    pub assignment: Assignment,
}

/// Why a fill operation didn't produce an assignment. The first two variants mean the grid has no
/// fill for this vocabulary; the others mean the search was cut short.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FillFailure {
    #[error("no candidate words are possible for slot {0}")]
    UnsatisfiableDomain(SlotId),

    #[error("searched every possibility without finding a fill")]
    SearchExhausted,

    #[error("timed out")]
    Timeout,

    #[error("aborted")]
    Abort,

    #[error("exceeded backtrack limit ({0} backtracks)")]
    ExceededBacktrackLimit(usize),
}

impl FillFailure {
    /// Does this failure mean that the grid can't be filled, as opposed to the search being
    /// interrupted?
    #[must_use]
    pub fn is_no_solution(&self) -> bool {
        matches!(
            self,
            FillFailure::UnsatisfiableDomain(_) | FillFailure::SearchExhausted
        )
    }
}

impl From<DomainWipeout> for FillFailure {
    fn from(DomainWipeout { slot_id }: DomainWipeout) -> Self {
        FillFailure::UnsatisfiableDomain(slot_id)
    }
}

impl From<ArcConsistencyFailure> for FillFailure {
    fn from(ArcConsistencyFailure { slot_id }: ArcConsistencyFailure) -> Self {
        FillFailure::UnsatisfiableDomain(slot_id)
    }
}

/// The state of a single search: shared read-only inputs plus counters. The assignment and the
/// domain snapshots are passed through the recursion instead of living here.
struct Search<'a> {
    config: &'a GridConfig,
    word_list: &'a WordList,
    options: &'a FillOptions,
    deadline: Option<Instant>,
    statistics: Statistics,
}

impl Search<'_> {
    /// Bail out if we've passed our deadline or been asked to stop.
    fn check_interrupts(&self) -> Result<(), FillFailure> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(FillFailure::Timeout);
            }
        }
        if let Some(abort) = &self.options.abort {
            if abort.load(Ordering::Relaxed) {
                return Err(FillFailure::Abort);
            }
        }
        Ok(())
    }

    /// Record that a tentative choice was undone.
    fn record_backtrack(&mut self, choice: Choice) -> Result<(), FillFailure> {
        self.statistics.backtracks += 1;
        trace!(
            "Backtracking: slot {} word {}",
            choice.slot_id,
            choice.word_id
        );

        match self.options.max_backtracks {
            Some(max_backtracks) if self.statistics.backtracks > max_backtracks => Err(
                FillFailure::ExceededBacktrackLimit(self.statistics.backtracks),
            ),
            _ => Ok(()),
        }
    }

    /// Propagate the implications of a choice into a fresh copy of the domains: the slot keeps only
    /// its word, no other unassigned slot may use the word, and arc consistency is restored from
    /// the slots that changed. Returns `None` if any domain is wiped out.
    fn propagate_choice(
        &mut self,
        domains: &Domains,
        assignment: &Assignment,
        choice: Choice,
    ) -> Option<Domains> {
        let config = self.config;
        let Choice { slot_id, word_id } = choice;
        let length = config.slot(slot_id).length;

        let mut next_domains = domains.clone();
        next_domains.restrict(slot_id, word_id);

        let mut arcs: Vec<SlotArc> = config
            .neighbors(slot_id)
            .iter()
            .map(|&other_slot_id| (other_slot_id, slot_id))
            .collect();

        for other_slot_id in 0..config.slot_count() {
            if other_slot_id == slot_id
                || assignment.is_assigned(other_slot_id)
                || config.slot(other_slot_id).length != length
            {
                continue;
            }

            if next_domains.remove(other_slot_id, word_id) {
                if next_domains.option_count(other_slot_id) == 0 {
                    return None;
                }
                arcs.extend(
                    config
                        .neighbors(other_slot_id)
                        .iter()
                        .map(|&neighbor_id| (neighbor_id, other_slot_id)),
                );
            }
        }

        self.statistics.arc_consistency_runs += 1;
        establish_arc_consistency(config, self.word_list, &mut next_domains, Some(arcs))
            .ok()
            .map(|_| next_domains)
    }

    /// Try to extend `assignment` into a complete, consistent fill. Returns `Ok(false)` if no
    /// extension exists below this point, in which case `assignment` is left as it was passed in.
    /// On `Err` (an interruption) the assignment may still hold the tentative choices of every
    /// level being unwound; callers throw it away in that case.
    fn backtrack(
        &mut self,
        assignment: &mut Assignment,
        domains: &Domains,
    ) -> Result<bool, FillFailure> {
        self.statistics.states += 1;

        if (self.statistics.states - 1) % INTERRUPT_FREQUENCY == 0 {
            self.check_interrupts()?;
        }

        let Some(slot_id) = select_unassigned_slot(self.config, assignment, domains) else {
            // Every slot has a word.
            return Ok(true);
        };

        let candidates = order_domain_values(
            self.config,
            self.word_list,
            assignment,
            domains,
            slot_id,
            self.options.value_ordering,
        );

        for word_id in candidates {
            let choice = Choice { slot_id, word_id };
            assignment.assign(slot_id, word_id);

            if !is_consistent_with(self.config, self.word_list, assignment, slot_id) {
                assignment.unassign(slot_id);
                self.record_backtrack(choice)?;
                continue;
            }

            if CHECK_INVARIANTS && !is_consistent(self.config, self.word_list, assignment) {
                panic!("Inconsistent assignment after choosing {choice:?}");
            }

            let propagated = if self.options.maintain_arc_consistency {
                let Some(next_domains) = self.propagate_choice(domains, assignment, choice) else {
                    assignment.unassign(slot_id);
                    self.record_backtrack(choice)?;
                    continue;
                };
                Some(next_domains)
            } else {
                None
            };

            if self.backtrack(assignment, propagated.as_ref().unwrap_or(domains))? {
                return Ok(true);
            }

            assignment.unassign(slot_id);
            self.record_backtrack(choice)?;
        }

        Ok(false)
    }
}

/// Search for a fill starting from the given domains, which are expected to already be node
/// consistent (and, for best performance, arc consistent).
pub fn find_fill_with_domains(
    config: &GridConfig,
    word_list: &WordList,
    mut domains: Domains,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    if let Some(slot_id) = domains.first_empty_slot() {
        return Err(FillFailure::UnsatisfiableDomain(slot_id));
    }

    if let Some(seed) = options.shuffle_seed {
        domains.shuffle(&mut SmallRng::seed_from_u64(seed));
    }

    let mut search = Search {
        config,
        word_list,
        options,
        deadline: options.timeout.map(|timeout| start + timeout),
        statistics: Statistics::default(),
    };
    let mut assignment = Assignment::new(config.slot_count());

    debug!(
        "Starting search over {} slots ({} options)",
        config.slot_count(),
        domains.total_option_count()
    );

    let found = search.backtrack(&mut assignment, &domains)?;

    search.statistics.search_time = start.elapsed();
    search.statistics.total_time = search.statistics.search_time;
    debug!("Search finished (found: {found}): {:?}", search.statistics);

    if found {
        Ok(FillSuccess {
            statistics: search.statistics,
            assignment,
        })
    } else {
        Err(FillFailure::SearchExhausted)
    }
}

/// Search for a valid fill for the given grid and word list: enforce node consistency, then arc
/// consistency, then run the backtracking search on what's left.
pub fn find_fill(
    config: &GridConfig,
    word_list: &WordList,
    options: &FillOptions,
) -> Result<FillSuccess, FillFailure> {
    let start = Instant::now();

    let mut domains = Domains::initialize(config, word_list)?;
    establish_arc_consistency(config, word_list, &mut domains, None)?;
    let initial_arc_consistency_time = start.elapsed();

    let mut result = find_fill_with_domains(config, word_list, domains, options)?;
    result.statistics.arc_consistency_runs += 1;
    result.statistics.initial_arc_consistency_time = initial_arc_consistency_time;
    result.statistics.total_time = start.elapsed();

    Ok(result)
}

/// Fill the grid with default options, returning `None` if no fill exists.
#[must_use]
pub fn solve(config: &GridConfig, word_list: &WordList) -> Option<Assignment> {
    find_fill(config, word_list, &FillOptions::default())
        .ok()
        .map(|result| result.assignment)
}

#[cfg(test)]
mod tests {
    use crate::backtracking_search::{
        find_fill, find_fill_with_domains, is_consistent, order_domain_values,
        select_unassigned_slot, solve, Assignment, FillFailure, FillOptions, ValueOrdering,
    };
    use crate::domains::Domains;
    use crate::grid_config::{render_grid, GridConfig};
    use crate::word_list::tests::resource_path;
    use crate::word_list::WordList;
    use std::collections::HashSet;
    use std::fs;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    // An across slot and a down slot crossing at their middle cells.
    const MIDDLE_CROSSING: &str = "#_#\n___\n#_#\n";

    // An across slot whose middle cell is the first cell of a down slot.
    const CORNER: &str = "___\n#_#\n#_#\n";

    const SQUARE: &str = "___\n___\n___\n";

    const SQUARE_WORDS: [&str; 14] = [
        "CAT", "DOG", "EAR", "RAT", "TOE", "OWE", "BEG", "AGO", "BAG", "ORE", "WET", "BOW", "ARE",
        "GET",
    ];

    fn load_fixture() -> (GridConfig, WordList) {
        let config = GridConfig::from_structure_string(
            &fs::read_to_string(resource_path("structure0.txt")).unwrap(),
        )
        .unwrap();
        let word_list = WordList::from_file(&resource_path("words0.txt"), None).unwrap();
        (config, word_list)
    }

    /// Check every property a finished fill must have.
    fn assert_valid_fill(config: &GridConfig, word_list: &WordList, assignment: &Assignment) {
        assert!(assignment.is_complete(), "every slot should have a word");

        let words = assignment.to_word_map(config, word_list);
        assert_eq!(words.len(), config.slot_count());

        for (slot, word) in &words {
            assert_eq!(word.chars().count(), slot.length, "{word} doesn't fit {slot:?}");
        }

        for (x, y) in config.arcs() {
            let (x_cell, y_cell) = config.overlap(x, y).unwrap();
            let x_word = &words[config.slot(x)];
            let y_word = &words[config.slot(y)];
            assert_eq!(
                x_word.chars().nth(x_cell),
                y_word.chars().nth(y_cell),
                "{x_word} and {y_word} disagree at their crossing"
            );
        }

        let distinct: HashSet<&String> = words.values().collect();
        assert_eq!(distinct.len(), words.len(), "a word was used twice");

        assert!(is_consistent(config, word_list, assignment));
    }

    #[test]
    fn test_fills_fixture_grid() {
        let (config, word_list) = load_fixture();

        let result = find_fill(&config, &word_list, &FillOptions::default())
            .expect("Failed to find a fill");

        println!("{:?}", result.statistics);
        println!("{}", render_grid(&config, &word_list, &result.assignment));

        assert_valid_fill(&config, &word_list, &result.assignment);
    }

    #[test]
    fn test_middle_crossing() {
        let config = GridConfig::from_structure_string(MIDDLE_CROSSING).unwrap();

        // CAT, DOG and ACE all have different middle letters, so nothing can cross.
        let word_list = WordList::from_words(["CAT", "DOG", "ACE"], None);
        assert!(solve(&config, &word_list).is_none());

        let word_list = WordList::from_words(["CAT", "DOG", "ACE", "BAT"], None);
        let assignment = solve(&config, &word_list).expect("CAT and BAT share a middle letter");

        assert_valid_fill(&config, &word_list, &assignment);
        let mut words: Vec<_> = assignment
            .to_word_map(&config, &word_list)
            .into_values()
            .collect();
        words.sort();
        assert_eq!(words, vec!["BAT", "CAT"]);
    }

    #[test]
    fn test_corner_crossing() {
        let config = GridConfig::from_structure_string(CORNER).unwrap();

        let word_list = WordList::from_words(["CAT", "DOG", "ACE"], None);
        let assignment = solve(&config, &word_list).expect("CAT and ACE fit together");
        assert_valid_fill(&config, &word_list, &assignment);

        let words = assignment.to_word_map(&config, &word_list);
        let mut values: Vec<_> = words.values().cloned().collect();
        values.sort();
        assert_eq!(values, vec!["ACE", "CAT"]);

        let word_list = WordList::from_words(["CAT", "DOG"], None);
        assert_eq!(
            find_fill(&config, &word_list, &FillOptions::default()).map(|_| ()),
            Err(FillFailure::UnsatisfiableDomain(0))
        );
    }

    #[test]
    fn test_no_words_of_slot_length() {
        let config = GridConfig::from_structure_string("____\n").unwrap();
        let word_list = WordList::from_words(["CAT", "HORSE"], None);

        let failure = find_fill(&config, &word_list, &FillOptions::default()).unwrap_err();

        assert_eq!(failure, FillFailure::UnsatisfiableDomain(0));
        assert!(failure.is_no_solution());
        assert!(solve(&config, &word_list).is_none());

        // The abort flag is checked on the very first search state, so getting the domain failure
        // back instead of `Abort` means the search never started.
        let options = FillOptions {
            abort: Some(Arc::new(AtomicBool::new(true))),
            ..FillOptions::default()
        };
        assert_eq!(
            find_fill(&config, &word_list, &options).map(|_| ()),
            Err(FillFailure::UnsatisfiableDomain(0))
        );
        let domains = Domains::from_options(vec![vec![]]);
        assert_eq!(
            find_fill_with_domains(&config, &word_list, domains, &options).map(|_| ()),
            Err(FillFailure::UnsatisfiableDomain(0))
        );
    }

    #[test]
    fn test_word_list_filtered_to_nothing() {
        let config = GridConfig::from_structure_string("__\n").unwrap();
        let word_list = WordList::from_file(&resource_path("words0.txt"), Some(2)).unwrap();

        let failure = find_fill(&config, &word_list, &FillOptions::default()).unwrap_err();
        assert_eq!(failure, FillFailure::UnsatisfiableDomain(0));
        assert!(failure.is_no_solution());
    }

    #[test]
    fn test_plus_shape_without_matching_middles() {
        let config = GridConfig::from_structure_string(
            &fs::read_to_string(resource_path("structure1.txt")).unwrap(),
        )
        .unwrap();
        let word_list = WordList::from_file(&resource_path("words0.txt"), None).unwrap();

        // THREE, SEVEN and EIGHT all have different middle letters. Each one still supports
        // itself at the crossing, so arc consistency can't rule anything out; the search has to.
        let failure = find_fill(&config, &word_list, &FillOptions::default()).unwrap_err();
        assert_eq!(failure, FillFailure::SearchExhausted);
        assert!(failure.is_no_solution());
    }

    #[test]
    fn test_independent_slots() {
        let config = GridConfig::from_structure_string("___#\n####\n____\n").unwrap();

        let word_list = WordList::from_words(["CAT", "FISH"], None);
        let assignment = solve(&config, &word_list).expect("each slot has its own word");
        assert_eq!(assignment.word(&config, &word_list, 0), Some("CAT"));
        assert_eq!(assignment.word(&config, &word_list, 1), Some("FISH"));
    }

    #[test]
    fn test_no_word_is_used_twice() {
        let config = GridConfig::from_structure_string("___\n###\n___\n").unwrap();

        // Both slots can only take CAT, and a word can't be used twice.
        let word_list = WordList::from_words(["CAT"], None);
        assert_eq!(
            find_fill(&config, &word_list, &FillOptions::default()).map(|_| ()),
            Err(FillFailure::SearchExhausted)
        );

        let word_list = WordList::from_words(["CAT", "DOG"], None);
        let assignment = solve(&config, &word_list).expect("CAT and DOG can share the grid");
        assert_valid_fill(&config, &word_list, &assignment);
    }

    #[test]
    fn test_uniqueness_forces_backtrack() {
        let config = GridConfig::from_structure_string(CORNER).unwrap();
        // Arc consistency leaves the down slot with only AAA, so the across slot has to skip it.
        let word_list = WordList::from_words(["AAA", "BAB"], None);

        let result = find_fill(&config, &word_list, &FillOptions::default())
            .expect("BAB across, AAA down");
        assert_eq!(result.assignment.word(&config, &word_list, 0), Some("BAB"));
        assert_eq!(result.assignment.word(&config, &word_list, 1), Some("AAA"));
        assert_eq!(result.statistics.backtracks, 1);

        let options = FillOptions {
            max_backtracks: Some(0),
            ..FillOptions::default()
        };
        let failure = find_fill(&config, &word_list, &options).unwrap_err();
        assert_eq!(failure, FillFailure::ExceededBacktrackLimit(1));
        assert!(!failure.is_no_solution());
    }

    #[test]
    fn test_fill_for_3x3_square() {
        let config = GridConfig::from_structure_string(SQUARE).unwrap();
        let word_list = WordList::from_words(SQUARE_WORDS, None);

        for maintain_arc_consistency in [false, true] {
            for value_ordering in [ValueOrdering::DomainOrder, ValueOrdering::LeastConstraining] {
                let options = FillOptions {
                    maintain_arc_consistency,
                    value_ordering,
                    ..FillOptions::default()
                };

                let result =
                    find_fill(&config, &word_list, &options).expect("Failed to find a fill");
                println!("{:?}", result.statistics);
                assert_valid_fill(&config, &word_list, &result.assignment);
            }
        }
    }

    #[test]
    fn test_unfillable_square_fails_gracefully() {
        let config = GridConfig::from_structure_string(SQUARE).unwrap();
        // Only five distinct words for six slots; AC can't see that but the search must.
        let word_list = WordList::from_words(["AAA", "AAB", "ABA", "BAA", "BBB"], None);

        for maintain_arc_consistency in [false, true] {
            let options = FillOptions {
                maintain_arc_consistency,
                ..FillOptions::default()
            };
            let failure = find_fill(&config, &word_list, &options).unwrap_err();
            assert!(failure.is_no_solution(), "unexpected failure {failure:?}");
        }
    }

    #[test]
    fn test_fill_is_deterministic() {
        let config = GridConfig::from_structure_string(SQUARE).unwrap();
        let word_list = WordList::from_words(SQUARE_WORDS, None);

        let first = solve(&config, &word_list).unwrap();
        let second = solve(&config, &word_list).unwrap();
        assert_eq!(first, second);

        let options = FillOptions {
            shuffle_seed: Some(3),
            ..FillOptions::default()
        };
        let first = find_fill(&config, &word_list, &options).unwrap();
        let second = find_fill(&config, &word_list, &options).unwrap();
        assert_eq!(first.assignment, second.assignment);
    }

    #[test]
    fn test_shuffled_fills_are_valid() {
        let (config, word_list) = load_fixture();

        for seed in 0..8 {
            let options = FillOptions {
                shuffle_seed: Some(seed),
                maintain_arc_consistency: seed % 2 == 0,
                ..FillOptions::default()
            };
            let result = find_fill(&config, &word_list, &options).expect("Failed to find a fill");
            assert_valid_fill(&config, &word_list, &result.assignment);
        }
    }

    #[test]
    fn test_grid_without_slots() {
        let config = GridConfig::from_structure_string("_#_\n#_#\n").unwrap();
        let word_list = WordList::from_words(["CAT"], None);

        let assignment = solve(&config, &word_list).expect("nothing to fill");
        assert!(assignment.is_empty());
        assert!(assignment.is_complete());
    }

    #[test]
    fn test_search_on_given_domains() {
        let config = GridConfig::from_structure_string(CORNER).unwrap();
        let word_list = WordList::from_words(["CAT", "DOG", "ACE"], None);

        // Without any pruning the search still has to land on a consistent fill.
        let domains = Domains::initialize(&config, &word_list).unwrap();
        let result = find_fill_with_domains(&config, &word_list, domains, &FillOptions::default())
            .expect("Failed to find a fill");
        assert_valid_fill(&config, &word_list, &result.assignment);

        let empty = Domains::from_options(vec![vec![0, 1], vec![]]);
        assert_eq!(
            find_fill_with_domains(&config, &word_list, empty, &FillOptions::default()).map(|_| ()),
            Err(FillFailure::UnsatisfiableDomain(1))
        );
    }

    #[test]
    fn test_select_unassigned_slot() {
        let (config, _) = load_fixture();
        // Slots: 0,1 across (degree 1), 4,1 across (degree 2), 0,1 down (degree 2),
        // 1,4 down (degree 1).
        let domains = Domains::from_options(vec![vec![0, 1], vec![0, 1], vec![0, 1], vec![0, 1, 2]]);
        let mut assignment = Assignment::new(config.slot_count());

        assert_eq!(select_unassigned_slot(&config, &assignment, &domains), Some(1));

        assignment.assign(1, 0);
        assert_eq!(select_unassigned_slot(&config, &assignment, &domains), Some(2));

        assignment.assign(2, 0);
        assert_eq!(select_unassigned_slot(&config, &assignment, &domains), Some(0));

        assignment.assign(0, 0);
        assignment.assign(3, 0);
        assert_eq!(select_unassigned_slot(&config, &assignment, &domains), None);
    }

    #[test]
    fn test_least_constraining_value_ordering() {
        let config = GridConfig::from_structure_string(CORNER).unwrap();
        let word_list = WordList::from_words(["ACE", "CAT", "ADO"], None);
        let domains = Domains::from_options(vec![vec![0, 1], vec![0, 1, 2]]);
        let assignment = Assignment::new(config.slot_count());

        assert_eq!(
            order_domain_values(
                &config,
                &word_list,
                &assignment,
                &domains,
                0,
                ValueOrdering::DomainOrder
            ),
            vec![0, 1]
        );

        // CAT leaves ACE and ADO for the down slot; ACE only leaves CAT.
        assert_eq!(
            order_domain_values(
                &config,
                &word_list,
                &assignment,
                &domains,
                0,
                ValueOrdering::LeastConstraining
            ),
            vec![1, 0]
        );
    }

    #[test]
    fn test_consistency_checks() {
        let config = GridConfig::from_structure_string(CORNER).unwrap();
        let word_list = WordList::from_words(["CAT", "ACE", "DOG"], None);
        let mut assignment = Assignment::new(config.slot_count());

        assignment.assign(0, 0);
        assignment.assign(1, 1);
        assert!(is_consistent(&config, &word_list, &assignment));

        assignment.assign(1, 2);
        assert!(!is_consistent(&config, &word_list, &assignment), "A vs D");

        assignment.assign(1, 0);
        assert!(!is_consistent(&config, &word_list, &assignment), "CAT twice");

        assert_eq!(assignment.unassign(1), Some(0));
        assert!(is_consistent(&config, &word_list, &assignment));
        assert_eq!(assignment.len(), 1);
    }

    #[test]
    fn test_abort_and_timeout() {
        let config = GridConfig::from_structure_string(SQUARE).unwrap();
        let word_list = WordList::from_words(SQUARE_WORDS, None);

        let options = FillOptions {
            abort: Some(Arc::new(AtomicBool::new(true))),
            ..FillOptions::default()
        };
        assert_eq!(
            find_fill(&config, &word_list, &options).map(|_| ()),
            Err(FillFailure::Abort)
        );

        let options = FillOptions {
            timeout: Some(Duration::ZERO),
            ..FillOptions::default()
        };
        let failure = find_fill(&config, &word_list, &options).unwrap_err();
        assert_eq!(failure, FillFailure::Timeout);
        assert!(!failure.is_no_solution());
    }
}
