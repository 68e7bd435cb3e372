/*!
Instant-runoff tabulation of fully ranked ballots.

Every voter ranks all the candidates. Each round counts the first choices of
the remaining candidates as a share of the vote. A candidate with more than
half of the vote wins; two candidates at exactly half each is a draw;
otherwise the candidate with the fewest first choices is removed from every
ballot and the next round starts.

```
use instant_runoff::*;

let ballots = vec![
    Ballot::new(&[("A", 1), ("B", 2), ("C", 3)]),
    Ballot::new(&[("A", 1), ("B", 2), ("C", 3)]),
    Ballot::new(&[("B", 1), ("A", 2), ("C", 3)]),
    Ballot::new(&[("C", 1), ("A", 2), ("B", 3)]),
    Ballot::new(&[("C", 1), ("B", 2), ("A", 3)]),
];
let result = run_voting_stats(&ballots, &VoteRules::DEFAULT_RULES, &None)?;
assert_eq!(result.name_of_winner(), "A");
assert_eq!(result.how_many_rounds(), 2);
assert_eq!(result.results()[0].eliminated, Some("B".to_string()));
# Ok::<(), VotingErrors>(())
```
*/

pub mod builder;
mod config;
pub mod manual;

use log::{debug, info};

use std::{
    collections::{HashMap, HashSet},
    ops::{Add, AddAssign},
};

use crate::builder::Builder;
pub use crate::config::*;

// **** Private structures ****

type RoundId = u32;

type Rank = u32;

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
struct CandidateId(u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl std::iter::Sum for VoteCount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        VoteCount(iter.map(|vc| vc.0).sum())
    }
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

impl Add for VoteCount {
    type Output = VoteCount;
    fn add(self: VoteCount, rhs: VoteCount) -> VoteCount {
        VoteCount(self.0 + rhs.0)
    }
}

// Invariant: the ranks are a permutation of 1..=ranks.len(), listed in the
// order of the running candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
struct RankedBallot {
    ranks: Vec<(CandidateId, Rank)>,
    count: VoteCount,
}

impl RankedBallot {
    fn first_choice(&self) -> Option<CandidateId> {
        self.ranks
            .iter()
            .find(|(_, rank)| *rank == 1)
            .map(|(cid, _)| *cid)
    }

    /// Removes the candidate and shifts up every choice ranked below it.
    fn without_candidate(&self, eliminated: CandidateId) -> RankedBallot {
        let removed_rank: Option<Rank> = self
            .ranks
            .iter()
            .find(|(cid, _)| *cid == eliminated)
            .map(|(_, rank)| *rank);
        let ranks = self
            .ranks
            .iter()
            .filter(|(cid, _)| *cid != eliminated)
            .map(|(cid, rank)| match removed_rank {
                Some(e) if *rank > e => (*cid, rank - 1),
                _ => (*cid, *rank),
            })
            .collect();
        RankedBallot {
            ranks,
            count: self.count,
        }
    }

    fn has_contiguous_ranks(&self) -> bool {
        let ranks: HashSet<Rank> = self.ranks.iter().map(|(_, rank)| *rank).collect();
        ranks.len() == self.ranks.len()
            && (1..=self.ranks.len() as Rank).all(|r| ranks.contains(&r))
    }
}

// First choices in the order of the running candidates.
#[derive(Eq, PartialEq, Debug, Clone)]
struct RoundTally {
    counts: Vec<(CandidateId, VoteCount)>,
    // Never zero at construction.
    total: VoteCount,
}

impl RoundTally {
    fn percentages(&self) -> Vec<f64> {
        self.counts
            .iter()
            .map(|(_, vc)| (vc.0 as f64) / (self.total.0 as f64) * 100.0)
            .collect()
    }
}

/// The outcome of a single round. Positions refer to the running candidates.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Decision {
    Undecided,
    Winner(usize),
    Draw,
}

// Flag to indicate if a tiebreak happened.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
enum TiebreakSituation {
    Clean,           // Did not happen
    TiebreakOccured, // Happened and had to be resolved.
}

/// Runs the voting algorithm with the given rules for the given ballots.
///
/// Arguments:
/// * `coll` the ballots to process. Every ballot must rank every candidate.
/// * `rules` the rules that govern this election
/// * `candidates` the registered candidates for this election, in the order used
/// to report the results and break ties. If not provided, the candidates and
/// their order are taken from the first ballot.
pub fn run_voting_stats(
    coll: &[Ballot],
    rules: &VoteRules,
    candidates: &Option<Vec<String>>,
) -> Result<ElectionResult, VotingErrors> {
    info!(
        "Processing {:?} ballots, candidates: {:?}, rules: {:?}",
        coll.len(),
        candidates,
        rules
    );

    let cr: CheckResult = checks(coll, candidates)?;
    for (name, cid) in cr.candidates.iter() {
        info!("Candidate: {}: {}", cid.0, name);
    }

    let num_candidates = cr.candidates.len();
    // Every undecided round removes one candidate and two candidates always decide.
    let max_rounds = std::cmp::max(1, num_candidates - 1);

    // The candidates that are still running, in the order defined by input.
    let mut cur_candidates: Vec<(String, CandidateId)> = cr.candidates;
    let mut cur_ballots: Vec<RankedBallot> = cr.ballots;
    let mut round_results: Vec<RoundResult> = Vec::new();

    while round_results.len() < max_rounds {
        let round_id = (round_results.len() + 1) as RoundId;
        info!(
            "Round id: {:?} cur_candidates: {:?}",
            round_id, cur_candidates
        );

        let tally = compute_tally(&cur_ballots, &cur_candidates)?;
        debug!("Round id: {:?} tally: {:?}", round_id, tally);
        let mut round_result = round_tally_to_result(&tally, round_id, &cur_candidates);

        match check_decision(&tally) {
            Decision::Winner(idx) => {
                let (name, percentage) = round_result.tally[idx].clone();
                info!(
                    "Round id: {:?} {} is elected with {}%",
                    round_id, name, percentage
                );
                round_results.push(round_result);
                return Ok(ElectionResult {
                    round_results,
                    outcome: Outcome::Winner { name, percentage },
                });
            }
            Decision::Draw => {
                let first = cur_candidates[0].0.clone();
                let second = cur_candidates[1].0.clone();
                info!(
                    "Round id: {:?} draw between {} and {}",
                    round_id, first, second
                );
                round_results.push(round_result);
                return Ok(ElectionResult {
                    round_results,
                    outcome: Outcome::Draw(first, second),
                });
            }
            Decision::Undecided => {
                let (idx, tiebreak) = find_eliminated_candidate(
                    &tally,
                    rules.tiebreak_mode,
                    &cur_candidates,
                    round_id,
                )
                .ok_or(VotingErrors::NoConvergence)?;
                let (name, eliminated) = cur_candidates[idx].clone();
                info!(
                    "Round id: {:?} eliminating {} (tiebreak: {:?})",
                    round_id, name, tiebreak
                );
                round_result.eliminated = Some(name);
                round_results.push(round_result);

                cur_ballots = compact_ballots(&cur_ballots, eliminated);
                let survivors: Vec<(String, CandidateId)> = cur_candidates
                    .iter()
                    .filter(|(_, cid)| *cid != eliminated)
                    .cloned()
                    .collect();
                // Invariant: exactly one candidate leaves per undecided round.
                assert!(
                    survivors.len() + 1 == cur_candidates.len(),
                    "The number of candidates did not decrease by one: {:?} -> {:?}",
                    cur_candidates,
                    survivors
                );
                cur_candidates = survivors;
            }
        }
    }
    Err(VotingErrors::NoConvergence)
}

/// Runs the election with the ballots and the rules collected by the builder.
pub fn run_election(builder: &Builder) -> Result<ElectionResult, VotingErrors> {
    run_voting_stats(&builder._ballots, &builder._rules, &builder._candidates)
}

fn round_tally_to_result(
    tally: &RoundTally,
    round_id: RoundId,
    candidate_names: &[(String, CandidateId)],
) -> RoundResult {
    let percentages = tally.percentages();
    let mut res = RoundResult {
        round: round_id,
        tally: Vec::new(),
        first_choices: Vec::new(),
        eliminated: None,
    };
    for (((name, _), (_, count)), pct) in candidate_names
        .iter()
        .zip(tally.counts.iter())
        .zip(percentages.into_iter())
    {
        res.tally.push((name.clone(), pct));
        res.first_choices.push((name.clone(), count.0));
    }
    res
}

// Initialize the tally with the current candidate names to capture all the
// candidates who do not even have a vote.
fn compute_tally(
    ballots: &[RankedBallot],
    candidate_names: &[(String, CandidateId)],
) -> Result<RoundTally, VotingErrors> {
    let mut tally: HashMap<CandidateId, VoteCount> = HashMap::new();
    for (_, cid) in candidate_names.iter() {
        tally.insert(*cid, VoteCount::EMPTY);
    }
    for b in ballots.iter() {
        if let Some(vc) = b.first_choice().and_then(|cid| tally.get_mut(&cid)) {
            *vc += b.count;
        }
    }
    let total: VoteCount = tally.values().cloned().sum();
    if total == VoteCount::EMPTY {
        return Err(VotingErrors::EmptyInput);
    }
    let counts = candidate_names
        .iter()
        .map(|(_, cid)| (*cid, tally.get(cid).cloned().unwrap_or(VoteCount::EMPTY)))
        .collect();
    Ok(RoundTally { counts, total })
}

// Works on the counts: 2 * count > total is the same as a share above 50%,
// without going through floating point.
fn check_decision(tally: &RoundTally) -> Decision {
    let total = tally.total.0 as u128;
    let doubled = |vc: &VoteCount| (vc.0 as u128) * 2;

    if let Some(idx) = tally.counts.iter().position(|(_, vc)| doubled(vc) > total) {
        return Decision::Winner(idx);
    }

    let at_half = tally
        .counts
        .iter()
        .filter(|(_, vc)| doubled(vc) == total)
        .count();
    if at_half == 2 && tally.counts.len() == 2 {
        Decision::Draw
    } else {
        Decision::Undecided
    }
}

// Returns the position of the candidate to eliminate.
fn find_eliminated_candidate(
    tally: &RoundTally,
    tiebreak: TieBreakMode,
    candidate_names: &[(String, CandidateId)],
    num_round: RoundId,
) -> Option<(usize, TiebreakSituation)> {
    // Only one candidate left, it is the winner by default.
    if tally.counts.len() < 2 {
        debug!(
            "find_eliminated_candidate: no candidate to eliminate in tally: {:?}",
            tally
        );
        return None;
    }

    let min_count: VoteCount = tally.counts.iter().map(|(_, vc)| *vc).min()?;

    // Kept in candidate order.
    let all_smallest: Vec<usize> = tally
        .counts
        .iter()
        .enumerate()
        .filter_map(|(idx, (_, vc))| if *vc <= min_count { Some(idx) } else { None })
        .collect();
    debug!(
        "find_eliminated_candidate: all_smallest: {:?}",
        all_smallest
    );

    // No tiebreak, the logic below is not relevant.
    if let [idx] = all_smallest.as_slice() {
        return Some((*idx, TiebreakSituation::Clean));
    }

    let selected = match tiebreak {
        TieBreakMode::UseCandidateOrder => all_smallest.first().cloned(),
        TieBreakMode::Random(seed) => {
            let cand_with_names: Vec<(usize, String)> = all_smallest
                .iter()
                .map(|idx| (*idx, candidate_names[*idx].0.clone()))
                .collect();
            let res = candidate_permutation_crypto(&cand_with_names, seed, num_round);
            debug!(
                "find_eliminated_candidate: random tiebreak order: {:?}",
                res
            );
            res.first().cloned()
        }
    };
    selected.map(|idx| (idx, TiebreakSituation::TiebreakOccured))
}

/// Generates a "random" permutation of the candidates. Random in this context means hard to guess in advance.
/// This uses a cryptographic hash, so that the permutation only depends on the seed, the round and the names.
fn candidate_permutation_crypto(
    candidates: &[(usize, String)],
    seed: u32,
    num_round: RoundId,
) -> Vec<usize> {
    let mut data: Vec<(usize, String)> = candidates
        .iter()
        .map(|(idx, name)| {
            let key = format!("{:08}{:08}{}", seed, num_round, name);
            (*idx, sha256::digest(key.as_str()))
        })
        .collect();
    data.sort_by(|a, b| a.1.cmp(&b.1).then(a.0.cmp(&b.0)));
    data.iter().map(|p| p.0).collect()
}

fn compact_ballots(ballots: &[RankedBallot], eliminated: CandidateId) -> Vec<RankedBallot> {
    ballots
        .iter()
        .map(|b| {
            let compacted = b.without_candidate(eliminated);
            debug_assert!(
                compacted.has_contiguous_ranks(),
                "Ranks are not contiguous after compaction: {:?} -> {:?}",
                b,
                compacted
            );
            compacted
        })
        .collect()
}

struct CheckResult {
    ballots: Vec<RankedBallot>,
    candidates: Vec<(String, CandidateId)>,
}

// Candidates are returned in the same order.
fn checks(
    coll: &[Ballot],
    reg_candidates: &Option<Vec<String>>,
) -> Result<CheckResult, VotingErrors> {
    debug!("checks: coll size: {:?}", coll.len());
    let first = coll.first().ok_or(VotingErrors::EmptyInput)?;

    let requested: Vec<String> = match reg_candidates {
        Some(names) => names.clone(),
        None => first.ranks.iter().map(|(name, _)| name.clone()).collect(),
    };
    let mut ordered_candidates: Vec<(String, CandidateId)> = Vec::new();
    for name in requested {
        if !ordered_candidates.iter().any(|(n, _)| *n == name) {
            let cid = CandidateId((ordered_candidates.len() + 1) as u32);
            ordered_candidates.push((name, cid));
        }
    }
    if ordered_candidates.is_empty() {
        return Err(VotingErrors::EmptyInput);
    }
    debug!("checks: ordered_candidates {:?}", ordered_candidates);

    let candidates: HashMap<String, CandidateId> = ordered_candidates
        .iter()
        .map(|(name, cid)| (name.clone(), *cid))
        .collect();
    let num_candidates = ordered_candidates.len() as Rank;

    let mut validated: Vec<RankedBallot> = Vec::new();
    // Every tally sums a subset of these weights, so it cannot overflow once this one fits.
    let mut total_weight: u64 = 0;
    for (ballot_index, b) in coll.iter().enumerate() {
        let invalid = |issue: BallotIssue| VotingErrors::InvalidBallot {
            ballot_index,
            issue,
        };
        if b.count == 0 {
            return Err(invalid(BallotIssue::ZeroWeight));
        }
        total_weight = total_weight
            .checked_add(b.count)
            .ok_or(VotingErrors::TooManyVotes)?;

        let mut seen_cids: HashSet<CandidateId> = HashSet::new();
        let mut seen_ranks: HashSet<Rank> = HashSet::new();
        let mut ranks: Vec<(CandidateId, Rank)> = Vec::new();
        for (name, rank) in b.ranks.iter() {
            let cid = *candidates
                .get(name)
                .ok_or_else(|| invalid(BallotIssue::UnknownCandidate(name.clone())))?;
            if !seen_cids.insert(cid) {
                return Err(invalid(BallotIssue::DuplicateCandidate(name.clone())));
            }
            if *rank == 0 || *rank > num_candidates {
                return Err(invalid(BallotIssue::RankOutOfRange {
                    name: name.clone(),
                    rank: *rank,
                }));
            }
            if !seen_ranks.insert(*rank) {
                return Err(invalid(BallotIssue::DuplicateRank(*rank)));
            }
            ranks.push((cid, *rank));
        }
        if let Some((name, _)) = ordered_candidates
            .iter()
            .find(|(_, cid)| !seen_cids.contains(cid))
        {
            return Err(invalid(BallotIssue::MissingCandidate(name.clone())));
        }

        ranks.sort_by_key(|(cid, _)| *cid);
        validated.push(RankedBallot {
            ranks,
            count: VoteCount(b.count),
        });
    }

    debug!(
        "checks: validated ballots: {:?} candidates: {:?}",
        validated.len(),
        ordered_candidates.len()
    );
    Ok(CheckResult {
        ballots: validated,
        candidates: ordered_candidates,
    })
}
