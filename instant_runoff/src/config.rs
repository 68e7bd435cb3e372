// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// One voter's complete ranking.
///
/// The ranks are stored as `(candidate name, rank)` pairs, rank 1 being the
/// most preferred candidate. The order of the pairs in the first ballot of an
/// election defines the candidate order, unless an explicit list of candidates
/// is provided.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Ballot {
    pub ranks: Vec<(String, u32)>,
    /// The number of voters who cast this exact ballot.
    pub count: u64,
}

impl Ballot {
    pub fn new(ranks: &[(&str, u32)]) -> Ballot {
        Ballot {
            ranks: ranks
                .iter()
                .map(|(name, rank)| (name.to_string(), *rank))
                .collect(),
            count: 1,
        }
    }

    /// Builds a ballot from a list of candidates, in order of preference.
    pub fn from_ranking(names: &[String]) -> Ballot {
        Ballot {
            ranks: names
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), (idx + 1) as u32))
                .collect(),
            count: 1,
        }
    }
}

// ******** Output data structures *********

/// Statistics for one round
#[derive(PartialEq, Debug, Clone)]
pub struct RoundResult {
    pub round: u32,
    /// Share of the first choices (0 to 100) for every candidate still running,
    /// in candidate order.
    pub tally: Vec<(String, f64)>,
    /// Raw first choices, in candidate order.
    pub first_choices: Vec<(String, u64)>,
    /// The candidate removed at the end of this round. Empty for the last round.
    pub eliminated: Option<String>,
}

impl RoundResult {
    pub fn percentage(&self, name: &str) -> Option<f64> {
        self.tally
            .iter()
            .find(|(cname, _)| cname == name)
            .map(|(_, pct)| *pct)
    }

    pub fn candidates(&self) -> Vec<String> {
        self.tally.iter().map(|(name, _)| name.clone()).collect()
    }
}

/// How the election was decided.
#[derive(PartialEq, Debug, Clone)]
pub enum Outcome {
    Winner { name: String, percentage: f64 },
    /// The two candidates sharing the vote in the last round.
    Draw(String, String),
}

/// The sentinel used in place of a winner name or percentage for draws.
pub const DRAW: &str = "DRAW";

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum WinningPercentage {
    Percentage(f64),
    Draw,
}

impl Display for WinningPercentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WinningPercentage::Percentage(pct) => write!(f, "{}", pct),
            WinningPercentage::Draw => write!(f, "{}", DRAW),
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct ElectionResult {
    pub round_results: Vec<RoundResult>,
    pub outcome: Outcome,
}

impl ElectionResult {
    pub fn results(&self) -> &[RoundResult] {
        &self.round_results
    }

    /// The name of the winner, or `"DRAW"`.
    pub fn name_of_winner(&self) -> &str {
        match &self.outcome {
            Outcome::Winner { name, .. } => name.as_str(),
            Outcome::Draw(_, _) => DRAW,
        }
    }

    /// The share of the vote of the winner in the last round.
    pub fn percentage_of_winner(&self) -> WinningPercentage {
        match &self.outcome {
            Outcome::Winner { percentage, .. } => WinningPercentage::Percentage(*percentage),
            Outcome::Draw(_, _) => WinningPercentage::Draw,
        }
    }

    pub fn how_many_rounds(&self) -> usize {
        self.round_results.len()
    }

    /// A one-line description of the outcome.
    ///
    /// Percentages are rounded to two decimals.
    pub fn summary(&self) -> String {
        match &self.outcome {
            Outcome::Draw(first, second) => {
                format!("The election ended in a draw between {} and {}", first, second)
            }
            Outcome::Winner { name, percentage } => {
                let rounds = self.how_many_rounds();
                let round_or_rounds = if rounds == 1 { "round" } else { "rounds" };
                format!(
                    "{} won with {}% of the vote after {} {}",
                    name,
                    round_two_decimals(*percentage),
                    rounds,
                    round_or_rounds
                )
            }
        }
    }
}

/// Rounds to two decimals, without trailing zeros in the display.
pub fn round_two_decimals(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// The reasons for rejecting a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotIssue {
    /// The ballot ranks a candidate that is not running.
    UnknownCandidate(String),
    /// The ballot does not rank a candidate that is running.
    MissingCandidate(String),
    DuplicateCandidate(String),
    /// The rank is not between 1 and the number of candidates.
    RankOutOfRange { name: String, rank: u32 },
    DuplicateRank(u32),
    ZeroWeight,
}

impl Display for BallotIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotIssue::UnknownCandidate(name) => write!(f, "unknown candidate {:?}", name),
            BallotIssue::MissingCandidate(name) => write!(f, "candidate {:?} is not ranked", name),
            BallotIssue::DuplicateCandidate(name) => {
                write!(f, "candidate {:?} is ranked more than once", name)
            }
            BallotIssue::RankOutOfRange { name, rank } => {
                write!(f, "rank {} for candidate {:?} is out of range", rank, name)
            }
            BallotIssue::DuplicateRank(rank) => write!(f, "rank {} is used more than once", rank),
            BallotIssue::ZeroWeight => write!(f, "the ballot has a count of zero"),
        }
    }
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum VotingErrors {
    /// No ballots, or no candidates.
    EmptyInput,
    InvalidBallot {
        ballot_index: usize,
        issue: BallotIssue,
    },
    /// The total weight of the ballots does not fit in a `u64`.
    TooManyVotes,
    NoConvergence,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyInput => write!(f, "no ballots or no candidates to tabulate"),
            VotingErrors::InvalidBallot {
                ballot_index,
                issue,
            } => write!(f, "invalid ballot #{}: {}", ballot_index, issue),
            VotingErrors::TooManyVotes => {
                write!(f, "the total weight of the ballots is too large")
            }
            VotingErrors::NoConvergence => {
                write!(f, "the tabulation did not converge to a decision")
            }
        }
    }
}

// ********* Configuration **********

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum TieBreakMode {
    /// Among the candidates tied for the fewest votes, eliminate the one that
    /// comes first in the candidate order.
    UseCandidateOrder,
    /// Order the tied candidates with a hash of the seed, the round and the
    /// candidate name. The outcome is reproducible for a given seed.
    Random(u32),
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRules {
    pub tiebreak_mode: TieBreakMode,
}

impl VoteRules {
    pub const DEFAULT_RULES: VoteRules = VoteRules {
        tiebreak_mode: TieBreakMode::UseCandidateOrder,
    };
}

impl Default for VoteRules {
    fn default() -> Self {
        VoteRules::DEFAULT_RULES
    }
}
