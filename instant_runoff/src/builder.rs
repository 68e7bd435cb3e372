pub use crate::config::*;

/// A builder for adding ballots.
///
/// ```
/// pub use instant_runoff::builder::Builder;
/// pub use instant_runoff::VoteRules;
/// # use instant_runoff::VotingErrors;
///
/// let mut builder = Builder::new(&VoteRules::DEFAULT_RULES)?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ranking(&["Anna".to_string(), "Bob".to_string()])?;
/// builder.add_ballot(&[("Bob".to_string(), 1), ("Anna".to_string(), 2)])?;
/// builder.add_ranking(&["Anna".to_string(), "Bob".to_string()])?;
///
/// let result = instant_runoff::run_election(&builder)?;
/// assert_eq!(result.name_of_winner(), "Anna");
///
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: VoteRules,
    pub(crate) _candidates: Option<Vec<String>>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &VoteRules) -> Result<Builder, VotingErrors> {
        Ok(Builder {
            _rules: rules.clone(),
            _candidates: None,
            _ballots: Vec::new(),
        })
    }

    /// Sets the candidates, in the order used for reporting and for breaking ties.
    ///
    /// Ballots already added are kept.
    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        if cands.is_empty() {
            return Err(VotingErrors::EmptyInput);
        }
        Ok(Builder {
            _rules: self._rules,
            _candidates: Some(cands.to_vec()),
            _ballots: self._ballots,
        })
    }

    /// Adds a ballot given as a list of candidates, most preferred first.
    pub fn add_ranking(&mut self, candidates: &[String]) -> Result<(), VotingErrors> {
        self.add_ballot_2(&Ballot::from_ranking(candidates))
    }

    /// Adds a ballot given as (candidate, rank) pairs.
    pub fn add_ballot(&mut self, ranks: &[(String, u32)]) -> Result<(), VotingErrors> {
        self.add_weighted_ballot(ranks, 1)
    }

    /// Adds a ballot cast by `count` voters.
    pub fn add_weighted_ballot(
        &mut self,
        ranks: &[(String, u32)],
        count: u64,
    ) -> Result<(), VotingErrors> {
        if count == 0 {
            return Err(VotingErrors::InvalidBallot {
                ballot_index: self._ballots.len(),
                issue: BallotIssue::ZeroWeight,
            });
        }
        self.add_ballot_2(&Ballot {
            ranks: ranks.to_vec(),
            count,
        })
    }

    pub fn add_ballot_2(&mut self, ballot: &Ballot) -> Result<(), VotingErrors> {
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn num_ballots(&self) -> usize {
        self._ballots.len()
    }
}
