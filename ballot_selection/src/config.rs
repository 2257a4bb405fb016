// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// How the voters of a poll express their choices.
///
/// The method decides which vote symbols are offered for each candidate and
/// when a ballot is considered filled out.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum PollMethod {
    /// The voter distributes a fixed amount of approvals across the
    /// candidates. There is no explicit "no" or "abstain".
    Votes,
    /// The voter marks every candidate with yes or no.
    YN,
    /// The voter marks every candidate with yes, no or abstain.
    YNA,
}

/// A single mark on one candidate.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum VoteSymbol {
    Yes,
    No,
    Abstain,
}

impl VoteSymbol {
    /// The single-letter form used on the wire and in messages.
    pub fn letter(&self) -> &'static str {
        match self {
            VoteSymbol::Yes => "Y",
            VoteSymbol::No => "N",
            VoteSymbol::Abstain => "A",
        }
    }
}

/// An aggregate choice that replaces all the per-candidate marks,
/// for example "abstain for all candidates".
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum GlobalVote {
    Yes,
    No,
    Abstain,
}

impl GlobalVote {
    pub fn letter(&self) -> &'static str {
        match self {
            GlobalVote::Yes => "Y",
            GlobalVote::No => "N",
            GlobalVote::Abstain => "A",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct OptionId(pub u32);

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub struct PollId(pub u32);

/// The description of one poll: the voting method and the fixed, ordered
/// collection of candidate options.
///
/// A poll is immutable for the whole duration of a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Poll {
    id: PollId,
    method: PollMethod,
    options: Vec<OptionId>,
    votes_amount: Option<u32>,
}

impl Poll {
    /// Validates and builds a poll.
    ///
    /// `votes_amount` is the maximum number of simultaneous approvals and is
    /// mandatory for the `Votes` method (between 1 and the number of
    /// options). It is ignored for the other methods.
    pub fn new(
        id: PollId,
        method: PollMethod,
        options: Vec<OptionId>,
        votes_amount: Option<u32>,
    ) -> Result<Poll, BallotErrors> {
        if options.is_empty() {
            return Err(BallotErrors::EmptyPoll);
        }
        for (idx, o) in options.iter().enumerate() {
            if options[..idx].contains(o) {
                return Err(BallotErrors::DuplicateOption(*o));
            }
        }
        let votes_amount = match method {
            PollMethod::Votes => match votes_amount {
                Some(n) if n >= 1 && (n as usize) <= options.len() => Some(n),
                given => {
                    return Err(BallotErrors::InvalidVotesAmount {
                        given,
                        num_options: options.len(),
                    });
                }
            },
            _ => None,
        };
        Ok(Poll {
            id,
            method,
            options,
            votes_amount,
        })
    }

    pub fn id(&self) -> PollId {
        self.id
    }

    pub fn method(&self) -> PollMethod {
        self.method
    }

    /// The candidate options, in poll order.
    pub fn options(&self) -> &[OptionId] {
        &self.options
    }

    /// The maximum amount of simultaneous approvals (`Votes` method only).
    pub fn votes_amount(&self) -> Option<u32> {
        self.votes_amount
    }

    pub fn contains_option(&self, option: OptionId) -> bool {
        self.options.contains(&option)
    }

    /// The number of marked options that makes a ballot complete.
    pub fn completion_target(&self) -> usize {
        match self.method {
            PollMethod::Votes => self.votes_amount.unwrap_or(0) as usize,
            PollMethod::YN | PollMethod::YNA => self.options.len(),
        }
    }

    /// The vote symbols offered to the voter under the given method.
    ///
    /// `Votes` only offers an approval, `YN` adds the explicit no and `YNA`
    /// adds the abstention.
    pub fn offered_symbols(method: PollMethod) -> &'static [VoteSymbol] {
        match method {
            PollMethod::Votes => &[VoteSymbol::Yes],
            PollMethod::YN => &[VoteSymbol::Yes, VoteSymbol::No],
            PollMethod::YNA => &[VoteSymbol::Yes, VoteSymbol::No, VoteSymbol::Abstain],
        }
    }
}

// ******** Errors *********

/// Errors raised when a poll definition or a selection event violates a
/// precondition. Reaching the approval limit is not an error, see
/// `BallotEffect::LimitReached`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotErrors {
    EmptyPoll,
    DuplicateOption(OptionId),
    InvalidVotesAmount {
        given: Option<u32>,
        num_options: usize,
    },
    /// The option is not part of the poll.
    UnknownOption(OptionId),
    /// The symbol is not offered under the poll's method.
    SymbolNotOffered(PollMethod, VoteSymbol),
    /// The ballot has already been submitted, no further event is accepted.
    AlreadyVoted,
}

impl Error for BallotErrors {}

impl Display for BallotErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotErrors::EmptyPoll => write!(f, "the poll has no options"),
            BallotErrors::DuplicateOption(o) => {
                write!(f, "the option {} appears twice in the poll", o.0)
            }
            BallotErrors::InvalidVotesAmount { given, num_options } => write!(
                f,
                "invalid votes amount {:?} for a poll with {} options",
                given, num_options
            ),
            BallotErrors::UnknownOption(o) => {
                write!(f, "the option {} is not part of the poll", o.0)
            }
            BallotErrors::SymbolNotOffered(m, s) => {
                write!(f, "the symbol {} is not offered under {:?}", s.letter(), m)
            }
            BallotErrors::AlreadyVoted => write!(f, "the ballot has already been submitted"),
        }
    }
}
