mod config;
pub mod manual;

use log::{debug, info};

use std::collections::{BTreeMap, BTreeSet};

pub use crate::config::*;

// **** Ballot state ****

/// The in-progress choices of one voter for one poll.
///
/// The three shapes are mutually exclusive: a ballot is either a set of
/// approvals (`Votes` method), a mapping of per-option marks (`YN`/`YNA`)
/// or a single global vote. Setting one shape clears the others.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Ballot {
    /// The approved options under the `Votes` method.
    /// Invariant: never more entries than the poll's votes amount.
    Approvals(BTreeSet<OptionId>),
    /// The explicit marks under the `YN`/`YNA` methods. Keys are present
    /// only for the options the voter has set.
    Marks(BTreeMap<OptionId, VoteSymbol>),
    /// An aggregate choice replacing all the per-option entries.
    Global(GlobalVote),
}

impl Ballot {
    /// An empty ballot in the per-option shape matching the method.
    pub fn empty(method: PollMethod) -> Ballot {
        match method {
            PollMethod::Votes => Ballot::Approvals(BTreeSet::new()),
            PollMethod::YN | PollMethod::YNA => Ballot::Marks(BTreeMap::new()),
        }
    }

    /// The number of options currently holding a mark. A global vote holds
    /// no per-option entry.
    pub fn count_selections(&self) -> usize {
        match self {
            Ballot::Approvals(chosen) => chosen.len(),
            Ballot::Marks(marks) => marks.len(),
            Ballot::Global(_) => 0,
        }
    }

    pub fn has_global_selection(&self) -> bool {
        matches!(self, Ballot::Global(_))
    }
}

/// The recomputed progress of a ballot. `Submitted` is only reachable
/// through a [`BallotSession`], never from the entry counts alone.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum BallotPhase {
    Empty,
    Partial,
    Complete,
    Submitted,
}

/// Recomputes the phase of an un-submitted ballot from its entry count.
pub fn ballot_phase(poll: &Poll, ballot: &Ballot) -> BallotPhase {
    if ballot.has_global_selection() {
        return BallotPhase::Complete;
    }
    let count = ballot.count_selections();
    if count == 0 {
        BallotPhase::Empty
    } else if count == poll.completion_target() {
        BallotPhase::Complete
    } else {
        BallotPhase::Partial
    }
}

// **** Events and effects ****

/// A discrete voter action on the ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BallotEvent {
    SelectOption { option: OptionId, symbol: VoteSymbol },
    SelectGlobal(GlobalVote),
}

/// What the caller has to do after a transition.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum BallotEffect {
    /// The ballot is complete, ask for confirmation and submit it.
    RequestSubmission,
    /// The selection would exceed the votes amount. The selections are
    /// unchanged and the voter must be told to deselect somebody first.
    LimitReached,
}

/// The outcome of applying one event: the next ballot and the effects to run.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Transition {
    pub ballot: Ballot,
    pub effects: Vec<BallotEffect>,
}

/// Applies one voter action to a ballot.
///
/// This is a pure function: the current ballot is left untouched and the
/// next ballot is returned together with the effects the caller has to run.
///
/// ```
/// use ballot_selection::*;
///
/// let poll = Poll::new(PollId(1), PollMethod::YN, vec![OptionId(1), OptionId(2)], None)?;
/// let ballot = Ballot::empty(poll.method());
/// let event = BallotEvent::SelectOption { option: OptionId(1), symbol: VoteSymbol::Yes };
/// let next = apply_event(&poll, &ballot, &event)?;
/// assert_eq!(next.ballot.count_selections(), 1);
/// assert!(next.effects.is_empty());
/// # Ok::<(), BallotErrors>(())
/// ```
pub fn apply_event(
    poll: &Poll,
    ballot: &Ballot,
    event: &BallotEvent,
) -> Result<Transition, BallotErrors> {
    debug!("apply_event: ballot: {:?} event: {:?}", ballot, event);
    match *event {
        BallotEvent::SelectGlobal(global) => {
            // A global vote replaces every per-option entry and is always a
            // complete ballot.
            Ok(Transition {
                ballot: Ballot::Global(global),
                effects: vec![BallotEffect::RequestSubmission],
            })
        }
        BallotEvent::SelectOption { option, symbol } => {
            if !poll.contains_option(option) {
                return Err(BallotErrors::UnknownOption(option));
            }
            if !Poll::offered_symbols(poll.method()).contains(&symbol) {
                return Err(BallotErrors::SymbolNotOffered(poll.method(), symbol));
            }
            // Selecting an option switches back to per-option mode first.
            let current = if ballot.has_global_selection() {
                Ballot::empty(poll.method())
            } else {
                ballot.clone()
            };
            match poll.method() {
                PollMethod::Votes => select_approval(poll, &current, option),
                PollMethod::YN | PollMethod::YNA => select_mark(poll, current, option, symbol),
            }
        }
    }
}

// Toggle rule for the Votes method. With a votes amount of one the poll has
// single-choice semantics: selecting another option deselects the previous
// one. Otherwise the option toggles independently.
fn select_approval(
    poll: &Poll,
    current: &Ballot,
    option: OptionId,
) -> Result<Transition, BallotErrors> {
    let chosen = match current {
        Ballot::Approvals(chosen) => chosen,
        _ => unreachable!("a Votes ballot always holds approvals: {:?}", current),
    };
    let votes_amount = poll.votes_amount().unwrap_or(0) as usize;

    let mut next = chosen.clone();
    if votes_amount == 1 {
        let was_chosen = next.contains(&option);
        next.clear();
        if !was_chosen {
            next.insert(option);
        }
    } else if !next.remove(&option) {
        next.insert(option);
    }

    if next.len() > votes_amount {
        debug!(
            "select_approval: {:?} would bring {} selections, limit is {}",
            option,
            next.len(),
            votes_amount
        );
        return Ok(Transition {
            ballot: current.clone(),
            effects: vec![BallotEffect::LimitReached],
        });
    }

    let mut effects = Vec::new();
    if next.len() == votes_amount {
        effects.push(BallotEffect::RequestSubmission);
    }
    Ok(Transition {
        ballot: Ballot::Approvals(next),
        effects,
    })
}

// Set, overwrite or toggle off one mark under YN/YNA. The ballot is complete
// once every option of the poll holds a mark.
fn select_mark(
    poll: &Poll,
    current: Ballot,
    option: OptionId,
    symbol: VoteSymbol,
) -> Result<Transition, BallotErrors> {
    let mut marks = match current {
        Ballot::Marks(marks) => marks,
        _ => unreachable!("a YN/YNA ballot always holds marks"),
    };
    if marks.get(&option) == Some(&symbol) {
        marks.remove(&option);
    } else {
        marks.insert(option, symbol);
    }

    let mut effects = Vec::new();
    if marks.len() == poll.options().len() {
        effects.push(BallotEffect::RequestSubmission);
    }
    Ok(Transition {
        ballot: Ballot::Marks(marks),
        effects,
    })
}

// **** Collaborators ****

/// The text of the submit confirmation prompt.
pub const CONFIRM_TITLE: &str = "Are you sure?";
pub const CONFIRM_BODY: &str = "Your decision cannot be changed afterwards";

/// The notice shown when a selection would exceed the votes amount.
pub const LIMIT_REACHED_MESSAGE: &str =
    "You reached the maximum amount of votes. Deselect somebody first";

/// Asks the voter to confirm the submission of a complete ballot.
pub trait ConfirmationGate {
    fn confirm(&mut self, title: &str, body: &str) -> bool;
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SubmitError {
    pub message: String,
}

/// Carries a confirmed ballot to the voting backend. The payload
/// serialization is owned by the implementation, not by this crate.
pub trait VoteTransport {
    fn submit(&mut self, ballot: &Ballot, poll: PollId) -> Result<(), SubmitError>;
}

/// Fire-and-forget surface for user-facing notices and failures.
pub trait ErrorSurface {
    fn report(&mut self, message: &str);
}

// **** Session driver ****

/// One voter's in-progress ballot for one poll.
///
/// The session owns the ballot, feeds voter actions through [`apply_event`]
/// and runs the resulting effects against the collaborators: the limit
/// notice goes to the error surface and a completed ballot goes through the
/// confirmation gate to the transport. A successful submission is terminal,
/// a declined or failed one leaves the ballot editable.
pub struct BallotSession<'a> {
    poll: &'a Poll,
    ballot: Ballot,
    voted: bool,
}

impl<'a> BallotSession<'a> {
    /// Opens a fresh, empty ballot for a poll the voter has not voted on.
    pub fn new(poll: &'a Poll) -> BallotSession<'a> {
        BallotSession {
            poll,
            ballot: Ballot::empty(poll.method()),
            voted: false,
        }
    }

    /// Opens the session for a poll the voter has already voted on. The
    /// session starts in the terminal state and accepts no event.
    pub fn resume_voted(poll: &'a Poll) -> BallotSession<'a> {
        BallotSession {
            poll,
            ballot: Ballot::empty(poll.method()),
            voted: true,
        }
    }

    pub fn ballot(&self) -> &Ballot {
        &self.ballot
    }

    pub fn has_voted(&self) -> bool {
        self.voted
    }

    pub fn count_selections(&self) -> usize {
        self.ballot.count_selections()
    }

    pub fn has_global_selection(&self) -> bool {
        self.ballot.has_global_selection()
    }

    pub fn phase(&self) -> BallotPhase {
        if self.voted {
            BallotPhase::Submitted
        } else {
            ballot_phase(self.poll, &self.ballot)
        }
    }

    /// Marks one option of the poll with a vote symbol.
    pub fn select_option<G, T, E>(
        &mut self,
        option: OptionId,
        symbol: VoteSymbol,
        gate: &mut G,
        transport: &mut T,
        errors: &mut E,
    ) -> Result<(), BallotErrors>
    where
        G: ConfirmationGate,
        T: VoteTransport,
        E: ErrorSurface,
    {
        self.handle(
            BallotEvent::SelectOption { option, symbol },
            gate,
            transport,
            errors,
        )
    }

    /// Replaces the whole ballot with a global vote.
    pub fn select_global<G, T, E>(
        &mut self,
        global: GlobalVote,
        gate: &mut G,
        transport: &mut T,
        errors: &mut E,
    ) -> Result<(), BallotErrors>
    where
        G: ConfirmationGate,
        T: VoteTransport,
        E: ErrorSurface,
    {
        self.handle(BallotEvent::SelectGlobal(global), gate, transport, errors)
    }

    fn handle<G, T, E>(
        &mut self,
        event: BallotEvent,
        gate: &mut G,
        transport: &mut T,
        errors: &mut E,
    ) -> Result<(), BallotErrors>
    where
        G: ConfirmationGate,
        T: VoteTransport,
        E: ErrorSurface,
    {
        if self.voted {
            return Err(BallotErrors::AlreadyVoted);
        }
        let transition = apply_event(self.poll, &self.ballot, &event)?;
        self.ballot = transition.ballot;
        for effect in transition.effects {
            match effect {
                BallotEffect::LimitReached => {
                    errors.report(LIMIT_REACHED_MESSAGE);
                }
                BallotEffect::RequestSubmission => {
                    self.request_submission(gate, transport, errors);
                }
            }
        }
        Ok(())
    }

    // Confirmation and transport. A declined confirmation is a silent no-op
    // and a transport failure keeps the ballot so that the voter can retry
    // by re-triggering a completion condition.
    fn request_submission<G, T, E>(&mut self, gate: &mut G, transport: &mut T, errors: &mut E)
    where
        G: ConfirmationGate,
        T: VoteTransport,
        E: ErrorSurface,
    {
        if !gate.confirm(CONFIRM_TITLE, CONFIRM_BODY) {
            debug!(
                "request_submission: poll {:?}: confirmation declined",
                self.poll.id()
            );
            return;
        }
        match transport.submit(&self.ballot, self.poll.id()) {
            Ok(()) => {
                info!("request_submission: poll {:?}: vote accepted", self.poll.id());
                self.voted = true;
                self.ballot = Ballot::empty(self.poll.method());
            }
            Err(e) => {
                debug!(
                    "request_submission: poll {:?}: transport failure: {}",
                    self.poll.id(),
                    e.message
                );
                errors.report(&e.message);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    struct ScriptedGate {
        replies: VecDeque<bool>,
        asked: usize,
    }

    impl ScriptedGate {
        fn accepting() -> ScriptedGate {
            ScriptedGate {
                replies: VecDeque::new(),
                asked: 0,
            }
        }

        fn with_replies(replies: &[bool]) -> ScriptedGate {
            ScriptedGate {
                replies: replies.iter().cloned().collect(),
                asked: 0,
            }
        }
    }

    impl ConfirmationGate for ScriptedGate {
        fn confirm(&mut self, _title: &str, _body: &str) -> bool {
            self.asked += 1;
            self.replies.pop_front().unwrap_or(true)
        }
    }

    struct FakeTransport {
        failures: VecDeque<String>,
        submitted: Vec<(Ballot, PollId)>,
    }

    impl FakeTransport {
        fn accepting() -> FakeTransport {
            FakeTransport {
                failures: VecDeque::new(),
                submitted: Vec::new(),
            }
        }

        fn failing_once(message: &str) -> FakeTransport {
            FakeTransport {
                failures: vec![message.to_string()].into(),
                submitted: Vec::new(),
            }
        }
    }

    impl VoteTransport for FakeTransport {
        fn submit(&mut self, ballot: &Ballot, poll: PollId) -> Result<(), SubmitError> {
            match self.failures.pop_front() {
                Some(message) => Err(SubmitError { message }),
                None => {
                    self.submitted.push((ballot.clone(), poll));
                    Ok(())
                }
            }
        }
    }

    #[derive(Default)]
    struct NoticeLog {
        notices: Vec<String>,
    }

    impl ErrorSurface for NoticeLog {
        fn report(&mut self, message: &str) {
            self.notices.push(message.to_string());
        }
    }

    fn votes_poll(num_options: u32, votes_amount: u32) -> Poll {
        let options = (1..=num_options).map(OptionId).collect();
        Poll::new(PollId(1), PollMethod::Votes, options, Some(votes_amount)).unwrap()
    }

    fn marks_poll(method: PollMethod, num_options: u32) -> Poll {
        let options = (1..=num_options).map(OptionId).collect();
        Poll::new(PollId(1), method, options, None).unwrap()
    }

    fn approvals(ids: &[u32]) -> Ballot {
        Ballot::Approvals(ids.iter().map(|i| OptionId(*i)).collect())
    }

    fn marks(entries: &[(u32, VoteSymbol)]) -> Ballot {
        Ballot::Marks(entries.iter().map(|(i, s)| (OptionId(*i), *s)).collect())
    }

    #[test]
    fn poll_validation() {
        assert_eq!(
            Poll::new(PollId(1), PollMethod::YN, vec![], None),
            Err(BallotErrors::EmptyPoll)
        );
        assert_eq!(
            Poll::new(
                PollId(1),
                PollMethod::YN,
                vec![OptionId(1), OptionId(1)],
                None
            ),
            Err(BallotErrors::DuplicateOption(OptionId(1)))
        );
        assert_eq!(
            Poll::new(PollId(1), PollMethod::Votes, vec![OptionId(1)], None),
            Err(BallotErrors::InvalidVotesAmount {
                given: None,
                num_options: 1
            })
        );
        assert_eq!(
            Poll::new(PollId(1), PollMethod::Votes, vec![OptionId(1)], Some(2)),
            Err(BallotErrors::InvalidVotesAmount {
                given: Some(2),
                num_options: 1
            })
        );
    }

    #[test]
    fn unknown_option_is_rejected() {
        let poll = marks_poll(PollMethod::YN, 2);
        let ballot = Ballot::empty(poll.method());
        let event = BallotEvent::SelectOption {
            option: OptionId(99),
            symbol: VoteSymbol::Yes,
        };
        assert_eq!(
            apply_event(&poll, &ballot, &event),
            Err(BallotErrors::UnknownOption(OptionId(99)))
        );
    }

    #[test]
    fn symbols_follow_the_method() {
        let poll = marks_poll(PollMethod::YN, 2);
        let ballot = Ballot::empty(poll.method());
        let event = BallotEvent::SelectOption {
            option: OptionId(1),
            symbol: VoteSymbol::Abstain,
        };
        assert_eq!(
            apply_event(&poll, &ballot, &event),
            Err(BallotErrors::SymbolNotOffered(
                PollMethod::YN,
                VoteSymbol::Abstain
            ))
        );

        let poll = marks_poll(PollMethod::YNA, 2);
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, marks(&[(1, VoteSymbol::Abstain)]));
    }

    #[test]
    fn votes_toggle_and_limit() {
        let poll = votes_poll(3, 2);
        let ballot = approvals(&[1, 2]);

        // A third selection is rejected and leaves the ballot untouched.
        let event = BallotEvent::SelectOption {
            option: OptionId(3),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, ballot);
        assert_eq!(next.effects, vec![BallotEffect::LimitReached]);

        // Toggling off one of the chosen options is accepted.
        let event = BallotEvent::SelectOption {
            option: OptionId(2),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, approvals(&[1]));
        assert!(next.effects.is_empty());
    }

    #[test]
    fn votes_limit_never_exceeded() {
        // Random-ish sequence of selections: the invariant holds after
        // every single event.
        let poll = votes_poll(4, 2);
        let mut ballot = Ballot::empty(poll.method());
        for option in [1u32, 2, 3, 2, 4, 1, 3, 3, 2, 4] {
            let event = BallotEvent::SelectOption {
                option: OptionId(option),
                symbol: VoteSymbol::Yes,
            };
            ballot = apply_event(&poll, &ballot, &event).unwrap().ballot;
            assert!(ballot.count_selections() <= 2, "ballot: {:?}", ballot);
        }
    }

    #[test]
    fn votes_single_choice_switches() {
        let poll = votes_poll(3, 1);
        let ballot = approvals(&[1]);

        // Selecting another option deselects the previous one.
        let event = BallotEvent::SelectOption {
            option: OptionId(2),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, approvals(&[2]));
        assert_eq!(next.effects, vec![BallotEffect::RequestSubmission]);

        // Selecting the chosen option again clears it.
        let event = BallotEvent::SelectOption {
            option: OptionId(1),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, approvals(&[]));
        assert!(next.effects.is_empty());
    }

    #[test]
    fn votes_completion_triggers_exactly_at_amount() {
        let poll = votes_poll(3, 2);
        let ballot = Ballot::empty(poll.method());
        let event = BallotEvent::SelectOption {
            option: OptionId(1),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert!(next.effects.is_empty());

        let event = BallotEvent::SelectOption {
            option: OptionId(2),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &next.ballot, &event).unwrap();
        assert_eq!(next.effects, vec![BallotEffect::RequestSubmission]);
    }

    #[test]
    fn marks_toggle_twice_removes_the_entry() {
        let poll = marks_poll(PollMethod::YNA, 3);
        let ballot = Ballot::empty(poll.method());
        let event = BallotEvent::SelectOption {
            option: OptionId(2),
            symbol: VoteSymbol::No,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, marks(&[(2, VoteSymbol::No)]));
        let next = apply_event(&poll, &next.ballot, &event).unwrap();
        assert_eq!(next.ballot, marks(&[]));
    }

    #[test]
    fn marks_overwrite_prior_symbol() {
        let poll = marks_poll(PollMethod::YN, 3);
        let ballot = marks(&[(1, VoteSymbol::Yes)]);
        let event = BallotEvent::SelectOption {
            option: OptionId(1),
            symbol: VoteSymbol::No,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, marks(&[(1, VoteSymbol::No)]));
        assert!(next.effects.is_empty());
    }

    #[test]
    fn yn_scenario_fills_and_submits() {
        // Poll with 3 options, method YN: Y/N/N.
        let poll = marks_poll(PollMethod::YN, 3);
        let mut session = BallotSession::new(&poll);
        let mut gate = ScriptedGate::accepting();
        let mut transport = FakeTransport::accepting();
        let mut notices = NoticeLog::default();

        session
            .select_option(
                OptionId(1),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        session
            .select_option(
                OptionId(2),
                VoteSymbol::No,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        // Two of three filled: no submission yet.
        assert_eq!(gate.asked, 0);
        assert_eq!(session.phase(), BallotPhase::Partial);

        session
            .select_option(
                OptionId(3),
                VoteSymbol::No,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        assert_eq!(gate.asked, 1);
        assert_eq!(
            transport.submitted,
            vec![(
                marks(&[
                    (1, VoteSymbol::Yes),
                    (2, VoteSymbol::No),
                    (3, VoteSymbol::No)
                ]),
                PollId(1)
            )]
        );
        assert!(session.has_voted());
        assert_eq!(session.phase(), BallotPhase::Submitted);
        assert_eq!(session.count_selections(), 0);
        assert!(notices.notices.is_empty());
    }

    #[test]
    fn global_vote_clears_everything_and_submits() {
        let poll = marks_poll(PollMethod::YNA, 3);
        let ballot = marks(&[(1, VoteSymbol::Yes)]);
        let event = BallotEvent::SelectGlobal(GlobalVote::Abstain);
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, Ballot::Global(GlobalVote::Abstain));
        assert_eq!(next.ballot.count_selections(), 0);
        assert!(next.ballot.has_global_selection());
        assert_eq!(next.effects, vec![BallotEffect::RequestSubmission]);
    }

    #[test]
    fn selecting_after_global_returns_to_per_option() {
        let poll = votes_poll(3, 2);
        let ballot = Ballot::Global(GlobalVote::No);
        let event = BallotEvent::SelectOption {
            option: OptionId(1),
            symbol: VoteSymbol::Yes,
        };
        let next = apply_event(&poll, &ballot, &event).unwrap();
        assert_eq!(next.ballot, approvals(&[1]));
        assert!(!next.ballot.has_global_selection());
    }

    #[test]
    fn declined_confirmation_keeps_the_ballot_editable() {
        let poll = votes_poll(3, 1);
        let mut session = BallotSession::new(&poll);
        let mut gate = ScriptedGate::with_replies(&[false]);
        let mut transport = FakeTransport::accepting();
        let mut notices = NoticeLog::default();

        session
            .select_option(
                OptionId(1),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        assert_eq!(gate.asked, 1);
        assert!(transport.submitted.is_empty());
        assert!(!session.has_voted());
        // Logically complete but un-submitted: still editable.
        assert_eq!(session.phase(), BallotPhase::Complete);
        assert!(notices.notices.is_empty());

        // Switching to another option re-triggers the submission.
        session
            .select_option(
                OptionId(2),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        assert_eq!(transport.submitted, vec![(approvals(&[2]), PollId(1))]);
        assert!(session.has_voted());
    }

    #[test]
    fn transport_failure_is_reported_and_retried() {
        let poll = marks_poll(PollMethod::YN, 1);
        let mut session = BallotSession::new(&poll);
        let mut gate = ScriptedGate::accepting();
        let mut transport = FakeTransport::failing_once("the server is unreachable");
        let mut notices = NoticeLog::default();

        session
            .select_option(
                OptionId(1),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        assert_eq!(notices.notices, vec!["the server is unreachable".to_string()]);
        assert!(!session.has_voted());
        assert_eq!(session.ballot(), &marks(&[(1, VoteSymbol::Yes)]));

        // Toggle off and on again to re-trigger the completion condition.
        session
            .select_option(
                OptionId(1),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        session
            .select_option(
                OptionId(1),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        assert!(session.has_voted());
        assert_eq!(
            transport.submitted,
            vec![(marks(&[(1, VoteSymbol::Yes)]), PollId(1))]
        );
    }

    #[test]
    fn limit_notice_goes_to_the_error_surface() {
        let poll = votes_poll(3, 2);
        let mut session = BallotSession::new(&poll);
        // Decline the completion prompt so that the session stays editable.
        let mut gate = ScriptedGate::with_replies(&[false]);
        let mut transport = FakeTransport::accepting();
        let mut notices = NoticeLog::default();

        for option in [1u32, 2, 3] {
            session
                .select_option(
                    OptionId(option),
                    VoteSymbol::Yes,
                    &mut gate,
                    &mut transport,
                    &mut notices,
                )
                .unwrap();
        }
        assert_eq!(notices.notices, vec![LIMIT_REACHED_MESSAGE.to_string()]);
        assert_eq!(session.count_selections(), 2);
    }

    #[test]
    fn submitted_is_terminal() {
        let poll = votes_poll(2, 1);
        let mut session = BallotSession::new(&poll);
        let mut gate = ScriptedGate::accepting();
        let mut transport = FakeTransport::accepting();
        let mut notices = NoticeLog::default();

        session
            .select_option(
                OptionId(1),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            )
            .unwrap();
        assert!(session.has_voted());
        assert_eq!(
            session.select_option(
                OptionId(2),
                VoteSymbol::Yes,
                &mut gate,
                &mut transport,
                &mut notices,
            ),
            Err(BallotErrors::AlreadyVoted)
        );

        let resumed = BallotSession::resume_voted(&poll);
        assert_eq!(resumed.phase(), BallotPhase::Submitted);
    }

    #[test]
    fn counting_is_idempotent() {
        let ballot = marks(&[(1, VoteSymbol::Yes), (2, VoteSymbol::No)]);
        assert_eq!(ballot.count_selections(), ballot.count_selections());
        assert_eq!(ballot.count_selections(), 2);
    }

    #[test]
    fn phases_are_recomputed_from_counts() {
        let poll = marks_poll(PollMethod::YN, 2);
        assert_eq!(
            ballot_phase(&poll, &Ballot::empty(poll.method())),
            BallotPhase::Empty
        );
        assert_eq!(
            ballot_phase(&poll, &marks(&[(1, VoteSymbol::Yes)])),
            BallotPhase::Partial
        );
        assert_eq!(
            ballot_phase(
                &poll,
                &marks(&[(1, VoteSymbol::Yes), (2, VoteSymbol::No)])
            ),
            BallotPhase::Complete
        );
        assert_eq!(
            ballot_phase(&poll, &Ballot::Global(GlobalVote::Yes)),
            BallotPhase::Complete
        );
    }
}
