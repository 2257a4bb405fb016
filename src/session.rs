use log::{debug, info, warn};

use ballot_selection::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::collections::VecDeque;
use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::session::config_reader::*;

#[derive(Debug, Snafu)]
pub enum SessionError {
    #[snafu(display("Error opening session file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing session file"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error writing summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

type SessionResult<T> = Result<T, SessionError>;

pub mod config_reader {
    use crate::session::*;

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PollSource {
        #[serde(rename = "pollId")]
        pub poll_id: u32,
        pub method: String,
        pub options: Vec<u32>,
        #[serde(rename = "votesAmount")]
        pub votes_amount: Option<u32>,
        #[serde(rename = "alreadyVoted")]
        pub already_voted: Option<bool>,
    }

    /// The answers given to the confirmation prompt, in order. Once the
    /// list is exhausted the prompt accepts.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct PromptScript {
        pub replies: Vec<bool>,
    }

    /// The errors returned by the voting backend for the first submissions.
    /// Once the list is exhausted the backend accepts.
    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct TransportScript {
        pub failures: Vec<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct ActionSource {
        pub action: String,
        pub option: Option<u32>,
        pub symbol: Option<String>,
        pub vote: Option<String>,
    }

    #[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
    pub struct SessionConfig {
        pub poll: PollSource,
        pub prompt: Option<PromptScript>,
        pub transport: Option<TransportScript>,
        pub actions: Vec<ActionSource>,
    }

    pub fn read_config(path: String) -> SessionResult<SessionConfig> {
        let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
        debug!("read content: {:?}", contents);
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
    }

    pub fn read_summary(path: String) -> SessionResult<JSValue> {
        let contents = fs::read_to_string(path.clone()).context(OpeningJsonSnafu { path })?;
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})
    }
}

fn validate_poll(source: &PollSource) -> SessionResult<Poll> {
    let method = match source.method.as_str() {
        "votes" => PollMethod::Votes,
        "YN" => PollMethod::YN,
        "YNA" => PollMethod::YNA,
        x => {
            whatever!("Cannot use poll method {:?} (expected votes, YN or YNA)", x)
        }
    };
    let options: Vec<OptionId> = source.options.iter().map(|i| OptionId(*i)).collect();
    match Poll::new(PollId(source.poll_id), method, options, source.votes_amount) {
        Result::Ok(poll) => Ok(poll),
        Result::Err(e) => {
            whatever!("Invalid poll definition: {}", e)
        }
    }
}

fn validate_symbol(s: &str) -> SessionResult<VoteSymbol> {
    match s {
        "Y" => Ok(VoteSymbol::Yes),
        "N" => Ok(VoteSymbol::No),
        "A" => Ok(VoteSymbol::Abstain),
        x => {
            whatever!("Cannot understand vote symbol {:?} (expected Y, N or A)", x)
        }
    }
}

fn validate_global(s: &str) -> SessionResult<GlobalVote> {
    match s {
        "Y" => Ok(GlobalVote::Yes),
        "N" => Ok(GlobalVote::No),
        "A" => Ok(GlobalVote::Abstain),
        x => {
            whatever!("Cannot understand global vote {:?} (expected Y, N or A)", x)
        }
    }
}

/// The request payload shape of the voting backend: a full 0/1 mapping over
/// all the options for an approval ballot, the explicit marks for YN/YNA and
/// the aggregate letter for a global vote.
fn ballot_to_json(options: &[OptionId], ballot: &Ballot) -> JSValue {
    match ballot {
        Ballot::Approvals(chosen) => {
            let mut votes: JSMap<String, JSValue> = JSMap::new();
            for o in options {
                let v: u32 = if chosen.contains(o) { 1 } else { 0 };
                votes.insert(o.0.to_string(), json!(v));
            }
            json!({ "votes": votes })
        }
        Ballot::Marks(marks) => {
            let mut votes: JSMap<String, JSValue> = JSMap::new();
            for (o, s) in marks.iter() {
                votes.insert(o.0.to_string(), json!(s.letter()));
            }
            json!({ "votes": votes })
        }
        Ballot::Global(g) => json!({ "global": g.letter() }),
    }
}

fn phase_label(phase: BallotPhase) -> &'static str {
    match phase {
        BallotPhase::Empty => "empty",
        BallotPhase::Partial => "partial",
        BallotPhase::Complete => "complete",
        BallotPhase::Submitted => "submitted",
    }
}

struct ScriptedPrompt {
    replies: VecDeque<bool>,
}

impl ConfirmationGate for ScriptedPrompt {
    fn confirm(&mut self, title: &str, body: &str) -> bool {
        let reply = self.replies.pop_front().unwrap_or(true);
        info!("prompt: {} / {}: replying {:?}", title, body, reply);
        reply
    }
}

struct ScriptedTransport {
    options: Vec<OptionId>,
    failures: VecDeque<String>,
    submissions: Vec<JSValue>,
}

impl VoteTransport for ScriptedTransport {
    fn submit(&mut self, ballot: &Ballot, poll: PollId) -> Result<(), SubmitError> {
        if let Some(message) = self.failures.pop_front() {
            info!("transport: rejecting vote for poll {:?}: {}", poll, message);
            return Err(SubmitError { message });
        }
        let payload = ballot_to_json(&self.options, ballot);
        info!("transport: accepted vote for poll {:?}: {}", poll, payload);
        self.submissions.push(payload);
        Ok(())
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

fn build_summary_js(
    config: &SessionConfig,
    poll: &Poll,
    session: &BallotSession,
    transport: &ScriptedTransport,
    notices: &NoticeLog,
) -> JSValue {
    json!({
        "poll": {
            "pollId": config.poll.poll_id,
            "method": config.poll.method,
            "options": config.poll.options,
            "votesAmount": poll.votes_amount(),
        },
        "results": {
            "submitted": session.has_voted(),
            "phase": phase_label(session.phase()),
            "selections": session.count_selections(),
            "ballot": ballot_to_json(poll.options(), session.ballot()),
            "submissions": transport.submissions,
            "notices": notices.notices,
        }
    })
}

pub fn run_session(
    config_path: String,
    check_summary_path: Option<String>,
    out_path: Option<String>,
) -> SessionResult<()> {
    let config = read_config(config_path)?;
    info!("config: {:?}", config);

    let poll = validate_poll(&config.poll)?;

    let mut prompt = ScriptedPrompt {
        replies: config
            .prompt
            .clone()
            .map(|p| VecDeque::from(p.replies))
            .unwrap_or_default(),
    };
    let mut transport = ScriptedTransport {
        options: poll.options().to_vec(),
        failures: config
            .transport
            .clone()
            .map(|t| VecDeque::from(t.failures))
            .unwrap_or_default(),
        submissions: Vec::new(),
    };
    let mut notices = NoticeLog::default();

    let mut session = if config.poll.already_voted.unwrap_or(false) {
        BallotSession::resume_voted(&poll)
    } else {
        BallotSession::new(&poll)
    };

    for (idx, action) in config.actions.iter().enumerate() {
        debug!("action {}: {:?}", idx, action);
        let res = match action.action.as_str() {
            "select" => {
                let option = match action.option {
                    Some(o) => OptionId(o),
                    None => {
                        whatever!("Action {} is missing the option field", idx)
                    }
                };
                let symbol = match &action.symbol {
                    Some(s) => validate_symbol(s)?,
                    None => {
                        whatever!("Action {} is missing the symbol field", idx)
                    }
                };
                session.select_option(option, symbol, &mut prompt, &mut transport, &mut notices)
            }
            "global" => {
                let vote = match &action.vote {
                    Some(s) => validate_global(s)?,
                    None => {
                        whatever!("Action {} is missing the vote field", idx)
                    }
                };
                session.select_global(vote, &mut prompt, &mut transport, &mut notices)
            }
            x => {
                whatever!("Unknown action {:?} (expected select or global)", x)
            }
        };
        if let Result::Err(e) = res {
            whatever!("Action {} was rejected: {}", idx, e)
        }
    }

    // Assemble the final json
    let summary_js = build_summary_js(&config, &poll, &session, &transport, &notices);
    let pretty_js_summary =
        serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
    println!("summary:{}", pretty_js_summary);

    if let Some(out_p) = out_path {
        fs::write(out_p.clone(), pretty_js_summary.as_str())
            .context(WritingSummarySnafu { path: out_p })?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_summary {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_summary.as_ref(),
                "\n",
            );
            whatever!("Difference detected between replayed summary and reference summary")
        }
    }

    Ok(())
}

fn run_session_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = option_env!("VOTEBOOTH_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data"));
    info!("Running test {}", test_name);
    let res = run_session(
        format!("{}/{}", test_dir, config_lpath),
        Some(format!("{}/{}", test_dir, summary_lpath)),
        None,
    );
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("Session test {} failed", test_name);
    }
}

pub fn test_wrapper(test_name: &str) {
    run_session_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
