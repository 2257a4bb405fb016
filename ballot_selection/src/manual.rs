/*!

This is the long-form manual for `ballot_selection` and `votebooth`.

## Poll methods

Three voting methods are supported, matching the assembly poll types:

* `votes` — the voter distributes up to `votesAmount` approvals across the
  candidates. There is no explicit "no" or "abstain" per candidate. With a
  votes amount of 1 the poll behaves like a single-choice election: picking
  another candidate deselects the previous one.
* `YN` — the voter marks every candidate with Yes or No.
* `YNA` — the voter marks every candidate with Yes, No or Abstain.

Under every method a *global vote* (for example "abstain for all") replaces
all the per-candidate marks and immediately completes the ballot.

## Completion and submission

A ballot is complete when the number of marked candidates reaches the
completion target: `votesAmount` under `votes`, the number of candidates
under `YN`/`YNA`. Completion immediately asks the voter for confirmation and
hands the ballot to the transport. A declined confirmation or a failed
submission keeps the ballot editable, so the voter can adjust a mark and
trigger the submission again.

## Session files

`votebooth` replays a recorded session from a JSON file:

```text
{
    "poll": {
        "pollId": 3,
        "method": "votes",
        "options": [1, 2, 3],
        "votesAmount": 2
    },
    "prompt": { "replies": [false, true] },
    "transport": { "failures": ["the server is unreachable"] },
    "actions": [
        { "action": "select", "option": 1, "symbol": "Y" },
        { "action": "global", "vote": "A" }
    ]
}
```

* `poll.method` is one of `votes`, `YN`, `YNA`. `votesAmount` is mandatory
  for `votes` and ignored otherwise. `alreadyVoted` (boolean, optional)
  opens the session in the terminal voted state.
* `prompt.replies` are the answers given to the confirmation prompt, in
  order. Once the list is exhausted, the prompt accepts.
* `transport.failures` are the error messages returned by the voting
  backend for the first submissions. Once the list is exhausted, the
  backend accepts.
* `actions` is the ordered list of voter actions. `select` takes `option`
  and `symbol` (`Y`, `N` or `A`), `global` takes `vote`.

The summary of the replay is printed in JSON. With `--reference`, the
summary is compared against a reference file and differences fail the run.

 */
