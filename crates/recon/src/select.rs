use log::debug;

use crate::interact::Interactive;
use crate::model::{Identity, MatchOutcome};
use crate::roster::{Roster, Scope};

/// Look a free-text query up without asking anyone. More than one hit is
/// `Ambiguous` with the hits in roster order.
pub fn lookup_identity<'r>(query: &str, roster: &'r Roster, scope: Scope) -> MatchOutcome<&'r Identity> {
    let hits = roster.find_by_name(query, scope);
    debug!("lookup '{query}' in {scope}: {} hits", hits.len());

    match hits.len() {
        0 => MatchOutcome::NotFound,
        1 => MatchOutcome::Matched(hits[0]),
        _ => MatchOutcome::Ambiguous(hits),
    }
}

/// Resolve a free-text query to one identity, asking the operator to pick
/// when the lookup is ambiguous.
///
/// With `choice_limit` or more hits the operator is first asked whether the
/// whole list should be shown. Declining or canceling yields `Canceled`.
pub fn select_identity<'r>(
    query: &str,
    roster: &'r Roster,
    scope: Scope,
    console: &mut dyn Interactive,
    choice_limit: usize,
) -> MatchOutcome<&'r Identity> {
    match lookup_identity(query, roster, scope) {
        MatchOutcome::Ambiguous(hits) => {
            if hits.len() >= choice_limit
                && !console.ask_yes_no("There are a lot of possibilities. Show them all?")
            {
                console.warn("Canceled");
                return MatchOutcome::Canceled;
            }
            choose(&hits, console)
        }
        outcome => outcome,
    }
}

fn choose<'r>(hits: &[&'r Identity], console: &mut dyn Interactive) -> MatchOutcome<&'r Identity> {
    let options: Vec<String> = hits.iter().map(|i| describe(i)).collect();
    match console.choose_one(&format!("Found {} possible choices", hits.len()), &options) {
        Some(index) => MatchOutcome::Matched(hits[index]),
        None => {
            console.warn("Canceled");
            MatchOutcome::Canceled
        }
    }
}

fn describe(identity: &Identity) -> String {
    if identity.subject().is_empty() {
        format!("{identity} [tutorial {}]", identity.tutorial_id())
    } else {
        format!(
            "{identity}, {} [tutorial {}]",
            identity.subject(),
            identity.tutorial_id()
        )
    }
}
