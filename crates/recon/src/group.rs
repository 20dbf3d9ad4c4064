//! Recover a student group from a human-typed submission file name.
//!
//! The convention is `<First-Last>_<First-Last>[_<First-Last>]_ex<NN>`. File
//! names that follow it are resolved against the roster without help; names
//! that do not are repaired with the operator through [`Interactive`].

use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;

use crate::config::GroupPolicy;
use crate::interact::Interactive;
use crate::model::{Identity, MatchOutcome, SubmissionGroup};
use crate::normalize::label_part;
use crate::roster::{Roster, Scope};
use crate::select::select_identity;

pub const WRONG_NAMING: &str = "Fatal: Wrong naming detected";

/// How the group was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseRoute {
    /// Split from the file name itself.
    Heuristic,
    /// Typed in by the operator because the file name was unusable.
    Manual,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParsedSubmission {
    pub group: SubmissionGroup,
    pub route: ParseRoute,
    /// Canonical `first-last_first-last_exNN` label of the resolved group.
    pub label: String,
    pub problems: Vec<String>,
}

// ---------------------------------------------------------------------------
// Suffix
// ---------------------------------------------------------------------------

fn suffix_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)[_-]ex(\d{1,2})$").expect("static regex"))
}

/// `_ex01` for exercise 1.
pub fn canonical_suffix(exercise: u32) -> String {
    format!("_ex{exercise:02}")
}

/// Split off the exercise suffix, repairing it when needed.
///
/// Returns the stem and at most one problem describing the repair.
pub fn strip_exercise_suffix(name: &str, exercise: u32) -> (String, Option<String>) {
    let canonical = canonical_suffix(exercise);
    let Some(caps) = suffix_regex().captures(name) else {
        return (
            name.to_string(),
            Some(format!("Missing exercise suffix '{canonical}'")),
        );
    };

    let whole = caps.get(0).map_or("", |m| m.as_str());
    let start = caps.get(0).map_or(name.len(), |m| m.start());
    let stem = name[..start].to_string();
    let number: Option<u32> = caps.get(1).and_then(|m| m.as_str().parse().ok());

    let problem = if number != Some(exercise) {
        Some(format!(
            "Wrong exercise number in '{whole}', expected '{canonical}'"
        ))
    } else if whole != canonical {
        Some(format!(
            "Exercise suffix should be '{canonical}', not '{whole}'"
        ))
    } else {
        None
    };

    (stem, problem)
}

// ---------------------------------------------------------------------------
// camelCase
// ---------------------------------------------------------------------------

/// Name fragments of one member token.
///
/// Each hyphen piece gets an upper-case first letter and is split into
/// fragments: an upper-case letter followed by a lower-case run, or an
/// upper-case run ending before another upper-case letter or the end. A piece
/// without any fragment is kept whole.
pub fn camel_fragments(token: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    for piece in token.split('-').filter(|p| !p.is_empty()) {
        let mut chars = piece.chars();
        let piece: Vec<char> = match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => continue,
        };

        let found = scan_fragments(&piece);
        if found.is_empty() {
            fragments.push(piece.iter().collect());
        } else {
            fragments.extend(found);
        }
    }
    fragments
}

fn scan_fragments(chars: &[char]) -> Vec<String> {
    let n = chars.len();
    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        if !chars[i].is_uppercase() {
            i += 1;
            continue;
        }

        let mut j = i + 1;
        while j < n && chars[j].is_lowercase() {
            j += 1;
        }
        if j > i + 1 {
            out.push(chars[i..j].iter().collect());
            i = j;
            continue;
        }

        let mut k = i + 1;
        while k < n && chars[k].is_uppercase() {
            k += 1;
        }
        if k == n {
            out.push(chars[i..n].iter().collect());
            i = n;
        } else if k - i >= 2 {
            // Leave the last capital for the word it starts
            out.push(chars[i..k - 1].iter().collect());
            i = k - 1;
        } else {
            i += 1;
        }
    }
    out
}

/// Name-part separators of one member token: its literal hyphens, or its
/// camelCase boundaries when it has none.
fn member_hyphens(member: &str) -> usize {
    match member.matches('-').count() {
        0 => camel_fragments(member).len().saturating_sub(1),
        n => n,
    }
}

/// Space-separated name of one member token, split the same way
/// [`member_hyphens`] counts it.
pub fn member_name(member: &str) -> String {
    if member.contains('-') {
        member
            .split('-')
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        camel_fragments(member).join(" ")
    }
}

/// Whether the stem has exactly one more name-part hyphen than member
/// underscore.
pub fn is_well_formed(stem: &str) -> bool {
    let members: Vec<&str> = stem.split('_').collect();
    let underscores = members.len() as i64 - 1;
    let hyphens: i64 = members.iter().map(|m| member_hyphens(m) as i64).sum();
    debug!("'{stem}': {hyphens} hyphens, {underscores} underscores");
    hyphens - 1 == underscores
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

enum Resolved<'r> {
    /// Found without leaving my own students.
    Own(&'r Identity),
    /// Found only after widening or asking the operator.
    Flagged(&'r Identity),
    Failed,
}

pub struct GroupNameParser<'a> {
    roster: &'a Roster,
    policy: &'a GroupPolicy,
}

impl<'a> GroupNameParser<'a> {
    pub fn new(roster: &'a Roster, policy: &'a GroupPolicy) -> Self {
        Self { roster, policy }
    }

    pub fn policy(&self) -> &GroupPolicy {
        self.policy
    }

    pub fn parse(
        &self,
        file_base_name: &str,
        exercise: u32,
        console: &mut dyn Interactive,
    ) -> ParsedSubmission {
        let mut problems = Vec::new();

        let (stem, suffix_problem) = strip_exercise_suffix(file_base_name.trim(), exercise);
        problems.extend(suffix_problem);

        let mut members: Vec<&'a Identity> = Vec::new();
        let mut flagged = false;

        let route = if is_well_formed(&stem) {
            for raw in stem.split('_') {
                let name = member_name(raw);
                match self.resolve_member(&name, console, &mut problems) {
                    Resolved::Own(identity) => self.add_member(&mut members, identity, &mut problems),
                    Resolved::Flagged(identity) => {
                        flagged = true;
                        self.add_member(&mut members, identity, &mut problems);
                    }
                    Resolved::Failed => flagged = true,
                }
            }
            ParseRoute::Heuristic
        } else {
            problems.push(WRONG_NAMING.to_string());
            console.error(&format!("{WRONG_NAMING}: '{file_base_name}'"));
            let answer = console.ask("Please enter the names of the group members, separated by commas");
            for name in answer.split(',').map(str::trim).filter(|n| !n.is_empty()) {
                if let Some(identity) = self.resolve_manually(name, Some(name), console, &mut problems) {
                    self.add_member(&mut members, identity, &mut problems);
                }
            }
            ParseRoute::Manual
        };

        if members.len() < self.policy.min_group_size {
            problems.push(format!(
                "Submission groups should consist at least of {} members!",
                self.policy.min_group_size
            ));
        }
        if members.len() > self.policy.max_group_size {
            problems.push(format!(
                "Submission groups should consist at most of {} members!",
                self.policy.max_group_size
            ));
        }

        let label = group_label(&members, exercise);
        if !members.is_empty() && (flagged || route == ParseRoute::Manual) {
            problems.push(format!(
                "File should have been named '{label}.{}'",
                self.policy.archive_extension
            ));
        }

        for problem in &problems {
            warn!("{file_base_name}: {problem}");
        }

        ParsedSubmission {
            group: SubmissionGroup {
                members: members.into_iter().cloned().collect(),
            },
            route,
            label,
            problems,
        }
    }

    fn add_member(
        &self,
        members: &mut Vec<&'a Identity>,
        identity: &'a Identity,
        problems: &mut Vec<String>,
    ) {
        if members.iter().any(|m| m.primary_id() == identity.primary_id()) {
            problems.push(format!("'{}' is named more than once", identity.name()));
        } else {
            members.push(identity);
        }
    }

    /// My students, then everyone, then the operator. A choice among my own
    /// students that the operator cancels goes straight to the operator.
    fn resolve_member(
        &self,
        name: &str,
        console: &mut dyn Interactive,
        problems: &mut Vec<String>,
    ) -> Resolved<'a> {
        let limit = self.policy.choice_limit;

        match select_identity(name, self.roster, Scope::Mine, console, limit) {
            MatchOutcome::Matched(identity) => return Resolved::Own(identity),
            MatchOutcome::Canceled => {}
            MatchOutcome::NotFound | MatchOutcome::Ambiguous(_) => {
                if let MatchOutcome::Matched(identity) =
                    select_identity(name, self.roster, Scope::All, console, limit)
                {
                    problems.push(format!(
                        "'{}' ({}) is not one of your students, consider importing",
                        identity.name(),
                        identity.primary_id()
                    ));
                    return Resolved::Flagged(identity);
                }
            }
        }

        match self.resolve_manually(name, None, console, problems) {
            Some(identity) => Resolved::Flagged(identity),
            None => Resolved::Failed,
        }
    }

    /// Retry loop against the full roster. An empty answer counts as giving
    /// up; after `manual_attempts` of those the name is recorded as failed.
    fn resolve_manually(
        &self,
        wanted: &str,
        first_query: Option<&str>,
        console: &mut dyn Interactive,
        problems: &mut Vec<String>,
    ) -> Option<&'a Identity> {
        let mut query = first_query.map(str::to_string);
        let mut empty_answers = 0;

        loop {
            let current = match query.take() {
                Some(q) => q,
                None => console.ask(&format!("Who is '{wanted}'? (empty answer to skip)")),
            };
            let current = current.trim();

            if current.is_empty() {
                empty_answers += 1;
                if empty_answers >= self.policy.manual_attempts {
                    problems.push(format!("Could not resolve student '{wanted}'"));
                    return None;
                }
                continue;
            }

            match select_identity(current, self.roster, Scope::All, console, self.policy.choice_limit) {
                MatchOutcome::Matched(identity) => {
                    console.confirm(&format!("'{wanted}' is {identity}"));
                    return Some(identity);
                }
                _ => console.warn(&format!("No student found for '{current}'")),
            }
        }
    }
}

/// Members sorted by their label part, joined by `_`, plus the suffix.
pub fn group_label(members: &[&Identity], exercise: u32) -> String {
    let mut parts: Vec<String> = members.iter().map(|m| label_part(m.name())).collect();
    parts.sort();
    parts.push(format!("ex{exercise:02}"));
    parts.join("_")
}
