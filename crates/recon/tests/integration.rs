use std::collections::HashSet;
use std::path::PathBuf;

use rostersync_recon::config::{GroupPolicy, ReconConfig};
use rostersync_recon::group::WRONG_NAMING;
use rostersync_recon::matcher::{CandidateMatcher, MatchTarget};
use rostersync_recon::model::{MatchOutcome, MatchTier, TierHit};
use rostersync_recon::report::leftover_table;
use rostersync_recon::{
    inspect_submission, normalize, pending_pools, CsvCandidates, GroupNameParser, Identity,
    ParseRoute, Roster, RosterReconciler, RosterSource, ScriptedConsole, SecondaryCandidate,
};

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn load_tutorial(file: &str) -> Vec<Identity> {
    let path = fixtures_dir().join(file);
    let data = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&data).unwrap()
}

fn fixture_roster() -> Roster {
    let mut roster = Roster::new();
    roster.add_tutorial("t1", load_tutorial("tutorial-t1.json"), true);
    roster.add_tutorial("t2", load_tutorial("tutorial-t2.json"), false);
    roster
}

fn fixture_config() -> ReconConfig {
    let toml = std::fs::read_to_string(fixtures_dir().join("settings.toml")).unwrap();
    ReconConfig::from_toml(&toml).unwrap()
}

// -------------------------------------------------------------------------
// Reconciliation
// -------------------------------------------------------------------------

#[test]
fn reconcile_fixture_export() {
    let roster = fixture_roster();
    let config = fixture_config();
    let identities = roster.unlinked();
    let path = fixtures_dir().join("lms-export.csv");
    let source = CsvCandidates::new(&path, &config.candidates.columns, &identities);

    let candidates = source.list_candidates().unwrap();
    let (unlinked, candidates) = pending_pools(&source.list_identities_missing_link(), candidates);
    let rec = RosterReconciler::new(config.matching.clone()).reconcile(unlinked, candidates);

    let links: Vec<(&str, &str, MatchTier)> = rec
        .links
        .iter()
        .map(|l| (l.identity.primary_id(), l.candidate.id.as_str(), l.tier))
        .collect();
    assert_eq!(
        links,
        vec![
            ("1", "m-101", MatchTier::ExactName),
            ("2", "m-102", MatchTier::Email),
            ("5", "m-105", MatchTier::ExactName),
            ("3", "m-103", MatchTier::FirstLast),
            ("4", "m-104", MatchTier::Complex),
        ]
    );
    assert!(rec.complex_pass);
    assert_eq!(rec.still_unlinked.len(), 1);
    assert_eq!(rec.still_unlinked[0].primary_id(), "6");
    assert_eq!(rec.leftover_candidates.len(), 1);
    assert_eq!(rec.leftover_candidates[0].id, "m-199");
    assert_eq!(rec.audit[0], "Anna Müller (1) <-> Anna Mueller (m-101)");

    let table = leftover_table(&rec.still_unlinked, &rec.leftover_candidates);
    assert_eq!(table.len(), 3);
    assert!(table[2].contains("Frank Ohnelink"));
    assert!(table[2].contains("Zoe Unknown"));
}

#[test]
fn second_run_only_sees_what_is_left() {
    let mut roster = fixture_roster();
    let config = fixture_config();
    let path = fixtures_dir().join("lms-export.csv");
    let columns = config.candidates.columns.clone();

    let identities: Vec<Identity> = roster.identities().into_iter().cloned().collect();
    let source = CsvCandidates::new(&path, &columns, &identities);
    let (unlinked, candidates) = pending_pools(&identities, source.list_candidates().unwrap());
    let rec = RosterReconciler::default().reconcile(unlinked, candidates);
    assert_eq!(roster.apply_links(&rec.links), 5);

    let identities: Vec<Identity> = roster.identities().into_iter().cloned().collect();
    let source = CsvCandidates::new(&path, &columns, &identities);
    let (unlinked, candidates) = pending_pools(&identities, source.list_candidates().unwrap());
    assert_eq!(unlinked.len(), 1);
    assert_eq!(candidates.len(), 1);

    let rec = RosterReconciler::default().reconcile(unlinked, candidates);
    assert!(rec.links.is_empty());
}

#[test]
fn reconcile_never_reuses_a_candidate() {
    let unlinked = vec![
        Identity::new("t", "1", "Anna Müller", "shared@uni.example", ""),
        Identity::new("t", "2", "Anna Mueller", "shared@uni.example", ""),
        Identity::new("t", "3", "Anna Lena Müller", "", ""),
    ];
    let candidates = vec![
        SecondaryCandidate::new("a", "Anna Müller", "shared@uni.example"),
        SecondaryCandidate::new("b", "Anna Müller", ""),
    ];
    let rec = RosterReconciler::default().reconcile(unlinked, candidates);

    let ids: HashSet<&str> = rec.links.iter().map(|l| l.candidate.id.as_str()).collect();
    assert_eq!(ids.len(), rec.links.len());
    assert_eq!(rec.links.len(), 2);
    assert_eq!(rec.links[0].candidate.id, "a");
    assert_eq!(rec.links[1].candidate.id, "b");
    assert!(rec.leftover_candidates.is_empty());
}

// -------------------------------------------------------------------------
// Matcher contract
// -------------------------------------------------------------------------

#[test]
fn every_roster_identity_finds_its_exact_copy_first() {
    let roster = fixture_roster();
    let matcher = CandidateMatcher::default();
    let pool: Vec<SecondaryCandidate> = roster
        .identities()
        .iter()
        .map(|i| SecondaryCandidate::new(i.primary_id(), i.name(), i.email()))
        .collect();

    for (index, identity) in roster.identities().into_iter().enumerate() {
        let out = matcher.find(&MatchTarget::from(identity), &pool);
        assert_eq!(
            out,
            MatchOutcome::Matched(TierHit { index, tier: MatchTier::ExactName }),
            "{identity}"
        );
    }
}

#[test]
fn exact_name_beats_earlier_email_hit() {
    let matcher = CandidateMatcher::default();
    let pool = vec![
        SecondaryCandidate::new("x", "Someone Else", "anna@uni.example"),
        SecondaryCandidate::new("y", "ANNA MÜLLER", "other@lms.example"),
    ];
    let out = matcher.find(&MatchTarget::with_email("Anna Müller", "anna@uni.example"), &pool);
    assert_eq!(out, MatchOutcome::Matched(TierHit { index: 1, tier: MatchTier::ExactName }));
}

#[test]
fn normalize_is_idempotent_on_fixtures() {
    for identity in fixture_roster().identities() {
        let once = normalize(identity.name());
        assert_eq!(normalize(&once.join(" ")), once);
    }
}

// -------------------------------------------------------------------------
// Group names
// -------------------------------------------------------------------------

#[test]
fn canonical_file_name_resolves_without_problems() {
    let mut roster = Roster::new();
    roster.add_tutorial(
        "t1",
        vec![
            Identity::new("t1", "1", "Anna Mueller", "", ""),
            Identity::new("t1", "2", "Boris Schmidt", "", ""),
        ],
        true,
    );
    let policy = GroupPolicy::default();
    let mut console = ScriptedConsole::new();

    let parsed = GroupNameParser::new(&roster, &policy).parse("Anna-Mueller_BorisSchmidt_ex01", 1, &mut console);

    assert_eq!(parsed.route, ParseRoute::Heuristic);
    assert_eq!(parsed.group.len(), 2);
    assert!(parsed.problems.is_empty(), "{:?}", parsed.problems);
    assert_eq!(parsed.label, "anna-mueller_boris-schmidt_ex01");
}

#[test]
fn unstructured_name_routes_to_manual_entry() {
    let roster = fixture_roster();
    let policy = GroupPolicy::default();
    let mut console = ScriptedConsole::new().with_answers(["Anna Müller, Emil Fischer"]);

    let parsed = GroupNameParser::new(&roster, &policy).parse("weird name no pattern_ex1", 1, &mut console);

    assert_eq!(parsed.route, ParseRoute::Manual);
    assert!(parsed.problems.iter().any(|p| p == WRONG_NAMING));
    assert_eq!(parsed.label, "anna-mueller_emil-fischer_ex01");
}

#[test]
fn missing_suffix_is_appended_with_one_problem() {
    let roster = fixture_roster();
    let policy = GroupPolicy::default();
    let mut console = ScriptedConsole::new().with_answers(["Anna Müller, Boris Schmidt"]);

    let parsed = GroupNameParser::new(&roster, &policy).parse("Mueller_Schmidt", 2, &mut console);

    let suffix_problems: Vec<&String> = parsed
        .problems
        .iter()
        .filter(|p| p.contains("_ex02") && !p.starts_with("File should"))
        .collect();
    assert_eq!(suffix_problems, vec!["Missing exercise suffix '_ex02'"]);
    assert!(parsed.label.ends_with("_ex02"));
}

#[test]
fn four_member_group_is_accepted_with_problem() {
    let roster = fixture_roster();
    let policy = GroupPolicy::default();
    let mut console = ScriptedConsole::new().with_answers(["Anna Müller, Boris Schmidt, Emil Fischer, Dora Eck"]);

    let parsed = GroupNameParser::new(&roster, &policy).parse("A_B_C_D_ex01", 1, &mut console);

    assert_eq!(parsed.group.len(), 4);
    assert!(parsed
        .problems
        .contains(&"Submission groups should consist at most of 3 members!".to_string()));
}

#[test]
fn batch_inspection_continues_past_bad_names() {
    let roster = fixture_roster();
    let policy = GroupPolicy::default();
    let parser = GroupNameParser::new(&roster, &policy);
    let mut console = ScriptedConsole::new();

    let files = [
        "garbage.rar",
        "Anna-Mueller_Boris-Schmidt_ex04.zip",
        "Emil-Fischer_Dora-Eck-ex4.zip",
    ];
    let inspected: Vec<_> = files
        .iter()
        .map(|f| inspect_submission(f, 4, &parser, &mut console))
        .collect();

    assert!(inspected[0].has_problems());
    assert!(!inspected[1].has_problems());
    assert_eq!(inspected[1].parsed.group.len(), 2);
    assert_eq!(
        inspected[2].meta.problems,
        vec!["Exercise suffix should be '_ex04', not '-ex4'"]
    );
}
