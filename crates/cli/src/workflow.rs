//! `rostersync parse` and `rostersync workflow prepare`.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use log::{info, warn};
use rostersync_recon::submission::split_archive_name;
use rostersync_recon::{inspect_submission, GroupNameParser, InspectedSubmission, Interactive};

use crate::console::TerminalConsole;
use crate::exit_codes::{EXIT_ERROR, EXIT_PROBLEMS, EXIT_STORE, EXIT_USAGE};
use crate::store::write_submission_meta;
use crate::{CliError, Context};

pub fn cmd_parse(ctx: &Context, file_name: &str, exercise: u32, json: bool) -> Result<(), CliError> {
    let roster = ctx.store.load_roster().map_err(CliError::store)?;
    let policy = &ctx.settings.recon.submissions;
    let parser = GroupNameParser::new(&roster, policy);
    let mut console = TerminalConsole::stdio();

    let inspected = inspect_submission(file_name, exercise, &parser, &mut console);

    if json {
        let json_str = serde_json::to_string_pretty(&inspected)
            .map_err(|e| CliError::new(EXIT_ERROR, format!("JSON serialization error: {e}")))?;
        println!("{json_str}");
    } else {
        for line in describe(&inspected) {
            println!("{line}");
        }
    }

    if inspected.has_problems() {
        return Err(CliError::new(EXIT_PROBLEMS, ""));
    }
    Ok(())
}

fn describe(inspected: &InspectedSubmission) -> Vec<String> {
    let parsed = &inspected.parsed;
    let members: Vec<String> = parsed.group.members.iter().map(|m| m.to_string()).collect();
    let mut lines = vec![
        format!("file:     {}", inspected.meta.original_name),
        format!(
            "group:    {}",
            if members.is_empty() { "-".to_string() } else { members.join(", ") }
        ),
        format!("label:    {}", parsed.label),
    ];
    if inspected.meta.problems.is_empty() {
        lines.push("problems: none".to_string());
    } else {
        lines.push("problems:".to_string());
        lines.extend(inspected.meta.problems.iter().map(|p| format!("  - {p}")));
    }
    lines
}

/// Directory name for one submission: its label, or the file's own base name
/// when no member could be resolved.
fn submission_dir_name(inspected: &InspectedSubmission) -> String {
    if inspected.parsed.group.is_empty() {
        split_archive_name(&inspected.meta.original_name).0.to_string()
    } else {
        inspected.parsed.label.clone()
    }
}

fn unique_dir_name(wanted: String, used: &mut HashSet<String>) -> String {
    if used.insert(wanted.clone()) {
        return wanted;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{wanted}-{n}");
        if used.insert(candidate.clone()) {
            warn!("{wanted} is used by an earlier file, writing to {candidate}");
            return candidate;
        }
        n += 1;
    }
}

fn list_files(dir: &Path) -> Result<Vec<String>, CliError> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CliError::new(EXIT_USAGE, format!("cannot read {}: {e}", dir.display())))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| CliError::new(EXIT_USAGE, format!("{}: {e}", dir.display())))?;
        if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!("skipping non-UTF-8 file name {:?}", raw),
        }
    }
    names.sort();
    Ok(names)
}

pub fn cmd_prepare(ctx: &Context, dir: &Path, exercise: u32, out: Option<PathBuf>) -> Result<(), CliError> {
    let files = list_files(dir)?;
    if files.is_empty() {
        return Err(CliError::args(format!("no submissions in {}", dir.display())));
    }

    let roster = ctx.store.load_roster().map_err(CliError::store)?;
    if roster.is_empty() {
        warn!("roster is empty, every member will need manual resolution");
    }
    let policy = &ctx.settings.recon.submissions;
    let parser = GroupNameParser::new(&roster, policy);
    let out = out.unwrap_or_else(|| ctx.store.exercise_dir(exercise));
    let mut console = TerminalConsole::stdio();

    let mut used = HashSet::new();
    let (mut with_problems, mut failed) = (0usize, 0usize);

    for file_name in &files {
        console.confirm(file_name);
        console.indent();
        let inspected = inspect_submission(file_name, exercise, &parser, &mut console);
        for problem in &inspected.meta.problems {
            console.warn(problem);
        }
        console.outdent();

        if inspected.has_problems() {
            with_problems += 1;
        }

        let target = out.join(unique_dir_name(submission_dir_name(&inspected), &mut used));
        match write_submission_meta(&target, &inspected.meta) {
            Ok(path) => info!("wrote {}", path.display()),
            Err(e) => {
                failed += 1;
                console.error(&format!("error: {e}"));
            }
        }
    }

    eprintln!(
        "prepare: {} submissions, {} with problems, {} failed, output in {}",
        files.len(),
        with_problems,
        failed,
        out.display()
    );

    if failed > 0 {
        return Err(CliError::new(EXIT_STORE, format!("{failed} of {} submissions could not be written", files.len())));
    }
    if with_problems > 0 {
        return Err(CliError::new(EXIT_PROBLEMS, ""));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostersync_recon::config::GroupPolicy;
    use rostersync_recon::{Identity, Roster, ScriptedConsole};

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.add_tutorial(
            "t1",
            vec![
                Identity::new("t1", "1", "Anna Mueller", "", ""),
                Identity::new("t1", "2", "Boris Schmidt", "", ""),
            ],
            true,
        );
        roster
    }

    #[test]
    fn dir_name_is_label_or_base_name() {
        let roster = roster();
        let policy = GroupPolicy::default();
        let parser = GroupNameParser::new(&roster, &policy);

        let good = inspect_submission("Anna-Mueller_Boris-Schmidt_ex01.zip", 1, &parser, &mut ScriptedConsole::new());
        assert_eq!(submission_dir_name(&good), "anna-mueller_boris-schmidt_ex01");

        let bad = inspect_submission("nobody here.zip", 1, &parser, &mut ScriptedConsole::new());
        assert!(bad.parsed.group.is_empty());
        assert_eq!(submission_dir_name(&bad), "nobody here");
    }

    #[test]
    fn describe_lists_problems() {
        let roster = roster();
        let policy = GroupPolicy::default();
        let parser = GroupNameParser::new(&roster, &policy);
        let inspected = inspect_submission("Anna-Mueller_Boris-Schmidt_ex1.zip", 1, &parser, &mut ScriptedConsole::new());

        let lines = describe(&inspected);
        assert_eq!(lines[1], "group:    Anna Mueller (1), Boris Schmidt (2)");
        assert_eq!(lines[2], "label:    anna-mueller_boris-schmidt_ex01");
        assert_eq!(lines[3], "problems:");
        assert_eq!(lines[4], "  - Exercise suffix should be '_ex01', not '_ex1'");
    }

    #[test]
    fn colliding_dir_names_get_numbered() {
        let mut used = HashSet::new();
        assert_eq!(unique_dir_name("a_ex01".into(), &mut used), "a_ex01");
        assert_eq!(unique_dir_name("a_ex01".into(), &mut used), "a_ex01-2");
        assert_eq!(unique_dir_name("a_ex01".into(), &mut used), "a_ex01-3");
    }
}
