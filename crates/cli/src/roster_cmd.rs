// `roster add` / `roster show`

use std::path::Path;

use rostersync_recon::reconcile::{link_status, LinkStatus};
use rostersync_recon::{Identity, Scope};
use serde::Deserialize;

use crate::exit_codes::EXIT_USAGE;
use crate::util::{column_width, fit};
use crate::{CliError, Context};

/// One student as exported from system A.
#[derive(Debug, Deserialize)]
struct StudentRecord {
    #[serde(alias = "primary_id")]
    id: String,
    name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    subject: String,
}

fn read_students(tutorial_id: &str, file: &Path) -> Result<Vec<Identity>, CliError> {
    let text = std::fs::read_to_string(file)
        .map_err(|e| CliError::new(EXIT_USAGE, format!("{}: {}", file.display(), e)))?;
    let records: Vec<StudentRecord> = serde_json::from_str(&text)
        .map_err(|e| CliError::new(EXIT_USAGE, format!("{}: {}", file.display(), e)))?;

    let mut seen = std::collections::HashSet::new();
    for record in &records {
        if record.id.trim().is_empty() {
            return Err(CliError::args(format!("{}: student '{}' has no id", file.display(), record.name)));
        }
        if !seen.insert(record.id.as_str()) {
            return Err(CliError::args(format!("{}: duplicate id '{}'", file.display(), record.id)));
        }
    }

    Ok(records
        .into_iter()
        .map(|r| Identity::new(tutorial_id, r.id.trim(), r.name.trim(), r.email.trim(), r.subject.trim()))
        .collect())
}

pub fn cmd_roster_add(ctx: &Context, tutorial_id: &str, file: &Path, mine: bool) -> Result<(), CliError> {
    let identities = read_students(tutorial_id, file)?;
    let mut roster = ctx.store.load_roster().map_err(CliError::store)?;

    for identity in &identities {
        if let Some(other) = roster.find_by_id(identity.primary_id()) {
            if other.tutorial_id() != tutorial_id {
                return Err(CliError::args(format!(
                    "{} is already stored in tutorial {}",
                    other,
                    other.tutorial_id()
                ))
                .with_hint("a student can only belong to one tutorial; use import/export instead"));
            }
        }
    }

    let count = identities.len();
    roster.add_tutorial(tutorial_id, identities, mine);
    ctx.store.save_roster(&roster).map_err(CliError::store)?;

    let owner = if mine { "your" } else { "another" };
    eprintln!("stored {count} students as {owner} tutorial {tutorial_id}");
    Ok(())
}

pub fn cmd_roster_show(ctx: &Context) -> Result<(), CliError> {
    let roster = ctx.store.load_roster().map_err(CliError::store)?;
    if roster.is_empty() {
        eprintln!("roster is empty");
        eprintln!("hint:  rostersync roster add <tutorial-id> <students.json> [--mine]");
        return Ok(());
    }

    for line in overview(&roster) {
        println!("{line}");
    }
    Ok(())
}

fn overview(roster: &rostersync_recon::Roster) -> Vec<String> {
    let ids: Vec<&str> = roster.tutorial_ids().collect();
    let width = column_width(ids.iter().copied(), "tutorial".len()).min(24);

    let mut lines = vec![format!("{}  {:<6}  {:>8}  {:>6}  status", fit("tutorial", width), "owner", "students", "linked")];
    for id in ids {
        let identities = roster.tutorial(id).unwrap_or_default();
        let linked = identities.iter().filter(|i| i.is_linked()).count();
        let status = match link_status(identities) {
            LinkStatus::Fresh => "not reconciled".to_string(),
            LinkStatus::Partial { unlinked } => format!("{unlinked} unlinked"),
            LinkStatus::Complete => "complete".to_string(),
        };
        let owner = if roster.is_my_tutorial(id) { "mine" } else { "other" };
        lines.push(format!(
            "{}  {:<6}  {:>8}  {:>6}  {}",
            fit(id, width),
            owner,
            identities.len(),
            linked,
            status
        ));
    }

    let mine = roster.students(Scope::Mine).len();
    let imported = roster.imported().count();
    let exported = roster.exported().count();
    lines.push(String::new());
    lines.push(format!(
        "my students: {mine} ({imported} imported, {exported} exported), total: {}",
        roster.identities().len()
    ));
    lines
}
