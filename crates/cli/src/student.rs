// `student`, `import`, `export`

use rostersync_recon::{select_identity, Identity, MatchOutcome, Roster, Scope};

use crate::console::TerminalConsole;
use crate::exit_codes::EXIT_ERROR;
use crate::{CliError, Context};

fn info_card(roster: &Roster, identity: &Identity) -> Vec<String> {
    let mut lines = vec![
        format!("name:      {}", identity.name()),
        format!("id:        {}", identity.primary_id()),
    ];
    if !identity.email().is_empty() {
        lines.push(format!("email:     {}", identity.email()));
    }
    if !identity.subject().is_empty() {
        lines.push(format!("subject:   {}", identity.subject()));
    }

    let tutorial = identity.tutorial_id();
    let ownership = match (roster.is_my_tutorial(tutorial), roster.is_mine(identity)) {
        (true, true) => "mine",
        (true, false) => "mine, exported",
        (false, true) => "other, imported",
        (false, false) => "other",
    };
    lines.push(format!("tutorial:  {tutorial} ({ownership})"));

    lines.push(match identity.secondary() {
        Some(s) if s.email.is_empty() => format!("linked:    {} ({})", s.name, s.id),
        Some(s) => format!("linked:    {} ({}) <{}>", s.name, s.id, s.email),
        None => "linked:    no".to_string(),
    });
    lines
}

/// Resolve `query` within `scope`; `Ok(None)` when the operator canceled.
fn lookup<'r>(roster: &'r Roster, query: &str, scope: Scope, choice_limit: usize) -> Result<Option<&'r Identity>, CliError> {
    let mut console = TerminalConsole::stdio();
    match select_identity(query, roster, scope, &mut console, choice_limit) {
        MatchOutcome::Matched(identity) => Ok(Some(identity)),
        MatchOutcome::Canceled => Ok(None),
        MatchOutcome::NotFound | MatchOutcome::Ambiguous(_) => Err(CliError::new(
            EXIT_ERROR,
            format!("no student matching '{query}' in scope '{scope}'"),
        )
        .with_hint(match scope {
            Scope::All => "check the spelling, or add the tutorial with `rostersync roster add`",
            _ => "try --scope all",
        })),
    }
}

pub fn cmd_student(ctx: &Context, query: &str, scope: Scope) -> Result<(), CliError> {
    let roster = ctx.store.load_roster().map_err(CliError::store)?;
    let limit = ctx.settings.recon.submissions.choice_limit;

    if let Some(identity) = lookup(&roster, query, scope, limit)? {
        for line in info_card(&roster, identity) {
            println!("{line}");
        }
    }
    Ok(())
}

pub fn cmd_import(ctx: &Context, query: &str) -> Result<(), CliError> {
    crossover(ctx, query, Scope::Others, |roster, id| roster.import(id).map(|i| i.to_string()), "imported")
}

pub fn cmd_export(ctx: &Context, query: &str) -> Result<(), CliError> {
    crossover(ctx, query, Scope::Mine, |roster, id| roster.export(id).map(|i| i.to_string()), "exported")
}

fn crossover(
    ctx: &Context,
    query: &str,
    scope: Scope,
    apply: impl FnOnce(&mut Roster, &str) -> Result<String, rostersync_recon::ReconError>,
    verb: &str,
) -> Result<(), CliError> {
    let mut roster = ctx.store.load_roster().map_err(CliError::store)?;
    let limit = ctx.settings.recon.submissions.choice_limit;

    let primary_id = match lookup(&roster, query, scope, limit)? {
        Some(identity) => identity.primary_id().to_string(),
        None => return Ok(()),
    };

    let shown = apply(&mut roster, &primary_id).map_err(CliError::recon)?;
    ctx.store.save_roster(&roster).map_err(CliError::store)?;
    eprintln!("{verb} {shown}");
    Ok(())
}
