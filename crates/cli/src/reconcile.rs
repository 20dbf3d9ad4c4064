//! `rostersync reconcile`: link stored identities to a system-B export.

use std::path::{Path, PathBuf};

use rostersync_recon::report::leftover_table;
use rostersync_recon::{pending_pools, CsvCandidates, Identity, RosterReconciler, RosterSource};

use crate::exit_codes::{EXIT_ERROR, EXIT_UNMATCHED, EXIT_USAGE};
use crate::{CliError, Context};

fn recon_err(code: u8, msg: impl Into<String>) -> CliError {
    CliError { code, message: msg.into(), hint: None }
}

pub fn cmd_reconcile(
    ctx: &Context,
    candidates_path: &Path,
    json_output: bool,
    output_file: Option<PathBuf>,
    dry_run: bool,
) -> Result<(), CliError> {
    if !candidates_path.exists() {
        return Err(recon_err(
            EXIT_USAGE,
            format!("cannot read {}: no such file", candidates_path.display()),
        ));
    }

    let mut roster = ctx.store.load_roster().map_err(CliError::store)?;
    if roster.is_empty() {
        return Err(recon_err(EXIT_USAGE, "roster is empty, nothing to reconcile")
            .with_hint("rostersync roster add <tutorial-id> <students.json> [--mine]"));
    }

    let identities: Vec<Identity> = roster.identities().into_iter().cloned().collect();
    let recon = &ctx.settings.recon;
    let source = CsvCandidates::new(candidates_path, &recon.candidates.columns, &identities);

    let candidates = source.list_candidates().map_err(CliError::recon)?;
    let (unlinked, candidates) = pending_pools(&identities, candidates);
    let result = RosterReconciler::new(recon.matching.clone()).reconcile(unlinked, candidates);

    if !json_output {
        for line in &result.audit {
            println!("{line}");
        }
        if !result.still_unlinked.is_empty() || !result.leftover_candidates.is_empty() {
            if !result.audit.is_empty() {
                println!();
            }
            for line in leftover_table(&result.still_unlinked, &result.leftover_candidates) {
                println!("{line}");
            }
        }
    }

    if !dry_run && !result.links.is_empty() {
        let updated = roster.apply_links(&result.links);
        ctx.store.save_roster(&roster).map_err(CliError::store)?;
        log::debug!("{updated} stored identities updated");
    }

    let report = result.to_result();
    if json_output || output_file.is_some() {
        let json_str = serde_json::to_string_pretty(&report)
            .map_err(|e| recon_err(EXIT_ERROR, format!("JSON serialization error: {e}")))?;

        if let Some(ref path) = output_file {
            std::fs::write(path, &json_str)
                .map_err(|e| recon_err(EXIT_ERROR, format!("cannot write output: {e}")))?;
            eprintln!("wrote {}", path.display());
        }

        if json_output {
            println!("{json_str}");
        }
    }

    // Human summary to stderr
    let s = &report.summary;
    eprintln!(
        "reconcile: {} linked ({} by complex match), {} unmatched in system A, {} unmatched in system B{}",
        s.linked,
        s.linked_by_complex,
        s.still_unlinked,
        s.leftover_candidates,
        if dry_run { " (dry run, nothing saved)" } else { "" },
    );

    if s.still_unlinked > 0 || s.leftover_candidates > 0 {
        return Err(recon_err(EXIT_UNMATCHED, ""));
    }
    Ok(())
}
