use std::path::Path;

use serde::Serialize;

use crate::group::{GroupNameParser, ParsedSubmission};
use crate::interact::Interactive;
use crate::model::SubmissionMeta;

/// Everything learned about one uploaded archive.
#[derive(Debug, Clone, Serialize)]
pub struct InspectedSubmission {
    pub meta: SubmissionMeta,
    pub parsed: ParsedSubmission,
}

impl InspectedSubmission {
    pub fn has_problems(&self) -> bool {
        !self.meta.problems.is_empty()
    }
}

/// Split `file_name` into base name and extension (without the dot).
pub fn split_archive_name(file_name: &str) -> (&str, Option<&str>) {
    let path = Path::new(file_name);
    match (path.file_stem().and_then(|s| s.to_str()), path.extension().and_then(|e| e.to_str())) {
        (Some(stem), Some(ext)) => (stem, Some(ext)),
        _ => (file_name, None),
    }
}

/// Check the archive extension, recover the group and collect all problems.
pub fn inspect_submission(
    file_name: &str,
    exercise: u32,
    parser: &GroupNameParser<'_>,
    console: &mut dyn Interactive,
) -> InspectedSubmission {
    let expected_extension = parser.policy().archive_extension.as_str();
    let expected_suffix = format!(".{expected_extension}").to_ascii_lowercase();

    let mut problems = Vec::new();
    let lowered = file_name.to_ascii_lowercase();
    let base = if lowered.len() > expected_suffix.len() && lowered.ends_with(&expected_suffix) {
        &file_name[..file_name.len() - expected_suffix.len()]
    } else {
        let (base, extension) = split_archive_name(file_name);
        problems.push(match extension {
            Some(ext) => format!("Archive should be a .{expected_extension} file, not '.{ext}'"),
            None => format!("Archive should be a .{expected_extension} file, found no extension"),
        });
        base
    };

    let parsed = parser.parse(base, exercise, console);
    problems.extend(parsed.problems.iter().cloned());

    InspectedSubmission {
        meta: SubmissionMeta {
            original_name: file_name.to_string(),
            problems,
        },
        parsed,
    }
}
