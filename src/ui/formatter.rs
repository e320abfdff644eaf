//! Pure formatting functions for UI output.
//!
//! The `format_*` functions build report lines without printing so they can be
//! tested; the `display_*` functions print them.

use std::path::{Path, PathBuf};

use console::style;

use crate::boundary::BoundaryWarning;
use crate::domain::{BumpLevel, BumpPlan};
use crate::publish::{PublishReport, TagOutcome};
use crate::transaction::CommitOutcome;

/// Banner printed at the end of a dry run
pub const DRY_RUN_COMPLETE: &str = "*** Dry run complete. No changes were made. ***";

/// An error line with a red `ERROR:` prefix
pub fn format_error(message: &str) -> String {
    format!("{} {}", style("ERROR:").red(), message)
}

/// A success line with a green checkmark
pub fn format_success(message: &str) -> String {
    format!("{} {}", style("✓").green(), message)
}

/// A status line with a yellow arrow
pub fn format_status(message: &str) -> String {
    format!("{} {}", style("→").yellow(), message)
}

pub fn format_boundary_warning(warning: &BoundaryWarning) -> String {
    format!("{} {}", style("⚠ WARNING:").yellow(), warning)
}

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{}", format_error(message));
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{}", format_success(message));
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{}", format_status(message));
}

/// Display a boundary warning to the user.
///
/// Shows a yellow warning icon followed by the warning message.
///
/// # Arguments
/// * `warning` - The boundary warning to display
pub fn display_boundary_warning(warning: &BoundaryWarning) {
    eprintln!("{}", format_boundary_warning(warning));
}

/// Header line of the plan report
pub fn format_plan_header(level: BumpLevel, sources: &[PathBuf]) -> String {
    let sources: Vec<String> = sources.iter().map(|s| s.display().to_string()).collect();
    format!("Bumping version {} in {}", level, sources.join(", "))
}

/// One line of the plan report.
///
/// `(E)` marks an old version that is already tagged, `(?)` one that is not;
/// `(X)` marks a new version whose tag already exists. The tags that arrived
/// from the remote during this run are listed before the manifest directory.
///
/// # Arguments
/// * `plan` - The planned bump
/// * `root` - Directory the manifest location is shown relative to
pub fn format_plan_line(plan: &BumpPlan, root: &Path) -> String {
    let old_marker = if plan.old_tag_exists() { "(E)" } else { "(?)" };
    let new_marker = if plan.new_tag_exists() {
        "(X)"
    } else {
        "(Will create)"
    };
    let fetched = match &plan.tags().fetched {
        Some(tags) if !tags.is_empty() => {
            format!("{{{}}}", tags.iter().cloned().collect::<Vec<_>>().join(", "))
        }
        _ => "NO NEW TAGS".to_string(),
    };

    format!(
        "  {}{} -> {}{} {} : {}",
        plan.old_version(),
        old_marker,
        plan.new_version(),
        new_marker,
        fetched,
        plan.display_dir(root).display()
    )
}

/// Print the plan report: header then one line per plan
pub fn display_plan_report(level: BumpLevel, sources: &[PathBuf], plans: &[BumpPlan], root: &Path) {
    println!("{}", style(format_plan_header(level, sources)).bold());
    for plan in plans {
        println!("{}", format_plan_line(plan, root));
    }
}

pub fn display_dry_run_complete() {
    println!("{}", DRY_RUN_COMPLETE);
}

/// Display which manifests were replaced on disk and which were not.
///
/// # Arguments
/// * `outcome` - Result of the commit phase
/// * `root` - Directory paths are shown relative to
pub fn display_commit_outcome(outcome: &CommitOutcome, root: &Path) {
    for path in &outcome.committed {
        display_success(&format!("Updated {}", relative(path, root).display()));
    }
    for failure in &outcome.failed {
        display_error(&format!(
            "Failed to update {}: {}",
            relative(&failure.path, root).display(),
            failure.message
        ));
    }
    if !outcome.is_complete() {
        display_error(&format!(
            "{} of {} manifest(s) updated; the rest still hold their old version",
            outcome.committed.len(),
            outcome.committed.len() + outcome.failed.len()
        ));
    }
}

/// Display the commit, push and tag result of every published manifest.
pub fn display_publish_report(report: &PublishReport, root: &Path) {
    for entry in &report.entries {
        let repository = relative(&entry.repository, root);
        match &entry.error {
            Some(error) => display_error(&format!(
                "{}: commit/push failed: {}",
                repository.display(),
                error
            )),
            None => display_success(&format!("{}: committed and pushed", repository.display())),
        }

        let message = format!("{}: tag {} {}", repository.display(), entry.tag, entry.tag_outcome);
        match entry.tag_outcome {
            TagOutcome::Created => display_success(&message),
            TagOutcome::Failed(_) => display_error(&message),
            TagOutcome::AlreadyExists | TagOutcome::Skipped => display_status(&message),
            TagOutcome::Disabled => {}
        }
    }
}

fn relative<'a>(path: &'a Path, root: &Path) -> &'a Path {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TagSnapshot;
    use crate::manifest::Manifest;
    use std::collections::BTreeSet;

    fn plan(known: &[&str], fetched: Option<&[&str]>) -> BumpPlan {
        let manifest = Manifest::parse(
            Path::new("/work/libs/geo/pyproject.toml"),
            "[project]\nversion = \"1.2.3\"\n",
        )
        .unwrap();
        let set = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
        let tags = TagSnapshot {
            known: set(known),
            fetched: fetched.map(set),
        };
        BumpPlan::new(&manifest, BumpLevel::Minor, Some(PathBuf::from("/work")), tags).unwrap()
    }

    #[test]
    fn test_format_plan_header() {
        let sources = vec![PathBuf::from("libs/geo"), PathBuf::from("apps")];
        assert_eq!(
            format_plan_header(BumpLevel::Minor, &sources),
            "Bumping version minor in libs/geo, apps"
        );
    }

    #[test]
    fn test_format_plan_line_without_tags() {
        assert_eq!(
            format_plan_line(&plan(&[], None), Path::new("/work")),
            "  1.2.3(?) -> 1.3.0(Will create) NO NEW TAGS : libs/geo"
        );
    }

    #[test]
    fn test_format_plan_line_with_fetched_tags() {
        let line = format_plan_line(
            &plan(&["v1.2.3", "v1.3.0"], Some(&["v1.3.0"])),
            Path::new("/work"),
        );
        assert_eq!(line, "  1.2.3(E) -> 1.3.0(X) {v1.3.0} : libs/geo");
    }

    #[test]
    fn test_format_plan_line_empty_fetch() {
        let line = format_plan_line(&plan(&["v1.2.3"], Some(&[])), Path::new("/work"));
        assert_eq!(line, "  1.2.3(E) -> 1.3.0(Will create) NO NEW TAGS : libs/geo");
    }

    #[test]
    fn test_relative_paths() {
        assert_eq!(
            relative(Path::new("/work/a/pyproject.toml"), Path::new("/work")),
            Path::new("a/pyproject.toml")
        );
        assert_eq!(relative(Path::new("/work"), Path::new("/work")), Path::new("/work"));
        assert_eq!(relative(Path::new("/other"), Path::new("/work")), Path::new("/other"));
    }

    #[test]
    fn test_format_message_lines() {
        let plain = |line: String| console::strip_ansi_codes(&line).into_owned();

        assert_eq!(plain(format_error("push rejected")), "ERROR: push rejected");
        assert_eq!(plain(format_success("libs/geo: committed")), "✓ libs/geo: committed");
        assert_eq!(plain(format_status("tag v1.3.0 already exists")), "→ tag v1.3.0 already exists");
    }

    #[test]
    fn test_format_boundary_warning() {
        let warning = BoundaryWarning::FetchFailed {
            repository: PathBuf::from("/work/repo"),
            reason: "timeout".to_string(),
        };
        assert_eq!(
            console::strip_ansi_codes(&format_boundary_warning(&warning)),
            "⚠ WARNING: Error fetching remote tags for repo /work/repo: timeout"
        );
    }
}
