use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use glob::glob;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{Recommendation, Urgency};
use crate::execution::InstallOutcome;
use crate::sudoers::audit::{EntryOutcome, MemberOutcome};
use crate::sudoers::{CommitStatus, SudoersRunReport};
use crate::utils::backup_glob;
use crate::utils::logging::{color_enabled, console_line};

fn colored(text: impl ToString, color: Color) -> Cell {
    let cell = Cell::new(text.to_string());
    if color_enabled() {
        cell.fg(color).add_attribute(Attribute::Bold)
    } else {
        cell
    }
}

fn entry_outcome_cell(outcome: EntryOutcome) -> Cell {
    match outcome {
        EntryOutcome::Kept => colored("kept", Color::Green),
        EntryOutcome::Removed => colored("removed", Color::Yellow),
        EntryOutcome::FlaggedManual => colored("manual review", Color::Red),
    }
}

fn member_outcome_cell(outcome: MemberOutcome) -> Cell {
    match outcome {
        MemberOutcome::Kept => colored("kept", Color::Green),
        MemberOutcome::Removed => colored("removed", Color::Yellow),
        MemberOutcome::FlaggedManual => colored("manual review", Color::Red),
    }
}

fn truncate_for_table(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    let mut cut: String = value.chars().take(max.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

pub fn entries_table(report: &SudoersRunReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["#", "Name", "Kind", "Privileges", "Protected", "Outcome"]);

    for (idx, row) in report.audit.entries.iter().enumerate() {
        table.add_row(vec![
            Cell::new(idx + 1),
            Cell::new(&row.entry.name),
            Cell::new(row.entry.kind),
            Cell::new(truncate_for_table(&row.entry.privileges, 60)),
            Cell::new(if row.protected { "yes" } else { "no" }),
            entry_outcome_cell(row.outcome),
        ]);
    }
    table
}

pub fn members_table(report: &SudoersRunReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Group", "Member", "Outcome"]);
    for member in &report.audit.members {
        table.add_row(vec![
            Cell::new(&member.group),
            Cell::new(&member.user),
            member_outcome_cell(member.outcome),
        ]);
    }
    table
}

fn commit_summary(report: &SudoersRunReport) -> String {
    match &report.commit {
        CommitStatus::NotNeeded => format!("{} unchanged", report.file),
        CommitStatus::Attempted(InstallOutcome::Installed) => format!(
            "{} rewritten, {} rule(s) removed",
            report.file,
            report.audit.removed().count()
        ),
        CommitStatus::Attempted(InstallOutcome::Rejected(_)) => {
            format!("{} unchanged, edited copy failed validation", report.file)
        }
        CommitStatus::Attempted(_) => format!("{} unchanged, write failed", report.file),
    }
}

pub fn print_sudoers_summary(report: &SudoersRunReport) {
    println!();
    if report.audit.entries.is_empty() {
        println!("No user or group rules found in {}", report.file);
    } else {
        println!("{}", entries_table(report));
    }

    if !report.audit.members.is_empty() {
        println!("\nSudoer group members:");
        println!("{}", members_table(report));
    }

    for dir in &report.include_directives {
        println!("Rules in {} were not audited", dir);
    }
    println!("{}", commit_summary(report));
    if report.backup.created {
        println!("Backup: {}", report.backup.path.display());
    }
}

pub fn print_recommendations(recommendations: &[Recommendation]) {
    if recommendations.is_empty() {
        return;
    }

    console_line("\nRecommendations:");
    for rec in recommendations {
        let marker = match rec.urgency {
            Urgency::Dangerous if color_enabled() => "\x1b[1;31m!\x1b[0m",
            Urgency::Dangerous => "!",
            Urgency::Advisory => "•",
        };
        console_line(&format!("  {} {}", marker, rec));
    }
}

/// Existing backups of `file`, oldest first
pub fn find_backups(file: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = match glob(&backup_glob(file)) {
        Ok(entries) => entries.flatten().filter(|p| p.is_file()).collect(),
        Err(e) => {
            log::warn!("bad backup pattern for {}: {}", file.display(), e);
            Vec::new()
        }
    };
    found.sort();
    found
}

pub fn backups_table(backups: &[PathBuf]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Backup", "Size", "Modified"]);

    for path in backups {
        let (size, modified) = match fs::metadata(path) {
            Ok(meta) => (
                format!("{} B", meta.len()),
                meta.modified()
                    .map(|t| {
                        chrono::DateTime::<chrono::Local>::from(t)
                            .format("%Y-%m-%d %H:%M:%S")
                            .to_string()
                    })
                    .unwrap_or_else(|_| "-".to_string()),
            ),
            Err(_) => ("-".to_string(), "-".to_string()),
        };
        table.add_row(vec![
            Cell::new(path.display()).fg(Color::Cyan),
            Cell::new(size),
            Cell::new(modified),
        ]);
    }
    table
}
