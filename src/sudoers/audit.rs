//! Interactive review of every rule in the privilege table.
//!
//! Each entry ends in one of three states: kept, removed from the working
//! copy, or flagged for the operator to fix by hand. Protected identities
//! (root, sudo, wheel, admin by default) and the operator's own group
//! membership are never changed automatically.

use serde::Serialize;

use crate::core::{GuardResult, Recommendation};
use crate::execution::CommandRunner;
use crate::prompt::Prompter;
use crate::sudoers::entry::PrivilegeEntry;
use crate::sudoers::groups;
use crate::sudoers::table::PrivilegeTable;
use crate::utils::logging::console_line;
use crate::utils::{log_message, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryOutcome {
    Kept,
    Removed,
    FlaggedManual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryReport {
    #[serde(flatten)]
    pub entry: PrivilegeEntry,
    pub protected: bool,
    pub outcome: EntryOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberOutcome {
    Kept,
    Removed,
    FlaggedManual,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberReport {
    pub group: String,
    pub user: String,
    pub outcome: MemberOutcome,
}

/// Everything decided during one audit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuditReport {
    pub entries: Vec<EntryReport>,
    pub members: Vec<MemberReport>,
    pub recommendations: Vec<Recommendation>,
}

impl AuditReport {
    pub fn removed(&self) -> impl Iterator<Item = &EntryReport> {
        self.entries
            .iter()
            .filter(|r| r.outcome == EntryOutcome::Removed)
    }
}

/// State for a single audit run. Built fresh for every run.
pub struct AuditSession<'a> {
    operator: String,
    protected_names: &'a [String],
    runner: &'a mut dyn CommandRunner,
    prompter: &'a mut dyn Prompter,
    report: AuditReport,
}

impl<'a> AuditSession<'a> {
    pub fn new(
        operator: &str,
        protected_names: &'a [String],
        runner: &'a mut dyn CommandRunner,
        prompter: &'a mut dyn Prompter,
    ) -> Self {
        Self {
            operator: operator.to_string(),
            protected_names,
            runner,
            prompter,
            report: AuditReport::default(),
        }
    }

    /// Walk every entry in file order. Only the working copy in `table` is changed.
    pub fn run(mut self, table: &mut PrivilegeTable) -> GuardResult<AuditReport> {
        let entries = table.entries().to_vec();
        for entry in &entries {
            console_line("");
            let (protected, outcome) = self.audit_entry(entry, table)?;
            self.report.entries.push(EntryReport {
                entry: entry.clone(),
                protected,
                outcome,
            });
        }
        Ok(self.report)
    }

    fn is_protected(&self, name: &str) -> bool {
        self.protected_names.iter().any(|p| p == name)
    }

    fn audit_entry(
        &mut self,
        entry: &PrivilegeEntry,
        table: &mut PrivilegeTable,
    ) -> GuardResult<(bool, EntryOutcome)> {
        let protected = self.is_protected(&entry.name);
        if protected {
            log_message(
                LogLevel::Warning,
                &format!(
                    "Please note that '{}' is a default {} in some distros!",
                    entry.name, entry.kind
                ),
            );
        }

        let question = format!(
            "Should '{}' {} have '{}' privileges?",
            entry.name, entry.kind, entry.privileges
        );
        if self.prompter.confirm(&question, Some(true))? {
            if entry.is_group() {
                self.audit_group(entry)?;
            }
            return Ok((protected, EntryOutcome::Kept));
        }

        if protected {
            log_message(
                LogLevel::Warning,
                &format!(
                    "Since '{}' is a default {} please manually correct its permissions",
                    entry.name, entry.kind
                ),
            );
            self.flag_entry(entry);
            return Ok((protected, EntryOutcome::FlaggedManual));
        }

        let question = format!(
            "Would you like to remove sudo privileges from the '{}' {}?",
            entry.name, entry.kind
        );
        if !self.prompter.confirm(&question, Some(false))? {
            log_message(
                LogLevel::Info,
                &format!("Please manually correct {}'s permissions", entry.name),
            );
            self.flag_entry(entry);
            return Ok((protected, EntryOutcome::FlaggedManual));
        }

        if table.remove_entry(entry) {
            log::info!(target: "sudoers", "staged removal of '{}'", entry);
            log_message(
                LogLevel::Info,
                &format!("Removed '{}' from the working copy", entry.name),
            );
            Ok((protected, EntryOutcome::Removed))
        } else {
            log_message(
                LogLevel::Error,
                &format!("Could not locate the line for '{}' in the table", entry.name),
            );
            self.flag_entry(entry);
            Ok((protected, EntryOutcome::FlaggedManual))
        }
    }

    fn flag_entry(&mut self, entry: &PrivilegeEntry) {
        self.recommend(Recommendation::advisory(format!(
            "Correct sudoer privileges: {}",
            entry
        )));
    }

    fn recommend(&mut self, recommendation: Recommendation) {
        log::info!(target: "sudoers", "recommendation: {}", recommendation);
        self.report.recommendations.push(recommendation);
    }

    /// Review the members of a group that keeps its privileges
    fn audit_group(&mut self, group: &PrivilegeEntry) -> GuardResult<()> {
        let membership = match groups::lookup(self.runner, &group.name) {
            Ok(Some(membership)) => membership,
            Ok(None) => {
                log_message(
                    LogLevel::Warning,
                    &format!("Group '{}' wasn't found", group.name),
                );
                return Ok(());
            }
            Err(e) => {
                log_message(
                    LogLevel::Error,
                    &format!("Could not look up group '{}': {}", group.name, e),
                );
                self.recommend(Recommendation::advisory(format!(
                    "Review members of sudoer group '{}'",
                    group.name
                )));
                return Ok(());
            }
        };

        log::debug!(
            target: "sudoers",
            "group '{}' members: {:?}",
            membership.group,
            membership.members
        );
        for user in &membership.members {
            let outcome = self.audit_group_member(&group.name, user)?;
            self.report.members.push(MemberReport {
                group: group.name.clone(),
                user: user.clone(),
                outcome,
            });
        }
        Ok(())
    }

    fn audit_group_member(&mut self, group: &str, user: &str) -> GuardResult<MemberOutcome> {
        let is_operator = user == self.operator;
        if is_operator {
            log_message(
                LogLevel::Warning,
                &format!("Please note that you are currently user '{}'!", user),
            );
        }

        let question = format!("Should '{}' be part of sudoer group '{}'?", user, group);
        if self.prompter.confirm(&question, Some(true))? {
            return Ok(MemberOutcome::Kept);
        }

        if is_operator {
            log_message(
                LogLevel::Warning,
                &format!(
                    "Please manually remove self ({}) from sudoer group '{}'",
                    user, group
                ),
            );
            self.recommend(Recommendation::dangerous(format!(
                "Remove self ({}) from sudoer group '{}'",
                user, group
            )));
            return Ok(MemberOutcome::FlaggedManual);
        }

        let question = format!(
            "Would you like to remove '{}' from sudoer group '{}'?",
            user, group
        );
        if !self.prompter.confirm(&question, Some(false))? {
            log_message(
                LogLevel::Info,
                &format!("Please manually remove '{}' from sudoer group '{}'", user, group),
            );
            self.recommend_member_removal(user, group);
            return Ok(MemberOutcome::FlaggedManual);
        }

        match groups::remove_member(self.runner, user, group) {
            Ok(()) => {
                log_message(
                    LogLevel::Pass,
                    &format!("Successfully removed '{}' from sudoer group '{}'", user, group),
                );
                Ok(MemberOutcome::Removed)
            }
            Err(e) => {
                log::warn!(target: "sudoers", "{}", e);
                log_message(
                    LogLevel::Error,
                    &format!("Failed to remove '{}' from sudoer group '{}'", user, group),
                );
                log_message(
                    LogLevel::Info,
                    &format!("Please manually remove '{}' from sudoer group '{}'", user, group),
                );
                self.recommend_member_removal(user, group);
                Ok(MemberOutcome::FlaggedManual)
            }
        }
    }

    fn recommend_member_removal(&mut self, user: &str, group: &str) {
        self.recommend(Recommendation::advisory(format!(
            "Remove '{}' from sudoer group '{}'",
            user, group
        )));
    }
}
