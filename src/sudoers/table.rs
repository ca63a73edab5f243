use crate::sudoers::entry::PrivilegeEntry;

/// Working copy of the privilege table.
///
/// The text is held as its original lines (terminators included) so a
/// removal by index leaves every other byte untouched. `entries` are
/// derived once by the parser and are not re-synchronised after removals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegeTable {
    lines: Vec<String>,
    removed: Vec<bool>,
    entries: Vec<PrivilegeEntry>,
    include_directives: Vec<String>,
    dirty: bool,
}

impl PrivilegeTable {
    pub(crate) fn new(
        lines: Vec<String>,
        entries: Vec<PrivilegeEntry>,
        include_directives: Vec<String>,
    ) -> Self {
        let removed = vec![false; lines.len()];
        Self {
            lines,
            removed,
            entries,
            include_directives,
            dirty: false,
        }
    }

    pub fn entries(&self) -> &[PrivilegeEntry] {
        &self.entries
    }

    pub fn include_directives(&self) -> &[String] {
        &self.include_directives
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current contents with removed lines dropped
    pub fn raw_text(&self) -> String {
        self.lines
            .iter()
            .zip(&self.removed)
            .filter(|(_, removed)| !**removed)
            .map(|(line, _)| line.as_str())
            .collect()
    }

    /// Drop the line an entry was parsed from, terminator included.
    ///
    /// Returns false if that line is already gone or no longer holds the
    /// entry, in which case nothing changes.
    pub fn remove_entry(&mut self, entry: &PrivilegeEntry) -> bool {
        let index = entry.line;
        let matches = self
            .lines
            .get(index)
            .map(|line| line.trim() == entry.to_string())
            .unwrap_or(false);

        if !matches || self.removed[index] {
            return false;
        }

        self.removed[index] = true;
        self.dirty = true;
        true
    }
}
