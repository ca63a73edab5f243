use serde::Serialize;
use std::fmt;

/// Marks a group name in the first column
pub const GROUP_MARKER: char = '%';

/// Separates the name column from the privilege specification
pub const FIELD_SEPARATOR: char = '\t';

/// Whether a rule grants privileges to an account or to a group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Individual,
    Group,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EntryKind::Individual => write!(f, "user"),
            EntryKind::Group => write!(f, "group"),
        }
    }
}

/// One user or group rule from the privilege table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivilegeEntry {
    pub name: String,
    pub kind: EntryKind,
    /// Everything after the first tab, kept verbatim
    pub privileges: String,
    /// Index of the originating line in the table
    #[serde(skip)]
    pub line: usize,
}

impl PrivilegeEntry {
    pub fn new(name: &str, kind: EntryKind, privileges: &str, line: usize) -> Self {
        Self {
            name: name.to_string(),
            kind,
            privileges: privileges.to_string(),
            line,
        }
    }

    pub fn is_group(&self) -> bool {
        self.kind == EntryKind::Group
    }
}

/// Renders the rule exactly as it appears in the table
impl fmt::Display for PrivilegeEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_group() {
            write!(f, "{}", GROUP_MARKER)?;
        }
        write!(f, "{}{}{}", self.name, FIELD_SEPARATOR, self.privileges)
    }
}
