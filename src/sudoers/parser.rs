use crate::core::{GuardError, GuardResult};
use crate::sudoers::entry::{EntryKind, PrivilegeEntry, FIELD_SEPARATOR, GROUP_MARKER};
use crate::sudoers::table::PrivilegeTable;

/// Directives naming a directory of extra sudoers files
const INCLUDE_DIR_DIRECTIVES: &[&str] = &["#includedir", "@includedir"];

const COMMENT_MARKER: char = '#';
const DEFAULTS_KEYWORD: &str = "Defaults";

/// Alias definitions are outside the supported grammar
const ALIAS_KEYWORDS: &[&str] = &[
    "User_Alias",
    "Runas_Alias",
    "Host_Alias",
    "Cmnd_Alias",
    "Cmd_Alias",
];

/// Parse sudoers text into entries and include directives.
///
/// Comments, blank lines, `Defaults` lines and alias definitions are
/// skipped. Any other line must be `name<TAB>privileges`, optionally with a
/// leading `%` for groups; anything else fails the whole parse.
pub fn parse(raw_text: &str) -> GuardResult<PrivilegeTable> {
    let lines: Vec<String> = raw_text.split_inclusive('\n').map(String::from).collect();
    let mut entries = Vec::new();
    let mut include_directives = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        let line = line.trim();

        if INCLUDE_DIR_DIRECTIVES.iter().any(|d| line.contains(d)) {
            let (_, argument) = line.split_once(' ').ok_or_else(|| {
                GuardError::format(index + 1, format!("include directive without a path: {}", line))
            })?;
            include_directives.push(argument.to_string());
            continue;
        }

        if is_skipped(line) {
            continue;
        }

        entries.push(parse_entry(line, index)?);
    }

    log::debug!(
        "parsed {} entries and {} include directives",
        entries.len(),
        include_directives.len()
    );
    Ok(PrivilegeTable::new(lines, entries, include_directives))
}

fn is_skipped(line: &str) -> bool {
    line.is_empty()
        || line.contains(COMMENT_MARKER)
        || line.contains(DEFAULTS_KEYWORD)
        || ALIAS_KEYWORDS.iter().any(|keyword| {
            line.strip_prefix(keyword)
                .map(|rest| rest.starts_with(char::is_whitespace))
                .unwrap_or(false)
        })
}

/// Parse one trimmed rule line taken from table line `index`
pub fn parse_entry(line: &str, index: usize) -> GuardResult<PrivilegeEntry> {
    let (kind, rest) = match line.strip_prefix(GROUP_MARKER) {
        Some(rest) => (EntryKind::Group, rest),
        None => (EntryKind::Individual, line),
    };

    let (name, privileges) = rest.split_once(FIELD_SEPARATOR).ok_or_else(|| {
        GuardError::format(
            index + 1,
            format!("expected a tab between name and privileges: {}", line),
        )
    })?;

    if name.is_empty() {
        return Err(GuardError::format(index + 1, format!("rule has no name: {}", line)));
    }

    Ok(PrivilegeEntry::new(name, kind, privileges, index))
}
