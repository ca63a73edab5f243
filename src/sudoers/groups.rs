//! Access to the OS group database through getent and gpasswd.

use crate::core::config::{GETENT_BIN, GPASSWD_BIN};
use crate::core::GuardResult;
use crate::execution::{CommandRunner, Invocation};

/// Members of a group as the OS reports them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub group: String,
    pub members: Vec<String>,
}

/// Look a group up with `getent group <name>`.
///
/// Returns None when the group does not exist on this host.
pub fn lookup(runner: &mut dyn CommandRunner, group: &str) -> GuardResult<Option<GroupMembership>> {
    let output = runner.run(&Invocation::new(GETENT_BIN, &["group", group]))?;
    if !output.success() {
        return Ok(None);
    }

    Ok(parse_group_record(output.stdout.trim()).map(|members| GroupMembership {
        group: group.to_string(),
        members,
    }))
}

/// Member list from a `name:password:gid:members` record
pub fn parse_group_record(record: &str) -> Option<Vec<String>> {
    let members = record.lines().next()?.split(':').nth(3)?;
    Some(
        members
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(String::from)
            .collect(),
    )
}

/// `gpasswd -d <user> <group>`; a non-zero exit becomes an error
pub fn remove_member(runner: &mut dyn CommandRunner, user: &str, group: &str) -> GuardResult<()> {
    let invocation = Invocation::new(GPASSWD_BIN, &["-d", user, group]).privileged();
    runner.run(&invocation)?.check(&invocation)?;
    Ok(())
}
