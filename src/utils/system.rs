use std::collections::HashMap;
use std::ffi::CStr;
use std::fs;
use std::path::Path;

/// Read /etc/os-release into a key/value map.
/// Returns an empty map if the file cannot be read
pub fn read_os_release(path: &Path) -> HashMap<String, String> {
    match fs::read_to_string(path) {
        Ok(content) => parse_os_release(&content),
        Err(e) => {
            log::warn!("cannot read {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// Parse os-release file content.
/// Handles both KEY=value and KEY="value" formats
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.to_string(), unquote(value).to_string()))
        .collect()
}

fn unquote(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}

pub fn is_root() -> bool {
    unsafe { libc::geteuid() == 0 }
}

/// Environment variables naming the logged-in user, most specific first.
/// SUDO_USER wins so that `sudo hardn-guard` still sees the real operator.
const USER_VARS: [&str; 5] = ["SUDO_USER", "LOGNAME", "USER", "LNAME", "USERNAME"];

/// Name of the person operating this process.
/// Checks the login environment first, then the password database
pub fn current_user() -> Option<String> {
    user_from_env(|var| std::env::var(var).ok()).or_else(user_from_passwd)
}

pub(crate) fn user_from_env<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    USER_VARS
        .iter()
        .filter_map(|var| lookup(*var))
        .find(|name| !name.is_empty())
}

fn user_from_passwd() -> Option<String> {
    // SAFETY: getpwuid returns a pointer into static storage or null;
    // the name is copied out before any other passwd call.
    unsafe {
        let pw = libc::getpwuid(libc::geteuid());
        if pw.is_null() || (*pw).pw_name.is_null() {
            return None;
        }
        CStr::from_ptr((*pw).pw_name)
            .to_str()
            .ok()
            .map(String::from)
    }
}

/// Home directory of the invoking user
pub fn home_dir() -> Option<String> {
    std::env::var("HOME").ok().filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_and_bare_values() {
        let release = parse_os_release(
            "NAME=\"Debian GNU/Linux\"\nVERSION_ID=\"12\"\nID=debian\n\n# comment\nBROKEN\n",
        );
        assert_eq!(release.get("NAME").map(String::as_str), Some("Debian GNU/Linux"));
        assert_eq!(release.get("VERSION_ID").map(String::as_str), Some("12"));
        assert_eq!(release.get("ID").map(String::as_str), Some("debian"));
        assert!(!release.contains_key("BROKEN"));
    }

    #[test]
    fn missing_file_gives_empty_map() {
        assert!(read_os_release(Path::new("/nonexistent/os-release")).is_empty());
    }

    #[test]
    fn current_user_is_resolved() {
        assert!(current_user().is_some());
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn sudo_user_is_preferred_over_root_login() {
        let lookup = env(&[("LOGNAME", "root"), ("USER", "root"), ("SUDO_USER", "alice")]);
        assert_eq!(user_from_env(lookup), Some("alice".to_string()));
    }

    #[test]
    fn empty_sudo_user_falls_back_to_login_name() {
        let lookup = env(&[("SUDO_USER", ""), ("LOGNAME", "bob")]);
        assert_eq!(user_from_env(lookup), Some("bob".to_string()));
        assert_eq!(user_from_env(env(&[])), None);
    }
}
