use regex::Regex;

/// In-memory sshd_config with keyword upserts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshdConfig {
    lines: Vec<String>,
    trailing_newline: bool,
    changed: bool,
}

/// sshd keywords are case-insensitive; commented defaults count as a match
fn keyword_pattern(keyword: &str) -> Option<Regex> {
    Regex::new(&format!(r"(?i)^\s*#?\s*{}(\s|$)", regex::escape(keyword))).ok()
}

fn mentions(pattern: &Option<Regex>, line: &str) -> bool {
    pattern.as_ref().map_or(false, |re| re.is_match(line))
}

impl SshdConfig {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(String::from).collect(),
            trailing_newline: text.is_empty() || text.ends_with('\n'),
            changed: false,
        }
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Replace the first line mentioning `keyword` (commented or not) with
    /// `keyword argument`, or append it. Returns true if the text changed.
    pub fn set(&mut self, keyword: &str, argument: &str) -> bool {
        let wanted = format!("{} {}", keyword, argument);
        let pattern = keyword_pattern(keyword);

        match self.lines.iter().position(|line| mentions(&pattern, line)) {
            Some(index) if self.lines[index] == wanted => return false,
            Some(index) => self.lines[index] = wanted,
            None => {
                self.trailing_newline = true;
                self.lines.push(wanted);
            }
        }
        log::debug!("sshd_config: {} {}", keyword, argument);
        self.changed = true;
        true
    }

    pub fn render(&self) -> String {
        let mut text = self.lines.join("\n");
        if self.trailing_newline && !self.lines.is_empty() {
            text.push('\n');
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOCK: &str = "\
Include /etc/ssh/sshd_config.d/*.conf
#Port 22
#PermitRootLogin prohibit-password
#MaxAuthTries 6
PasswordAuthentication yes
X11Forwarding yes
";

    #[test]
    fn commented_default_is_replaced_in_place() {
        let mut config = SshdConfig::parse(STOCK);
        assert!(config.set("PermitRootLogin", "no"));

        let rendered = config.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[2], "PermitRootLogin no");
        assert_eq!(lines.len(), 6);
        assert!(config.is_changed());
    }

    #[test]
    fn missing_keyword_is_appended() {
        let mut config = SshdConfig::parse(STOCK);
        config.set("AllowAgentForwarding", "no");
        assert!(config.render().ends_with("X11Forwarding yes\nAllowAgentForwarding no\n"));
    }

    #[test]
    fn similar_keywords_are_not_confused() {
        let mut config = SshdConfig::parse("AllowTcpForwardingExtra yes\n");
        config.set("AllowTcpForwarding", "no");
        assert_eq!(
            config.render(),
            "AllowTcpForwardingExtra yes\nAllowTcpForwarding no\n"
        );
    }

    #[test]
    fn setting_existing_value_is_not_a_change() {
        let mut config = SshdConfig::parse("PasswordAuthentication no\n");
        assert!(!config.set("PasswordAuthentication", "no"));
        assert!(!config.is_changed());
    }

    #[test]
    fn file_without_final_newline_gains_one_on_append() {
        let mut config = SshdConfig::parse("Port 22");
        assert_eq!(config.render(), "Port 22");
        config.set("AddressFamily", "inet");
        assert_eq!(config.render(), "Port 22\nAddressFamily inet\n");
    }
}
