use crate::core::config::{APP_NAME, VERSION};
use crate::utils::logging::console_line;

const RULE: &str = "════════════════════════════════════════";

pub fn print_banner() {
    println!(
        r#"
 _   _    _    ____  ____  _   _
| | | |  / \  |  _ \|  _ \| \ | |
| |_| | / _ \ | |_) | | | |  \| |
|  _  |/ ___ \|  _ <| |_| | |\  |
|_| |_/_/   \_\_| \_\____/|_| \_|
        G  U  A  R  D
"#
    );
    println!("{} - interactive privilege and SSH hardening", APP_NAME);
    println!("Version {}", VERSION);
}

/// Header printed before each stage of a combined run
pub fn print_section(title: &str) {
    console_line(&format!("\n{}", RULE));
    console_line(&format!("  {}", title.to_uppercase()));
    console_line(&format!("{}\n", RULE));
}
