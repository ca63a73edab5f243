//! SSH server review: service state plus sshd_config hardening.

pub mod config;
pub mod configurer;

pub use configurer::SshConfigurer;
