mod core;
mod display;
mod execution;
mod prompt;
mod ssh;
mod sudoers;
mod updater;
mod utils;

#[cfg(test)]
mod testing;

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::process;

use crate::core::config::*;
use crate::core::{GuardError, GuardResult, Settings};
use crate::display::banner::{print_banner, print_section};
use crate::display::report::{
    backups_table, find_backups, print_recommendations, print_sudoers_summary,
};
use crate::execution::{CommandRunner, InstallOutcome, SystemRunner};
use crate::prompt::{console_prompter, Prompter};
use crate::ssh::SshConfigurer;
use crate::sudoers::{CommitStatus, SudoersAuditor};
use crate::updater::{update_system, Distro};
use crate::utils::logging::{
    color_enabled, enable_color, init_diagnostics, route_console_to_stderr,
};
use crate::utils::{current_user, is_root, log_message, LogLevel};

const COMMANDS: [&str; 5] = ["sudoers", "ssh", "update", "all", "backups"];

fn build_cli() -> Command {
    Command::new("hardn-guard")
        .version(VERSION)
        .author("Security International Group")
        .about("Interactive review of sudo privileges and SSH server hardening")
        .long_about(
            "HARDN Guard walks through every user and group rule in the sudoers file,\n\
             asks which privileges are still needed, and rewrites the file only after\n\
             the edited copy passes 'visudo -c'.\n\n\
             EXAMPLES:\n\
             \thardn-guard                  # Audit /etc/sudoers\n\
             \thardn-guard ssh              # Review the SSH server\n\
             \thardn-guard all              # Update packages, then sudoers, then SSH\n\
             \thardn-guard backups          # List sudoers backups\n\
             \thardn-guard --json           # Print the sudoers report as JSON",
        )
        .arg(
            Arg::new("command")
                .value_parser(COMMANDS)
                .default_value("sudoers")
                .help("What to review"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("PATH")
                .help("Settings file (default /etc/hardn/guard.conf)"),
        )
        .arg(
            Arg::new("sudoers")
                .long("sudoers")
                .value_name("PATH")
                .help("Sudoers file to audit"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the sudoers report as JSON")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Write debug records to the log file")
                .action(ArgAction::SetTrue),
        )
}

fn load_settings(matches: &ArgMatches) -> GuardResult<Settings> {
    let mut settings = Settings::load(matches.get_one::<String>("config").map(Path::new))?;
    if let Some(path) = matches.get_one::<String>("sudoers") {
        settings.sudoers_file = PathBuf::from(path);
    }
    if matches.get_flag("no-color") {
        settings.color = false;
    }
    Ok(settings)
}

fn run_sudoers(
    settings: &Settings,
    runner: &mut dyn CommandRunner,
    prompter: &mut dyn Prompter,
    json: bool,
) -> GuardResult<bool> {
    let operator = current_user().ok_or_else(|| {
        GuardError::Config("cannot determine which user is running this tool".to_string())
    })?;
    log::info!(
        target: "sudoers",
        "audit of {} started by {}",
        settings.sudoers_file.display(),
        operator
    );

    let report = SudoersAuditor::new(settings, &operator, runner, prompter).run()?;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{}", text),
            Err(e) => log_message(LogLevel::Error, &format!("Cannot encode report: {}", e)),
        }
    } else {
        print_sudoers_summary(&report);
        print_recommendations(report.recommendations());
    }

    match report.commit {
        CommitStatus::NotNeeded | CommitStatus::Attempted(InstallOutcome::Installed) => Ok(true),
        CommitStatus::Attempted(InstallOutcome::Rejected(reason)) => {
            Err(GuardError::Validation(reason))
        }
        CommitStatus::Attempted(_) => Ok(false),
    }
}

fn run_ssh(
    settings: &Settings,
    runner: &mut dyn CommandRunner,
    prompter: &mut dyn Prompter,
) -> GuardResult<bool> {
    let report = SshConfigurer::new(settings, runner, prompter).run()?;
    print_recommendations(&report.recommendations);
    Ok(report
        .install
        .map_or(true, |outcome| outcome == InstallOutcome::Installed))
}

fn run_update(runner: &mut dyn CommandRunner) -> GuardResult<bool> {
    let distro = Distro::detect(Path::new(DEFAULT_OS_RELEASE));
    log::info!(target: "updater", "detected distro {}", distro);
    update_system(runner, distro)
}

fn list_backups(settings: &Settings) -> bool {
    let backups = find_backups(&settings.sudoers_file);
    if backups.is_empty() {
        log_message(
            LogLevel::Info,
            &format!("No backups of {} found", settings.sudoers_file.display()),
        );
    } else {
        println!("{}", backups_table(&backups));
    }
    true
}

fn run(matches: &ArgMatches) -> GuardResult<bool> {
    let settings = load_settings(matches)?;
    enable_color(settings.color && color_enabled());
    init_diagnostics(&settings.log_file, matches.get_flag("verbose"));
    log::info!(
        "{} {} started, settings from {}",
        APP_NAME,
        VERSION,
        settings.config_file.display()
    );

    let json = matches.get_flag("json");
    route_console_to_stderr(json);
    let command = matches
        .get_one::<String>("command")
        .map(String::as_str)
        .unwrap_or("sudoers");

    if !json {
        print_banner();
    }
    if !is_root() && !settings.use_sudo {
        log_message(
            LogLevel::Warning,
            "Not running as root and USE_SUDO is off, privileged steps will likely fail",
        );
    }

    let mut runner = SystemRunner::new(settings.use_sudo && !is_root());
    let mut prompter = console_prompter();
    let prompter = prompter.as_mut();

    match command {
        "backups" => Ok(list_backups(&settings)),
        "update" => run_update(&mut runner),
        "ssh" => run_ssh(&settings, &mut runner, prompter),
        "all" => {
            print_section("System update");
            let updated = continue_unless_fatal(run_update(&mut runner))?;
            print_section("Sudo privileges");
            let audited =
                continue_unless_fatal(run_sudoers(&settings, &mut runner, prompter, json))?;
            print_section("SSH server");
            let hardened = continue_unless_fatal(run_ssh(&settings, &mut runner, prompter))?;
            Ok(updated && audited && hardened)
        }
        _ => run_sudoers(&settings, &mut runner, prompter, json),
    }
}

/// A stage of `all` that fails recoverably is reported and the next stage runs
fn continue_unless_fatal(result: GuardResult<bool>) -> GuardResult<bool> {
    match result {
        Err(e) if !e.is_fatal() => {
            log::error!("{}", e);
            log_message(LogLevel::Error, &e.to_string());
            Ok(false)
        }
        other => other,
    }
}

fn exit_code(err: &GuardError) -> i32 {
    match err {
        GuardError::Config(_) => EXIT_USAGE,
        _ => EXIT_FAILURE,
    }
}

fn main() {
    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            let _ = e.print();
            process::exit(if e.use_stderr() { EXIT_USAGE } else { EXIT_SUCCESS });
        }
    };

    let code = match run(&matches) {
        Ok(true) => EXIT_SUCCESS,
        Ok(false) => EXIT_FAILURE,
        Err(e) => {
            log::error!("{}", e);
            log_message(LogLevel::Error, &e.to_string());
            exit_code(&e)
        }
    };
    log::logger().flush();
    process::exit(code);
}
