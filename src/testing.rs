//! Scripted stand-ins for the operator and the host's tools.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::core::{GuardError, GuardResult};
use crate::execution::{CommandOutput, CommandRunner, Invocation};
use crate::prompt::Prompter;

type Handler = Box<dyn FnMut(&Invocation) -> GuardResult<CommandOutput>>;

/// Records every invocation; answers from per-program handlers,
/// defaulting to a silent success.
#[derive(Default)]
pub struct ScriptedRunner {
    pub log: Rc<RefCell<Vec<Invocation>>>,
    handlers: HashMap<String, Handler>,
}

impl ScriptedRunner {
    pub fn on<F>(mut self, program: &str, handler: F) -> Self
    where
        F: FnMut(&Invocation) -> GuardResult<CommandOutput> + 'static,
    {
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    /// Reply to `program` with a fixed exit code and stdout
    pub fn reply(self, program: &str, code: i32, stdout: &str) -> Self {
        let stdout = stdout.to_string();
        self.on(program, move |_| Ok(exit(code, &stdout)))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&mut self, invocation: &Invocation) -> GuardResult<CommandOutput> {
        self.log.borrow_mut().push(invocation.clone());
        match self.handlers.get_mut(&invocation.program) {
            Some(handler) => handler(invocation),
            None => Ok(exit(0, "")),
        }
    }
}

pub fn exit(code: i32, stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

/// Handler that performs `cp <src> <dst>` on the real file system
pub fn copy_files(invocation: &Invocation) -> GuardResult<CommandOutput> {
    std::fs::copy(&invocation.args[0], &invocation.args[1])?;
    Ok(exit(0, ""))
}

/// Hands out pre-recorded answers in order and records each question
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<bool>,
    lines: VecDeque<String>,
    pub questions: Rc<RefCell<Vec<String>>>,
}

impl ScriptedPrompter {
    pub fn new(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, question: &str, _default: Option<bool>) -> GuardResult<bool> {
        self.questions.borrow_mut().push(question.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| GuardError::Input(format!("no scripted answer for: {}", question)))
    }

    fn read_line(&mut self, question: &str) -> GuardResult<String> {
        self.questions.borrow_mut().push(question.to_string());
        self.lines
            .pop_front()
            .ok_or_else(|| GuardError::Input(format!("no scripted line for: {}", question)))
    }
}
