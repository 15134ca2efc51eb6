// src/replay/script.rs

//! Parser for host replay scripts.
//!
//! ```text
//! # comment
//! observe db group=g1 phase=Pending
//! observe api group=g1 running=db
//! evaluate api
//! update db phase=Running
//! permit api
//! sleep 20s
//! permit api
//! delete api
//! ```

use std::time::Duration;

use regex::Regex;

use crate::config::parse_duration;
use crate::errors::{DepGateError, Error, Result};
use crate::types::UnitName;

/// Optional fields of an `observe` line. `None` means "not given".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObserveFields {
    pub group: Option<String>,
    pub phase: Option<String>,
    pub ready: Option<bool>,
    pub running: Option<Vec<UnitName>>,
    pub complete: Option<Vec<UnitName>>,
    pub skip: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Observe { app: UnitName, fields: ObserveFields },
    Update { app: UnitName, phase: String, ready: Option<bool> },
    Delete { app: UnitName },
    Evaluate { app: UnitName },
    Permit { app: UnitName },
    Sleep(Duration),
}

/// A parsed step with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLine {
    pub line: usize,
    pub step: ScriptStep,
}

#[derive(Debug)]
pub struct ScriptParser {
    name_re: Regex,
    field_re: Regex,
}

impl ScriptParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            name_re: Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").map_err(Error::from)?,
            field_re: Regex::new(r"^([a-z]+)=(.*)$").map_err(Error::from)?,
        })
    }

    /// Parse a whole script. Stops at the first malformed line.
    pub fn parse(&self, source: &str) -> Result<Vec<ScriptLine>> {
        let mut steps = Vec::new();
        for (idx, raw) in source.lines().enumerate() {
            let line = idx + 1;
            let text = raw.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let step = self
                .parse_line(text)
                .map_err(|message| DepGateError::ScriptError { line, message })?;
            steps.push(ScriptLine { line, step });
        }
        Ok(steps)
    }

    fn parse_line(&self, text: &str) -> std::result::Result<ScriptStep, String> {
        let mut tokens = text.split_whitespace();
        let command = tokens.next().unwrap_or_default();
        let target = tokens
            .next()
            .ok_or_else(|| format!("'{command}' needs an argument"))?;
        let rest: Vec<&str> = tokens.collect();

        if command == "sleep" {
            no_fields(command, &rest)?;
            return parse_duration(target).map(ScriptStep::Sleep);
        }

        if !self.name_re.is_match(target) {
            return Err(format!("invalid unit name '{target}'"));
        }
        let app = target.to_string();

        match command {
            "observe" => {
                let mut fields = ObserveFields::default();
                for (key, value) in self.fields(&rest)? {
                    match key {
                        "group" => fields.group = Some(value.to_string()),
                        "phase" => fields.phase = Some(value.to_string()),
                        "ready" => fields.ready = Some(parse_bool(value)?),
                        "running" => fields.running = Some(split_list(value)),
                        "complete" => fields.complete = Some(split_list(value)),
                        "skip" => {
                            let n = value
                                .parse::<u32>()
                                .map_err(|e| format!("invalid skip '{value}': {e}"))?;
                            fields.skip = Some(n);
                        }
                        other => return Err(format!("unknown observe field '{other}'")),
                    }
                }
                Ok(ScriptStep::Observe { app, fields })
            }
            "update" => {
                let mut phase = None;
                let mut ready = None;
                for (key, value) in self.fields(&rest)? {
                    match key {
                        "phase" => phase = Some(value.to_string()),
                        "ready" => ready = Some(parse_bool(value)?),
                        other => return Err(format!("unknown update field '{other}'")),
                    }
                }
                let phase = phase.ok_or_else(|| "update needs phase=<phase>".to_string())?;
                Ok(ScriptStep::Update { app, phase, ready })
            }
            "delete" => no_fields(command, &rest).map(|_| ScriptStep::Delete { app }),
            "evaluate" => no_fields(command, &rest).map(|_| ScriptStep::Evaluate { app }),
            "permit" => no_fields(command, &rest).map(|_| ScriptStep::Permit { app }),
            other => Err(format!("unknown command '{other}'")),
        }
    }

    fn fields<'a>(&self, tokens: &[&'a str]) -> std::result::Result<Vec<(&'a str, &'a str)>, String> {
        tokens
            .iter()
            .map(|&tok| {
                self.field_re
                    .captures(tok)
                    .and_then(|caps| {
                        let key = caps.get(1)?.as_str();
                        let value = caps.get(2)?.as_str();
                        Some((key, value))
                    })
                    .ok_or_else(|| format!("expected key=value, got '{tok}'"))
            })
            .collect()
    }
}

fn no_fields(command: &str, rest: &[&str]) -> std::result::Result<(), String> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(format!("'{command}' takes no fields, got '{}'", rest.join(" ")))
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    value
        .parse::<bool>()
        .map_err(|_| format!("expected true or false, got '{value}'"))
}

fn split_list(value: &str) -> Vec<UnitName> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
