//! # Bridge Script Parser
//!
//! Line-based scenario scripts for driving a simulated page/frame pair.
//!
//! ## Format
//!
//! - `send <namespace> <json>`: the page sends `json`; use `-` for no namespace
//! - `wait 250ms` / `wait 2s`: advance the simulated clock
//! - `settle`: deliver everything in flight
//! - `respond on` / `respond off`: toggle whether the frame answers
//! - Comments: `# anything`
//!
//! ## Example
//!
//! ```text
//! send greet {"hello": "frame"}
//! settle
//! respond off
//! send greet "unanswered"
//! wait 3s
//! ```

use serde_json::Value;
use std::collections::VecDeque;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("Empty script")]
    EmptyScript,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptStep {
    Send {
        namespace: Option<String>,
        data: Value,
    },
    /// Advance the clock by this many milliseconds
    Wait(u64),
    Settle,
    Respond(bool),
}

#[derive(Debug, Clone, Default)]
pub struct BridgeScript {
    steps: VecDeque<ScriptStep>,
}

impl BridgeScript {
    /// The scenario run when no script is supplied
    ///
    /// One answered send, then one that is left to time out.
    pub fn demo(timeout_ms: u64) -> Self {
        let steps = vec![
            ScriptStep::Send {
                namespace: Some("greet".to_string()),
                data: Value::String("ping".to_string()),
            },
            ScriptStep::Settle,
            ScriptStep::Respond(false),
            ScriptStep::Send {
                namespace: Some("greet".to_string()),
                data: Value::String("anyone there?".to_string()),
            },
            ScriptStep::Settle,
            ScriptStep::Wait(timeout_ms),
        ];
        Self {
            steps: steps.into(),
        }
    }

    pub fn from_text(text: &str) -> Result<Self, ScriptError> {
        let mut steps = VecDeque::new();

        for (index, line) in text.lines().enumerate() {
            let line = strip_comment(line).trim();
            if line.is_empty() {
                continue;
            }
            steps.push_back(Self::parse_line(line, index + 1)?);
        }

        if steps.is_empty() {
            return Err(ScriptError::EmptyScript);
        }
        Ok(Self { steps })
    }

    fn parse_line(line: &str, line_num: usize) -> Result<ScriptStep, ScriptError> {
        let error = |message: String| ScriptError::ParseError {
            line: line_num,
            message,
        };
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();

        match command {
            "send" => {
                let (namespace, json) = rest
                    .split_once(' ')
                    .ok_or_else(|| error("send needs a namespace and a payload".to_string()))?;
                let data = serde_json::from_str(json.trim())
                    .map_err(|e| error(format!("invalid payload: {}", e)))?;
                let namespace = match namespace {
                    "-" => None,
                    name => Some(name.to_string()),
                };
                Ok(ScriptStep::Send { namespace, data })
            }
            "wait" => parse_duration(rest).map(ScriptStep::Wait).map_err(error),
            "settle" if rest.is_empty() => Ok(ScriptStep::Settle),
            "respond" => match rest {
                "on" => Ok(ScriptStep::Respond(true)),
                "off" => Ok(ScriptStep::Respond(false)),
                other => Err(error(format!("expected on or off, got {:?}", other))),
            },
            _ => Err(error(format!("unknown command: {}", line))),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn next_step(&mut self) -> Option<ScriptStep> {
        self.steps.pop_front()
    }
}

/// Drops a trailing `#` comment unless it sits inside a JSON string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (index, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_duration(text: &str) -> Result<u64, String> {
    let text = text.trim().to_lowercase();
    let (digits, scale) = if let Some(ms) = text.strip_suffix("ms") {
        (ms, 1)
    } else if let Some(secs) = text.strip_suffix('s') {
        (secs, 1000)
    } else {
        return Err(format!("invalid duration: {}", text));
    };

    digits
        .trim()
        .parse::<u64>()
        .map(|value| value.saturating_mul(scale))
        .map_err(|_| format!("invalid duration: {}", text))
}
