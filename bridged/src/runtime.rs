//! # Bridge Runtime
//!
//! Runs a page and a frame channel over the simulated bus and records what
//! became of every send the page made.

use crate::script::{BridgeScript, ScriptError, ScriptStep};
use bridge_sim::{SimEndpoint, SimTimer, SimWorld};
use bridge_types::MessageId;
use frame_bridge::{Channel, ChannelConfig, ChannelError, ResponseFuture, DEFAULT_TIMEOUT_MS};
use futures::FutureExt;
use serde_json::{json, Value};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, info};

type SimChannel = Channel<SimEndpoint, SimTimer>;

#[derive(Debug, Error)]
pub enum BridgeRuntimeError {
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
}

#[derive(Debug, Clone)]
pub struct BridgeRuntimeConfig {
    /// Origin of the embedding page
    pub page_origin: String,
    /// Origin of the embedded frame
    pub frame_origin: String,
    pub timeout_ms: u64,
    /// Whether the frame answers from the start
    pub respond: bool,
    /// Script text; the built-in demo runs when absent
    pub script: Option<String>,
}

impl Default for BridgeRuntimeConfig {
    fn default() -> Self {
        Self {
            page_origin: "https://page.example".to_string(),
            frame_origin: "https://frame.example".to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            respond: true,
            script: None,
        }
    }
}

/// What became of one send
#[derive(Debug, Clone, PartialEq)]
pub enum SendOutcome {
    Responded(Value),
    TimedOut,
    Failed(String),
    /// Still unresolved when the script ended
    Pending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendRecord {
    pub id: Option<MessageId>,
    pub namespace: Option<String>,
    pub outcome: SendOutcome,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub page_handshaken: bool,
    pub frame_handshaken: bool,
    pub sends: Vec<SendRecord>,
    /// Messages the frame received through its handler
    pub frame_received: usize,
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "handshake: page={} frame={}",
            self.page_handshaken, self.frame_handshaken
        )?;
        writeln!(f, "frame received {} message(s)", self.frame_received)?;
        for record in &self.sends {
            let id = record
                .id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            let namespace = record.namespace.as_deref().unwrap_or("-");
            match &record.outcome {
                SendOutcome::Responded(data) => {
                    writeln!(f, "{} [{}] responded: {}", id, namespace, data)?
                }
                SendOutcome::TimedOut => writeln!(f, "{} [{}] timed out", id, namespace)?,
                SendOutcome::Failed(reason) => {
                    writeln!(f, "{} [{}] failed: {}", id, namespace, reason)?
                }
                SendOutcome::Pending => writeln!(f, "{} [{}] pending", id, namespace)?,
            }
        }
        Ok(())
    }
}

struct InFlightSend {
    namespace: Option<String>,
    future: ResponseFuture,
}

/// A page/frame pair over one simulated world
pub struct BridgeRuntime {
    world: SimWorld,
    page: SimChannel,
    frame: SimChannel,
    script: BridgeScript,
    respond: Rc<Cell<bool>>,
    frame_received: Rc<Cell<usize>>,
    in_flight: Vec<InFlightSend>,
    records: Vec<SendRecord>,
}

impl BridgeRuntime {
    pub fn new(config: BridgeRuntimeConfig) -> Result<Self, BridgeRuntimeError> {
        let script = match &config.script {
            Some(text) => BridgeScript::from_text(text)?,
            None => BridgeScript::demo(config.timeout_ms),
        };

        let world = SimWorld::new();
        let page_end = world.open(&config.page_origin);
        let frame_end = world.open(&config.frame_origin);
        let (page_ctx, frame_ctx) = (page_end.context(), frame_end.context());

        let page = Channel::from_config(
            page_end,
            world.timer.clone(),
            ChannelConfig::new(frame_ctx, config.frame_origin.clone())
                .with_timeout_ms(config.timeout_ms),
        );
        let frame = Channel::from_config(
            frame_end,
            world.timer.clone(),
            ChannelConfig::new(page_ctx, config.page_origin.clone())
                .with_timeout_ms(config.timeout_ms),
        );

        let respond = Rc::new(Cell::new(config.respond));
        let frame_received = Rc::new(Cell::new(0));
        {
            let respond = respond.clone();
            let received = frame_received.clone();
            frame.set_on_message(move |incoming| {
                received.set(received.get() + 1);
                debug!(id = %incoming.id(), namespace = ?incoming.namespace(), "frame received");
                if respond.get() {
                    let _ = incoming.respond(json!({ "echo": incoming.data() }));
                }
            });
        }

        info!(
            page = %config.page_origin,
            frame = %config.frame_origin,
            timeout_ms = config.timeout_ms,
            steps = script.len(),
            "bridge runtime ready"
        );

        Ok(Self {
            world,
            page,
            frame,
            script,
            respond,
            frame_received,
            in_flight: Vec::new(),
            records: Vec::new(),
        })
    }

    /// Runs the script to completion
    pub fn run(&mut self) -> RunReport {
        while let Some(step) = self.script.next_step() {
            self.apply(step);
            self.collect();
        }

        let mut sends = std::mem::take(&mut self.records);
        sends.extend(self.in_flight.drain(..).map(|send| SendRecord {
            id: send.future.id(),
            namespace: send.namespace,
            outcome: SendOutcome::Pending,
        }));
        sends.sort_by_key(|record| record.id);

        RunReport {
            page_handshaken: self.page.is_handshaken(),
            frame_handshaken: self.frame.is_handshaken(),
            sends,
            frame_received: self.frame_received.get(),
        }
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    fn apply(&mut self, step: ScriptStep) {
        debug!(?step, "script step");
        match step {
            ScriptStep::Send { namespace, data } => {
                let future = self.page.send(namespace.as_deref(), data);
                self.in_flight.push(InFlightSend { namespace, future });
            }
            ScriptStep::Wait(millis) => {
                self.world.advance(millis);
            }
            ScriptStep::Settle => {
                self.world.settle();
            }
            ScriptStep::Respond(enabled) => self.respond.set(enabled),
        }
    }

    /// Moves every settled send from in flight to the record
    fn collect(&mut self) {
        let mut still_waiting = Vec::with_capacity(self.in_flight.len());
        for mut send in self.in_flight.drain(..) {
            let outcome = match (&mut send.future).now_or_never() {
                None => {
                    still_waiting.push(send);
                    continue;
                }
                Some(Ok(incoming)) => SendOutcome::Responded(incoming.into_data()),
                Some(Err(ChannelError::Timeout { .. })) => SendOutcome::TimedOut,
                Some(Err(err)) => SendOutcome::Failed(err.to_string()),
            };
            self.records.push(SendRecord {
                id: send.future.id(),
                namespace: send.namespace,
                outcome,
            });
        }
        self.in_flight = still_waiting;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_run() {
        let mut runtime = BridgeRuntime::new(BridgeRuntimeConfig::default()).unwrap();
        let report = runtime.run();

        assert!(report.page_handshaken);
        assert!(report.frame_handshaken);
        assert_eq!(report.frame_received, 2);
        assert_eq!(report.sends.len(), 2);
        assert_eq!(
            report.sends[0].outcome,
            SendOutcome::Responded(json!({"echo": "ping"}))
        );
        assert_eq!(report.sends[1].outcome, SendOutcome::TimedOut);
    }

    #[test]
    fn test_unfinished_sends_are_pending() {
        let config = BridgeRuntimeConfig {
            script: Some("send - 1".to_string()),
            ..BridgeRuntimeConfig::default()
        };
        let report = BridgeRuntime::new(config).unwrap().run();

        assert_eq!(report.sends.len(), 1);
        assert_eq!(report.sends[0].id, Some(MessageId::new(1)));
        assert_eq!(report.sends[0].outcome, SendOutcome::Pending);
        assert!(!report.page_handshaken);
    }

    #[test]
    fn test_bad_script_is_rejected() {
        let config = BridgeRuntimeConfig {
            script: Some("jump".to_string()),
            ..BridgeRuntimeConfig::default()
        };
        assert!(matches!(
            BridgeRuntime::new(config),
            Err(BridgeRuntimeError::Script(_))
        ));
    }

    #[test]
    fn test_report_display() {
        let report = RunReport {
            page_handshaken: true,
            frame_handshaken: true,
            sends: vec![SendRecord {
                id: Some(MessageId::new(1)),
                namespace: None,
                outcome: SendOutcome::TimedOut,
            }],
            frame_received: 1,
        };
        let text = report.to_string();
        assert!(text.contains("handshake: page=true frame=true"));
        assert!(text.contains("Msg(1) [-] timed out"));
    }
}
