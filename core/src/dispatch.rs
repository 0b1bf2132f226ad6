//! Dispatch of wake triggers over a set of requested nodes.

use crate::registry::Registry;
use crate::runner::{Pause, SendOutcome, TriggerSender};
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Gap between the two sends of a reset.
pub const RESET_DELAY: Duration = Duration::from_secs(5);

/// Power action applied to every resolved node.
///
/// Wake-on-LAN has no off packet, so `On` and `Off` send the same trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    On,
    Off,
    Reset,
}

impl Action {
    /// Number of triggers sent per node.
    pub fn sends(self) -> usize {
        match self {
            Action::On | Action::Off => 1,
            Action::Reset => 2,
        }
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "on" => Ok(Action::On),
            "off" => Ok(Action::Off),
            "reset" => Ok(Action::Reset),
            other => Err(Error::InvalidAction(other.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::On => "on",
            Action::Off => "off",
            Action::Reset => "reset",
        })
    }
}

/// Which nodes a run targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    /// Explicit names, in request order. Duplicates and unknown names allowed.
    Nodes(Vec<String>),
}

/// One helper invocation that ran and exited zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub node: String,
    pub mac: String,
}

/// One helper invocation that could not be started or exited nonzero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub node: String,
    pub mac: String,
    pub reason: String,
}

/// What happened during a run. Nothing in here is fatal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: Vec<Delivery>,
    pub failed: Vec<Failure>,
    /// Requested names with no registry entry.
    pub skipped: Vec<String>,
}

impl DispatchReport {
    pub fn attempts(&self) -> usize {
        self.sent.len() + self.failed.len()
    }
}

/// Sends triggers to nodes resolved through a [`Registry`].
pub struct Dispatcher<'a, S, P> {
    registry: &'a Registry,
    sender: S,
    pause: P,
    reset_delay: Duration,
}

impl<'a, S: TriggerSender, P: Pause> Dispatcher<'a, S, P> {
    pub fn new(registry: &'a Registry, sender: S, pause: P) -> Self {
        Self {
            registry,
            sender,
            pause,
            reset_delay: RESET_DELAY,
        }
    }

    pub fn with_reset_delay(mut self, delay: Duration) -> Self {
        self.reset_delay = delay;
        self
    }

    /// Send `action` to every node in `scope`, one node at a time.
    pub fn run(&self, scope: &Scope, action: Action) -> DispatchReport {
        let mut report = DispatchReport::default();
        match scope {
            Scope::All => {
                for (name, mac) in self.registry.iter() {
                    self.trigger(name, mac, action, &mut report);
                }
            }
            Scope::Nodes(names) => {
                for name in names {
                    match self.registry.lookup(name) {
                        Some(mac) => self.trigger(name, mac, action, &mut report),
                        None => {
                            tracing::debug!("{name}: not found in configuration, skipped");
                            report.skipped.push(name.clone());
                        }
                    }
                }
            }
        }
        tracing::info!(
            %action,
            sent = report.sent.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "dispatch finished"
        );
        report
    }

    fn trigger(&self, node: &str, mac: &str, action: Action, report: &mut DispatchReport) {
        for round in 0..action.sends() {
            if round > 0 {
                self.pause.pause(self.reset_delay);
            }
            let reason = match self.sender.send(mac) {
                Ok(outcome) if outcome.success() => None,
                Ok(SendOutcome { code: Some(code) }) => Some(format!("helper exited with {code}")),
                Ok(SendOutcome { code: None }) => Some("helper killed by signal".to_string()),
                Err(err) => Some(err.to_string()),
            };
            match reason {
                None => report.sent.push(Delivery {
                    node: node.to_string(),
                    mac: mac.to_string(),
                }),
                Some(reason) => {
                    tracing::warn!(node, mac, %reason, "trigger failed");
                    report.failed.push(Failure {
                        node: node.to_string(),
                        mac: mac.to_string(),
                        reason,
                    });
                }
            }
        }
    }
}

impl<T: TriggerSender + ?Sized> TriggerSender for &T {
    fn send(&self, mac: &str) -> Result<SendOutcome> {
        (**self).send(mac)
    }
}

impl<T: Pause + ?Sized> Pause for &T {
    fn pause(&self, delay: Duration) {
        (**self).pause(delay)
    }
}
