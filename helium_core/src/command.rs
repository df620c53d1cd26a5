//! Pre-parsed transport commands and their replies.

use crate::monitor::Monitor;
use crate::notifier::Enablement;
use helium_traits::SubscriberId;
use std::time::Duration;

/// Reply for a recipient without an active subscription.
pub const NOT_SUBSCRIBED: &str = "Start with: /notify notify:True";

pub const NOTIFY_USAGE: &str = "/notify arguments, separated by ' ' and followed by:\n\
n|notify|notifications:1|True|0|False\n\
al|alarm:1|True|0|False\n\
rr|refresh_rate:3600 #s\n\
lv|level:17.5 #L\n\
pi|poll_interval:5 #s";

/// Command names and their aliases.
pub const COMMANDS: &[(&str, &[&str])] = &[
    ("help", &["help", "hlep"]),
    ("status", &["helium", "status"]),
    ("notifications", &["notify", "notifications", "notification"]),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Notify(NotifyArgs),
    Help,
}

/// Fields of a `/notify` command; `None` leaves the setting untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotifyArgs {
    pub notifications: Option<bool>,
    pub alarm: Option<bool>,
    pub refresh_rate: Option<Duration>,
    pub alarm_level_l: Option<f64>,
    pub poll_interval: Option<Duration>,
}

impl NotifyArgs {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn help_text() -> String {
    let mut text = String::from("Use one of the following commands, for\n");
    for (name, aliases) in COMMANDS {
        let list: Vec<String> = aliases.iter().map(|a| format!("/{a}")).collect();
        text.push_str(&format!("{name}: {}\n", list.join(", ")));
    }
    text
}

impl Monitor {
    /// Execute `command` for `recipient` and return the reply text.
    pub fn handle(&self, recipient: &SubscriberId, command: &Command) -> String {
        let reply = match command {
            Command::Status => self.status_text(),
            Command::Help => help_text(),
            Command::Notify(args) => self.handle_notify(recipient, args),
        };
        tracing::info!(subscriber = %recipient, ?command, "command handled");
        reply
    }

    fn handle_notify(&self, id: &SubscriberId, args: &NotifyArgs) -> String {
        let registry = self.notifiers();
        let mut lines: Vec<String> = Vec::new();
        if args.is_empty() {
            lines.push(NOTIFY_USAGE.to_string());
        }
        if let Some(on) = args.notifications {
            match registry.set_enabled(id, on) {
                Ok(Enablement::Started) => lines.push(format!("Notifications started for {id}.")),
                Ok(Enablement::Stopped) => lines.push(format!("Notifications stopped for {id}.")),
                Ok(Enablement::AlreadyRunning | Enablement::NotRunning) => {}
                Err(e) => lines.push(format!("Error: {e}")),
            }
        }
        let mut push_err = |r: crate::error::Result<_>| {
            if let Err(e) = r {
                lines.push(format!("Error: {e}"));
            }
        };
        if let Some(on) = args.alarm {
            push_err(registry.set_alarm_enabled(id, on));
        }
        if let Some(rate) = args.refresh_rate {
            push_err(registry.set_refresh_rate(id, rate));
        }
        if let Some(level) = args.alarm_level_l {
            push_err(registry.set_alarm_level(id, level));
        }
        if let Some(interval) = args.poll_interval {
            push_err(registry.set_poll_interval(id, interval));
        }
        lines.push(match registry.status(id) {
            Some(status) => status.to_string(),
            None => NOT_SUBSCRIBED.to_string(),
        });
        lines.join("\n")
    }
}
