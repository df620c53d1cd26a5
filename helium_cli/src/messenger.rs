//! Stdout transport used by `helium run`.

use helium_traits::{BoxError, Messenger, SubscriberId};
use std::io::Write;

/// Prints each message as one line; JSON objects under `--json`.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleMessenger {
    json: bool,
}

impl ConsoleMessenger {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn render(&self, recipient: &SubscriberId, text: &str, audible: bool) -> String {
        if self.json {
            serde_json::json!({
                "recipient": recipient.as_str(),
                "text": text,
                "audible": audible,
            })
            .to_string()
        } else if audible {
            format!("[{recipient}] ALARM {text}")
        } else {
            format!("[{recipient}] {text}")
        }
    }
}

impl Messenger for ConsoleMessenger {
    fn send_message(
        &self,
        recipient: &SubscriberId,
        text: &str,
        audible: bool,
    ) -> Result<(), BoxError> {
        let line = self.render(recipient, text, audible);
        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lines_mark_alarms() {
        let m = ConsoleMessenger::new(false);
        let id = SubscriberId::from("42");
        assert_eq!(m.render(&id, "low", true), "[42] ALARM low");
        assert_eq!(m.render(&id, "ok", false), "[42] ok");
    }

    #[test]
    fn json_lines_carry_all_fields() {
        let m = ConsoleMessenger::new(true);
        let v: serde_json::Value =
            serde_json::from_str(&m.render(&SubscriberId::from("7"), "x", true)).unwrap();
        assert_eq!(v["recipient"], "7");
        assert_eq!(v["text"], "x");
        assert_eq!(v["audible"], true);
    }
}
