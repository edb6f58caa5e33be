//! Smoke test extension.
//!
//! `mute <word>...` withholds outgoing chat containing any of the words,
//! `unmute <word>...` lifts that again. Every inbound message is counted
//! and `stats` reports the count through the chat filter: the next line
//! is dropped if at least one message has been seen.

use std::path::Path;

use parlor_extension_sdk::prelude::*;

struct Smoke {
    muted: Vec<String>,
    messages: usize,
    report: bool,
}

impl Extension for Smoke {
    fn start(_host: HostRef<'_>, path: &Path) -> Option<Self> {
        path.exists().then(|| Smoke {
            muted: Vec::new(),
            messages: 0,
            report: false,
        })
    }

    fn on_message(&mut self, _host: HostRef<'_>, _msg: &WireMessage) {
        self.messages += 1;
    }

    fn on_command(&mut self, _host: HostRef<'_>, cmd: &WireCommand) {
        let params: Vec<&str> = unsafe { cmd.params() }
            .iter()
            .filter_map(|p| unsafe { p.as_str() })
            .collect();
        match params.split_first() {
            Some((&"mute", words)) => self.muted.extend(words.iter().map(|w| w.to_string())),
            Some((&"unmute", words)) => self.muted.retain(|m| !words.contains(&m.as_str())),
            Some((&"stats", _)) => self.report = true,
            _ => {}
        }
    }

    fn on_chat(&mut self, _host: HostRef<'_>, chat: &WireChat) -> ProcessResult {
        if std::mem::take(&mut self.report) && self.messages > 0 {
            return ProcessResult::Drop;
        }
        let text = unsafe { chat.message.as_str() }.unwrap_or_default();
        if self.muted.iter().any(|word| text.contains(word.as_str())) {
            ProcessResult::Drop
        } else {
            ProcessResult::Pass
        }
    }
}

declare_extension!(Smoke, "smoke", 3, 4);
