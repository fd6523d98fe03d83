use std::cell::RefCell;
use std::rc::Rc;

use chrono::{DateTime, Local};
use serde_json::Value;

use crate::dom::{ElementView, PageView};

pub const OUTPUT_ELEMENT_ID: &str = "output";
pub const RESULT_ELEMENT_SUFFIX: &str = "-result";

/// One line of the interaction log.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
    pub payload: Option<Value>,
}

impl TraceEntry {
    pub fn new(message: impl Into<String>, payload: Option<Value>) -> Self {
        Self::at(Local::now(), message, payload)
    }

    pub fn at(timestamp: DateTime<Local>, message: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            payload,
        }
    }

    #[must_use]
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// `[HH:MM:SS] message`, followed by the pretty-printed payload on the
    /// next lines when there is one.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.payload {
            Some(payload) => format!(
                "[{}] {}\n{}",
                self.time_label(),
                self.message,
                pretty_json(payload)
            ),
            None => format!("[{}] {}", self.time_label(), self.message),
        }
    }
}

#[must_use]
pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Append-only destination for trace entries.
pub trait TraceSink {
    fn append(&self, entry: &TraceEntry);
}

#[derive(Debug, Default)]
pub struct MemoryTraceSink {
    entries: RefCell<Vec<TraceEntry>>,
}

impl MemoryTraceSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries in the order they were appended.
    #[must_use]
    pub fn entries(&self) -> Vec<TraceEntry> {
        self.entries.borrow().clone()
    }

    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.entries
            .borrow()
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    #[must_use]
    pub fn last(&self) -> Option<TraceEntry> {
        self.entries.borrow().last().cloned()
    }
}

impl TraceSink for MemoryTraceSink {
    fn append(&self, entry: &TraceEntry) {
        self.entries.borrow_mut().push(entry.clone());
    }
}

/// Writes entries newest-first into the text of one page element.
///
/// Does nothing while the element is missing. The accumulated text is never
/// truncated.
#[derive(Debug)]
pub struct PageLogSink<P> {
    page: Rc<P>,
    element_id: String,
}

impl<P: PageView> PageLogSink<P> {
    pub fn new(page: Rc<P>) -> Self {
        Self::with_element_id(page, OUTPUT_ELEMENT_ID)
    }

    pub fn with_element_id(page: Rc<P>, element_id: impl Into<String>) -> Self {
        Self {
            page,
            element_id: element_id.into(),
        }
    }
}

impl<P: PageView> TraceSink for PageLogSink<P> {
    fn append(&self, entry: &TraceEntry) {
        let Some(output) = self.page.element_by_id(&self.element_id) else {
            return;
        };
        let previous = output.text();
        output.set_text(&format!("{}\n\n{}", entry.render(), previous));
    }
}

/// Fans trace entries out to every registered sink.
#[derive(Default, Clone)]
pub struct Presenter {
    sinks: Vec<Rc<dyn TraceSink>>,
}

impl Presenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Rc<dyn TraceSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Rc<dyn TraceSink>) {
        self.sinks.push(sink);
    }

    pub fn present(&self, message: impl Into<String>, payload: Option<Value>) -> TraceEntry {
        let entry = TraceEntry::new(message, payload);
        for sink in &self.sinks {
            sink.append(&entry);
        }
        entry
    }

    /// Replaces the text of `#<pattern_id>-result` with the timestamped data
    /// and logs it as `[PATTERN_ID]`.
    pub fn present_pattern_result<P: PageView>(
        &self,
        page: &P,
        pattern_id: &str,
        data: Value,
    ) -> TraceEntry {
        let entry = TraceEntry::new(format!("[{}]", pattern_id.to_uppercase()), Some(data));
        write_result_panel(page, pattern_id, &entry);
        for sink in &self.sinks {
            sink.append(&entry);
        }
        entry
    }
}

/// Overwrites `#<pattern_id>-result` with the entry's time and payload.
/// Strings are written verbatim. Returns false when the panel is missing.
pub fn write_result_panel<P: PageView>(page: &P, pattern_id: &str, entry: &TraceEntry) -> bool {
    let Some(panel) = page.element_by_id(&format!("{pattern_id}{RESULT_ELEMENT_SUFFIX}")) else {
        return false;
    };
    let text = match &entry.payload {
        Some(Value::String(text)) => text.clone(),
        Some(value) => pretty_json(value),
        None => entry.message.clone(),
    };
    panel.set_text(&format!("[{}] {}", entry.time_label(), text));
    true
}

impl std::fmt::Debug for Presenter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Presenter")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
