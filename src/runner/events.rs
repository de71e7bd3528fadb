use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;

/// Lifecycle event names emitted by the collection executor, in temporal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Start,
    BeforeIteration,
    Iteration,
    BeforeItem,
    Item,
    BeforePrerequest,
    Prerequest,
    BeforeScript,
    Script,
    BeforeRequest,
    Request,
    BeforeTest,
    Test,
    BeforeAssertion,
    Assertion,
    Console,
    Exception,
    BeforeDone,
    Done,
}

impl EventKind {
    pub const ALL: [EventKind; 19] = [
        EventKind::Start,
        EventKind::BeforeIteration,
        EventKind::Iteration,
        EventKind::BeforeItem,
        EventKind::Item,
        EventKind::BeforePrerequest,
        EventKind::Prerequest,
        EventKind::BeforeScript,
        EventKind::Script,
        EventKind::BeforeRequest,
        EventKind::Request,
        EventKind::BeforeTest,
        EventKind::Test,
        EventKind::BeforeAssertion,
        EventKind::Assertion,
        EventKind::Console,
        EventKind::Exception,
        EventKind::BeforeDone,
        EventKind::Done,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::BeforeIteration => "beforeIteration",
            EventKind::Iteration => "iteration",
            EventKind::BeforeItem => "beforeItem",
            EventKind::Item => "item",
            EventKind::BeforePrerequest => "beforePrerequest",
            EventKind::Prerequest => "prerequest",
            EventKind::BeforeScript => "beforeScript",
            EventKind::Script => "script",
            EventKind::BeforeRequest => "beforeRequest",
            EventKind::Request => "request",
            EventKind::BeforeTest => "beforeTest",
            EventKind::Test => "test",
            EventKind::BeforeAssertion => "beforeAssertion",
            EventKind::Assertion => "assertion",
            EventKind::Console => "console",
            EventKind::Exception => "exception",
            EventKind::BeforeDone => "beforeDone",
            EventKind::Done => "done",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("Unknown event: {}", s))
    }
}

/// Error half of an event's `(error, args)` pair
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventError {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub message: String,
}

/// Parent folder of an item. A parent without a name counts as a failed lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParentRef {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub name: String,
    #[serde(default)]
    pub parent: Option<ParentRef>,
}

impl ItemDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: &str) -> Self {
        self.parent = Some(ParentRef {
            name: Some(parent.to_string()),
        });
        self
    }

    /// Name of the enclosing folder, if the lookup succeeds and yields a non-empty name
    pub fn parent_name(&self) -> Option<&str> {
        self.parent
            .as_ref()
            .and_then(|p| p.name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

/// Iteration cursor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub iteration: u32,
    #[serde(default)]
    pub cycles: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    #[serde(default)]
    pub response_time: Option<f64>,
    #[serde(default)]
    pub response_size: Option<f64>,
}

impl ResponseInfo {
    pub fn new(response_time: f64, response_size: f64) -> Self {
        Self {
            response_time: Some(response_time),
            response_size: Some(response_size),
        }
    }
}

/// Event-specific payload. Every field is optional; each handler reads what it needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventArgs {
    #[serde(default)]
    pub item: Option<ItemDescriptor>,
    #[serde(default)]
    pub cursor: Option<Cursor>,
    #[serde(default)]
    pub response: Option<ResponseInfo>,
    #[serde(default)]
    pub assertion: Option<String>,
}

/// One lifecycle notification from the executor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunEvent {
    #[serde(rename = "event")]
    pub kind: EventKind,
    #[serde(default)]
    pub error: Option<EventError>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: EventArgs,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl RunEvent {
    pub fn new(kind: EventKind) -> Self {
        Self {
            kind,
            error: None,
            args: EventArgs::default(),
        }
    }

    pub fn before_item(item: ItemDescriptor, cursor: Option<Cursor>) -> Self {
        let mut event = Self::new(EventKind::BeforeItem);
        event.args.item = Some(item);
        event.args.cursor = cursor;
        event
    }

    pub fn request(response: Option<ResponseInfo>) -> Self {
        let mut event = Self::new(EventKind::Request);
        event.args.response = response;
        event
    }

    pub fn assertion(label: &str, error: Option<&str>) -> Self {
        let mut event = Self::new(EventKind::Assertion);
        event.args.assertion = Some(label.to_string());
        event.error = error.map(|message| EventError {
            name: Some("AssertionError".to_string()),
            message: message.to_string(),
        });
        event
    }

    /// Decode one line of a newline-delimited event stream.
    ///
    /// Returns `Ok(None)` for event names outside the known vocabulary.
    pub fn from_json_line(line: &str) -> Result<Option<Self>, serde_json::Error> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let name = value.get("event").and_then(|v| v.as_str()).unwrap_or("");
        if let Err(reason) = name.parse::<EventKind>() {
            log::warn!("Skipping event: {}", reason);
            return Ok(None);
        }
        serde_json::from_value(value).map(Some)
    }
}

/// Event emitter for broadcasting run events to observers
pub struct EventEmitter {
    sender: broadcast::Sender<RunEvent>,
}

impl EventEmitter {
    pub fn new() -> (Self, broadcast::Receiver<RunEvent>) {
        let (sender, receiver) = broadcast::channel(100);
        (Self { sender }, receiver)
    }

    pub fn emit(&self, event: RunEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }
}

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration as StdDuration;

/// Console event listener for printing run progress
pub struct ConsoleEventListener;

impl ConsoleEventListener {
    pub async fn listen(mut receiver: broadcast::Receiver<RunEvent>) {
        use colored::Colorize;
        use indicatif::ProgressDrawTarget;
        use std::io::IsTerminal;

        let multi = if std::io::stdout().is_terminal() {
            MultiProgress::new()
        } else {
            // Piped output: no escape codes
            MultiProgress::with_draw_target(ProgressDrawTarget::hidden())
        };

        let mut spinner: Option<(ProgressBar, String, bool)> = None;

        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            };

            match event.kind {
                EventKind::Start => {
                    println!("\n{} Run started", "▶".green().bold());
                }

                EventKind::BeforeItem => {
                    if let Some((pb, name, failed)) = spinner.take() {
                        finish_item(&pb, &name, failed);
                    }

                    let name = event
                        .args
                        .item
                        .as_ref()
                        .map(|item| item.name.clone())
                        .unwrap_or_default();

                    let pb = multi.add(ProgressBar::new_spinner());
                    let style = ProgressStyle::default_spinner()
                        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                        .template("  {spinner} {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner());
                    pb.set_style(style);
                    pb.set_message(format!("{}... ", name.dimmed()));
                    pb.enable_steady_tick(StdDuration::from_millis(100));

                    spinner = Some((pb, name, false));
                }

                EventKind::Request => match event.args.response {
                    Some(ResponseInfo {
                        response_time: Some(time),
                        response_size: Some(size),
                    }) => {
                        multi
                            .println(format!("      Response: {}ms, {}B", time, size))
                            .ok();
                    }
                    _ => {
                        multi
                            .println(format!("      {} No response received", "⚠".yellow()))
                            .ok();
                    }
                },

                EventKind::Assertion => {
                    if let Some(error) = &event.error {
                        if let Some((_, _, failed)) = spinner.as_mut() {
                            *failed = true;
                        }
                        let label = event.args.assertion.as_deref().unwrap_or("assertion");
                        multi
                            .println(format!(
                                "      {} {}: {}",
                                "✗".red(),
                                label,
                                error.message.red()
                            ))
                            .ok();
                    }
                }

                EventKind::Done => {
                    if let Some((pb, name, failed)) = spinner.take() {
                        finish_item(&pb, &name, failed);
                    }
                    println!("\n{} Run finished", "■".blue().bold());
                }

                _ => {}
            }
        }
    }
}

fn finish_item(pb: &ProgressBar, name: &str, failed: bool) {
    use colored::Colorize;

    pb.finish_and_clear();
    if failed {
        println!("  {} {}", "✗".red(), name);
    } else {
        println!("  {} {}", "✓".green(), name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_match_vocabulary() {
        let names: Vec<&str> = EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names.join(" "),
            "start beforeIteration iteration beforeItem item beforePrerequest prerequest \
             beforeScript script beforeRequest request beforeTest test beforeAssertion \
             assertion console exception beforeDone done"
        );
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert!("teardown".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_decode_before_item_line() {
        let line = r#"{"event":"beforeItem","error":null,"args":{"item":{"name":"Get user","parent":{"name":"Users"}},"cursor":{"iteration":2,"cycles":3,"position":0}}}"#;
        let event = RunEvent::from_json_line(line).unwrap().unwrap();

        assert_eq!(event.kind, EventKind::BeforeItem);
        assert!(event.error.is_none());
        let item = event.args.item.unwrap();
        assert_eq!(item.name, "Get user");
        assert_eq!(item.parent_name(), Some("Users"));
        assert_eq!(
            event.args.cursor,
            Some(Cursor {
                iteration: 2,
                cycles: 3
            })
        );
    }

    #[test]
    fn test_decode_request_without_response() {
        let line = r#"{"event":"request","error":{"message":"ECONNREFUSED"},"args":{"response":null}}"#;
        let event = RunEvent::from_json_line(line).unwrap().unwrap();

        assert_eq!(event.kind, EventKind::Request);
        assert_eq!(event.error.unwrap().message, "ECONNREFUSED");
        assert!(event.args.response.is_none());
    }

    #[test]
    fn test_decode_null_args() {
        let line = r#"{"event":"done","error":null,"args":null}"#;
        let event = RunEvent::from_json_line(line).unwrap().unwrap();

        assert_eq!(event.kind, EventKind::Done);
        assert_eq!(event.args, EventArgs::default());

        let line = r#"{"event":"done"}"#;
        let event = RunEvent::from_json_line(line).unwrap().unwrap();
        assert_eq!(event.args, EventArgs::default());
    }

    #[test]
    fn test_decode_unknown_event_is_skipped() {
        let line = r#"{"event":"teardown","args":{}}"#;
        assert!(RunEvent::from_json_line(line).unwrap().is_none());
    }

    #[test]
    fn test_decode_invalid_json_fails() {
        assert!(RunEvent::from_json_line("{not json").is_err());
    }

    #[test]
    fn test_parent_without_name_is_failed_lookup() {
        let item = ItemDescriptor {
            name: "ping".to_string(),
            parent: Some(ParentRef { name: None }),
        };
        assert_eq!(item.parent_name(), None);
        assert_eq!(ItemDescriptor::new("ping").with_parent("").parent_name(), None);
    }
}
