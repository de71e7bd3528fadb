use super::events::{EventKind, RunEvent};
use super::naming::resolve_name;
use super::state::{RunAccumulator, RunContext, RunPhase, RunSummary, SampleUpdate};
use crate::report::{HttpTransport, Report, ReportBuilder, ReportSender, ReportTransport, SendOutcome};

/// What `done` does with the built report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    Send,
    DryRun,
}

/// Result of handling one event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Applied,
    Ignored,
    Complete,
}

#[derive(Debug)]
pub struct Completion {
    pub report: Report,
    /// `None` in dry-run mode
    pub outcome: Option<SendOutcome>,
}

/// Routes run events into the accumulator and reports once on `done`
pub struct Reporter<T = HttpTransport> {
    context: RunContext,
    accumulator: RunAccumulator,
    sender: ReportSender<T>,
    mode: DeliveryMode,
}

impl Reporter<HttpTransport> {
    pub fn http(context: RunContext, mode: DeliveryMode) -> Self {
        Self::new(context, ReportSender::http(), mode)
    }
}

impl<T: ReportTransport> Reporter<T> {
    pub fn new(context: RunContext, sender: ReportSender<T>, mode: DeliveryMode) -> Self {
        Self {
            context,
            accumulator: RunAccumulator::new(),
            sender,
            mode,
        }
    }

    pub fn context(&self) -> &RunContext {
        &self.context
    }

    pub fn accumulator(&self) -> &RunAccumulator {
        &self.accumulator
    }

    pub fn sender(&self) -> &ReportSender<T> {
        &self.sender
    }

    pub fn summary(&self) -> RunSummary {
        self.accumulator.summary()
    }

    /// Handle one event, reporting if it completes the run
    pub async fn dispatch(&mut self, event: &RunEvent) -> Option<Completion> {
        match self.handle(event) {
            Step::Complete => Some(self.complete().await),
            _ => None,
        }
    }

    /// Apply the synchronous part of an event
    pub fn handle(&mut self, event: &RunEvent) -> Step {
        match self.accumulator.phase() {
            RunPhase::Completed => {
                log::debug!("Run already reported, ignoring '{}'", event.kind);
                return Step::Ignored;
            }
            RunPhase::Idle if event.kind != EventKind::Start => {
                log::warn!("Ignoring '{}' received before run start", event.kind);
                return Step::Ignored;
            }
            _ => {}
        }

        match event.kind {
            EventKind::Start => self.on_start(),
            EventKind::BeforeItem => self.on_before_item(event),
            EventKind::Request => self.on_request(event),
            EventKind::Assertion => self.on_assertion(event),
            EventKind::Done => self.on_done(),
            _ => Step::Ignored,
        }
    }

    fn on_start(&mut self) -> Step {
        if !self.accumulator.begin() {
            log::warn!("Run already started");
            return Step::Ignored;
        }
        log::info!("Currently running {}", self.context.collection_name);
        Step::Applied
    }

    fn on_before_item(&mut self, event: &RunEvent) -> Step {
        let Some(item) = event.args.item.as_ref() else {
            log::warn!("beforeItem without item descriptor");
            return Step::Ignored;
        };

        let name = resolve_name(item, event.args.cursor.as_ref(), &self.context.collection_name);
        let item = self.accumulator.begin_item(name);
        log::info!(
            "[testStarted name='{}' captureStandardOutput='true'",
            item.name
        );
        Step::Applied
    }

    fn on_request(&mut self, event: &RunEvent) -> Step {
        match self.accumulator.record_response(event.args.response.as_ref()) {
            SampleUpdate::Appended {
                response_time,
                response_size,
            } => {
                log::debug!("Response time: {}ms, size: {}B", response_time, response_size);
            }
            SampleUpdate::Reset { discarded } => {
                log::warn!(
                    "Missing response, discarded {} response samples",
                    discarded
                );
            }
        }
        Step::Applied
    }

    fn on_assertion(&mut self, event: &RunEvent) -> Step {
        let failed = self
            .accumulator
            .record_assertion(event.error.as_ref(), event.args.assertion.as_deref());

        if failed {
            match self.accumulator.current_item() {
                Some(item) => log::warn!(
                    "Assertion failed in '{}': {:?}",
                    item.name,
                    item.failed_assertions
                ),
                None => log::warn!("Assertion failed outside of an item"),
            }
        }
        Step::Applied
    }

    fn on_done(&mut self) -> Step {
        self.accumulator.complete();
        let summary = self.accumulator.summary();
        log::info!(
            "Run finished: {} items, {} failed, {} response samples",
            summary.items,
            summary.failed_items,
            summary.samples
        );
        Step::Complete
    }

    async fn complete(&self) -> Completion {
        let report = ReportBuilder::build(&self.context, &self.accumulator);

        let outcome = match self.mode {
            DeliveryMode::Send => Some(
                self.sender
                    .send(&report, self.context.report_endpoint.as_deref())
                    .await,
            ),
            DeliveryMode::DryRun => None,
        };

        Completion { report, outcome }
    }
}
