use super::types::Report;
use crate::runner::state::{RunAccumulator, RunContext};
use chrono::{DateTime, SecondsFormat, Utc};

pub struct ReportBuilder;

impl ReportBuilder {
    /// Build the run report, taking now as the completion time
    pub fn build(context: &RunContext, accumulator: &RunAccumulator) -> Report {
        Self::build_at(context, accumulator, Utc::now())
    }

    pub fn build_at(
        context: &RunContext,
        accumulator: &RunAccumulator,
        finished_at: DateTime<Utc>,
    ) -> Report {
        let elapsed_ms = (finished_at - context.started_at).num_milliseconds().abs();

        Report {
            product: context.product.clone(),
            component: context.component.clone(),
            environment: context.environment.clone(),
            date: context
                .started_at
                .to_rfc3339_opts(SecondsFormat::Millis, true),
            duration_seconds: elapsed_ms as f64 / 1000.0,
            success: accumulator.overall_passed(),
            avg_response_time_ms: accumulator.avg_response_time(),
            avg_response_size_bytes: accumulator.avg_response_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::events::{EventError, ResponseInfo};
    use chrono::{Duration, TimeZone};

    fn context() -> RunContext {
        let mut context = RunContext::new("Shop", "checkout-api", "QA", "Shop API", None);
        context.started_at = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        context
    }

    #[test]
    fn test_build_empty_run() {
        let context = context();
        let finished = context.started_at + Duration::milliseconds(1500);
        let report = ReportBuilder::build_at(&context, &RunAccumulator::new(), finished);

        assert_eq!(report.product, "Shop");
        assert_eq!(report.component, "checkout-api");
        assert_eq!(report.environment, "QA");
        assert_eq!(report.date, "2024-01-01T10:00:00.000Z");
        assert_eq!(report.duration_seconds, 1.5);
        assert!(report.success);
        assert_eq!(report.avg_response_time_ms, 0.0);
        assert_eq!(report.avg_response_size_bytes, 0.0);
    }

    #[test]
    fn test_duration_is_absolute() {
        let context = context();
        let skewed = context.started_at - Duration::milliseconds(2250);
        let report = ReportBuilder::build_at(&context, &RunAccumulator::new(), skewed);
        assert_eq!(report.duration_seconds, 2.25);
    }

    #[test]
    fn test_build_uses_accumulated_state() {
        let context = context();
        let mut acc = RunAccumulator::new();
        acc.record_response(Some(&ResponseInfo::new(100.0, 10.0)));
        acc.record_response(Some(&ResponseInfo::new(300.0, 30.0)));
        acc.record_assertion(
            Some(&EventError {
                name: None,
                message: "boom".to_string(),
            }),
            None,
        );

        let finished = context.started_at + Duration::seconds(3);
        let report = ReportBuilder::build_at(&context, &acc, finished);

        assert!(!report.success);
        assert_eq!(report.avg_response_time_ms, 200.0);
        assert_eq!(report.avg_response_size_bytes, 20.0);
        assert_eq!(report.duration_seconds, 3.0);
        // anchored to the start, not the completion time
        assert_eq!(report.date, "2024-01-01T10:00:00.000Z");
    }
}
