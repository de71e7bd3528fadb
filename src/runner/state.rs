use super::events::{EventError, ResponseInfo};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Run-level configuration, frozen before the first event arrives
#[derive(Debug, Clone, PartialEq)]
pub struct RunContext {
    pub started_at: DateTime<Utc>,
    pub product: String,
    pub component: String,
    pub environment: String,
    pub collection_name: String,
    pub report_endpoint: Option<String>,
}

impl RunContext {
    pub fn new(
        product: &str,
        component: &str,
        environment: &str,
        collection_name: &str,
        report_endpoint: Option<&str>,
    ) -> Self {
        Self {
            started_at: Utc::now(),
            product: product.to_string(),
            component: component.to_string(),
            environment: environment.to_string(),
            collection_name: collection_name.to_string(),
            report_endpoint: report_endpoint.map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RunPhase {
    Idle,
    Running,
    Completed,
}

/// The item presently executing
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentItem {
    pub name: String,
    pub passed: bool,
    pub failed_assertions: Vec<String>,
}

impl CurrentItem {
    pub fn new(name: String) -> Self {
        Self {
            name,
            passed: true,
            failed_assertions: Vec::new(),
        }
    }

    fn fail(&mut self, descriptor: String) {
        self.passed = false;
        self.failed_assertions.push(descriptor);
    }
}

/// What a `request` event did to the response samples
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleUpdate {
    Appended { response_time: f64, response_size: f64 },
    /// Missing or incomplete response; all samples were discarded
    Reset { discarded: usize },
}

/// Mutable state of one run.
///
/// Response-time and response-size samples always have the same length, and
/// `overall_passed` never goes back to `true` once cleared.
#[derive(Debug, Clone)]
pub struct RunAccumulator {
    phase: RunPhase,
    overall_passed: bool,
    response_time_samples: Vec<f64>,
    response_size_samples: Vec<f64>,
    current_item: Option<CurrentItem>,
    items: u32,
    failed_items: u32,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self {
            phase: RunPhase::Idle,
            overall_passed: true,
            response_time_samples: Vec::new(),
            response_size_samples: Vec::new(),
            current_item: None,
            items: 0,
            failed_items: 0,
        }
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Idle -> Running. Returns false if the run was already started.
    pub fn begin(&mut self) -> bool {
        if self.phase != RunPhase::Idle {
            return false;
        }
        self.phase = RunPhase::Running;
        true
    }

    /// Running -> Completed. Returns false unless the run was running.
    pub fn complete(&mut self) -> bool {
        if self.phase != RunPhase::Running {
            return false;
        }
        self.phase = RunPhase::Completed;
        true
    }

    pub fn begin_item(&mut self, name: String) -> &CurrentItem {
        self.items += 1;
        self.current_item.insert(CurrentItem::new(name))
    }

    pub fn record_response(&mut self, response: Option<&ResponseInfo>) -> SampleUpdate {
        match response {
            Some(ResponseInfo {
                response_time: Some(response_time),
                response_size: Some(response_size),
            }) => {
                self.response_time_samples.push(*response_time);
                self.response_size_samples.push(*response_size);
                SampleUpdate::Appended {
                    response_time: *response_time,
                    response_size: *response_size,
                }
            }
            _ => {
                let discarded = self.response_time_samples.len();
                self.response_time_samples.clear();
                self.response_size_samples.clear();
                SampleUpdate::Reset { discarded }
            }
        }
    }

    /// Apply an assertion result. Returns true if it was a failure.
    pub fn record_assertion(&mut self, error: Option<&EventError>, label: Option<&str>) -> bool {
        let Some(error) = error else {
            return false;
        };

        self.overall_passed = false;

        if let Some(item) = self.current_item.as_mut() {
            if item.passed {
                self.failed_items += 1;
            }
            let descriptor = match label {
                Some(label) => format!("{}: {}", label, error.message),
                None => error.message.clone(),
            };
            item.fail(descriptor);
        }
        true
    }

    pub fn overall_passed(&self) -> bool {
        self.overall_passed
    }

    pub fn current_item(&self) -> Option<&CurrentItem> {
        self.current_item.as_ref()
    }

    pub fn response_time_samples(&self) -> &[f64] {
        &self.response_time_samples
    }

    pub fn response_size_samples(&self) -> &[f64] {
        &self.response_size_samples
    }

    pub fn avg_response_time(&self) -> f64 {
        average(&self.response_time_samples)
    }

    pub fn avg_response_size(&self) -> f64 {
        average(&self.response_size_samples)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            phase: self.phase,
            passed: self.overall_passed,
            items: self.items,
            failed_items: self.failed_items,
            samples: self.response_time_samples.len(),
            avg_response_time_ms: self.avg_response_time(),
            avg_response_size_bytes: self.avg_response_size(),
        }
    }
}

impl Default for RunAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

fn average(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    samples.iter().sum::<f64>() / samples.len() as f64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub phase: RunPhase,
    pub passed: bool,
    pub items: u32,
    pub failed_items: u32,
    pub samples: usize,
    pub avg_response_time_ms: f64,
    pub avg_response_size_bytes: f64,
}
