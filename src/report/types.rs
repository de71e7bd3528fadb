use serde::{Deserialize, Serialize};

/// Aggregate record for one completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub product: String,
    pub component: String,
    pub environment: String,
    /// ISO-8601 instant of run start
    pub date: String,
    pub duration_seconds: f64,
    pub success: bool,
    pub avg_response_time_ms: f64,
    pub avg_response_size_bytes: f64,
}

impl Report {
    pub fn to_wire(&self) -> WireReport<'_> {
        WireReport {
            product: &self.product,
            component: &self.component,
            environment: &self.environment,
            duration: self.duration_seconds,
            avg_response_size: self.avg_response_size_bytes,
            avg_response_time: self.avg_response_time_ms,
            success: u8::from(self.success),
            date: &self.date,
            false_code: 0,
            true_code: 1,
        }
    }
}

/// Dashboard row shape. `success` is encoded as 0/1, and the fixed
/// `"false": 0, "true": 1` pair tells the dashboard how to decode it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireReport<'a> {
    pub product: &'a str,
    pub component: &'a str,
    pub environment: &'a str,
    pub duration: f64,
    pub avg_response_size: f64,
    pub avg_response_time: f64,
    pub success: u8,
    pub date: &'a str,
    #[serde(rename = "false")]
    pub false_code: u8,
    #[serde(rename = "true")]
    pub true_code: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let report = Report {
            product: "Shop".to_string(),
            component: "checkout-api".to_string(),
            environment: "QA".to_string(),
            date: "2024-01-01T10:00:00.000Z".to_string(),
            duration_seconds: 12.5,
            success: false,
            avg_response_time_ms: 120.0,
            avg_response_size_bytes: 512.0,
        };

        let json = serde_json::to_value([report.to_wire()]).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{
                "product": "Shop",
                "component": "checkout-api",
                "environment": "QA",
                "duration": 12.5,
                "avgResponseSize": 512.0,
                "avgResponseTime": 120.0,
                "success": 0,
                "date": "2024-01-01T10:00:00.000Z",
                "false": 0,
                "true": 1
            }])
        );
    }
}
