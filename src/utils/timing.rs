use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

/// Tracks one generation or edit attempt from launch to settlement and emits
/// the pair of timing records the `studio.timing` target collects.
#[derive(Debug)]
pub struct RequestTimer {
    operation: &'static str,
    seq: u64,
    template_id: String,
    started_at: DateTime<Utc>,
    started_perf: Instant,
}

impl RequestTimer {
    pub fn start(operation: &'static str, seq: u64, template_id: &str) -> Self {
        let timer = RequestTimer {
            operation,
            seq,
            template_id: template_id.to_string(),
            started_at: Utc::now(),
            started_perf: Instant::now(),
        };
        info!(
            target: "studio.timing",
            "event=request_started operation={} seq={} template={} started_at={}",
            timer.operation,
            timer.seq,
            timer.template_id,
            timer.started_at.to_rfc3339()
        );
        timer
    }

    pub fn settle(self, status: &str, detail: Option<&str>) {
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: "studio.timing",
            "event=request_settled operation={} seq={} template={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.operation,
            self.seq,
            self.template_id,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            status,
            detail.unwrap_or_default()
        );
    }
}

pub async fn log_model_timing<T, E, F, Fut>(
    provider: &str,
    model: &str,
    operation: &str,
    call: F,
) -> Result<T, E>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: "studio.timing",
        "event=model_request provider={} model={} operation={} started_at={}",
        provider,
        model,
        operation,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = if result.is_ok() { "success" } else { "error" };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: "studio.timing",
        "event=model_response provider={} model={} operation={} completed_at={} duration_s={:.3} status={}",
        provider,
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status
    );

    result
}
