use crate::status::StatusLevel;

/// Responses slower than this are reported as degraded.
pub const DEGRADED_THRESHOLD_MS: u64 = 2000;

/// Status code recorded for probes that never got a response.
pub const UNREACHABLE_STATUS_CODE: u16 = 0;

/// Map an HTTP response onto a severity tier.
///
/// 5xx and unreachable targets are a major outage. Client errors other than
/// 404 are a partial outage; a missing route on the upstream is tolerated.
/// Anything else is judged on latency alone.
pub fn classify(status_code: u16, response_time_ms: u64) -> StatusLevel {
    if status_code >= 500 || status_code == UNREACHABLE_STATUS_CODE {
        return StatusLevel::MajorOutage;
    }
    if (400..500).contains(&status_code) && status_code != 404 {
        return StatusLevel::PartialOutage;
    }
    if response_time_ms > DEGRADED_THRESHOLD_MS {
        return StatusLevel::Degraded;
    }
    StatusLevel::Operational
}
