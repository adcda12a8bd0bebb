//! Metrics collection for the portal.
//!
//! Process-local counters for request traffic, the auth flow and report
//! intake, exported in Prometheus text format.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

/// Global metrics instance.
static METRICS: std::sync::OnceLock<Arc<Metrics>> = std::sync::OnceLock::new();

/// Get the global metrics instance.
pub fn get_metrics() -> &'static Arc<Metrics> {
    METRICS.get_or_init(|| Arc::new(Metrics::new()))
}

/// Application metrics collector.
#[derive(Debug, Default)]
pub struct Metrics {
    // === Request Metrics ===
    /// Total HTTP requests received
    pub http_requests_total: AtomicU64,
    /// Active HTTP requests
    pub http_requests_active: AtomicU64,
    /// HTTP requests by status code category (2xx, 4xx, 5xx)
    pub http_requests_2xx: AtomicU64,
    pub http_requests_4xx: AtomicU64,
    pub http_requests_5xx: AtomicU64,
    /// Total request latency in microseconds
    pub http_request_latency_us_total: AtomicU64,

    // === Auth Metrics ===
    /// Accounts created
    pub users_registered: AtomicU64,
    /// Successful logins
    pub logins_succeeded: AtomicU64,
    /// Rejected logins
    pub logins_failed: AtomicU64,
    /// OTP codes issued
    pub otp_issued: AtomicU64,
    /// OTP verifications that failed
    pub otp_failed: AtomicU64,
    /// Requests rejected by the rate limiter
    pub rate_limited: AtomicU64,

    // === Report Metrics ===
    /// Complaints filed
    pub complaints_filed: AtomicU64,
    /// Complaint status changes made by officials
    pub complaint_status_changes: AtomicU64,
    /// Suspicious entity reports filed
    pub suspicious_reports_filed: AtomicU64,
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub http_requests_total: u64,
    pub http_requests_active: u64,
    pub http_requests_2xx: u64,
    pub http_requests_4xx: u64,
    pub http_requests_5xx: u64,
    pub http_request_latency_avg_us: u64,
    pub users_registered: u64,
    pub logins_succeeded: u64,
    pub logins_failed: u64,
    pub otp_issued: u64,
    pub otp_failed: u64,
    pub rate_limited: u64,
    pub complaints_filed: u64,
    pub complaint_status_changes: u64,
    pub suspicious_reports_filed: u64,
}

impl Metrics {
    /// Create a new metrics instance with all counters at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            http_requests_total: AtomicU64::new(0),
            http_requests_active: AtomicU64::new(0),
            http_requests_2xx: AtomicU64::new(0),
            http_requests_4xx: AtomicU64::new(0),
            http_requests_5xx: AtomicU64::new(0),
            http_request_latency_us_total: AtomicU64::new(0),

            users_registered: AtomicU64::new(0),
            logins_succeeded: AtomicU64::new(0),
            logins_failed: AtomicU64::new(0),
            otp_issued: AtomicU64::new(0),
            otp_failed: AtomicU64::new(0),
            rate_limited: AtomicU64::new(0),

            complaints_filed: AtomicU64::new(0),
            complaint_status_changes: AtomicU64::new(0),
            suspicious_reports_filed: AtomicU64::new(0),
        }
    }

    /// Record a finished HTTP request.
    pub fn record_http_request(&self, status_code: u16, latency: Duration) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);

        match status_code {
            200..=299 => self.http_requests_2xx.fetch_add(1, Ordering::Relaxed),
            400..=499 => self.http_requests_4xx.fetch_add(1, Ordering::Relaxed),
            500..=599 => self.http_requests_5xx.fetch_add(1, Ordering::Relaxed),
            _ => 0,
        };

        self.http_request_latency_us_total
            .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
    }

    /// Start tracking an active request.
    pub fn start_request(&self) {
        self.http_requests_active.fetch_add(1, Ordering::Relaxed);
    }

    /// End tracking an active request.
    pub fn end_request(&self) {
        self.http_requests_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a login attempt.
    pub fn record_login(&self, success: bool) {
        if success {
            self.logins_succeeded.fetch_add(1, Ordering::Relaxed);
        } else {
            self.logins_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Increment a single counter.
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            http_requests_total: self.http_requests_total.load(Ordering::Relaxed),
            http_requests_active: self.http_requests_active.load(Ordering::Relaxed),
            http_requests_2xx: self.http_requests_2xx.load(Ordering::Relaxed),
            http_requests_4xx: self.http_requests_4xx.load(Ordering::Relaxed),
            http_requests_5xx: self.http_requests_5xx.load(Ordering::Relaxed),
            http_request_latency_avg_us: self.average_latency_us(),
            users_registered: self.users_registered.load(Ordering::Relaxed),
            logins_succeeded: self.logins_succeeded.load(Ordering::Relaxed),
            logins_failed: self.logins_failed.load(Ordering::Relaxed),
            otp_issued: self.otp_issued.load(Ordering::Relaxed),
            otp_failed: self.otp_failed.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            complaints_filed: self.complaints_filed.load(Ordering::Relaxed),
            complaint_status_changes: self.complaint_status_changes.load(Ordering::Relaxed),
            suspicious_reports_filed: self.suspicious_reports_filed.load(Ordering::Relaxed),
        }
    }

    fn average_latency_us(&self) -> u64 {
        let total = self.http_request_latency_us_total.load(Ordering::Relaxed);
        let count = self.http_requests_total.load(Ordering::Relaxed);
        if count > 0 {
            total / count
        } else {
            0
        }
    }

    /// Export metrics in Prometheus format.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let s = self.snapshot();
        let mut output = String::new();

        let mut metric = |name: &str, kind: &str, help: &str, value: u64| {
            output.push_str(&format!("# HELP cyberguard_{name} {help}\n"));
            output.push_str(&format!("# TYPE cyberguard_{name} {kind}\n"));
            output.push_str(&format!("cyberguard_{name} {value}\n"));
        };

        metric("http_requests_total", "counter", "Total HTTP requests", s.http_requests_total);
        metric("http_requests_active", "gauge", "Active HTTP requests", s.http_requests_active);
        metric(
            "http_request_latency_avg_us",
            "gauge",
            "Average request latency",
            s.http_request_latency_avg_us,
        );
        metric("users_registered_total", "counter", "Accounts created", s.users_registered);
        metric("logins_succeeded_total", "counter", "Successful logins", s.logins_succeeded);
        metric("logins_failed_total", "counter", "Rejected logins", s.logins_failed);
        metric("otp_issued_total", "counter", "OTP codes issued", s.otp_issued);
        metric("otp_failed_total", "counter", "Failed OTP verifications", s.otp_failed);
        metric("rate_limited_total", "counter", "Rate limited requests", s.rate_limited);
        metric("complaints_filed_total", "counter", "Complaints filed", s.complaints_filed);
        metric(
            "complaint_status_changes_total",
            "counter",
            "Complaint status changes",
            s.complaint_status_changes,
        );
        metric(
            "suspicious_reports_filed_total",
            "counter",
            "Suspicious entity reports filed",
            s.suspicious_reports_filed,
        );

        output.push_str("# HELP cyberguard_http_requests_by_status HTTP requests by status\n");
        output.push_str("# TYPE cyberguard_http_requests_by_status counter\n");
        output.push_str(&format!(
            "cyberguard_http_requests_by_status{{status=\"2xx\"}} {}\n",
            s.http_requests_2xx
        ));
        output.push_str(&format!(
            "cyberguard_http_requests_by_status{{status=\"4xx\"}} {}\n",
            s.http_requests_4xx
        ));
        output.push_str(&format!(
            "cyberguard_http_requests_by_status{{status=\"5xx\"}} {}\n",
            s.http_requests_5xx
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_http_request() {
        let metrics = Metrics::new();
        metrics.record_http_request(200, Duration::from_micros(100));
        metrics.record_http_request(404, Duration::from_micros(300));
        metrics.record_http_request(500, Duration::from_micros(200));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.http_requests_total, 3);
        assert_eq!(snapshot.http_requests_2xx, 1);
        assert_eq!(snapshot.http_requests_4xx, 1);
        assert_eq!(snapshot.http_requests_5xx, 1);
        assert_eq!(snapshot.http_request_latency_avg_us, 200);
    }

    #[test]
    fn test_active_requests() {
        let metrics = Metrics::new();
        metrics.start_request();
        metrics.start_request();
        metrics.end_request();
        assert_eq!(metrics.snapshot().http_requests_active, 1);
    }

    #[test]
    fn test_login_counters() {
        let metrics = Metrics::new();
        metrics.record_login(true);
        metrics.record_login(false);
        metrics.record_login(false);
        Metrics::incr(&metrics.complaints_filed);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.logins_succeeded, 1);
        assert_eq!(snapshot.logins_failed, 2);
        assert_eq!(snapshot.complaints_filed, 1);
    }

    #[test]
    fn test_prometheus_format() {
        let metrics = Metrics::new();
        Metrics::incr(&metrics.users_registered);

        let output = metrics.to_prometheus();
        assert!(output.contains("# TYPE cyberguard_users_registered_total counter"));
        assert!(output.contains("cyberguard_users_registered_total 1"));
        assert!(output.contains("cyberguard_http_requests_by_status{status=\"2xx\"} 0"));
    }
}
