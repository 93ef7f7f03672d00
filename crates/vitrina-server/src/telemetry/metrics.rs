use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

const MAX_LATENCY_SAMPLES: usize = 4096;

/// Request counters plus a bounded latency reservoir, rendered as a plain
/// text exposition on `/metrics`.
#[derive(Default)]
pub struct RequestMetrics {
    counts: Mutex<HashMap<(String, u16), u64>>,
    latency_ns: Mutex<Vec<u64>>,
}

impl RequestMetrics {
    pub fn observe_request(&self, route: &str, status: u16, elapsed: Duration) {
        if let Ok(mut counts) = self.counts.lock() {
            *counts.entry((route.to_string(), status)).or_insert(0) += 1;
        }
        if let Ok(mut latency) = self.latency_ns.lock() {
            if latency.len() >= MAX_LATENCY_SAMPLES {
                latency.remove(0);
            }
            latency.push(elapsed.as_nanos().min(u128::from(u64::MAX)) as u64);
        }
    }

    #[must_use]
    pub fn total_requests(&self) -> u64 {
        self.counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    /// Text exposition, one `vitrina_requests_total` line per route/status
    /// pair plus latency percentiles and resolver cache counters.
    #[must_use]
    pub fn render(&self, resolver_hits: u64, resolver_misses: u64) -> String {
        let mut out = String::new();
        out.push_str("# TYPE vitrina_requests_total counter\n");
        if let Ok(counts) = self.counts.lock() {
            let mut rows: Vec<(&(String, u16), &u64)> = counts.iter().collect();
            rows.sort();
            for ((route, status), count) in rows {
                out.push_str(&format!(
                    "vitrina_requests_total{{route=\"{route}\",status=\"{status}\"}} {count}\n"
                ));
            }
        }
        out.push_str("# TYPE vitrina_request_latency_ns summary\n");
        if let Ok(latency) = self.latency_ns.lock() {
            let mut sorted = latency.clone();
            sorted.sort_unstable();
            for (label, q) in [("p50", 0.50), ("p95", 0.95), ("p99", 0.99)] {
                out.push_str(&format!(
                    "vitrina_request_latency_ns{{quantile=\"{label}\"}} {}\n",
                    percentile(&sorted, q)
                ));
            }
        }
        out.push_str("# TYPE vitrina_resolver_cache counter\n");
        out.push_str(&format!(
            "vitrina_resolver_cache{{result=\"hit\"}} {resolver_hits}\n"
        ));
        out.push_str(&format!(
            "vitrina_resolver_cache{{result=\"miss\"}} {resolver_misses}\n"
        ));
        out
    }
}

fn percentile(sorted: &[u64], q: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let rank = ((sorted.len() as f64 - 1.0) * q).round() as usize;
    sorted[rank.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_accumulate_per_route_and_status() {
        let metrics = RequestMetrics::default();
        metrics.observe_request("/site/properties", 200, Duration::from_millis(3));
        metrics.observe_request("/site/properties", 200, Duration::from_millis(4));
        metrics.observe_request("/site/properties", 404, Duration::from_millis(1));
        assert_eq!(metrics.total_requests(), 3);

        let rendered = metrics.render(5, 2);
        assert!(rendered
            .contains("vitrina_requests_total{route=\"/site/properties\",status=\"200\"} 2"));
        assert!(rendered
            .contains("vitrina_requests_total{route=\"/site/properties\",status=\"404\"} 1"));
        assert!(rendered.contains("vitrina_resolver_cache{result=\"hit\"} 5"));
    }

    #[test]
    fn percentile_of_empty_reservoir_is_zero() {
        assert_eq!(percentile(&[], 0.95), 0);
        assert_eq!(percentile(&[7], 0.5), 7);
    }
}
