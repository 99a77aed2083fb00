use std::collections::BTreeMap;

use parking_lot::Mutex;

#[derive(Debug, Default, Clone)]
struct ToolMetric {
    ok: u64,
    err: u64,
    total_latency_ms: f64,
    max_latency_ms: f64,
}

#[derive(Debug, Default, Clone)]
struct SetMetric {
    scored: u64,
    unscored: u64,
}

#[derive(Debug, Default)]
struct Registry {
    tool: BTreeMap<String, ToolMetric>,
    set: BTreeMap<String, SetMetric>,
}

/// Process-wide call counters, rendered in Prometheus text format.
#[derive(Debug, Default)]
pub struct Metrics {
    inner: Mutex<Registry>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// `is_error` covers protocol errors and tool results flagged `isError`.
    pub fn record_tool(&self, tool: &str, latency_ms: f64, is_error: bool) {
        let mut locked = self.inner.lock();
        let metric = locked.tool.entry(tool.to_string()).or_default();
        if is_error {
            metric.err = metric.err.saturating_add(1);
        } else {
            metric.ok = metric.ok.saturating_add(1);
        }
        metric.total_latency_ms += latency_ms;
        metric.max_latency_ms = metric.max_latency_ms.max(latency_ms);
    }

    /// Only call with names that resolved in the catalog; labels stay bounded.
    pub fn record_samples(&self, set: &str, scored: usize, unscored: usize) {
        let mut locked = self.inner.lock();
        let metric = locked.set.entry(set.to_string()).or_default();
        metric.scored = metric.scored.saturating_add(scored as u64);
        metric.unscored = metric.unscored.saturating_add(unscored as u64);
    }

    pub fn render_text(&self) -> String {
        let mut lines = vec![
            "# TYPE wqi_tool_calls_total counter".to_string(),
            "# TYPE wqi_tool_latency_ms_sum counter".to_string(),
            "# TYPE wqi_tool_latency_ms_max gauge".to_string(),
            "# TYPE wqi_samples_total counter".to_string(),
        ];

        let locked = self.inner.lock();
        for (tool, m) in &locked.tool {
            let tool = prom_label_value(tool);
            lines.push(format!(
                "wqi_tool_calls_total{{tool=\"{tool}\",status=\"ok\"}} {}",
                m.ok
            ));
            lines.push(format!(
                "wqi_tool_calls_total{{tool=\"{tool}\",status=\"error\"}} {}",
                m.err
            ));
            lines.push(format!(
                "wqi_tool_latency_ms_sum{{tool=\"{tool}\"}} {:.3}",
                m.total_latency_ms
            ));
            lines.push(format!(
                "wqi_tool_latency_ms_max{{tool=\"{tool}\"}} {:.3}",
                m.max_latency_ms
            ));
        }
        for (set, m) in &locked.set {
            let set = prom_label_value(set);
            lines.push(format!(
                "wqi_samples_total{{set=\"{set}\",outcome=\"scored\"}} {}",
                m.scored
            ));
            lines.push(format!(
                "wqi_samples_total{{set=\"{set}\",outcome=\"no_valid_data\"}} {}",
                m.unscored
            ));
        }

        let mut text = lines.join("\n");
        text.push('\n');
        text
    }
}

fn prom_label_value(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', " ")
}
