//! Metrics summary panel
//!
//! A pure renderer: every `update` replaces the view with sections derived
//! from the given snapshot. Nothing accumulates between calls.

use crate::listener::Listeners;
use crate::types::MetricsSummary;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Text shown while a send is resolving
pub const LOADING_TEXT: &str = "Updating metrics...";

/// One `label: value` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryItem {
    pub label: &'static str,
    pub value: String,
}

impl SummaryItem {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// Per-tool block inside the tool usage section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolUsageRow {
    pub name: String,
    pub items: Vec<SummaryItem>,
}

/// Independently rendered, optional section of the panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummarySection {
    CycleStats(Vec<SummaryItem>),
    ToolUsage(Vec<ToolUsageRow>),
    TokenUsage(Vec<SummaryItem>),
    AccumulatedMetrics(Vec<SummaryItem>),
}

impl SummarySection {
    pub fn title(&self) -> &'static str {
        match self {
            SummarySection::CycleStats(_) => "Cycle Statistics",
            SummarySection::ToolUsage(_) => "Tool Usage",
            SummarySection::TokenUsage(_) => "Token Usage",
            SummarySection::AccumulatedMetrics(_) => "Accumulated Metrics",
        }
    }
}

fn write_items(f: &mut fmt::Formatter<'_>, items: &[SummaryItem], indent: &str) -> fmt::Result {
    for item in items {
        writeln!(f, "{}{}: {}", indent, item.label, item.value)?;
    }
    Ok(())
}

impl fmt::Display for SummarySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title())?;
        match self {
            SummarySection::ToolUsage(rows) => {
                for row in rows {
                    writeln!(f, "  {}", row.name)?;
                    write_items(f, &row.items, "    ")?;
                }
                Ok(())
            }
            SummarySection::CycleStats(items)
            | SummarySection::TokenUsage(items)
            | SummarySection::AccumulatedMetrics(items) => write_items(f, items, "  "),
        }
    }
}

/// What the panel currently shows
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MetricsView {
    /// Nothing received yet, or the last send failed
    #[default]
    Empty,
    Loading,
    Summary(Vec<SummarySection>),
}

/// Change events emitted by the metrics panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsEvent {
    Loading,
    Updated(Vec<SummarySection>),
    Cleared,
}

/// Seconds with two decimals, e.g. `1.50s`
pub fn format_seconds(secs: f64) -> String {
    format!("{:.2}s", secs)
}

/// A 0..1 fraction as a percentage with one decimal, e.g. `66.7%`
pub fn format_rate(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

/// Render a snapshot into its sections
///
/// Order is fixed: cycle stats, tool usage, token usage, accumulated
/// latency. Each appears only when its data is present; tool usage also
/// needs at least one tool.
pub fn render_summary(summary: &MetricsSummary) -> Vec<SummarySection> {
    let mut sections = Vec::new();

    if let Some(cycles) = &summary.cycles {
        sections.push(SummarySection::CycleStats(vec![
            SummaryItem::new("Total Cycles", cycles.total_cycles.to_string()),
            SummaryItem::new("Total Duration", format_seconds(cycles.total_duration)),
            SummaryItem::new("Average Cycle Time", format_seconds(cycles.average_cycle_time)),
        ]));
    }

    if !summary.tool_usage.is_empty() {
        let rows = summary
            .tool_usage
            .iter()
            .map(|(name, stats)| ToolUsageRow {
                name: name.clone(),
                items: vec![
                    SummaryItem::new("Calls", stats.call_count.to_string()),
                    SummaryItem::new("Success Rate", format_rate(stats.success_rate)),
                    SummaryItem::new("Avg Time", format_seconds(stats.average_time)),
                ],
            })
            .collect();
        sections.push(SummarySection::ToolUsage(rows));
    }

    if let Some(usage) = &summary.accumulated_usage {
        sections.push(SummarySection::TokenUsage(vec![
            SummaryItem::new("Total Tokens", usage.total_tokens.to_string()),
            SummaryItem::new("Input Tokens", usage.input_tokens.to_string()),
            SummaryItem::new("Output Tokens", usage.output_tokens.to_string()),
        ]));
    }

    if let Some(metrics) = &summary.accumulated_metrics {
        sections.push(SummarySection::AccumulatedMetrics(vec![SummaryItem::new(
            "Total Latency",
            format!("{} ms", metrics.latency_ms),
        )]));
    }

    sections
}

/// Metrics summary panel
pub struct MetricsPanel {
    view: RwLock<MetricsView>,
    listeners: Arc<Listeners<MetricsEvent>>,
}

impl Default for MetricsPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsPanel {
    pub fn new() -> Self {
        Self {
            view: RwLock::new(MetricsView::Empty),
            listeners: Arc::new(Listeners::new()),
        }
    }

    /// Replace the content with the loading indicator
    pub fn show_loading(&self) {
        *self.view.write() = MetricsView::Loading;
        self.listeners.emit(&MetricsEvent::Loading);
    }

    /// Replace the content with the sections for `summary`
    pub fn update(&self, summary: &MetricsSummary) {
        let sections = render_summary(summary);
        *self.view.write() = MetricsView::Summary(sections.clone());
        self.listeners.emit(&MetricsEvent::Updated(sections));
    }

    /// Drop back to the empty state
    pub fn clear(&self) {
        *self.view.write() = MetricsView::Empty;
        self.listeners.emit(&MetricsEvent::Cleared);
    }

    pub fn view(&self) -> MetricsView {
        self.view.read().clone()
    }

    pub fn listeners(&self) -> &Arc<Listeners<MetricsEvent>> {
        &self.listeners
    }
}
