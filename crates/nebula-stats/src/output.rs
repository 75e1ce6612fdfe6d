use chrono::{DateTime, Utc};

use nebula_assignment::{AssignmentStats, DeploymentTotals, InferenceStats, NodeStats};

pub fn print_summary(stats: &InferenceStats) {
    println!("\n=== Inference Stats ===\n");
    println!("  Model:      {}", stats.model_id);
    println!("  Inferences: {}", stats.inference_count);
    println!("  Failures:   {}", stats.failure_count);
    println!();
}

pub fn print_nodes(stats: &AssignmentStats) {
    println!("\n=== Nodes for '{}' ===\n", stats.model_id());
    println!("  Started:    {}", format_timestamp(Some(stats.start_time())));
    println!(
        "  Threads:    {}   Allocations: {}   Queue: {}",
        format_opt(stats.threads_per_allocation()),
        format_opt(stats.number_of_allocations()),
        format_opt(stats.queue_capacity()),
    );
    println!();

    let nodes = stats.node_stats();
    if nodes.is_empty() {
        println!("  (No nodes assigned)");
        println!();
        return;
    }

    println!(
        "  {:<20} {:<10} {:>12} {:>10} {:>8} {:>9} {:<20}",
        "Node ID", "State", "Inferences", "Avg ms", "Pending", "Failures", "Last Access"
    );
    println!("  {:-<95}", "");
    for node in nodes {
        println!("  {}", format_node_row(node));
        if let Some(reason) = node.reason() {
            println!("  {:<20} reason: {}", "", reason);
        }
    }
    println!();
}

pub fn print_totals(model_id: &str, totals: &DeploymentTotals) {
    println!("\n=== Totals for '{}' ===\n", model_id);
    println!(
        "  Nodes:              {} started, {} not started",
        totals.started_nodes, totals.not_started_nodes
    );
    println!("  Inferences:         {}", totals.inference_count);
    println!(
        "  Avg inference:      {}",
        format_ms(totals.average_inference_time_ms)
    );
    println!("  Pending:            {}", totals.pending_count);
    println!(
        "  Failures:           {} (errors {}, rejected {}, timeouts {})",
        totals.failure_count(),
        totals.error_count,
        totals.rejected_execution_count,
        totals.timeout_count
    );
    println!("  Peak throughput:    {}/min", totals.peak_throughput_per_minute);
    println!("  Last minute:        {}", totals.throughput_last_minute);
    println!("  Last access:        {}", format_timestamp(totals.last_access));
    println!();
}

fn format_node_row(node: &NodeStats) -> String {
    format!(
        "{:<20} {:<10} {:>12} {:>10} {:>8} {:>9} {:<20}",
        node.node().node_id(),
        node.routing_state().as_str().to_uppercase(),
        format_opt(node.inference_count()),
        format_ms(node.avg_inference_time_ms()),
        format_opt(node.pending_count()),
        format_opt(node.failure_count()),
        format_timestamp(node.last_access()),
    )
}

fn format_opt<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "N/A".to_string())
}

fn format_ms(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string())
}
