/// cli/src/output.rs
/// Rendering of graphs, verification results and errors for the terminal.
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use console::Style;
use serde::Serialize;

use flowgraph_core::cfg::{BlockName, ControlFlowGraph, Violation};
use flowgraph_core::FlowgraphErrorExt;

/// Styles for different output elements
pub struct FormatStyle {
    pub title: Style,
    pub info: Style,
    pub warning: Style,
    pub error: Style,
    pub success: Style,
}

impl Default for FormatStyle {
    fn default() -> Self {
        FormatStyle {
            title: Style::new().bold().underlined(),
            info: Style::new().cyan(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            success: Style::new().green().bold(),
        }
    }
}

/// How `build` prints a finished graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Summary,
    Rows,
}

impl OutputFormat {
    pub fn from_str(name: &str) -> Option<OutputFormat> {
        match name {
            "text" => Some(OutputFormat::Text),
            "json" => Some(OutputFormat::Json),
            "summary" => Some(OutputFormat::Summary),
            "rows" => Some(OutputFormat::Rows),
            _ => None,
        }
    }
}

/// One row of the summary table; `--format rows` prints them as JSON.
#[derive(Debug, Serialize)]
pub struct BlockRow {
    pub block: String,
    pub instructions: usize,
    pub predecessors: Vec<String>,
    pub successors: Vec<String>,
    pub reachable: bool,
}

pub fn block_rows(graph: &ControlFlowGraph) -> Vec<BlockRow> {
    let reachable = graph.reachable_set();
    let names = |list: Vec<BlockName>| list.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    graph
        .blocks()
        .iter()
        .map(|block| BlockRow {
            block: block.name.to_string(),
            instructions: block.len(),
            predecessors: names(graph.predecessors(block.name)),
            successors: names(graph.successors(block.name)),
            reachable: reachable.contains(&block.name),
        })
        .collect()
}

pub fn render_summary(graph: &ControlFlowGraph) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Block", "Instructions", "Predecessors", "Successors", "Reachable"]);
    for row in block_rows(graph) {
        table.add_row(vec![
            row.block,
            row.instructions.to_string(),
            row.predecessors.join(", "),
            row.successors.join(", "),
            if row.reachable { "yes".to_string() } else { "no".to_string() },
        ]);
    }
    table.to_string()
}

pub fn render_graph(graph: &ControlFlowGraph, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Text => Ok(graph.to_string()),
        OutputFormat::Json => graph.to_json().map_err(|e| format!("serialize graph: {}", e)),
        OutputFormat::Summary => Ok(render_summary(graph)),
        OutputFormat::Rows => {
            serde_json::to_string_pretty(&block_rows(graph)).map_err(|e| format!("serialize rows: {}", e))
        }
    }
}

pub fn render_violations(violations: &[Violation], style: &FormatStyle) -> String {
    if violations.is_empty() {
        return style.success.apply_to("graph verified").to_string();
    }
    let mut out = style
        .warning
        .apply_to(format!("{} violation(s):", violations.len()))
        .to_string();
    for violation in violations {
        out.push_str("\n  ");
        out.push_str(&violation.to_string());
    }
    out
}

pub fn render_error(error: &dyn FlowgraphErrorExt, style: &FormatStyle) -> String {
    let location = match error.location() {
        Some(loc) => loc.to_string(),
        None => "unknown location".to_string(),
    };
    let headline = match error.build_kind() {
        Some(kind) => format!("{} error ({})", error.stage(), kind),
        None => format!("{} error", error.stage()),
    };
    format!(
        "{} {} {}\n  {}",
        style.error.apply_to(headline),
        style.info.apply_to(location),
        error.issuer(),
        error.message()
    )
}
