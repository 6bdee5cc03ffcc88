use stardock_core::aggregate::aggregate;
use stardock_core::model::{Entry, ResourceRecord, Snapshot, ports_label};
use stardock_core::runtime::RuntimeClient;

use crate::error::Result;

const HEADERS: [&str; 8] = ["", "NAME", "CONTAINER ID", "IMAGE", "PORTS", "STATUS", "STATE", "TYPE"];

pub async fn run_ps(client: &dyn RuntimeClient, include_stopped: bool, json: bool) -> Result<()> {
    let snapshot = aggregate(client.list_resources(include_stopped).await?);
    if json {
        let out = serde_json::to_string_pretty(&snapshot).map_err(std::io::Error::other)?;
        println!("{}", out);
    } else {
        print!("{}", render_table(&snapshot));
    }
    Ok(())
}

fn record_cells(record: &ResourceRecord, indent: &str) -> [String; 8] {
    [
        if record.is_running() { "⏺".into() } else { String::new() },
        format!("{}{}", indent, record.display_name),
        record.short_id(),
        record.image_ref.clone(),
        ports_label(&record.port_bindings),
        record.status_text.clone(),
        record.lifecycle_state.to_string(),
        "container".into(),
    ]
}

/// Plain-text listing with every group expanded
pub fn render_table(snapshot: &Snapshot) -> String {
    let mut rows: Vec<[String; 8]> = vec![HEADERS.map(String::from)];
    for entry in snapshot.entries() {
        match entry {
            Entry::Standalone(record) => rows.push(record_cells(record, "")),
            Entry::Group(group) => {
                rows.push([
                    if group.is_active() { "⏺".into() } else { String::new() },
                    group.name.clone(),
                    String::new(),
                    String::new(),
                    String::new(),
                    format!("{}/{} running", group.running_count(), group.members.len()),
                    String::new(),
                    "compose_stack".into(),
                ]);
                rows.extend(group.members.iter().map(|m| record_cells(m, "  ")));
            }
        }
    }

    let mut widths = [0usize; 8];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    for row in &rows {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    }
    out
}
