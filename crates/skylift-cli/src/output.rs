//! Rendering of reports and listings.

use crate::Format;
use anyhow::Result;
use console::{pad_str, style, Alignment};
use serde::Serialize;
use skylift_config::ClientConfig;
use skylift_core::ApplicationRef;
use skylift_deployer::{DeployReport, Table};

/// Render rows under a header, columns padded to their widest cell.
pub fn render_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.header.iter().map(|h| h.len()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            let width = console::measure_text_width(cell);
            match widths.get_mut(i) {
                Some(w) => *w = (*w).max(width),
                None => widths.push(width),
            }
        }
    }

    let render_row = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| pad_str(cell, widths[i], Alignment::Left, None).into_owned())
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = render_row(table.header.clone());
    for row in &table.rows {
        out.push('\n');
        out.push_str(&render_row(row.iter().map(String::as_str).collect()));
    }
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    success: bool,
    results: &'a [skylift_core::deployer::DeployResult],
}

pub fn print_report(report: &DeployReport, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let json = JsonReport {
                success: report.success(),
                results: &report.results,
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Format::Table => {
            println!("{}", render_table(&report_table(report)));
            let failed = report.failed().count();
            if failed == 0 {
                println!("\n{}", style(format!("{} succeeded", report.len())).green());
            } else {
                println!(
                    "\n{}",
                    style(format!("{} of {} failed", failed, report.len())).red()
                );
            }
        }
    }
    Ok(())
}

fn report_table(report: &DeployReport) -> Table {
    let rows = report
        .results
        .iter()
        .map(|r| {
            let status = if r.success {
                style("OK").green().to_string()
            } else {
                style("FAILED").red().to_string()
            };
            vec![
                status,
                r.cluster.clone(),
                r.namespace.clone(),
                r.application_name.clone(),
                r.deploy_id.clone(),
                r.reason.clone(),
            ]
        })
        .collect();

    Table {
        header: vec!["STATUS", "CLUSTER", "NAMESPACE", "APPLICATION", "DEPLOY_ID", "MESSAGE"],
        rows,
    }
}

pub fn print_apps(refs: &[ApplicationRef], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(refs)?),
        Format::Table => {
            let table = Table {
                header: vec!["ENVIRONMENT", "APPLICATION"],
                rows: refs
                    .iter()
                    .map(|r| vec![r.environment().to_string(), r.application().to_string()])
                    .collect(),
            };
            println!("{}", render_table(&table));
        }
    }
    Ok(())
}

pub fn print_clusters(config: &ClientConfig, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let clusters: Vec<_> = config
                .clusters
                .iter()
                .map(|c| {
                    serde_json::json!({
                        "name": c.name,
                        "url": c.url.as_str(),
                        "reachable": c.reachable,
                        "api": c.name == config.api_cluster.name,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&clusters)?);
        }
        Format::Table => {
            let table = Table {
                header: vec!["NAME", "URL", "REACHABLE", "API"],
                rows: config
                    .clusters
                    .iter()
                    .map(|c| {
                        vec![
                            c.name.clone(),
                            c.url.to_string(),
                            if c.reachable { "yes" } else { "no" }.to_string(),
                            if c.name == config.api_cluster.name { "*" } else { "" }.to_string(),
                        ]
                    })
                    .collect(),
            };
            println!("{}", render_table(&table));
        }
    }
    Ok(())
}
