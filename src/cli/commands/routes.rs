use serde_json::{json, Value};

use crate::cli::utils::render_table;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::routes::{suite::suite_routes, RouteEntry};

pub fn handle(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let table = suite_routes(&config.upstreams)?;

    match output_format {
        OutputFormat::Json => {
            let routes: Vec<Value> = table.entries().iter().map(route_json).collect();
            println!("{}", serde_json::to_string_pretty(&json!({ "routes": routes }))?);
        }
        OutputFormat::Text => {
            let rows: Vec<Vec<String>> = table.entries().iter().map(route_row).collect();
            println!(
                "{}",
                render_table(&["METHODS", "PATH", "SERVICE", "ACCESS", "STYLE", "UPSTREAM"], &rows)
            );
        }
    }

    Ok(())
}

fn route_json(entry: &RouteEntry) -> Value {
    json!({
        "methods": entry.methods.to_string(),
        "path": entry.pattern.as_str(),
        "service": entry.upstream.name,
        "upstream": entry.upstream.base_url,
        "strip_prefix": entry.strip_prefix,
        "access": entry.access,
        "style": entry.style,
    })
}

fn route_row(entry: &RouteEntry) -> Vec<String> {
    let upstream = match &entry.strip_prefix {
        Some(prefix) => format!("{} (strip {})", entry.upstream.base_url, prefix),
        None => entry.upstream.base_url.clone(),
    };

    vec![
        entry.methods.to_string(),
        entry.pattern.to_string(),
        entry.upstream.name.clone(),
        format!("{:?}", entry.access).to_lowercase(),
        format!("{:?}", entry.style).to_lowercase(),
        upstream,
    ]
}
