//! 시나리오 목록

use serde::Serialize;

use crate::commands::print_json;
use crate::tutorial::{self, FetchMode};
use crate::OutputFormat;

#[derive(Serialize)]
struct Entry {
    name: &'static str,
    fetch: FetchMode,
    description: &'static str,
}

pub fn list(format: OutputFormat) -> anyhow::Result<()> {
    let entries: Vec<Entry> = tutorial::scenarios()
        .iter()
        .map(|s| Entry {
            name: s.name,
            fetch: s.fetch,
            description: s.description,
        })
        .collect();

    match format {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Text => {
            for entry in entries {
                let fetch = format!("{:?}", entry.fetch);
                println!("{:<22} {:<6} {}", entry.name, fetch, entry.description);
            }
        }
    }
    Ok(())
}
