//! 스키마 DDL 출력

use std::path::Path;

use qk_core::schema::SchemaParser;
use qk_sql::{DdlGenerator, Dialect};

use crate::commands::print_json;
use crate::tutorial::SCHEMA_YAML;
use crate::OutputFormat;

pub fn ddl(
    format: OutputFormat,
    schema_path: Option<&Path>,
    dialect: Dialect,
) -> anyhow::Result<()> {
    let yaml = match schema_path {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read schema file {}: {}", path.display(), e))?,
        None => SCHEMA_YAML.to_string(),
    };

    let schema = SchemaParser::parse_yaml(&yaml)?;
    let sqls = DdlGenerator::generate(&schema, dialect);
    tracing::debug!(tables = sqls.len(), %dialect, "Generated DDL");

    match format {
        OutputFormat::Json => print_json(&sqls)?,
        OutputFormat::Text => {
            for sql in sqls {
                println!("{};", sql);
            }
        }
    }
    Ok(())
}
