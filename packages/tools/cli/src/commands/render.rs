//! 시나리오 쿼리 렌더링

use serde::Serialize;

use qk_sql::{Dialect, SqlRenderer, Value};

use crate::commands::{print_json, select_scenarios};
use crate::tutorial::Catalog;
use crate::OutputFormat;

#[derive(Serialize)]
struct Rendered {
    scenario: &'static str,
    sql: String,
    params: Vec<Value>,
}

pub fn render(format: OutputFormat, name: Option<&str>, dialect: Dialect) -> anyhow::Result<()> {
    let catalog = Catalog::load()?;
    let renderer = SqlRenderer::new(dialect);

    let mut results = Vec::new();
    for scenario in select_scenarios(name)? {
        let rendered = renderer.render(&scenario.query(&catalog)?)?;
        results.push(Rendered {
            scenario: scenario.name,
            sql: rendered.sql,
            params: rendered.params,
        });
    }

    match format {
        OutputFormat::Json => print_json(&results)?,
        OutputFormat::Text => {
            for (i, r) in results.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                println!("-- {} ({})", r.scenario, dialect);
                println!("{}", r.sql);
                println!("params: {}", format_params(&r.params));
            }
        }
    }
    Ok(())
}

pub(crate) fn format_params(params: &[Value]) -> String {
    let items: Vec<String> = params.iter().map(ToString::to_string).collect();
    format!("[{}]", items.join(", "))
}
