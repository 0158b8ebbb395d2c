//! 시나리오 실행 데모
//!
//! SQLite에 튜토리얼 스키마를 만들고 시드 데이터를 넣은 뒤 쿼리를 실행합니다.

use serde::Serialize;

use qk_sql::exec::{QueryExecutor, Row};
use qk_sql::{Dialect, SqlRenderer};

use crate::commands::render::format_params;
use crate::commands::{print_json, select_scenarios};
use crate::config::CliConfig;
use crate::tutorial::{self, Catalog, Outcome};
use crate::OutputFormat;

#[derive(Serialize)]
struct DemoResult {
    scenario: &'static str,
    sql: String,
    outcome: Outcome,
}

pub async fn demo(
    config: &CliConfig,
    format: OutputFormat,
    name: Option<&str>,
    database_url: Option<&str>,
) -> anyhow::Result<()> {
    let catalog = Catalog::load()?;
    let url = config.database_url(database_url);
    let executor = QueryExecutor::connect(&url, config.max_connections()).await?;
    let renderer = SqlRenderer::new(Dialect::Sqlite);

    let mut results = Vec::new();
    for scenario in select_scenarios(name)? {
        tracing::info!(scenario = scenario.name, "Running scenario");
        let rendered = renderer.render(&scenario.query(&catalog)?)?;
        let outcome = tutorial::run(&executor, &catalog, scenario).await?;

        match format {
            OutputFormat::Json => results.push(DemoResult {
                scenario: scenario.name,
                sql: rendered.sql,
                outcome,
            }),
            OutputFormat::Text => {
                println!("-- {}: {}", scenario.name, scenario.description);
                println!("{}", rendered.sql);
                println!("params: {}", format_params(&rendered.params));
                print_outcome(&outcome);
                println!();
            }
        }
    }

    if let OutputFormat::Json = format {
        print_json(&results)?;
    }
    Ok(())
}

fn print_outcome(outcome: &Outcome) {
    match outcome {
        Outcome::Count(count) => println!("=> count: {}", count),
        Outcome::One(None) => println!("=> (no row)"),
        Outcome::Page(page) => {
            println!(
                "=> total: {}, limit: {:?}, offset: {:?}",
                page.total, page.limit, page.offset
            );
            print_rows(&page.rows);
        }
        Outcome::Rows(_) | Outcome::One(Some(_)) => print_rows(outcome.rows()),
    }
}

fn print_rows(rows: &[Row]) {
    if rows.is_empty() {
        println!("=> (no rows)");
    }
    for row in rows {
        let cells: Vec<String> = row
            .columns()
            .iter()
            .zip(row.values())
            .map(|(name, value)| format!("{}={}", name, value))
            .collect();
        println!("=> {}", cells.join(", "));
    }
}
