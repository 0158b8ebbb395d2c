//! querykit CLI (`qk`)
//!
//! 튜토리얼 스키마 위의 예제 쿼리를 렌더링하고 SQLite에서 실행해 봅니다.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use qk_sql::Dialect;

mod commands;
mod config;
mod tutorial;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "qk")]
#[command(author, version, about = "querykit CLI - typed query builder", long_about = None)]
struct Cli {
    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// List tutorial scenarios
    Scenarios,

    /// Render scenario queries as parameterized SQL
    Render {
        /// Scenario name (all scenarios if omitted)
        scenario: Option<String>,

        /// SQL dialect (postgres, sqlite)
        #[arg(long)]
        dialect: Option<Dialect>,
    },

    /// Print CREATE TABLE statements
    Ddl {
        /// Schema YAML file (tutorial schema if omitted)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// SQL dialect (postgres, sqlite)
        #[arg(long)]
        dialect: Option<Dialect>,
    },

    /// Seed a SQLite database and run scenarios
    Demo {
        /// Scenario name (all scenarios if omitted)
        scenario: Option<String>,

        /// SQLite URL (default: in-memory)
        #[arg(long)]
        database_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qk_cli=info,qk_sql=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // 설정 로드
    let config = CliConfig::load()?;

    // 명령 실행
    match cli.command {
        Commands::Scenarios => commands::scenarios::list(cli.format),
        Commands::Render { scenario, dialect } => {
            let dialect = config.dialect(dialect)?;
            commands::render::render(cli.format, scenario.as_deref(), dialect)
        }
        Commands::Ddl { schema, dialect } => {
            let dialect = config.dialect(dialect)?;
            commands::ddl::ddl(cli.format, schema.as_deref(), dialect)
        }
        Commands::Demo {
            scenario,
            database_url,
        } => {
            commands::demo::demo(
                &config,
                cli.format,
                scenario.as_deref(),
                database_url.as_deref(),
            )
            .await
        }
    }
}
