//! 쿼리 실행기
//!
//! 렌더링된 SQL을 SQLite 풀에서 실행하고 결과 row를 `Value`로 디코딩합니다.
//! 빌더와 렌더러는 DB를 모르며, DB 접근은 이 모듈에서만 일어납니다.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions, SqliteRow};
use sqlx::{Column as _, Row as _, Sqlite, SqlitePool, TypeInfo, ValueRef};
use thiserror::Error;
use tracing::{debug, info};

use crate::query::Query;
use crate::render::{Dialect, RenderedQuery, SqlRenderer};
use crate::value::Value;

pub type ExecResult<T> = std::result::Result<T, ExecError>;

/// 실행 에러
#[derive(Debug, Error)]
pub enum ExecError {
    /// 쿼리 빌드/렌더링 실패
    #[error(transparent)]
    Query(#[from] qk_core::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// `fetch_one`에 두 개 이상의 row가 반환됨
    #[error("expected at most one row, got {count}")]
    NonUnique { count: usize },

    #[error("cannot decode column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl ExecError {
    pub fn code(&self) -> &'static str {
        match self {
            ExecError::Query(e) => e.code(),
            ExecError::Database(_) => "DATABASE_ERROR",
            ExecError::NonUnique { .. } => "NON_UNIQUE_RESULT",
            ExecError::Decode { .. } => "DECODE_ERROR",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 결과 타입
// ─────────────────────────────────────────────────────────────────────────────

/// 결과 row
///
/// SELECT 목록 순서를 유지합니다. 이름이 겹치는 컬럼은 `get`이 첫 번째를 반환하므로
/// 인덱스로 접근하거나 별칭을 붙여야 합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// 페이지 조회 결과
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    /// 페이지네이션을 제외한 전체 row 수
    pub total: u64,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub rows: Vec<Row>,
}

// ─────────────────────────────────────────────────────────────────────────────
// 실행기
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite 쿼리 실행기
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    pool: SqlitePool,
    renderer: SqlRenderer,
}

impl QueryExecutor {
    /// 새 풀 연결
    ///
    /// 인메모리 DB(`sqlite::memory:`)는 연결마다 별도 DB가 되므로 연결 하나로 고정합니다.
    pub async fn connect(url: &str, max_connections: u32) -> ExecResult<Self> {
        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let mut options = SqlitePoolOptions::new().max_connections(max_connections.max(1));
        if in_memory {
            options = options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        let pool = options.connect(url).await?;
        info!(url = %url, in_memory, "Connected to database");
        Ok(Self::new(pool))
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            renderer: SqlRenderer::new(Dialect::Sqlite),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// 파라미터 없는 SQL 실행 (DDL, 시드)
    pub async fn execute(&self, sql: &str) -> ExecResult<u64> {
        debug!(sql = %sql, "Executing statement");
        let result = sqlx::query(sql).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn execute_all(&self, sqls: &[String]) -> ExecResult<()> {
        for sql in sqls {
            self.execute(sql).await?;
        }
        Ok(())
    }

    /// 모든 결과 row (`fetch`)
    pub async fn fetch(&self, query: &Query) -> ExecResult<Vec<Row>> {
        let rendered = self.renderer.render(query)?;
        self.fetch_rendered(&rendered).await
    }

    pub async fn fetch_rendered(&self, rendered: &RenderedQuery) -> ExecResult<Vec<Row>> {
        debug!(sql = %rendered.sql, params = rendered.params.len(), "Executing query");

        let query = bind_values(sqlx::query(&rendered.sql), &rendered.params);
        let rows = query.fetch_all(&self.pool).await?;

        debug!(rows = rows.len(), "Query finished");
        rows.iter().map(decode_row).collect()
    }

    /// 단건 조회
    ///
    /// 결과가 없으면 `None`, 두 개 이상이면 `NonUnique`.
    pub async fn fetch_one(&self, query: &Query) -> ExecResult<Option<Row>> {
        let probe = match query.pagination() {
            (Some(_), _) => query.clone(),
            (None, _) => query.clone().limit(2)?,
        };

        let mut rows = self.fetch(&probe).await?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            count => Err(ExecError::NonUnique { count }),
        }
    }

    /// 첫 row (`limit(1)` 후 조회)
    pub async fn fetch_first(&self, query: &Query) -> ExecResult<Option<Row>> {
        let first = query.clone().limit(1)?;
        Ok(self.fetch(&first).await?.into_iter().next())
    }

    /// 페이지네이션을 제외한 결과 row 수
    ///
    /// GROUP BY/HAVING/DISTINCT 쿼리는 COUNT(*)로 바꿀 수 없으므로 결과 row를 직접 셉니다.
    pub async fn fetch_count(&self, query: &Query) -> ExecResult<u64> {
        if query.is_grouped() || query.is_distinct() {
            let rows = self.fetch(&query.without_pagination()).await?;
            return Ok(rows.len() as u64);
        }

        let count_query = query.count_query()?;
        let row = self.fetch(&count_query).await?.into_iter().next();
        let total = row
            .as_ref()
            .and_then(|r| r.get_index(0))
            .and_then(Value::as_i64)
            .ok_or_else(|| ExecError::Decode {
                column: "COUNT(*)".to_string(),
                message: "count query returned no integer".to_string(),
            })?;

        u64::try_from(total).map_err(|_| ExecError::Decode {
            column: "COUNT(*)".to_string(),
            message: format!("negative count {}", total),
        })
    }

    /// 전체 개수와 페이지 row
    pub async fn fetch_page(&self, query: &Query) -> ExecResult<Page> {
        let total = self.fetch_count(query).await?;
        let rows = self.fetch(query).await?;
        let (limit, offset) = query.pagination();

        Ok(Page {
            total,
            limit,
            offset,
            rows,
        })
    }
}

fn bind_values<'q>(
    mut query: sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &'q [Value],
) -> sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        match value {
            Value::Null => {
                let v: Option<String> = None;
                query = query.bind(v);
            }
            Value::Bool(b) => query = query.bind(*b),
            Value::Int(i) => query = query.bind(*i),
            Value::Float(f) => query = query.bind(*f),
            Value::Text(s) => query = query.bind(s.as_str()),
        }
    }
    query
}

/// SQLite row → `Row`
///
/// SQLite는 컬럼 선언 타입과 무관하게 값마다 저장 클래스를 가지므로
/// 값의 실제 타입을 보고 디코딩합니다 (집계/CASE 결과 포함).
fn decode_row(row: &SqliteRow) -> ExecResult<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());

    for (index, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let decode_err = |e: sqlx::Error| ExecError::Decode {
            column: name.clone(),
            message: e.to_string(),
        };

        let type_name = {
            let raw = row.try_get_raw(index).map_err(decode_err)?;
            if raw.is_null() {
                "NULL".to_string()
            } else {
                raw.type_info().name().to_ascii_uppercase()
            }
        };

        let value = match type_name.as_str() {
            "NULL" => Value::Null,
            "INTEGER" | "INT" | "INT8" | "BIGINT" => {
                Value::Int(row.try_get::<i64, _>(index).map_err(decode_err)?)
            }
            "BOOLEAN" | "BOOL" => Value::Bool(row.try_get::<bool, _>(index).map_err(decode_err)?),
            "REAL" | "FLOAT" | "DOUBLE" => {
                Value::Float(row.try_get::<f64, _>(index).map_err(decode_err)?)
            }
            "TEXT" => Value::Text(row.try_get::<String, _>(index).map_err(decode_err)?),
            other => {
                return Err(ExecError::Decode {
                    column: name,
                    message: format!("unsupported value type {}", other),
                })
            }
        };

        columns.push(name);
        values.push(value);
    }

    Ok(Row::new(columns, values))
}
