//! SQL 렌더러
//!
//! `Query` → (SQL 문자열, 바인딩 파라미터 목록) 변환을 담당합니다.
//!
//! - 모든 리터럴은 placeholder로 렌더링되고 값은 파라미터 목록에만 들어갑니다.
//!   서브쿼리와 CASE 분기 안의 값도 예외가 없습니다.
//! - 파라미터 순서는 SQL 텍스트에 placeholder가 나타나는 순서와 같습니다.
//! - 컬럼 참조는 렌더링 시점에 스코프(FROM/JOIN, 바깥 쿼리)를 검사합니다.
//!
//! 렌더러는 상태를 갖지 않으므로 같은 쿼리를 여러 번 렌더링해도 결과가 동일합니다.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use qk_core::schema::{Column, ColumnType, Table};
use qk_core::{Error, Result};

use crate::expr::{Expr, Predicate, Projection};
use crate::order::{NullOrdering, OrderSpec};
use crate::query::Query;
use crate::value::Value;

/// 대상 DB 방언
///
/// placeholder 문법과 CAST 타입 이름만 다릅니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `$1, $2, ...`
    #[default]
    Postgres,
    /// `?, ?, ...`
    Sqlite,
}

impl Dialect {
    fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Postgres => format!("${}", index),
            Dialect::Sqlite => "?".to_string(),
        }
    }

    fn cast_type(&self, column_type: ColumnType) -> &'static str {
        match self {
            Dialect::Postgres => column_type.to_postgres_type(),
            Dialect::Sqlite => column_type.to_sqlite_type(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알 수 없는 방언 이름
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown dialect: {0} (expected postgres or sqlite)")]
pub struct UnknownDialect(pub String);

impl FromStr for Dialect {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

/// 렌더링 결과
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// SQL 렌더러
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer {
    dialect: Dialect,
}

impl SqlRenderer {
    pub const fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// 쿼리 렌더링
    ///
    /// FROM 소스가 없으면 `InvalidQuery`, 스코프 밖 테이블의 컬럼을 참조하면
    /// `UnboundColumn`을 반환합니다.
    pub fn render(&self, query: &Query) -> Result<RenderedQuery> {
        let mut writer = Writer {
            dialect: self.dialect,
            sql: String::new(),
            params: Vec::new(),
            scopes: Vec::new(),
        };
        writer.query(query)?;

        Ok(RenderedQuery {
            sql: writer.sql,
            params: writer.params,
        })
    }
}

struct Writer<'q> {
    dialect: Dialect,
    sql: String,
    params: Vec<Value>,
    /// 바깥 쿼리부터 안쪽 쿼리 순서의 테이블 참조 이름
    scopes: Vec<Vec<&'q str>>,
}

impl<'q> Writer<'q> {
    fn query(&mut self, query: &'q Query) -> Result<()> {
        if query.sources.is_empty() {
            return Err(Error::InvalidQuery {
                message: "query has no FROM source".to_string(),
            });
        }

        let scope: Vec<&'q str> = query
            .sources
            .iter()
            .chain(query.joins.iter().map(|j| &j.table))
            .map(Table::reference_name)
            .collect();

        for (i, name) in scope.iter().enumerate() {
            if scope[..i].contains(name) {
                return Err(Error::InvalidQuery {
                    message: format!(
                        "table reference '{}' appears more than once; use Table::alias",
                        name
                    ),
                });
            }
        }

        self.scopes.push(scope);
        let result = self.select_body(query);
        self.scopes.pop();
        result
    }

    fn select_body(&mut self, query: &'q Query) -> Result<()> {
        // SELECT
        self.sql.push_str("SELECT ");
        if query.distinct {
            self.sql.push_str("DISTINCT ");
        }
        if query.projections.is_empty() {
            self.sql.push('*');
        } else {
            for (i, projection) in query.projections.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                self.projection(projection)?;
            }
        }

        // FROM
        self.sql.push_str(" FROM ");
        for (i, table) in query.sources.iter().enumerate() {
            if i > 0 {
                self.sql.push_str(", ");
            }
            self.table_ref(table);
        }

        // JOIN: ON 조건은 자기 자신까지의 테이블만 볼 수 있다
        for (i, join) in query.joins.iter().enumerate() {
            self.sql.push(' ');
            self.sql.push_str(join.kind.sql());
            self.sql.push(' ');
            self.table_ref(&join.table);
            self.sql.push_str(" ON ");

            let visible = query.sources.len() + i + 1;
            let full = self.scopes.pop().unwrap_or_default();
            self.scopes.push(full[..visible].to_vec());
            let result = self.predicate(&join.on);
            self.scopes.pop();
            self.scopes.push(full);
            result?;
        }

        // WHERE
        if !query.filters.is_empty() {
            self.sql.push_str(" WHERE ");
            self.junction(&query.filters, " AND ", "1 = 1")?;
        }

        // GROUP BY
        if !query.group_by.is_empty() {
            self.sql.push_str(" GROUP BY ");
            for (i, expr) in query.group_by.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                self.expr(expr)?;
            }
        }

        // HAVING
        if !query.having.is_empty() {
            self.sql.push_str(" HAVING ");
            self.junction(&query.having, " AND ", "1 = 1")?;
        }

        // ORDER BY
        if !query.order_by.is_empty() {
            self.sql.push_str(" ORDER BY ");
            for (i, spec) in query.order_by.iter().enumerate() {
                if i > 0 {
                    self.sql.push_str(", ");
                }
                self.order_spec(spec)?;
            }
        }

        // LIMIT / OFFSET
        match (query.limit, query.offset, self.dialect) {
            (Some(limit), _, _) => self.sql.push_str(&format!(" LIMIT {}", limit)),
            // SQLite는 LIMIT 없는 OFFSET을 허용하지 않는다
            (None, Some(_), Dialect::Sqlite) => self.sql.push_str(" LIMIT -1"),
            _ => {}
        }
        if let Some(offset) = query.offset {
            self.sql.push_str(&format!(" OFFSET {}", offset));
        }

        Ok(())
    }

    fn projection(&mut self, projection: &'q Projection) -> Result<()> {
        self.expr(&projection.expr)?;
        if let Some(alias) = &projection.alias {
            self.sql.push_str(" AS ");
            self.sql.push_str(&quote(alias));
        }
        Ok(())
    }

    fn table_ref(&mut self, table: &Table) {
        self.sql.push_str(&quote(table.name()));
        if let Some(alias) = table.alias_name() {
            self.sql.push_str(" AS ");
            self.sql.push_str(&quote(alias));
        }
    }

    fn order_spec(&mut self, spec: &'q OrderSpec) -> Result<()> {
        self.expr(&spec.expr)?;
        self.sql.push(' ');
        self.sql.push_str(spec.direction.sql());
        match spec.nulls {
            NullOrdering::Default => {}
            NullOrdering::First => self.sql.push_str(" NULLS FIRST"),
            NullOrdering::Last => self.sql.push_str(" NULLS LAST"),
        }
        Ok(())
    }

    fn column(&mut self, column: &Column) -> Result<()> {
        let bound = self
            .scopes
            .iter()
            .rev()
            .any(|scope| scope.contains(&column.table()));
        if !bound {
            return Err(Error::UnboundColumn {
                table: column.table().to_string(),
                column: column.name().to_string(),
            });
        }

        self.sql.push_str(&quote(column.table()));
        self.sql.push('.');
        self.sql.push_str(&quote(column.name()));
        Ok(())
    }

    fn param(&mut self, value: &Value) {
        self.params.push(value.clone());
        let placeholder = self.dialect.placeholder(self.params.len());
        self.sql.push_str(&placeholder);
    }

    fn expr(&mut self, expr: &'q Expr) -> Result<()> {
        match expr {
            Expr::Column(column) => self.column(column)?,
            Expr::Value(value) => self.param(value),
            Expr::Aggregate(aggregate) => {
                self.sql.push_str(aggregate.func.sql());
                self.sql.push('(');
                if aggregate.distinct {
                    self.sql.push_str("DISTINCT ");
                }
                match &aggregate.arg {
                    Some(arg) => self.expr(arg)?,
                    None => self.sql.push('*'),
                }
                self.sql.push(')');
            }
            Expr::Case(case) => {
                self.sql.push_str("CASE");
                for branch in case.branches() {
                    self.sql.push_str(" WHEN ");
                    self.predicate(&branch.condition)?;
                    self.sql.push_str(" THEN ");
                    self.expr(&branch.result)?;
                }
                if let Some(default) = case.default_result() {
                    self.sql.push_str(" ELSE ");
                    self.expr(default)?;
                }
                self.sql.push_str(" END");
            }
            Expr::Subquery(query) => {
                self.sql.push('(');
                self.query(query)?;
                self.sql.push(')');
            }
            Expr::Concat(parts) => {
                self.sql.push('(');
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(" || ");
                    }
                    self.expr(part)?;
                }
                self.sql.push(')');
            }
            Expr::Cast { expr, target } => {
                self.sql.push_str("CAST(");
                self.expr(expr)?;
                self.sql.push_str(" AS ");
                self.sql.push_str(self.dialect.cast_type(*target));
                self.sql.push(')');
            }
        }
        Ok(())
    }

    fn predicate(&mut self, predicate: &'q Predicate) -> Result<()> {
        match predicate {
            Predicate::Compare { left, op, right } => {
                self.expr(left)?;
                self.sql.push(' ');
                self.sql.push_str(op.sql());
                self.sql.push(' ');
                self.expr(right)?;
            }
            Predicate::And(children) => self.junction(children, " AND ", "1 = 1")?,
            Predicate::Or(children) => self.junction(children, " OR ", "1 = 0")?,
            Predicate::Not(inner) => {
                self.sql.push_str("NOT (");
                self.predicate(inner)?;
                self.sql.push(')');
            }
            Predicate::InList {
                expr,
                list,
                negated,
            } => {
                if list.is_empty() {
                    // 빈 IN 목록은 상수 조건으로 대체. 대상 식의 스코프 검사는 그대로 거친다
                    let (sql_len, params_len) = (self.sql.len(), self.params.len());
                    self.expr(expr)?;
                    self.sql.truncate(sql_len);
                    self.params.truncate(params_len);
                    self.sql.push_str(if *negated { "1 = 1" } else { "1 = 0" });
                    return Ok(());
                }
                self.expr(expr)?;
                self.sql.push_str(if *negated { " NOT IN (" } else { " IN (" });
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.expr(item)?;
                }
                self.sql.push(')');
            }
            Predicate::InSubquery {
                expr,
                query,
                negated,
            } => {
                self.expr(expr)?;
                self.sql.push_str(if *negated { " NOT IN (" } else { " IN (" });
                self.query(query)?;
                self.sql.push(')');
            }
            Predicate::IsNull { expr, negated } => {
                self.expr(expr)?;
                self.sql
                    .push_str(if *negated { " IS NOT NULL" } else { " IS NULL" });
            }
            Predicate::Between { expr, low, high } => {
                self.expr(expr)?;
                self.sql.push_str(" BETWEEN ");
                self.expr(low)?;
                self.sql.push_str(" AND ");
                self.expr(high)?;
            }
            Predicate::Like { expr, pattern } => {
                self.expr(expr)?;
                self.sql.push_str(" LIKE ");
                self.expr(pattern)?;
            }
        }
        Ok(())
    }

    /// AND/OR 렌더링
    ///
    /// 피연산자가 둘 이상이면 각각을 괄호로 감싼다. 하위 조건의 괄호는 그대로 유지된다.
    fn junction(&mut self, children: &'q [Predicate], separator: &str, empty: &str) -> Result<()> {
        match children {
            [] => self.sql.push_str(empty),
            [single] => self.predicate(single)?,
            _ => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(separator);
                    }
                    self.sql.push('(');
                    self.predicate(child)?;
                    self.sql.push(')');
                }
            }
        }
        Ok(())
    }
}

/// 식별자 인용 (`"name"`, 내부 따옴표는 두 번)
fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
