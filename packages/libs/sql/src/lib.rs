//! qk-sql: 타입 안전 쿼리 빌더
//!
//! 스키마 모델(`qk_core::schema`) 위에서 SELECT 쿼리를 조합하고,
//! 파라미터 바인딩된 SQL로 렌더링합니다. 리터럴은 SQL 텍스트에 들어가지 않습니다.
//!
//! # 모듈 구조
//!
//! - `expr`: 표현식/조건/CASE AST와 fluent 확장(`ExprExt`)
//! - `order`: 정렬 지정
//! - `query`: 불변 SELECT 빌더
//! - `render`: SQL 렌더러 (Postgres / SQLite placeholder)
//! - `ddl`: CREATE TABLE / 시드 INSERT 생성기
//! - `exec`: SQLite 실행기
//!
//! # 예시
//!
//! ```ignore
//! use qk_sql::prelude::*;
//!
//! let query = select_from(&member)
//!     .filter(member.column("age")?.between(10, 30))
//!     .order_by([member.column("age")?.desc()])
//!     .limit(2)?;
//! let rendered = SqlRenderer::new(Dialect::Postgres).render(&query)?;
//! ```

pub mod ddl;
pub mod exec;
pub mod expr;
pub mod order;
pub mod query;
pub mod render;
pub mod value;

pub use ddl::{DdlGenerator, InsertBuilder};
pub use exec::{ExecError, ExecResult, Page, QueryExecutor, Row};
pub use expr::{Expr, ExprExt, Predicate, Projection};
pub use order::{Direction, NullOrdering, OrderSpec};
pub use query::{select, select_from, Join, JoinKind, Query};
pub use render::{Dialect, RenderedQuery, SqlRenderer, UnknownDialect};
pub use value::Value;

/// 쿼리 작성에 필요한 항목 일괄 import
pub mod prelude {
    pub use crate::expr::{and, case, columns_of, constant, count_all, not, or};
    pub use crate::expr::{Expr, ExprExt, Predicate, Projection};
    pub use crate::order::{NullOrdering, OrderSpec};
    pub use crate::query::{select, select_from, JoinKind, Query};
    pub use crate::render::{Dialect, RenderedQuery, SqlRenderer};
    pub use crate::value::Value;
    pub use qk_core::schema::{Column, ColumnType, Schema, Table};
}
