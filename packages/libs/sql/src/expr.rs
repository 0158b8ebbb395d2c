//! 표현식 AST
//!
//! 프로젝션/피연산자(`Expr`), 조건(`Predicate`), CASE 표현식을 정의합니다.
//! 모든 노드는 생성 후 변경되지 않으며, 조합 함수는 입력을 소비해 새 노드를 만듭니다.
//!
//! # 예시
//!
//! ```ignore
//! use qk_sql::prelude::*;
//!
//! let p = member.column("username")?.eq("member1")
//!     .and(member.column("age")?.eq(10));
//! ```

use qk_core::schema::{Column, ColumnType};

use crate::order::{Direction, OrderSpec};
use crate::query::Query;
use crate::value::Value;

/// 값을 만드는 표현식 (SELECT 목록, 비교 피연산자, 정렬 키)
#[derive(Debug, Clone)]
pub enum Expr {
    /// 테이블 컬럼
    Column(Column),

    /// 리터럴 (항상 바인딩 파라미터로 렌더링)
    Value(Value),

    /// 집계 함수
    Aggregate(Aggregate),

    /// CASE WHEN ... END
    Case(CaseExpr),

    /// 스칼라 서브쿼리
    Subquery(Box<Query>),

    /// 문자열 연결 (`a || b || c`)
    Concat(Vec<Expr>),

    /// 타입 변환
    Cast { expr: Box<Expr>, target: ColumnType },
}

impl Expr {
    pub fn column(column: Column) -> Self {
        Expr::Column(column)
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Expr::Value(value.into())
    }

    pub fn subquery(query: Query) -> Self {
        Expr::Subquery(Box::new(query))
    }
}

/// 집계 함수 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub fn sql(&self) -> &'static str {
        match self {
            AggregateFn::Count => "COUNT",
            AggregateFn::Sum => "SUM",
            AggregateFn::Avg => "AVG",
            AggregateFn::Min => "MIN",
            AggregateFn::Max => "MAX",
        }
    }
}

/// 집계 표현식
///
/// `arg`가 없으면 `COUNT(*)`입니다.
#[derive(Debug, Clone)]
pub struct Aggregate {
    pub func: AggregateFn,
    pub arg: Option<Box<Expr>>,
    pub distinct: bool,
}

/// 이름이 붙을 수 있는 SELECT 항목
#[derive(Debug, Clone)]
pub struct Projection {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl Projection {
    pub fn new(expr: impl Into<Expr>) -> Self {
        Self {
            expr: expr.into(),
            alias: None,
        }
    }
}

/// 테이블의 모든 컬럼을 선언 순서대로 프로젝션으로 변환
pub fn columns_of(table: &qk_core::schema::Table) -> Vec<Projection> {
    table.columns().into_iter().map(Projection::from).collect()
}

/// 비교 연산자
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Goe,
    Lt,
    Loe,
}

impl CompareOp {
    pub fn sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Goe => ">=",
            CompareOp::Lt => "<",
            CompareOp::Loe => "<=",
        }
    }
}

/// 불리언 조건 트리 (WHERE, ON, HAVING, CASE WHEN)
#[derive(Debug, Clone)]
pub enum Predicate {
    /// `left op right`
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },

    /// 모든 조건이 참 (비어 있으면 항상 참)
    And(Vec<Predicate>),

    /// 하나 이상의 조건이 참 (비어 있으면 항상 거짓)
    Or(Vec<Predicate>),

    /// 부정
    Not(Box<Predicate>),

    /// `expr [NOT] IN (v1, v2, ...)`
    InList {
        expr: Expr,
        list: Vec<Expr>,
        negated: bool,
    },

    /// `expr [NOT] IN (SELECT ...)`
    InSubquery {
        expr: Expr,
        query: Box<Query>,
        negated: bool,
    },

    /// `expr IS [NOT] NULL`
    IsNull { expr: Expr, negated: bool },

    /// `expr BETWEEN low AND high` (양 끝 포함)
    Between { expr: Expr, low: Expr, high: Expr },

    /// `expr LIKE pattern`
    Like { expr: Expr, pattern: Expr },
}

impl Predicate {
    /// `(self) AND (other)`
    ///
    /// 기존 AND 노드에 합치지 않고 새 노드를 만듭니다.
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(vec![self, other])
    }

    /// `(self) OR (other)`
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(vec![self, other])
    }

    /// `NOT (self)`
    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

/// 조건들의 논리곱
pub fn and(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::And(predicates.into_iter().collect())
}

/// 조건들의 논리합
pub fn or(predicates: impl IntoIterator<Item = Predicate>) -> Predicate {
    Predicate::Or(predicates.into_iter().collect())
}

/// 조건 부정
pub fn not(predicate: Predicate) -> Predicate {
    predicate.negate()
}

/// 상수 프로젝션
pub fn constant(value: impl Into<Value>) -> Expr {
    Expr::Value(value.into())
}

/// `COUNT(*)`
pub fn count_all() -> Expr {
    Expr::Aggregate(Aggregate {
        func: AggregateFn::Count,
        arg: None,
        distinct: false,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// CASE
// ─────────────────────────────────────────────────────────────────────────────

/// CASE 분기
#[derive(Debug, Clone)]
pub struct CaseBranch {
    pub condition: Predicate,
    pub result: Expr,
}

/// CASE 표현식
///
/// 분기는 선언 순서대로 평가되며 처음 참이 되는 분기의 결과를 사용합니다.
/// `default`가 없으면 `ELSE` 없이 렌더링되어 NULL이 됩니다.
#[derive(Debug, Clone)]
pub struct CaseExpr {
    branches: Vec<CaseBranch>,
    default: Option<Box<Expr>>,
}

impl CaseExpr {
    pub fn branches(&self) -> &[CaseBranch] {
        &self.branches
    }

    pub fn default_result(&self) -> Option<&Expr> {
        self.default.as_deref()
    }

    fn finish(branches: Vec<CaseBranch>, default: Option<Expr>) -> Expr {
        if branches.is_empty() {
            // WHEN 없는 CASE는 SQL 문법 오류이므로 기본값 자체가 결과다
            return default.unwrap_or(Expr::Value(Value::Null));
        }
        Expr::Case(CaseExpr {
            branches,
            default: default.map(Box::new),
        })
    }
}

/// 검색형 CASE 빌더
#[derive(Debug, Clone, Default)]
pub struct CaseBuilder {
    branches: Vec<CaseBranch>,
}

/// 검색형 CASE 시작
pub fn case() -> CaseBuilder {
    CaseBuilder::default()
}

impl CaseBuilder {
    pub fn when(self, condition: Predicate) -> CaseWhen {
        CaseWhen {
            builder: self,
            condition,
        }
    }

    /// `ELSE result END`
    pub fn otherwise(self, result: impl Into<Expr>) -> Expr {
        CaseExpr::finish(self.branches, Some(result.into()))
    }

    /// `END` (ELSE 없음)
    pub fn end(self) -> Expr {
        CaseExpr::finish(self.branches, None)
    }
}

/// `WHEN` 다음 `THEN`을 기다리는 상태
#[derive(Debug, Clone)]
pub struct CaseWhen {
    builder: CaseBuilder,
    condition: Predicate,
}

impl CaseWhen {
    pub fn then(mut self, result: impl Into<Expr>) -> CaseBuilder {
        self.builder.branches.push(CaseBranch {
            condition: self.condition,
            result: result.into(),
        });
        self.builder
    }
}

/// 단순 CASE 빌더 (`member.age.when(10).then(..)`)
///
/// 각 분기는 `subject = value` 조건으로 변환됩니다.
#[derive(Debug, Clone)]
pub struct SimpleCase {
    subject: Expr,
    branches: Vec<CaseBranch>,
}

impl SimpleCase {
    pub fn when(self, value: impl Into<Expr>) -> SimpleCaseWhen {
        SimpleCaseWhen {
            case: self,
            value: value.into(),
        }
    }

    pub fn otherwise(self, result: impl Into<Expr>) -> Expr {
        CaseExpr::finish(self.branches, Some(result.into()))
    }

    pub fn end(self) -> Expr {
        CaseExpr::finish(self.branches, None)
    }
}

#[derive(Debug, Clone)]
pub struct SimpleCaseWhen {
    case: SimpleCase,
    value: Expr,
}

impl SimpleCaseWhen {
    pub fn then(mut self, result: impl Into<Expr>) -> SimpleCase {
        let condition = Predicate::Compare {
            left: self.case.subject.clone(),
            op: CompareOp::Eq,
            right: self.value,
        };
        self.case.branches.push(CaseBranch {
            condition,
            result: result.into(),
        });
        self.case
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fluent 확장
// ─────────────────────────────────────────────────────────────────────────────

/// 컬럼과 표현식에 공통으로 붙는 fluent 메서드
pub trait ExprExt: Into<Expr> + Sized {
    fn eq<R: Into<Expr>>(self, rhs: R) -> Predicate {
        compare(self, CompareOp::Eq, rhs)
    }

    fn ne<R: Into<Expr>>(self, rhs: R) -> Predicate {
        compare(self, CompareOp::Ne, rhs)
    }

    fn gt<R: Into<Expr>>(self, rhs: R) -> Predicate {
        compare(self, CompareOp::Gt, rhs)
    }

    /// greater or equal
    fn goe<R: Into<Expr>>(self, rhs: R) -> Predicate {
        compare(self, CompareOp::Goe, rhs)
    }

    fn lt<R: Into<Expr>>(self, rhs: R) -> Predicate {
        compare(self, CompareOp::Lt, rhs)
    }

    /// less or equal
    fn loe<R: Into<Expr>>(self, rhs: R) -> Predicate {
        compare(self, CompareOp::Loe, rhs)
    }

    fn between<L: Into<Expr>, H: Into<Expr>>(self, low: L, high: H) -> Predicate {
        Predicate::Between {
            expr: self.into(),
            low: low.into(),
            high: high.into(),
        }
    }

    fn in_list<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Expr>,
    {
        Predicate::InList {
            expr: self.into(),
            list: values.into_iter().map(Into::into).collect(),
            negated: false,
        }
    }

    fn not_in_list<I, V>(self, values: I) -> Predicate
    where
        I: IntoIterator<Item = V>,
        V: Into<Expr>,
    {
        Predicate::InList {
            expr: self.into(),
            list: values.into_iter().map(Into::into).collect(),
            negated: true,
        }
    }

    fn in_subquery(self, query: Query) -> Predicate {
        Predicate::InSubquery {
            expr: self.into(),
            query: Box::new(query),
            negated: false,
        }
    }

    fn not_in_subquery(self, query: Query) -> Predicate {
        Predicate::InSubquery {
            expr: self.into(),
            query: Box::new(query),
            negated: true,
        }
    }

    fn is_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self.into(),
            negated: false,
        }
    }

    fn is_not_null(self) -> Predicate {
        Predicate::IsNull {
            expr: self.into(),
            negated: true,
        }
    }

    fn like(self, pattern: impl Into<String>) -> Predicate {
        Predicate::Like {
            expr: self.into(),
            pattern: Expr::Value(Value::Text(pattern.into())),
        }
    }

    fn asc(self) -> OrderSpec {
        OrderSpec::new(self, Direction::Asc)
    }

    fn desc(self) -> OrderSpec {
        OrderSpec::new(self, Direction::Desc)
    }

    fn count(self) -> Expr {
        aggregate(AggregateFn::Count, self, false)
    }

    fn count_distinct(self) -> Expr {
        aggregate(AggregateFn::Count, self, true)
    }

    fn sum(self) -> Expr {
        aggregate(AggregateFn::Sum, self, false)
    }

    fn avg(self) -> Expr {
        aggregate(AggregateFn::Avg, self, false)
    }

    fn min(self) -> Expr {
        aggregate(AggregateFn::Min, self, false)
    }

    fn max(self) -> Expr {
        aggregate(AggregateFn::Max, self, false)
    }

    /// 문자열 연결
    fn concat<R: Into<Expr>>(self, rhs: R) -> Expr {
        match self.into() {
            Expr::Concat(mut parts) => {
                parts.push(rhs.into());
                Expr::Concat(parts)
            }
            lhs => Expr::Concat(vec![lhs, rhs.into()]),
        }
    }

    fn cast(self, target: ColumnType) -> Expr {
        Expr::Cast {
            expr: Box::new(self.into()),
            target,
        }
    }

    /// 문자열로 변환 (`CAST(.. AS TEXT)`)
    fn string_value(self) -> Expr {
        self.cast(ColumnType::String)
    }

    /// `expr AS "name"`
    fn alias(self, name: impl Into<String>) -> Projection {
        Projection {
            expr: self.into(),
            alias: Some(name.into()),
        }
    }

    /// 단순 CASE 시작
    fn when<V: Into<Expr>>(self, value: V) -> SimpleCaseWhen {
        SimpleCase {
            subject: self.into(),
            branches: Vec::new(),
        }
        .when(value)
    }
}

impl ExprExt for Column {}
impl ExprExt for Expr {}

fn compare<L: Into<Expr>, R: Into<Expr>>(lhs: L, op: CompareOp, rhs: R) -> Predicate {
    Predicate::Compare {
        left: lhs.into(),
        op,
        right: rhs.into(),
    }
}

fn aggregate<E: Into<Expr>>(func: AggregateFn, arg: E, distinct: bool) -> Expr {
    Expr::Aggregate(Aggregate {
        func,
        arg: Some(Box::new(arg.into())),
        distinct,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// 변환
// ─────────────────────────────────────────────────────────────────────────────

impl From<Column> for Expr {
    fn from(column: Column) -> Self {
        Expr::Column(column)
    }
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Value(value)
    }
}

impl From<Query> for Expr {
    fn from(query: Query) -> Self {
        Expr::Subquery(Box::new(query))
    }
}

macro_rules! impl_expr_from_literal {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Expr {
                fn from(v: $ty) -> Self {
                    Expr::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_expr_from_literal!(i32, i64, u32, f64, bool, &str, String);

macro_rules! impl_projection_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Projection {
                fn from(v: $ty) -> Self {
                    Projection::new(v)
                }
            }
        )*
    };
}

impl_projection_from!(Expr, Column, Query);

#[cfg(test)]
mod tests {
    use super::*;
    use qk_core::schema::{ColumnDef, Table};

    fn member() -> Table {
        Table::define(
            "member",
            vec![
                ColumnDef::new("id", ColumnType::Bigint).primary_key(),
                ColumnDef::new("username", ColumnType::String).nullable(),
                ColumnDef::new("age", ColumnType::Int),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_and_does_not_flatten() {
        let member = member();
        let p = member.column("username").unwrap().eq("member1");
        let q = member.column("age").unwrap().eq(10);
        let r = member.column("age").unwrap().gt(5);

        match p.and(q).and(r) {
            Predicate::And(children) => {
                assert_eq!(children.len(), 2);
                assert!(matches!(children[0], Predicate::And(_)));
            }
            other => panic!("Expected And, got {:?}", other),
        }
    }

    #[test]
    fn test_simple_case_keeps_branch_order() {
        let member = member();
        let expr = member
            .column("age")
            .unwrap()
            .when(10)
            .then("열살")
            .when(20)
            .then("스무살")
            .otherwise("기타");

        let Expr::Case(case) = expr else {
            panic!("Expected case expression");
        };
        assert_eq!(case.branches().len(), 2);

        let results: Vec<_> = case
            .branches()
            .iter()
            .map(|b| match &b.result {
                Expr::Value(Value::Text(s)) => s.clone(),
                other => panic!("Unexpected result {:?}", other),
            })
            .collect();
        assert_eq!(results, vec!["열살", "스무살"]);
        assert!(case.default_result().is_some());
    }

    #[test]
    fn test_case_without_branches_collapses_to_default() {
        assert!(matches!(
            case().otherwise("기타"),
            Expr::Value(Value::Text(_))
        ));
        assert!(matches!(case().end(), Expr::Value(Value::Null)));
    }

    #[test]
    fn test_concat_flattens() {
        let member = member();
        let expr = member
            .column("username")
            .unwrap()
            .concat("_")
            .concat(member.column("age").unwrap().string_value());

        match expr {
            Expr::Concat(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(
                    parts[2],
                    Expr::Cast {
                        target: ColumnType::String,
                        ..
                    }
                ));
            }
            other => panic!("Expected concat, got {:?}", other),
        }
    }

    #[test]
    fn test_columns_of_table() {
        let projections = columns_of(&member());
        assert_eq!(projections.len(), 3);
        assert!(projections.iter().all(|p| p.alias.is_none()));
    }
}
