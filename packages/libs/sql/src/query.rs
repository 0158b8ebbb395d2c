//! SELECT 쿼리 빌더
//!
//! `Query`는 값 객체입니다. 모든 빌더 메서드는 `self`를 소비하고 새 값을 반환하므로,
//! 기본 쿼리를 `clone()`해 여러 최종 쿼리의 템플릿으로 써도 서로 영향을 주지 않습니다.
//! 쿼리를 만드는 동안 DB에는 접근하지 않습니다.

use qk_core::schema::{Column, Table};
use qk_core::{Error, Result};

use crate::expr::{columns_of, count_all, Expr, ExprExt, Predicate, Projection};
use crate::order::OrderSpec;
use crate::render::SqlRenderer;

/// 조인 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
        }
    }
}

/// 조인 절
#[derive(Debug, Clone)]
pub struct Join {
    pub kind: JoinKind,
    pub table: Table,
    pub on: Predicate,
}

/// SELECT 쿼리
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub(crate) projections: Vec<Projection>,
    pub(crate) distinct: bool,
    pub(crate) sources: Vec<Table>,
    pub(crate) joins: Vec<Join>,
    pub(crate) filters: Vec<Predicate>,
    pub(crate) group_by: Vec<Expr>,
    pub(crate) having: Vec<Predicate>,
    pub(crate) order_by: Vec<OrderSpec>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
}

/// SELECT 목록으로 시작하는 쿼리
pub fn select<I, P>(projections: I) -> Query
where
    I: IntoIterator<Item = P>,
    P: Into<Projection>,
{
    Query::select(projections)
}

/// 테이블의 모든 컬럼을 조회하는 쿼리
pub fn select_from(table: &Table) -> Query {
    Query::select_from(table)
}

impl Query {
    /// SELECT 목록 지정 (순서 유지)
    pub fn select<I, P>(projections: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Projection>,
    {
        Self {
            projections: projections.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// 테이블의 모든 컬럼을 조회
    pub fn select_from(table: &Table) -> Self {
        Self {
            projections: columns_of(table),
            sources: vec![table.clone()],
            ..Self::default()
        }
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// FROM 소스 추가
    ///
    /// 두 번 이상 호출하면 세타 조인(`FROM a, b`)이 됩니다.
    pub fn from(mut self, table: &Table) -> Self {
        self.sources.push(table.clone());
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // JOIN
    // ─────────────────────────────────────────────────────────────────────────

    pub fn inner_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinKind::Inner, table, on)
    }

    pub fn left_join(self, table: &Table, on: Predicate) -> Self {
        self.join(JoinKind::Left, table, on)
    }

    /// 외래키 컬럼의 참조 선언으로 ON 조건을 만드는 INNER JOIN
    pub fn inner_join_ref(self, fk: &Column, target: &Table) -> Result<Self> {
        self.join_ref(JoinKind::Inner, fk, target)
    }

    /// 외래키 컬럼의 참조 선언으로 ON 조건을 만드는 LEFT JOIN
    pub fn left_join_ref(self, fk: &Column, target: &Table) -> Result<Self> {
        self.join_ref(JoinKind::Left, fk, target)
    }

    pub fn join(mut self, kind: JoinKind, table: &Table, on: Predicate) -> Self {
        self.joins.push(Join {
            kind,
            table: table.clone(),
            on,
        });
        self
    }

    fn join_ref(self, kind: JoinKind, fk: &Column, target: &Table) -> Result<Self> {
        let invalid = || Error::InvalidReference {
            table: fk.table().to_string(),
            column: fk.name().to_string(),
            ref_table: target.name().to_string(),
        };

        let reference = fk.references().ok_or_else(invalid)?;
        if reference.table != target.name() {
            return Err(invalid());
        }

        let target_column = target.column(&reference.column)?;
        Ok(self.join(kind, target, fk.clone().eq(target_column)))
    }

    /// 마지막 조인의 ON 조건에 조건을 추가 (AND)
    pub fn on(mut self, predicate: Predicate) -> Result<Self> {
        let join = self.joins.last_mut().ok_or_else(|| Error::InvalidQuery {
            message: "on() requires a preceding join".to_string(),
        })?;

        let current = std::mem::replace(&mut join.on, Predicate::And(Vec::new()));
        join.on = current.and(predicate);
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // WHERE / GROUP BY / HAVING
    // ─────────────────────────────────────────────────────────────────────────

    /// WHERE 조건 추가 (여러 번 호출하면 AND)
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.filters.push(predicate);
        self
    }

    /// 여러 조건을 한 번에 추가
    pub fn filter_all(mut self, predicates: impl IntoIterator<Item = Predicate>) -> Self {
        self.filters.extend(predicates);
        self
    }

    pub fn group_by<I, E>(mut self, exprs: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Expr>,
    {
        self.group_by.extend(exprs.into_iter().map(Into::into));
        self
    }

    pub fn having(mut self, predicate: Predicate) -> Self {
        self.having.push(predicate);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // ORDER BY / LIMIT / OFFSET
    // ─────────────────────────────────────────────────────────────────────────

    /// 정렬 키 추가
    ///
    /// 지정한 순서대로 복합 정렬 키가 됩니다. 여러 번 호출하면 뒤에 이어 붙습니다.
    pub fn order_by(mut self, specs: impl IntoIterator<Item = OrderSpec>) -> Self {
        self.order_by.extend(specs);
        self
    }

    /// 최대 row 수 (마지막 호출이 적용됨)
    pub fn limit(mut self, limit: i64) -> Result<Self> {
        let value = u64::try_from(limit).map_err(|_| Error::NegativeLimit { value: limit })?;
        self.limit = Some(value);
        Ok(self)
    }

    /// 건너뛸 row 수 (0부터 시작, 마지막 호출이 적용됨)
    pub fn offset(mut self, offset: i64) -> Result<Self> {
        let value = u64::try_from(offset).map_err(|_| Error::NegativeOffset { value: offset })?;
        self.offset = Some(value);
        Ok(self)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 파생 쿼리
    // ─────────────────────────────────────────────────────────────────────────

    /// 같은 소스/조인/조건에 대한 `COUNT(*)` 쿼리
    ///
    /// 정렬과 페이지네이션은 제외됩니다. GROUP BY, HAVING 또는 DISTINCT가 있는
    /// 쿼리는 row 수와 그룹 수가 다르므로 `InvalidQuery`를 반환합니다.
    pub fn count_query(&self) -> Result<Query> {
        if self.is_grouped() || self.distinct {
            return Err(Error::InvalidQuery {
                message: "count_query() does not support grouped or distinct queries".to_string(),
            });
        }

        Ok(Query {
            projections: vec![Projection::new(count_all())],
            sources: self.sources.clone(),
            joins: self.joins.clone(),
            filters: self.filters.clone(),
            ..Query::default()
        })
    }

    /// LIMIT/OFFSET을 제거한 쿼리
    pub fn without_pagination(&self) -> Query {
        Query {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    /// 참조된 모든 컬럼의 테이블이 스코프에 있는지 검사
    pub fn validate(&self) -> Result<()> {
        SqlRenderer::default().render(self).map(|_| ())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // 조회
    // ─────────────────────────────────────────────────────────────────────────

    pub fn projections(&self) -> &[Projection] {
        &self.projections
    }

    pub fn sources(&self) -> &[Table] {
        &self.sources
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn order_specs(&self) -> &[OrderSpec] {
        &self.order_by
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// GROUP BY 또는 HAVING 여부 (HAVING만 있어도 전체가 하나의 그룹)
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty() || !self.having.is_empty()
    }

    /// (limit, offset)
    pub fn pagination(&self) -> (Option<u64>, Option<u64>) {
        (self.limit, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qk_core::schema::{ColumnDef, ColumnType};
    use qk_core::ErrorKind;

    fn tables() -> (Table, Table) {
        let team = Table::define(
            "team",
            vec![
                ColumnDef::new("id", ColumnType::Bigint).primary_key(),
                ColumnDef::new("name", ColumnType::String),
            ],
        )
        .unwrap();
        let member = Table::define(
            "member",
            vec![
                ColumnDef::new("id", ColumnType::Bigint).primary_key(),
                ColumnDef::new("username", ColumnType::String).nullable(),
                ColumnDef::new("age", ColumnType::Int),
                ColumnDef::new("team_id", ColumnType::Bigint)
                    .nullable()
                    .references("team", "id"),
            ],
        )
        .unwrap();
        (team, member)
    }

    #[test]
    fn test_builder_returns_independent_values() {
        let (_, member) = tables();
        let base = select_from(&member);

        let adults = base.clone().filter(member.column("age").unwrap().goe(20));
        let paged = base.clone().limit(2).unwrap();

        assert!(base.filters().is_empty());
        assert_eq!(base.pagination(), (None, None));
        assert_eq!(adults.filters().len(), 1);
        assert_eq!(paged.pagination(), (Some(2), None));
        assert!(paged.filters().is_empty());
    }

    #[test]
    fn test_negative_limit_and_offset() {
        let (_, member) = tables();

        let err = select_from(&member).limit(-1).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Range);
        assert!(matches!(err, Error::NegativeLimit { value: -1 }));

        let err = select_from(&member).offset(-5).unwrap_err();
        assert!(matches!(err, Error::NegativeOffset { value: -5 }));
    }

    #[test]
    fn test_pagination_last_call_wins() {
        let (_, member) = tables();
        let query = select_from(&member)
            .limit(10)
            .and_then(|q| q.offset(3))
            .and_then(|q| q.limit(2))
            .and_then(|q| q.offset(1))
            .unwrap();

        assert_eq!(query.pagination(), (Some(2), Some(1)));
    }

    #[test]
    fn test_join_ref_builds_on_condition() {
        let (team, member) = tables();
        let team_id = member.column("team_id").unwrap();

        let query = select_from(&member).inner_join_ref(&team_id, &team).unwrap();
        assert_eq!(query.joins().len(), 1);
        assert_eq!(query.joins()[0].kind, JoinKind::Inner);
        assert_eq!(query.joins()[0].table.name(), "team");
    }

    #[test]
    fn test_join_ref_rejects_wrong_target() {
        let (team, member) = tables();
        let age = member.column("age").unwrap();
        let team_id = member.column("team_id").unwrap();

        assert!(matches!(
            select_from(&member).left_join_ref(&age, &team),
            Err(Error::InvalidReference { .. })
        ));
        assert!(matches!(
            select_from(&member).left_join_ref(&team_id, &member),
            Err(Error::InvalidReference { .. })
        ));
    }

    #[test]
    fn test_on_requires_join() {
        let (team, member) = tables();
        let result = select_from(&member).on(team.column("name").unwrap().eq("teamA"));
        assert!(matches!(result, Err(Error::InvalidQuery { .. })));
    }

    #[test]
    fn test_count_query_drops_ordering_and_paging() {
        let (_, member) = tables();
        let query = select_from(&member)
            .filter(member.column("age").unwrap().gt(10))
            .order_by([member.column("username").unwrap().desc()])
            .offset(1)
            .and_then(|q| q.limit(2))
            .unwrap();

        let count = query.count_query().unwrap();
        assert_eq!(count.projections().len(), 1);
        assert_eq!(count.filters().len(), 1);
        assert!(count.order_specs().is_empty());
        assert_eq!(count.pagination(), (None, None));

        let grouped = select_from(&member).group_by([member.column("age").unwrap()]);
        assert!(grouped.count_query().is_err());
    }
}
