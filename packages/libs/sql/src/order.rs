//! 정렬 지정

use crate::expr::Expr;

/// 정렬 방향
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// NULL 위치
///
/// `Default`는 NULLS 절을 렌더링하지 않으므로 DB 기본 동작을 따릅니다.
/// (Postgres: ASC에서 NULL이 마지막, SQLite: ASC에서 NULL이 처음)
/// 결과 순서가 NULL 위치에 의존한다면 `First`/`Last`를 명시해야 합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullOrdering {
    #[default]
    Default,
    First,
    Last,
}

/// 정렬 키 하나
#[derive(Debug, Clone)]
pub struct OrderSpec {
    pub expr: Expr,
    pub direction: Direction,
    pub nulls: NullOrdering,
}

impl OrderSpec {
    pub fn new(expr: impl Into<Expr>, direction: Direction) -> Self {
        Self {
            expr: expr.into(),
            direction,
            nulls: NullOrdering::Default,
        }
    }

    pub fn nulls_first(mut self) -> Self {
        self.nulls = NullOrdering::First;
        self
    }

    pub fn nulls_last(mut self) -> Self {
        self.nulls = NullOrdering::Last;
        self
    }
}
