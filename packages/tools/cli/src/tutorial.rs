//! 튜토리얼 시나리오
//!
//! 팀 2개, 회원 4명으로 구성된 예제 데이터와 그 위에서 실행하는 쿼리 모음입니다.
//! 일부 시나리오는 기본 데이터에 회원을 추가로 넣은 상태에서 실행됩니다.

use sea_query::{Alias, Query as SqQuery, SqliteQueryBuilder};
use serde::Serialize;

use qk_core::schema::{Column, Schema, SchemaParser, Table};
use qk_core::Result;
use qk_sql::exec::{Page, QueryExecutor, Row};
use qk_sql::prelude::*;
use qk_sql::{DdlGenerator, InsertBuilder};

pub const SCHEMA_YAML: &str = include_str!("../schema/tutorial.yaml");

/// 튜토리얼 스키마와 테이블 핸들
#[derive(Debug, Clone)]
pub struct Catalog {
    pub schema: Schema,
    pub team: Table,
    pub member: Table,
}

impl Catalog {
    pub fn load() -> Result<Self> {
        Self::from_yaml(SCHEMA_YAML)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let schema = SchemaParser::parse_yaml(yaml)?;
        let team = schema.table("team")?.clone();
        let member = schema.table("member")?.clone();
        Ok(Self {
            schema,
            team,
            member,
        })
    }

    fn m(&self, name: &str) -> Result<Column> {
        self.member.column(name)
    }

    fn t(&self, name: &str) -> Result<Column> {
        self.team.column(name)
    }

    /// 회원 컬럼 + 팀 컬럼 (팀 컬럼은 `team.*` 별칭)
    fn member_and_team(&self) -> Vec<Projection> {
        let mut projections = columns_of(&self.member);
        projections.extend(
            self.team
                .columns()
                .into_iter()
                .map(|c| {
                    let alias = format!("team.{}", c.name());
                    c.alias(alias)
                }),
        );
        projections
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// 시드 데이터
// ─────────────────────────────────────────────────────────────────────────────

/// 시드 회원 (id, username, age, team_id)
type SeedMember = (i64, Option<&'static str>, i32, Option<i64>);

const TEAMS: &[(i64, &str)] = &[(1, "teamA"), (2, "teamB")];

const MEMBERS: &[SeedMember] = &[
    (1, Some("member1"), 10, Some(1)),
    (2, Some("member2"), 20, Some(1)),
    (3, Some("member3"), 30, Some(2)),
    (4, Some("member4"), 40, Some(2)),
];

const SORT_MEMBERS: &[SeedMember] = &[
    (5, None, 100, None),
    (6, Some("member5"), 100, None),
    (7, Some("member6"), 100, None),
];

/// 팀 이름과 같은 이름의 회원
const NAMESAKE_MEMBERS: &[SeedMember] = &[
    (5, Some("teamA"), 0, None),
    (6, Some("teamB"), 0, None),
];

// ─────────────────────────────────────────────────────────────────────────────
// 시나리오
// ─────────────────────────────────────────────────────────────────────────────

/// 결과 조회 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchMode {
    /// 전체 row
    List,
    /// 단건 (두 건 이상이면 에러)
    One,
    /// 개수
    Count,
    /// 전체 개수 + 페이지
    Page,
}

pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub fetch: FetchMode,
    extra_members: &'static [SeedMember],
    build: fn(&Catalog) -> Result<Query>,
}

impl Scenario {
    pub fn query(&self, catalog: &Catalog) -> Result<Query> {
        (self.build)(catalog)
    }

    /// 스키마 생성, 기존 데이터 삭제, 시드 INSERT
    pub fn setup_statements(&self, catalog: &Catalog) -> Result<Vec<String>> {
        let mut sqls = DdlGenerator::generate(&catalog.schema, Dialect::Sqlite);

        for table in catalog.schema.tables_in_dependency_order().into_iter().rev() {
            sqls.push(
                SqQuery::delete()
                    .from_table(Alias::new(table.name()))
                    .to_string(SqliteQueryBuilder),
            );
        }

        let mut teams = InsertBuilder::new(&catalog.team);
        for &(id, name) in TEAMS {
            teams = teams.row([Value::from(id), Value::from(name)])?;
        }
        sqls.push(teams.build(Dialect::Sqlite)?);

        let mut members = InsertBuilder::new(&catalog.member);
        for &(id, username, age, team_id) in MEMBERS.iter().chain(self.extra_members) {
            members = members.row([
                Value::from(id),
                Value::from(username),
                Value::from(age),
                Value::from(team_id),
            ])?;
        }
        sqls.push(members.build(Dialect::Sqlite)?);

        Ok(sqls)
    }
}

pub fn scenarios() -> &'static [Scenario] {
    SCENARIOS
}

pub fn find(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.name == name)
}

static SCENARIOS: &[Scenario] = &[
    Scenario {
        name: "start",
        description: "username이 member1인 회원",
        fetch: FetchMode::One,
        extra_members: &[],
        build: |c| Ok(select_from(&c.member).filter(c.m("username")?.eq("member1"))),
    },
    Scenario {
        name: "search",
        description: "username = member1 AND age = 10 (and 체인)",
        fetch: FetchMode::One,
        extra_members: &[],
        build: |c| {
            Ok(select_from(&c.member)
                .filter(c.m("username")?.eq("member1").and(c.m("age")?.eq(10))))
        },
    },
    Scenario {
        name: "search_and_param",
        description: "username = member1 AND age = 10 (조건 목록)",
        fetch: FetchMode::One,
        extra_members: &[],
        build: |c| {
            Ok(select_from(&c.member)
                .filter_all([c.m("username")?.eq("member1"), c.m("age")?.eq(10)]))
        },
    },
    Scenario {
        name: "result_fetch",
        description: "전체 회원 수",
        fetch: FetchMode::Count,
        extra_members: &[],
        build: |c| Ok(select_from(&c.member)),
    },
    Scenario {
        name: "sort",
        description: "나이 내림차순, 이름 오름차순 (이름 없으면 마지막)",
        fetch: FetchMode::List,
        extra_members: SORT_MEMBERS,
        build: |c| {
            Ok(select_from(&c.member)
                .filter(c.m("age")?.eq(100))
                .order_by([c.m("age")?.desc(), c.m("username")?.asc().nulls_last()]))
        },
    },
    Scenario {
        name: "paging1",
        description: "이름 내림차순 2번째부터 2건",
        fetch: FetchMode::List,
        extra_members: &[],
        build: paged_members,
    },
    Scenario {
        name: "paging2",
        description: "이름 내림차순 2번째부터 2건 + 전체 개수",
        fetch: FetchMode::Page,
        extra_members: &[],
        build: paged_members,
    },
    Scenario {
        name: "aggregation",
        description: "회원 수, 나이 합계/평균/최대/최소",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            let age = c.m("age")?;
            Ok(select([
                c.m("id")?.count(),
                age.clone().sum(),
                age.clone().avg(),
                age.clone().max(),
                age.min(),
            ])
            .from(&c.member))
        },
    },
    Scenario {
        name: "group",
        description: "팀 이름별 평균 나이",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select([Projection::from(c.t("name")?), c.m("age")?.avg().into()])
                .from(&c.member)
                .inner_join_ref(&c.m("team_id")?, &c.team)?
                .group_by([c.t("name")?])
                .order_by([c.t("name")?.asc()]))
        },
    },
    Scenario {
        name: "join",
        description: "teamA 소속 회원",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select_from(&c.member)
                .inner_join_ref(&c.m("team_id")?, &c.team)?
                .filter(c.t("name")?.eq("teamA"))
                .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "theta_join",
        description: "이름이 팀 이름과 같은 회원 (연관관계 없는 조인)",
        fetch: FetchMode::List,
        extra_members: NAMESAKE_MEMBERS,
        build: |c| {
            Ok(select_from(&c.member)
                .from(&c.team)
                .filter(c.m("username")?.eq(c.t("name")?))
                .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "join_on_filtering",
        description: "모든 회원 + teamA인 경우만 팀 (left join on)",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select(c.member_and_team())
                .from(&c.member)
                .left_join_ref(&c.m("team_id")?, &c.team)?
                .on(c.t("name")?.eq("teamA"))?
                .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "join_on_no_relation",
        description: "모든 회원 + 이름이 같은 팀 (연관관계 없는 left join)",
        fetch: FetchMode::List,
        extra_members: NAMESAKE_MEMBERS,
        build: |c| {
            Ok(select(c.member_and_team())
                .from(&c.member)
                .left_join(&c.team, c.m("username")?.eq(c.t("name")?))
                .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "sub_query",
        description: "나이가 가장 많은 회원",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            let member_sub = c.member.alias("member_sub");
            Ok(select_from(&c.member).filter(
                c.m("age")?
                    .eq(select([member_sub.column("age")?.max()]).from(&member_sub)),
            ))
        },
    },
    Scenario {
        name: "sub_query_goe",
        description: "나이가 평균 이상인 회원",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            let member_sub = c.member.alias("member_sub");
            Ok(select_from(&c.member)
                .filter(
                    c.m("age")?
                        .goe(select([member_sub.column("age")?.avg()]).from(&member_sub)),
                )
                .order_by([c.m("age")?.asc()]))
        },
    },
    Scenario {
        name: "sub_query_in",
        description: "나이가 10 초과인 회원 (in 서브쿼리)",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            let member_sub = c.member.alias("member_sub");
            let sub_age = member_sub.column("age")?;
            Ok(select_from(&c.member)
                .filter(c.m("age")?.in_subquery(
                    select([sub_age.clone()])
                        .from(&member_sub)
                        .filter(sub_age.gt(10)),
                ))
                .order_by([c.m("age")?.asc()]))
        },
    },
    Scenario {
        name: "select_sub_query",
        description: "회원 이름과 전체 평균 나이 (SELECT 절 서브쿼리)",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            let member_sub = c.member.alias("member_sub");
            let avg_age = select([member_sub.column("age")?.avg()]).from(&member_sub);
            Ok(select([
                Projection::from(c.m("username")?),
                Expr::subquery(avg_age).alias("avg_age"),
            ])
            .from(&c.member)
            .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "basic_case",
        description: "나이별 라벨 (단순 CASE)",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select([c
                .m("age")?
                .when(10)
                .then("열살")
                .when(20)
                .then("스무살")
                .otherwise("기타")])
            .from(&c.member)
            .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "complex_case",
        description: "나이 구간별 라벨 (검색형 CASE)",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select([case()
                .when(c.m("age")?.between(0, 20))
                .then("0~20살")
                .when(c.m("age")?.between(21, 30))
                .then("21~31살")
                .otherwise("기타")])
            .from(&c.member)
            .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "constant",
        description: "회원 이름과 상수 A",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select([Projection::from(c.m("username")?), constant("A").into()])
                .from(&c.member)
                .order_by([c.m("id")?.asc()]))
        },
    },
    Scenario {
        name: "concat",
        description: "{username}_{age} 문자열",
        fetch: FetchMode::List,
        extra_members: &[],
        build: |c| {
            Ok(select([c
                .m("username")?
                .concat("_")
                .concat(c.m("age")?.string_value())])
            .from(&c.member)
            .filter(c.m("username")?.eq("member1")))
        },
    },
];

fn paged_members(c: &Catalog) -> Result<Query> {
    select_from(&c.member)
        .order_by([c.m("username")?.desc()])
        .offset(1)?
        .limit(2)
}

// ─────────────────────────────────────────────────────────────────────────────
// 실행
// ─────────────────────────────────────────────────────────────────────────────

/// 시나리오 실행 결과
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum Outcome {
    Rows(Vec<Row>),
    One(Option<Row>),
    Count(u64),
    Page(Page),
}

impl Outcome {
    /// 결과 row 목록 (개수 조회는 빈 목록)
    pub fn rows(&self) -> &[Row] {
        match self {
            Outcome::Rows(rows) => rows,
            Outcome::One(row) => row.as_ref().map(std::slice::from_ref).unwrap_or(&[]),
            Outcome::Count(_) => &[],
            Outcome::Page(page) => &page.rows,
        }
    }
}

/// 데이터 준비 후 시나리오 실행
pub async fn run(
    executor: &QueryExecutor,
    catalog: &Catalog,
    scenario: &Scenario,
) -> anyhow::Result<Outcome> {
    executor
        .execute_all(&scenario.setup_statements(catalog)?)
        .await?;

    let query = scenario.query(catalog)?;
    let outcome = match scenario.fetch {
        FetchMode::List => Outcome::Rows(executor.fetch(&query).await?),
        FetchMode::One => Outcome::One(executor.fetch_one(&query).await?),
        FetchMode::Count => Outcome::Count(executor.fetch_count(&query).await?),
        FetchMode::Page => Outcome::Page(executor.fetch_page(&query).await?),
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn run_named(name: &str) -> Outcome {
        let catalog = Catalog::load().unwrap();
        let executor = QueryExecutor::connect("sqlite::memory:", 1).await.unwrap();
        let scenario = find(name).unwrap();
        run(&executor, &catalog, scenario).await.unwrap()
    }

    fn texts(outcome: &Outcome, column: usize) -> Vec<Option<String>> {
        outcome
            .rows()
            .iter()
            .map(|r| r.get_index(column).and_then(Value::as_str).map(str::to_string))
            .collect()
    }

    fn ints(outcome: &Outcome, column: &str) -> Vec<i64> {
        outcome
            .rows()
            .iter()
            .filter_map(|r| r.get(column).and_then(Value::as_i64))
            .collect()
    }

    #[test]
    fn test_scenario_names_are_unique_and_render() {
        let catalog = Catalog::load().unwrap();
        let mut names: Vec<_> = scenarios().iter().map(|s| s.name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), scenarios().len());

        for scenario in scenarios() {
            let query = scenario.query(&catalog).unwrap();
            for dialect in [Dialect::Postgres, Dialect::Sqlite] {
                assert!(
                    SqlRenderer::new(dialect).render(&query).is_ok(),
                    "{} failed to render",
                    scenario.name
                );
            }
        }
    }

    #[tokio::test]
    async fn test_single_member_lookups() {
        for name in ["start", "search", "search_and_param"] {
            let outcome = run_named(name).await;
            let Outcome::One(Some(row)) = outcome else {
                panic!("{}: expected a single row", name);
            };
            assert_eq!(row.get("username"), Some(&Value::from("member1")));
        }
    }

    #[tokio::test]
    async fn test_result_fetch_count() {
        assert!(matches!(run_named("result_fetch").await, Outcome::Count(4)));
    }

    #[tokio::test]
    async fn test_sort_nulls_last() {
        let outcome = run_named("sort").await;
        assert_eq!(
            texts(&outcome, 1),
            vec![Some("member5".to_string()), Some("member6".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_paging() {
        assert_eq!(run_named("paging1").await.rows().len(), 2);

        let Outcome::Page(page) = run_named("paging2").await else {
            panic!("expected page");
        };
        assert_eq!(page.total, 4);
        assert_eq!(page.limit, Some(2));
        assert_eq!(page.offset, Some(1));
        assert_eq!(page.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_aggregation() {
        let outcome = run_named("aggregation").await;
        let row = &outcome.rows()[0];
        assert_eq!(row.get_index(0).and_then(Value::as_i64), Some(4));
        assert_eq!(row.get_index(1).and_then(Value::as_i64), Some(100));
        assert_eq!(row.get_index(2).and_then(Value::as_f64), Some(25.0));
        assert_eq!(row.get_index(3).and_then(Value::as_i64), Some(40));
        assert_eq!(row.get_index(4).and_then(Value::as_i64), Some(10));
    }

    #[tokio::test]
    async fn test_group_average_by_team() {
        let outcome = run_named("group").await;
        let rows = outcome.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get_index(0), Some(&Value::from("teamA")));
        assert_eq!(rows[0].get_index(1).and_then(Value::as_f64), Some(15.0));
        assert_eq!(rows[1].get_index(0), Some(&Value::from("teamB")));
        assert_eq!(rows[1].get_index(1).and_then(Value::as_f64), Some(35.0));
    }

    #[tokio::test]
    async fn test_joins() {
        let outcome = run_named("join").await;
        assert_eq!(
            texts(&outcome, 1),
            vec![Some("member1".to_string()), Some("member2".to_string())]
        );

        let outcome = run_named("theta_join").await;
        assert_eq!(
            texts(&outcome, 1),
            vec![Some("teamA".to_string()), Some("teamB".to_string())]
        );
    }

    #[tokio::test]
    async fn test_left_join_on_filtering() {
        let outcome = run_named("join_on_filtering").await;
        let rows = outcome.rows();
        assert_eq!(rows.len(), 4);

        let team_names: Vec<_> = rows.iter().map(|r| r.get("team.name").cloned()).collect();
        assert_eq!(
            team_names,
            vec![
                Some(Value::from("teamA")),
                Some(Value::from("teamA")),
                Some(Value::Null),
                Some(Value::Null),
            ]
        );
    }

    #[tokio::test]
    async fn test_left_join_without_relation() {
        let outcome = run_named("join_on_no_relation").await;
        let rows = outcome.rows();
        assert_eq!(rows.len(), 6);

        let matched: Vec<_> = rows
            .iter()
            .filter(|r| !r.get("team.name").map_or(true, Value::is_null))
            .map(|r| r.get("username").cloned())
            .collect();
        assert_eq!(
            matched,
            vec![Some(Value::from("teamA")), Some(Value::from("teamB"))]
        );
    }

    #[tokio::test]
    async fn test_subqueries() {
        assert_eq!(ints(&run_named("sub_query").await, "age"), vec![40]);
        assert_eq!(ints(&run_named("sub_query_goe").await, "age"), vec![30, 40]);
        assert_eq!(ints(&run_named("sub_query_in").await, "age"), vec![20, 30, 40]);

        let outcome = run_named("select_sub_query").await;
        assert_eq!(outcome.rows().len(), 4);
        assert!(outcome
            .rows()
            .iter()
            .all(|r| r.get("avg_age").and_then(Value::as_f64) == Some(25.0)));
    }

    #[tokio::test]
    async fn test_case_expressions() {
        let outcome = run_named("basic_case").await;
        assert_eq!(
            texts(&outcome, 0),
            vec![
                Some("열살".to_string()),
                Some("스무살".to_string()),
                Some("기타".to_string()),
                Some("기타".to_string()),
            ]
        );

        let outcome = run_named("complex_case").await;
        assert_eq!(
            texts(&outcome, 0),
            vec![
                Some("0~20살".to_string()),
                Some("0~20살".to_string()),
                Some("21~31살".to_string()),
                Some("기타".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_constant_and_concat() {
        let outcome = run_named("constant").await;
        assert_eq!(outcome.rows().len(), 4);
        assert!(texts(&outcome, 1).iter().all(|v| v.as_deref() == Some("A")));

        let outcome = run_named("concat").await;
        assert_eq!(texts(&outcome, 0), vec![Some("member1_10".to_string())]);
    }

    #[tokio::test]
    async fn test_scenarios_can_rerun_on_same_database() {
        let catalog = Catalog::load().unwrap();
        let executor = QueryExecutor::connect("sqlite::memory:", 1).await.unwrap();

        for name in ["sort", "result_fetch", "theta_join", "result_fetch"] {
            let outcome = run(&executor, &catalog, find(name).unwrap()).await.unwrap();
            if let Outcome::Count(count) = outcome {
                assert_eq!(count, 4);
            }
        }
    }
}
