//! DDL / 시드 데이터 생성기
//!
//! 스키마 모델에서 CREATE TABLE 문과 INSERT 문을 생성합니다.
//! SeaQuery를 사용하며, 시드 INSERT는 값이 이스케이프된 리터럴로 들어간 완성된 SQL입니다.

use sea_query::{
    Alias, ColumnDef as SqColumnDef, Expr, ForeignKey, ForeignKeyAction, PostgresQueryBuilder,
    Query, SimpleExpr, SqliteQueryBuilder, Table as TableQuery, TableCreateStatement,
};

use qk_core::schema::{ColumnDef, ColumnType, ReferentialAction, Schema, Table};
use qk_core::{Error, Result};

use crate::render::Dialect;
use crate::value::Value;

/// CREATE TABLE 생성기
pub struct DdlGenerator;

impl DdlGenerator {
    /// 스키마 전체 DDL
    ///
    /// 참조되는 테이블이 먼저 오도록 정렬합니다.
    pub fn generate(schema: &Schema, dialect: Dialect) -> Vec<String> {
        schema
            .tables_in_dependency_order()
            .into_iter()
            .map(|table| Self::create_table_sql(table, dialect))
            .collect()
    }

    pub fn create_table_sql(table: &Table, dialect: Dialect) -> String {
        let stmt = Self::create_table(table);
        match dialect {
            Dialect::Postgres => stmt.to_string(PostgresQueryBuilder),
            Dialect::Sqlite => stmt.to_string(SqliteQueryBuilder),
        }
    }

    fn create_table(table: &Table) -> TableCreateStatement {
        let mut stmt = TableQuery::create();
        stmt.table(Alias::new(table.name())).if_not_exists();

        for column in table.column_defs() {
            let mut col_def = SqColumnDef::new(Alias::new(&column.name));
            Self::map_type(&mut col_def, column.column_type);

            if column.primary_key {
                col_def.not_null().primary_key();
            } else {
                if !column.nullable {
                    col_def.not_null();
                }
                if column.unique {
                    col_def.unique_key();
                }
            }
            stmt.col(&mut col_def);

            // FK
            if let Some(reference) = &column.references {
                let mut fk = ForeignKey::create();
                fk.from(Alias::new(table.name()), Alias::new(&column.name))
                    .to(Alias::new(&reference.table), Alias::new(&reference.column))
                    .on_delete(Self::map_fk_action(reference.on_delete))
                    .on_update(Self::map_fk_action(reference.on_update));
                stmt.foreign_key(&mut fk);
            }
        }

        stmt
    }

    fn map_type(col_def: &mut SqColumnDef, column_type: ColumnType) {
        match column_type {
            ColumnType::String => {
                col_def.text();
            }
            ColumnType::Int => {
                col_def.integer();
            }
            ColumnType::Bigint => {
                col_def.big_integer();
            }
            ColumnType::Float => {
                col_def.double();
            }
            ColumnType::Boolean => {
                col_def.boolean();
            }
            ColumnType::Timestamp => {
                col_def.timestamp_with_time_zone();
            }
        }
    }

    fn map_fk_action(action: ReferentialAction) -> ForeignKeyAction {
        match action {
            ReferentialAction::Restrict => ForeignKeyAction::Restrict,
            ReferentialAction::NoAction => ForeignKeyAction::NoAction,
            ReferentialAction::Cascade => ForeignKeyAction::Cascade,
            ReferentialAction::SetNull => ForeignKeyAction::SetNull,
            ReferentialAction::SetDefault => ForeignKeyAction::SetDefault,
        }
    }
}

/// 시드용 INSERT 빌더
///
/// ```ignore
/// let sql = InsertBuilder::new(&team)
///     .columns(["id", "name"])?
///     .row([1.into(), "teamA".into()])?
///     .build(Dialect::Sqlite)?;
/// ```
#[derive(Debug, Clone)]
pub struct InsertBuilder<'a> {
    table: &'a Table,
    columns: Vec<&'a ColumnDef>,
    rows: Vec<Vec<Value>>,
}

impl<'a> InsertBuilder<'a> {
    /// 모든 컬럼을 선언 순서대로 사용하는 빌더
    pub fn new(table: &'a Table) -> Self {
        Self {
            table,
            columns: table.column_defs().iter().collect(),
            rows: Vec::new(),
        }
    }

    /// INSERT 대상 컬럼 지정
    pub fn columns<I, S>(mut self, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let table = self.table;
        self.columns = names
            .into_iter()
            .map(|name| {
                let name = name.as_ref();
                table.find_column(name).ok_or_else(|| Error::UnknownColumn {
                    table: table.name().to_string(),
                    column: name.to_string(),
                })
            })
            .collect::<Result<_>>()?;
        Ok(self)
    }

    /// row 추가 (값 개수가 컬럼 수와 같아야 함)
    pub fn row(mut self, values: impl IntoIterator<Item = Value>) -> Result<Self> {
        let values: Vec<Value> = values.into_iter().collect();
        if values.len() != self.columns.len() {
            return Err(Error::InvalidQuery {
                message: format!(
                    "insert into '{}' expects {} values per row, got {}",
                    self.table.name(),
                    self.columns.len(),
                    values.len()
                ),
            });
        }
        self.rows.push(values);
        Ok(self)
    }

    /// SQL 생성
    pub fn build(&self, dialect: Dialect) -> Result<String> {
        if self.rows.is_empty() {
            return Err(Error::InvalidQuery {
                message: format!("insert into '{}' has no rows", self.table.name()),
            });
        }

        let mut query = Query::insert();
        query
            .into_table(Alias::new(self.table.name()))
            .columns(self.columns.iter().map(|c| Alias::new(&c.name)));

        for row in &self.rows {
            query
                .values(row.iter().map(value_to_expr))
                .map_err(|e| Error::InvalidQuery {
                    message: e.to_string(),
                })?;
        }

        Ok(match dialect {
            Dialect::Postgres => query.to_string(PostgresQueryBuilder),
            Dialect::Sqlite => query.to_string(SqliteQueryBuilder),
        })
    }
}

/// Value를 SeaQuery Expr로 변환
fn value_to_expr(value: &Value) -> SimpleExpr {
    match value {
        Value::Null => Expr::val(Option::<String>::None).into(),
        Value::Bool(b) => Expr::val(*b).into(),
        Value::Int(i) => Expr::val(*i).into(),
        Value::Float(f) => Expr::val(*f).into(),
        Value::Text(s) => Expr::val(s.as_str()).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qk_core::schema::SchemaParser;

    const SCHEMA: &str = r#"
version: 1
tables:
  member:
    columns:
      id: { type: bigint, primaryKey: true }
      username: { type: string }
      age: { type: int, nullable: false }
      team_id:
        type: bigint
        references: { table: team, onDelete: set_null }
  team:
    columns:
      id: { type: bigint, primaryKey: true }
      name: { type: string, nullable: false, unique: true }
"#;

    #[test]
    fn test_generate_ddl_in_dependency_order() {
        let schema = SchemaParser::parse_yaml(SCHEMA).unwrap();
        let sqls = DdlGenerator::generate(&schema, Dialect::Postgres);
        assert_eq!(sqls.len(), 2);

        let team = &sqls[0];
        let member = &sqls[1];

        assert!(team.contains("CREATE TABLE IF NOT EXISTS \"team\""));
        assert!(team.contains("\"id\" bigint NOT NULL PRIMARY KEY"));
        assert!(team.contains("\"name\" text NOT NULL UNIQUE"));

        assert!(member.contains("CREATE TABLE IF NOT EXISTS \"member\""));
        assert!(member.contains("\"age\" integer NOT NULL"));
        assert!(!member.contains("\"username\" text NOT NULL"));
        assert!(member.contains("FOREIGN KEY (\"team_id\") REFERENCES \"team\" (\"id\")"));
        assert!(member.contains("ON DELETE SET NULL"));
    }

    #[test]
    fn test_generate_sqlite_ddl() {
        let schema = SchemaParser::parse_yaml(SCHEMA).unwrap();
        let sqls = DdlGenerator::generate(&schema, Dialect::Sqlite);
        assert!(sqls[0].starts_with("CREATE TABLE IF NOT EXISTS \"team\""));
        assert!(sqls[1].contains("REFERENCES \"team\" (\"id\")"));
    }

    #[test]
    fn test_insert_builder() {
        let schema = SchemaParser::parse_yaml(SCHEMA).unwrap();
        let team = schema.table("team").unwrap();

        let sql = InsertBuilder::new(team)
            .row([Value::from(1), Value::from("teamA")])
            .and_then(|b| b.row([Value::from(2), Value::from("teamB")]))
            .and_then(|b| b.build(Dialect::Postgres))
            .unwrap();

        assert!(sql.starts_with("INSERT INTO \"team\" (\"id\", \"name\") VALUES"));
        assert!(sql.contains("'teamA'"));
        assert!(sql.contains("'teamB'"));
    }

    #[test]
    fn test_insert_builder_errors() {
        let schema = SchemaParser::parse_yaml(SCHEMA).unwrap();
        let member = schema.table("member").unwrap();

        assert!(matches!(
            InsertBuilder::new(member).columns(["id", "nickname"]),
            Err(Error::UnknownColumn { .. })
        ));
        assert!(matches!(
            InsertBuilder::new(member).row([Value::from(1)]),
            Err(Error::InvalidQuery { .. })
        ));
        assert!(InsertBuilder::new(member).build(Dialect::Sqlite).is_err());
    }
}
