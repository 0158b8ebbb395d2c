//! 테이블 정의
//!
//! 테이블 정의는 선언 후 변경되지 않으며 `Arc`로 공유됩니다.
//! 같은 정의를 다른 이름으로 참조해야 할 때(self join, 서브쿼리)는
//! `Table::alias`로 별칭 핸들을 만듭니다.

use std::collections::HashSet;
use std::sync::Arc;

use super::column::{Column, ColumnDef};
use crate::error::{Error, Result};

#[derive(Debug)]
struct TableDef {
    name: String,
    columns: Vec<ColumnDef>,
}

/// 불변 테이블 핸들
#[derive(Debug, Clone)]
pub struct Table {
    def: Arc<TableDef>,
    alias: Option<String>,
}

impl Table {
    /// 테이블 선언
    ///
    /// 컬럼 순서는 선언 순서 그대로 유지됩니다.
    /// 같은 이름의 컬럼이 두 번 선언되면 `DuplicateColumn`을 반환합니다.
    pub fn define(
        name: impl Into<String>,
        columns: impl IntoIterator<Item = ColumnDef>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::SchemaValidation {
                message: "table name must not be empty".to_string(),
            });
        }

        let columns: Vec<ColumnDef> = columns.into_iter().collect();
        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.trim().is_empty() {
                return Err(Error::SchemaValidation {
                    message: format!("table '{}' has a column with an empty name", name),
                });
            }
            if !seen.insert(column.name.as_str()) {
                return Err(Error::DuplicateColumn {
                    table: name.clone(),
                    column: column.name.clone(),
                });
            }
        }

        if columns.iter().filter(|c| c.primary_key).count() > 1 {
            return Err(Error::SchemaValidation {
                message: format!("table '{}' declares more than one primary key", name),
            });
        }

        Ok(Self {
            def: Arc::new(TableDef { name, columns }),
            alias: None,
        })
    }

    /// 같은 정의를 다른 참조 이름으로 사용하는 핸들
    pub fn alias(&self, alias: impl Into<String>) -> Table {
        Table {
            def: Arc::clone(&self.def),
            alias: Some(alias.into()),
        }
    }

    /// 물리 테이블 이름
    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// 별칭 (없으면 None)
    pub fn alias_name(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// 쿼리 안에서 이 테이블을 가리키는 이름 (별칭 우선)
    pub fn reference_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.def.name)
    }

    /// 컬럼 선언 목록
    pub fn column_defs(&self) -> &[ColumnDef] {
        &self.def.columns
    }

    /// 컬럼 선언 조회
    pub fn find_column(&self, name: &str) -> Option<&ColumnDef> {
        self.def.columns.iter().find(|c| c.name == name)
    }

    /// 이 핸들에 바인딩된 컬럼 조회
    pub fn column(&self, name: &str) -> Result<Column> {
        self.find_column(name)
            .map(|def| Column::bind(self.reference_name(), def))
            .ok_or_else(|| Error::UnknownColumn {
                table: self.reference_name().to_string(),
                column: name.to_string(),
            })
    }

    /// 모든 컬럼 (선언 순서)
    pub fn columns(&self) -> Vec<Column> {
        self.def
            .columns
            .iter()
            .map(|def| Column::bind(self.reference_name(), def))
            .collect()
    }

    /// 기본키 컬럼 선언
    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.def.columns.iter().find(|c| c.primary_key)
    }

    /// 외래키 참조가 있는 컬럼들
    pub fn columns_with_references(&self) -> impl Iterator<Item = &ColumnDef> {
        self.def.columns.iter().filter(|c| c.references.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnType;

    #[test]
    fn test_define_preserves_column_order() {
        let team = Table::define(
            "team",
            vec![
                ColumnDef::new("id", ColumnType::Bigint).primary_key(),
                ColumnDef::new("name", ColumnType::String),
            ],
        )
        .unwrap();

        let names: Vec<_> = team.columns().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["id", "name"]);
        assert_eq!(team.primary_key().unwrap().name, "id");
        assert_eq!(team.reference_name(), "team");
    }

    #[test]
    fn test_duplicate_column_error() {
        let result = Table::define(
            "team",
            vec![
                ColumnDef::new("name", ColumnType::String),
                ColumnDef::new("name", ColumnType::String),
            ],
        );

        match result {
            Err(Error::DuplicateColumn { table, column }) => {
                assert_eq!(table, "team");
                assert_eq!(column, "name");
            }
            other => panic!("Expected DuplicateColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_column_error() {
        let team = Table::define("team", vec![ColumnDef::new("name", ColumnType::String)]).unwrap();
        assert!(matches!(
            team.column("missing"),
            Err(Error::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_alias_shares_definition() {
        let team = Table::define("team", vec![ColumnDef::new("name", ColumnType::String)]).unwrap();
        let other = team.alias("t2");

        assert_eq!(other.name(), "team");
        assert_eq!(other.alias_name(), Some("t2"));
        assert_eq!(other.reference_name(), "t2");
        assert_eq!(team.alias_name(), None);
    }

    #[test]
    fn test_empty_table_name_rejected() {
        assert!(Table::define(" ", Vec::new()).is_err());
    }
}
