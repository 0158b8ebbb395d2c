//! 테이블 레지스트리
//!
//! 선언된 테이블들을 이름으로 묶어 관리합니다.
//! 선언 순서를 유지하며, 외래키 참조 검증과 DDL 생성 순서 계산을 담당합니다.

use std::collections::HashSet;

use super::table::Table;
use crate::error::{Error, Result};

/// 스키마 (테이블 집합)
#[derive(Debug, Clone, Default)]
pub struct Schema {
    tables: Vec<Table>,
}

impl Schema {
    /// 빈 스키마 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 테이블 추가
    ///
    /// 같은 이름의 테이블이 이미 있으면 `DuplicateTable`을 반환합니다.
    pub fn add_table(&mut self, table: Table) -> Result<()> {
        if self.has_table(table.name()) {
            return Err(Error::DuplicateTable {
                name: table.name().to_string(),
            });
        }
        self.tables.push(table);
        Ok(())
    }

    /// 테이블 조회
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|t| t.name() == name)
            .ok_or_else(|| Error::UnknownTable {
                name: name.to_string(),
            })
    }

    /// 테이블 존재 여부
    pub fn has_table(&self, name: &str) -> bool {
        self.tables.iter().any(|t| t.name() == name)
    }

    /// 모든 테이블 이름 (선언 순서)
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.iter().map(|t| t.name())
    }

    /// 모든 테이블 (선언 순서)
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// 외래키 참조 검증
    ///
    /// 모든 외래키가 스키마 안의 테이블/컬럼을 가리키는지 확인합니다.
    pub fn validate_references(&self) -> Result<()> {
        for table in &self.tables {
            for column in table.columns_with_references() {
                let Some(reference) = &column.references else {
                    continue;
                };

                let target = self.table(&reference.table).map_err(|_| Error::InvalidReference {
                    table: table.name().to_string(),
                    column: column.name.clone(),
                    ref_table: reference.table.clone(),
                })?;

                if target.find_column(&reference.column).is_none() {
                    return Err(Error::InvalidReference {
                        table: table.name().to_string(),
                        column: column.name.clone(),
                        ref_table: format!("{}.{}", reference.table, reference.column),
                    });
                }
            }
        }

        Ok(())
    }

    /// 참조되는 테이블이 먼저 오도록 정렬한 테이블 목록
    ///
    /// 순환 참조나 자기 참조가 있으면 남은 테이블은 선언 순서대로 뒤에 붙습니다.
    pub fn tables_in_dependency_order(&self) -> Vec<&Table> {
        let mut ordered: Vec<&Table> = Vec::with_capacity(self.tables.len());
        let mut placed: HashSet<&str> = HashSet::new();

        loop {
            let mut progressed = false;
            for table in &self.tables {
                if placed.contains(table.name()) {
                    continue;
                }
                let ready = table.columns_with_references().all(|c| {
                    c.references.as_ref().map_or(true, |r| {
                        r.table == table.name()
                            || placed.contains(r.table.as_str())
                            || !self.has_table(&r.table)
                    })
                });
                if ready {
                    placed.insert(table.name());
                    ordered.push(table);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        for table in &self.tables {
            if !placed.contains(table.name()) {
                ordered.push(table);
            }
        }

        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDef, ColumnType};

    fn member() -> Table {
        Table::define(
            "member",
            vec![
                ColumnDef::new("id", ColumnType::Bigint).primary_key(),
                ColumnDef::new("team_id", ColumnType::Bigint)
                    .nullable()
                    .references("team", "id"),
            ],
        )
        .unwrap()
    }

    fn team() -> Table {
        Table::define(
            "team",
            vec![ColumnDef::new("id", ColumnType::Bigint).primary_key()],
        )
        .unwrap()
    }

    #[test]
    fn test_schema_table_operations() {
        let mut schema = Schema::new();
        schema.add_table(team()).unwrap();

        assert!(schema.has_table("team"));
        assert!(!schema.has_table("member"));
        assert!(schema.table("team").is_ok());
        assert!(matches!(
            schema.table("member"),
            Err(Error::UnknownTable { .. })
        ));
    }

    #[test]
    fn test_duplicate_table_error() {
        let mut schema = Schema::new();
        schema.add_table(team()).unwrap();
        assert!(matches!(
            schema.add_table(team()),
            Err(Error::DuplicateTable { .. })
        ));
    }

    #[test]
    fn test_validate_references() {
        let mut schema = Schema::new();
        schema.add_table(member()).unwrap();
        assert!(matches!(
            schema.validate_references(),
            Err(Error::InvalidReference { .. })
        ));

        schema.add_table(team()).unwrap();
        assert!(schema.validate_references().is_ok());
    }

    #[test]
    fn test_dependency_order() {
        let mut schema = Schema::new();
        schema.add_table(member()).unwrap();
        schema.add_table(team()).unwrap();

        let names: Vec<_> = schema
            .tables_in_dependency_order()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(names, vec!["team", "member"]);
    }
}
