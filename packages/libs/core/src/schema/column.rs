//! 컬럼 정의
//!
//! `ColumnDef`는 테이블 선언에 쓰이는 메타데이터이고,
//! `Column`은 특정 테이블 참조(이름 또는 별칭)에 바인딩된 불변 핸들입니다.

use serde::{Deserialize, Serialize};

use super::table::Table;
use super::types::ColumnType;
use crate::error::{Error, Result};

/// 컬럼 선언
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDef {
    /// 컬럼 이름
    pub name: String,

    /// 컬럼 타입
    #[serde(rename = "type")]
    pub column_type: ColumnType,

    /// NULL 허용 여부
    #[serde(default)]
    pub nullable: bool,

    /// 유니크 제약
    #[serde(default)]
    pub unique: bool,

    /// 기본키 여부
    #[serde(default)]
    pub primary_key: bool,

    /// 외래키 참조
    #[serde(default)]
    pub references: Option<Reference>,
}

impl ColumnDef {
    /// NOT NULL 컬럼 선언
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            unique: false,
            primary_key: false,
            references: None,
        }
    }

    /// NULL 허용
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// 유니크 제약 추가
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 기본키 지정
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// 외래키 참조 지정
    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(Reference {
            table: table.into(),
            column: column.into(),
            on_delete: ReferentialAction::default(),
            on_update: ReferentialAction::default(),
        });
        self
    }
}

/// 외래키 참조 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    /// 참조 대상 테이블
    pub table: String,

    /// 참조 대상 컬럼
    pub column: String,

    /// 참조 대상 삭제 시 동작
    #[serde(default, rename = "onDelete")]
    pub on_delete: ReferentialAction,

    /// 참조 대상 갱신 시 동작
    #[serde(default, rename = "onUpdate")]
    pub on_update: ReferentialAction,
}

/// 참조 무결성 동작
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    /// 참조 위반 시 거부 (기본값)
    #[default]
    Restrict,

    /// 아무 동작 없음 (DB가 나중에 체크)
    NoAction,

    /// 함께 삭제/갱신
    Cascade,

    /// NULL로 설정
    SetNull,

    /// 기본값으로 설정
    SetDefault,
}

/// 테이블 참조에 바인딩된 컬럼
///
/// `table`은 쿼리 안에서 쓰이는 참조 이름입니다. 별칭 핸들
/// (`member.alias("member_sub")`)에서 얻은 컬럼은 별칭을 가리킵니다.
#[derive(Debug, Clone)]
pub struct Column {
    table: String,
    name: String,
    column_type: ColumnType,
    nullable: bool,
    references: Option<Reference>,
}

impl Column {
    pub(crate) fn bind(table: &str, def: &ColumnDef) -> Self {
        Self {
            table: table.to_string(),
            name: def.name.clone(),
            column_type: def.column_type,
            nullable: def.nullable,
            references: def.references.clone(),
        }
    }

    /// 컬럼이 속한 테이블 참조 이름 (별칭 우선)
    pub fn table(&self) -> &str {
        &self.table
    }

    /// 컬럼 이름
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> ColumnType {
        self.column_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// 선언된 외래키 참조
    pub fn references(&self) -> Option<&Reference> {
        self.references.as_ref()
    }

    /// `table.column` 형태의 이름
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.table, self.name)
    }
}

/// 테이블의 컬럼을 타입과 함께 조회
///
/// 선언된 타입과 다르면 `TypeMismatch`를 반환합니다.
pub fn column(table: &Table, name: &str, column_type: ColumnType) -> Result<Column> {
    let column = table.column(name)?;
    if column.column_type() != column_type {
        return Err(Error::TypeMismatch {
            column: column.qualified_name(),
            expected: column_type.to_string(),
            declared: column.column_type().to_string(),
        });
    }
    Ok(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member() -> Table {
        Table::define(
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
        .unwrap()
    }

    #[test]
    fn test_typed_column_lookup() {
        let member = member();
        let age = column(&member, "age", ColumnType::Int).unwrap();
        assert_eq!(age.table(), "member");
        assert_eq!(age.qualified_name(), "member.age");
        assert!(!age.is_nullable());
    }

    #[test]
    fn test_typed_column_mismatch() {
        let member = member();
        let err = column(&member, "age", ColumnType::String).unwrap_err();
        assert!(matches!(err, Error::TypeMismatch { .. }));
    }

    #[test]
    fn test_reference_is_carried_to_handle() {
        let member = member();
        let team_id = member.column("team_id").unwrap();
        let reference = team_id.references().unwrap();
        assert_eq!(reference.table, "team");
        assert_eq!(reference.column, "id");
        assert_eq!(reference.on_delete, ReferentialAction::Restrict);
    }

    #[test]
    fn test_alias_binds_columns_to_alias() {
        let member_sub = member().alias("member_sub");
        let age = member_sub.column("age").unwrap();
        assert_eq!(age.table(), "member_sub");
    }
}
