//! 스키마 YAML 파서
//!
//! 선언 스키마 파일을 파싱하여 `Schema`로 변환합니다.
//! 테이블과 컬럼은 파일에 적힌 순서를 그대로 유지합니다.

use serde::Deserialize;
use serde_yaml::{Mapping, Value as YamlValue};

use super::column::{ColumnDef, Reference, ReferentialAction};
use super::ir::Schema;
use super::table::Table;
use super::types::ColumnType;
use crate::error::{Error, Result};

/// 스키마 파서
pub struct SchemaParser;

impl SchemaParser {
    /// 단일 YAML 문자열 파싱
    pub fn parse_yaml(yaml: &str) -> Result<Schema> {
        let raw: RawSchema = serde_yaml::from_str(yaml)?;

        let mut schema = Schema::new();
        for (key, value) in raw.tables {
            let name = Self::mapping_key(&key, "table")?;
            let raw_table: RawTable = serde_yaml::from_value(value)?;
            schema.add_table(Self::convert_raw_table(name, raw_table)?)?;
        }

        // 참조 검증
        schema.validate_references()?;

        Ok(schema)
    }

    /// Raw 테이블을 Table로 변환
    fn convert_raw_table(name: String, raw: RawTable) -> Result<Table> {
        let mut columns = Vec::new();

        for (key, value) in raw.columns {
            let column_name = Self::mapping_key(&key, "column")?;
            let raw_col: RawColumn = serde_yaml::from_value(value)?;
            columns.push(Self::convert_raw_column(column_name, raw_col)?);
        }

        Table::define(name, columns)
    }

    /// Raw 컬럼 변환
    fn convert_raw_column(name: String, raw: RawColumn) -> Result<ColumnDef> {
        let column_type = Self::parse_column_type(&raw)?;
        let primary_key = raw.primary_key.unwrap_or(false);
        let references = raw.references.map(|r| Reference {
            table: r.table,
            column: r.column.unwrap_or_else(|| "id".to_string()),
            on_delete: r.on_delete.unwrap_or_default(),
            on_update: r.on_update.unwrap_or_default(),
        });

        Ok(ColumnDef {
            name,
            column_type,
            // 기본키는 항상 NOT NULL
            nullable: !primary_key && raw.nullable.unwrap_or(true),
            unique: raw.unique.unwrap_or(false),
            primary_key,
            references,
        })
    }

    /// 컬럼 타입 파싱
    fn parse_column_type(raw: &RawColumn) -> Result<ColumnType> {
        let type_str = raw.column_type.as_deref().unwrap_or("string");

        ColumnType::from_simple_str(type_str).ok_or_else(|| Error::InvalidColumnType {
            type_name: type_str.to_string(),
        })
    }

    fn mapping_key(key: &YamlValue, what: &str) -> Result<String> {
        key.as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| Error::SchemaParse {
                message: format!("{} name must be a string, got {:?}", what, key),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Raw YAML 구조체 (serde 역직렬화용)
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default = "default_version")]
    #[allow(dead_code)]
    version: u32,
    // Mapping은 삽입 순서를 유지한다
    tables: Mapping,
}

fn default_version() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct RawTable {
    #[serde(default)]
    columns: Mapping,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawColumn {
    #[serde(rename = "type")]
    column_type: Option<String>,
    nullable: Option<bool>,
    unique: Option<bool>,
    primary_key: Option<bool>,
    references: Option<RawReference>,
}

#[derive(Debug, Deserialize)]
struct RawReference {
    table: String,
    column: Option<String>,
    #[serde(rename = "onDelete")]
    on_delete: Option<ReferentialAction>,
    #[serde(rename = "onUpdate")]
    on_update: Option<ReferentialAction>,
}
