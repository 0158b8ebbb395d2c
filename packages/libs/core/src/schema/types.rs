//! 논리적 컬럼 타입 정의
//!
//! DB 엔진에 독립적인 논리적 타입을 사용합니다.
//! DDL 생성과 CAST 렌더링 시 엔진별 타입 이름으로 매핑합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 논리적 컬럼 타입
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// 문자열 (TEXT)
    String,

    /// 32비트 정수
    Int,

    /// 64비트 정수
    Bigint,

    /// 64비트 부동소수점 (Double Precision)
    Float,

    /// 불리언
    Boolean,

    /// 타임스탬프
    Timestamp,
}

impl ColumnType {
    /// 간단한 타입 문자열에서 파싱
    pub fn from_simple_str(s: &str) -> Option<Self> {
        match s {
            "string" | "text" => Some(ColumnType::String),
            "int" | "integer" => Some(ColumnType::Int),
            "bigint" | "long" => Some(ColumnType::Bigint),
            "float" | "double" => Some(ColumnType::Float),
            "boolean" | "bool" => Some(ColumnType::Boolean),
            "timestamp" => Some(ColumnType::Timestamp),
            _ => None,
        }
    }

    /// 스키마 파일에서 쓰는 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int => "int",
            ColumnType::Bigint => "bigint",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
            ColumnType::Timestamp => "timestamp",
        }
    }

    /// Postgres 타입 문자열로 변환
    pub fn to_postgres_type(&self) -> &'static str {
        match self {
            ColumnType::String => "TEXT",
            ColumnType::Int => "INTEGER",
            ColumnType::Bigint => "BIGINT",
            ColumnType::Float => "DOUBLE PRECISION",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Timestamp => "TIMESTAMPTZ",
        }
    }

    /// SQLite 타입(affinity) 문자열로 변환
    pub fn to_sqlite_type(&self) -> &'static str {
        match self {
            ColumnType::String | ColumnType::Timestamp => "TEXT",
            ColumnType::Int | ColumnType::Bigint | ColumnType::Boolean => "INTEGER",
            ColumnType::Float => "REAL",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_type_parsing() {
        assert_eq!(ColumnType::from_simple_str("string"), Some(ColumnType::String));
        assert_eq!(ColumnType::from_simple_str("int"), Some(ColumnType::Int));
        assert_eq!(ColumnType::from_simple_str("bigint"), Some(ColumnType::Bigint));
        assert_eq!(ColumnType::from_simple_str("boolean"), Some(ColumnType::Boolean));
        assert_eq!(ColumnType::from_simple_str("bool"), Some(ColumnType::Boolean));
        assert_eq!(ColumnType::from_simple_str("unknown"), None);
    }

    #[test]
    fn test_engine_type_mapping() {
        assert_eq!(ColumnType::String.to_postgres_type(), "TEXT");
        assert_eq!(ColumnType::Bigint.to_postgres_type(), "BIGINT");
        assert_eq!(ColumnType::Float.to_sqlite_type(), "REAL");
        assert_eq!(ColumnType::Boolean.to_sqlite_type(), "INTEGER");
    }
}
