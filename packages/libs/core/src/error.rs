//! 공통 에러 타입
//!
//! 스키마 선언, 쿼리 빌드, 렌더링 단계에서 발생하는 에러를 정의합니다.
//! 모든 에러는 입력에 대해 결정적이며 재시도 대상이 아닙니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// querykit 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Schema Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("schema parse error: {message}")]
    SchemaParse { message: String },

    #[error("schema validation error: {message}")]
    SchemaValidation { message: String },

    #[error("duplicate table name: {name}")]
    DuplicateTable { name: String },

    #[error("duplicate column '{column}' on table '{table}'")]
    DuplicateColumn { table: String, column: String },

    #[error("unknown table: {name}")]
    UnknownTable { name: String },

    #[error("unknown column '{column}' on table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("invalid column type: {type_name}")]
    InvalidColumnType { type_name: String },

    #[error("type mismatch for column {column}: expected {expected}, declared {declared}")]
    TypeMismatch {
        column: String,
        expected: String,
        declared: String,
    },

    #[error("invalid reference: table '{table}' column '{column}' references '{ref_table}'")]
    InvalidReference {
        table: String,
        column: String,
        ref_table: String,
    },

    // ─────────────────────────────────────────────────────────────────────────────
    // Query Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("limit must not be negative: {value}")]
    NegativeLimit { value: i64 },

    #[error("offset must not be negative: {value}")]
    NegativeOffset { value: i64 },

    #[error("column '{table}.{column}' is not bound: table '{table}' is not in the query scope")]
    UnboundColumn { table: String, column: String },

    #[error("invalid query: {message}")]
    InvalidQuery { message: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// 에러 분류
///
/// 호출자가 variant를 일일이 매칭하지 않고 실패 종류만 판단할 때 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 테이블/컬럼 선언 또는 참조 오류 (build time)
    Schema,
    /// 음수 limit/offset
    Range,
    /// 스코프에 없는 테이블의 컬럼 참조 (render time)
    UnboundColumn,
    /// 구조적으로 렌더링할 수 없는 쿼리
    Query,
    /// 스키마 파일 파싱 실패
    Parse,
}

impl Error {
    /// 에러 분류 반환
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::SchemaValidation { .. }
            | Error::DuplicateTable { .. }
            | Error::DuplicateColumn { .. }
            | Error::UnknownTable { .. }
            | Error::UnknownColumn { .. }
            | Error::InvalidColumnType { .. }
            | Error::TypeMismatch { .. }
            | Error::InvalidReference { .. } => ErrorKind::Schema,

            Error::NegativeLimit { .. } | Error::NegativeOffset { .. } => ErrorKind::Range,

            Error::UnboundColumn { .. } => ErrorKind::UnboundColumn,

            Error::InvalidQuery { .. } => ErrorKind::Query,

            Error::SchemaParse { .. } | Error::Yaml(_) => ErrorKind::Parse,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::SchemaParse { .. } => "SCHEMA_PARSE_ERROR",
            Error::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
            Error::DuplicateTable { .. } => "DUPLICATE_TABLE",
            Error::DuplicateColumn { .. } => "DUPLICATE_COLUMN",
            Error::UnknownTable { .. } => "UNKNOWN_TABLE",
            Error::UnknownColumn { .. } => "UNKNOWN_COLUMN",
            Error::InvalidColumnType { .. } => "INVALID_COLUMN_TYPE",
            Error::TypeMismatch { .. } => "TYPE_MISMATCH",
            Error::InvalidReference { .. } => "INVALID_REFERENCE",
            Error::NegativeLimit { .. } => "NEGATIVE_LIMIT",
            Error::NegativeOffset { .. } => "NEGATIVE_OFFSET",
            Error::UnboundColumn { .. } => "UNBOUND_COLUMN",
            Error::InvalidQuery { .. } => "INVALID_QUERY",
            Error::Yaml(_) => "YAML_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_mapping() {
        let err = Error::DuplicateColumn {
            table: "member".to_string(),
            column: "age".to_string(),
        };
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(err.code(), "DUPLICATE_COLUMN");

        assert_eq!(Error::NegativeLimit { value: -1 }.kind(), ErrorKind::Range);
        assert_eq!(
            Error::UnboundColumn {
                table: "team".to_string(),
                column: "name".to_string(),
            }
            .kind(),
            ErrorKind::UnboundColumn
        );
    }

    #[test]
    fn test_error_message() {
        let err = Error::UnknownColumn {
            table: "member".to_string(),
            column: "nickname".to_string(),
        };
        assert_eq!(err.to_string(), "unknown column 'nickname' on table 'member'");
    }
}
