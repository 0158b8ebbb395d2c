//! 스키마 모델
//!
//! # 개요
//!
//! 쿼리가 참조하는 테이블과 컬럼은 모두 명시적으로 선언됩니다.
//! 선언 시점에 중복/미존재 컬럼을 검사하므로, 렌더링 단계에서는
//! 스코프(어떤 테이블이 FROM/JOIN에 있는지)만 확인하면 됩니다.
//!
//! # 모듈 구조
//!
//! - `types`: 논리적 타입 정의 (string, int, bigint, etc.)
//! - `column`: 컬럼 선언과 테이블에 바인딩된 컬럼 핸들
//! - `table`: 테이블 정의와 별칭 핸들
//! - `ir`: 테이블 레지스트리
//! - `parser`: YAML 파싱 로직

mod column;
mod ir;
mod parser;
mod table;
mod types;

pub use column::{column, Column, ColumnDef, Reference, ReferentialAction};
pub use ir::Schema;
pub use parser::SchemaParser;
pub use table::Table;
pub use types::ColumnType;
