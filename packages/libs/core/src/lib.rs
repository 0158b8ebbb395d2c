//! qk-core: querykit 공통 핵심 라이브러리
//!
//! 쿼리 빌더(`qk-sql`)와 CLI가 공유하는 스키마 모델과 에러 타입을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `schema`: 테이블/컬럼 선언, 선언 스키마(YAML) 파싱
//! - `error`: 공통 에러 타입

pub mod error;
pub mod schema;

pub use error::{Error, ErrorKind, Result};
