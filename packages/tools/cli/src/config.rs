//! CLI 설정
//!
//! 우선순위: CLI 플래그 > 환경 변수(`QK_DATABASE_URL`, `QK_DIALECT`) > `~/.qk/config.json` > 기본값

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use qk_sql::Dialect;

const DEFAULT_DATABASE_URL: &str = "sqlite::memory:";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// CLI 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// 데모 실행용 SQLite URL
    pub database_url: Option<String>,

    /// 기본 렌더링 방언
    pub dialect: Option<Dialect>,

    pub max_connections: Option<u32>,
}

impl CliConfig {
    /// 설정 파일 경로
    fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;
        Ok(home.join(".qk").join("config.json"))
    }

    /// 설정 로드
    ///
    /// 홈 디렉터리를 찾을 수 없거나 파일이 없으면 기본값을 사용합니다.
    pub fn load() -> anyhow::Result<Self> {
        let Ok(path) = Self::config_path() else {
            return Ok(Self::default());
        };
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: CliConfig = serde_json::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Invalid config file {}: {}", path.display(), e))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// DB URL 결정
    pub fn database_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| std::env::var("QK_DATABASE_URL").ok())
            .or_else(|| self.database_url.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
    }

    /// 렌더링 방언 결정
    pub fn dialect(&self, flag: Option<Dialect>) -> anyhow::Result<Dialect> {
        if let Some(dialect) = flag {
            return Ok(dialect);
        }
        if let Ok(value) = std::env::var("QK_DIALECT") {
            return value
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid QK_DIALECT: {}", e));
        }
        Ok(self.dialect.unwrap_or_default())
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(DEFAULT_MAX_CONNECTIONS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_file_uses_defaults() {
        let path = std::env::temp_dir().join("qk-missing-config").join("config.json");
        let config = CliConfig::load_from(&path).unwrap();
        assert!(config.database_url.is_none());
        assert_eq!(config.max_connections(), DEFAULT_MAX_CONNECTIONS);
    }

    #[test]
    fn test_config_file_fields() {
        let config: CliConfig =
            serde_json::from_str(r#"{"database_url":"sqlite://qk.db","dialect":"sqlite"}"#).unwrap();
        assert_eq!(config.dialect, Some(Dialect::Sqlite));
        assert_eq!(config.database_url(Some("sqlite::memory:")), "sqlite::memory:");
        assert_eq!(config.dialect(Some(Dialect::Postgres)).unwrap(), Dialect::Postgres);
    }
}
