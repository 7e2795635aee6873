//! 설정 관리.
//!
//! TOML 파일을 읽은 뒤 `TWQUOTE__` 접두사 환경변수로 덮어씁니다.
//! (예: `TWQUOTE__RECONCILE__MAX_CONCURRENCY=8`)

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::types::TickerSpec;

/// 기본 설정 파일 경로.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 데이터 소스 설정
    pub sources: SourcesConfig,
    /// 통합 실행 설정
    pub reconcile: ReconcileConfig,
    /// 데이터셋 캐시 설정
    pub cache: CacheConfig,
    /// 내보내기 설정
    pub export: ExportConfig,
    /// ETF 보유 종목 설정
    pub holdings: HoldingsConfig,
    /// 조회 대상 종목
    pub tickers: Vec<TickerSpec>,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 업스트림 데이터 소스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// 상장 시장 API 기본 URL
    pub twse_base_url: String,
    /// 흥궤 시장 API 기본 URL
    pub tpex_base_url: String,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// User-Agent 헤더
    pub user_agent: String,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            twse_base_url: "https://www.twse.com.tw".to_string(),
            tpex_base_url: "https://www.tpex.org.tw".to_string(),
            request_timeout_secs: 20,
            user_agent: "Mozilla/5.0 (compatible; twquote/0.1)".to_string(),
        }
    }
}

impl SourcesConfig {
    /// 요청 타임아웃을 Duration으로 반환.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// 통합 실행 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// 동시에 처리할 최대 종목 수
    pub max_concurrency: usize,
    /// 배치 전체 마감 시간 (초, 0이면 없음)
    pub batch_deadline_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            batch_deadline_secs: 60,
        }
    }
}

impl ReconcileConfig {
    /// 배치 마감 시간.
    pub fn batch_deadline(&self) -> Option<Duration> {
        (self.batch_deadline_secs > 0).then(|| Duration::from_secs(self.batch_deadline_secs))
    }
}

/// 데이터셋 캐시 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// 유효 기간 (초)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// 내보내기 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportConfig {
    /// 문서용 표에 포함할 최근 행 수
    pub recent_rows: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { recent_rows: 10 }
    }
}

/// ETF 보유 종목 프록시 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HoldingsConfig {
    /// 보유 종목 JSON 프록시 URL
    pub proxy_url: Option<String>,
}

/// 설정 검증 에러.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("종목 코드가 비어 있습니다 (index {0})")]
    EmptyTickerId(usize),

    #[error("max_concurrency는 1 이상이어야 합니다")]
    ZeroConcurrency,
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정 로드.
    ///
    /// 파일이 없으면 기본값과 환경 변수만 사용합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("TWQUOTE")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// 기본 경로에서 설정 로드.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load(DEFAULT_CONFIG_PATH)
    }

    /// 설정 값 검증.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if let Some(index) = self.tickers.iter().position(|t| t.id.trim().is_empty()) {
            return Err(ConfigValidationError::EmptyTickerId(index));
        }
        if self.reconcile.max_concurrency == 0 {
            return Err(ConfigValidationError::ZeroConcurrency);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;

    const SAMPLE: &str = r#"
        [logging]
        level = "debug"

        [reconcile]
        max_concurrency = 2

        [[tickers]]
        id = "00929"
        name = "復華台灣科技優息"
        source = "listed"

        [[tickers]]
        id = "7822"
        source = "emerging"
    "#;

    #[test]
    fn test_parse_toml_with_defaults() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.reconcile.max_concurrency, 2);
        assert_eq!(config.reconcile.batch_deadline(), Some(Duration::from_secs(60)));
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.tickers.len(), 2);
        assert_eq!(config.tickers[1].source, SourceKind::Emerging);
        assert_eq!(config.tickers[1].display_name(), "7822");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        let mut config = AppConfig::default();
        config.reconcile.max_concurrency = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::ZeroConcurrency)
        ));

        let mut config = AppConfig::default();
        config.tickers.push(TickerSpec::new(" ", "", SourceKind::Listed));
        assert!(matches!(
            config.validate(),
            Err(ConfigValidationError::EmptyTickerId(0))
        ));
    }

    #[test]
    fn test_shipped_default_config() {
        let config = AppConfig::load(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/../../config/default.toml"
        ))
        .unwrap();
        assert!(config.validate().is_ok());
        assert!(config.holdings.proxy_url.is_none());
        assert!(config
            .tickers
            .iter()
            .any(|t| t.source == SourceKind::Emerging));
    }

    #[test]
    fn test_zero_deadline_disables() {
        let config = ReconcileConfig {
            max_concurrency: 1,
            batch_deadline_secs: 0,
        };
        assert!(config.batch_deadline().is_none());
    }
}
