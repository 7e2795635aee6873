//! CLI 명령어 구현 모듈.

pub mod fetch;
pub mod holdings;
pub mod watch;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use twquote_core::{AppConfig, TickerSpec};
use twquote_data::{HttpTransport, Reconciler};

/// 설정 파일 로드 및 검증.
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let config = AppConfig::load(path)
        .with_context(|| format!("설정 로드 실패: {}", path.display()))?;
    config.validate().context("설정 검증 실패")?;
    debug!(path = %path.display(), tickers = config.tickers.len(), "설정 로드 완료");
    Ok(config)
}

/// 설정의 소스 URL/타임아웃으로 Reconciler 생성.
pub fn build_reconciler(config: &AppConfig) -> Result<Reconciler> {
    let transport = HttpTransport::from_config(&config.sources)?;
    Ok(Reconciler::from_config(config, Arc::new(transport)))
}

/// 명령줄 종목이 있으면 설정 종목 대신 사용.
pub fn resolve_tickers(config: &AppConfig, overrides: Vec<TickerSpec>) -> Result<Vec<TickerSpec>> {
    let tickers = if overrides.is_empty() {
        config.tickers.clone()
    } else {
        info!(count = overrides.len(), "명령줄 종목 사용");
        overrides
    };
    if tickers.is_empty() {
        anyhow::bail!("조회할 종목이 없습니다 (설정 [[tickers]] 또는 --ticker 지정)");
    }
    Ok(tickers)
}

/// 날짜 문자열 파싱 (YYYY-MM-DD)
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("잘못된 날짜 형식: {}. YYYY-MM-DD 형식이어야 합니다", s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use twquote_core::SourceKind;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-01-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
        );
        assert!(parse_date("113/01/05").is_err());
    }

    #[test]
    fn test_resolve_tickers_prefers_overrides() {
        let mut config = AppConfig::default();
        config.tickers = vec![TickerSpec::new("00929", "", SourceKind::Listed)];

        let resolved = resolve_tickers(&config, vec![]).unwrap();
        assert_eq!(resolved[0].id, "00929");

        let resolved =
            resolve_tickers(&config, vec![TickerSpec::new("7822", "", SourceKind::Emerging)])
                .unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, "7822");

        assert!(resolve_tickers(&AppConfig::default(), vec![]).is_err());
    }
}
