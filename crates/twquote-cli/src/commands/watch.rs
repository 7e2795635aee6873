//! 주기적 시세 갱신 (캐시 사용).

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use twquote_core::{exchange_today, AppConfig, ReconciledReport, TickerSpec};
use twquote_data::{DatasetCache, Reconciler};

use super::fetch::render_summary;
use super::{build_reconciler, resolve_tickers};

/// 한 번의 갱신 주기.
///
/// 만료 항목 제거 → 캐시 분리 → 미적중 종목만 통합 → 저장 → 설정 순서로 병합.
pub async fn refresh(
    reconciler: &Reconciler,
    cache: &mut DatasetCache,
    specs: &[TickerSpec],
    as_of: NaiveDate,
) -> ReconciledReport {
    let now = Instant::now();
    cache.evict_expired(now);

    let (hits, misses) = cache.partition(specs, as_of, now);
    let fresh = if misses.is_empty() {
        ReconciledReport::new(Utc::now(), as_of, Vec::new())
    } else {
        reconciler.reconcile(&misses, Some(as_of)).await
    };

    let stored = cache.store(&fresh, Instant::now());
    debug!(
        cached = hits.len(),
        fetched = misses.len(),
        stored,
        "갱신 주기 완료"
    );

    DatasetCache::merge(specs, fresh, hits)
}

/// Ctrl-C까지 주기적으로 갱신하며 요약 출력.
pub async fn run_watch(config: &AppConfig, interval: Duration) -> Result<()> {
    let specs = resolve_tickers(config, Vec::new())?;
    let reconciler = build_reconciler(config)?;
    let mut cache = DatasetCache::new(config.cache.ttl());

    info!(
        "=== 감시 모드 시작 (주기: {}초, 캐시 TTL: {}초) ===",
        interval.as_secs(),
        config.cache.ttl_secs
    );

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("종료 신호 수신, 감시 모드 종료 중...");
                break;
            }
            _ = ticker.tick() => {
                let report = refresh(&reconciler, &mut cache, &specs, exchange_today()).await;
                print!("{}", render_summary(&report));
                info!(
                    cached = cache.len(),
                    "=== 갱신 완료, 다음 실행: {}초 후 ===",
                    interval.as_secs()
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use twquote_core::{
        DateCalendar, FetchError, FetchResult, FieldMap, QuoteField, RawBatch, RawQuoteRow,
        SourceAdapter, SourceKind,
    };

    /// 호출 횟수를 세는 어댑터. "FAIL"로 시작하는 종목은 네트워크 실패.
    struct CountingAdapter {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceAdapter for CountingAdapter {
        fn source(&self) -> SourceKind {
            SourceKind::Listed
        }

        async fn fetch_raw(&self, ticker_id: &str, _as_of: NaiveDate) -> FetchResult<RawBatch> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if ticker_id.starts_with("FAIL") {
                return Err(FetchError::Network("connection refused".into()));
            }
            Ok(RawBatch::new(
                SourceKind::Listed,
                DateCalendar::Gregorian,
                FieldMap::positional([(QuoteField::Date, 0), (QuoteField::Close, 1)]),
                vec![RawQuoteRow::from_iter(["2024-01-02", "17.50"])],
            ))
        }
    }

    #[tokio::test]
    async fn test_refresh_serves_cached_datasets() {
        let adapter = Arc::new(CountingAdapter {
            calls: AtomicUsize::new(0),
        });
        let reconciler = Reconciler::builder().adapter(adapter.clone()).build();
        let mut cache = DatasetCache::new(Duration::from_secs(3600));
        let specs = vec![
            TickerSpec::new("00929", "", SourceKind::Listed),
            TickerSpec::new("FAIL1", "", SourceKind::Listed),
        ];
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();

        let first = refresh(&reconciler, &mut cache, &specs, as_of).await;
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(first.summary().ok, 1);

        // 실패 종목만 다시 조회
        let second = refresh(&reconciler, &mut cache, &specs, as_of).await;
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 3);
        assert_eq!(second.tickers(), &["00929", "FAIL1"]);
        assert_eq!(second.get("00929"), first.get("00929"));
    }
}
