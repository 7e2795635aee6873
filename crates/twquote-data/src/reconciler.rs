//! 여러 종목의 어댑터 + 정규화 파이프라인을 실행해 하나의 리포트로 통합합니다.
//!
//! Reconciler는 에러 경계입니다. 행 단위 에러는 종목을 실패시키지 않고,
//! 종목 단위 에러는 배치를 실패시키지 않습니다. 호출자는 종목별 상태만 봅니다.
//!
//! 종목별 상태 전이:
//!
//! ```text
//! Pending → Fetching → Normalizing → Ok | Empty
//!                    ↘ FetchFailed | ParseFailed
//! ```

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, info, warn, Instrument};

use twquote_core::{
    exchange_today, ticker_span, AppConfig, DatasetStatus, QuoteTransport, ReconciledReport,
    SourceAdapter, SourceKind, TickerDataset, TickerPhase, TickerSpec,
};

use crate::normalizer::{normalize_batch, NormalizedBatch};
use crate::provider::{EmergingMarketAdapter, ListedMarketAdapter};

/// 기본 동시 처리 종목 수.
const DEFAULT_MAX_CONCURRENCY: usize = 4;

/// 종목별 파이프라인 실행기.
///
/// 상태를 갖지 않으며 캐시를 알지 못합니다.
pub struct Reconciler {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
    max_concurrency: usize,
    batch_deadline: Option<Duration>,
}

/// [`Reconciler`] 빌더.
pub struct ReconcilerBuilder {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
    max_concurrency: usize,
    batch_deadline: Option<Duration>,
}

impl Default for ReconcilerBuilder {
    fn default() -> Self {
        Self {
            adapters: HashMap::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            batch_deadline: None,
        }
    }
}

impl ReconcilerBuilder {
    /// 소스 어댑터 등록. 같은 소스는 마지막 등록이 우선합니다.
    pub fn adapter(mut self, adapter: Arc<dyn SourceAdapter>) -> Self {
        self.adapters.insert(adapter.source(), adapter);
        self
    }

    /// 동시에 처리할 최대 종목 수 (최소 1).
    pub fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = n.max(1);
        self
    }

    /// 배치 전체 마감 시간.
    pub fn batch_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.batch_deadline = deadline;
        self
    }

    pub fn build(self) -> Reconciler {
        Reconciler {
            adapters: self.adapters,
            max_concurrency: self.max_concurrency,
            batch_deadline: self.batch_deadline,
        }
    }
}

impl Reconciler {
    pub fn builder() -> ReconcilerBuilder {
        ReconcilerBuilder::default()
    }

    /// 설정으로 상장/흥궤 어댑터를 모두 등록한 Reconciler 생성.
    pub fn from_config(config: &AppConfig, transport: Arc<dyn QuoteTransport>) -> Self {
        Self::builder()
            .adapter(Arc::new(ListedMarketAdapter::new(
                transport.clone(),
                config.sources.twse_base_url.clone(),
            )))
            .adapter(Arc::new(EmergingMarketAdapter::new(
                transport,
                config.sources.tpex_base_url.clone(),
            )))
            .max_concurrency(config.reconcile.max_concurrency)
            .batch_deadline(config.reconcile.batch_deadline())
            .build()
    }

    /// 종목 목록 전체를 처리해 리포트 생성.
    ///
    /// 실패하지 않습니다. 리포트의 키 집합은 (중복 제거된) 입력 종목 집합과 같고,
    /// 마감 시간 내에 끝나지 못한 종목은 `FetchFailed`로 기록됩니다.
    ///
    /// # Arguments
    /// * `specs` - 조회 대상 종목 (순서 유지)
    /// * `as_of` - 기준일 (기본: 거래소 현지 오늘)
    pub async fn reconcile(
        &self,
        specs: &[TickerSpec],
        as_of: Option<NaiveDate>,
    ) -> ReconciledReport {
        let as_of = as_of.unwrap_or_else(exchange_today);
        let specs = dedup_specs(specs);
        let deadline = self.batch_deadline.map(|d| Instant::now() + d);

        info!(
            tickers = specs.len(),
            as_of = %as_of,
            max_concurrency = self.max_concurrency,
            "시세 통합 시작"
        );

        let mut results: Vec<(usize, TickerDataset)> = stream::iter(specs.iter().enumerate())
            .map(|(index, spec)| async move {
                let pipeline = self.process_ticker(spec, as_of);
                let dataset = match deadline {
                    Some(deadline) => match timeout_at(deadline, pipeline).await {
                        Ok(dataset) => dataset,
                        Err(_) => {
                            warn!(ticker = %spec.id, "배치 마감 시간 초과");
                            TickerDataset::unavailable(
                                spec,
                                DatasetStatus::FetchFailed {
                                    reason: "배치 마감 시간 초과".to_string(),
                                },
                            )
                        }
                    },
                    None => pipeline.await,
                };
                (index, dataset)
            })
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        results.sort_by_key(|(index, _)| *index);
        let report = ReconciledReport::new(
            Utc::now(),
            as_of,
            results.into_iter().map(|(_, dataset)| dataset),
        );

        let summary = report.summary();
        info!(
            total = summary.total,
            ok = summary.ok,
            empty = summary.empty,
            fetch_failed = summary.fetch_failed,
            parse_failed = summary.parse_failed,
            rows = summary.rows,
            "시세 통합 완료"
        );
        report
    }

    /// 종목 하나의 조회 → 정규화 → 정렬.
    pub async fn process_ticker(&self, spec: &TickerSpec, as_of: NaiveDate) -> TickerDataset {
        let span = ticker_span!("ticker", spec.id, spec.source);
        async move {
            debug!(phase = %TickerPhase::Pending);

            let Some(adapter) = self.adapters.get(&spec.source) else {
                warn!("등록된 어댑터 없음");
                return TickerDataset::unavailable(
                    spec,
                    DatasetStatus::FetchFailed {
                        reason: format!("{} 소스 어댑터가 등록되지 않았습니다", spec.source),
                    },
                );
            };

            debug!(phase = %TickerPhase::Fetching);
            let batch = match adapter.fetch_raw(&spec.id, as_of).await {
                Ok(batch) => batch,
                Err(err) => {
                    let status = DatasetStatus::from_fetch_error(&err);
                    warn!(
                        phase = %TickerPhase::from(&status),
                        error = %err,
                        "원시 시세 조회 실패"
                    );
                    return TickerDataset::unavailable(spec, status);
                }
            };

            debug!(phase = %TickerPhase::Normalizing, raw_rows = batch.rows.len());
            let NormalizedBatch { quotes, rejections } = normalize_batch(batch);

            let before = quotes.len();
            let rows: Vec<_> = quotes.into_iter().filter(|q| !q.is_placeholder()).collect();
            let filtered = before - rows.len();

            let dataset = TickerDataset::from_rows(spec, rows, rejections, filtered);
            info!(
                phase = %TickerPhase::from(dataset.status()),
                rows = dataset.rows().len(),
                dropped = dataset.row_errors.len(),
                placeholders = filtered,
                "종목 처리 완료"
            );
            dataset
        }
        .instrument(span)
        .await
    }
}

/// 종목 코드 기준 중복 제거 (처음 것 유지).
fn dedup_specs(specs: &[TickerSpec]) -> Vec<TickerSpec> {
    let mut seen = HashSet::new();
    specs
        .iter()
        .filter(|spec| {
            let fresh = seen.insert(spec.id.clone());
            if !fresh {
                warn!(ticker = %spec.id, "중복 종목 무시");
            }
            fresh
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_specs_keeps_first() {
        let specs = vec![
            TickerSpec::new("2330", "a", SourceKind::Listed),
            TickerSpec::new("7822", "b", SourceKind::Emerging),
            TickerSpec::new("2330", "c", SourceKind::Emerging),
        ];
        let deduped = dedup_specs(&specs);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, "a");
    }

    #[tokio::test]
    async fn test_missing_adapter_is_fetch_failed() {
        let reconciler = Reconciler::builder().build();
        let specs = vec![TickerSpec::new("2330", "台積電", SourceKind::Listed)];
        let report = reconciler
            .reconcile(&specs, NaiveDate::from_ymd_opt(2024, 1, 5))
            .await;

        let dataset = report.get("2330").unwrap();
        assert!(matches!(dataset.status(), DatasetStatus::FetchFailed { .. }));
        assert!(dataset.rows().is_empty());
    }
}
