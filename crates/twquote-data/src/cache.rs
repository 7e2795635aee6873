//! 종목 데이터셋 TTL 캐시.
//!
//! Reconciler는 캐시를 알지 못합니다. 호출자가 실행 전에 [`DatasetCache::partition`]으로
//! 적중/미적중 종목을 나누고, 미적중 종목만 통합한 뒤 [`DatasetCache::merge`]로 합칩니다.
//!
//! 키는 (종목 코드, 소스, 조회 월)이며, 조회 실패 결과는 저장하지 않습니다.

use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use twquote_core::{
    month_start, DatasetStatus, ReconciledReport, SourceKind, TickerDataset, TickerSpec,
};

/// 캐시 키.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub ticker_id: String,
    pub source: SourceKind,
    /// 조회 월의 1일
    pub window: NaiveDate,
}

impl CacheKey {
    pub fn new(spec: &TickerSpec, as_of: NaiveDate) -> Self {
        Self {
            ticker_id: spec.id.clone(),
            source: spec.source,
            window: month_start(as_of),
        }
    }
}

struct CacheEntry {
    dataset: TickerDataset,
    stored_at: Instant,
}

/// 데이터셋 캐시.
pub struct DatasetCache {
    ttl: Duration,
    entries: HashMap<CacheKey, CacheEntry>,
}

impl DatasetCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_fresh(&self, entry: &CacheEntry, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }

    /// 유효한 캐시 데이터셋 조회.
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<&TickerDataset> {
        self.entries
            .get(key)
            .filter(|entry| self.is_fresh(entry, now))
            .map(|entry| &entry.dataset)
    }

    /// 종목 목록을 캐시 적중 데이터셋과 조회가 필요한 종목으로 분리.
    ///
    /// 캐시 데이터셋의 표시 이름은 현재 설정 값으로 갱신됩니다.
    pub fn partition(
        &self,
        specs: &[TickerSpec],
        as_of: NaiveDate,
        now: Instant,
    ) -> (Vec<TickerDataset>, Vec<TickerSpec>) {
        let mut hits = Vec::new();
        let mut misses = Vec::new();

        for spec in specs {
            match self.get(&CacheKey::new(spec, as_of), now) {
                Some(dataset) => {
                    let mut dataset = dataset.clone();
                    dataset.display_name = spec.display_name().to_string();
                    hits.push(dataset);
                }
                None => misses.push(spec.clone()),
            }
        }

        debug!(hits = hits.len(), misses = misses.len(), "캐시 조회");
        (hits, misses)
    }

    /// 리포트의 `Ok`/`Empty` 데이터셋 저장.
    ///
    /// # Returns
    /// 저장한 데이터셋 수
    pub fn store(&mut self, report: &ReconciledReport, now: Instant) -> usize {
        let mut stored = 0;
        for dataset in report.iter() {
            if !matches!(
                dataset.status(),
                DatasetStatus::Ok | DatasetStatus::Empty { .. }
            ) {
                continue;
            }
            self.entries.insert(
                CacheKey::new(&dataset.spec(), report.as_of),
                CacheEntry {
                    dataset: dataset.clone(),
                    stored_at: now,
                },
            );
            stored += 1;
        }
        stored
    }

    /// 만료된 항목 제거.
    ///
    /// # Returns
    /// 제거한 항목 수
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
        let evicted = before - self.entries.len();
        if evicted > 0 {
            debug!(evicted, remaining = self.entries.len(), "만료 캐시 제거");
        }
        evicted
    }

    /// 캐시 적중 데이터셋과 새 리포트를 설정 순서대로 병합.
    ///
    /// 결과 리포트의 키 집합은 `specs`의 (중복 제거된) 종목 집합과 같습니다.
    /// 어느 쪽에도 없는 종목은 `FetchFailed`로 채웁니다.
    pub fn merge(
        specs: &[TickerSpec],
        fresh: ReconciledReport,
        hits: Vec<TickerDataset>,
    ) -> ReconciledReport {
        let as_of = fresh.as_of;
        let mut pool: HashMap<String, TickerDataset> = hits
            .into_iter()
            .map(|d| (d.ticker_id.clone(), d))
            .collect();
        for dataset in fresh.into_datasets() {
            pool.entry(dataset.ticker_id.clone()).or_insert(dataset);
        }

        let datasets: Vec<TickerDataset> = specs
            .iter()
            .map(|spec| {
                pool.remove(&spec.id).unwrap_or_else(|| {
                    TickerDataset::unavailable(
                        spec,
                        DatasetStatus::FetchFailed {
                            reason: "결과 누락".to_string(),
                        },
                    )
                })
            })
            .collect();

        ReconciledReport::new(Utc::now(), as_of, datasets)
    }
}
