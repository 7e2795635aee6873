//! 종목별 데이터셋과 통합 리포트.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::quote::NormalizedQuote;
use crate::error::{FetchError, NormalizeError, UpstreamStatus};
use crate::types::{SourceKind, TickerSpec};

// =============================================================================
// 상태
// =============================================================================

/// 종목 데이터셋의 최종 상태.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DatasetStatus {
    /// 하나 이상의 행 정규화 성공
    Ok,
    /// 조회는 성공했으나 유효한 행 없음 (거래 없음)
    Empty { reason: Option<String> },
    /// 조회 실패 (네트워크, 상태 플래그, 타임아웃)
    FetchFailed { reason: String },
    /// 응답 구조 해석 실패
    ParseFailed { reason: String },
}

impl DatasetStatus {
    /// 어댑터 에러를 상태로 변환.
    ///
    /// 흥궤 시장의 빈 `aaData`처럼 "거래 없음"에 해당하는 경우는 `Empty`로 구분합니다.
    pub fn from_fetch_error(err: &FetchError) -> Self {
        match err {
            FetchError::UpstreamStatus(UpstreamStatus::NoData) => Self::Empty {
                reason: Some(err.to_string()),
            },
            FetchError::Network(_) | FetchError::UpstreamStatus(_) => Self::FetchFailed {
                reason: err.to_string(),
            },
            FetchError::MalformedPayload(_) => Self::ParseFailed {
                reason: err.to_string(),
            },
        }
    }

    /// 표시용 라벨.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Empty { .. } => "無資料",
            Self::FetchFailed { .. } => "連線失敗",
            Self::ParseFailed { .. } => "格式錯誤",
        }
    }

    /// 진단용 사유.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Empty { reason } => reason.as_deref(),
            Self::FetchFailed { reason } | Self::ParseFailed { reason } => Some(reason),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// 종목 파이프라인 진행 단계.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerPhase {
    Pending,
    Fetching,
    Normalizing,
    Ok,
    Empty,
    FetchFailed,
    ParseFailed,
}

impl TickerPhase {
    /// 종료 상태 여부.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Ok | Self::Empty | Self::FetchFailed | Self::ParseFailed
        )
    }
}

impl From<&DatasetStatus> for TickerPhase {
    fn from(status: &DatasetStatus) -> Self {
        match status {
            DatasetStatus::Ok => Self::Ok,
            DatasetStatus::Empty { .. } => Self::Empty,
            DatasetStatus::FetchFailed { .. } => Self::FetchFailed,
            DatasetStatus::ParseFailed { .. } => Self::ParseFailed,
        }
    }
}

impl fmt::Display for TickerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Normalizing => "normalizing",
            Self::Ok => "ok",
            Self::Empty => "empty",
            Self::FetchFailed => "fetch_failed",
            Self::ParseFailed => "parse_failed",
        };
        f.write_str(s)
    }
}

// =============================================================================
// 데이터셋
// =============================================================================

/// 버려진 원시 행 기록.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// 원시 배치 내 행 번호 (0부터)
    pub row_index: usize,
    /// 사유
    pub error: NormalizeError,
}

/// 한 종목의 한 조회 주기 결과.
///
/// `rows`는 상태가 `Ok`일 때만 비어 있지 않으며, 날짜 오름차순입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickerDataset {
    /// 종목 코드
    pub ticker_id: String,
    /// 표시 이름
    pub display_name: String,
    /// 데이터 소스
    pub source: SourceKind,
    rows: Vec<NormalizedQuote>,
    #[serde(flatten)]
    status: DatasetStatus,
    /// 날짜 해석 실패로 버려진 행
    pub row_errors: Vec<RowRejection>,
    /// 비거래일 자리표시로 걸러진 행 수
    pub filtered_placeholders: usize,
}

impl TickerDataset {
    /// 정규화 결과로 데이터셋 생성.
    ///
    /// 행을 날짜 오름차순으로 정렬하고 같은 날짜는 마지막 행만 남깁니다.
    /// 행이 없으면 `Empty` 상태가 되며, 버려진 행이 있으면 그 요약을 사유로 남깁니다.
    pub fn from_rows(
        spec: &TickerSpec,
        mut rows: Vec<NormalizedQuote>,
        row_errors: Vec<RowRejection>,
        filtered_placeholders: usize,
    ) -> Self {
        // 안정 정렬 후 역방향 dedup으로 같은 날짜의 마지막 행 유지
        rows.sort_by_key(|q| q.date);
        rows.reverse();
        rows.dedup_by_key(|q| q.date);
        rows.reverse();

        let status = match (rows.is_empty(), row_errors.first()) {
            (false, _) => DatasetStatus::Ok,
            (true, None) => DatasetStatus::Empty { reason: None },
            // 모든 행이 버려진 경우 거래 없음과 구분되도록 사유 기록
            (true, Some(first)) => DatasetStatus::Empty {
                reason: Some(format!(
                    "{}개 행 모두 정규화 실패 (행 {}: {})",
                    row_errors.len(),
                    first.row_index,
                    first.error
                )),
            },
        };

        Self {
            ticker_id: spec.id.clone(),
            display_name: spec.display_name().to_string(),
            source: spec.source,
            rows,
            status,
            row_errors,
            filtered_placeholders,
        }
    }

    /// 행 없이 실패/빈 상태의 데이터셋 생성.
    ///
    /// `DatasetStatus::Ok`가 전달되면 행이 없으므로 `Empty`로 기록합니다.
    pub fn unavailable(spec: &TickerSpec, status: DatasetStatus) -> Self {
        let status = match status {
            DatasetStatus::Ok => DatasetStatus::Empty { reason: None },
            other => other,
        };
        Self {
            ticker_id: spec.id.clone(),
            display_name: spec.display_name().to_string(),
            source: spec.source,
            rows: Vec::new(),
            status,
            row_errors: Vec::new(),
            filtered_placeholders: 0,
        }
    }

    /// 날짜 오름차순 행.
    pub fn rows(&self) -> &[NormalizedQuote] {
        &self.rows
    }

    /// 최신 행이 먼저 오는 읽기 전용 뷰.
    pub fn descending(&self) -> impl Iterator<Item = &NormalizedQuote> {
        self.rows.iter().rev()
    }

    pub fn status(&self) -> &DatasetStatus {
        &self.status
    }

    /// 가장 최근 거래일 행.
    pub fn latest(&self) -> Option<&NormalizedQuote> {
        self.rows.last()
    }

    /// 원래 종목 지정 복원.
    pub fn spec(&self) -> TickerSpec {
        TickerSpec::new(&self.ticker_id, &self.display_name, self.source)
    }
}

// =============================================================================
// 리포트
// =============================================================================

/// 상태별 집계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total: usize,
    pub ok: usize,
    pub empty: usize,
    pub fetch_failed: usize,
    pub parse_failed: usize,
    /// 전체 정규화 행 수
    pub rows: usize,
    /// 전체 버려진 행 수
    pub rejected_rows: usize,
}

/// 한 번의 통합 실행 결과.
///
/// 키 집합은 해당 실행에 설정된 종목 목록과 같습니다.
#[derive(Debug, Clone, Serialize)]
pub struct ReconciledReport {
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 조회 기준일
    pub as_of: NaiveDate,
    /// 설정 순서의 종목 코드
    tickers: Vec<String>,
    datasets: BTreeMap<String, TickerDataset>,
}

impl ReconciledReport {
    /// 데이터셋 목록으로 리포트 생성.
    ///
    /// 입력 순서가 표시 순서가 되며, 같은 종목 코드가 반복되면 처음 것만 유지합니다.
    pub fn new(
        generated_at: DateTime<Utc>,
        as_of: NaiveDate,
        datasets: impl IntoIterator<Item = TickerDataset>,
    ) -> Self {
        let mut tickers = Vec::new();
        let mut map = BTreeMap::new();
        for dataset in datasets {
            if map.contains_key(&dataset.ticker_id) {
                continue;
            }
            tickers.push(dataset.ticker_id.clone());
            map.insert(dataset.ticker_id.clone(), dataset);
        }
        Self {
            generated_at,
            as_of,
            tickers,
            datasets: map,
        }
    }

    /// 설정 순서의 종목 코드.
    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    /// 종목 데이터셋 조회.
    pub fn get(&self, ticker_id: &str) -> Option<&TickerDataset> {
        self.datasets.get(ticker_id)
    }

    /// 설정 순서로 데이터셋 순회.
    pub fn iter(&self) -> impl Iterator<Item = &TickerDataset> {
        self.tickers.iter().filter_map(|id| self.datasets.get(id))
    }

    /// 종목 코드 → 데이터셋 매핑.
    pub fn datasets(&self) -> &BTreeMap<String, TickerDataset> {
        &self.datasets
    }

    /// 데이터를 제공할 수 없는 종목.
    pub fn unavailable(&self) -> impl Iterator<Item = &TickerDataset> {
        self.iter().filter(|d| !d.status().is_ok())
    }

    /// 종목의 최신 시세.
    pub fn latest(&self, ticker_id: &str) -> Option<&NormalizedQuote> {
        self.get(ticker_id).and_then(TickerDataset::latest)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// 상태별 집계.
    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total: self.len(),
            ..Default::default()
        };
        for dataset in self.iter() {
            match dataset.status() {
                DatasetStatus::Ok => summary.ok += 1,
                DatasetStatus::Empty { .. } => summary.empty += 1,
                DatasetStatus::FetchFailed { .. } => summary.fetch_failed += 1,
                DatasetStatus::ParseFailed { .. } => summary.parse_failed += 1,
            }
            summary.rows += dataset.rows().len();
            summary.rejected_rows += dataset.row_errors.len();
        }
        summary
    }

    /// 데이터셋 소유권 반환 (설정 순서).
    pub fn into_datasets(mut self) -> Vec<TickerDataset> {
        self.tickers
            .iter()
            .filter_map(|id| self.datasets.remove(id))
            .collect()
    }
}
