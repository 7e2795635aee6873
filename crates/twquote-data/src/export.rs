//! 리포트 내보내기.
//!
//! - CSV: 고정 컬럼 순서의 행 단위 표
//! - 문서용 표: 종목별 최근 N행 (최신순)
//!
//! 내보낸 CSV는 같은 정규화 규칙([`csv_normalizer`])으로 다시 읽을 수 있습니다.

use rust_decimal::Decimal;
use serde::Serialize;
use std::io::{Read, Write};
use tracing::debug;

use twquote_core::{
    DateCalendar, FieldMap, NormalizedQuote, QuoteField, RawQuoteRow, ReconciledReport,
    TickerDataset,
};

use crate::error::Result;
use crate::normalizer::RowNormalizer;

/// CSV 컬럼 순서.
pub const CSV_HEADER: [&str; 9] = [
    "ticker_id",
    "display_name",
    "date",
    "open",
    "high",
    "low",
    "close",
    "change",
    "volume",
];

/// CSV 날짜 형식.
const CSV_DATE_FORMAT: &str = "%Y-%m-%d";

fn cell(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// 화면 표시용 값 (누락은 `-`).
pub fn display_value(value: Option<Decimal>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn write_dataset<W: Write>(wtr: &mut csv::Writer<W>, dataset: &TickerDataset) -> Result<usize> {
    for quote in dataset.rows() {
        wtr.write_record([
            dataset.ticker_id.clone(),
            dataset.display_name.clone(),
            quote.date.format(CSV_DATE_FORMAT).to_string(),
            cell(quote.open),
            cell(quote.high),
            cell(quote.low),
            cell(quote.close),
            cell(quote.change),
            cell(quote.volume),
        ])?;
    }
    Ok(dataset.rows().len())
}

/// 리포트 전체를 CSV로 기록.
///
/// 설정 순서의 종목마다 날짜 오름차순으로 기록합니다.
/// 행이 없는 종목(실패/빈 데이터)은 CSV에 나타나지 않습니다.
///
/// # Returns
/// 기록한 데이터 행 수 (헤더 제외)
pub fn write_csv<W: Write>(report: &ReconciledReport, writer: W) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;

    let mut written = 0;
    for dataset in report.iter() {
        written += write_dataset(&mut wtr, dataset)?;
    }
    wtr.flush()?;

    debug!(rows = written, "CSV 기록 완료");
    Ok(written)
}

/// 데이터셋 하나를 CSV 문자열로 변환.
pub fn dataset_to_csv(dataset: &TickerDataset) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(CSV_HEADER)?;
    write_dataset(&mut wtr, dataset)?;
    let bytes = wtr.into_inner()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// 리포트 전체를 CSV 문자열로 변환.
pub fn report_to_csv(report: &ReconciledReport) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(report, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// 내보낸 CSV의 필드 맵 (위치 기반).
pub fn csv_field_map() -> FieldMap {
    FieldMap::positional([
        (QuoteField::Date, 2),
        (QuoteField::Open, 3),
        (QuoteField::High, 4),
        (QuoteField::Low, 5),
        (QuoteField::Close, 6),
        (QuoteField::Change, 7),
        (QuoteField::Volume, 8),
    ])
}

/// 내보낸 CSV를 다시 읽는 정규화기.
pub fn csv_normalizer() -> RowNormalizer {
    RowNormalizer::new(&csv_field_map(), DateCalendar::Gregorian)
}

/// 내보낸 CSV를 종목별 원시 행으로 읽기 (등장 순서 유지).
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<(String, Vec<RawQuoteRow>)>> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut grouped: Vec<(String, Vec<RawQuoteRow>)> = Vec::new();

    for record in rdr.records() {
        let record = record?;
        let row: RawQuoteRow = record.iter().collect();
        let ticker = row.get(0).unwrap_or_default().to_string();
        match grouped.iter_mut().find(|(id, _)| *id == ticker) {
            Some((_, rows)) => rows.push(row),
            None => grouped.push((ticker, vec![row])),
        }
    }
    Ok(grouped)
}

/// 최신순 최근 `n`행.
pub fn recent_rows(dataset: &TickerDataset, n: usize) -> Vec<&NormalizedQuote> {
    dataset.descending().take(n).collect()
}

/// 문서/리포트용 종목 표.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentTable<'a> {
    pub ticker_id: &'a str,
    pub display_name: &'a str,
    /// 상태 라벨 (실패 종목은 "사용 불가" 표시)
    pub status_label: &'static str,
    /// 진단 사유
    pub reason: Option<&'a str>,
    /// 최신순 행
    pub rows: Vec<&'a NormalizedQuote>,
}

impl DocumentTable<'_> {
    pub fn is_available(&self) -> bool {
        !self.rows.is_empty()
    }
}

/// 설정된 모든 종목의 문서용 표.
///
/// 실패한 종목도 생략하지 않고 빈 행과 상태 라벨로 포함합니다.
pub fn document_tables(report: &ReconciledReport, n: usize) -> Vec<DocumentTable<'_>> {
    report
        .iter()
        .map(|dataset| DocumentTable {
            ticker_id: &dataset.ticker_id,
            display_name: &dataset.display_name,
            status_label: dataset.status().label(),
            reason: dataset.status().reason(),
            rows: recent_rows(dataset, n),
        })
        .collect()
}
