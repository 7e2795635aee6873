//! 한 번의 시세 통합 실행 및 결과 출력.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

use twquote_core::{AppConfig, ReconciledReport, TickerSpec};
use twquote_data::export::{display_value, document_tables, write_csv};

use super::{build_reconciler, resolve_tickers};

/// fetch 명령 옵션.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// 명령줄 종목 (비어 있으면 설정 종목)
    pub tickers: Vec<TickerSpec>,
    /// 기준일
    pub as_of: Option<NaiveDate>,
    /// CSV 출력 경로
    pub csv_path: Option<PathBuf>,
    /// 종목별 상세 행 수 (기본: 설정 값)
    pub recent: Option<usize>,
    /// 리포트를 JSON으로 출력
    pub json: bool,
}

/// 통합 실행 후 결과 출력.
pub async fn run_fetch(config: &AppConfig, options: FetchOptions) -> Result<ReconciledReport> {
    let specs = resolve_tickers(config, options.tickers)?;
    let reconciler = build_reconciler(config)?;

    let report = reconciler.reconcile(&specs, options.as_of).await;

    if let Some(path) = &options.csv_path {
        let rows = save_csv(&report, path)?;
        println!("CSV 저장 완료: {} ({} 행)", path.display(), rows);
    }

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        let recent = options.recent.unwrap_or(config.export.recent_rows);
        print!("{}", render_summary(&report));
        print!("{}", render_recent(&report, recent));
    }

    Ok(report)
}

/// CSV 파일 저장 (상위 디렉토리 자동 생성).
pub fn save_csv(report: &ReconciledReport, path: &Path) -> Result<usize> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(path)
        .with_context(|| format!("출력 파일 생성 실패: {}", path.display()))?;
    let rows = write_csv(report, BufWriter::new(file))?;

    info!(path = %path.display(), rows, "CSV 저장 완료");
    Ok(rows)
}

/// 종목별 상태 요약 표.
pub fn render_summary(report: &ReconciledReport) -> String {
    let mut out = format!("\n기준일: {}\n", report.as_of);
    out.push_str(&format!(
        "{:<8} {:<16} {:<6} {:<8} {:>6} {:>12} {:>12} {:>10}\n",
        "종목", "이름", "소스", "상태", "행", "최근일", "종가", "등락"
    ));
    out.push_str(&"-".repeat(88));
    out.push('\n');

    for dataset in report.iter() {
        let latest = dataset.latest();
        out.push_str(&format!(
            "{:<8} {:<16} {:<6} {:<8} {:>6} {:>12} {:>12} {:>10}\n",
            dataset.ticker_id,
            dataset.display_name,
            dataset.source.as_str(),
            dataset.status().label(),
            dataset.rows().len(),
            latest.map(|q| q.date.to_string()).unwrap_or_else(|| "-".into()),
            display_value(latest.and_then(|q| q.close)),
            display_value(latest.and_then(|q| q.change)),
        ));
    }

    let summary = report.summary();
    out.push_str(&format!(
        "\n총 {}종목: 성공 {}, 빈 데이터 {}, 조회 실패 {}, 파싱 실패 {} (행 {}, 버려진 행 {})\n",
        summary.total,
        summary.ok,
        summary.empty,
        summary.fetch_failed,
        summary.parse_failed,
        summary.rows,
        summary.rejected_rows
    ));
    out
}

/// 종목별 최근 `n`행 상세.
///
/// 데이터가 없는 종목은 상태 라벨과 사유만 표시합니다.
pub fn render_recent(report: &ReconciledReport, n: usize) -> String {
    let mut out = String::new();
    if n == 0 {
        return out;
    }

    for table in document_tables(report, n) {
        out.push_str(&format!("\n[{}] {}\n", table.ticker_id, table.display_name));
        if !table.is_available() {
            out.push_str(&format!(
                "  {} {}\n",
                table.status_label,
                table.reason.unwrap_or_default()
            ));
            continue;
        }

        out.push_str(&format!(
            "  {:<12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>16}\n",
            "날짜", "시가", "고가", "저가", "종가", "등락", "거래량"
        ));
        for q in &table.rows {
            out.push_str(&format!(
                "  {:<12} {:>10} {:>10} {:>10} {:>10} {:>10} {:>16}\n",
                q.date.to_string(),
                display_value(q.open),
                display_value(q.high),
                display_value(q.low),
                display_value(q.close),
                display_value(q.change),
                display_value(q.volume),
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use twquote_core::{DatasetStatus, NormalizedQuote, SourceKind, TickerDataset};

    fn report() -> ReconciledReport {
        let ok = TickerSpec::new("00929", "復華台灣科技優息", SourceKind::Listed);
        let empty = TickerSpec::new("7822", "", SourceKind::Emerging);

        let mut quote = NormalizedQuote::empty(NaiveDate::from_ymd_opt(2024, 1, 3).unwrap());
        quote.close = Some(dec!(17.52));
        quote.change = Some(dec!(0.12));

        ReconciledReport::new(
            Utc::now(),
            NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            vec![
                TickerDataset::from_rows(&ok, vec![quote], vec![], 0),
                TickerDataset::unavailable(&empty, DatasetStatus::Empty { reason: None }),
            ],
        )
    }

    #[test]
    fn test_render_summary_lists_every_ticker() {
        let text = render_summary(&report());
        assert!(text.contains("00929"));
        assert!(text.contains("17.52"));
        assert!(text.contains("7822"));
        assert!(text.contains("無資料"));
        assert!(text.contains("총 2종목: 성공 1, 빈 데이터 1"));
    }

    #[test]
    fn test_render_recent() {
        let text = render_recent(&report(), 5);
        assert!(text.contains("[00929] 復華台灣科技優息"));
        assert!(text.contains("2024-01-03"));
        assert!(text.contains("[7822] 7822"));
        assert!(render_recent(&report(), 0).is_empty());
    }

    #[test]
    fn test_save_csv_creates_parent_dirs() {
        let dir = std::env::temp_dir().join(format!("twquote-test-{}", std::process::id()));
        let path = dir.join("nested").join("quotes.csv");

        let rows = save_csv(&report(), &path).unwrap();
        assert_eq!(rows, 1);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("ticker_id,display_name,date"));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
