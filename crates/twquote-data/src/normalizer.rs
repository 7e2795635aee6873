//! 원시 행 정규화.
//!
//! 소스마다 다른 숫자 표기(천 단위 쉼표, `+` 부호, 센티널 문자)와
//! 날짜 표기(민국 기년)를 정규 스키마로 변환합니다.
//!
//! 숫자 셀을 해석할 수 없으면 해당 필드만 누락(`None`)으로 두고,
//! 날짜를 해석할 수 없을 때만 행을 버립니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, warn};

use twquote_core::{
    from_roc_year, DateCalendar, FieldMap, NormalizeError, NormalizedQuote, QuoteField, RawBatch,
    RawQuoteRow, ResolvedFields, RowRejection,
};

/// 누락을 뜻하는 자리표시 토큰.
const MISSING_TOKENS: [&str; 6] = ["", "-", "--", "---", "N/A", "NA"];

/// 숫자 셀 텍스트를 Decimal로 정리.
///
/// 쉼표, 선행 `+`, 센티널 문자 `X`를 제거합니다.
/// 자리표시 토큰이거나 정리 후에도 숫자가 아니면 `None`입니다.
/// 이미 정리된 숫자 텍스트에 다시 적용해도 같은 값이 나옵니다.
pub fn clean_numeric(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if MISSING_TOKENS.contains(&trimmed) {
        return None;
    }

    let stripped: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | 'X' | 'x') && !c.is_whitespace())
        .collect();
    let unsigned = stripped.strip_prefix('+').unwrap_or(&stripped);
    if unsigned.is_empty() || unsigned.contains('_') {
        return None;
    }

    Decimal::from_str(unsigned).ok()
}

/// 소스 날짜 문자열을 서기 날짜로 변환.
///
/// - 민국 기년: `113/01/02`, `113-01-02`, `1130102`
/// - 서기: `2024-01-02`, `2024/01/02`, `20240102`
///
/// 끝에 붙은 각주 표시(`*`, `＊`)는 무시합니다.
pub fn parse_source_date(raw: &str, calendar: DateCalendar) -> Option<NaiveDate> {
    let token = raw.trim().trim_end_matches(['*', '＊']).trim();
    if token.is_empty() {
        return None;
    }

    match calendar {
        DateCalendar::Roc => parse_roc_date(token),
        DateCalendar::Gregorian => parse_gregorian_date(token),
    }
}

/// 서기 날짜. 연도는 4자리만 허용합니다.
fn parse_gregorian_date(token: &str) -> Option<NaiveDate> {
    if !token.bytes().all(|b| b.is_ascii_digit() || b == b'-' || b == b'/') {
        return None;
    }

    let parts: Vec<&str> = token.split(['/', '-']).collect();
    let (year, month, day) = match parts.as_slice() {
        [y, m, d] => (*y, *m, *d),
        [compact] if compact.len() == 8 => (&compact[..4], &compact[4..6], &compact[6..]),
        _ => return None,
    };

    let valid_len = |s: &str, max: usize| !s.is_empty() && s.len() <= max;
    if year.len() != 4 || !valid_len(month, 2) || !valid_len(day, 2) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn parse_roc_date(token: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = token.split(['/', '-']).collect();
    let (year, month, day) = match parts.as_slice() {
        [y, m, d] => (*y, *m, *d),
        // 구분자 없는 7자리 (yyyMMdd)
        [compact] if compact.len() == 7 && compact.bytes().all(|b| b.is_ascii_digit()) => {
            (&compact[..3], &compact[3..5], &compact[5..])
        }
        _ => return None,
    };

    if year.is_empty() || year.len() > 3 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = year.parse().ok()?;
    let month: u32 = month.parse().ok()?;
    let day: u32 = day.parse().ok()?;
    NaiveDate::from_ymd_opt(from_roc_year(year), month, day)
}

/// 한 배치의 정규화 결과.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    /// 정규화에 성공한 행 (원시 순서)
    pub quotes: Vec<NormalizedQuote>,
    /// 버려진 행
    pub rejections: Vec<RowRejection>,
}

/// 필드 맵 하나에 대한 행 정규화기.
///
/// 이름 기반 필드 맵은 생성 시 한 번만 컬럼 인덱스로 해석합니다.
#[derive(Debug, Clone)]
pub struct RowNormalizer {
    fields: ResolvedFields,
    calendar: DateCalendar,
}

impl RowNormalizer {
    pub fn new(field_map: &FieldMap, calendar: DateCalendar) -> Self {
        let fields = field_map.resolve();
        for field in QuoteField::ALL {
            if fields.index_of(field).is_none() {
                debug!(field = field.as_str(), "필드 맵에 없는 필드 (누락 처리)");
            }
        }
        Self { fields, calendar }
    }

    /// 배치의 필드 맵/달력으로 생성.
    pub fn for_batch(batch: &RawBatch) -> Self {
        Self::new(&batch.field_map, batch.calendar)
    }

    fn cell<'a>(&self, row: &'a RawQuoteRow, field: QuoteField) -> Option<&'a str> {
        self.fields.index_of(field).and_then(|i| row.get(i))
    }

    /// 원시 행 하나를 정규화.
    ///
    /// # Errors
    ///
    /// - `NormalizeError::MissingDateColumn`: 필드 맵에 날짜 컬럼이 없음
    /// - `NormalizeError::UnparsableDate`: 날짜 셀 해석 실패
    pub fn normalize(&self, row: &RawQuoteRow) -> Result<NormalizedQuote, NormalizeError> {
        if self.fields.index_of(QuoteField::Date).is_none() {
            return Err(NormalizeError::MissingDateColumn);
        }

        let raw_date = self.cell(row, QuoteField::Date).unwrap_or_default();
        let date = parse_source_date(raw_date, self.calendar).ok_or_else(|| {
            NormalizeError::UnparsableDate {
                raw: raw_date.to_string(),
            }
        })?;

        let mut quote = NormalizedQuote::empty(date);
        for field in QuoteField::NUMERIC {
            quote.set_value(field, self.cell(row, field).and_then(clean_numeric));
        }
        Ok(quote)
    }

    /// 여러 행 정규화. 실패한 행은 결과에 기록만 하고 계속 진행합니다.
    pub fn normalize_rows(&self, rows: &[RawQuoteRow]) -> NormalizedBatch {
        let mut batch = NormalizedBatch::default();
        for (row_index, row) in rows.iter().enumerate() {
            match self.normalize(row) {
                Ok(quote) => batch.quotes.push(quote),
                Err(error) => {
                    warn!(row_index, error = %error, "행 정규화 실패, 건너뜀");
                    batch.rejections.push(RowRejection { row_index, error });
                }
            }
        }
        batch
    }
}

/// 원시 배치를 소비하며 정규화. 원시 행은 이후 보관하지 않습니다.
pub fn normalize_batch(batch: RawBatch) -> NormalizedBatch {
    RowNormalizer::for_batch(&batch).normalize_rows(&batch.rows)
}
