//! 데이터 모듈 오류 타입.

use thiserror::Error;

/// 내보내기 오류.
#[derive(Debug, Error)]
pub enum ExportError {
    /// 파일/스트림 I/O 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV 직렬화 오류
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<csv::IntoInnerError<csv::Writer<Vec<u8>>>> for ExportError {
    fn from(err: csv::IntoInnerError<csv::Writer<Vec<u8>>>) -> Self {
        ExportError::Io(err.into_error())
    }
}

pub type Result<T> = std::result::Result<T, ExportError>;
