//! 로깅 부트스트랩 에러 타입
//!
//! 부트스트랩 과정에서 호출자에게 전달될 수 있는 에러를 정의합니다.
//!
//! # 분류
//! - 치명적 에러: 쓰기 가능한 로그 디렉토리가 하나도 없음 (`NoWritableDirectory`)
//! - 나머지는 내부에서 사이드 채널 진단으로 변환되어 기능 축소 후 계속 진행

use std::path::PathBuf;
use thiserror::Error;

/// 로깅 시스템 에러
#[derive(Error, Debug)]
pub enum LogError {
    #[error("로그 디렉토리를 생성할 수 없음. 시도한 경로: {}", format_paths(.attempted))]
    NoWritableDirectory {
        attempted: Vec<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("알 수 없는 로그 레벨: {0}")]
    UnknownLevel(String),

    #[error("잘못된 날짜 형식: {0}")]
    InvalidFormat(String),

    #[error("설정 오류: {message}")]
    Config { message: String },

    #[error("I/O 오류: {0}")]
    Io(#[from] std::io::Error),
}

/// Result 타입 별칭
pub type LogResult<T> = Result<T, LogError>;

impl LogError {
    /// 복구 불가능한 에러인지 여부
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoWritableDirectory { .. })
    }

    /// 시도한 디렉토리 목록 (디렉토리 에러가 아니면 빈 슬라이스)
    pub fn attempted_paths(&self) -> &[PathBuf] {
        match self {
            Self::NoWritableDirectory { attempted, .. } => attempted,
            _ => &[],
        }
    }
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
