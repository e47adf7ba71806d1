//! easylog
//!
//! 설정 한 번으로 파일 순환, 콘솔 출력, 디렉토리 폴백까지 갖춘 로깅을 제공하는 라이브러리입니다.

pub mod error;
pub mod logging;

pub use error::{LogError, LogResult};
pub use logging::{
    configure, get_external_framework_log_config, get_log_directory, get_logger, shutdown,
    ConfigOverrides, LogLevel, Logger,
};
