//! 로깅 부트스트랩
//!
//! 프로세스 전체에서 한 번만 로깅을 설정하고, 이름 있는 로거를 어디서든 꺼내 쓰게 해주는 모듈입니다.
//!
//! # 주요 기능
//! - **한 번만 초기화**: 명시적 `configure` 또는 첫 `get_logger` 호출 시 자동 초기화
//! - **디렉토리 폴백**: 선호 경로 → 프로젝트 `logs` → 홈 → 임시 디렉토리 순서로 시도
//! - **크기 기반 순환**: `app.log` → `app.log.1` … `app.log.N`
//! - **계층 로거**: 점으로 구분된 이름, 부모로의 전파
//! - **외부 프레임워크 연동**: HTTP 서버 로거 재설정과 설정 문서 생성
//! - **tracing 연동**: `tracing` 이벤트를 같은 싱크로 전달
//!
//! # 사용 예시
//! ```no_run
//! use easylog::logging::{configure, get_log_directory, get_logger, ConfigOverrides};
//!
//! configure(
//!     ConfigOverrides::new()
//!         .with_log_level("DEBUG")
//!         .with_max_bytes(5 * 1024 * 1024)
//!         .with_backup_count(3),
//! )?;
//!
//! let logger = get_logger("my_application");
//! logger.info("애플리케이션 시작");
//! logger.debug(format!("로그 디렉토리: {}", get_log_directory().display()));
//! # Ok::<(), easylog::LogError>(())
//! ```

pub mod bridge;
pub mod config;
pub mod diagnostics;
pub mod directory;
pub mod external;
pub mod formatter;
pub mod handlers;
pub mod level;
pub mod manager;
pub mod registry;
pub mod rotation;
pub mod writer;

pub use bridge::{install_tracing_bridge, RegistryLayer};
pub use config::{ConfigOverrides, LoggerConfig};
pub use diagnostics::{Diagnostics, MemoryDiagnostics, StderrDiagnostics};
pub use directory::{DirectoryCreator, DirectoryResolver, FsDirectoryCreator};
pub use external::{ExternalFramework, ExternalLogConfig, HttpServerFramework};
pub use formatter::{LogFormatter, LogRecord};
pub use level::LogLevel;
pub use manager::{
    configure, get_external_framework_log_config, get_log_directory, get_logger, shutdown,
    LoggerManager, LoggerManagerBuilder,
};
pub use registry::{Logger, LoggerRegistry};
pub use rotation::RotatingFileSink;
pub use writer::{ConsoleSink, ConsoleTarget, MemorySink, Sink};
