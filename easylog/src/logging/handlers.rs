//! 싱크 생성기
//!
//! 콘솔 싱크와 순환 파일 싱크를 만듭니다. 생성 실패는 호출자에게 에러로 올리지 않고
//! 사이드 채널에 기록한 뒤 해당 싱크 없이 계속 진행합니다.

use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::logging::diagnostics::Diagnostics;
use crate::logging::formatter::LogFormatter;
use crate::logging::level::LogLevel;
use crate::logging::rotation::RotatingFileSink;
use crate::logging::writer::{ConsoleSink, ConsoleTarget};

/// 싱크 생성기
#[derive(Clone)]
pub struct HandlerFactory {
    diagnostics: Arc<dyn Diagnostics>,
    console_target: ConsoleTarget,
}

impl HandlerFactory {
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            diagnostics,
            console_target: ConsoleTarget::Stdout,
        }
    }

    /// 콘솔 싱크가 쓸 스트림 지정 (기본값: stdout)
    pub fn with_console_target(mut self, target: ConsoleTarget) -> Self {
        self.console_target = target;
        self
    }

    pub fn console_target(&self) -> ConsoleTarget {
        self.console_target
    }

    /// 콘솔 싱크 생성, 실패하면 `None`
    pub fn build_console_sink(
        &self,
        formatter: Arc<LogFormatter>,
        level: LogLevel,
    ) -> Option<Arc<ConsoleSink>> {
        match ConsoleSink::new(self.console_target, formatter, level) {
            Ok(sink) => Some(Arc::new(sink)),
            Err(e) => {
                self.diagnostics
                    .emit(&format!("❌ 콘솔 로그 싱크 추가 실패: {:#}", e));
                None
            }
        }
    }

    /// 순환 파일 싱크 생성
    ///
    /// 주 파일을 열 수 없으면 로그 디렉토리 바로 아래의 `<stem>.<unix초>.tmp.log`로 한 번 더
    /// 시도하고, 그마저 실패하면 `None`을 반환합니다 (파일 로그 없이 계속).
    pub fn build_file_sink(
        &self,
        formatter: Arc<LogFormatter>,
        level: LogLevel,
        log_dir: &Path,
        path: &Path,
        max_bytes: u64,
        backup_count: usize,
    ) -> Option<Arc<RotatingFileSink>> {
        let primary = RotatingFileSink::open(path, formatter.clone(), level, max_bytes, backup_count);
        let e = match primary {
            Ok(sink) => return Some(Arc::new(sink)),
            Err(e) => e,
        };

        self.diagnostics
            .emit(&format!("❌ 주 로그 파일에 쓸 수 없음 {}: {:#}", path.display(), e));

        let temp_path = temp_log_path(log_dir, path);
        match RotatingFileSink::open(&temp_path, formatter, level, max_bytes, backup_count) {
            Ok(sink) => {
                self.diagnostics
                    .emit(&format!("📝 임시 로그 파일 사용: {}", temp_path.display()));
                Some(Arc::new(sink))
            }
            Err(e2) => {
                self.diagnostics.emit(&format!(
                    "❌ 임시 로그 파일에도 쓸 수 없음 {}: {:#}",
                    temp_path.display(),
                    e2
                ));
                self.diagnostics.emit("⚠️ 파일 로그 사용 불가");
                None
            }
        }
    }
}

/// 로그 디렉토리 바로 아래의 임시 파일 경로
///
/// 파일 이름에 하위 경로가 있어도 임시 파일은 `log_dir`에 만듭니다.
pub fn temp_log_path(log_dir: &Path, path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "app".to_string());
    log_dir.join(format!("{}.{}.tmp.log", stem, Utc::now().timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::diagnostics::MemoryDiagnostics;
    use crate::logging::formatter::LogRecord;
    use crate::logging::writer::Sink;
    use std::fs;
    use tempfile::TempDir;

    fn factory() -> (HandlerFactory, Arc<MemoryDiagnostics>) {
        let diag = MemoryDiagnostics::new();
        (HandlerFactory::new(diag.clone()), diag)
    }

    #[test]
    fn test_build_file_sink_primary() {
        let temp_dir = TempDir::new().unwrap();
        let (factory, diag) = factory();
        let path = temp_dir.path().join("app.log");

        let sink = factory
            .build_file_sink(
                Arc::new(LogFormatter::default()),
                LogLevel::Info,
                temp_dir.path(),
                &path,
                1024,
                2,
            )
            .unwrap();

        assert_eq!(sink.path(), path.as_path());
        assert!(path.exists());
        assert!(diag.is_empty());
    }

    #[test]
    fn test_build_file_sink_falls_back_to_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let (factory, diag) = factory();
        // 같은 이름의 디렉토리가 있으면 파일로 열 수 없음
        let path = temp_dir.path().join("app.log");
        fs::create_dir(&path).unwrap();

        let sink = factory
            .build_file_sink(
                Arc::new(LogFormatter::default()),
                LogLevel::Info,
                temp_dir.path(),
                &path,
                1024,
                2,
            )
            .unwrap();

        let name = sink.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("app."));
        assert!(name.ends_with(".tmp.log"));
        assert_eq!(sink.path().parent(), Some(temp_dir.path()));
        assert_eq!(diag.count_containing("임시 로그 파일 사용"), 1);

        sink.emit(&LogRecord::new(LogLevel::Info, "x", "degraded")).unwrap();
        assert!(fs::read_to_string(sink.path()).unwrap().contains("degraded"));
    }

    #[test]
    fn test_build_file_sink_gives_up() {
        let temp_dir = TempDir::new().unwrap();
        let (factory, diag) = factory();
        let log_dir = temp_dir.path().join("missing");
        let path = log_dir.join("app.log");

        let sink = factory.build_file_sink(
            Arc::new(LogFormatter::default()),
            LogLevel::Info,
            &log_dir,
            &path,
            1024,
            2,
        );

        assert!(sink.is_none());
        assert_eq!(diag.count_containing("파일 로그 사용 불가"), 1);
    }

    #[test]
    fn test_temp_file_lands_in_log_dir_for_nested_filename() {
        let temp_dir = TempDir::new().unwrap();
        let (factory, diag) = factory();
        // 하위 디렉토리가 없어 주 파일은 열 수 없음
        let path = temp_dir.path().join("sub").join("app.log");

        let sink = factory
            .build_file_sink(
                Arc::new(LogFormatter::default()),
                LogLevel::Info,
                temp_dir.path(),
                &path,
                1024,
                2,
            )
            .unwrap();

        assert_eq!(sink.path().parent(), Some(temp_dir.path()));
        assert!(sink.path().starts_with(temp_dir.path()));
        assert_eq!(diag.count_containing("임시 로그 파일 사용"), 1);
        assert!(!temp_dir.path().join("sub").exists());
    }

    #[test]
    fn test_build_console_sink() {
        let (factory, diag) = factory();
        let factory = factory.with_console_target(ConsoleTarget::Stderr);

        let sink = factory
            .build_console_sink(Arc::new(LogFormatter::default()), LogLevel::Warning)
            .unwrap();

        assert_eq!(sink.target(), ConsoleTarget::Stderr);
        assert_eq!(sink.level(), LogLevel::Warning);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_temp_log_path_shape() {
        let path = temp_log_path(
            Path::new("/var/log/app"),
            Path::new("/var/log/app/nested/server.log"),
        );
        assert_eq!(path.parent(), Some(Path::new("/var/log/app")));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        let seconds = name
            .strip_prefix("server.")
            .and_then(|rest| rest.strip_suffix(".tmp.log"))
            .unwrap();
        assert!(seconds.parse::<i64>().unwrap() > 1_600_000_000);
    }
}
