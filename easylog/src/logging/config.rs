//! 로깅 설정 관리
//!
//! 기본 설정값과 호출자가 넘기는 부분 설정(`ConfigOverrides`), 그리고 둘을 병합한
//! 최종 설정(`LoggerConfig`)을 담당합니다.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{LogError, LogResult};
use crate::logging::diagnostics::Diagnostics;
use crate::logging::formatter::validate_date_format;
use crate::logging::level::{resolve_level, LogLevel};

/// 기본 메시지 형식
pub const DEFAULT_FORMAT: &str = "{timestamp} - {name} - {level} - {message}";
/// 기본 타임스탬프 형식
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// 기본 로그 파일 이름
pub const DEFAULT_LOG_FILENAME: &str = "app.log";
/// 기본 최대 파일 크기 (10MB)
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;
/// 기본 백업 파일 개수
pub const DEFAULT_BACKUP_COUNT: usize = 5;

const ENV_PREFIX: &str = "EASYLOG_";

/// 병합이 끝난 로깅 설정
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggerConfig {
    /// 루트 로거와 싱크의 최소 레벨 (기본값: INFO)
    pub level: LogLevel,

    /// 파일 하나의 최대 크기 (바이트 단위, 기본값: 10MB)
    pub max_bytes: u64,

    /// 보관할 순환 파일 개수 (기본값: 5)
    pub backup_count: usize,

    /// 콘솔 출력 여부 (기본값: true)
    pub console_output: bool,

    /// 파일 싱크 이름, `None`이면 파일 로그 비활성화 (기본값: "app.log")
    pub log_filename: Option<String>,

    /// 프로젝트 루트 (기본값: 현재 작업 디렉토리)
    pub project_root: Option<PathBuf>,

    /// 로그 디렉토리 (기본값: `<project_root>/logs`)
    pub log_dir: Option<PathBuf>,

    /// 메시지 형식 템플릿
    pub format: String,

    /// 타임스탬프 형식 (chrono strftime)
    pub date_format: String,

    /// 외부 프레임워크 로거 구성 여부 (기본값: false)
    pub external_framework_enabled: bool,

    /// 외부 프레임워크 로거 레벨 (기본값: INFO)
    pub external_framework_level: LogLevel,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            console_output: true,
            log_filename: Some(DEFAULT_LOG_FILENAME.to_string()),
            project_root: None,
            log_dir: None,
            format: DEFAULT_FORMAT.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            external_framework_enabled: false,
            external_framework_level: LogLevel::Info,
        }
    }
}

impl LoggerConfig {
    /// 기본값 위에 부분 설정을 필드 단위로 병합 (호출자 값 우선)
    ///
    /// 잘못된 값은 에러 대신 진단 메시지를 남기고 기본값으로 대체합니다.
    pub fn merged(overrides: &ConfigOverrides, diagnostics: &dyn Diagnostics) -> Self {
        let mut config = Self::default();

        if let Some(name) = &overrides.log_level {
            config.level = resolve_level(name, diagnostics);
        }

        if let Some(max_bytes) = overrides.max_bytes {
            if max_bytes == 0 {
                diagnostics.emit(&format!(
                    "⚠️ max_bytes는 0보다 커야 함, 기본값 {} 사용",
                    DEFAULT_MAX_BYTES
                ));
            } else {
                config.max_bytes = max_bytes;
            }
        }

        if let Some(backup_count) = overrides.backup_count {
            config.backup_count = backup_count;
        }

        if let Some(console_output) = overrides.console_output {
            config.console_output = console_output;
        }

        if let Some(filename) = &overrides.log_filename {
            let filename = filename.trim();
            config.log_filename = if filename.is_empty() {
                None
            } else {
                Some(filename.to_string())
            };
        }

        if let Some(root) = &overrides.project_root {
            config.project_root = Some(root.clone());
        }

        if let Some(dir) = &overrides.log_dir {
            config.log_dir = Some(dir.clone());
        }

        if let Some(format) = &overrides.format {
            config.format = format.clone();
        }

        if let Some(date_format) = &overrides.date_format {
            match validate_date_format(date_format) {
                Ok(()) => config.date_format = date_format.clone(),
                Err(e) => diagnostics.emit(&format!("⚠️ {}, 기본 형식 사용", e)),
            }
        }

        if let Some(enabled) = overrides.configure_external_logging {
            config.external_framework_enabled = enabled;
        }

        if let Some(name) = &overrides.external_log_level {
            config.external_framework_level = resolve_level(name, diagnostics);
        }

        config
    }

    /// 주어진 디렉토리 안의 로그 파일 경로
    pub fn log_file_path(&self, log_dir: &Path) -> Option<PathBuf> {
        self.log_filename.as_ref().map(|name| log_dir.join(name))
    }
}

/// 호출자가 넘기는 부분 설정
///
/// 모든 필드는 선택 사항이며 지정된 필드만 기본값을 덮어씁니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigOverrides {
    #[serde(alias = "level")]
    pub log_level: Option<String>,
    pub max_bytes: Option<u64>,
    pub backup_count: Option<usize>,
    #[serde(alias = "log_to_console")]
    pub console_output: Option<bool>,
    pub log_filename: Option<String>,
    pub project_root: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub date_format: Option<String>,
    #[serde(alias = "configure_uvicorn_logging_runtime")]
    pub configure_external_logging: Option<bool>,
    #[serde(alias = "uvicorn_log_level_runtime")]
    pub external_log_level: Option<String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.log_level = Some(level.into());
        self
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn with_backup_count(mut self, backup_count: usize) -> Self {
        self.backup_count = Some(backup_count);
        self
    }

    pub fn with_console_output(mut self, enabled: bool) -> Self {
        self.console_output = Some(enabled);
        self
    }

    /// 빈 문자열을 넘기면 파일 싱크가 비활성화됩니다.
    pub fn with_log_filename<S: Into<String>>(mut self, filename: S) -> Self {
        self.log_filename = Some(filename.into());
        self
    }

    pub fn with_project_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
        self.project_root = Some(root.into());
        self
    }

    pub fn with_log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_format<S: Into<String>>(mut self, format: S) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_date_format<S: Into<String>>(mut self, date_format: S) -> Self {
        self.date_format = Some(date_format.into());
        self
    }

    pub fn with_external_logging(mut self, enabled: bool) -> Self {
        self.configure_external_logging = Some(enabled);
        self
    }

    pub fn with_external_log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.external_log_level = Some(level.into());
        self
    }

    /// `top`에 지정된 필드가 우선하도록 두 부분 설정을 합칩니다.
    pub fn overlay(self, top: ConfigOverrides) -> Self {
        Self {
            log_level: top.log_level.or(self.log_level),
            max_bytes: top.max_bytes.or(self.max_bytes),
            backup_count: top.backup_count.or(self.backup_count),
            console_output: top.console_output.or(self.console_output),
            log_filename: top.log_filename.or(self.log_filename),
            project_root: top.project_root.or(self.project_root),
            log_dir: top.log_dir.or(self.log_dir),
            format: top.format.or(self.format),
            date_format: top.date_format.or(self.date_format),
            configure_external_logging: top
                .configure_external_logging
                .or(self.configure_external_logging),
            external_log_level: top.external_log_level.or(self.external_log_level),
        }
    }

    /// JSON 문서에서 부분 설정 로드 (알 수 없는 키는 무시)
    pub fn from_json_str(json: &str) -> LogResult<Self> {
        serde_json::from_str(json).map_err(|e| LogError::Config {
            message: format!("설정 JSON 파싱 실패: {}", e),
        })
    }

    /// 환경변수에서 부분 설정 로드
    ///
    /// 현재 디렉토리의 `.env` 파일이 있으면 먼저 읽습니다.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 임의의 키 조회 함수로부터 부분 설정 로드
    ///
    /// 키는 `EASYLOG_` 접두사가 붙은 대문자 필드 이름입니다 (예: `EASYLOG_LOG_LEVEL`).
    /// 파싱할 수 없는 숫자/불리언 값은 무시됩니다.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));
        let mut overrides = Self::default();

        if let Some(val) = get("LOG_LEVEL") {
            overrides.log_level = Some(val);
        }

        if let Some(val) = get("MAX_BYTES") {
            if let Ok(size) = val.trim().parse() {
                overrides.max_bytes = Some(size);
            }
        }

        if let Some(val) = get("BACKUP_COUNT") {
            if let Ok(count) = val.trim().parse() {
                overrides.backup_count = Some(count);
            }
        }

        if let Some(val) = get("CONSOLE_OUTPUT") {
            overrides.console_output = parse_bool(&val);
        }

        if let Some(val) = get("LOG_FILENAME") {
            overrides.log_filename = Some(val);
        }

        if let Some(val) = get("PROJECT_ROOT") {
            overrides.project_root = Some(PathBuf::from(val));
        }

        if let Some(val) = get("LOG_DIR") {
            overrides.log_dir = Some(PathBuf::from(val));
        }

        if let Some(val) = get("FORMAT") {
            overrides.format = Some(val);
        }

        if let Some(val) = get("DATE_FORMAT") {
            overrides.date_format = Some(val);
        }

        if let Some(val) = get("EXTERNAL_LOGGING") {
            overrides.configure_external_logging = parse_bool(&val);
        }

        if let Some(val) = get("EXTERNAL_LOG_LEVEL") {
            overrides.external_log_level = Some(val);
        }

        overrides
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::diagnostics::MemoryDiagnostics;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = LoggerConfig::default();
        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.max_bytes, 10_485_760);
        assert_eq!(config.backup_count, 5);
        assert!(config.console_output);
        assert_eq!(config.log_filename.as_deref(), Some("app.log"));
        assert!(config.project_root.is_none());
        assert!(config.log_dir.is_none());
        assert_eq!(config.date_format, "%Y-%m-%d %H:%M:%S");
        assert!(!config.external_framework_enabled);
        assert_eq!(config.external_framework_level, LogLevel::Info);
    }

    #[test]
    fn test_merge_caller_wins() {
        let diag = MemoryDiagnostics::new();
        let overrides = ConfigOverrides::new()
            .with_log_level("debug")
            .with_max_bytes(1024)
            .with_backup_count(3)
            .with_console_output(false)
            .with_log_filename("my_app.log");

        let config = LoggerConfig::merged(&overrides, diag.as_ref());

        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.backup_count, 3);
        assert!(!config.console_output);
        assert_eq!(config.log_filename.as_deref(), Some("my_app.log"));
        // 지정하지 않은 필드는 기본값 유지
        assert_eq!(config.format, DEFAULT_FORMAT);
        assert!(diag.is_empty());
    }

    #[test]
    fn test_merge_degrades_invalid_values() {
        let diag = MemoryDiagnostics::new();
        let overrides = ConfigOverrides::new()
            .with_log_level("loud")
            .with_max_bytes(0)
            .with_date_format("%Y-%Q");

        let config = LoggerConfig::merged(&overrides, diag.as_ref());

        assert_eq!(config.level, LogLevel::Info);
        assert_eq!(config.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(config.date_format, DEFAULT_DATE_FORMAT);
        assert_eq!(diag.len(), 3);
    }

    #[test]
    fn test_empty_filename_disables_file_sink() {
        let diag = MemoryDiagnostics::new();
        let config = LoggerConfig::merged(&ConfigOverrides::new().with_log_filename(""), diag.as_ref());

        assert!(config.log_filename.is_none());
        assert!(config.log_file_path(Path::new("/tmp")).is_none());
    }

    #[test]
    fn test_overlay_prefers_top() {
        let base = ConfigOverrides::new().with_log_level("DEBUG").with_backup_count(2);
        let top = ConfigOverrides::new().with_log_level("ERROR");

        let merged = base.overlay(top);

        assert_eq!(merged.log_level.as_deref(), Some("ERROR"));
        assert_eq!(merged.backup_count, Some(2));
    }

    #[test]
    fn test_from_json_str() {
        let overrides = ConfigOverrides::from_json_str(
            r#"{"log_level": "DEBUG", "log_filename": "test.log", "max_bytes": 5242880,
                "backup_count": 3, "log_to_console": false, "unknown_key": 1}"#,
        )
        .unwrap();

        assert_eq!(overrides.log_level.as_deref(), Some("DEBUG"));
        assert_eq!(overrides.log_filename.as_deref(), Some("test.log"));
        assert_eq!(overrides.max_bytes, Some(5 * 1024 * 1024));
        assert_eq!(overrides.backup_count, Some(3));
        assert_eq!(overrides.console_output, Some(false));

        assert!(ConfigOverrides::from_json_str("not json").is_err());
    }

    #[test]
    fn test_from_json_str_accepts_framework_runtime_keys() {
        let overrides = ConfigOverrides::from_json_str(
            r#"{"configure_uvicorn_logging_runtime": true, "uvicorn_log_level_runtime": "WARNING"}"#,
        )
        .unwrap();

        assert_eq!(overrides.configure_external_logging, Some(true));
        assert_eq!(overrides.external_log_level.as_deref(), Some("WARNING"));

        let config = LoggerConfig::merged(&overrides, MemoryDiagnostics::new().as_ref());
        assert!(config.external_framework_enabled);
        assert_eq!(config.external_framework_level, LogLevel::Warning);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("EASYLOG_LOG_LEVEL", "warning"),
            ("EASYLOG_MAX_BYTES", "2048"),
            ("EASYLOG_BACKUP_COUNT", "abc"),
            ("EASYLOG_CONSOLE_OUTPUT", "off"),
            ("EASYLOG_LOG_DIR", "./custom"),
        ]
        .into_iter()
        .collect();

        let overrides = ConfigOverrides::from_lookup(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(overrides.log_level.as_deref(), Some("warning"));
        assert_eq!(overrides.max_bytes, Some(2048));
        assert_eq!(overrides.backup_count, None);
        assert_eq!(overrides.console_output, Some(false));
        assert_eq!(overrides.log_dir, Some(PathBuf::from("./custom")));
        assert!(overrides.log_filename.is_none());
    }
}
