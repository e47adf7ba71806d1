//! 외부 프레임워크 로거 연동
//!
//! 서드파티 HTTP 서버 프레임워크가 자체적으로 만드는 로거들을 이 시스템의 포맷과 싱크로
//! 연결합니다. 프레임워크에 대한 컴파일 타임 의존성은 없고, 실행 시점에 존재 여부를 확인합니다.
//!
//! 프레임워크가 자체 설정 로더로 읽어들일 수 있는 설정 문서(`ExternalLogConfig`)도 여기서 만듭니다.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::logging::config::LoggerConfig;
use crate::logging::formatter::{LogFormatter, LogRecord};
use crate::logging::handlers::HandlerFactory;
use crate::logging::level::LogLevel;
use crate::logging::registry::LoggerRegistry;
use crate::logging::writer::Sink;

/// 외부 프레임워크 설명
pub trait ExternalFramework: Send + Sync {
    /// 프레임워크 이름
    fn name(&self) -> &str;

    /// 프레임워크가 사용하는 잘 알려진 로거 이름들
    fn logger_names(&self) -> Vec<String>;

    /// 현재 프로세스에 프레임워크가 존재하는지 확인
    fn probe(&self, registry: &LoggerRegistry) -> bool;
}

/// 기본 HTTP 서버 프레임워크 (`uvicorn`, `uvicorn.error`, `uvicorn.access`)
///
/// 프레임워크가 자신의 로거를 레지스트리에 하나라도 등록했으면 존재한다고 판단합니다.
#[derive(Debug, Clone)]
pub struct HttpServerFramework {
    name: String,
    logger_names: Vec<String>,
}

impl HttpServerFramework {
    pub fn new<S: Into<String>>(name: S, logger_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            logger_names,
        }
    }
}

impl Default for HttpServerFramework {
    fn default() -> Self {
        Self::new(
            "uvicorn",
            vec![
                "uvicorn".to_string(),
                "uvicorn.error".to_string(),
                "uvicorn.access".to_string(),
            ],
        )
    }
}

impl ExternalFramework for HttpServerFramework {
    fn name(&self) -> &str {
        &self.name
    }

    fn logger_names(&self) -> Vec<String> {
        self.logger_names.clone()
    }

    fn probe(&self, registry: &LoggerRegistry) -> bool {
        self.logger_names.iter().any(|name| registry.contains(name))
    }
}

/// 다른 로거와 공유되는 싱크를 별도 레벨로 감싼 것
///
/// 파일 싱크를 하나만 유지해야 순환이 한 곳에서만 일어납니다.
struct LeveledSink {
    inner: Arc<dyn Sink>,
    level: LogLevel,
}

impl Sink for LeveledSink {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> anyhow::Result<()> {
        self.inner.emit(record)
    }

    fn flush(&self) -> anyhow::Result<()> {
        self.inner.flush()
    }

    // 공유 싱크는 소유자(루트)가 닫음
    fn close(&self) {}

    fn describe(&self) -> String {
        format!("shared:{}", self.inner.describe())
    }
}

/// 외부 프레임워크 로거 구성에 필요한 재료
pub struct ExternalFrameworkAdapter<'a> {
    pub registry: &'a LoggerRegistry,
    pub factory: &'a HandlerFactory,
    pub config: &'a LoggerConfig,
    pub formatter: Arc<LogFormatter>,
    /// 루트에 연결된 파일 싱크 (있으면 공유)
    pub file_sink: Option<Arc<dyn Sink>>,
}

impl ExternalFrameworkAdapter<'_> {
    /// 프레임워크 로거들을 구성
    ///
    /// 프레임워크가 없으면 DEBUG 로그만 남기고 `false`를 반환합니다.
    /// 각 로거는 기존 싱크를 닫고, 어댑터 레벨과 콘솔/파일 싱크를 새로 받으며,
    /// 루트로의 중복 출력을 막기 위해 전파를 끕니다.
    pub fn configure(&self, framework: &dyn ExternalFramework) -> bool {
        let root = self.registry.root();

        if !framework.probe(self.registry) {
            root.debug(format!(
                "🔍 {} 로거를 찾을 수 없어 외부 프레임워크 로그 구성을 건너뜀",
                framework.name()
            ));
            return false;
        }

        let level = self.config.external_framework_level;

        for name in framework.logger_names() {
            let logger = self.registry.get(&name);
            logger.clear_sinks();
            logger.set_level(level);

            if self.config.console_output {
                if let Some(console) = self.factory.build_console_sink(self.formatter.clone(), level) {
                    logger.add_sink(console);
                }
            }

            if self.config.log_filename.is_some() {
                match &self.file_sink {
                    Some(shared) => logger.add_sink(Arc::new(LeveledSink {
                        inner: shared.clone(),
                        level,
                    })),
                    None => root.warning(format!(
                        "{} 로거에 파일 싱크를 연결할 수 없음: 활성 파일 싱크 없음",
                        name
                    )),
                }
            }

            logger.set_propagate(false);
        }

        root.debug(format!("🔍 {} 로그 구성 완료", framework.name()));
        true
    }
}

/// 포매터 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatterSpec {
    #[serde(rename = "()")]
    pub factory: String,
    pub fmt: String,
    pub datefmt: String,
}

/// 핸들러 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerSpec {
    pub formatter: String,
    pub class: String,
    pub stream: String,
}

/// 로거 라우팅 정의
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSpec {
    pub handlers: Vec<String>,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub propagate: Option<bool>,
}

/// 외부 프레임워크 설정 로더에 넘길 로그 설정 문서
///
/// 소유한 데이터만 담고 있으므로 매니저 상태와 무관하게 그대로 넘길 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalLogConfig {
    pub version: u32,
    pub disable_existing_loggers: bool,
    pub formatters: BTreeMap<String, FormatterSpec>,
    pub handlers: BTreeMap<String, HandlerSpec>,
    pub loggers: BTreeMap<String, LoggerSpec>,
}

/// 문서에서 사용하는 포매터 이름
pub const FORMATTER_NAME: &str = "custom";
/// 문서에서 사용하는 핸들러 이름
pub const HANDLER_NAME: &str = "default";

impl ExternalLogConfig {
    /// 활성 설정과 포매터로 문서 생성
    pub fn build(
        config: &LoggerConfig,
        formatter: &LogFormatter,
        framework: &dyn ExternalFramework,
    ) -> Self {
        let mut formatters = BTreeMap::new();
        formatters.insert(
            FORMATTER_NAME.to_string(),
            FormatterSpec {
                factory: "logging.Formatter".to_string(),
                fmt: formatter.template().to_string(),
                datefmt: formatter.date_format().to_string(),
            },
        );

        let mut handlers = BTreeMap::new();
        handlers.insert(
            HANDLER_NAME.to_string(),
            HandlerSpec {
                formatter: FORMATTER_NAME.to_string(),
                class: "logging.StreamHandler".to_string(),
                stream: "ext://sys.stderr".to_string(),
            },
        );

        let mut loggers = BTreeMap::new();
        loggers.insert(
            String::new(),
            LoggerSpec {
                handlers: vec![HANDLER_NAME.to_string()],
                level: config.level,
                propagate: None,
            },
        );
        for name in framework.logger_names() {
            loggers.insert(
                name,
                LoggerSpec {
                    handlers: vec![HANDLER_NAME.to_string()],
                    level: config.external_framework_level,
                    propagate: Some(false),
                },
            );
        }

        Self {
            version: 1,
            disable_existing_loggers: false,
            formatters,
            handlers,
            loggers,
        }
    }

    /// JSON 값으로 변환
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// 들여쓴 JSON 문자열로 변환
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
