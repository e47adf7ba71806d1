//! 로거 매니저
//!
//! 프로세스 전체의 로깅 초기화를 한 번만 수행하고, 이름 있는 로거를 나눠주는 조정자입니다.
//!
//! # 상태
//! `Uninitialized` → `Initialized` 단방향 전이만 존재합니다. 전이는 이중 확인 잠금
//! (잠금 밖에서 플래그 확인 → 잠금 → 재확인 → 변경)으로 보호됩니다. 이미 초기화된 뒤의
//! 명시적 초기화 요청은 경고만 남기고 아무것도 바꾸지 않습니다.
//!
//! # 사용 예시
//! ```no_run
//! use easylog::logging::{configure, get_logger, ConfigOverrides};
//!
//! configure(ConfigOverrides::new().with_log_level("DEBUG").with_log_dir("./app_logs"))?;
//!
//! let logger = get_logger("my_application");
//! logger.info("애플리케이션 시작");
//! # Ok::<(), easylog::LogError>(())
//! ```

use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use crate::error::LogResult;
use crate::logging::config::{ConfigOverrides, LoggerConfig};
use crate::logging::diagnostics::{default_diagnostics, Diagnostics};
use crate::logging::directory::{DirectoryCreator, DirectoryResolver};
use crate::logging::external::{
    ExternalFramework, ExternalFrameworkAdapter, ExternalLogConfig, HttpServerFramework,
};
use crate::logging::formatter::LogFormatter;
use crate::logging::handlers::HandlerFactory;
use crate::logging::registry::{Logger, LoggerRegistry};
use crate::logging::rotation::RotatingFileSink;
use crate::logging::writer::{ConsoleTarget, Sink};

/// 초기화 이후의 매니저 상태
struct ManagerState {
    /// 최종 결정된 로그 디렉토리
    log_dir: PathBuf,
    /// 병합이 끝난 설정
    config: LoggerConfig,
    /// 모든 싱크가 공유하는 포매터
    formatter: Arc<LogFormatter>,
    /// 루트에 연결된 싱크들
    sinks: Vec<Arc<dyn Sink>>,
    /// 루트에 연결된 파일 싱크
    file_sink: Option<Arc<RotatingFileSink>>,
    /// 디렉토리를 찾지 못해 싱크 없이 초기화되었는지 여부
    degraded: bool,
}

/// 로거 매니저
pub struct LoggerManager {
    registry: LoggerRegistry,
    diagnostics: Arc<dyn Diagnostics>,
    directories: DirectoryResolver,
    factory: HandlerFactory,
    framework: Arc<dyn ExternalFramework>,
    /// 호출자 설정 아래에 깔리는 기본 부분 설정 (지연 초기화에도 사용)
    defaults: ConfigOverrides,
    /// 단조 증가 플래그 (false → true 한 번만)
    initialized: AtomicBool,
    /// 초기화 전이 보호용 잠금
    init_lock: Mutex<()>,
    state: RwLock<Option<ManagerState>>,
}

static GLOBAL_MANAGER: OnceLock<LoggerManager> = OnceLock::new();

impl LoggerManager {
    /// 주어진 레지스트리를 사용하는 매니저 생성 (기본 진단/디렉토리/프레임워크 사용)
    pub fn new(registry: LoggerRegistry) -> Self {
        Self::builder().registry(registry).build()
    }

    pub fn builder() -> LoggerManagerBuilder {
        LoggerManagerBuilder::default()
    }

    /// 프로세스 전역 매니저
    ///
    /// 모든 호출자와 스레드가 같은 인스턴스를 받습니다. `EASYLOG_*` 환경 변수가 기본 설정이 됩니다.
    pub fn global() -> &'static LoggerManager {
        GLOBAL_MANAGER.get_or_init(|| {
            LoggerManager::builder()
                .registry(LoggerRegistry::global().clone())
                .defaults(ConfigOverrides::from_env())
                .build()
        })
    }

    /// 명시적 초기화
    ///
    /// 이미 초기화되었으면 경고만 남기고 `Ok(())`를 반환합니다. 쓸 수 있는 로그 디렉토리가
    /// 하나도 없으면 `NoWritableDirectory`를 반환하며 상태는 초기화 전으로 남습니다.
    pub fn initialize(&self, overrides: ConfigOverrides) -> LogResult<()> {
        if self.initialized.load(Ordering::Acquire) {
            self.warn_already_initialized();
            return Ok(());
        }

        let _guard = self.init_lock.lock();
        if self.initialized.load(Ordering::Acquire) {
            self.warn_already_initialized();
            return Ok(());
        }

        let state = self.setup(&self.defaults.clone().overlay(overrides))?;
        let log_dir = state.log_dir.clone();
        self.install(state);

        self.registry
            .root()
            .info(format!("✅ 로깅 시스템 초기화 완료, 로그 디렉토리: {}", log_dir.display()));
        self.configure_external_if_enabled();
        Ok(())
    }

    /// 필요하면 기본 설정으로 초기화 (지연 초기화)
    ///
    /// 실패하지 않습니다. 로그 디렉토리를 찾지 못하면 싱크 없이 초기화된 상태가 됩니다.
    fn ensure_initialized(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }

        let _guard = self.init_lock.lock();
        if self.initialized.load(Ordering::Acquire) {
            return;
        }

        let overrides = self.defaults.clone();
        match self.setup(&overrides) {
            Ok(state) => {
                self.install(state);
                self.registry
                    .root()
                    .debug("🔍 로깅 시스템이 기본 설정으로 자동 초기화됨");
                self.configure_external_if_enabled();
            }
            Err(e) => {
                self.diagnostics
                    .emit(&format!("❌ 자동 초기화 실패, 로그 출력 없이 계속: {}", e));
                self.install(self.degraded_state(&overrides));
            }
        }
    }

    /// 설정 병합부터 루트 싱크 연결까지 수행
    fn setup(&self, overrides: &ConfigOverrides) -> LogResult<ManagerState> {
        let mut config = LoggerConfig::merged(overrides, self.diagnostics.as_ref());

        let project_root = self
            .directories
            .resolve_project_root(config.project_root.as_deref());
        config.project_root = Some(project_root.clone());

        let preferred = DirectoryResolver::resolve_log_dir(config.log_dir.as_deref(), &project_root);
        let log_dir = self
            .directories
            .create_log_directory(&preferred, &project_root)?;

        let formatter = Arc::new(self.build_formatter(&config));

        let root = self.registry.root();
        root.set_level(config.level);
        root.clear_sinks();

        let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();
        let mut file_sink = None;

        if let Some(path) = config.log_file_path(&log_dir) {
            if let Some(sink) = self.factory.build_file_sink(
                formatter.clone(),
                config.level,
                &log_dir,
                &path,
                config.max_bytes,
                config.backup_count,
            ) {
                file_sink = Some(sink.clone());
                sinks.push(sink);
            }
        }

        if config.console_output {
            if let Some(sink) = self.factory.build_console_sink(formatter.clone(), config.level) {
                sinks.push(sink);
            }
        }

        for sink in &sinks {
            root.add_sink(sink.clone());
        }

        Ok(ManagerState {
            log_dir,
            config,
            formatter,
            sinks,
            file_sink,
            degraded: false,
        })
    }

    fn build_formatter(&self, config: &LoggerConfig) -> LogFormatter {
        match LogFormatter::new(config.format.as_str(), config.date_format.as_str()) {
            Ok(formatter) => formatter,
            Err(e) => {
                self.diagnostics
                    .emit(&format!("⚠️ 포매터 생성 실패, 기본 포맷 사용: {}", e));
                LogFormatter::default()
            }
        }
    }

    fn degraded_state(&self, overrides: &ConfigOverrides) -> ManagerState {
        let config = LoggerConfig::merged(overrides, self.diagnostics.as_ref());
        let formatter = Arc::new(self.build_formatter(&config));
        let root = self.registry.root();
        root.set_level(config.level);
        root.clear_sinks();

        ManagerState {
            log_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config,
            formatter,
            sinks: Vec::new(),
            file_sink: None,
            degraded: true,
        }
    }

    /// 상태 저장 후 플래그 전이 (잠금 안에서만 호출)
    fn install(&self, state: ManagerState) {
        *self.state.write() = Some(state);
        self.initialized.store(true, Ordering::Release);
    }

    fn warn_already_initialized(&self) {
        let message = "⚠️ 로깅 시스템이 이미 초기화됨, 중복 초기화 건너뜀";
        self.diagnostics.emit(message);
        self.registry.root().warning(message);
    }

    fn configure_external_if_enabled(&self) {
        let state = self.state.read();
        let Some(state) = state.as_ref() else {
            return;
        };
        if !state.config.external_framework_enabled {
            return;
        }

        let adapter = ExternalFrameworkAdapter {
            registry: &self.registry,
            factory: &self.factory,
            config: &state.config,
            formatter: state.formatter.clone(),
            file_sink: state.file_sink.clone().map(|s| s as Arc<dyn Sink>),
        };
        adapter.configure(self.framework.as_ref());
    }

    /// 이름 있는 로거 반환 (필요하면 자동 초기화)
    pub fn get_logger(&self, name: &str) -> Logger {
        self.ensure_initialized();
        self.registry.get(name)
    }

    /// 루트 로거 반환 (필요하면 자동 초기화)
    pub fn root_logger(&self) -> Logger {
        self.ensure_initialized();
        self.registry.root()
    }

    /// 로그 디렉토리 반환 (필요하면 자동 초기화)
    pub fn get_log_directory(&self) -> PathBuf {
        self.ensure_initialized();
        self.state
            .read()
            .as_ref()
            .map(|s| s.log_dir.clone())
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }

    /// 외부 프레임워크 설정 로더용 문서 반환 (필요하면 자동 초기화)
    pub fn get_external_framework_log_config(&self) -> ExternalLogConfig {
        self.ensure_initialized();
        let state = self.state.read();
        match state.as_ref() {
            Some(state) => ExternalLogConfig::build(&state.config, &state.formatter, self.framework.as_ref()),
            None => ExternalLogConfig::build(
                &LoggerConfig::default(),
                &LogFormatter::default(),
                self.framework.as_ref(),
            ),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// 싱크 없이 초기화되었는지 여부
    pub fn is_degraded(&self) -> bool {
        self.state.read().as_ref().map(|s| s.degraded).unwrap_or(false)
    }

    /// 활성 설정 복사본 (초기화 전이면 `None`)
    pub fn config(&self) -> Option<LoggerConfig> {
        self.state.read().as_ref().map(|s| s.config.clone())
    }

    /// 공유 포매터 (초기화 전이면 `None`)
    pub fn formatter(&self) -> Option<Arc<LogFormatter>> {
        self.state.read().as_ref().map(|s| s.formatter.clone())
    }

    /// 루트에 연결된 싱크 목록
    pub fn active_sinks(&self) -> Vec<Arc<dyn Sink>> {
        self.state
            .read()
            .as_ref()
            .map(|s| s.sinks.clone())
            .unwrap_or_default()
    }

    /// 활성 파일 싱크의 경로 (임시 파일로 대체된 경우 그 경로)
    pub fn log_file_path(&self) -> Option<PathBuf> {
        self.state
            .read()
            .as_ref()
            .and_then(|s| s.file_sink.as_ref().map(|f| f.path().to_path_buf()))
    }

    pub fn registry(&self) -> &LoggerRegistry {
        &self.registry
    }

    pub fn framework(&self) -> &dyn ExternalFramework {
        self.framework.as_ref()
    }

    /// 모든 활성 싱크 플러시
    pub fn flush(&self) {
        self.registry.root().flush();
        for name in self.framework.logger_names() {
            if self.registry.contains(&name) {
                self.registry.get(&name).flush();
            }
        }
    }

    /// 종료 처리: 싱크를 플러시하고 닫음
    ///
    /// 초기화 상태는 유지되며, 이후 기록은 조용히 버려집니다.
    pub fn shutdown(&self) {
        self.flush();
        for name in self.framework.logger_names() {
            if self.registry.contains(&name) {
                self.registry.get(&name).clear_sinks();
            }
        }
        self.registry.root().clear_sinks();
        if let Some(state) = self.state.write().as_mut() {
            state.sinks.clear();
            state.file_sink = None;
        }
    }
}

impl fmt::Debug for LoggerManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("LoggerManager")
            .field("initialized", &self.is_initialized())
            .field("log_dir", &state.as_ref().map(|s| s.log_dir.clone()))
            .field("sinks", &state.as_ref().map(|s| s.sinks.len()).unwrap_or(0))
            .finish()
    }
}

/// `LoggerManager` 생성기
#[derive(Default)]
pub struct LoggerManagerBuilder {
    registry: Option<LoggerRegistry>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
    creator: Option<Arc<dyn DirectoryCreator>>,
    home_dir: Option<Option<PathBuf>>,
    temp_dir: Option<PathBuf>,
    console_target: Option<ConsoleTarget>,
    framework: Option<Arc<dyn ExternalFramework>>,
    defaults: ConfigOverrides,
}

impl LoggerManagerBuilder {
    pub fn registry(mut self, registry: LoggerRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// 사이드 채널 진단 출력 대상 (기본값: stderr)
    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn directory_creator(mut self, creator: Arc<dyn DirectoryCreator>) -> Self {
        self.creator = Some(creator);
        self
    }

    /// 폴백 후보에 쓸 홈 디렉토리 (`None`이면 홈 후보 생략)
    pub fn home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = Some(home_dir);
        self
    }

    /// 폴백 후보에 쓸 임시 디렉토리
    pub fn temp_dir<P: AsRef<Path>>(mut self, temp_dir: P) -> Self {
        self.temp_dir = Some(temp_dir.as_ref().to_path_buf());
        self
    }

    pub fn console_target(mut self, target: ConsoleTarget) -> Self {
        self.console_target = Some(target);
        self
    }

    pub fn framework(mut self, framework: Arc<dyn ExternalFramework>) -> Self {
        self.framework = Some(framework);
        self
    }

    /// 명시적 설정 아래에 깔릴 기본 부분 설정
    pub fn defaults(mut self, defaults: ConfigOverrides) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn build(self) -> LoggerManager {
        let diagnostics = self.diagnostics.unwrap_or_else(default_diagnostics);

        let mut directories = DirectoryResolver::new(diagnostics.clone());
        if let Some(creator) = self.creator {
            directories = directories.with_creator(creator);
        }
        if let Some(home_dir) = self.home_dir {
            directories = directories.with_home_dir(home_dir);
        }
        if let Some(temp_dir) = self.temp_dir {
            directories = directories.with_temp_dir(temp_dir);
        }

        let mut factory = HandlerFactory::new(diagnostics.clone());
        if let Some(target) = self.console_target {
            factory = factory.with_console_target(target);
        }

        LoggerManager {
            registry: self
                .registry
                .unwrap_or_else(|| LoggerRegistry::with_diagnostics(diagnostics.clone())),
            diagnostics,
            directories,
            factory,
            framework: self
                .framework
                .unwrap_or_else(|| Arc::new(HttpServerFramework::default())),
            defaults: self.defaults,
            initialized: AtomicBool::new(false),
            init_lock: Mutex::new(()),
            state: RwLock::new(None),
        }
    }
}

/// 전역 매니저 명시적 초기화
///
/// 프로그램 시작 직후 호출해 기본 설정을 덮어씁니다. 반복 호출은 경고 후 무시됩니다.
pub fn configure(overrides: ConfigOverrides) -> LogResult<()> {
    LoggerManager::global().initialize(overrides)
}

/// 전역 매니저에서 이름 있는 로거 반환 (필요하면 기본 설정으로 자동 초기화)
pub fn get_logger(name: &str) -> Logger {
    LoggerManager::global().get_logger(name)
}

/// 전역 매니저의 로그 디렉토리
pub fn get_log_directory() -> PathBuf {
    LoggerManager::global().get_log_directory()
}

/// 전역 매니저 기준 외부 프레임워크용 로그 설정 문서
pub fn get_external_framework_log_config() -> ExternalLogConfig {
    LoggerManager::global().get_external_framework_log_config()
}

/// 전역 매니저 종료 처리 (프로세스 종료 직전에 호출)
pub fn shutdown() {
    if let Some(manager) = GLOBAL_MANAGER.get() {
        manager.shutdown();
    }
}
