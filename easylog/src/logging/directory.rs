//! 로그 디렉토리 결정
//!
//! 프로젝트 루트와 로그 디렉토리 경로를 계산하고, 쓸 수 있는 디렉토리를 찾을 때까지
//! 후보 목록을 순서대로 시도합니다.
//!
//! # 후보 순서
//! 1. 선호 디렉토리 (설정값 또는 `<root>/logs`)
//! 2. `<root>/logs`
//! 3. `<home>/.logs/<project>`
//! 4. `<temp>/<project>/logs`
//! 5. `<temp>/app_logs` (최후 수단)

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{LogError, LogResult};
use crate::logging::diagnostics::Diagnostics;

/// 최후 수단 디렉토리 이름 (`<temp>/app_logs`)
pub const LAST_RESORT_DIR: &str = "app_logs";

/// 디렉토리 생성 및 쓰기 가능 여부 확인
pub trait DirectoryCreator: Send + Sync {
    /// 디렉토리를 재귀적으로 만들고 쓸 수 있는지 확인 (이미 있으면 성공)
    fn ensure_writable(&self, path: &Path) -> io::Result<()>;
}

/// 실제 파일 시스템을 사용하는 기본 구현
#[derive(Debug, Default, Clone, Copy)]
pub struct FsDirectoryCreator;

impl DirectoryCreator for FsDirectoryCreator {
    fn ensure_writable(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)?;

        let probe = path.join(format!(".easylog-probe-{}", std::process::id()));
        fs::write(&probe, b"")?;
        fs::remove_file(&probe)
    }
}

/// 로그 디렉토리 해석기
#[derive(Clone)]
pub struct DirectoryResolver {
    diagnostics: Arc<dyn Diagnostics>,
    creator: Arc<dyn DirectoryCreator>,
    home_dir: Option<PathBuf>,
    temp_dir: PathBuf,
}

impl DirectoryResolver {
    /// 사용자 홈과 시스템 임시 디렉토리를 자동으로 찾아 생성
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self {
            diagnostics,
            creator: Arc::new(FsDirectoryCreator),
            home_dir: dirs::home_dir(),
            temp_dir: std::env::temp_dir(),
        }
    }

    pub fn with_creator(mut self, creator: Arc<dyn DirectoryCreator>) -> Self {
        self.creator = creator;
        self
    }

    /// 홈 디렉토리 지정, `None`이면 홈 후보를 건너뜀
    pub fn with_home_dir(mut self, home_dir: Option<PathBuf>) -> Self {
        self.home_dir = home_dir;
        self
    }

    pub fn with_temp_dir<P: Into<PathBuf>>(mut self, temp_dir: P) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    /// 프로젝트 루트 결정
    ///
    /// 지정값이 있으면 절대 경로로 바꿔 반환하고, 없으면 현재 작업 디렉토리를 사용합니다.
    /// 실패하지 않습니다.
    pub fn resolve_project_root(&self, project_root: Option<&Path>) -> PathBuf {
        match project_root {
            Some(root) => absolutize(root),
            None => current_dir_or_dot(),
        }
    }

    /// 로그 디렉토리 경로 계산
    ///
    /// - `None` → `<project_root>/logs`
    /// - 상대 경로 → `<project_root>/<log_dir>`
    /// - 절대 경로 → 그대로
    pub fn resolve_log_dir(log_dir: Option<&Path>, project_root: &Path) -> PathBuf {
        match log_dir {
            None => project_root.join("logs"),
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => project_root.join(strip_cur_dir(dir)),
        }
    }

    /// 시도할 후보 디렉토리 목록 (중복 제거, 최후 수단 포함)
    pub fn candidates(&self, preferred: &Path, project_root: &Path) -> Vec<PathBuf> {
        let project_name = project_name(project_root);

        let mut candidates = vec![preferred.to_path_buf(), project_root.join("logs")];
        if let Some(home) = &self.home_dir {
            candidates.push(home.join(".logs").join(&project_name));
        }
        candidates.push(self.temp_dir.join(&project_name).join("logs"));
        candidates.push(self.temp_dir.join(LAST_RESORT_DIR));

        let mut unique: Vec<PathBuf> = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            if !unique.contains(&candidate) {
                unique.push(candidate);
            }
        }
        unique
    }

    /// 쓸 수 있는 로그 디렉토리를 만들고 절대 경로를 반환
    ///
    /// 모든 후보가 실패하면 시도한 경로 전체를 담은 `NoWritableDirectory`를 반환합니다.
    pub fn create_log_directory(&self, preferred: &Path, project_root: &Path) -> LogResult<PathBuf> {
        let candidates = self.candidates(preferred, project_root);
        let last_index = candidates.len().saturating_sub(1);
        let mut last_error = None;

        for (index, dir) in candidates.iter().enumerate() {
            match self.creator.ensure_writable(dir) {
                Ok(()) => {
                    if index == last_index && index > 0 {
                        self.diagnostics.emit(&format!(
                            "⚠️ 모든 일반 로그 디렉토리를 사용할 수 없어 임시 디렉토리 사용: {}",
                            dir.display()
                        ));
                    } else {
                        self.diagnostics
                            .emit(&format!("📁 로그 디렉토리 준비됨: {}", dir.display()));
                    }
                    return Ok(fs::canonicalize(dir).unwrap_or_else(|_| absolutize(dir)));
                }
                Err(e) => {
                    self.diagnostics.emit(&format!(
                        "📁 로그 디렉토리 생성 실패 {}: {}",
                        dir.display(),
                        e
                    ));
                    last_error = Some(e);
                }
            }
        }

        let err = LogError::NoWritableDirectory {
            attempted: candidates,
            source: last_error,
        };
        self.diagnostics.emit(&format!("❌ {}", err));
        Err(err)
    }
}

/// 프로젝트 이름 (루트의 마지막 경로 요소, 없으면 "app")
pub fn project_name(project_root: &Path) -> String {
    project_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "app".to_string())
}

fn current_dir_or_dot() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir_or_dot().join(strip_cur_dir(path))
    }
}

fn strip_cur_dir(path: &Path) -> &Path {
    path.strip_prefix(".").unwrap_or(path)
}
