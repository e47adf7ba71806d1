//! 크기 기반 로그 파일 순환
//!
//! 현재 파일이 최대 크기에 도달하면 `<name>` → `<name>.1` → `<name>.2` … 순서로 밀어내고
//! `backup_count`를 넘는 가장 오래된 파일은 삭제한 뒤 빈 파일에 이어서 기록합니다.
//! `max_bytes`나 `backup_count`가 0이면 순환하지 않고 계속 이어서 기록합니다.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::logging::formatter::{LogFormatter, LogRecord};
use crate::logging::level::LogLevel;
use crate::logging::writer::Sink;

struct FileState {
    file: File,
    size: u64,
}

/// 크기 기반 순환 파일 싱크
pub struct RotatingFileSink {
    /// 현재(활성) 로그 파일 경로
    path: PathBuf,
    formatter: Arc<LogFormatter>,
    level: LogLevel,
    /// 파일 하나의 최대 크기, 0이면 순환하지 않음
    max_bytes: u64,
    /// 보관할 백업 파일 개수, 0이면 순환하지 않음
    backup_count: usize,
    /// 닫힌 뒤에는 `None`
    state: Mutex<Option<FileState>>,
}

impl RotatingFileSink {
    /// 로그 파일을 추가 모드로 열어 싱크 생성
    ///
    /// 상위 디렉토리는 이미 존재해야 합니다.
    pub fn open<P: Into<PathBuf>>(
        path: P,
        formatter: Arc<LogFormatter>,
        level: LogLevel,
        max_bytes: u64,
        backup_count: usize,
    ) -> Result<Self> {
        let path = path.into();
        let state = Self::open_file(&path)?;

        Ok(Self {
            path,
            formatter,
            level,
            max_bytes,
            backup_count,
            state: Mutex::new(Some(state)),
        })
    }

    /// 현재 로그 파일 경로
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    /// 현재 파일에 기록된 바이트 수 (닫혔으면 0)
    pub fn current_size(&self) -> u64 {
        self.state.lock().as_ref().map(|s| s.size).unwrap_or(0)
    }

    /// `index`번째 백업 파일 경로 (`<name>.<index>`)
    pub fn backup_path(&self, index: usize) -> PathBuf {
        backup_path(&self.path, index)
    }

    fn open_file(path: &Path) -> Result<FileState> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("로그 파일 열기 실패: {}", path.display()))?;
        let size = file
            .metadata()
            .context("로그 파일 메타데이터 읽기 실패")?
            .len();

        Ok(FileState { file, size })
    }

    fn should_rollover(&self, current: u64, incoming: u64) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && current > 0
            && current + incoming >= self.max_bytes
    }

    /// 백업 파일을 한 칸씩 밀어내고 새 파일을 엽니다.
    fn rollover(&self, slot: &mut Option<FileState>) -> Result<()> {
        // 이름을 바꾸기 전에 현재 핸들을 닫음
        drop(slot.take());

        let shifted = self.shift_backups();
        *slot = Some(Self::open_file(&self.path)?);
        shifted
    }

    fn shift_backups(&self) -> Result<()> {
        for index in (1..self.backup_count).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                let dst = self.backup_path(index + 1);
                if dst.exists() {
                    fs::remove_file(&dst)
                        .with_context(|| format!("오래된 백업 삭제 실패: {}", dst.display()))?;
                }
                fs::rename(&src, &dst)
                    .with_context(|| format!("백업 파일 이동 실패: {}", src.display()))?;
            }
        }

        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)
                .with_context(|| format!("오래된 백업 삭제 실패: {}", first.display()))?;
        }
        if self.path.exists() {
            fs::rename(&self.path, &first).context("로그 파일 순환 실패")?;
        }
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, record: &LogRecord) -> Result<()> {
        let mut line = self.formatter.format(record);
        line.push('\n');
        let bytes = line.as_bytes();

        let mut slot = self.state.lock();
        let current = match slot.as_ref() {
            Some(state) => state.size,
            None => return Ok(()),
        };

        if self.should_rollover(current, bytes.len() as u64) {
            self.rollover(&mut slot)?;
        }

        if let Some(state) = slot.as_mut() {
            state
                .file
                .write_all(bytes)
                .with_context(|| format!("로그 데이터 작성 실패: {}", self.path.display()))?;
            state.size += bytes.len() as u64;
        }
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        if let Some(state) = self.state.lock().as_mut() {
            state.file.flush().context("로그 파일 플러시 실패")?;
        }
        Ok(())
    }

    fn close(&self) {
        if let Some(mut state) = self.state.lock().take() {
            let _ = state.file.flush();
        }
    }

    fn describe(&self) -> String {
        format!("file({})", self.path.display())
    }
}

/// `<path>.<index>` 형태의 백업 경로
pub fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_os_string();
    name.push(format!(".{}", index));
    PathBuf::from(name)
}
