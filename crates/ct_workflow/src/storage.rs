// crates/ct_workflow/src/storage.rs

//! 存储后端模块
//!
//! 运行记录的持久化。状态字段同时是外部终止请求的入口，
//! 因此所有后端都提供 [`Storage::set_status`]。

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ct_foundation::error::CtError;
use parking_lot::RwLock;
use thiserror::Error;

use crate::run::{RunId, RunStatus, ScenarioRun};

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO错误
    #[error("存储IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("运行记录序列化错误: {0}")]
    Serialization(String),

    /// 记录不存在
    #[error("运行记录不存在: {0}")]
    NotFound(RunId),

    /// 存储已满
    #[error("存储已满")]
    Full,
}

impl From<StorageError> for CtError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Io(e) => CtError::io_with_source("运行记录存储失败", e),
            StorageError::Serialization(msg) => CtError::serialization(msg),
            StorageError::NotFound(id) => CtError::not_found(format!("运行记录 {id}")),
            StorageError::Full => CtError::internal("运行记录存储已满"),
        }
    }
}

/// 存储后端trait
pub trait Storage: Send + Sync {
    /// 保存记录
    fn save_run(&self, run: &ScenarioRun) -> Result<(), StorageError>;

    /// 加载记录
    fn load_run(&self, id: RunId) -> Result<Option<ScenarioRun>, StorageError>;

    /// 删除记录
    fn delete_run(&self, id: RunId) -> Result<(), StorageError>;

    /// 列出所有记录
    fn list_runs(&self) -> Result<Vec<ScenarioRun>, StorageError>;

    /// 清空所有记录
    fn clear(&self) -> Result<(), StorageError>;

    /// 检查记录是否存在
    fn contains(&self, id: RunId) -> Result<bool, StorageError> {
        Ok(self.load_run(id)?.is_some())
    }

    /// 获取记录数量
    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.list_runs()?.len())
    }

    /// 当前状态
    fn status(&self, id: RunId) -> Result<RunStatus, StorageError> {
        self.load_run(id)?
            .map(|run| run.status)
            .ok_or(StorageError::NotFound(id))
    }

    /// 只更新状态
    fn set_status(&self, id: RunId, status: RunStatus) -> Result<(), StorageError> {
        let mut run = self.load_run(id)?.ok_or(StorageError::NotFound(id))?;
        run.status = status;
        self.save_run(&run)
    }
}

/// 内存存储
#[derive(Debug, Default)]
pub struct MemoryStorage {
    runs: RwLock<HashMap<RunId, ScenarioRun>>,
    max_capacity: Option<usize>,
}

impl MemoryStorage {
    /// 创建新的内存存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带容量限制的内存存储
    pub fn with_capacity(max_capacity: usize) -> Self {
        Self {
            runs: RwLock::new(HashMap::with_capacity(max_capacity)),
            max_capacity: Some(max_capacity),
        }
    }

    /// 记录数量
    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }
}

impl Storage for MemoryStorage {
    fn save_run(&self, run: &ScenarioRun) -> Result<(), StorageError> {
        let mut runs = self.runs.write();
        if let Some(max) = self.max_capacity {
            if runs.len() >= max && !runs.contains_key(&run.id) {
                return Err(StorageError::Full);
            }
        }
        runs.insert(run.id, run.clone());
        Ok(())
    }

    fn load_run(&self, id: RunId) -> Result<Option<ScenarioRun>, StorageError> {
        Ok(self.runs.read().get(&id).cloned())
    }

    fn delete_run(&self, id: RunId) -> Result<(), StorageError> {
        self.runs.write().remove(&id);
        Ok(())
    }

    fn list_runs(&self) -> Result<Vec<ScenarioRun>, StorageError> {
        Ok(self.runs.read().values().cloned().collect())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.runs.write().clear();
        Ok(())
    }

    fn count(&self) -> Result<usize, StorageError> {
        Ok(self.runs.read().len())
    }

    fn set_status(&self, id: RunId, status: RunStatus) -> Result<(), StorageError> {
        let mut runs = self.runs.write();
        let run = runs.get_mut(&id).ok_or(StorageError::NotFound(id))?;
        run.status = status;
        Ok(())
    }
}

/// 文件存储
///
/// 每条记录一个 `{id}.json` 文件。启用缓存时，其他进程直接改写文件不可见；
/// 需要观察外部写入时使用 [`FileStorage::without_cache`]。
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
    cache: RwLock<HashMap<RunId, ScenarioRun>>,
    use_cache: bool,
}

impl FileStorage {
    /// 创建文件存储并加载已有记录
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let storage = Self {
            dir,
            cache: RwLock::new(HashMap::new()),
            use_cache: true,
        };
        storage.load_all_to_cache()?;
        Ok(storage)
    }

    /// 禁用缓存
    #[must_use]
    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self.cache.write().clear();
        self
    }

    /// 存储目录
    pub fn directory(&self) -> &Path {
        &self.dir
    }

    fn run_path(&self, id: RunId) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    fn record_files(&self) -> Result<Vec<PathBuf>, StorageError> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn load_all_to_cache(&self) -> Result<(), StorageError> {
        if !self.use_cache {
            return Ok(());
        }
        let mut cache = self.cache.write();
        cache.clear();
        for path in self.record_files()? {
            match Self::load_from_file(&path) {
                Ok(run) => {
                    cache.insert(run.id, run);
                }
                Err(e) => tracing::warn!("跳过无法解析的运行记录 {}: {}", path.display(), e),
            }
        }
        Ok(())
    }

    fn load_from_file(path: &Path) -> Result<ScenarioRun, StorageError> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))
    }

    fn save_to_file(&self, run: &ScenarioRun) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(run)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        std::fs::write(self.run_path(run.id), json)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn save_run(&self, run: &ScenarioRun) -> Result<(), StorageError> {
        self.save_to_file(run)?;
        if self.use_cache {
            self.cache.write().insert(run.id, run.clone());
        }
        Ok(())
    }

    fn load_run(&self, id: RunId) -> Result<Option<ScenarioRun>, StorageError> {
        if self.use_cache {
            if let Some(run) = self.cache.read().get(&id).cloned() {
                return Ok(Some(run));
            }
        }

        let path = self.run_path(id);
        if !path.exists() {
            return Ok(None);
        }
        let run = Self::load_from_file(&path)?;
        if self.use_cache {
            self.cache.write().insert(id, run.clone());
        }
        Ok(Some(run))
    }

    fn delete_run(&self, id: RunId) -> Result<(), StorageError> {
        let path = self.run_path(id);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        if self.use_cache {
            self.cache.write().remove(&id);
        }
        Ok(())
    }

    fn list_runs(&self) -> Result<Vec<ScenarioRun>, StorageError> {
        if self.use_cache {
            return Ok(self.cache.read().values().cloned().collect());
        }
        let mut runs = Vec::new();
        for path in self.record_files()? {
            if let Ok(run) = Self::load_from_file(&path) {
                runs.push(run);
            }
        }
        Ok(runs)
    }

    fn clear(&self) -> Result<(), StorageError> {
        for path in self.record_files()? {
            std::fs::remove_file(path)?;
        }
        if self.use_cache {
            self.cache.write().clear();
        }
        Ok(())
    }
}
