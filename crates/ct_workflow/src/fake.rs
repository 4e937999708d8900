// crates/ct_workflow/src/fake.rs

//! 模拟求解器后端
//!
//! 仅在测试或启用 `testing` 特性时编译。[`FakeBackend`] 在内存中模拟求解器进程，
//! 轮询到期时写出输出表。

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ct_foundation::error::{CtError, CtResult};
use ct_sources::SourceCategory;

use crate::process::{LaunchSpec, ProcessBackend, ProcessState};
use crate::RECEPTOR_FILE_NAME;

type ValueFn = dyn Fn(SourceCategory, u64) -> f64 + Send + Sync;

/// 输出表列名
const OUTPUT_HEADER: [&str; 7] = ["id", "x", "y", "hourly", "annual", "cancer", "noncancer"];

/// 模拟求解器后端
///
/// 启动时读取输出目录中的接收点表与该类别的输入表（缺失即启动失败），
/// 经过若干次轮询后写出输出表：`id,x,y` 之后依次为逐时、年均、致癌、非致癌四列，
/// 取值分别为 `v, 2v, 3v, 4v`，`v` 由构造时给定的函数决定。
#[derive(Clone)]
pub struct FakeBackend {
    value: Arc<ValueFn>,
    ticks: usize,
    exit_code: i32,
    silent: Vec<SourceCategory>,
    hang: bool,
    launches: Arc<AtomicUsize>,
    terminations: Arc<AtomicUsize>,
}

/// 模拟进程句柄
#[derive(Debug)]
pub struct FakeHandle {
    spec: LaunchSpec,
    remaining: usize,
    state: ProcessState,
    receptors: Vec<(u64, f64, f64)>,
}

impl FakeBackend {
    /// 创建后端，`value(category, receptor_id)` 给出逐时列的取值
    pub fn new<F>(value: F) -> Self
    where
        F: Fn(SourceCategory, u64) -> f64 + Send + Sync + 'static,
    {
        Self {
            value: Arc::new(value),
            ticks: 0,
            exit_code: 0,
            silent: Vec::new(),
            hang: false,
            launches: Arc::new(AtomicUsize::new(0)),
            terminations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 每个接收点取常数值
    pub fn constant(value: f64) -> Self {
        Self::new(move |_, _| value)
    }

    /// 退出前需要的轮询次数
    #[must_use]
    pub fn with_ticks(mut self, ticks: usize) -> Self {
        self.ticks = ticks;
        self
    }

    /// 退出码
    #[must_use]
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    /// 指定类别退出时不写输出表
    #[must_use]
    pub fn with_silent(mut self, category: SourceCategory) -> Self {
        self.silent.push(category);
        self
    }

    /// 进程永不自行退出，直到被终止
    #[must_use]
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    /// 累计启动次数
    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    /// 累计终止次数
    pub fn terminations(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    fn write_output(&self, handle: &FakeHandle) -> CtResult<()> {
        let path = handle.spec.output_path();
        let category = handle.spec.category;

        let written = (|| -> csv::Result<()> {
            let mut wtr = csv::Writer::from_path(&path)?;
            wtr.write_record(OUTPUT_HEADER)?;
            for &(id, x, y) in &handle.receptors {
                let v = (self.value)(category, id);
                wtr.write_record([
                    id.to_string(),
                    x.to_string(),
                    y.to_string(),
                    v.to_string(),
                    (2.0 * v).to_string(),
                    (3.0 * v).to_string(),
                    (4.0 * v).to_string(),
                ])?;
            }
            wtr.flush()?;
            Ok(())
        })();

        written.map_err(|e| {
            CtError::io_with_source(format!("无法写入 {}", path.display()), e.into())
        })
    }
}

impl std::fmt::Debug for FakeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeBackend")
            .field("ticks", &self.ticks)
            .field("exit_code", &self.exit_code)
            .field("silent", &self.silent)
            .field("hang", &self.hang)
            .finish()
    }
}

fn read_receptor_table(path: &Path, category: SourceCategory) -> CtResult<Vec<(u64, f64, f64)>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| {
            CtError::solver(category.tag(), format!("无法读取 {}: {e}", path.display()))
        })?;

    let mut receptors = Vec::new();
    for (index, row) in rdr.deserialize::<(u64, f64, f64)>().enumerate() {
        let row = row.map_err(|e| {
            let line = e
                .position()
                .map_or(index + 2, |p| p.line() as usize);
            CtError::parse(path, line, format!("接收点行格式错误: {e}"))
        })?;
        receptors.push(row);
    }
    Ok(receptors)
}

impl ProcessBackend for FakeBackend {
    type Handle = FakeHandle;

    fn start(&self, spec: &LaunchSpec) -> CtResult<Self::Handle> {
        let input = spec.output_dir.join(spec.category.input_file_name());
        if !input.exists() {
            return Err(CtError::solver(
                spec.category.tag(),
                format!("输入表不存在: {}", input.display()),
            ));
        }
        let receptors =
            read_receptor_table(&spec.output_dir.join(RECEPTOR_FILE_NAME), spec.category)?;
        self.launches.fetch_add(1, Ordering::SeqCst);

        Ok(FakeHandle {
            spec: spec.clone(),
            remaining: self.ticks,
            state: ProcessState::Running,
            receptors,
        })
    }

    fn poll(&self, handle: &mut Self::Handle) -> CtResult<ProcessState> {
        if handle.state.has_exited() || self.hang {
            return Ok(handle.state);
        }
        if handle.remaining > 0 {
            handle.remaining -= 1;
            return Ok(ProcessState::Running);
        }
        if !self.silent.contains(&handle.spec.category) {
            self.write_output(handle)?;
        }
        handle.state = ProcessState::Exited(Some(self.exit_code));
        Ok(handle.state)
    }

    fn terminate(&self, handle: &mut Self::Handle) -> CtResult<()> {
        if !handle.state.has_exited() {
            handle.state = ProcessState::Exited(None);
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}
