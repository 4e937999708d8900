// crates/ct_workflow/src/process.rs

//! 求解器进程后端
//!
//! 监督循环只通过 [`ProcessBackend`] 的三个操作与进程交互：启动、轮询、终止。
//! [`OsProcessBackend`] 启动真实的操作系统进程。

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

use ct_config::SolverMode;
use ct_foundation::error::{CtError, CtResult};
use ct_sources::SourceCategory;
use tracing::debug;

/// 进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    /// 仍在运行
    Running,
    /// 已退出，被信号终止时退出码为空
    Exited(Option<i32>),
}

impl ProcessState {
    /// 是否已退出
    pub fn has_exited(&self) -> bool {
        matches!(self, Self::Exited(_))
    }
}

/// 一次求解器启动的描述
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSpec {
    /// 可执行文件
    pub program: PathBuf,
    /// 源类别
    pub category: SourceCategory,
    /// 求解器模式
    pub mode: SolverMode,
    /// 输出目录
    pub output_dir: PathBuf,
}

impl LaunchSpec {
    /// 创建启动描述
    pub fn new(
        program: impl Into<PathBuf>,
        category: SourceCategory,
        mode: SolverMode,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            category,
            mode,
            output_dir: output_dir.into(),
        }
    }

    /// 命令行参数：`<TAG> <output_dir/>`
    pub fn args(&self) -> Vec<String> {
        let mut dir = self.output_dir.display().to_string();
        if !dir.ends_with('/') {
            dir.push('/');
        }
        vec![self.category.tag().to_string(), dir]
    }

    /// 该类别的输出表路径
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .join(self.category.output_file_name(self.mode.tag()))
    }
}

/// 进程后端
pub trait ProcessBackend {
    /// 进程句柄
    type Handle;

    /// 启动进程
    fn start(&self, spec: &LaunchSpec) -> CtResult<Self::Handle>;

    /// 非阻塞地查询状态
    fn poll(&self, handle: &mut Self::Handle) -> CtResult<ProcessState>;

    /// 请求终止
    fn terminate(&self, handle: &mut Self::Handle) -> CtResult<()>;
}

// ============================================================
// 操作系统进程
// ============================================================

/// 操作系统进程后端
#[derive(Debug, Clone, Default)]
pub struct OsProcessBackend {
    working_dir: Option<PathBuf>,
}

impl OsProcessBackend {
    /// 创建后端（继承当前工作目录）
    pub fn new() -> Self {
        Self::default()
    }

    /// 在指定目录中启动求解器（求解器在工作目录中查找自身的数据文件）
    #[must_use]
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// 操作系统进程句柄
#[derive(Debug)]
pub struct OsProcessHandle {
    child: Child,
    category: SourceCategory,
}

impl OsProcessHandle {
    /// 进程ID
    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl ProcessBackend for OsProcessBackend {
    type Handle = OsProcessHandle;

    fn start(&self, spec: &LaunchSpec) -> CtResult<Self::Handle> {
        let mut command = match &self.working_dir {
            Some(dir) => {
                // 切换工作目录后相对路径会按新目录解析
                let program = std::path::absolute(&spec.program)?;
                let mut command = Command::new(program);
                command.current_dir(dir);
                command
            }
            None => Command::new(&spec.program),
        };
        command
            .args(spec.args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = command.spawn().map_err(|e| {
            CtError::solver(
                spec.category.tag(),
                format!("无法启动 {}: {e}", spec.program.display()),
            )
        })?;
        debug!("{} 求解器已启动, pid={}", spec.category, child.id());

        Ok(OsProcessHandle {
            child,
            category: spec.category,
        })
    }

    fn poll(&self, handle: &mut Self::Handle) -> CtResult<ProcessState> {
        match handle.child.try_wait() {
            Ok(Some(status)) => Ok(ProcessState::Exited(status.code())),
            Ok(None) => Ok(ProcessState::Running),
            Err(e) => Err(CtError::solver(
                handle.category.tag(),
                format!("查询进程状态失败: {e}"),
            )),
        }
    }

    fn terminate(&self, handle: &mut Self::Handle) -> CtResult<()> {
        match handle.child.kill() {
            Ok(()) => Ok(()),
            // 进程已退出
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(CtError::solver(
                handle.category.tag(),
                format!("终止进程失败: {e}"),
            )),
        }
    }
}
