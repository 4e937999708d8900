// crates/ct_workflow/src/runner.rs

//! 模型运行器
//!
//! 一次模型运行分为四步：
//!
//! 1. 在输出目录中写出接收点表、参数文件与每个参与类别的输入表
//! 2. 为每个类别启动一个求解器进程
//! 3. 单线程轮询监督，直到全部进程退出；期间检测到终止请求时向所有进程发送一次终止
//! 4. 读取各类别输出表并按接收点编号求和
//!
//! 所有输入在第一个进程启动前写完。合并只在全部进程退出后进行。

use std::path::{Path, PathBuf};
use std::thread;

use ct_config::{ModelVariant, RunConfig, RunParameters};
use ct_foundation::error::{CtError, CtResult};
use ct_receptors::ReceptorSet;
use ct_sources::{PreparedSources, SourceCategory};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::context::RunContext;
use crate::events::RunEvent;
use crate::field::ConcentrationField;
use crate::inputs::InputsFile;
use crate::process::{LaunchSpec, ProcessBackend, ProcessState};
use crate::{INPUTS_FILE_NAME, RECEPTOR_FILE_NAME};

/// 单个求解器进程的结局
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolverOutcome {
    /// 类别
    pub category: SourceCategory,
    /// 退出码（被信号终止时为空）
    pub exit_code: Option<i32>,
}

impl SolverOutcome {
    /// 是否以 0 退出
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 一个类别的输入输出文件
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryJob {
    /// 类别
    pub category: SourceCategory,
    /// 输入表路径
    pub input_path: PathBuf,
    /// 输出表路径
    pub output_path: PathBuf,
    /// 输出表中的取值列
    pub value_column: usize,
}

impl CategoryJob {
    /// 在输出目录中为类别定位文件
    pub fn new(category: SourceCategory, output_dir: &Path, variant: ModelVariant) -> Self {
        let mode = variant.solver_mode();
        Self {
            category,
            input_path: output_dir.join(category.input_file_name()),
            output_path: output_dir.join(category.output_file_name(mode.tag())),
            value_column: variant.value_column(),
        }
    }

    /// 写出输入表，返回行数
    pub fn write_input(&self, prepared: &PreparedSources) -> CtResult<usize> {
        let table = prepared.table(self.category)?;
        table.write_csv(&self.input_path)?;
        debug!(
            "写出 {} ({} 行)",
            self.input_path.display(),
            table.len()
        );
        Ok(table.len())
    }

    /// 读取输出表，文件不存在时返回 `None`
    pub fn read_output(&self) -> CtResult<Option<ConcentrationField>> {
        if !self.output_path.exists() {
            return Ok(None);
        }
        ConcentrationField::read_output_table(&self.output_path, self.value_column).map(Some)
    }
}

/// 模型运行结果
#[derive(Debug, Clone)]
pub struct ModelRunReport {
    /// 合并后的浓度场
    pub field: ConcentrationField,
    /// 各进程结局，按启动顺序
    pub outcomes: Vec<SolverOutcome>,
    /// 运行期间是否收到终止请求
    pub terminated: bool,
}

struct Supervised<H> {
    job: CategoryJob,
    handle: H,
    state: ProcessState,
}

/// 模型运行器
#[derive(Debug, Clone)]
pub struct ModelRunner<B> {
    backend: B,
    config: RunConfig,
}

impl<B: ProcessBackend> ModelRunner<B> {
    /// 创建运行器
    pub fn new(backend: B, config: RunConfig) -> Self {
        Self { backend, config }
    }

    /// 进程后端
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 运行配置
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 执行一次模型运行
    pub fn run(
        &self,
        prepared: &PreparedSources,
        receptors: &ReceptorSet,
        inputs: &InputsFile,
        params: &RunParameters,
        output_dir: &Path,
        ctx: &RunContext,
    ) -> CtResult<ModelRunReport> {
        let jobs = self.write_inputs(prepared, receptors, inputs, params, output_dir, ctx)?;

        let mode = params.model_variant.solver_mode();
        let program = self.config.solver_path(mode);
        let mut running = Vec::with_capacity(jobs.len());
        for job in jobs {
            let spec = LaunchSpec::new(&program, job.category, mode, output_dir);
            match self.backend.start(&spec) {
                Ok(handle) => {
                    ctx.emit(RunEvent::SolverLaunched {
                        run_id: ctx.run_id(),
                        category: job.category,
                    });
                    running.push(Supervised {
                        job,
                        handle,
                        state: ProcessState::Running,
                    });
                }
                Err(e) => {
                    self.terminate_all(&mut running);
                    return Err(e);
                }
            }
        }
        info!(
            "运行 {}: 已启动 {} 个求解器进程",
            ctx.run_id(),
            running.len()
        );

        let terminated = self.supervise(&mut running, ctx)?;

        let outcomes: Vec<SolverOutcome> = running
            .iter()
            .map(|p| SolverOutcome {
                category: p.job.category,
                exit_code: match p.state {
                    ProcessState::Exited(code) => code,
                    ProcessState::Running => None,
                },
            })
            .collect();

        let field = self.merge_outputs(running.iter().map(|p| &p.job))?;
        ctx.emit(RunEvent::Merged {
            run_id: ctx.run_id(),
            entries: field.len(),
        });

        Ok(ModelRunReport {
            field,
            outcomes,
            terminated,
        })
    }

    fn write_inputs(
        &self,
        prepared: &PreparedSources,
        receptors: &ReceptorSet,
        inputs: &InputsFile,
        params: &RunParameters,
        output_dir: &Path,
        ctx: &RunContext,
    ) -> CtResult<Vec<CategoryJob>> {
        match std::fs::create_dir_all(output_dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(CtError::io_with_source(
                    format!("无法创建输出目录 {}", output_dir.display()),
                    e,
                ))
            }
        }

        receptors
            .table()?
            .write_csv(&output_dir.join(RECEPTOR_FILE_NAME))?;
        inputs.write(&output_dir.join(INPUTS_FILE_NAME))?;

        let jobs: Vec<CategoryJob> = prepared
            .categories
            .iter()
            .map(|&c| CategoryJob::new(c, output_dir, params.model_variant))
            .collect();
        for job in &jobs {
            job.write_input(prepared)?;
        }

        ctx.emit(RunEvent::InputsWritten {
            run_id: ctx.run_id(),
            directory: output_dir.to_path_buf(),
            receptors: receptors.len(),
            categories: prepared.categories.clone(),
        });
        Ok(jobs)
    }

    /// 轮询直到全部进程退出，返回是否发送过终止
    fn supervise(
        &self,
        running: &mut [Supervised<B::Handle>],
        ctx: &RunContext,
    ) -> CtResult<bool> {
        let mut terminate_sent = false;
        loop {
            thread::sleep(ctx.poll_interval());

            let mut failure = None;
            for p in running.iter_mut().filter(|p| !p.state.has_exited()) {
                match self.backend.poll(&mut p.handle) {
                    Ok(state) => {
                        if let ProcessState::Exited(code) = state {
                            self.report_exit(p.job.category, code, ctx);
                        }
                        p.state = state;
                    }
                    Err(e) => {
                        failure = Some(e);
                        break;
                    }
                }
            }
            if let Some(e) = failure {
                self.terminate_all(running);
                return Err(e);
            }

            if running.iter().all(|p| p.state.has_exited()) {
                break;
            }

            if !terminate_sent && ctx.check_terminated() {
                info!("运行 {} 收到终止请求", ctx.run_id());
                self.terminate_all(running);
                terminate_sent = true;
            }
        }
        Ok(terminate_sent || ctx.token().is_cancelled())
    }

    fn report_exit(&self, category: SourceCategory, code: Option<i32>, ctx: &RunContext) {
        match code {
            Some(0) => debug!("{} 求解器正常退出", category),
            Some(c) => warn!("{} 求解器退出码 {}", category, c),
            None => warn!("{} 求解器被信号终止", category),
        }
        ctx.emit(RunEvent::SolverExited {
            run_id: ctx.run_id(),
            category,
            exit_code: code,
        });
    }

    fn terminate_all(&self, running: &mut [Supervised<B::Handle>]) {
        for p in running.iter_mut().filter(|p| !p.state.has_exited()) {
            if let Err(e) = self.backend.terminate(&mut p.handle) {
                warn!("{} 求解器终止失败: {}", p.job.category, e);
            }
        }
    }

    fn merge_outputs<'a, I>(&self, jobs: I) -> CtResult<ConcentrationField>
    where
        I: IntoIterator<Item = &'a CategoryJob>,
    {
        let mut fields = Vec::new();
        for job in jobs {
            match job.read_output()? {
                Some(field) => fields.push(field),
                None => warn!(
                    "{} 输出表不存在，跳过: {}",
                    job.category,
                    job.output_path.display()
                ),
            }
        }
        Ok(ConcentrationField::merge(fields))
    }
}
