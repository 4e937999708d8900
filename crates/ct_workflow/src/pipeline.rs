// crates/ct_workflow/src/pipeline.rs

//! 运行流水线
//!
//! 把各组件串成完整的一次运行：
//!
//! ```text
//! 场景 -> 预处理 -> 接收点 -> 模型运行 -> 变换 -> 栅格合成 -> 归档
//! ```
//!
//! 单场景运行对合并后的浓度取 `log10`。比较运行依次执行两个场景（共享同一接收点集，
//! 使两个浓度场逐点对齐），按比较模式合并后写出 `results.csv`，图像写入第一个场景的目录。
//!
//! 运行记录在开始、结束时写入存储。外部把存储中的状态改为 `terminated` 即可终止运行。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ct_config::{ComparisonMode, RunConfig, RunParameters};
use ct_foundation::error::{CtError, CtResult};
use ct_foundation::{ensure, require};
use ct_raster::{RasterArtifacts, RasterSynthesizer, RenderMode, ScatterSample};
use ct_receptors::{ReceptorGridBuilder, ReceptorSet};
use ct_sources::{InputTable, RoadSegment, Scenario, SourceDataPreparer};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::archive::{archive_comparison, archive_directory, ScenarioOutput};
use crate::context::{RunContext, StorageStatusProbe};
use crate::events::{EventDispatcher, RunEvent};
use crate::inputs::InputsFile;
use crate::process::ProcessBackend;
use crate::run::{RunId, RunStatus, ScenarioRun};
use crate::runner::ModelRunner;
use crate::storage::Storage;
use crate::RESULTS_FILE_NAME;

/// 一次成功运行的结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// 最终运行记录
    pub run: ScenarioRun,
    /// 图像与图例
    pub artifacts: RasterArtifacts,
    /// 归档文件
    pub archive_path: PathBuf,
}

type StageOutput = (RasterArtifacts, PathBuf);

/// 运行流水线
pub struct Pipeline<B> {
    config: RunConfig,
    runner: ModelRunner<B>,
    storage: Arc<dyn Storage>,
    events: Arc<EventDispatcher>,
    preparer: SourceDataPreparer,
    grid_builder: ReceptorGridBuilder,
    synthesizer: RasterSynthesizer,
}

impl<B: ProcessBackend> Pipeline<B> {
    /// 创建流水线
    pub fn new(config: RunConfig, backend: B, storage: Arc<dyn Storage>) -> CtResult<Self> {
        config.validate()?;
        Ok(Self {
            runner: ModelRunner::new(backend, config.clone()),
            storage,
            events: Arc::new(EventDispatcher::new()),
            preparer: SourceDataPreparer::new(),
            grid_builder: ReceptorGridBuilder::from_config(&config),
            synthesizer: RasterSynthesizer::from_config(&config),
            config,
        })
    }

    /// 使用共享的事件分发器
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventDispatcher>) -> Self {
        self.events = events;
        self
    }

    /// 运行配置
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// 模型运行器
    pub fn runner(&self) -> &ModelRunner<B> {
        &self.runner
    }

    /// 运行记录存储
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// 事件分发器
    pub fn events(&self) -> &Arc<EventDispatcher> {
        &self.events
    }

    // ========================================================================
    // 单场景运行
    // ========================================================================

    /// 登记单场景运行（状态为 pending）
    pub fn create_single(&self, scenario: &Scenario, params: RunParameters) -> CtResult<ScenarioRun> {
        params.clamp.validate()?;
        let bounds = scenario.bounds()?;
        let run = ScenarioRun::single(
            scenario.name.clone(),
            &scenario.safe_name(),
            params,
            bounds,
            self.fresh_directory(),
        );
        self.storage.save_run(&run)?;
        Ok(run)
    }

    /// 执行已登记的单场景运行
    pub fn execute_single(&self, run: &mut ScenarioRun, scenario: &Scenario) -> CtResult<RunSummary> {
        let ctx = self.begin(run, &scenario.name)?;
        let result = self.single_stages(run, scenario, &ctx);
        self.finish(run, result, &ctx)
    }

    /// 登记并执行单场景运行
    pub fn run_single(&self, scenario: &Scenario, params: RunParameters) -> CtResult<RunSummary> {
        let mut run = self.create_single(scenario, params)?;
        self.execute_single(&mut run, scenario)
    }

    fn single_stages(
        &self,
        run: &mut ScenarioRun,
        scenario: &Scenario,
        ctx: &RunContext,
    ) -> CtResult<StageOutput> {
        let dir = require!(
            run.primary_directory().cloned(),
            CtError::internal("运行记录缺少输出目录")
        );

        let prepared = self.preparer.prepare(scenario)?;
        let receptors = self.grid_builder.build(&run.bounds, &prepared.road_segments)?;
        log_receptors(run.id, &receptors);
        let inputs = InputsFile::for_run(scenario, &run.params, &run.bounds, receptors.len());

        let report = self
            .runner
            .run(&prepared, &receptors, &inputs, &run.params, &dir, ctx)?;
        run.outcomes = report.outcomes;
        ensure!(!report.terminated, CtError::TaskCancelled);

        let mut samples = report
            .field
            .floored_samples(&receptors, self.config.min_nonzero);
        for s in &mut samples {
            s.value = s.value.log10();
        }
        self.record_range(run, &samples);

        let artifacts = self.render(&samples, RenderMode::Single, run, &dir, ctx)?;
        ensure!(!ctx.check_terminated(), CtError::TaskCancelled);
        let archive = archive_directory(&dir, &self.archive_path(run))?;
        Ok((artifacts, archive))
    }

    // ========================================================================
    // 比较运行
    // ========================================================================

    /// 登记比较运行，边界框为两个场景的并集
    pub fn create_comparison(
        &self,
        first: &Scenario,
        second: &Scenario,
        mode: ComparisonMode,
        params: RunParameters,
    ) -> CtResult<ScenarioRun> {
        params.clamp.validate()?;
        let bounds = first.bounds()?.merge(&second.bounds()?);
        let run = ScenarioRun::comparison(
            (first.name.clone(), second.name.clone()),
            (&first.safe_name(), &second.safe_name()),
            mode,
            params,
            bounds,
            (self.fresh_directory(), self.fresh_directory()),
        );
        self.storage.save_run(&run)?;
        Ok(run)
    }

    /// 执行已登记的比较运行
    pub fn execute_comparison(
        &self,
        run: &mut ScenarioRun,
        first: &Scenario,
        second: &Scenario,
    ) -> CtResult<RunSummary> {
        let name = format!("{} vs {}", first.name, second.name);
        let ctx = self.begin(run, &name)?;
        let result = self.comparison_stages(run, first, second, &ctx);
        self.finish(run, result, &ctx)
    }

    /// 登记并执行比较运行
    pub fn run_comparison(
        &self,
        first: &Scenario,
        second: &Scenario,
        mode: ComparisonMode,
        params: RunParameters,
    ) -> CtResult<RunSummary> {
        let mut run = self.create_comparison(first, second, mode, params)?;
        self.execute_comparison(&mut run, first, second)
    }

    fn comparison_stages(
        &self,
        run: &mut ScenarioRun,
        first: &Scenario,
        second: &Scenario,
        ctx: &RunContext,
    ) -> CtResult<StageOutput> {
        let mode = require!(run.comparison_mode(), CtError::internal("运行记录不是比较运行"));
        let (dir1, dir2) = match run.output_directories.as_slice() {
            [a, b] => (a.clone(), b.clone()),
            _ => return Err(CtError::internal("比较运行需要两个输出目录")),
        };

        let prepared1 = self.preparer.prepare(first)?;
        let prepared2 = self.preparer.prepare(second)?;
        let segments: Vec<RoadSegment> = prepared1
            .road_segments
            .iter()
            .chain(&prepared2.road_segments)
            .cloned()
            .collect();
        let receptors = self.grid_builder.build(&run.bounds, &segments)?;
        log_receptors(run.id, &receptors);

        let mut fields = Vec::with_capacity(2);
        for (scenario, prepared, dir) in [(first, &prepared1, &dir1), (second, &prepared2, &dir2)] {
            let inputs = InputsFile::for_run(scenario, &run.params, &run.bounds, receptors.len());
            let report = self
                .runner
                .run(prepared, &receptors, &inputs, &run.params, dir, ctx)?;
            run.outcomes.extend(report.outcomes);
            ensure!(!report.terminated, CtError::TaskCancelled);
            fields.push(report.field);
        }

        let floor = self.config.min_nonzero;
        let base = fields[0].floored_samples(&receptors, floor);
        let other = fields[1].floored_samples(&receptors, floor);
        let samples: Vec<ScatterSample> = base
            .iter()
            .zip(&other)
            .map(|(a, b)| a.with_value(mode.combine(a.value, b.value)))
            .collect();
        write_results(&dir1.join(RESULTS_FILE_NAME), &samples, mode)?;
        self.record_range(run, &samples);

        let artifacts = self.render(&samples, RenderMode::Comparison(mode), run, &dir1, ctx)?;
        ensure!(!ctx.check_terminated(), CtError::TaskCancelled);
        let archive = archive_comparison(
            ScenarioOutput {
                name: &first.safe_name(),
                directory: &dir1,
            },
            ScenarioOutput {
                name: &second.safe_name(),
                directory: &dir2,
            },
            &self.archive_path(run),
        )?;
        Ok((artifacts, archive))
    }

    // ========================================================================
    // 终止
    // ========================================================================

    /// 请求终止运行
    ///
    /// 已结束的运行不受影响，返回 `false`。
    pub fn cancel(&self, id: RunId) -> CtResult<bool> {
        let status = self.storage.status(id)?;
        if status.is_terminal() {
            return Ok(false);
        }
        self.storage.set_status(id, RunStatus::Terminated)?;
        info!("已请求终止运行 {}", id);
        Ok(true)
    }

    // ========================================================================
    // 公共步骤
    // ========================================================================

    fn fresh_directory(&self) -> PathBuf {
        self.config
            .scenario_run_directory
            .join(Uuid::new_v4().to_string())
    }

    fn archive_path(&self, run: &ScenarioRun) -> PathBuf {
        self.config.archive_directory.join(&run.archive_name)
    }

    fn context(&self, id: RunId) -> RunContext {
        RunContext::new(id)
            .with_probe(Arc::new(StorageStatusProbe::new(self.storage.clone(), id)))
            .with_events(self.events.clone())
            .with_poll_interval(self.config.poll_interval())
    }

    fn begin(&self, run: &mut ScenarioRun, name: &str) -> CtResult<RunContext> {
        let ctx = self.context(run.id);
        // 登记后、开始前已被终止
        if ctx.check_terminated() {
            run.mark_terminated();
            self.storage.save_run(run)?;
            ctx.emit(RunEvent::Terminated { run_id: run.id });
            return Err(CtError::TaskCancelled);
        }
        run.mark_started();
        self.storage.save_run(run)?;
        info!("运行 {} 开始: {}", run.id, name);
        ctx.emit(RunEvent::Started {
            run_id: run.id,
            name: name.to_string(),
        });
        Ok(ctx)
    }

    fn render(
        &self,
        samples: &[ScatterSample],
        mode: RenderMode,
        run: &ScenarioRun,
        dir: &Path,
        ctx: &RunContext,
    ) -> CtResult<RasterArtifacts> {
        let artifacts = self.synthesizer.synthesize(samples, mode, &run.params, dir)?;
        ctx.emit(RunEvent::Rendered {
            run_id: run.id,
            image: artifacts.image_path.clone(),
        });
        Ok(artifacts)
    }

    /// 记录截断后的取值范围
    fn record_range(&self, run: &mut ScenarioRun, samples: &[ScatterSample]) {
        let clamp = run.params.clamp;
        let range = samples
            .iter()
            .map(|s| clamp.clamp(s.value))
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            });
        if let Some((lo, hi)) = range {
            run.min_value = Some(lo);
            run.max_value = Some(hi);
        }
    }

    fn finish(
        &self,
        run: &mut ScenarioRun,
        result: CtResult<StageOutput>,
        ctx: &RunContext,
    ) -> CtResult<RunSummary> {
        match result {
            Ok((artifacts, archive_path)) => {
                run.mark_completed();
                self.storage.save_run(run)?;
                let duration_secs = run.duration_secs().unwrap_or(0.0);
                info!(
                    "运行 {} 完成, 用时 {:.1}s, 归档 {}",
                    run.id,
                    duration_secs,
                    archive_path.display()
                );
                ctx.emit(RunEvent::Completed {
                    run_id: run.id,
                    archive: archive_path.clone(),
                    duration_secs,
                });
                Ok(RunSummary {
                    run: run.clone(),
                    artifacts,
                    archive_path,
                })
            }
            Err(e) => {
                if e.is_cancelled() {
                    run.mark_terminated();
                    info!("运行 {} 已终止", run.id);
                    ctx.emit(RunEvent::Terminated { run_id: run.id });
                } else {
                    run.mark_failed(e.to_string());
                    error!("运行 {} 失败: {}", run.id, e);
                    ctx.emit(RunEvent::Failed {
                        run_id: run.id,
                        error: e.to_string(),
                    });
                }
                if let Err(save_err) = self.storage.save_run(run) {
                    warn!("运行 {} 记录保存失败: {}", run.id, save_err);
                }
                Err(e)
            }
        }
    }
}

/// 写出比较结果表 `x,y,<标题>`
fn write_results(path: &Path, samples: &[ScatterSample], mode: ComparisonMode) -> CtResult<()> {
    let mut table = InputTable::new(["x", "y", mode.results_title()]);
    for s in samples {
        table.push_numbers([s.x, s.y, s.value])?;
    }
    table.write_csv(path)
}

fn log_receptors(id: RunId, receptors: &ReceptorSet) {
    info!(
        "运行 {}: {} 个接收点 (背景 {}, 道路 {})",
        id,
        receptors.len(),
        receptors.background_count(),
        receptors.road_count()
    );
}
