// crates/ct_workflow/src/run.rs

//! 运行记录
//!
//! 一次运行（单场景或两场景比较）的参数、状态与产物位置。
//! 状态字段是外部终止请求的通道：外部写入 `terminated` 后，
//! 监督循环在下一个轮询周期内终止全部求解器进程。

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use ct_config::{ComparisonMode, RunParameters};
use ct_geo::GeoBounds;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::runner::SolverOutcome;

/// 运行ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// 创建新的运行ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// 从UUID创建
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// 获取内部UUID
    pub fn uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// 已创建，尚未开始
    Pending,
    /// 运行中
    Running,
    /// 被外部终止
    Terminated,
    /// 已完成
    Completed,
    /// 失败
    Failed,
}

impl RunStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated | Self::Completed | Self::Failed)
    }

    /// 状态字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Terminated => "terminated",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "terminated" => Ok(Self::Terminated),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("未知运行状态: {other}")),
        }
    }
}

/// 运行类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunKind {
    /// 单场景
    Single {
        /// 场景名称
        scenario: String,
    },
    /// 两场景比较
    Comparison {
        /// 第一场景名称
        scenario_1: String,
        /// 第二场景名称
        scenario_2: String,
        /// 比较模式
        mode: ComparisonMode,
    },
}

/// 运行记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioRun {
    /// 运行ID
    pub id: RunId,
    /// 运行类型
    pub kind: RunKind,
    /// 状态
    pub status: RunStatus,
    /// 请求参数
    pub params: RunParameters,
    /// 计算区域
    pub bounds: GeoBounds,
    /// 输出目录（比较运行为两个）
    pub output_directories: Vec<PathBuf>,
    /// 归档文件名
    pub archive_name: String,
    /// 栅格值下限
    pub min_value: Option<f64>,
    /// 栅格值上限
    pub max_value: Option<f64>,
    /// 各类别求解器的退出情况
    #[serde(default)]
    pub outcomes: Vec<SolverOutcome>,
    /// 创建时间
    pub created_at: DateTime<Utc>,
    /// 开始时间
    pub started_at: Option<DateTime<Utc>>,
    /// 结束时间
    pub finished_at: Option<DateTime<Utc>>,
    /// 错误信息
    pub error: Option<String>,
}

impl ScenarioRun {
    /// 单场景运行
    pub fn single(
        scenario: impl Into<String>,
        safe_name: &str,
        params: RunParameters,
        bounds: GeoBounds,
        output_directory: PathBuf,
    ) -> Self {
        Self::with_kind(
            RunKind::Single {
                scenario: scenario.into(),
            },
            format!("{safe_name}.tar.gz"),
            params,
            bounds,
            vec![output_directory],
        )
    }

    /// 比较运行
    pub fn comparison(
        scenarios: (String, String),
        safe_names: (&str, &str),
        mode: ComparisonMode,
        params: RunParameters,
        bounds: GeoBounds,
        output_directories: (PathBuf, PathBuf),
    ) -> Self {
        Self::with_kind(
            RunKind::Comparison {
                scenario_1: scenarios.0,
                scenario_2: scenarios.1,
                mode,
            },
            format!("{}_vs_{}.tar.gz", safe_names.0, safe_names.1),
            params,
            bounds,
            vec![output_directories.0, output_directories.1],
        )
    }

    fn with_kind(
        kind: RunKind,
        archive_name: String,
        params: RunParameters,
        bounds: GeoBounds,
        output_directories: Vec<PathBuf>,
    ) -> Self {
        Self {
            id: RunId::new(),
            kind,
            status: RunStatus::Pending,
            params,
            bounds,
            output_directories,
            archive_name,
            min_value: None,
            max_value: None,
            outcomes: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
            error: None,
        }
    }

    /// 主输出目录（图像所在目录）
    pub fn primary_directory(&self) -> Option<&PathBuf> {
        self.output_directories.first()
    }

    /// 是否为比较运行
    pub fn is_comparison(&self) -> bool {
        matches!(self.kind, RunKind::Comparison { .. })
    }

    /// 比较模式
    pub fn comparison_mode(&self) -> Option<ComparisonMode> {
        match self.kind {
            RunKind::Comparison { mode, .. } => Some(mode),
            RunKind::Single { .. } => None,
        }
    }

    /// 标记开始
    pub fn mark_started(&mut self) {
        self.status = RunStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// 标记完成
    pub fn mark_completed(&mut self) {
        self.status = RunStatus::Completed;
        self.finished_at = Some(Utc::now());
    }

    /// 标记失败
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.status = RunStatus::Failed;
        self.finished_at = Some(Utc::now());
        self.error = Some(error.into());
    }

    /// 标记终止
    pub fn mark_terminated(&mut self) {
        self.status = RunStatus::Terminated;
        self.finished_at = Some(Utc::now());
    }

    /// 运行时长 (秒)
    pub fn duration_secs(&self) -> Option<f64> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(Utc::now);
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }
}
