// crates/ct_config/src/run_config.rs

//! RunConfig - 流水线运行配置
//!
//! 描述求解器位置、工作目录以及流水线的数值常量。
//! 所有字段都有默认值，JSON 中缺省的字段使用默认值填充。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::ConfigError;
use crate::model::SolverMode;

/// 运行配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// 求解器可执行文件所在目录
    #[serde(default = "default_solver_dir")]
    pub solver_dir: PathBuf,

    /// 逐时求解器文件名
    #[serde(default = "default_hourly_solver")]
    pub hourly_solver: String,

    /// 年均求解器文件名
    #[serde(default = "default_annual_solver")]
    pub annual_solver: String,

    /// 每次运行的输出目录在此目录下以 UUID 命名创建
    #[serde(default = "default_scenario_run_directory")]
    pub scenario_run_directory: PathBuf,

    /// 归档文件输出目录
    #[serde(default = "default_archive_directory")]
    pub archive_directory: PathBuf,

    /// 监督循环轮询间隔 [ms]
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// 最小非零浓度（对数变换前的下限）
    #[serde(default = "default_min_nonzero")]
    pub min_nonzero: f64,

    /// 栅格长轴像素数
    #[serde(default = "default_max_raster_dimension")]
    pub max_raster_dimension: u32,

    /// 背景网格每轴点数
    #[serde(default = "default_background_grid_size")]
    pub background_grid_size: usize,

    /// 道路接收点间距 [m]
    #[serde(default = "default_receptor_spacing")]
    pub receptor_spacing: f64,

    /// 道路平行线偏移倍数
    #[serde(default = "default_road_offsets")]
    pub road_offsets: Vec<f64>,

    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_solver_dir() -> PathBuf { PathBuf::from("ctools") }
fn default_hourly_solver() -> String { "CTOOLS_HOURLY.ifort.x".to_string() }
fn default_annual_solver() -> String { "CTOOLS_ANNUAL.ifort.x".to_string() }
fn default_scenario_run_directory() -> PathBuf { PathBuf::from("runs") }
fn default_archive_directory() -> PathBuf { PathBuf::from("archives") }
fn default_poll_interval_ms() -> u64 { 1000 }
fn default_min_nonzero() -> f64 { 1e-6 }
fn default_max_raster_dimension() -> u32 { 1600 }
fn default_background_grid_size() -> usize { 50 }
fn default_receptor_spacing() -> f64 { 200.0 }
fn default_road_offsets() -> Vec<f64> { vec![0.0, 5.0, -5.0, 25.0, -25.0] }
fn default_log_level() -> String { "info".to_string() }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            solver_dir: default_solver_dir(),
            hourly_solver: default_hourly_solver(),
            annual_solver: default_annual_solver(),
            scenario_run_directory: default_scenario_run_directory(),
            archive_directory: default_archive_directory(),
            poll_interval_ms: default_poll_interval_ms(),
            min_nonzero: default_min_nonzero(),
            max_raster_dimension: default_max_raster_dimension(),
            background_grid_size: default_background_grid_size(),
            receptor_spacing: default_receptor_spacing(),
            road_offsets: default_road_offsets(),
            log_level: default_log_level(),
        }
    }
}

impl RunConfig {
    /// 从文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;

        let config: RunConfig =
            serde_json::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "poll_interval_ms",
                self.poll_interval_ms,
                "轮询间隔必须为正",
            ));
        }

        if !(self.min_nonzero.is_finite() && self.min_nonzero > 0.0) {
            return Err(ConfigError::invalid_value(
                "min_nonzero",
                self.min_nonzero,
                "最小非零浓度必须为正的有限值",
            ));
        }

        if self.max_raster_dimension < 2 {
            return Err(ConfigError::invalid_value(
                "max_raster_dimension",
                self.max_raster_dimension,
                "栅格长轴至少为 2 像素",
            ));
        }

        if self.background_grid_size == 0 {
            return Err(ConfigError::invalid_value(
                "background_grid_size",
                self.background_grid_size,
                "背景网格不能为空",
            ));
        }

        if !(self.receptor_spacing.is_finite() && self.receptor_spacing > 0.0) {
            return Err(ConfigError::invalid_value(
                "receptor_spacing",
                self.receptor_spacing,
                "接收点间距必须为正",
            ));
        }

        if self.road_offsets.is_empty() {
            return Err(ConfigError::Missing("road_offsets".to_string()));
        }

        if self.hourly_solver.is_empty() || self.annual_solver.is_empty() {
            return Err(ConfigError::Missing("hourly_solver / annual_solver".to_string()));
        }

        Ok(())
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// 指定模式的求解器完整路径
    pub fn solver_path(&self, mode: SolverMode) -> PathBuf {
        let file = match mode {
            SolverMode::Hourly => &self.hourly_solver,
            SolverMode::Annual => &self.annual_solver,
        };
        self.solver_dir.join(file)
    }

    /// 轮询间隔
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// 设置轮询间隔（测试中常用较短间隔）
    #[must_use]
    pub fn with_poll_interval_ms(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// 设置运行目录与归档目录
    #[must_use]
    pub fn with_directories(
        mut self,
        scenario_run_directory: impl Into<PathBuf>,
        archive_directory: impl Into<PathBuf>,
    ) -> Self {
        self.scenario_run_directory = scenario_run_directory.into();
        self.archive_directory = archive_directory.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RunConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.min_nonzero, 1e-6);
        assert_eq!(config.max_raster_dimension, 1600);
    }

    #[test]
    fn test_solver_path() {
        let config = RunConfig::default();
        assert_eq!(
            config.solver_path(SolverMode::Annual),
            PathBuf::from("ctools").join("CTOOLS_ANNUAL.ifort.x")
        );
    }

    #[test]
    fn test_invalid_values() {
        let mut config = RunConfig::default();
        config.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.min_nonzero = 0.0;
        assert!(config.validate().is_err());

        let mut config = RunConfig::default();
        config.road_offsets.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RunConfig = serde_json::from_str(r#"{"solver_dir": "/opt/ctools"}"#).unwrap();
        assert_eq!(config.solver_dir, PathBuf::from("/opt/ctools"));
        assert_eq!(config.background_grid_size, 50);
        assert_eq!(config.road_offsets, vec![0.0, 5.0, -5.0, 25.0, -25.0]);
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let config = RunConfig::default().with_poll_interval_ms(10);
        config.save_to_file(&path).unwrap();

        let loaded = RunConfig::from_file(&path).unwrap();
        assert_eq!(loaded.poll_interval_ms, 10);
    }

    #[test]
    fn test_from_file_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, r#"{"receptor_spacing": -1.0}"#).unwrap();
        assert!(matches!(
            RunConfig::from_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
