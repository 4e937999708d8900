// crates/ct_workflow/src/inputs.rs

//! 运行参数文件
//!
//! 每次运行在输出目录中写出 `CTOOLS_Inputs.txt`，逐行 `key = value` 记录本次运行的参数，
//! 随输出一起归档。

use std::fmt;
use std::path::Path;

use ct_config::RunParameters;
use ct_foundation::error::{CtError, CtResult};
use ct_geo::GeoBounds;
use ct_sources::{Scenario, SourceCategory};
use tracing::debug;

/// 参数文件
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputsFile {
    entries: Vec<(String, String)>,
}

impl InputsFile {
    /// 创建空参数文件
    pub fn new() -> Self {
        Self::default()
    }

    /// 一次运行的标准参数
    pub fn for_run(
        scenario: &Scenario,
        params: &RunParameters,
        bounds: &GeoBounds,
        receptor_count: usize,
    ) -> Self {
        let mut file = Self::new();
        file.push("scenario", &scenario.name);
        file.push_optional("hour", scenario.hour);
        file.push_optional("season", scenario.season);
        file.push_optional("day", scenario.day);
        file.push_optional("met_conditions", scenario.met_conditions);

        file.push("pollutant", params.pollutant.code());
        file.push("pollutant_name", params.pollutant.name());
        file.push("model_variant", params.model_variant.code());
        file.push("solver_mode", params.model_variant.solver_mode().tag());
        file.push_optional("clamp_min", params.clamp.min);
        file.push_optional("clamp_max", params.clamp.max);

        file.push("min_lon", bounds.min_lon);
        file.push("min_lat", bounds.min_lat);
        file.push("max_lon", bounds.max_lon);
        file.push("max_lat", bounds.max_lat);
        file.push("receptors", receptor_count);

        for category in SourceCategory::ALL {
            let key = format!("include_{}", category.tag().to_lowercase());
            file.push(key, u8::from(scenario.includes(category)));
        }
        file
    }

    /// 追加一项
    pub fn push(&mut self, key: impl Into<String>, value: impl fmt::Display) {
        self.entries.push((key.into(), value.to_string()));
    }

    fn push_optional<T: fmt::Display>(&mut self, key: &str, value: Option<T>) {
        if let Some(v) = value {
            self.push(key, v);
        }
    }

    /// 按键查找（首个匹配）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 写出到文件
    pub fn write(&self, path: &Path) -> CtResult<()> {
        std::fs::write(path, self.to_string())
            .map_err(|e| CtError::io_with_source(format!("写入 {}", path.display()), e))?;
        debug!("写出 {} ({} 项)", path.display(), self.entries.len());
        Ok(())
    }
}

impl fmt::Display for InputsFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.entries {
            writeln!(f, "{key} = {value}")?;
        }
        Ok(())
    }
}
