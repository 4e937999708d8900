// crates/ct_workflow/src/field.rs

//! 浓度场
//!
//! 接收点编号到标量值的映射。各类别输出按编号求和，缺失的编号按 0 计。

use std::collections::BTreeMap;
use std::path::Path;

use ct_foundation::error::{CtError, CtResult};
use ct_raster::ScatterSample;
use ct_receptors::ReceptorSet;
use tracing::debug;

/// 接收点编号 -> 浓度
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcentrationField {
    values: BTreeMap<u64, f64>,
}

impl ConcentrationField {
    /// 创建空浓度场
    pub fn new() -> Self {
        Self::default()
    }

    /// 由 (编号, 值) 对创建，重复编号以后者为准
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (u64, f64)>,
    {
        Self {
            values: pairs.into_iter().collect(),
        }
    }

    /// 条目数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 查询
    pub fn get(&self, id: u64) -> Option<f64> {
        self.values.get(&id).copied()
    }

    /// 写入
    pub fn insert(&mut self, id: u64, value: f64) {
        self.values.insert(id, value);
    }

    /// 按编号升序遍历
    pub fn iter(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.values.iter().map(|(&id, &v)| (id, v))
    }

    /// 求和合并，任一场中出现的编号都会出现在结果中
    pub fn merge<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = ConcentrationField>,
    {
        let mut merged = BTreeMap::new();
        for field in fields {
            for (id, v) in field.values {
                *merged.entry(id).or_insert(0.0) += v;
            }
        }
        Self { values: merged }
    }

    /// 读取求解器输出表
    ///
    /// 第 0 列为接收点编号，`value_column` 列为取值。首行首列不是整数时视为表头。
    /// 编号允许写成 `12.0` 这样的浮点形式。空行被跳过，行宽可以不一致。
    pub fn read_output_table(path: &Path, value_column: usize) -> CtResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| CtError::io_with_source(format!("读取 {}", path.display()), e.into()))?;

        let mut values = BTreeMap::new();
        for (index, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| {
                let line = e.position().map_or(index + 1, |p| p.line() as usize);
                CtError::parse(path, line, format!("CSV 解析失败: {e}"))
            })?;
            let line_no = record
                .position()
                .map_or(index + 1, |p| p.line() as usize);

            let first = record.get(0).unwrap_or_default();
            let Some(id) = parse_id(first) else {
                if index == 0 {
                    continue;
                }
                return Err(CtError::parse(
                    path,
                    line_no,
                    format!("接收点编号无效: '{first}'"),
                ));
            };

            let raw = record.get(value_column).ok_or_else(|| {
                CtError::parse(
                    path,
                    line_no,
                    format!("缺少第 {value_column} 列（共 {} 列）", record.len()),
                )
            })?;
            let value: f64 = raw
                .parse()
                .map_err(|_| CtError::parse(path, line_no, format!("浓度值无效: '{raw}'")))?;
            values.insert(id, value);
        }

        debug!("读取 {}: {} 个接收点", path.display(), values.len());
        Ok(Self { values })
    }

    /// 以接收点坐标展开为样本，取值不低于 `floor`，无结果的接收点取 `floor`
    pub fn floored_samples(&self, receptors: &ReceptorSet, floor: f64) -> Vec<ScatterSample> {
        receptors
            .iter()
            .map(|r| {
                let value = self.get(r.id).map_or(floor, |v| v.max(floor));
                ScatterSample::new(r.x, r.y, value)
            })
            .collect()
    }
}

fn parse_id(field: &str) -> Option<u64> {
    if let Ok(id) = field.parse::<u64>() {
        return Some(id);
    }
    let f: f64 = field.parse().ok()?;
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0).then_some(f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_receptors::Receptor;
    use std::io::Write;

    #[test]
    fn test_merge_sums_with_missing_as_zero() {
        let a = ConcentrationField::from_pairs([(1, 1.5), (2, 2.0)]);
        let b = ConcentrationField::from_pairs([(2, 0.5)]);
        let c = ConcentrationField::from_pairs([(3, 4.0)]);
        let merged = ConcentrationField::merge([a, b, c]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get(1), Some(1.5));
        assert_eq!(merged.get(2), Some(2.5));
        assert_eq!(merged.get(3), Some(4.0));
        assert!(ConcentrationField::merge(Vec::new()).is_empty());
    }

    #[test]
    fn test_read_output_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(f, "id,x,y,hourly,annual").unwrap();
        writeln!(f, "1,0,0,0.25,7").unwrap();
        writeln!(f, "2.0, 5, 5, 0.5 ,8").unwrap();
        writeln!(f).unwrap();

        let hourly = ConcentrationField::read_output_table(&path, 3).unwrap();
        assert_eq!(hourly.get(1), Some(0.25));
        assert_eq!(hourly.get(2), Some(0.5));

        let annual = ConcentrationField::read_output_table(&path, 4).unwrap();
        assert_eq!(annual.get(2), Some(8.0));
    }

    #[test]
    fn test_read_quoted_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");
        std::fs::write(&path, "id,label,y,hourly\n\"3\",\"a, b\",0,\"0.75\"\n4,c,0,1.5\n").unwrap();

        let field = ConcentrationField::read_output_table(&path, 3).unwrap();
        assert_eq!(field.len(), 2);
        assert_eq!(field.get(3), Some(0.75));
        assert_eq!(field.get(4), Some(1.5));
    }

    #[test]
    fn test_read_output_table_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "1,0,0,0.1\nabc,0,0,0.2\n").unwrap();
        match ConcentrationField::read_output_table(&path, 3) {
            Err(CtError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected: {other:?}"),
        }

        std::fs::write(&path, "1,0,0\n").unwrap();
        assert!(matches!(
            ConcentrationField::read_output_table(&path, 3),
            Err(CtError::ParseError { line: 1, .. })
        ));

        assert!(ConcentrationField::read_output_table(&dir.path().join("missing.csv"), 3).is_err());
    }

    #[test]
    fn test_floored_samples() {
        let receptors = ReceptorSet::new(
            (1..=3)
                .map(|id| Receptor {
                    id,
                    x: (id - 1) as f64,
                    y: 0.0,
                    lon: 0.0,
                    lat: 0.0,
                })
                .collect(),
            Vec::new(),
        )
        .unwrap();
        let field = ConcentrationField::from_pairs([(1, 5.0), (2, 0.0)]);
        let samples = field.floored_samples(&receptors, 1e-6);
        let values: Vec<_> = samples.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![5.0, 1e-6, 1e-6]);
        assert_eq!(samples[1].x, 1.0);
    }
}
