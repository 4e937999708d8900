// crates/ct_receptors/src/receptor.rs

//! 接收点与编号计数器

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use ct_foundation::ensure;
use ct_foundation::error::{CtError, CtResult};
use ct_geo::CoordinateProjector;
use ct_sources::InputTable;

/// 接收点
///
/// 同时持有平面坐标与地理坐标，缺失的一对由投影推导。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Receptor {
    /// 编号（从 1 开始）
    pub id: u64,
    /// 平面 x [m]
    pub x: f64,
    /// 平面 y [m]
    pub y: f64,
    /// 经度
    pub lon: f64,
    /// 纬度
    pub lat: f64,
}

impl Receptor {
    /// 由地理坐标构造
    pub fn from_geo(
        id: u64,
        lon: f64,
        lat: f64,
        projector: &CoordinateProjector,
    ) -> CtResult<Self> {
        let (x, y) = projector.forward(lon, lat)?;
        Ok(Self { id, x, y, lon, lat })
    }

    /// 由平面坐标构造
    pub fn from_planar(
        id: u64,
        x: f64,
        y: f64,
        projector: &CoordinateProjector,
    ) -> CtResult<Self> {
        let (lon, lat) = projector.inverse(x, y)?;
        Ok(Self { id, x, y, lon, lat })
    }
}

/// 单调递增编号计数器，作用域为一次运行
#[derive(Debug, Clone)]
pub struct IdCounter {
    next: u64,
}

impl IdCounter {
    /// 从 1 开始
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// 取下一个编号
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    /// 已发放的编号数
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// 一次运行的接收点集
#[derive(Debug, Clone, Default)]
pub struct ReceptorSet {
    receptors: Vec<Receptor>,
    background_count: usize,
    index: HashMap<u64, usize>,
}

impl ReceptorSet {
    /// 由背景点与道路点组装
    pub fn new(background: Vec<Receptor>, road: Vec<Receptor>) -> CtResult<Self> {
        let background_count = background.len();
        let mut receptors = background;
        receptors.extend(road);

        let mut index = HashMap::with_capacity(receptors.len());
        for (i, r) in receptors.iter().enumerate() {
            ensure!(
                index.insert(r.id, i).is_none(),
                CtError::invalid_input(format!("接收点编号重复: {}", r.id))
            );
        }

        Ok(Self {
            receptors,
            background_count,
            index,
        })
    }

    /// 全部接收点（背景点在前）
    pub fn receptors(&self) -> &[Receptor] {
        &self.receptors
    }

    /// 迭代接收点
    pub fn iter(&self) -> std::slice::Iter<'_, Receptor> {
        self.receptors.iter()
    }

    /// 接收点数
    pub fn len(&self) -> usize {
        self.receptors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.receptors.is_empty()
    }

    /// 背景点数
    pub fn background_count(&self) -> usize {
        self.background_count
    }

    /// 道路点数
    pub fn road_count(&self) -> usize {
        self.receptors.len() - self.background_count
    }

    /// 按编号查找
    pub fn get(&self, id: u64) -> Option<&Receptor> {
        self.index.get(&id).map(|&i| &self.receptors[i])
    }

    /// 求解器接收点表 `id,x,y`
    pub fn table(&self) -> CtResult<InputTable> {
        let mut table = InputTable::new(["id", "x", "y"]);
        for r in &self.receptors {
            table.push_numbers([r.id as f64, r.x, r.y])?;
        }
        Ok(table)
    }
}

impl<'a> IntoIterator for &'a ReceptorSet {
    type Item = &'a Receptor;
    type IntoIter = std::slice::Iter<'a, Receptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.receptors.iter()
    }
}
