// crates/ct_receptors/src/builder.rs

//! 接收点网格生成器
//!
//! # 背景格网
//!
//! `n × n` 均匀格网覆盖边界框，每个点位于单元中心（距边缘半个单元），
//! 外层循环纬度、内层循环经度，编号先于任何道路点分配。
//!
//! # 道路近场点
//!
//! 对每条平面直线段，记 `dx, dy` 为端点增量、`d2 = dx² + dy²`：
//!
//! - `d2 == 0` 的退化段不产生任何点
//! - 采样数 `count = max(floor(sqrt(d2) / spacing), 1)`，第 `i` 个采样点位于
//!   `from + (i - 0.5) · step`
//! - 偏移向量 `(dy·|dy| / d2, dx·|dx| / d2)`，它不是单位法向量
//! - 按偏移倍数 `k` 依次生成一条采样线：`x - k·ox`, `y + k·oy`
//!
//! 候选点一律消耗编号，只有严格位于边界框内部的点被保留。

use ct_config::RunConfig;
use ct_foundation::error::CtResult;
use ct_geo::{CoordinateProjector, GeoBounds, Point2D};
use ct_sources::RoadSegment;
use tracing::debug;

use crate::receptor::{IdCounter, Receptor, ReceptorSet};

/// 整除判定的舍入容差
///
/// 经纬度往返投影后的段长会比名义长度短 1e-10 m 量级。
const SAMPLE_COUNT_EPSILON: f64 = 1e-9;

/// 直线段的采样点数
///
/// `max(floor(length / spacing), 1)`，商在容差内接近整数时按该整数计。
pub fn road_sample_count(length: f64, spacing: f64) -> usize {
    ((length / spacing + SAMPLE_COUNT_EPSILON).floor() as usize).max(1)
}

/// 接收点网格生成器
#[derive(Debug, Clone)]
pub struct ReceptorGridBuilder {
    projector: CoordinateProjector,
    /// 背景格网每轴点数
    grid_size: usize,
    /// 道路采样间距 [m]
    spacing: f64,
    /// 平行线偏移倍数
    offsets: Vec<f64>,
}

impl ReceptorGridBuilder {
    /// 默认参数：50 × 50 背景格网，200 m 间距，偏移 `0, 5, -5, 25, -25`
    pub fn new() -> Self {
        Self {
            projector: CoordinateProjector::new(),
            grid_size: 50,
            spacing: 200.0,
            offsets: vec![0.0, 5.0, -5.0, 25.0, -25.0],
        }
    }

    /// 由运行配置创建
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            projector: CoordinateProjector::new(),
            grid_size: config.background_grid_size,
            spacing: config.receptor_spacing,
            offsets: config.road_offsets.clone(),
        }
    }

    /// 设置投影器
    #[must_use]
    pub fn with_projector(mut self, projector: CoordinateProjector) -> Self {
        self.projector = projector;
        self
    }

    /// 设置背景格网尺寸
    #[must_use]
    pub fn with_grid_size(mut self, n: usize) -> Self {
        self.grid_size = n;
        self
    }

    /// 背景格网每轴点数
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    /// 道路采样间距
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// 生成接收点集
    ///
    /// 边界框退化时返回配置错误；投影失败为致命错误。
    pub fn build(&self, bounds: &GeoBounds, segments: &[RoadSegment]) -> CtResult<ReceptorSet> {
        bounds.validate()?;

        let mut counter = IdCounter::new();
        let background = self.background(bounds, &mut counter)?;

        let mut road = Vec::new();
        let mut discarded = 0usize;
        for seg in segments {
            for r in self.road_candidates(seg.from, seg.to, &mut counter)? {
                if bounds.contains_strict(r.lon, r.lat) {
                    road.push(r);
                } else {
                    discarded += 1;
                }
            }
        }

        debug!(
            background = background.len(),
            road = road.len(),
            discarded,
            segments = segments.len(),
            "接收点生成完成"
        );
        ReceptorSet::new(background, road)
    }

    /// 背景格网
    pub fn background(
        &self,
        bounds: &GeoBounds,
        counter: &mut IdCounter,
    ) -> CtResult<Vec<Receptor>> {
        let n = self.grid_size;
        let lat_delta = bounds.lat_span() / n as f64;
        let lon_delta = bounds.lon_span() / n as f64;
        let lat_start = bounds.min_lat + 0.5 * lat_delta;
        let lon_start = bounds.min_lon + 0.5 * lon_delta;

        let mut receptors = Vec::with_capacity(n * n);
        for i in 0..n {
            let lat = lat_start + i as f64 * lat_delta;
            for j in 0..n {
                let lon = lon_start + j as f64 * lon_delta;
                receptors.push(Receptor::from_geo(counter.next(), lon, lat, &self.projector)?);
            }
        }
        Ok(receptors)
    }

    /// 单条直线段的候选接收点（未经边界框过滤）
    ///
    /// 退化段返回空集且不消耗编号。
    pub fn road_candidates(
        &self,
        from: Point2D,
        to: Point2D,
        counter: &mut IdCounter,
    ) -> CtResult<Vec<Receptor>> {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let d2 = dx * dx + dy * dy;
        if d2 == 0.0 {
            return Ok(Vec::new());
        }

        let count = road_sample_count(d2.sqrt(), self.spacing);
        let step_x = dx / count as f64;
        let step_y = dy / count as f64;
        // 垂线方向：x、y 分量互换
        let ox = dy * dy.abs() / d2;
        let oy = dx * dx.abs() / d2;

        let mut receptors = Vec::with_capacity(count * self.offsets.len());
        for &k in &self.offsets {
            for i in 0..count {
                let t = i as f64 - 0.5;
                let x = from.x + t * step_x - k * ox;
                let y = from.y + t * step_y + k * oy;
                receptors.push(Receptor::from_planar(counter.next(), x, y, &self.projector)?);
            }
        }
        Ok(receptors)
    }
}

impl Default for ReceptorGridBuilder {
    fn default() -> Self {
        Self::new()
    }
}
