// crates/ct_raster/src/colormap.rs

//! 色表与透明度渐变
//!
//! 色表为 256 级 viridis，取自 `colorous` 的 matplotlib 原表。
//! 每个色表项带一个透明度，低值区域近乎透明，便于叠加在底图上：
//!
//! - [`AlphaRamp::Absolute`]: 第 `i` 项透明度 `min(2i/(N-1), 1)`
//! - [`AlphaRamp::Symmetric`]: 以 0 为中心，透明度随 `|v|` 线性增长

use image::{Rgba, RgbaImage};

use crate::error::{RasterError, RasterResult};
use crate::grid::RasterData;

/// 色表项数
pub const COLOR_TABLE_SIZE: usize = 256;

// ============================================================
// 透明度渐变
// ============================================================

/// 透明度渐变方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlphaRamp {
    /// 自低端起线性增长，过半后不透明
    Absolute,
    /// 关于 0 对称，两端不透明
    Symmetric,
}

impl AlphaRamp {
    /// 色表第 `index` 项（共 `n` 项）的透明度，范围 `[0, 1]`
    pub fn alpha(&self, index: usize, n: usize) -> f64 {
        if n < 2 {
            return 1.0;
        }
        let t = index as f64 / (n - 1) as f64;
        match self {
            Self::Absolute => (2.0 * t).min(1.0),
            // 项值 v = vmin + t·(vmax - vmin)，vmin = -vmax
            // |v| / (vmax - vmin) · 2 = |2t - 1|
            Self::Symmetric => (2.0 * t - 1.0).abs().min(1.0),
        }
    }

    /// 是否使用关于 0 对称的值域
    pub fn is_symmetric(&self) -> bool {
        matches!(self, Self::Symmetric)
    }
}

// ============================================================
// 色表
// ============================================================

/// 离散色表
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable {
    colors: Vec<[u8; 3]>,
}

impl ColorTable {
    /// `n` 级 viridis 色表
    pub fn viridis(n: usize) -> Self {
        let n = n.max(2);
        let colors = (0..n)
            .map(|i| {
                let c = colorous::VIRIDIS.eval_rational(i, n);
                [c.r, c.g, c.b]
            })
            .collect();
        Self { colors }
    }

    /// 项数
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// 第 `index` 项颜色（越界取末项）
    pub fn color(&self, index: usize) -> [u8; 3] {
        self.colors[index.min(self.colors.len() - 1)]
    }

    /// 带透明度的第 `index` 项
    pub fn rgba(&self, index: usize, ramp: AlphaRamp) -> Rgba<u8> {
        let [r, g, b] = self.color(index);
        let a = (ramp.alpha(index, self.len()) * 255.0).round() as u8;
        Rgba([r, g, b, a])
    }

    /// 与白色背景合成后的不透明颜色
    pub fn over_white(&self, index: usize, ramp: AlphaRamp) -> Rgba<u8> {
        let [r, g, b] = self.color(index);
        let a = ramp.alpha(index, self.len());
        let blend = |c: u8| (f64::from(c) * a + 255.0 * (1.0 - a)).round() as u8;
        Rgba([blend(r), blend(g), blend(b), 255])
    }
}

impl Default for ColorTable {
    fn default() -> Self {
        Self::viridis(COLOR_TABLE_SIZE)
    }
}

// ============================================================
// 值域映射
// ============================================================

/// 值域到色表的映射
#[derive(Debug, Clone)]
pub struct ColorScale {
    /// 色表
    pub table: ColorTable,
    /// 透明度渐变
    pub ramp: AlphaRamp,
    /// 值域下界
    pub vmin: f64,
    /// 值域上界
    pub vmax: f64,
}

impl ColorScale {
    /// 按数据范围创建
    ///
    /// 对称渐变时值域取 `[-m, m]`，`m = max(|min|, |max|)`。
    pub fn fit(table: ColorTable, ramp: AlphaRamp, min: f64, max: f64) -> Self {
        let (vmin, vmax) = if ramp.is_symmetric() {
            let m = min.abs().max(max.abs());
            (-m, m)
        } else {
            (min, max)
        };
        Self {
            table,
            ramp,
            vmin,
            vmax,
        }
    }

    /// 值对应的色表索引
    ///
    /// 值域退化时统一映射到第 0 项。
    pub fn index(&self, value: f64) -> usize {
        let n = self.table.len();
        let span = self.vmax - self.vmin;
        if span.is_nan() || span <= 0.0 || !value.is_finite() {
            return 0;
        }
        let t = ((value - self.vmin) / span).clamp(0.0, 1.0);
        ((t * n as f64) as usize).min(n - 1)
    }

    /// 值对应的 RGBA 颜色
    pub fn rgba(&self, value: f64) -> Rgba<u8> {
        self.table.rgba(self.index(value), self.ramp)
    }

    /// 将栅格着色为 RGBA 图像
    pub fn colorize(&self, raster: &RasterData) -> RasterResult<RgbaImage> {
        let expected = raster.width * raster.height;
        if raster.data.len() != expected {
            return Err(RasterError::SizeMismatch {
                expected,
                actual: raster.data.len(),
            });
        }
        let width = u32::try_from(raster.width).map_err(|e| RasterError::Encode(e.to_string()))?;
        let height =
            u32::try_from(raster.height).map_err(|e| RasterError::Encode(e.to_string()))?;

        Ok(RgbaImage::from_fn(width, height, |x, y| {
            let v = raster.data[y as usize * raster.width + x as usize];
            self.rgba(v)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viridis_endpoints() {
        let table = ColorTable::default();
        assert_eq!(table.len(), 256);
        assert_eq!(table.color(0), [68, 1, 84]);
        assert_eq!(table.color(255), [253, 231, 37]);
        assert_eq!(table.color(9999), [253, 231, 37]);
    }

    #[test]
    fn test_viridis_matches_reference_entries() {
        let table = ColorTable::default();
        assert_eq!(table.color(1), [68, 2, 86]);
        assert_eq!(table.color(64), [59, 82, 139]);
        assert_eq!(table.color(128), [33, 145, 140]);
        assert_eq!(table.color(192), [94, 201, 98]);
    }

    #[test]
    fn test_absolute_alpha() {
        let ramp = AlphaRamp::Absolute;
        assert_eq!(ramp.alpha(0, 256), 0.0);
        assert!((ramp.alpha(51, 256) - 0.4).abs() < 1e-12);
        assert_eq!(ramp.alpha(128, 256), 1.0);
        assert_eq!(ramp.alpha(255, 256), 1.0);
    }

    #[test]
    fn test_symmetric_alpha() {
        let ramp = AlphaRamp::Symmetric;
        assert_eq!(ramp.alpha(0, 256), 1.0);
        assert_eq!(ramp.alpha(255, 256), 1.0);
        assert!(ramp.alpha(127, 256) < 0.01);
        assert!((ramp.alpha(51, 256) - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_symmetric_scale() {
        let scale = ColorScale::fit(ColorTable::default(), AlphaRamp::Symmetric, -2.0, 5.0);
        assert_eq!((scale.vmin, scale.vmax), (-5.0, 5.0));
        assert_eq!(scale.index(-5.0), 0);
        assert_eq!(scale.index(5.0), 255);
        assert_eq!(scale.index(0.0), 128);
    }

    #[test]
    fn test_degenerate_scale_maps_to_first() {
        let scale = ColorScale::fit(ColorTable::default(), AlphaRamp::Absolute, 3.0, 3.0);
        assert_eq!(scale.index(3.0), 0);
        assert_eq!(scale.rgba(3.0), Rgba([68, 1, 84, 0]));
    }

    #[test]
    fn test_colorize() {
        let raster = RasterData::from_data(vec![0.0, 1.0, 2.0, 3.0], 2, 2, 0.0).unwrap();
        let scale = ColorScale::fit(ColorTable::default(), AlphaRamp::Absolute, 0.0, 3.0);
        let img = scale.colorize(&raster).unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(0, 0)[3], 0);
        assert_eq!(*img.get_pixel(1, 1), Rgba([253, 231, 37, 255]));
    }

    #[test]
    fn test_over_white() {
        let table = ColorTable::default();
        assert_eq!(table.over_white(0, AlphaRamp::Absolute), Rgba([255, 255, 255, 255]));
        assert_eq!(table.over_white(255, AlphaRamp::Absolute), Rgba([253, 231, 37, 255]));
    }
}
