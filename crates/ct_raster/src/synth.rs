// crates/ct_raster/src/synth.rs

//! 栅格合成器
//!
//! 合成流程：
//!
//! 1. 样本值截断到 [`ClampBounds`]
//! 2. 样本坐标逆投影得到地理范围，确定网格尺寸
//! 3. 网格点正向投影后做线性插值，凸包外填 0
//! 4. 按运行方式着色并生成图例
//! 5. 写出 PNG

use std::path::{Path, PathBuf};

use ct_config::{legend_title, ClampBounds, ComparisonMode, RunConfig, RunParameters};
use ct_foundation::error::{CtError, CtResult};
use ct_geo::{CoordinateProjector, GeoBounds, Point2D};
use image::{ImageFormat, RgbaImage};
use tracing::{debug, info};

use crate::colormap::{AlphaRamp, ColorScale, ColorTable};
use crate::error::RasterError;
use crate::grid::{GridSpec, RasterData};
use crate::interpolate::{LinearInterpolator, ScatterSample};
use crate::legend::{Legend, LegendScale};
use crate::{IMAGE_FILE_NAME, LEGEND_FILE_NAME};

/// 凸包外的填充值
const FILL_VALUE: f64 = 0.0;

/// 渲染方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// 单场景，样本值为 log10 浓度
    Single,
    /// 两场景比较
    Comparison(ComparisonMode),
}

impl RenderMode {
    /// 透明度渐变
    pub fn ramp(&self) -> AlphaRamp {
        match self {
            Self::Comparison(mode) if mode.is_symmetric() => AlphaRamp::Symmetric,
            _ => AlphaRamp::Absolute,
        }
    }

    /// 比较模式
    pub fn comparison(&self) -> Option<ComparisonMode> {
        match self {
            Self::Single => None,
            Self::Comparison(mode) => Some(*mode),
        }
    }

    fn legend_scale(&self, data_min: f64, data_max: f64, clamp: &ClampBounds) -> LegendScale {
        match self {
            Self::Single => LegendScale::single(data_min, data_max, clamp),
            Self::Comparison(mode) => LegendScale::comparison(*mode, data_min, data_max, clamp),
        }
    }
}

/// 渲染结果（尚未写盘）
#[derive(Debug, Clone)]
pub struct RenderedRaster {
    /// 网格规格
    pub grid: GridSpec,
    /// 插值栅格
    pub raster: RasterData,
    /// 着色值域
    pub scale: ColorScale,
    /// 浓度图像
    pub image: RgbaImage,
    /// 图例
    pub legend: Legend,
    /// 图例图像
    pub legend_image: RgbaImage,
}

/// 写出的栅格文件
#[derive(Debug, Clone, PartialEq)]
pub struct RasterArtifacts {
    /// 浓度图像路径
    pub image_path: PathBuf,
    /// 图例图像路径
    pub legend_path: PathBuf,
    /// 图像覆盖的地理范围
    pub bounds: GeoBounds,
}

/// 栅格合成器
#[derive(Debug, Clone)]
pub struct RasterSynthesizer {
    projector: CoordinateProjector,
    max_dimension: usize,
    table: ColorTable,
}

impl Default for RasterSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterSynthesizer {
    /// 默认长轴像素数
    pub const DEFAULT_MAX_DIMENSION: usize = 1600;

    /// 创建合成器
    pub fn new() -> Self {
        Self {
            projector: CoordinateProjector::new(),
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            table: ColorTable::default(),
        }
    }

    /// 从运行配置创建
    pub fn from_config(config: &RunConfig) -> Self {
        Self::new().with_max_dimension(config.max_raster_dimension as usize)
    }

    /// 设置投影
    #[must_use]
    pub fn with_projector(mut self, projector: CoordinateProjector) -> Self {
        self.projector = projector;
        self
    }

    /// 设置长轴像素数
    #[must_use]
    pub fn with_max_dimension(mut self, max_dimension: usize) -> Self {
        self.max_dimension = max_dimension;
        self
    }

    /// 长轴像素数
    pub fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    /// 样本的地理范围
    pub fn extent(&self, samples: &[ScatterSample]) -> CtResult<GeoBounds> {
        let mut points = Vec::with_capacity(samples.len());
        for s in samples {
            points.push(self.projector.inverse_point(Point2D::new(s.x, s.y))?);
        }
        GeoBounds::from_points(points).ok_or_else(|| RasterError::EmptySamples.into())
    }

    /// 截断并插值到网格
    pub fn rasterize(
        &self,
        samples: &[ScatterSample],
        clamp: &ClampBounds,
    ) -> CtResult<(GridSpec, RasterData)> {
        let clamped = clamp_samples(samples, clamp);
        self.rasterize_clamped(&clamped)
    }

    fn rasterize_clamped(&self, samples: &[ScatterSample]) -> CtResult<(GridSpec, RasterData)> {
        let bounds = self.extent(samples)?;
        let grid = GridSpec::fit(&bounds, self.max_dimension)?;
        debug!(
            "栅格网格: {}x{}, 经度 [{:.5}, {:.5}], 纬度 [{:.5}, {:.5}]",
            grid.n_lng, grid.n_lat, bounds.min_lon, bounds.max_lon, bounds.min_lat, bounds.max_lat
        );

        let interpolator = LinearInterpolator::new(samples, FILL_VALUE)?;
        let raster = interpolator.interpolate_grid(&grid, &self.projector)?;
        Ok((grid, raster))
    }

    /// 渲染浓度图像与图例
    pub fn render(
        &self,
        samples: &[ScatterSample],
        mode: RenderMode,
        params: &RunParameters,
    ) -> CtResult<RenderedRaster> {
        let clamped = clamp_samples(samples, &params.clamp);
        let (data_min, data_max) = value_range(&clamped).ok_or(RasterError::EmptySamples)?;
        let (grid, raster) = self.rasterize_clamped(&clamped)?;

        let ramp = mode.ramp();
        let (grid_min, grid_max) = raster.min_max().unwrap_or((FILL_VALUE, FILL_VALUE));
        let scale = ColorScale::fit(self.table.clone(), ramp, grid_min, grid_max);
        let image = scale.colorize(&raster)?;

        let title = legend_title(params.pollutant, params.model_variant, mode.comparison());
        let legend = Legend::new(title, mode.legend_scale(data_min, data_max, &params.clamp), ramp);
        let legend_image = legend.render(&self.table)?;

        Ok(RenderedRaster {
            grid,
            raster,
            scale,
            image,
            legend,
            legend_image,
        })
    }

    /// 将渲染结果写到目录
    pub fn write(&self, rendered: &RenderedRaster, dir: &Path) -> CtResult<RasterArtifacts> {
        let image_path = dir.join(IMAGE_FILE_NAME);
        let legend_path = dir.join(LEGEND_FILE_NAME);
        save_png(&rendered.image, &image_path)?;
        save_png(&rendered.legend_image, &legend_path)?;
        debug!("写出图像: {}", image_path.display());

        Ok(RasterArtifacts {
            image_path,
            legend_path,
            bounds: rendered.grid.bounds,
        })
    }

    /// 渲染并写出
    pub fn synthesize(
        &self,
        samples: &[ScatterSample],
        mode: RenderMode,
        params: &RunParameters,
        dir: &Path,
    ) -> CtResult<RasterArtifacts> {
        let rendered = self.render(samples, mode, params)?;
        let artifacts = self.write(&rendered, dir)?;
        info!(
            "栅格合成完成: {}x{} 像素, {} 个样本 -> {}",
            rendered.grid.width(),
            rendered.grid.height(),
            samples.len(),
            dir.display()
        );
        Ok(artifacts)
    }
}

fn clamp_samples(samples: &[ScatterSample], clamp: &ClampBounds) -> Vec<ScatterSample> {
    samples
        .iter()
        .map(|s| s.with_value(clamp.clamp(s.value)))
        .collect()
}

fn value_range(samples: &[ScatterSample]) -> Option<(f64, f64)> {
    samples
        .iter()
        .map(|s| s.value)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

fn save_png(image: &RgbaImage, path: &Path) -> CtResult<()> {
    image
        .save_with_format(path, ImageFormat::Png)
        .map_err(|e| CtError::from(RasterError::Encode(format!("{}: {e}", path.display()))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ct_config::{ModelVariant, Pollutant};

    fn samples_around(projector: &CoordinateProjector) -> Vec<ScatterSample> {
        let mut samples = Vec::new();
        for i in 0..6 {
            for j in 0..4 {
                let lon = -84.5 + f64::from(i) * 0.04;
                let lat = 33.7 + f64::from(j) * 0.03;
                let (x, y) = projector.forward(lon, lat).unwrap();
                samples.push(ScatterSample::new(x, y, f64::from(i + j) - 3.0));
            }
        }
        samples
    }

    #[test]
    fn test_render_mode_ramp() {
        assert_eq!(RenderMode::Single.ramp(), AlphaRamp::Absolute);
        assert_eq!(
            RenderMode::Comparison(ComparisonMode::Absolute).ramp(),
            AlphaRamp::Absolute
        );
        assert_eq!(
            RenderMode::Comparison(ComparisonMode::Relative).ramp(),
            AlphaRamp::Symmetric
        );
        assert_eq!(RenderMode::Single.comparison(), None);
    }

    #[test]
    fn test_extent_matches_samples() {
        let synth = RasterSynthesizer::new();
        let samples = samples_around(&CoordinateProjector::new());
        let b = synth.extent(&samples).unwrap();
        assert!((b.min_lon + 84.5).abs() < 1e-9);
        assert!((b.max_lon + 84.3).abs() < 1e-9);
        assert!((b.min_lat - 33.7).abs() < 1e-9);
        assert!((b.max_lat - 33.79).abs() < 1e-9);
        assert!(synth.extent(&[]).is_err());
    }

    #[test]
    fn test_rasterize_clamps_values() {
        let synth = RasterSynthesizer::new().with_max_dimension(40);
        let samples = samples_around(&CoordinateProjector::new());
        let clamp = ClampBounds::new(Some(-1.0), Some(2.0));
        let (grid, raster) = synth.rasterize(&samples, &clamp).unwrap();
        assert_eq!(grid.n_lng, 40);
        assert_eq!(raster.data.len(), grid.n_lng * grid.n_lat);
        let (lo, hi) = raster.min_max().unwrap();
        assert!(lo >= -1.0 - 1e-9);
        assert!(hi <= 2.0 + 1e-9);
    }

    #[test]
    fn test_single_sample_extent_is_degenerate() {
        let samples = [ScatterSample::new(1000.0, 2000.0, 1.0)];
        let err = RasterSynthesizer::new()
            .rasterize(&samples, &ClampBounds::default())
            .unwrap_err();
        assert!(matches!(err, CtError::Raster(_)));
    }

    #[test]
    fn test_render_and_write() {
        let dir = tempfile::tempdir().unwrap();
        let synth = RasterSynthesizer::new().with_max_dimension(32);
        let samples = samples_around(&CoordinateProjector::new());
        let params = RunParameters::new(Pollutant::Nox, ModelVariant::Hourly);

        let rendered = synth.render(&samples, RenderMode::Single, &params).unwrap();
        assert_eq!(rendered.legend.title, "NOX concentration (ppb)");
        assert_eq!(
            rendered.image.dimensions(),
            (rendered.grid.n_lng as u32, rendered.grid.n_lat as u32)
        );

        let artifacts = synth.write(&rendered, dir.path()).unwrap();
        assert!(artifacts.image_path.ends_with(IMAGE_FILE_NAME));
        let decoded = image::open(&artifacts.image_path).unwrap();
        assert_eq!(decoded.width(), rendered.grid.n_lng as u32);
        assert!(artifacts.legend_path.exists());
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let synth = RasterSynthesizer::new().with_max_dimension(8);
        let samples = samples_around(&CoordinateProjector::new());
        let params = RunParameters::new(Pollutant::Co, ModelVariant::Annual);
        let err = synth
            .synthesize(
                &samples,
                RenderMode::Comparison(ComparisonMode::RelativePercent),
                &params,
                &dir.path().join("missing"),
            )
            .unwrap_err();
        assert!(matches!(err, CtError::Raster(_)));
    }
}
