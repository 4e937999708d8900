// crates/ct_raster/src/lib.rs

//! CTools 栅格合成
//!
//! 将合并后的散点浓度场转换为地理一致的插值栅格、带透明度的彩色图像与匹配的图例。
//!
//! # 模块
//!
//! - `grid`: 自适应栅格尺寸与栅格数据
//! - `interpolate`: 平面坐标下的 Delaunay 线性插值
//! - `colormap`: 色表与透明度渐变
//! - `legend`: 图例刻度与绘制
//! - `synth`: 栅格合成器
//!
//! # 示例
//!
//! ```
//! use ct_geo::GeoBounds;
//! use ct_raster::GridSpec;
//!
//! let bounds = GeoBounds::new(-85.0, 33.0, -84.0, 33.5);
//! let spec = GridSpec::fit(&bounds, 1600).unwrap();
//! assert_eq!((spec.n_lng, spec.n_lat), (1600, 800));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod colormap;
pub mod error;
pub mod grid;
pub mod interpolate;
pub mod legend;
pub mod synth;

pub use colormap::{AlphaRamp, ColorScale, ColorTable};
pub use error::{RasterError, RasterResult};
pub use grid::{GridSpec, RasterData};
pub use interpolate::{LinearInterpolator, ScatterSample};
pub use legend::{Legend, LegendScale, Tick};
pub use synth::{RasterArtifacts, RasterSynthesizer, RenderMode, RenderedRaster};

/// 栅格图像文件名
pub const IMAGE_FILE_NAME: &str = "concentrations.png";

/// 图例图像文件名
pub const LEGEND_FILE_NAME: &str = "concentrations_legend.png";

/// 预导入模块
pub mod prelude {
    pub use crate::colormap::{AlphaRamp, ColorScale, ColorTable};
    pub use crate::grid::{GridSpec, RasterData};
    pub use crate::interpolate::ScatterSample;
    pub use crate::legend::{Legend, LegendScale};
    pub use crate::synth::{RasterSynthesizer, RenderMode};
}
