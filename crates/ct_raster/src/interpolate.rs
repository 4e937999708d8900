// crates/ct_raster/src/interpolate.rs

//! 散点线性插值
//!
//! 在求解器平面坐标下对接收点样本做 Delaunay 三角化，
//! 网格点落在某个三角形内时取重心坐标加权值，落在凸包外时取填充值。
//!
//! 网格点按地理坐标生成，逐点正向投影后再求值。

use ct_foundation::error::CtResult;
use ct_geo::CoordinateProjector;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spade::{DelaunayTriangulation, FloatTriangulation, HasPosition, Point2, Triangulation};
use tracing::debug;

use crate::error::{RasterError, RasterResult};
use crate::grid::{GridSpec, RasterData};

/// 平面坐标下的一个标量样本
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatterSample {
    /// 平面 x [m]
    pub x: f64,
    /// 平面 y [m]
    pub y: f64,
    /// 样本值
    pub value: f64,
}

impl ScatterSample {
    /// 创建样本
    pub fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// 替换样本值
    #[must_use]
    pub fn with_value(self, value: f64) -> Self {
        Self { value, ..self }
    }
}

impl HasPosition for ScatterSample {
    type Scalar = f64;

    fn position(&self) -> Point2<f64> {
        Point2::new(self.x, self.y)
    }
}

/// 基于 Delaunay 三角网的分片线性插值器
pub struct LinearInterpolator {
    triangulation: DelaunayTriangulation<ScatterSample>,
    fill_value: f64,
}

impl LinearInterpolator {
    /// 由样本构建三角网
    ///
    /// 位置重复的样本以后插入者为准。
    pub fn new(samples: &[ScatterSample], fill_value: f64) -> RasterResult<Self> {
        if samples.is_empty() {
            return Err(RasterError::EmptySamples);
        }

        let mut triangulation = DelaunayTriangulation::<ScatterSample>::new();
        for sample in samples {
            triangulation
                .insert(*sample)
                .map_err(|e| RasterError::Triangulation(format!("{e:?}")))?;
        }

        debug!(
            "三角网构建完成: {} 个样本, {} 个顶点",
            samples.len(),
            triangulation.num_vertices()
        );

        Ok(Self {
            triangulation,
            fill_value,
        })
    }

    /// 三角网顶点数
    pub fn vertex_count(&self) -> usize {
        self.triangulation.num_vertices()
    }

    /// 凸包外的填充值
    pub fn fill_value(&self) -> f64 {
        self.fill_value
    }

    /// 单点求值
    pub fn evaluate(&self, x: f64, y: f64) -> f64 {
        self.triangulation
            .barycentric()
            .interpolate(|v| v.data().value, Point2::new(x, y))
            .unwrap_or(self.fill_value)
    }

    /// 在整个网格上求值
    ///
    /// 按图像行并行，第 0 行对应最高纬度。
    pub fn interpolate_grid(
        &self,
        spec: &GridSpec,
        projector: &CoordinateProjector,
    ) -> CtResult<RasterData> {
        let width = spec.width();
        let height = spec.height();
        let mut data = vec![self.fill_value; width * height];

        data.par_chunks_mut(width)
            .enumerate()
            .try_for_each(|(row, chunk)| -> CtResult<()> {
                let lat = spec.row_lat(row);
                let barycentric = self.triangulation.barycentric();
                for (col, cell) in chunk.iter_mut().enumerate() {
                    let (x, y) = projector.forward(spec.lng_at(col), lat)?;
                    if let Some(v) =
                        barycentric.interpolate(|h| h.data().value, Point2::new(x, y))
                    {
                        *cell = v;
                    }
                }
                Ok(())
            })?;

        Ok(RasterData::from_data(data, width, height, self.fill_value)?)
    }
}
