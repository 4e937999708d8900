// crates/ct_raster/src/grid.rs

//! 栅格尺寸与栅格数据
//!
//! 较长的地理轴映射到固定的最大像素数，较短轴按两轴跨度之比缩放并向下取整（至少 1），
//! 使输出图像的宽高比与地理范围一致。
//!
//! 栅格按行主序存储，第 0 行为最高纬度，第 0 列为最小经度。

use ct_geo::GeoBounds;

use crate::error::{RasterError, RasterResult};

/// 插值网格规格
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    /// 样本地理范围
    pub bounds: GeoBounds,
    /// 经度方向像素数（图像宽）
    pub n_lng: usize,
    /// 纬度方向像素数（图像高）
    pub n_lat: usize,
    /// 经度步长
    pub lng_step: f64,
    /// 纬度步长
    pub lat_step: f64,
}

impl GridSpec {
    /// 按地理范围确定网格尺寸
    pub fn fit(bounds: &GeoBounds, max_dimension: usize) -> RasterResult<Self> {
        let lat_delta = bounds.lat_span();
        let lng_delta = bounds.lon_span();
        let valid = |d: f64| d.is_finite() && d > 0.0;
        if !(valid(lat_delta) && valid(lng_delta)) || max_dimension == 0 {
            return Err(RasterError::DegenerateExtent {
                lng_delta,
                lat_delta,
            });
        }

        let scaled = |ratio: f64| ((max_dimension as f64 * ratio).floor() as usize).max(1);
        let (n_lng, n_lat) = if lat_delta < lng_delta {
            (max_dimension, scaled(lat_delta / lng_delta))
        } else {
            (scaled(lng_delta / lat_delta), max_dimension)
        };

        Ok(Self {
            bounds: *bounds,
            n_lng,
            n_lat,
            lng_step: lng_delta / n_lng as f64,
            lat_step: lat_delta / n_lat as f64,
        })
    }

    /// 图像宽度
    pub fn width(&self) -> usize {
        self.n_lng
    }

    /// 图像高度
    pub fn height(&self) -> usize {
        self.n_lat
    }

    /// 第 `i` 个经度格点
    #[inline]
    pub fn lng_at(&self, i: usize) -> f64 {
        self.bounds.min_lon + i as f64 * self.lng_step
    }

    /// 第 `j` 个纬度格点
    #[inline]
    pub fn lat_at(&self, j: usize) -> f64 {
        self.bounds.min_lat + j as f64 * self.lat_step
    }

    /// 图像第 `row` 行对应的纬度（第 0 行最北）
    #[inline]
    pub fn row_lat(&self, row: usize) -> f64 {
        self.lat_at(self.n_lat - 1 - row)
    }
}

/// 栅格数据
#[derive(Debug, Clone)]
pub struct RasterData {
    /// 数据
    pub data: Vec<f64>,
    /// 宽度
    pub width: usize,
    /// 高度
    pub height: usize,
    /// 凸包外的填充值
    pub fill_value: f64,
}

impl RasterData {
    /// 创建填充值栅格
    pub fn new(width: usize, height: usize, fill_value: f64) -> Self {
        Self {
            data: vec![fill_value; width * height],
            width,
            height,
            fill_value,
        }
    }

    /// 从数据创建
    pub fn from_data(
        data: Vec<f64>,
        width: usize,
        height: usize,
        fill_value: f64,
    ) -> RasterResult<Self> {
        if data.len() != width * height {
            return Err(RasterError::SizeMismatch {
                expected: width * height,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            fill_value,
        })
    }

    /// 获取像素值
    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<f64> {
        if col < self.width && row < self.height {
            Some(self.data[row * self.width + col])
        } else {
            None
        }
    }

    /// 设置像素值
    #[inline]
    pub fn set(&mut self, col: usize, row: usize, value: f64) {
        if col < self.width && row < self.height {
            self.data[row * self.width + col] = value;
        }
    }

    /// 有限值的最小 / 最大值
    pub fn min_max(&self) -> Option<(f64, f64)> {
        self.data
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_preserving_size() {
        let wide = GeoBounds::new(-85.0, 33.0, -84.0, 33.5);
        let spec = GridSpec::fit(&wide, 1600).unwrap();
        assert_eq!(spec.n_lng, 1600);
        assert_eq!(spec.n_lat, 800);

        let tall = GeoBounds::new(-85.0, 33.0, -84.75, 34.0);
        let spec = GridSpec::fit(&tall, 1600).unwrap();
        assert_eq!(spec.n_lat, 1600);
        assert_eq!(spec.n_lng, 400);
    }

    #[test]
    fn test_short_axis_at_least_one() {
        let sliver = GeoBounds::new(-85.0, 33.0, -84.0, 33.000_001);
        let spec = GridSpec::fit(&sliver, 1600).unwrap();
        assert_eq!(spec.n_lat, 1);
    }

    #[test]
    fn test_degenerate_extent() {
        let line = GeoBounds::new(-85.0, 33.0, -84.0, 33.0);
        assert!(matches!(
            GridSpec::fit(&line, 1600),
            Err(RasterError::DegenerateExtent { .. })
        ));
    }

    #[test]
    fn test_cell_coordinates() {
        let b = GeoBounds::new(-85.0, 33.0, -84.0, 33.5);
        let spec = GridSpec::fit(&b, 10).unwrap();
        assert_eq!(spec.lng_at(0), -85.0);
        assert!((spec.lng_step - 0.1).abs() < 1e-12);
        assert!((spec.row_lat(0) - (33.0 + 4.0 * 0.1)).abs() < 1e-12);
        assert_eq!(spec.row_lat(spec.n_lat - 1), 33.0);
    }

    #[test]
    fn test_raster_data() {
        let mut r = RasterData::new(3, 2, 0.0);
        r.set(2, 1, 5.0);
        r.set(9, 9, 1.0);
        assert_eq!(r.get(2, 1), Some(5.0));
        assert_eq!(r.get(3, 0), None);
        assert_eq!(r.min_max(), Some((0.0, 5.0)));
        assert!(RasterData::from_data(vec![0.0; 5], 3, 2, 0.0).is_err());
    }
}
