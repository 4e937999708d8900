// crates/ct_raster/src/legend.rs

//! 图例刻度与绘制
//!
//! 图例是一条竖直色条，右侧为刻度标签，最右侧为竖排标题。色条的透明度与栅格一致，
//! 与白色背景合成后绘制。文字由 `plotters` 以内置的 DejaVu Sans 字体渲染。
//!
//! | 运行方式 | 刻度 |
//! |---------|------|
//! | 单场景 | 对数刻度，`[10^min, 10^max]` 的整数次幂 |
//! | 带符号对数差值 | 关于 0 对称，标签 `-10^k`、`0`、`10^k` |
//! | 百分比差值 | 关于 0 对称的线性刻度 |
//! | 直接差值 | 线性刻度 |

use std::sync::OnceLock;

use ct_config::{ClampBounds, ComparisonMode};
use image::{DynamicImage, RgbImage, RgbaImage};
use plotters::prelude::{
    BitMapBackend, Color, IntoDrawingArea, IntoFont, PathElement, RGBColor, Rectangle, Text,
    TextStyle, BLACK, WHITE,
};
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::{register_font, FontStyle, FontTransform};

use crate::colormap::{AlphaRamp, ColorTable};
use crate::error::{RasterError, RasterResult};

const FONT_BYTES: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
const FONT_FAMILY: &str = "sans-serif";
const FONT_SIZE: f64 = 14.0;

const MARGIN: u32 = 12;
const BAR_WIDTH: u32 = 24;
const BAR_HEIGHT: u32 = 320;
const TICK_LENGTH: u32 = 6;
const LABEL_GAP: u32 = 4;
const TITLE_GAP: u32 = 10;

/// 线性刻度的目标刻度数
const TARGET_TICKS: f64 = 5.0;

// ============================================================
// 刻度
// ============================================================

/// 一个刻度
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    /// 沿色条的相对位置，0 为底端，1 为顶端
    pub position: f64,
    /// 标签
    pub label: String,
}

impl Tick {
    fn new(position: f64, label: impl Into<String>) -> Self {
        Self {
            position,
            label: label.into(),
        }
    }
}

/// 图例刻度方式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LegendScale {
    /// 对数刻度，色条覆盖 `[10^min_exp, 10^max_exp]`
    Logarithmic {
        /// 下端指数
        min_exp: f64,
        /// 上端指数
        max_exp: f64,
    },
    /// 带符号的幂次刻度，色条覆盖 `[-half, half]`（以指数计）
    SymmetricPowers {
        /// 半宽
        half: f64,
    },
    /// 线性刻度
    Linear {
        /// 下端
        min: f64,
        /// 上端
        max: f64,
    },
}

impl LegendScale {
    /// 单场景图例，样本值为 log10 浓度
    ///
    /// 截断边界同样以 log10 计，设置时优先于数据范围。
    pub fn single(data_min: f64, data_max: f64, clamp: &ClampBounds) -> Self {
        Self::Logarithmic {
            min_exp: clamp.min.unwrap_or(data_min),
            max_exp: clamp.max.unwrap_or(data_max),
        }
    }

    /// 比较运行图例
    pub fn comparison(
        mode: ComparisonMode,
        data_min: f64,
        data_max: f64,
        clamp: &ClampBounds,
    ) -> Self {
        match mode {
            ComparisonMode::Relative => {
                let min = clamp.min.unwrap_or(data_min);
                let max = clamp.max.unwrap_or(data_max);
                Self::SymmetricPowers {
                    half: min.abs().max(max.abs()),
                }
            }
            ComparisonMode::RelativePercent => {
                let min = clamp.min.map_or(data_min, |c| data_min.max(c));
                let max = clamp.max.map_or(data_max, |c| data_max.min(c));
                let half = min.abs().max(max.abs());
                Self::Linear {
                    min: -half,
                    max: half,
                }
            }
            ComparisonMode::Absolute => Self::Linear {
                min: clamp.min.unwrap_or(data_min),
                max: clamp.max.unwrap_or(data_max),
            },
        }
    }

    /// 色条两端（以刻度自身的单位计）
    pub fn range(&self) -> (f64, f64) {
        match *self {
            Self::Logarithmic { min_exp, max_exp } => (min_exp, max_exp),
            Self::SymmetricPowers { half } => (-half, half),
            Self::Linear { min, max } => (min, max),
        }
    }

    /// 刻度列表，自下而上
    pub fn ticks(&self) -> Vec<Tick> {
        let (lo, hi) = self.range();
        if !(lo.is_finite() && hi.is_finite()) {
            return Vec::new();
        }
        if hi <= lo {
            let label = match self {
                Self::Logarithmic { .. } => power_label(lo.round() as i32, false),
                Self::SymmetricPowers { .. } => "0".to_string(),
                Self::Linear { .. } => format_linear(lo, 1.0),
            };
            return vec![Tick::new(0.5, label)];
        }

        let position = |v: f64| (v - lo) / (hi - lo);
        match self {
            Self::Logarithmic { .. } => integer_range(lo, hi)
                .map(|k| Tick::new(position(f64::from(k)), power_label(k, false)))
                .collect(),
            Self::SymmetricPowers { .. } => integer_range(lo, hi)
                .map(|k| Tick::new(position(f64::from(k)), power_label(k, true)))
                .collect(),
            Self::Linear { .. } => {
                let step = nice_step(hi - lo);
                let first = (lo / step).ceil() as i64;
                let last = (hi / step + 1e-9).floor() as i64;
                (first..=last)
                    .map(|i| {
                        let v = i as f64 * step;
                        Tick::new(position(v).clamp(0.0, 1.0), format_linear(v, step))
                    })
                    .collect()
            }
        }
    }
}

fn integer_range(lo: f64, hi: f64) -> impl Iterator<Item = i32> {
    let first = (lo - 1e-9).ceil() as i32;
    let last = (hi + 1e-9).floor() as i32;
    first..=last
}

/// 幂次标签
///
/// `signed` 时指数的符号表示数值符号：`-2` 记为 `-10^2`，`0` 记为 `0`。
fn power_label(k: i32, signed: bool) -> String {
    if !signed {
        return format!("10^{k}");
    }
    match k {
        0 => "0".to_string(),
        k if k > 0 => format!("10^{k}"),
        k => format!("-10^{}", k.unsigned_abs()),
    }
}

/// 约 5 个刻度的整齐步长（1、2、5 乘以 10 的幂）
fn nice_step(span: f64) -> f64 {
    let raw = span / TARGET_TICKS;
    let magnitude = 10f64.powi(raw.log10().floor() as i32);
    let norm = raw / magnitude;
    let nice = if norm < 1.5 {
        1.0
    } else if norm < 3.0 {
        2.0
    } else if norm < 7.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_linear(v: f64, step: f64) -> String {
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    let s = format!("{v:.decimals$}");
    if s.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        s.trim_start_matches('-').to_string()
    } else {
        s
    }
}

// ============================================================
// 图例
// ============================================================

/// 图例
#[derive(Debug, Clone)]
pub struct Legend {
    /// 标题
    pub title: String,
    /// 刻度方式
    pub scale: LegendScale,
    /// 透明度渐变，与栅格一致
    pub ramp: AlphaRamp,
}

impl Legend {
    /// 创建图例
    pub fn new(title: impl Into<String>, scale: LegendScale, ramp: AlphaRamp) -> Self {
        Self {
            title: title.into(),
            scale,
            ramp,
        }
    }

    /// 刻度
    pub fn ticks(&self) -> Vec<Tick> {
        self.scale.ticks()
    }

    /// 绘制图例图像
    pub fn render(&self, table: &ColorTable) -> RasterResult<RgbaImage> {
        ensure_font()?;
        let ticks = self.ticks();
        let mut label_w = 0;
        for tick in &ticks {
            label_w = label_w.max(text_size(&tick.label)?.0);
        }
        // 竖排后标题的宽对应图像高度
        let (title_len, title_h) = text_size(&self.title)?;

        let width = MARGIN
            + BAR_WIDTH
            + TICK_LENGTH
            + LABEL_GAP
            + label_w
            + TITLE_GAP
            + title_h
            + MARGIN;
        let height = (BAR_HEIGHT + 2 * MARGIN).max(title_len + 2 * MARGIN);
        let bar_top = (height - BAR_HEIGHT) / 2;

        let mut buffer = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_error)?;

            let x0 = MARGIN as i32;
            let x1 = (MARGIN + BAR_WIDTH - 1) as i32;
            let top = bar_top as i32;
            let n = table.len();
            for r in 0..BAR_HEIGHT {
                let t = 1.0 - f64::from(r) / f64::from(BAR_HEIGHT - 1);
                let index = (t * (n - 1) as f64).round() as usize;
                let c = table.over_white(index, self.ramp);
                let y = top + r as i32;
                root.draw(&Rectangle::new(
                    [(x0, y), (x1, y)],
                    RGBColor(c[0], c[1], c[2]).filled(),
                ))
                .map_err(draw_error)?;
            }
            root.draw(&Rectangle::new(
                [(x0, top), (x1, top + BAR_HEIGHT as i32 - 1)],
                &BLACK,
            ))
            .map_err(draw_error)?;

            let tick_x = (MARGIN + BAR_WIDTH) as i32;
            let label_x = tick_x + (TICK_LENGTH + LABEL_GAP) as i32;
            let label_style = text_style().pos(Pos::new(HPos::Left, VPos::Center));
            for tick in &ticks {
                let offset = ((1.0 - tick.position) * f64::from(BAR_HEIGHT - 1)).round() as i32;
                let y = top + offset.clamp(0, BAR_HEIGHT as i32 - 1);
                root.draw(&PathElement::new(
                    vec![(tick_x, y), (tick_x + TICK_LENGTH as i32, y)],
                    &BLACK,
                ))
                .map_err(draw_error)?;
                root.draw(&Text::new(
                    tick.label.as_str(),
                    (label_x, y),
                    label_style.clone(),
                ))
                .map_err(draw_error)?;
            }

            if title_len > 0 {
                // 自下而上阅读
                let title_style = text_style()
                    .transform(FontTransform::Rotate270)
                    .pos(Pos::new(HPos::Center, VPos::Center));
                let cx = (width - MARGIN - title_h / 2) as i32;
                let cy = (height / 2) as i32;
                root.draw(&Text::new(self.title.as_str(), (cx, cy), title_style))
                    .map_err(draw_error)?;
            }

            root.present().map_err(draw_error)?;
        }

        let rgb = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RasterError::Legend("图例缓冲区尺寸不符".to_string()))?;
        Ok(DynamicImage::ImageRgb8(rgb).to_rgba8())
    }
}

// ============================================================
// 文字
// ============================================================

static FONT_REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// 注册图例字体，进程内只执行一次
fn ensure_font() -> RasterResult<()> {
    FONT_REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, FONT_BYTES)
                .map_err(|_| "字体注册失败: InvalidFont".to_string())
        })
        .clone()
        .map_err(RasterError::Legend)
}

fn text_style() -> TextStyle<'static> {
    (FONT_FAMILY, FONT_SIZE).into_font().color(&BLACK)
}

/// 文字包围盒（宽, 高）
fn text_size(text: &str) -> RasterResult<(u32, u32)> {
    if text.is_empty() {
        return Ok((0, 0));
    }
    (FONT_FAMILY, FONT_SIZE)
        .into_font()
        .box_size(text)
        .map_err(|e| RasterError::Legend(format!("文字测量失败: {e:?}")))
}

fn draw_error<E: std::fmt::Debug>(e: E) -> RasterError {
    RasterError::Legend(format!("图例绘制失败: {e:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn labels(scale: &LegendScale) -> Vec<String> {
        scale.ticks().into_iter().map(|t| t.label).collect()
    }

    #[test]
    fn test_log_scale_from_data() {
        let scale = LegendScale::single(-2.5, 1.2, &ClampBounds::default());
        assert_eq!(labels(&scale), ["10^-2", "10^-1", "10^0", "10^1"]);
        let ticks = scale.ticks();
        assert_relative_eq!(ticks[0].position, 0.5 / 3.7, epsilon = 1e-12);
    }

    #[test]
    fn test_log_scale_clamp_overrides_data() {
        let clamp = ClampBounds::new(Some(-1.0), Some(1.0));
        let scale = LegendScale::single(-6.0, 3.0, &clamp);
        assert_eq!(
            scale,
            LegendScale::Logarithmic {
                min_exp: -1.0,
                max_exp: 1.0
            }
        );
        let ticks = scale.ticks();
        assert_eq!(ticks.first().map(|t| t.position), Some(0.0));
        assert_eq!(ticks.last().map(|t| t.position), Some(1.0));
    }

    #[test]
    fn test_relative_is_symmetric_powers() {
        let scale =
            LegendScale::comparison(ComparisonMode::Relative, -1.5, 2.3, &ClampBounds::default());
        assert_eq!(scale, LegendScale::SymmetricPowers { half: 2.3 });
        assert_eq!(
            labels(&scale),
            ["-10^2", "-10^1", "0", "10^1", "10^2"]
        );
        let zero = &scale.ticks()[2];
        assert_relative_eq!(zero.position, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_percent_clipped_to_bounds() {
        let clamp = ClampBounds::new(Some(-20.0), Some(50.0));
        let scale = LegendScale::comparison(ComparisonMode::RelativePercent, -35.0, 80.0, &clamp);
        assert_eq!(
            scale,
            LegendScale::Linear {
                min: -50.0,
                max: 50.0
            }
        );
        assert_eq!(labels(&scale), ["-40", "-20", "0", "20", "40"]);
    }

    #[test]
    fn test_absolute_linear() {
        let scale =
            LegendScale::comparison(ComparisonMode::Absolute, 0.0, 0.5, &ClampBounds::default());
        assert_eq!(labels(&scale), ["0.0", "0.1", "0.2", "0.3", "0.4", "0.5"]);
    }

    #[test]
    fn test_degenerate_range_single_tick() {
        let scale = LegendScale::single(2.0, 2.0, &ClampBounds::default());
        let ticks = scale.ticks();
        assert_eq!(ticks.len(), 1);
        assert_eq!(ticks[0].position, 0.5);
        assert_eq!(ticks[0].label, "10^2");
    }

    #[test]
    fn test_nice_step() {
        assert_relative_eq!(nice_step(100.0), 20.0);
        assert_relative_eq!(nice_step(0.5), 0.1);
        assert_relative_eq!(nice_step(7.0), 1.0);
    }

    #[test]
    fn test_render_dimensions() {
        let legend = Legend::new(
            "NOX concentration difference (ppb)",
            LegendScale::SymmetricPowers { half: 2.0 },
            AlphaRamp::Symmetric,
        );
        let img = legend.render(&ColorTable::default()).unwrap();
        let (title_len, _) = text_size(&legend.title).unwrap();
        assert_eq!(
            img.height(),
            (BAR_HEIGHT + 2 * MARGIN).max(title_len + 2 * MARGIN)
        );
        assert!(img.width() > MARGIN + BAR_WIDTH + TICK_LENGTH);
        // 色条中点透明度接近 0，合成后接近白色
        let mid = img.get_pixel(MARGIN + BAR_WIDTH / 2, img.height() / 2);
        assert!(mid[0] > 240 && mid[1] > 240 && mid[2] > 240);
        assert_eq!(mid[3], 255);
        // 色条顶端为不透明的色表末端
        let top = img.get_pixel(MARGIN + BAR_WIDTH / 2, (img.height() - BAR_HEIGHT) / 2 + 2);
        assert!(top[0] > 200 && top[2] < 100);
    }

    #[test]
    fn test_labels_are_drawn() {
        let legend = Legend::new(
            "PM2.5 annual average (ug/m3)",
            LegendScale::Logarithmic {
                min_exp: -2.0,
                max_exp: 1.0,
            },
            AlphaRamp::Absolute,
        );
        let img = legend.render(&ColorTable::default()).unwrap();
        let label_x0 = MARGIN + BAR_WIDTH + TICK_LENGTH + LABEL_GAP;
        let dark = img
            .enumerate_pixels()
            .filter(|(x, _, p)| *x >= label_x0 && p[0] < 100 && p[1] < 100 && p[2] < 100)
            .count();
        assert!(dark > 50, "刻度与标题文字应被绘制, 深色像素 {dark}");
    }

    #[test]
    fn test_text_keeps_lowercase() {
        ensure_font().unwrap();
        let (lower, _) = text_size("ug/m3").unwrap();
        let (upper, _) = text_size("UG/M3").unwrap();
        assert!(lower < upper);

        let title = "Benz cancer risk difference (incidence per million)";
        let legend = Legend::new(title, LegendScale::Linear { min: 0.0, max: 1.0 }, AlphaRamp::Absolute);
        let img = legend.render(&ColorTable::default()).unwrap();
        let (title_len, _) = text_size(title).unwrap();
        let (upper_len, _) = text_size(&title.to_uppercase()).unwrap();
        assert!(title_len < upper_len);
        assert_eq!(img.height(), (BAR_HEIGHT + 2 * MARGIN).max(title_len + 2 * MARGIN));
    }
}
