//! 三次贝塞尔曲线 + 弧长查找表
//!
//! 曲线的原始参数 t 并不对应恒定行进速度。构造时在 t 上等距采样、
//! 累计弦长建立归一化弧长表，之后即可按"路径长度百分比"匀速采样，
//! 这是速度剖面能够驱动曲线的前提。

use std::fmt::Debug;
use std::ops::{Add, Mul, Sub};

use glam::{DVec2, DVec3};

use crate::{MotionError, Result};

/// 弧长表的细分段数
pub const SUBDIVISIONS: usize = 1000;

/// 曲线控制点需要的向量运算
pub trait CurvePoint:
    Copy
    + Debug
    + Add<Self, Output = Self>
    + Sub<Self, Output = Self>
    + Mul<f64, Output = Self>
{
    /// 两点间欧氏距离
    fn distance(self, other: Self) -> f64;
}

impl CurvePoint for DVec2 {
    fn distance(self, other: Self) -> f64 {
        DVec2::distance(self, other)
    }
}

impl CurvePoint for DVec3 {
    fn distance(self, other: Self) -> f64 {
        DVec3::distance(self, other)
    }
}

/// 三次贝塞尔曲线
///
/// 构造后不可变；控制点变化时需要新建实例。
#[derive(Debug, Clone)]
pub struct Bezier<V: CurvePoint> {
    v0: V,
    v1: V,
    v2: V,
    v3: V,
    /// 归一化累计弧长表，单调不减，末项为 1.0
    lengths: Vec<f64>,
    /// 总弧长
    length: f64,
}

impl<V: CurvePoint> Bezier<V> {
    pub fn new(v0: V, v1: V, v2: V, v3: V) -> Self {
        let mut bezier = Self {
            v0,
            v1,
            v2,
            v3,
            lengths: Vec::new(),
            length: 0.0,
        };
        bezier.subdivide();
        bezier
    }

    /// 构造时建立弧长表
    fn subdivide(&mut self) {
        let mut lengths = vec![0.0; SUBDIVISIONS + 1];
        let mut total = 0.0;
        let mut prev = self.point_at(0.0);
        for (i, slot) in lengths.iter_mut().enumerate().skip(1) {
            let t = i as f64 / SUBDIVISIONS as f64;
            let point = self.point_at(t);
            total += prev.distance(point);
            *slot = total;
            prev = point;
        }
        if total > 0.0 {
            for slot in &mut lengths {
                *slot /= total;
            }
        } else {
            // 零长度的退化曲线：保持全零、仅末项置 1，不做除法
            lengths[SUBDIVISIONS] = 1.0;
        }
        self.lengths = lengths;
        self.length = total;
    }

    /// 总弧长
    pub fn length(&self) -> f64 {
        self.length
    }

    /// 原始参数化求值：((a·t + b)·t + c)·t + v0
    pub fn point_at(&self, t: f64) -> V {
        let c = (self.v1 - self.v0) * 3.0;
        let b = (self.v2 - self.v1) * 3.0 - c;
        let a = self.v3 - self.v0 - c - b;
        ((a * t + b) * t + c) * t + self.v0
    }

    /// 弧长参数化求值
    ///
    /// `percent` 是路径长度百分比，必须落在 [0, 1] 内。
    /// 在弧长表中扫描到包含 `percent` 的区间，按区间内比例
    /// 反插出 t，再做原始求值。
    pub fn linear_point_at(&self, percent: f64) -> Result<V> {
        if !(0.0..=1.0).contains(&percent) {
            return Err(MotionError::OutOfRange(format!(
                "percent {percent} not in [0, 1]"
            )));
        }
        let i = self
            .lengths
            .iter()
            .position(|&len| len >= percent)
            .unwrap_or(SUBDIVISIONS);
        if i == 0 {
            return Ok(self.point_at(0.0));
        }
        let lo = self.lengths[i - 1];
        let hi = self.lengths[i];
        let span = hi - lo;
        let frac = if span > 0.0 { (percent - lo) / span } else { 1.0 };
        let t = ((i - 1) as f64 + frac) / SUBDIVISIONS as f64;
        Ok(self.point_at(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> Bezier<DVec3> {
        Bezier::new(
            DVec3::new(0.0, 0.0, 0.0),
            DVec3::new(1.0, 2.0, 0.0),
            DVec3::new(3.0, 2.0, -1.0),
            DVec3::new(4.0, 0.0, 1.0),
        )
    }

    #[test]
    fn test_endpoints() {
        let bezier = curve();
        let start = bezier.linear_point_at(0.0).unwrap();
        let end = bezier.linear_point_at(1.0).unwrap();
        assert!(start.distance(DVec3::new(0.0, 0.0, 0.0)) < 1e-9);
        assert!(end.distance(DVec3::new(4.0, 0.0, 1.0)) < 1e-9);
    }

    #[test]
    fn test_lengths_monotonic_and_normalized() {
        let bezier = curve();
        for pair in bezier.lengths.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
        assert!((bezier.lengths[SUBDIVISIONS] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_out_of_range_percent() {
        let bezier = curve();
        assert!(bezier.linear_point_at(-0.01).is_err());
        assert!(bezier.linear_point_at(1.01).is_err());
        assert!(bezier.linear_point_at(f64::NAN).is_err());
    }

    #[test]
    fn test_straight_line_constant_speed() {
        // 控制点与端点重合 → 直线段，弧长采样应与线性位置一致
        let v0 = DVec3::ZERO;
        let v3 = DVec3::new(10.0, 0.0, 0.0);
        let bezier = Bezier::new(v0, v0, v3, v3);
        assert!((bezier.length() - 10.0).abs() < 1e-6);
        let mid = bezier.linear_point_at(0.5).unwrap();
        assert!((mid.x - 5.0).abs() < 1e-3);
        let quarter = bezier.linear_point_at(0.25).unwrap();
        assert!((quarter.x - 2.5).abs() < 1e-3);
    }

    #[test]
    fn test_degenerate_curve() {
        let p = DVec3::new(1.0, 2.0, 3.0);
        let bezier = Bezier::new(p, p, p, p);
        assert!(bezier.length().abs() < 1e-12);
        assert!((bezier.lengths[SUBDIVISIONS] - 1.0).abs() < 1e-12);
        let sample = bezier.linear_point_at(0.5).unwrap();
        assert!(sample.distance(p) < 1e-9);
    }

    #[test]
    fn test_vec2_curve() {
        let bezier = Bezier::new(
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 1.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(1.0, 0.0),
        );
        let mid = bezier.point_at(0.5);
        assert!((mid.x - 0.5).abs() < 1e-9);
        assert!((mid.y - 0.75).abs() < 1e-9);
    }
}
