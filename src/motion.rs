//! 三段式（梯形）速度剖面
//!
//! 在固定行进距离与边界速度约束下，闭式求解
//! 加速 / 匀速 / 减速三个阶段的时长与距离，
//! 并把经过时间映射为"已行进距离占总距离的比例"——
//! 这正是弧长采样所需要的输入。

use crate::{MotionError, Result};

const EPSILON: f64 = 1e-9;

/// 三段式速度剖面
///
/// 阶段 1 从 `v1` 变速到 `v2`，阶段 2 以 `v2` 匀速巡航，
/// 阶段 3 从 `v2` 变速到 `v3`。加速度以正幅值传入，
/// 符号由速度增减方向在内部推导。
#[derive(Debug, Clone, Copy)]
pub struct Motion {
    v1: f64,
    v2: f64,
    v3: f64,
    a1: f64,
    a2: f64,
    a3: f64,
    t1: f64,
    t2: f64,
    t3: f64,
    d1: f64,
    d2: f64,
    d3: f64,
}

impl Motion {
    /// 构造速度剖面
    ///
    /// 速度必须非负，加速度幅值与总距离必须严格为正。
    /// 若边界速度要求的加减速距离超过总距离（巡航距离为负），
    /// 自动重解巡航速度使巡航段恰好为零后再算一次。
    pub fn new(
        v1: f64,
        v2: f64,
        v3: f64,
        distance: f64,
        accel_in: f64,
        accel_out: f64,
    ) -> Result<Self> {
        if accel_in <= 0.0 || accel_out <= 0.0 {
            return Err(MotionError::InvalidMotion(format!(
                "acceleration magnitudes must be strictly positive (in = {accel_in}, out = {accel_out})"
            )));
        }
        if v1 < 0.0 || v2 < 0.0 || v3 < 0.0 {
            return Err(MotionError::InvalidMotion(format!(
                "velocities must be non-negative (v1 = {v1}, v2 = {v2}, v3 = {v3})"
            )));
        }
        if distance <= 0.0 {
            return Err(MotionError::InvalidMotion(format!(
                "distance must be strictly positive (distance = {distance})"
            )));
        }

        let mut motion = Self {
            v1,
            v2,
            v3,
            a1: 0.0,
            a2: 0.0,
            a3: 0.0,
            t1: 0.0,
            t2: 0.0,
            t3: 0.0,
            d1: 0.0,
            d2: 0.0,
            d3: 0.0,
        };
        motion.calculate(distance, accel_in, accel_out)?;
        Ok(motion)
    }

    fn calculate(&mut self, distance: f64, accel_in: f64, accel_out: f64) -> Result<()> {
        let tolerance = EPSILON * distance.max(1.0);

        self.compute_phases(distance, accel_in, accel_out);
        if self.d2 < -tolerance {
            // 巡航距离为负：按闭式解重求 v2，使巡航段恰好为零
            self.v2 = Self::fix_v2(self.v1, self.v3, distance, self.a1, self.a3)?;
            self.compute_phases(distance, accel_in, accel_out);
            if self.d2 < -1e-6 * distance.max(1.0) {
                return Err(MotionError::InvalidMotion(format!(
                    "cruise distance still negative after correction (d2 = {})",
                    self.d2
                )));
            }
        }

        if self.v2 > 0.0 {
            self.t2 = (self.d2 / self.v2).max(0.0);
        } else {
            if self.d2.abs() > tolerance.max(1e-6 * distance) {
                return Err(MotionError::InvalidMotion(format!(
                    "cruise distance {} requires a nonzero cruise velocity",
                    self.d2
                )));
            }
            self.t2 = 0.0;
        }
        Ok(())
    }

    /// 由 v = u + at 和 d = ut + ½at² 推导各阶段时长与距离
    fn compute_phases(&mut self, distance: f64, accel_in: f64, accel_out: f64) {
        self.a1 = if self.v2 >= self.v1 { accel_in } else { -accel_in };
        self.a2 = 0.0;
        self.a3 = if self.v3 >= self.v2 { accel_out } else { -accel_out };

        self.t1 = if (self.v2 - self.v1).abs() < EPSILON {
            0.0
        } else {
            (self.v2 - self.v1) / self.a1
        };
        self.t3 = if (self.v3 - self.v2).abs() < EPSILON {
            0.0
        } else {
            (self.v3 - self.v2) / self.a3
        };

        self.d1 = self.v1 * self.t1 + 0.5 * self.a1 * self.t1 * self.t1;
        self.d3 = self.v2 * self.t3 + 0.5 * self.a3 * self.t3 * self.t3;
        self.d2 = distance - self.d1 - self.d3;
    }

    /// 退化修正：求使巡航距离恰好为零的新巡航速度
    ///
    /// 仅当两侧加速度符号相反（一侧真加速、一侧真减速）时有解。
    fn fix_v2(v1: f64, v3: f64, distance: f64, a1: f64, a3: f64) -> Result<f64> {
        if (a1 > 0.0) == (a3 > 0.0) {
            return Err(MotionError::UnsatisfiableMotion(format!(
                "cruise correction needs opposite acceleration signs (a1 = {a1}, a3 = {a3})"
            )));
        }
        let squared = (4.0 * a1 * a3 * distance - 2.0 * a1 * v3 * v3 + 2.0 * a3 * v1 * v1)
            / (2.0 * (a3 - a1));
        if squared < 0.0 {
            return Err(MotionError::InvalidMotion(format!(
                "corrected cruise velocity has no real solution (v2^2 = {squared})"
            )));
        }
        Ok(squared.sqrt())
    }

    /// 剖面总时长
    pub fn total_time(&self) -> f64 {
        self.t1 + self.t2 + self.t3
    }

    /// 剖面总距离
    pub fn total_distance(&self) -> f64 {
        self.d1 + self.d2 + self.d3
    }

    /// 经过时间 → 已行进距离比例
    ///
    /// `time` 被钳制到 [0, total_time]。在所处阶段内套用
    /// d(t) = ut + ½at²，加上之前阶段的距离偏移，最后除以总距离。
    /// 返回的是距离比例而不是时间比例。
    pub fn percent_at(&self, time: f64) -> f64 {
        let total = self.total_time();
        if total <= 0.0 {
            return 1.0;
        }
        let time = time.clamp(0.0, total);
        let traveled = if time <= self.t1 {
            self.v1 * time + 0.5 * self.a1 * time * time
        } else if time <= self.t1 + self.t2 {
            let t = time - self.t1;
            self.d1 + self.v2 * t + 0.5 * self.a2 * t * t
        } else {
            let t = time - self.t1 - self.t2;
            self.d1 + self.d2 + self.v2 * t + 0.5 * self.a3 * t * t
        };
        (traveled / self.total_distance()).clamp(0.0, 1.0)
    }
}
