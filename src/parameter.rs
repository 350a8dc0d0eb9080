//! 标量关键帧轨道
//!
//! 按帧号有序存储关键帧（BTreeMap，前驱 / 后继用范围查询而不是
//! 链表指针），每次编辑只重建受影响区段的逐帧采样缓存。
//! 区段曲线在 (帧号, 取值) 平面上做 Hermite → Bezier 手柄构造，
//! 以 10 倍帧数细分采样，再按 x（帧号单调）扫描反查整数帧取值。

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use glam::DVec2;

use crate::bezier::Bezier;
use crate::keyframe::KeyFrame;
use crate::{MotionError, Result};

/// 采样细分相对帧跨度的倍率
const SAMPLE_FACTOR: u32 = 10;

/// 标量关键帧轨道
#[derive(Debug, Clone, Default)]
pub struct Parameter {
    keys: BTreeMap<u32, KeyFrame>,
}

impl Parameter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn first_frame(&self) -> Option<u32> {
        self.keys.keys().next().copied()
    }

    pub fn last_frame(&self) -> Option<u32> {
        self.keys.keys().next_back().copied()
    }

    pub fn get_key(&self, frame: u32) -> Option<&KeyFrame> {
        self.keys.get(&frame)
    }

    /// 添加关键帧
    ///
    /// 帧号已被占用时不做任何事（既有行为，见 DESIGN.md）。
    pub fn add_key(&mut self, frame: u32, value: f64) {
        if self.keys.contains_key(&frame) {
            return;
        }
        self.keys.insert(frame, KeyFrame::new(frame, value));
        self.touch(frame);
    }

    /// 删除关键帧并桥接两侧区段
    pub fn remove_key(&mut self, frame: u32) -> bool {
        if self.keys.remove(&frame).is_none() {
            return false;
        }
        self.heal_around(frame);
        true
    }

    /// 把关键帧移动到新帧号
    ///
    /// 目标帧已被占用时静默拒绝并返回 false（既有行为，见 DESIGN.md）。
    pub fn set_frame(&mut self, frame: u32, new_frame: u32) -> bool {
        if frame == new_frame {
            return self.keys.contains_key(&frame);
        }
        if self.keys.contains_key(&new_frame) {
            return false;
        }
        let Some(mut key) = self.keys.remove(&frame) else {
            return false;
        };
        key.frame = new_frame;
        key.values.clear();
        self.keys.insert(new_frame, key);
        // 旧位置两侧桥接，新位置两侧重建
        self.heal_around(frame);
        self.touch(new_frame);
        true
    }

    /// 修改关键帧取值
    pub fn set_value(&mut self, frame: u32, value: f64) -> bool {
        let Some(key) = self.keys.get_mut(&frame) else {
            return false;
        };
        key.value = value;
        self.touch(frame);
        true
    }

    /// 设置进切线控制点取值
    pub fn set_in(&mut self, frame: u32, value: f64) -> bool {
        let Some(key) = self.keys.get_mut(&frame) else {
            return false;
        };
        key.in_value = value;
        self.touch(frame);
        true
    }

    /// 设置出切线控制点取值
    ///
    /// 关键帧处于锁定状态时，出切线随后会被镜像结果覆盖。
    pub fn set_out(&mut self, frame: u32, value: f64) -> bool {
        let Some(key) = self.keys.get_mut(&frame) else {
            return false;
        };
        key.out_value = value;
        self.touch(frame);
        true
    }

    /// 设置进切线控制点的比例位置（钳制到 [0, 1]）
    pub fn set_in_percent(&mut self, frame: u32, percent: f64) -> bool {
        let Some(key) = self.keys.get_mut(&frame) else {
            return false;
        };
        key.set_in_percent(percent);
        self.touch(frame);
        true
    }

    /// 设置出切线控制点的比例位置（钳制到 [0, 1]）
    pub fn set_out_percent(&mut self, frame: u32, percent: f64) -> bool {
        let Some(key) = self.keys.get_mut(&frame) else {
            return false;
        };
        key.set_out_percent(percent);
        self.touch(frame);
        true
    }

    /// 锁定 / 解锁出切线对进切线斜率的镜像
    pub fn set_lock_in_out(&mut self, frame: u32, locked: bool) -> bool {
        let Some(key) = self.keys.get_mut(&frame) else {
            return false;
        };
        key.lock_in_out = locked;
        self.touch(frame);
        true
    }

    /// 查询指定帧的取值
    ///
    /// 对缓存数组 O(1) 取值；首个关键帧之前没有定义，返回
    /// `OutOfRange`；末个关键帧及之后钳制为末帧取值。
    pub fn get_value(&self, frame: u32) -> Result<f64> {
        let Some(first) = self.first_frame() else {
            return Err(MotionError::OutOfRange(
                "parameter has no keyframes".into(),
            ));
        };
        if frame < first {
            return Err(MotionError::OutOfRange(format!(
                "frame {frame} precedes first keyframe {first}"
            )));
        }
        let Some((&start, key)) = self.keys.range(..=frame).next_back() else {
            return Err(MotionError::OutOfRange(format!(
                "frame {frame} has no preceding keyframe"
            )));
        };
        let offset = (frame - start) as usize;
        match key.values.get(offset) {
            Some(&value) => Ok(value),
            None => Ok(key.value),
        }
    }

    fn prev_frame(&self, frame: u32) -> Option<u32> {
        self.keys.range(..frame).next_back().map(|(&f, _)| f)
    }

    fn next_frame(&self, frame: u32) -> Option<u32> {
        self.keys
            .range((Excluded(frame), Unbounded))
            .next()
            .map(|(&f, _)| f)
    }

    /// 一次编辑后的统一重建入口：先重算受影响关键帧的锁定镜像，
    /// 再重建所有可能失效的区段缓存。
    fn touch(&mut self, frame: u32) {
        let prev = self.prev_frame(frame);
        let next = self.next_frame(frame);
        for f in [prev, Some(frame), next].into_iter().flatten() {
            self.apply_lock(f);
        }
        if let Some(p) = prev {
            self.update_segment(p);
        }
        self.update_segment(frame);
        if let Some(n) = next {
            self.update_segment(n);
        }
    }

    /// 删除 / 移走一个帧号之后修补其旧邻居
    fn heal_around(&mut self, frame: u32) {
        let prev = self.prev_frame(frame);
        let next = self.next_frame(frame);
        for f in [prev, next].into_iter().flatten() {
            self.apply_lock(f);
            self.update_segment(f);
        }
    }

    /// 锁定镜像：用进切线斜率（Δy/Δx）重算出切线控制点取值
    fn apply_lock(&mut self, frame: u32) {
        let Some(key) = self.keys.get(&frame) else {
            return;
        };
        if !key.lock_in_out {
            return;
        }
        let (Some(prev), Some(next)) = (self.prev_frame(frame), self.next_frame(frame)) else {
            return;
        };
        let in_dx = key.in_percent() * (frame - prev) as f64;
        let out_dx = key.out_percent() * (next - frame) as f64;
        let out_value = if in_dx > 0.0 {
            let slope = (key.value - key.in_value) / in_dx;
            key.value + slope * out_dx
        } else {
            // 进切线与关键帧重合，斜率无定义，按水平处理
            key.value
        };
        if let Some(key) = self.keys.get_mut(&frame) {
            key.out_value = out_value;
        }
    }

    /// 重建 `start` 到其后继之间的逐帧采样缓存
    fn update_segment(&mut self, start: u32) {
        let Some(k0) = self.keys.get(&start) else {
            return;
        };
        let Some((_, k1)) = self.keys.range((Excluded(start), Unbounded)).next() else {
            // 末尾关键帧没有后继区段
            if let Some(key) = self.keys.get_mut(&start) {
                key.values.clear();
            }
            return;
        };

        let span = k1.frame - k0.frame;
        let p0 = DVec2::new(k0.frame as f64, k0.value);
        let p1 = DVec2::new(
            k0.frame as f64 + k0.out_percent() * span as f64,
            k0.out_value,
        );
        let p2 = DVec2::new(
            k1.frame as f64 - k1.in_percent() * span as f64,
            k1.in_value,
        );
        let p3 = DVec2::new(k1.frame as f64, k1.value);
        let bezier = Bezier::new(p0, p1, p2, p3);

        let steps = sample_steps(span);
        let mut samples = Vec::with_capacity(steps + 1);
        for i in 0..=steps {
            samples.push(bezier.point_at(i as f64 / steps as f64));
        }

        // 帧号随采样单调推进，一遍扫描即可反查
        let mut values = Vec::with_capacity(span as usize);
        let mut cursor = 0usize;
        for frame in k0.frame..k1.frame {
            let x = frame as f64;
            while cursor + 1 < samples.len() && samples[cursor + 1].x < x {
                cursor += 1;
            }
            let value = if cursor + 1 < samples.len() {
                let a = samples[cursor];
                let b = samples[cursor + 1];
                let dx = b.x - a.x;
                if dx > 0.0 {
                    a.y + (b.y - a.y) * (x - a.x) / dx
                } else {
                    a.y
                }
            } else {
                samples[cursor].y
            };
            values.push(value);
        }

        let end = k1.frame;
        if let Some(key) = self.keys.get_mut(&start) {
            key.values = values;
        }
        log::debug!("parameter: rebuilt sample cache for segment {start}..{end}");
    }
}

/// 区段采样步数；在加宽类型上相乘，帧跨度接近 u32 上限也不回绕
fn sample_steps(span: u32) -> usize {
    (u64::from(span) * u64::from(SAMPLE_FACTOR)) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_get_exact_keys() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 100.0);
        parameter.add_key(100, 200.0);
        parameter.add_key(200, 50.0);
        assert_eq!(parameter.len(), 3);
        assert!((parameter.get_value(0).unwrap() - 100.0).abs() < 1e-9);
        assert!((parameter.get_value(100).unwrap() - 200.0).abs() < 1e-9);
        assert!((parameter.get_value(200).unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_demo_curve_stays_in_bounds() {
        // 三个关键帧，所有中间取值都应落在整体取值范围内
        let mut parameter = Parameter::new();
        parameter.add_key(0, 100.0);
        parameter.add_key(100, 200.0);
        parameter.add_key(200, 50.0);
        for frame in 0..=200 {
            let value = parameter.get_value(frame).unwrap();
            assert!(
                (50.0..=200.0).contains(&value),
                "frame {frame} value {value} out of bounds"
            );
        }
    }

    #[test]
    fn test_get_value_before_first_fails() {
        let mut parameter = Parameter::new();
        parameter.add_key(10, 1.0);
        assert!(matches!(
            parameter.get_value(5),
            Err(MotionError::OutOfRange(_))
        ));
        assert!(matches!(
            Parameter::new().get_value(0),
            Err(MotionError::OutOfRange(_))
        ));
    }

    #[test]
    fn test_get_value_after_last_clamps() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 1.0);
        parameter.add_key(10, 7.0);
        assert!((parameter.get_value(10).unwrap() - 7.0).abs() < 1e-9);
        assert!((parameter.get_value(500).unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_add_is_noop() {
        let mut parameter = Parameter::new();
        parameter.add_key(5, 1.0);
        parameter.add_key(5, 99.0);
        assert_eq!(parameter.len(), 1);
        assert!((parameter.get_value(5).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_set_frame_collision_rejected() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 1.0);
        parameter.add_key(10, 2.0);
        assert!(!parameter.set_frame(0, 10));
        assert!((parameter.get_value(0).unwrap() - 1.0).abs() < 1e-9);
        assert!(parameter.set_frame(0, 5));
        assert!(parameter.get_key(0).is_none());
        assert!((parameter.get_value(5).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_remove_key_bridges_segment() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 0.0);
        parameter.add_key(50, 1000.0);
        parameter.add_key(100, 100.0);
        assert!(parameter.remove_key(50));
        // 桥接后的区段端点保持，且中段不再被删掉的尖峰拉高
        assert!((parameter.get_value(0).unwrap() - 0.0).abs() < 1e-9);
        assert!((parameter.get_value(100).unwrap() - 100.0).abs() < 1e-9);
        let mid = parameter.get_value(50).unwrap();
        assert!((0.0..=100.0).contains(&mid));
    }

    #[test]
    fn test_lock_in_out_continuity() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 0.0);
        parameter.add_key(100, 100.0);
        parameter.add_key(200, 200.0);
        // 进切线斜率 (100 - 80) / (0.5 * 100) = 0.4，锁定后镜像到出切线
        parameter.set_in(100, 80.0);
        parameter.set_lock_in_out(100, true);
        let key = parameter.get_key(100).unwrap();
        assert!((key.out_value - 120.0).abs() < 1e-9);

        // 关键帧两侧的数值导数应该吻合
        let left = parameter.get_value(100).unwrap() - parameter.get_value(99).unwrap();
        let right = parameter.get_value(101).unwrap() - parameter.get_value(100).unwrap();
        assert!(
            (left - right).abs() < 0.1,
            "left {left} right {right} diverge at locked key"
        );
    }

    #[test]
    fn test_unlocked_tangents_can_kink() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 0.0);
        parameter.add_key(100, 100.0);
        parameter.add_key(200, 200.0);
        // 进切线陡、出切线平，不锁定时关键帧处允许出现折角
        parameter.set_in(100, 40.0);
        parameter.set_out(100, 100.0);
        let left = parameter.get_value(100).unwrap() - parameter.get_value(99).unwrap();
        let right = parameter.get_value(101).unwrap() - parameter.get_value(100).unwrap();
        assert!((left - right).abs() > 0.3, "left {left} right {right}");
    }

    #[test]
    fn test_sample_steps_wide_span() {
        assert_eq!(sample_steps(10), 100);
        assert_eq!(sample_steps(u32::MAX), u32::MAX as usize * 10);
    }

    #[test]
    fn test_lock_recomputed_after_in_edit() {
        let mut parameter = Parameter::new();
        parameter.add_key(0, 0.0);
        parameter.add_key(100, 100.0);
        parameter.add_key(200, 200.0);
        parameter.set_lock_in_out(100, true);
        parameter.set_in(100, 90.0);
        // 斜率 (100 - 90) / 50 = 0.2 → 出控制点 100 + 0.2 * 50 = 110
        let key = parameter.get_key(100).unwrap();
        assert!((key.out_value - 110.0).abs() < 1e-9);
    }
}
