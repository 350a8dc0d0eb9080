//! 动画路径段
//!
//! 由相邻两个关键点派生：位置贝塞尔曲线（形状）+ 注视插值 +
//! 速度剖面（时间）。派生对象随端点编辑整体重建，从不原地修补。

use glam::DVec3;

use crate::bezier::Bezier;
use crate::keyframe::AnimationPoint;
use crate::motion::Motion;
use crate::{MotionError, Result};

/// 相机位姿：引擎对外的全部输出
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: DVec3,
    pub look_at: DVec3,
}

/// 两个相邻关键点之间的路径段
#[derive(Debug, Clone)]
pub struct AnimationSection {
    start: AnimationPoint,
    end: AnimationPoint,
    position: Bezier<DVec3>,
    look_at: Bezier<DVec3>,
    /// 零长度段原地保持，不构造速度剖面
    motion: Option<Motion>,
}

impl AnimationSection {
    pub fn new(start: AnimationPoint, end: AnimationPoint) -> Result<Self> {
        let (position, look_at, motion) = Self::build(&start, &end)?;
        Ok(Self {
            start,
            end,
            position,
            look_at,
            motion,
        })
    }

    /// Hermite → Bezier：相对手柄加到端点绝对位置上构成内部控制点
    fn build(
        start: &AnimationPoint,
        end: &AnimationPoint,
    ) -> Result<(Bezier<DVec3>, Bezier<DVec3>, Option<Motion>)> {
        let position = Bezier::new(
            start.position,
            start.position + start.position_out,
            end.position + end.position_in,
            end.position,
        );
        let look_at = Bezier::new(
            start.look_at,
            start.look_at + start.look_at_out,
            end.look_at + end.look_at_in,
            end.look_at,
        );
        let motion = if position.length() > 0.0 {
            Some(Motion::new(
                start.speed,
                start.cruise_speed,
                end.speed,
                position.length(),
                start.acceleration,
                end.acceleration,
            )?)
        } else {
            None
        };
        Ok((position, look_at, motion))
    }

    /// 端点的位置、手柄或速度字段变化后必须调用，整体重建派生状态
    pub fn refresh(&mut self) -> Result<()> {
        let (position, look_at, motion) = Self::build(&self.start, &self.end)?;
        self.position = position;
        self.look_at = look_at;
        self.motion = motion;
        Ok(())
    }

    pub fn start(&self) -> &AnimationPoint {
        &self.start
    }

    pub fn end(&self) -> &AnimationPoint {
        &self.end
    }

    /// 替换起点并重建
    pub fn set_start(&mut self, start: AnimationPoint) -> Result<()> {
        self.start = start;
        self.refresh()
    }

    /// 替换终点并重建
    pub fn set_end(&mut self, end: AnimationPoint) -> Result<()> {
        self.end = end;
        self.refresh()
    }

    /// 按本段经过时间比例采样
    ///
    /// `percent` 概念上是本段经过时间的比例；先经速度剖面换算成
    /// 距离比例，再对位置曲线做弧长采样，注视曲线取同一比例。
    pub fn linear_point_at(&self, percent: f64) -> Result<Pose> {
        if !(0.0..=1.0).contains(&percent) {
            return Err(MotionError::OutOfRange(format!(
                "percent {percent} not in [0, 1]"
            )));
        }
        let travel = match &self.motion {
            Some(motion) => motion.percent_at(motion.total_time() * percent),
            None => percent,
        };
        Ok(Pose {
            position: self.position.linear_point_at(travel)?,
            look_at: self.look_at.linear_point_at(travel)?,
        })
    }
}
