//! 关键帧数据结构
//!
//! `KeyFrame` 是标量轨道上的锚点，`AnimationPoint` 是三维相机
//! 路径上的锚点。两者都由外部编辑器创作；派生数据（采样缓存、
//! 曲线、速度剖面）在编辑后由所属容器重建。

use glam::DVec3;

/// 标量轨道关键帧
///
/// 进 / 出切线各由一对 (percent, value) 描述：percent 是控制点
/// 在相邻区段帧跨度上的比例位置（始终钳制到 [0, 1]），value 是
/// 控制点的取值。
#[derive(Debug, Clone)]
pub struct KeyFrame {
    pub frame: u32,
    pub value: f64,
    pub in_value: f64,
    in_percent: f64,
    pub out_value: f64,
    out_percent: f64,
    /// 锁定时出切线斜率镜像进切线，保证一阶导数连续
    pub lock_in_out: bool,
    /// 本帧到后继帧之间逐整数帧的采样缓存，由 `Parameter` 重建
    pub(crate) values: Vec<f64>,
}

impl KeyFrame {
    pub fn new(frame: u32, value: f64) -> Self {
        Self {
            frame,
            value,
            in_value: value,
            in_percent: 0.5,
            out_value: value,
            out_percent: 0.5,
            lock_in_out: false,
            values: Vec::new(),
        }
    }

    pub fn in_percent(&self) -> f64 {
        self.in_percent
    }

    pub fn out_percent(&self) -> f64 {
        self.out_percent
    }

    pub(crate) fn set_in_percent(&mut self, percent: f64) {
        self.in_percent = percent.clamp(0.0, 1.0);
    }

    pub(crate) fn set_out_percent(&mut self, percent: f64) {
        self.out_percent = percent.clamp(0.0, 1.0);
    }
}

/// 三维相机路径关键点
///
/// 切线手柄是相对端点的偏移向量，不是绝对控制点；
/// 位置曲线与注视曲线各有一对进 / 出手柄。
#[derive(Debug, Clone)]
pub struct AnimationPoint {
    /// 全局时间，路径内唯一且有序
    pub time: f64,
    pub position: DVec3,
    pub look_at: DVec3,
    pub position_in: DVec3,
    pub position_out: DVec3,
    pub look_at_in: DVec3,
    pub look_at_out: DVec3,
    /// 经过本点时的速度
    pub speed: f64,
    /// 本点出发段的巡航速度
    pub cruise_speed: f64,
    /// 进出本点使用的加速度幅值
    pub acceleration: f64,
}

impl AnimationPoint {
    pub fn new(time: f64, position: DVec3, look_at: DVec3) -> Self {
        Self {
            time,
            position,
            look_at,
            position_in: DVec3::ZERO,
            position_out: DVec3::ZERO,
            look_at_in: DVec3::ZERO,
            look_at_out: DVec3::ZERO,
            speed: 1.0,
            cruise_speed: 1.0,
            acceleration: 1.0,
        }
    }

    /// 设置位置曲线的进 / 出切线手柄
    pub fn with_position_handles(mut self, position_in: DVec3, position_out: DVec3) -> Self {
        self.position_in = position_in;
        self.position_out = position_out;
        self
    }

    /// 设置注视曲线的进 / 出切线手柄
    pub fn with_look_at_handles(mut self, look_at_in: DVec3, look_at_out: DVec3) -> Self {
        self.look_at_in = look_at_in;
        self.look_at_out = look_at_out;
        self
    }

    /// 设置过点速度、出发段巡航速度与加速度幅值
    pub fn with_kinematics(mut self, speed: f64, cruise_speed: f64, acceleration: f64) -> Self {
        self.speed = speed;
        self.cruise_speed = cruise_speed;
        self.acceleration = acceleration;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyframe_defaults() {
        let key = KeyFrame::new(10, 3.5);
        assert_eq!(key.frame, 10);
        assert!((key.in_value - 3.5).abs() < f64::EPSILON);
        assert!((key.out_value - 3.5).abs() < f64::EPSILON);
        assert!(!key.lock_in_out);
        assert!(key.values.is_empty());
    }

    #[test]
    fn test_percent_clamped() {
        let mut key = KeyFrame::new(0, 0.0);
        key.set_in_percent(1.5);
        assert!((key.in_percent() - 1.0).abs() < f64::EPSILON);
        key.set_out_percent(-0.2);
        assert!(key.out_percent().abs() < f64::EPSILON);
    }

    #[test]
    fn test_animation_point_builder() {
        let point = AnimationPoint::new(2.0, DVec3::ZERO, DVec3::X)
            .with_position_handles(DVec3::new(-1.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0))
            .with_kinematics(0.5, 2.0, 1.5);
        assert!((point.time - 2.0).abs() < f64::EPSILON);
        assert!((point.position_out.x - 1.0).abs() < f64::EPSILON);
        assert!((point.speed - 0.5).abs() < f64::EPSILON);
        assert!((point.cruise_speed - 2.0).abs() < f64::EPSILON);
    }
}
