//! 逐轴标量变体
//!
//! 六条并行的 `Parameter` 轨道（眼点与注视点各自的
//! 纬度 / 经度 / 缩放）驱动相机。输出仍是 `Pose`，由外部
//! 视图绑定把六个标量套用到它自己的坐标约定上。

use glam::DVec3;

use crate::parameter::Parameter;
use crate::section::Pose;
use crate::Result;

/// 六轨标量相机动画
#[derive(Debug, Clone, Default)]
pub struct CameraParameters {
    pub eye_lat: Parameter,
    pub eye_lon: Parameter,
    pub eye_zoom: Parameter,
    pub center_lat: Parameter,
    pub center_lon: Parameter,
    pub center_zoom: Parameter,
}

impl CameraParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// 在指定帧取六个轴的值并打包为位姿
    ///
    /// 任何一条轨道在该帧之前没有关键帧时整体失败。
    pub fn get_pose(&self, frame: u32) -> Result<Pose> {
        Ok(Pose {
            position: DVec3::new(
                self.eye_lat.get_value(frame)?,
                self.eye_lon.get_value(frame)?,
                self.eye_zoom.get_value(frame)?,
            ),
            look_at: DVec3::new(
                self.center_lat.get_value(frame)?,
                self.center_lon.get_value(frame)?,
                self.center_zoom.get_value(frame)?,
            ),
        })
    }

    /// 六条轨道中最大的关键帧帧号
    pub fn last_frame(&self) -> Option<u32> {
        [
            &self.eye_lat,
            &self.eye_lon,
            &self.eye_zoom,
            &self.center_lat,
            &self.center_lon,
            &self.center_zoom,
        ]
        .into_iter()
        .filter_map(Parameter::last_frame)
        .max()
    }

    /// 在同一帧为六条轨道各添加一个关键帧
    pub fn add_frame(&mut self, frame: u32, eye: DVec3, center: DVec3) {
        self.eye_lat.add_key(frame, eye.x);
        self.eye_lon.add_key(frame, eye.y);
        self.eye_zoom.add_key(frame, eye.z);
        self.center_lat.add_key(frame, center.x);
        self.center_lon.add_key(frame, center.y);
        self.center_zoom.add_key(frame, center.z);
    }
}
