//! Camera Motion Engine - 关键帧相机运动引擎
//!
//! 把稀疏的关键帧（时间、三维位置、注视目标、切线手柄、目标速度）
//! 变成平滑、速度受控的轨迹，每渲染帧采样一次：
//! - 三次贝塞尔曲线 + 弧长重参数化（匀速采样）
//! - 三段式（梯形）速度剖面的闭式运动学求解
//! - 标量关键帧轨道与切线锁定（C¹ 连续）
//! - 多段路径组合与全局时间查询
//!
//! 引擎是纯计算、单线程、无 I/O 的；编辑与查询由调用方串行化。

pub mod bezier;
pub mod camera;
pub mod keyframe;
pub mod motion;
pub mod parameter;
pub mod path;
pub mod section;

pub use bezier::{Bezier, CurvePoint, SUBDIVISIONS};
pub use camera::CameraParameters;
pub use keyframe::{AnimationPoint, KeyFrame};
pub use motion::Motion;
pub use parameter::Parameter;
pub use path::AnimationPath;
pub use section::{AnimationSection, Pose};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MotionError {
    /// 运动剖面参数非法，或巡航距离无法调和
    #[error("invalid motion: {0}")]
    InvalidMotion(String),

    /// 巡航修正要求两侧加速度符号相反，剖面无解
    #[error("unsatisfiable motion: {0}")]
    UnsatisfiableMotion(String),

    /// 取值超出允许范围
    #[error("out of range: {0}")]
    OutOfRange(String),
}

pub type Result<T> = std::result::Result<T, MotionError>;
