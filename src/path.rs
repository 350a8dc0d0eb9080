//! 动画路径
//!
//! 按时间排序、无重复的关键点集合，外加逐相邻点对派生的路径段。
//! 编辑只重建受影响的段；查询把全局时间定位到包含它的点对，
//! 再委托给该段采样。

use crate::keyframe::AnimationPoint;
use crate::section::{AnimationSection, Pose};
use crate::{MotionError, Result};

/// 多段相机动画路径
#[derive(Debug, Clone, Default)]
pub struct AnimationPath {
    /// 按 time 升序，时间唯一
    points: Vec<AnimationPoint>,
    /// 派生段，sections[j] 由 points[j] 与 points[j+1] 构成
    sections: Vec<AnimationSection>,
}

impl AnimationPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[AnimationPoint] {
        &self.points
    }

    /// 首末关键点之间的时长
    pub fn duration(&self) -> f64 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    /// 插入关键点；时间重复时替换原有点
    ///
    /// 派生段构建失败（速度剖面无解）时回滚插入并返回错误。
    pub fn add_point(&mut self, point: AnimationPoint) -> Result<()> {
        match self
            .points
            .binary_search_by(|p| p.time.total_cmp(&point.time))
        {
            Ok(i) => {
                let old = std::mem::replace(&mut self.points[i], point);
                if let Err(err) = self.refresh_neighbors(i) {
                    self.points[i] = old;
                    return Err(err);
                }
            }
            Err(i) => {
                self.points.insert(i, point);
                if let Err(err) = self.splice_after_insert(i) {
                    self.points.remove(i);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// 删除指定时间的关键点并桥接两侧
    pub fn remove_point(&mut self, time: f64) -> Result<bool> {
        let Ok(i) = self.points.binary_search_by(|p| p.time.total_cmp(&time)) else {
            return Ok(false);
        };
        let removed = self.points.remove(i);
        if let Err(err) = self.splice_after_remove(i) {
            self.points.insert(i, removed);
            return Err(err);
        }
        Ok(true)
    }

    /// 编辑指定时间的关键点（可以改动 time 本身），随后重建受影响段
    pub fn update_point(
        &mut self,
        time: f64,
        edit: impl FnOnce(&mut AnimationPoint),
    ) -> Result<bool> {
        let Ok(i) = self.points.binary_search_by(|p| p.time.total_cmp(&time)) else {
            return Ok(false);
        };
        let mut point = self.points.remove(i);
        if let Err(err) = self.splice_after_remove(i) {
            self.points.insert(i, point);
            return Err(err);
        }
        let original = point.clone();
        edit(&mut point);
        if let Err(err) = self.add_point(point) {
            // 编辑后的点不可用，放回原点
            self.add_point(original)?;
            return Err(err);
        }
        Ok(true)
    }

    /// 全局时间 → 位姿
    ///
    /// 首个关键点之前钳制为首点，末个关键点及之后钳制为末点；
    /// 其余时间定位包含它的点对并委托给对应段。空路径没有可钳制
    /// 的目标，返回 `OutOfRange`。
    pub fn get_position_at(&self, time: f64) -> Result<Pose> {
        let (Some(first), Some(last)) = (self.points.first(), self.points.last()) else {
            return Err(MotionError::OutOfRange("path has no keyframes".into()));
        };
        if time <= first.time {
            return Ok(Pose {
                position: first.position,
                look_at: first.look_at,
            });
        }
        if time >= last.time {
            return Ok(Pose {
                position: last.position,
                look_at: last.look_at,
            });
        }
        let i = match self.points.binary_search_by(|p| p.time.total_cmp(&time)) {
            Ok(i) => {
                let point = &self.points[i];
                return Ok(Pose {
                    position: point.position,
                    look_at: point.look_at,
                });
            }
            Err(i) => i,
        };
        // points[i-1].time < time < points[i].time
        let Some(section) = self.sections.get(i - 1) else {
            return Err(MotionError::OutOfRange(format!(
                "no section covers time {time}"
            )));
        };
        let span = section.end().time - section.start().time;
        let percent = if span > 0.0 {
            (time - section.start().time) / span
        } else {
            0.0
        };
        section.linear_point_at(percent)
    }

    fn section_for(&self, j: usize) -> Result<AnimationSection> {
        AnimationSection::new(self.points[j].clone(), self.points[j + 1].clone())
    }

    /// 在位置 i 插入关键点之后修补段列表；先构建再拼接，
    /// 失败时不触碰现有缓存。
    fn splice_after_insert(&mut self, i: usize) -> Result<()> {
        let n = self.points.len();
        if n < 2 {
            return Ok(());
        }
        if i == 0 {
            let section = self.section_for(0)?;
            self.sections.insert(0, section);
        } else if i == n - 1 {
            let section = self.section_for(n - 2)?;
            self.sections.push(section);
        } else {
            // 旧段 (i-1, i+1) 被一分为二
            let left = self.section_for(i - 1)?;
            let right = self.section_for(i)?;
            self.sections.remove(i - 1);
            self.sections.insert(i - 1, right);
            self.sections.insert(i - 1, left);
        }
        log::debug!("path: rebuilt sections around inserted point {i}");
        Ok(())
    }

    /// 从位置 i 删除关键点之后修补段列表
    fn splice_after_remove(&mut self, i: usize) -> Result<()> {
        let n = self.points.len();
        if n == 0 {
            self.sections.clear();
            return Ok(());
        }
        if i == 0 {
            if !self.sections.is_empty() {
                self.sections.remove(0);
            }
        } else if i == n {
            self.sections.pop();
        } else {
            // 两个旧段合并为一个桥接段
            let bridge = self.section_for(i - 1)?;
            self.sections.remove(i);
            self.sections.remove(i - 1);
            self.sections.insert(i - 1, bridge);
        }
        Ok(())
    }

    /// 替换位置 i 的关键点之后重建两侧的段；
    /// 两段都构建成功后才写入，失败时不触碰现有缓存。
    fn refresh_neighbors(&mut self, i: usize) -> Result<()> {
        let left = if i > 0 {
            Some(self.section_for(i - 1)?)
        } else {
            None
        };
        let right = if i + 1 < self.points.len() {
            Some(self.section_for(i)?)
        } else {
            None
        };
        if let Some(section) = left {
            self.sections[i - 1] = section;
        }
        if let Some(section) = right {
            self.sections[i] = section;
        }
        Ok(())
    }
}
