//! CoastMesh 几何模块
//!
//! 提供投影感知的几何原语与空间索引，是网格内核的最底层依赖。
//!
//! # 模块
//!
//! - `constants`: 哨兵值与大地测量常数
//! - `point`: 平面点类型（带缺失值有效性判断）
//! - `projection`: 投影标签（平面 / 球面 / 精确球面）
//! - `operations`: 投影感知的几何运算（距离、面积、相交、外心等）
//! - `spatial_index`: 基于 R-Tree 的点集空间索引
//!
//! # 设计说明
//!
//! 所有几何运算以自由函数形式接受 [`Projection`] 标签并内部分支，
//! 三种投影的差异仅在少量算术行，不引入虚分派。
//!
//! # 示例
//!
//! ```
//! use cm_geo::prelude::*;
//!
//! let a = Point::new(0.0, 0.0);
//! let b = Point::new(3.0, 4.0);
//! let d = operations::distance(&a, &b, Projection::Cartesian);
//! assert!((d - 5.0).abs() < 1e-12);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod constants;
pub mod operations;
pub mod point;
pub mod projection;
pub mod spatial_index;

/// 预导入模块
pub mod prelude {
    pub use crate::constants::{DOUBLE_MISSING_VALUE, EARTH_RADIUS, INVALID_INDEX};
    pub use crate::operations;
    pub use crate::point::Point;
    pub use crate::projection::Projection;
    pub use crate::spatial_index::SpatialIndex;
}

pub use constants::{DOUBLE_MISSING_VALUE, INVALID_INDEX};
pub use point::Point;
pub use projection::Projection;
pub use spatial_index::SpatialIndex;
