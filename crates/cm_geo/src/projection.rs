// crates/cm_geo/src/projection.rs

//! 投影标签
//!
//! 网格在整个生命周期绑定一种投影。几何原语接受标签并内部分支：
//!
//! - [`Projection::Cartesian`]: 平面坐标，欧氏度量
//! - [`Projection::Spherical`]: 经纬度坐标，局部尺度化度量（经度差按
//!   平均纬度余弦缩放）
//! - [`Projection::SphericalAccurate`]: 经纬度坐标，大圆距离
//!
//! 球面系下坐标单位为度，跨反子午线的经度差在运算内部回绕。

use serde::{Deserialize, Serialize};

use crate::constants::DEG2RAD;
use crate::point::Point;

/// 坐标投影类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Projection {
    /// 平面直角坐标
    Cartesian,
    /// 球面坐标（角度制，局部度量）
    Spherical,
    /// 球面坐标（大圆距离）
    SphericalAccurate,
}

impl Projection {
    /// 是否为球面系（含精确球面）
    #[inline]
    #[must_use]
    pub fn is_spherical(&self) -> bool {
        matches!(self, Self::Spherical | Self::SphericalAccurate)
    }

    /// 由地理坐标标志构造（外部接口的 `is_geographic` 语义）
    #[inline]
    #[must_use]
    pub fn from_geographic_flag(is_geographic: bool) -> Self {
        if is_geographic {
            Self::Spherical
        } else {
            Self::Cartesian
        }
    }
}

impl Default for Projection {
    fn default() -> Self {
        Self::Cartesian
    }
}

/// 判断点是否位于极点附近（球面系专用）
///
/// 纬度与 ±90° 之差小于阈值即视为极点。
#[inline]
#[must_use]
pub fn is_point_on_pole(point: &Point) -> bool {
    (point.y.abs() - 90.0).abs() < 1e-8
}

/// 两点平均纬度的余弦（球面经度缩放因子）
#[inline]
#[must_use]
pub(crate) fn mean_latitude_cosine(a: &Point, b: &Point) -> f64 {
    (0.5 * (a.y + b.y) * DEG2RAD).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geographic_flag() {
        assert_eq!(
            Projection::from_geographic_flag(true),
            Projection::Spherical
        );
        assert_eq!(
            Projection::from_geographic_flag(false),
            Projection::Cartesian
        );
    }

    #[test]
    fn test_is_spherical() {
        assert!(!Projection::Cartesian.is_spherical());
        assert!(Projection::Spherical.is_spherical());
        assert!(Projection::SphericalAccurate.is_spherical());
    }

    #[test]
    fn test_pole_detection() {
        assert!(is_point_on_pole(&Point::new(10.0, 90.0)));
        assert!(is_point_on_pole(&Point::new(0.0, -90.0)));
        assert!(!is_point_on_pole(&Point::new(0.0, 89.0)));
    }
}
