// crates/cm_geo/src/point.rs

//! 平面点类型
//!
//! 网格内核统一使用的二维点。与一般几何库不同，[`Point`] 携带
//! "缺失值"语义：两个分量都不等于 [`DOUBLE_MISSING_VALUE`]
//! 时才视为有效，软删除即写入缺失值哨兵。
//!
//! # 示例
//!
//! ```
//! use cm_geo::point::Point;
//!
//! let p = Point::new(1.0, 2.0);
//! assert!(p.is_valid());
//!
//! let gone = Point::missing();
//! assert!(!gone.is_valid());
//! ```

use crate::constants::DOUBLE_MISSING_VALUE;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// 二维点
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// X 坐标（球面投影下为经度 [deg]）
    pub x: f64,
    /// Y 坐标（球面投影下为纬度 [deg]）
    pub y: f64,
}

impl Point {
    /// 零点常量
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// 创建新点
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// 创建缺失值点（软删除哨兵）
    #[inline]
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            x: DOUBLE_MISSING_VALUE,
            y: DOUBLE_MISSING_VALUE,
        }
    }

    /// 点是否有效：两个分量都不是缺失值
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.x != DOUBLE_MISSING_VALUE && self.y != DOUBLE_MISSING_VALUE
    }

    /// 点积
    #[inline]
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// 叉积（返回标量，即 Z 分量）
    #[inline]
    #[must_use]
    pub fn cross(&self, other: &Self) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// 向量长度
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// 向量长度的平方
    #[inline]
    #[must_use]
    pub fn length_squared(&self) -> f64 {
        self.x * self.x + self.y * self.y
    }

    /// 标量乘法
    #[inline]
    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    /// 线性插值
    #[inline]
    #[must_use]
    pub fn lerp(&self, other: &Self, t: f64) -> Self {
        Self {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// 判断是否为有限数（非 NaN、非 Inf）
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl Add for Point {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Neg for Point {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl Mul<f64> for Point {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self {
        self.scale(scalar)
    }
}

impl Mul<Point> for f64 {
    type Output = Point;

    #[inline]
    fn mul(self, point: Point) -> Point {
        point.scale(self)
    }
}

impl From<[f64; 2]> for Point {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity() {
        assert!(Point::new(0.0, 0.0).is_valid());
        assert!(!Point::missing().is_valid());
        // 单分量缺失也算无效
        assert!(!Point::new(DOUBLE_MISSING_VALUE, 1.0).is_valid());
    }

    #[test]
    fn test_arithmetic() {
        let a = Point::new(1.0, 2.0);
        let b = Point::new(3.0, 5.0);

        assert_eq!(a + b, Point::new(4.0, 7.0));
        assert_eq!(b - a, Point::new(2.0, 3.0));
        assert_eq!(-a, Point::new(-1.0, -2.0));
        assert_eq!(a * 2.0, Point::new(2.0, 4.0));
        assert_eq!(0.5 * b, Point::new(1.5, 2.5));
    }

    #[test]
    fn test_dot_cross() {
        let a = Point::new(1.0, 0.0);
        let b = Point::new(0.0, 1.0);
        assert!((a.dot(&b)).abs() < 1e-12);
        assert!((a.cross(&b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_lerp() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 20.0);
        assert_eq!(a.lerp(&b, 0.5), Point::new(5.0, 10.0));
    }
}
