// crates/cm_geo/src/constants.rs

//! 哨兵值与大地测量常数
//!
//! 所有"缺失/无效"语义共用同一组哨兵：坐标用 [`DOUBLE_MISSING_VALUE`]，
//! 索引用 [`INVALID_INDEX`]。多段多边形的内外环以
//! [`INNER_OUTER_SEPARATOR`] 分隔，与坐标缺失值取不同数值以便区分。

use std::f64::consts::PI;

/// 坐标缺失值哨兵
pub const DOUBLE_MISSING_VALUE: f64 = -999.0;

/// 多边形内外环分隔哨兵（与坐标缺失值不同）
pub const INNER_OUTER_SEPARATOR: f64 = -998.0;

/// 无效索引哨兵
pub const INVALID_INDEX: usize = usize::MAX;

/// 地球半径 [m]（WGS84 长半轴）
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// 度转弧度
pub const DEG2RAD: f64 = PI / 180.0;

/// 弧度转度
pub const RAD2DEG: f64 = 180.0 / PI;

/// 坐标差下限：低于该值时角度退化为 ±π/2
pub const MINIMUM_DELTA_COORDINATE: f64 = 1e-14;

/// 单元面积下限 [m²]，光滑度等比值计算的除零保护
pub const MINIMUM_CELL_AREA: f64 = 1e-12;

/// 边长平方下限 [m²]，镜像虚节点计算的除零保护
pub const MINIMUM_EDGE_LENGTH_SQUARED: f64 = 1e-14;

/// 浮点相等判断
#[inline]
pub fn is_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < f64::EPSILON
}

/// 环形前向索引：`i + 1`，末尾回绕到 0
#[inline]
pub fn next_circular_forward(index: usize, size: usize) -> usize {
    if index + 1 == size { 0 } else { index + 1 }
}

/// 环形后向索引：`i - 1`，开头回绕到末尾
#[inline]
pub fn next_circular_backward(index: usize, size: usize) -> usize {
    if index == 0 { size - 1 } else { index - 1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circular_indices() {
        assert_eq!(next_circular_forward(0, 4), 1);
        assert_eq!(next_circular_forward(3, 4), 0);
        assert_eq!(next_circular_backward(0, 4), 3);
        assert_eq!(next_circular_backward(2, 4), 1);
    }

    #[test]
    fn test_separators_distinct() {
        assert!(!is_equal(DOUBLE_MISSING_VALUE, INNER_OUTER_SEPARATOR));
    }
}
