// crates/cm_geo/src/operations.rs

//! 投影感知的几何运算
//!
//! 网格内核的全部几何原语：坐标差、距离、线段内积、多边形面积与
//! 质心、射线法点在多边形内判断、线段相交、三角形外心。
//!
//! # 设计说明
//!
//! 每个函数接受 [`Projection`] 标签并内部分支。球面系下坐标单位为度，
//! 坐标差换算为以米计的局部平面增量：经度差跨反子午线回绕后按平均
//! 纬度余弦缩放。退化输入（零长线段、零面积环）返回缺失值或质心，
//! 不报错。

use crate::constants::{
    DEG2RAD, DOUBLE_MISSING_VALUE, EARTH_RADIUS, MINIMUM_DELTA_COORDINATE, RAD2DEG,
};
use crate::point::Point;
use crate::projection::{mean_latitude_cosine, Projection};

/// X 方向坐标差：`b.x - a.x`
///
/// 球面系下经度差先回绕到 `[-180, 180]`，再按平均纬度余弦缩放并
/// 换算为米。
#[must_use]
pub fn dx(a: &Point, b: &Point, projection: Projection) -> f64 {
    match projection {
        Projection::Cartesian => b.x - a.x,
        Projection::Spherical | Projection::SphericalAccurate => {
            let mut delta = b.x - a.x;
            if delta > 180.0 {
                delta -= 360.0;
            }
            if delta < -180.0 {
                delta += 360.0;
            }
            delta * DEG2RAD * EARTH_RADIUS * mean_latitude_cosine(a, b)
        }
    }
}

/// Y 方向坐标差：`b.y - a.y`
///
/// 球面系下纬度差换算为米。
#[must_use]
pub fn dy(a: &Point, b: &Point, projection: Projection) -> f64 {
    match projection {
        Projection::Cartesian => b.y - a.y,
        Projection::Spherical | Projection::SphericalAccurate => {
            (b.y - a.y) * DEG2RAD * EARTH_RADIUS
        }
    }
}

/// 距离平方
///
/// 平面与球面系均由局部增量平方和给出，避免开方。
#[must_use]
pub fn squared_distance(a: &Point, b: &Point, projection: Projection) -> f64 {
    if !a.is_valid() || !b.is_valid() {
        return 0.0;
    }
    let delta_x = dx(a, b, projection);
    let delta_y = dy(a, b, projection);
    delta_x * delta_x + delta_y * delta_y
}

/// 两点距离
///
/// 平面系欧氏距离；球面系局部尺度化距离；精确球面系大圆距离
/// （haversine 公式）。
#[must_use]
pub fn distance(a: &Point, b: &Point, projection: Projection) -> f64 {
    match projection {
        Projection::Cartesian | Projection::Spherical => {
            squared_distance(a, b, projection).sqrt()
        }
        Projection::SphericalAccurate => {
            let phi1 = a.y * DEG2RAD;
            let phi2 = b.y * DEG2RAD;
            let d_phi = phi2 - phi1;
            let d_lambda = (b.x - a.x) * DEG2RAD;
            let h = (0.5 * d_phi).sin().powi(2)
                + phi1.cos() * phi2.cos() * (0.5 * d_lambda).sin().powi(2);
            2.0 * EARTH_RADIUS * h.sqrt().min(1.0).asin()
        }
    }
}

/// 两条有向线段 `ab`、`cd` 的内积
#[must_use]
pub fn inner_product_two_segments(
    a: &Point,
    b: &Point,
    c: &Point,
    d: &Point,
    projection: Projection,
) -> f64 {
    dx(a, b, projection) * dx(c, d, projection) + dy(a, b, projection) * dy(c, d, projection)
}

/// 两条有向线段 `ab`、`cd` 夹角的余弦
///
/// 任一线段退化（长度为零）时返回缺失值。结果截断到 `[-1, 1]`。
#[must_use]
pub fn normalized_inner_product_two_segments(
    a: &Point,
    b: &Point,
    c: &Point,
    d: &Point,
    projection: Projection,
) -> f64 {
    let dx1 = dx(a, b, projection);
    let dy1 = dy(a, b, projection);
    let dx2 = dx(c, d, projection);
    let dy2 = dy(c, d, projection);

    let modulus = (dx1 * dx1 + dy1 * dy1).sqrt() * (dx2 * dx2 + dy2 * dy2).sqrt();
    if modulus == 0.0 {
        return DOUBLE_MISSING_VALUE;
    }
    ((dx1 * dx2 + dy1 * dy2) / modulus).clamp(-1.0, 1.0)
}

/// 将以米计的局部增量从参考点映射回全局坐标
fn local_to_global(reference: &Point, local_x: f64, local_y: f64, projection: Projection) -> Point {
    match projection {
        Projection::Cartesian => Point::new(reference.x + local_x, reference.y + local_y),
        Projection::Spherical | Projection::SphericalAccurate => {
            let y = reference.y + local_y / (EARTH_RADIUS * DEG2RAD);
            let mean_cos = (0.5 * (reference.y + y) * DEG2RAD).cos().max(1e-12);
            let x = reference.x + local_x / (EARTH_RADIUS * DEG2RAD * mean_cos);
            Point::new(x, y)
        }
    }
}

/// 闭合环的面积、质心与绕向
///
/// # 参数
///
/// - `ring`: 闭合多边形环，末点与首点重合
///
/// # 返回
///
/// `(面积绝对值, 质心, 是否逆时针)`。退化环（面积为零）返回顶点
/// 算术平均作为质心。
#[must_use]
pub fn face_area_and_center_of_mass(
    ring: &[Point],
    projection: Projection,
) -> (f64, Point, bool) {
    let num_nodes = ring.len().saturating_sub(1);
    if num_nodes < 3 {
        let mut mean = Point::ZERO;
        for p in ring.iter().take(num_nodes.max(1)) {
            mean = mean + *p;
        }
        let count = num_nodes.max(1) as f64;
        return (0.0, mean.scale(1.0 / count), false);
    }

    let reference = ring[0];
    let mut signed_area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    for n in 0..num_nodes {
        let ux = dx(&reference, &ring[n], projection);
        let uy = dy(&reference, &ring[n], projection);
        let vx = dx(&reference, &ring[n + 1], projection);
        let vy = dy(&reference, &ring[n + 1], projection);

        let cross = ux * vy - vx * uy;
        signed_area += 0.5 * cross;
        cx += (ux + vx) * cross;
        cy += (uy + vy) * cross;
    }

    if signed_area == 0.0 {
        let mut mean = Point::ZERO;
        for p in ring.iter().take(num_nodes) {
            mean = mean + *p;
        }
        return (0.0, mean.scale(1.0 / num_nodes as f64), false);
    }

    let center = local_to_global(
        &reference,
        cx / (6.0 * signed_area),
        cy / (6.0 * signed_area),
        projection,
    );
    (signed_area.abs(), center, signed_area > 0.0)
}

/// 射线法判断点是否在多边形内
///
/// 从待测点向右发射水平射线统计交点数，奇数在内、偶数在外。
/// 球面系下若环的经度跨度超过 180°，先将环与待测点平移到同一分支
/// 再做判断。环可以闭合（末点重合）也可以不闭合。
#[must_use]
pub fn is_point_in_polygon_nodes(point: &Point, ring: &[Point], projection: Projection) -> bool {
    let n = if ring.len() > 1 && ring[0] == ring[ring.len() - 1] {
        ring.len() - 1
    } else {
        ring.len()
    };
    if n < 3 || !point.is_valid() {
        return false;
    }

    // 球面分支平移
    let (xs, px) = if projection.is_spherical() {
        let min_x = ring[..n]
            .iter()
            .filter(|p| p.is_valid())
            .map(|p| p.x)
            .fold(f64::MAX, f64::min);
        let max_x = ring[..n]
            .iter()
            .filter(|p| p.is_valid())
            .map(|p| p.x)
            .fold(f64::MIN, f64::max);

        if max_x - min_x > 180.0 {
            let shift = |x: f64| if x - min_x > 180.0 { x - 360.0 } else { x };
            let xs: Vec<f64> = ring[..n].iter().map(|p| shift(p.x)).collect();
            (xs, shift(point.x))
        } else {
            (ring[..n].iter().map(|p| p.x).collect(), point.x)
        }
    } else {
        (ring[..n].iter().map(|p| p.x).collect(), point.x)
    };

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = (xs[i], ring[i].y);
        let (xj, yj) = (xs[j], ring[j].y);

        if (yi > point.y) != (yj > point.y)
            && px < (xj - xi) * (point.y - yi) / (yj - yi) + xi
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// 线段相交结果
#[derive(Clone, Copy, Debug)]
pub struct SegmentCrossing {
    /// 是否相交
    pub crosses: bool,
    /// 交点坐标（不相交时无意义）
    pub intersection: Point,
    /// 两方向向量的叉积（行列式）
    pub cross_product: f64,
    /// 交点沿第一条线段的参数比
    pub ratio_first: f64,
    /// 交点沿第二条线段的参数比
    pub ratio_second: f64,
}

impl SegmentCrossing {
    fn none() -> Self {
        Self {
            crosses: false,
            intersection: Point::missing(),
            cross_product: 0.0,
            ratio_first: DOUBLE_MISSING_VALUE,
            ratio_second: DOUBLE_MISSING_VALUE,
        }
    }
}

/// 判断两条线段 `p1p2` 与 `q1q2` 是否相交
///
/// # 参数
///
/// - `endpoints_inclusive`: 端点处接触是否计为相交
///
/// 平行（行列式接近零）视为不相交。交点在原始坐标空间内按参数比
/// 线性插值得到。
#[must_use]
pub fn are_segments_crossing(
    p1: &Point,
    p2: &Point,
    q1: &Point,
    q2: &Point,
    endpoints_inclusive: bool,
    projection: Projection,
) -> SegmentCrossing {
    let x21 = dx(p1, p2, projection);
    let y21 = dy(p1, p2, projection);
    let x43 = dx(q1, q2, projection);
    let y43 = dy(q1, q2, projection);
    let x31 = dx(p1, q1, projection);
    let y31 = dy(p1, q1, projection);

    let det = x43 * y21 - x21 * y43;
    let eps = 1e-12
        * x21
            .abs()
            .max(y21.abs())
            .max(x43.abs())
            .max(y43.abs())
            .max(1.0);
    if det.abs() < eps {
        return SegmentCrossing::none();
    }

    let ratio_first = (x43 * y31 - x31 * y43) / det;
    let ratio_second = (x21 * y31 - x31 * y21) / det;

    let crosses = if endpoints_inclusive {
        (0.0..=1.0).contains(&ratio_first) && (0.0..=1.0).contains(&ratio_second)
    } else {
        ratio_first > 0.0 && ratio_first < 1.0 && ratio_second > 0.0 && ratio_second < 1.0
    };

    SegmentCrossing {
        crosses,
        intersection: Point::new(
            p1.x + ratio_first * (p2.x - p1.x),
            p1.y + ratio_first * (p2.y - p1.y),
        ),
        cross_product: det,
        ratio_first,
        ratio_second,
    }
}

/// 三角形外心（垂直平分线闭式解）
///
/// 退化三角形（三点共线）返回三点质心。
#[must_use]
pub fn circumcenter_of_triangle(
    a: &Point,
    b: &Point,
    c: &Point,
    projection: Projection,
) -> Point {
    let ux = dx(a, b, projection);
    let uy = dy(a, b, projection);
    let vx = dx(a, c, projection);
    let vy = dy(a, c, projection);

    let den = ux * vy - uy * vx;
    if den.abs() < f64::EPSILON {
        return Point::new((a.x + b.x + c.x) / 3.0, (a.y + b.y + c.y) / 3.0);
    }

    let u2 = ux * ux + uy * uy;
    let v2 = vx * vx + vy * vy;
    let local_x = (u2 * vy - v2 * uy) / (2.0 * den);
    let local_y = (v2 * ux - u2 * vx) / (2.0 * den);

    local_to_global(a, local_x, local_y, projection)
}

/// 线段单位法向量
///
/// 返回 `(-Δy, Δx)` 方向的单位向量；符号由线段方向决定，调用方
/// 对法向投影取点积时与符号无关。零长线段返回零向量。
#[must_use]
pub fn normal_vector(p1: &Point, p2: &Point, projection: Projection) -> Point {
    let delta_x = dx(p1, p2, projection);
    let delta_y = dy(p1, p2, projection);
    let len = (delta_x * delta_x + delta_y * delta_y).sqrt();
    if len < MINIMUM_DELTA_COORDINATE {
        return Point::ZERO;
    }
    Point::new(-delta_y / len, delta_x / len)
}

/// 沿给定方向将点平移一段以米计的增量
///
/// 球面系下以参考点纬度换算度增量。
pub fn add_increment_to_point(
    normal: &Point,
    increment: f64,
    reference: &Point,
    projection: Projection,
    point: &mut Point,
) {
    match projection {
        Projection::Cartesian => {
            point.x += normal.x * increment;
            point.y += normal.y * increment;
        }
        Projection::Spherical | Projection::SphericalAccurate => {
            let mean_cos = (reference.y * DEG2RAD).cos().max(1e-12);
            point.x += normal.x * increment * RAD2DEG / (EARTH_RADIUS * mean_cos);
            point.y += normal.y * increment * RAD2DEG / EARTH_RADIUS;
        }
    }
}
