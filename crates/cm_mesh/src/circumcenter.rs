// crates/cm_mesh/src/circumcenter.rs

//! 面外心迭代求解
//!
//! 外心是面的"水动力中心"：三角形取精确外心；多边形从质心出发，
//! 反复向各内部边中点的外法线做投影修正，收敛后再做包含性回退，
//! 保证返回点落在面内。
//!
//! 收敛阈值依投影选取：平面系 1e-3 m，球面系 9e-10 度量级。

use cm_geo::constants::next_circular_forward;
use cm_geo::{operations, Point, Projection};

use crate::mesh::{NUM_NODES_IN_TRIANGLE, WEIGHT_CIRCUMCENTER};

/// 迭代上限
const MAX_CIRCUMCENTER_ITERATIONS: usize = 100;

/// 计算面外心
///
/// # 参数
///
/// - `polygon`: 面的闭合环（末点重复首点）。包含性测试阶段会把环
///   顶点向质心收缩，调用方应传入可覆写的缓存
/// - `edges_num_faces`: 环上每条边的邻接面数，长度等于环的边数
///
/// # 返回
///
/// 位于面内的外心估计。内部边不足两条时退化为顶点均值。
#[must_use]
pub fn compute_face_circumcenter(
    polygon: &mut [Point],
    edges_num_faces: &[usize],
    projection: Projection,
) -> Point {
    let eps = if projection == Projection::Cartesian {
        1e-3
    } else {
        9e-10
    };
    let num_nodes = polygon.len() - 1;

    let mut center_of_mass = Point::ZERO;
    for p in polygon.iter().take(num_nodes) {
        center_of_mass = center_of_mass + *p;
    }
    let center_of_mass = center_of_mass.scale(1.0 / num_nodes as f64);

    let mut result = center_of_mass;
    if num_nodes == NUM_NODES_IN_TRIANGLE {
        result =
            operations::circumcenter_of_triangle(&polygon[0], &polygon[1], &polygon[2], projection);
    } else if !edges_num_faces.is_empty() {
        let num_interior_edges = edges_num_faces.iter().filter(|&&n| n == 2).count();

        if num_interior_edges > 1 {
            let mut middle_points = Vec::with_capacity(num_nodes);
            let mut normals = Vec::with_capacity(num_nodes);
            for n in 0..num_nodes {
                if edges_num_faces[n] != 2 {
                    continue;
                }
                let next = next_circular_forward(n, num_nodes);
                middle_points.push((polygon[n] + polygon[next]).scale(0.5));
                normals.push(operations::normal_vector(
                    &polygon[n],
                    &polygon[next],
                    projection,
                ));
            }

            let mut estimated = center_of_mass;
            for iteration in 0..MAX_CIRCUMCENTER_ITERATIONS {
                let previous = estimated;
                for (middle, normal) in middle_points.iter().zip(&normals) {
                    let delta_x = operations::dx(middle, &estimated, projection);
                    let delta_y = operations::dy(middle, &estimated, projection);
                    let increment = -0.1 * (delta_x * normal.x + delta_y * normal.y);
                    operations::add_increment_to_point(
                        normal,
                        increment,
                        &center_of_mass,
                        projection,
                        &mut estimated,
                    );
                }
                if iteration > 0
                    && (estimated.x - previous.x).abs() < eps
                    && (estimated.y - previous.y).abs() < eps
                {
                    result = estimated;
                    break;
                }
            }
        }
    }

    // 顶点向质心收缩后做包含性测试
    for p in polygon.iter_mut().take(num_nodes) {
        *p = p.scale(WEIGHT_CIRCUMCENTER) + center_of_mass.scale(1.0 - WEIGHT_CIRCUMCENTER);
    }

    if operations::is_point_in_polygon_nodes(&result, &polygon[..num_nodes], projection) {
        return result;
    }

    for n in 0..num_nodes {
        let next = next_circular_forward(n, num_nodes);
        let crossing = operations::are_segments_crossing(
            &center_of_mass,
            &result,
            &polygon[n],
            &polygon[next],
            false,
            projection,
        );
        if crossing.crosses {
            return crossing.intersection;
        }
    }

    result
}
