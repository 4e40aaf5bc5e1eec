// crates/cm_mesh/src/triangulation.rs

//! 外部三角化服务的数据接缝
//!
//! 约束 Delaunay 三角化由外部服务完成，本模块只定义其结构化数组
//! 输出 [`TriangulationData`]，并把输出装配成网格：内角过小/过大的
//! 三角形与质心落在选区外的三角形被丢弃，其余三角形的边并入网格。

use cm_geo::constants::RAD2DEG;
use cm_geo::{operations, Point, Projection};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Edge, Mesh};
use crate::polygons::Polygons;

/// 可接纳三角形的最小内角 [deg]
const TRIANGLE_MINIMUM_ANGLE: f64 = 5.0;

/// 可接纳三角形的最大内角 [deg]
const TRIANGLE_MAXIMUM_ANGLE: f64 = 150.0;

/// 三角化服务的结构化数组输出
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TriangulationData {
    /// 每个三角形的三个节点索引
    pub face_nodes: Vec<[usize; 3]>,
    /// 每个三角形的三条边索引（指向 `edge_nodes`）
    pub face_edges: Vec<[usize; 3]>,
    /// 每条边的两个节点索引
    pub edge_nodes: Vec<[usize; 2]>,
}

impl TriangulationData {
    /// 三角形数
    #[inline]
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.face_nodes.len()
    }

    /// 边数
    #[inline]
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edge_nodes.len()
    }
}

/// 三角形内角是否全部落在可接纳区间
fn check_triangle(face_nodes: &[usize; 3], nodes: &[Point], projection: Projection) -> bool {
    const NODE_PERMUTATIONS: [[usize; 3]; 3] = [[2, 0, 1], [0, 1, 2], [1, 2, 0]];

    for permutation in &NODE_PERMUTATIONS {
        let x0 = nodes[face_nodes[permutation[0]]];
        let x1 = nodes[face_nodes[permutation[1]]];
        let x2 = nodes[face_nodes[permutation[2]]];

        let cos_phi =
            operations::normalized_inner_product_two_segments(&x1, &x0, &x1, &x2, projection);
        let phi = cos_phi.clamp(-1.0, 1.0).acos() * RAD2DEG;
        if phi < TRIANGLE_MINIMUM_ANGLE || phi > TRIANGLE_MAXIMUM_ANGLE {
            return false;
        }
    }
    true
}

impl Mesh {
    /// 把三角化服务的输出装配成网格
    ///
    /// 逐三角形做内角检查与选区包含检查（按三点均值近似质心），
    /// 通过者的三条边标记入网；最后以输入节点与入选边构造网格。
    ///
    /// # 错误
    ///
    /// 输入节点为空返回 `InvalidArgument`。
    pub fn from_polygon_triangulation(
        input_nodes: &[Point],
        polygons: &Polygons,
        triangulation: &TriangulationData,
        projection: Projection,
    ) -> MeshResult<Self> {
        if input_nodes.is_empty() {
            return Err(MeshError::invalid_argument("三角化装配: 输入节点为空"));
        }

        let mut edge_flag = vec![false; triangulation.num_edges()];
        for i in 0..triangulation.num_faces() {
            let face = &triangulation.face_nodes[i];
            if !check_triangle(face, input_nodes, projection) {
                continue;
            }

            let approximate_center =
                (input_nodes[face[0]] + input_nodes[face[1]] + input_nodes[face[2]])
                    .scale(1.0 / 3.0);
            if !polygons.is_point_in_polygon(&approximate_center, 0, projection) {
                continue;
            }

            for &edge in &triangulation.face_edges[i] {
                edge_flag[edge] = true;
            }
        }

        let edges: Vec<Edge> = triangulation
            .edge_nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| edge_flag[*i])
            .map(|(_, e)| Edge::new(e[0], e[1]))
            .collect();

        log::debug!(
            "三角化装配: {} 个候选三角形, {} 条入选边",
            triangulation.num_faces(),
            edges.len()
        );

        Ok(Self::new(edges, input_nodes.to_vec(), projection))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::administration::AdministrationOption;

    fn square_triangulation() -> (Vec<Point>, TriangulationData) {
        // 单位正方形剖成两个三角形
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let data = TriangulationData {
            face_nodes: vec![[0, 1, 2], [0, 2, 3]],
            face_edges: vec![[0, 1, 4], [4, 2, 3]],
            edge_nodes: vec![[0, 1], [1, 2], [2, 3], [3, 0], [0, 2]],
        };
        (nodes, data)
    }

    #[test]
    fn test_assemble_two_triangles() {
        let (nodes, data) = square_triangulation();
        let mut mesh = Mesh::from_polygon_triangulation(
            &nodes,
            &Polygons::new(),
            &data,
            Projection::Cartesian,
        )
        .unwrap();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_nodes(), 4);
        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.num_faces(), 2);
    }

    #[test]
    fn test_polygon_filter_drops_outside_triangles() {
        let (nodes, data) = square_triangulation();
        // 只收下三角形的质心区域
        let polygon = Polygons::from_points(vec![
            Point::new(0.0, -0.1),
            Point::new(1.5, -0.1),
            Point::new(1.5, 0.6),
            Point::new(0.0, 0.6),
        ]);
        let mut mesh =
            Mesh::from_polygon_triangulation(&nodes, &polygon, &data, Projection::Cartesian)
                .unwrap();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_faces(), 1);
    }

    #[test]
    fn test_sliver_triangle_rejected() {
        // 顶角远超 150 度的针形三角形
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 0.01),
        ];
        let data = TriangulationData {
            face_nodes: vec![[0, 1, 2]],
            face_edges: vec![[0, 1, 2]],
            edge_nodes: vec![[0, 1], [1, 2], [2, 0]],
        };
        let mesh = Mesh::from_polygon_triangulation(
            &nodes,
            &Polygons::new(),
            &data,
            Projection::Cartesian,
        )
        .unwrap();
        assert_eq!(mesh.num_edges(), 0);
    }

    #[test]
    fn test_empty_input_nodes() {
        let data = TriangulationData::default();
        assert!(Mesh::from_polygon_triangulation(
            &[],
            &Polygons::new(),
            &data,
            Projection::Cartesian
        )
        .is_err());
    }
}
