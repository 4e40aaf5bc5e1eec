// crates/cm_mesh/src/queries.rs

//! 派生查询
//!
//! 只读消费已管理网格的查询族：边界多边形提取、悬挂边、钝角三角形、
//! 小流边、对偶面、正交性、光滑度、长宽比。依赖面表的查询会先触发
//! 管理管线；管线对未变化状态幂等。

use cm_geo::constants::{is_equal, INVALID_INDEX, MINIMUM_CELL_AREA, MINIMUM_EDGE_LENGTH_SQUARED};
use cm_geo::constants::{next_circular_backward, next_circular_forward};
use cm_geo::{operations, Point, Projection, DOUBLE_MISSING_VALUE};

use crate::administration::AdministrationOption;
use crate::mesh::{Mesh, CURVILINEAR_TO_ORTHOGONAL_RATIO, NUM_NODES_QUADS};
use crate::polygons::Polygons;

impl Mesh {
    /// 悬挂边：任一端点度数不超过 1 的有效边
    pub fn get_hanging_edges(&mut self) -> Vec<usize> {
        self.administrate(AdministrationOption::EdgesOnly);

        let mut result = Vec::new();
        for (e, edge) in self.edges.iter().enumerate() {
            if !edge.is_valid() {
                continue;
            }
            if self.nodes_num_edges[edge.first] > 1 && self.nodes_num_edges[edge.second] > 1 {
                continue;
            }
            result.push(e);
        }
        result
    }

    /// 钝角三角形的质心
    ///
    /// 某条边的平方长超过其余两条之和即为钝角三角形。
    pub fn get_obtuse_triangles_centers(&mut self) -> Vec<Point> {
        self.administrate(AdministrationOption::EdgesAndFaces);

        let mut result = Vec::new();
        for f in 0..self.num_faces() {
            if self.faces_nodes[f].len() != 3 {
                continue;
            }
            let first = self.nodes[self.faces_nodes[f][0]];
            let second = self.nodes[self.faces_nodes[f][1]];
            let third = self.nodes[self.faces_nodes[f][2]];

            let first_squared = operations::squared_distance(&second, &first, self.projection);
            let second_squared = operations::squared_distance(&third, &first, self.projection);
            let third_squared = operations::squared_distance(&third, &second, self.projection);

            if first_squared > second_squared + third_squared
                || second_squared > first_squared + third_squared
                || third_squared > second_squared + first_squared
            {
                result.push(self.faces_mass_centers[f]);
            }
        }
        result
    }

    /// 流长过小的共享边
    ///
    /// 两侧外心距离低于 `threshold · (√A₀ + √A₁)/2` 的边。
    pub fn get_edges_crossing_small_flow_edges(
        &mut self,
        small_flow_edges_threshold: f64,
    ) -> Vec<usize> {
        self.administrate(AdministrationOption::EdgesAndFaces);

        let mut result = Vec::new();
        for e in 0..self.num_edges() {
            if self.edges_num_faces[e] != 2 {
                continue;
            }
            let first_face = self.edges_faces[e][0];
            let second_face = self.edges_faces[e][1];

            let flow_edge_length = operations::distance(
                &self.faces_circumcenters[first_face],
                &self.faces_circumcenters[second_face],
                self.projection,
            );
            let cut_off_distance = small_flow_edges_threshold
                * 0.5
                * (self.face_area[first_face].sqrt() + self.face_area[second_face].sqrt());

            if flow_edge_length < cut_off_distance {
                result.push(e);
            }
        }
        result
    }

    /// 给定边集的流边中点（两侧外心的中点）
    #[must_use]
    pub fn get_flow_edges_centers(&self, edges: &[usize]) -> Vec<Point> {
        edges
            .iter()
            .map(|&e| {
                let first_face = self.edges_faces[e][0];
                let second_face = self.edges_faces[e][1];
                (self.faces_circumcenters[first_face] + self.faces_circumcenters[second_face])
                    .scale(0.5)
            })
            .collect()
    }

    /// 网格边界提取为折线序列
    ///
    /// 对每条未访问的边界边（单邻接面），沿边界向两端生长折线，
    /// 拼接成连续折线后以缺失值哨兵结尾。只收集端点落在过滤选区
    /// 内的边界边；空选区收集全部。
    pub fn mesh_boundary_to_polygon(&mut self, filter_polygon: &Polygons) -> Vec<Point> {
        self.administrate(AdministrationOption::EdgesAndFaces);

        let mut is_visited = vec![false; self.num_edges()];
        let mut boundary_polygon: Vec<Point> = Vec::with_capacity(self.num_nodes());

        for e in 0..self.num_edges() {
            if is_visited[e] || !self.is_edge_on_boundary(e) {
                continue;
            }

            let edge = self.edges[e];
            let first_point = self.nodes[edge.first];
            let second_point = self.nodes[edge.second];

            let first_in = filter_polygon.contains_point(&first_point, self.projection);
            let second_in = filter_polygon.contains_point(&second_point, self.projection);
            if !first_in && !second_in {
                continue;
            }

            is_visited[e] = true;

            // 前向尾巴：从第二端点沿边界生长
            let mut forward = vec![first_point, second_point];
            let mut current_node = edge.second;
            self.walk_boundary_from_node(
                filter_polygon,
                &mut is_visited,
                &mut current_node,
                &mut forward,
            );

            // 未闭合时从第一端点反向生长，逆序拼接保持折线连续
            let mut backward: Vec<Point> = Vec::new();
            if current_node != edge.first {
                let mut current_node = edge.first;
                self.walk_boundary_from_node(
                    filter_polygon,
                    &mut is_visited,
                    &mut current_node,
                    &mut backward,
                );
            }

            boundary_polygon.extend(backward.iter().rev());
            boundary_polygon.extend(forward);
            boundary_polygon.push(Point::missing());
        }

        boundary_polygon
    }

    /// 沿边界从节点出发生长折线
    ///
    /// 访问过或非边界的边跳过；当前节点一旦落在选区外即停止。
    fn walk_boundary_from_node(
        &self,
        filter_polygon: &Polygons,
        is_visited: &mut [bool],
        current_node: &mut usize,
        polyline: &mut Vec<Point>,
    ) {
        let mut e = 0usize;
        let mut current_node_in_polygon = false;
        while e < self.nodes_num_edges[*current_node] {
            if !current_node_in_polygon {
                current_node_in_polygon =
                    filter_polygon.contains_point(&self.nodes[*current_node], self.projection);
            }
            if !current_node_in_polygon {
                break;
            }

            let current_edge = self.nodes_edges[*current_node][e];
            if is_visited[current_edge] || !self.is_edge_on_boundary(current_edge) {
                e += 1;
                continue;
            }

            *current_node = self.edges[current_edge].other_node(*current_node);
            e = 0;
            current_node_in_polygon = false;

            polyline.push(self.nodes[*current_node]);
            is_visited[current_edge] = true;
        }
    }

    /// 节点周围按关联边顺序排列的面
    ///
    /// 与 `nodes_edges[node]` 对齐：第 `e` 个条目是排序第 `e` 条关联
    /// 边与下一条关联边夹成的面，无面处为哨兵。
    #[must_use]
    pub fn sorted_faces_around_node(&self, node: usize) -> Vec<usize> {
        let num_edges = self.nodes_num_edges[node];
        let mut result = Vec::with_capacity(num_edges);

        for e in 0..num_edges {
            let first_edge = self.nodes_edges[node][e];
            if self.edges_num_faces[first_edge] == 0 {
                result.push(INVALID_INDEX);
                continue;
            }

            let ee = next_circular_forward(e, num_edges);
            let second_edge = self.nodes_edges[node][ee];
            let first_face = self.edges_faces[first_edge][0];
            let second_face = if self.edges_num_faces[first_edge] > 1 {
                self.edges_faces[first_edge][1]
            } else {
                INVALID_INDEX
            };

            // first_face 环里 first_edge 的前一条若是 second_edge，
            // 则这两条关联边夹的就是 first_face
            let face_edges = &self.faces_edges[first_face];
            let mut first_edge_index_in_face = 0;
            for (n, &fe) in face_edges.iter().enumerate() {
                if fe == first_edge {
                    first_edge_index_in_face = n;
                    break;
                }
            }
            let previous = next_circular_backward(first_edge_index_in_face, face_edges.len());

            if face_edges[previous] == second_edge {
                result.push(first_face);
            } else {
                result.push(second_face);
            }
        }

        result
    }

    /// 节点的对偶面
    ///
    /// 顶点按"关联边中点、相邻面质心"交替排列（缺面处用节点本身），
    /// 最后整体从对偶质心按 `enlargement_factor` 缩放。
    pub fn make_dual_face(&mut self, node: usize, enlargement_factor: f64) -> Vec<Point> {
        self.compute_edges_centers();

        let sorted_faces = self.sorted_faces_around_node(node);
        let num_edges = self.nodes_num_edges[node];
        let mut dual_face: Vec<Point> = Vec::with_capacity(2 * num_edges + 1);

        for e in 0..num_edges {
            let edge_index = self.nodes_edges[node][e];
            let mut edge_center = self.edges_centers[edge_index];

            if self.projection == Projection::Spherical {
                let edge = self.edges[edge_index];
                if edge.is_valid() {
                    let diff = self.nodes[edge.first].x - self.nodes[edge.second].x;
                    if diff > 180.0 {
                        edge_center.x -= 180.0;
                    }
                    if diff < -180.0 {
                        edge_center.x += 180.0;
                    }
                }
            }
            dual_face.push(edge_center);

            let face_index = sorted_faces[e];
            if face_index != INVALID_INDEX {
                dual_face.push(self.faces_mass_centers[face_index]);
            } else {
                dual_face.push(self.nodes[node]);
            }
        }
        if dual_face.is_empty() {
            return dual_face;
        }
        dual_face.push(dual_face[0]);

        let (_, mut center_of_mass, _) =
            operations::face_area_and_center_of_mass(&dual_face, self.projection);

        if self.projection == Projection::Spherical {
            if center_of_mass.x - self.nodes[node].x > 180.0 {
                center_of_mass.x -= 360.0;
            }
            if center_of_mass.x - self.nodes[node].x < -180.0 {
                center_of_mass.x += 360.0;
            }
        }

        for v in &mut dual_face {
            *v = center_of_mass + (*v - center_of_mass) * enlargement_factor;
        }
        dual_face
    }

    /// 每边正交性：边与两侧外心连线夹角余弦的绝对值
    ///
    /// 理想正交网格为 0。边界边与无面边返回缺失值。需要已完成含面
    /// 管理。
    #[must_use]
    pub fn get_orthogonality(&self) -> Vec<f64> {
        let mut result = Vec::with_capacity(self.num_edges());
        for (e, edge) in self.edges.iter().enumerate() {
            let mut val = DOUBLE_MISSING_VALUE;

            if edge.is_valid() && self.edges_num_faces[e] == 2 {
                val = operations::normalized_inner_product_two_segments(
                    &self.nodes[edge.first],
                    &self.nodes[edge.second],
                    &self.faces_circumcenters[self.edges_faces[e][0]],
                    &self.faces_circumcenters[self.edges_faces[e][1]],
                    self.projection,
                );
                if !is_equal(val, DOUBLE_MISSING_VALUE) {
                    val = val.abs();
                }
            }
            result.push(val);
        }
        result
    }

    /// 每边光滑度：两侧面面积之比（恒取不小于 1 的方向）
    ///
    /// 边界边与面积过小的面返回缺失值。需要已完成含面管理。
    #[must_use]
    pub fn get_smoothness(&self) -> Vec<f64> {
        let mut result = Vec::with_capacity(self.num_edges());
        for (e, edge) in self.edges.iter().enumerate() {
            let mut val = DOUBLE_MISSING_VALUE;

            if edge.is_valid() && self.edges_num_faces[e] == 2 {
                let left_area = self.face_area[self.edges_faces[e][0]];
                let right_area = self.face_area[self.edges_faces[e][1]];
                if left_area > MINIMUM_CELL_AREA && right_area > MINIMUM_CELL_AREA {
                    val = right_area / left_area;
                    if val < 1.0 {
                        val = 1.0 / val;
                    }
                }
            }
            result.push(val);
        }
        result
    }

    /// 每边长宽比：流长（两侧外心距离，边界边用镜像虚节点）与参考
    /// 边长之比
    ///
    /// 四边形面上参考边长取对边平均，并与正交估计按固定权重混合。
    pub fn compute_aspect_ratios(&mut self) -> Vec<f64> {
        self.administrate(AdministrationOption::EdgesAndFaces);

        let num_edges = self.num_edges();
        let mut average_edges_length = vec![[DOUBLE_MISSING_VALUE; 2]; num_edges];
        let mut average_flow_edges_length = vec![DOUBLE_MISSING_VALUE; num_edges];
        let mut curvilinear_grid_indicator = vec![true; self.num_nodes()];
        let mut edges_length = vec![0.0f64; num_edges];
        let mut aspect_ratios = vec![0.0f64; num_edges];

        for e in 0..num_edges {
            let edge = self.edges[e];
            if !edge.is_valid() || edge.first == edge.second {
                continue;
            }

            let edge_length = operations::distance(
                &self.nodes[edge.first],
                &self.nodes[edge.second],
                self.projection,
            );
            edges_length[e] = edge_length;

            let left_center = if self.edges_num_faces[e] > 0 {
                self.faces_circumcenters[self.edges_faces[e][0]]
            } else {
                self.nodes[edge.first]
            };

            let right_center = if self.edges_num_faces[e] == 2 {
                self.faces_circumcenters[self.edges_faces[e][1]]
            } else {
                // 镜像虚节点：把左外心关于边所在直线反射
                let mut dinry = operations::inner_product_two_segments(
                    &self.nodes[edge.first],
                    &self.nodes[edge.second],
                    &self.nodes[edge.first],
                    &left_center,
                    self.projection,
                );
                dinry /= (edge_length * edge_length).max(MINIMUM_EDGE_LENGTH_SQUARED);

                let x0_bc = (1.0 - dinry) * self.nodes[edge.first].x
                    + dinry * self.nodes[edge.second].x;
                let y0_bc = (1.0 - dinry) * self.nodes[edge.first].y
                    + dinry * self.nodes[edge.second].y;
                Point::new(2.0 * x0_bc - left_center.x, 2.0 * y0_bc - left_center.y)
            };

            average_flow_edges_length[e] =
                operations::distance(&left_center, &right_center, self.projection);
        }

        for f in 0..self.num_faces() {
            let num_face_nodes = self.faces_nodes[f].len();
            if num_face_nodes < 3 {
                continue;
            }

            for n in 0..num_face_nodes {
                if num_face_nodes != NUM_NODES_QUADS {
                    curvilinear_grid_indicator[self.faces_nodes[f][n]] = false;
                }
                let edge_index = self.faces_edges[f][n];
                if self.edges_num_faces[edge_index] == 0 {
                    continue;
                }

                let mut edge_length = edges_length[edge_index];
                if edge_length != 0.0 {
                    aspect_ratios[edge_index] = average_flow_edges_length[edge_index] / edge_length;
                }

                // 四边形取对边平均
                if num_face_nodes == NUM_NODES_QUADS {
                    let kkp2 = (n + 2) % num_face_nodes;
                    let klinkp2 = self.faces_edges[f][kkp2];
                    edge_length = 0.5 * (edges_length[edge_index] + edges_length[klinkp2]);
                }

                if is_equal(average_edges_length[edge_index][0], DOUBLE_MISSING_VALUE) {
                    average_edges_length[edge_index][0] = edge_length;
                } else {
                    average_edges_length[edge_index][1] = edge_length;
                }
            }
        }

        if is_equal(CURVILINEAR_TO_ORTHOGONAL_RATIO, 1.0) {
            return aspect_ratios;
        }

        for e in 0..num_edges {
            let edge = self.edges[e];
            if !edge.is_valid() || self.edges_num_faces[e] == 0 {
                continue;
            }
            // 只有四边形（曲线网格样）节点参与混合
            if !curvilinear_grid_indicator[edge.first] || !curvilinear_grid_indicator[edge.second] {
                continue;
            }

            if self.is_edge_on_boundary(e) {
                if average_edges_length[e][0] > 0.0
                    && !is_equal(average_edges_length[e][0], DOUBLE_MISSING_VALUE)
                {
                    aspect_ratios[e] = average_flow_edges_length[e] / average_edges_length[e][0];
                }
            } else if average_edges_length[e][0] > 0.0
                && average_edges_length[e][1] > 0.0
                && !is_equal(average_edges_length[e][0], DOUBLE_MISSING_VALUE)
                && !is_equal(average_edges_length[e][1], DOUBLE_MISSING_VALUE)
            {
                aspect_ratios[e] = CURVILINEAR_TO_ORTHOGONAL_RATIO * aspect_ratios[e]
                    + (1.0 - CURVILINEAR_TO_ORTHOGONAL_RATIO) * average_flow_edges_length[e]
                        / (0.5 * (average_edges_length[e][0] + average_edges_length[e][1]));
            }
        }

        aspect_ratios
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Edge;

    fn unit_square() -> Mesh {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 2),
            Edge::new(2, 3),
            Edge::new(3, 0),
        ];
        Mesh::new(edges, nodes, Projection::Cartesian)
    }

    #[test]
    fn test_hanging_edge_detected() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
            Point::new(0.5, 0.5),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 2),
            Edge::new(2, 3),
            Edge::new(3, 0),
            Edge::new(4, 0),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.nodes_types[4], -1);
        assert_eq!(mesh.get_hanging_edges(), vec![4]);
    }

    #[test]
    fn test_no_hanging_edges_in_square() {
        let mut mesh = unit_square();
        assert!(mesh.get_hanging_edges().is_empty());
    }

    #[test]
    fn test_obtuse_triangle_center() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(5.0, 0.1),
        ];
        let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);

        let centers = mesh.get_obtuse_triangles_centers();
        assert_eq!(centers.len(), 1);
        assert!((centers[0].x - 5.0).abs() < 1e-10);
        assert!((centers[0].y - 0.1 / 3.0).abs() < 1e-10);
    }

    #[test]
    fn test_acute_triangle_not_reported() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 0.8),
        ];
        let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        assert!(mesh.get_obtuse_triangles_centers().is_empty());
    }

    fn double_triangle() -> Mesh {
        // 两个三角形共享横边 (0,1)，上下对称
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 1.0),
            Point::new(0.5, -1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 2),
            Edge::new(2, 0),
            Edge::new(0, 3),
            Edge::new(3, 1),
        ];
        Mesh::new(edges, nodes, Projection::Cartesian)
    }

    #[test]
    fn test_orthogonality_symmetric_configuration() {
        let mut mesh = double_triangle();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        let orthogonality = mesh.get_orthogonality();
        // 共享边与两外心连线垂直
        assert!(orthogonality[0].abs() < 1e-10);
        // 边界边为缺失值
        assert!(is_equal(orthogonality[1], DOUBLE_MISSING_VALUE));
    }

    #[test]
    fn test_smoothness_equal_areas() {
        let mut mesh = double_triangle();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        let smoothness = mesh.get_smoothness();
        assert!((smoothness[0] - 1.0).abs() < 1e-10);
        assert!(is_equal(smoothness[1], DOUBLE_MISSING_VALUE));
    }

    #[test]
    fn test_small_flow_edges() {
        // 扁平的对三角形：外心距离远小于面尺度
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(1.0, 0.05),
            Point::new(1.0, -0.05),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 2),
            Edge::new(2, 0),
            Edge::new(0, 3),
            Edge::new(3, 1),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);

        let small = mesh.get_edges_crossing_small_flow_edges(0.2);
        assert_eq!(small, vec![0]);

        // 阈值收紧到零则不再报告
        let none = mesh.get_edges_crossing_small_flow_edges(0.0);
        assert!(none.is_empty());
    }

    #[test]
    fn test_mesh_boundary_to_polygon_square() {
        let mut mesh = unit_square();
        let boundary = mesh.mesh_boundary_to_polygon(&Polygons::new());

        // 闭合折线 + 结尾哨兵
        assert_eq!(boundary.len(), 6);
        assert!(!boundary[5].is_valid());
        assert_eq!(boundary[0], boundary[4]);
        // 四个角点都出现
        for corner in [
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
            Point::new(0.0, 1.0),
        ] {
            assert!(boundary[..5].contains(&corner));
        }
    }

    #[test]
    fn test_boundary_filter_excludes_far_edges() {
        let mut mesh = unit_square();
        // 选区远离网格，不收集任何边界
        let filter = Polygons::from_points(vec![
            Point::new(10.0, 10.0),
            Point::new(11.0, 10.0),
            Point::new(10.5, 11.0),
        ]);
        let boundary = mesh.mesh_boundary_to_polygon(&filter);
        assert!(boundary.is_empty());
    }

    #[test]
    fn test_sorted_faces_around_internal_node() {
        // 风车形：中心节点 0 周围四个三角形
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
            Point::new(0.0, -1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(0, 2),
            Edge::new(0, 3),
            Edge::new(0, 4),
            Edge::new(1, 2),
            Edge::new(2, 3),
            Edge::new(3, 4),
            Edge::new(4, 1),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        assert_eq!(mesh.num_faces(), 4);

        let sorted = mesh.sorted_faces_around_node(0);
        assert_eq!(sorted.len(), 4);
        // 内部节点周围的面互异且全部有效
        let mut unique = sorted.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), 4);
        assert!(sorted.iter().all(|&f| f != INVALID_INDEX));
    }

    #[test]
    fn test_dual_face_enclosed_node() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(-1.0, 0.0),
            Point::new(0.0, -1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(0, 2),
            Edge::new(0, 3),
            Edge::new(0, 4),
            Edge::new(1, 2),
            Edge::new(2, 3),
            Edge::new(3, 4),
            Edge::new(4, 1),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        let dual = mesh.make_dual_face(0, 1.0);
        // 四条边 × (边中点 + 面质心) + 闭合点
        assert_eq!(dual.len(), 9);
        assert_eq!(dual[0], dual[8]);

        // 对偶面应包住中心节点
        assert!(operations::is_point_in_polygon_nodes(
            &mesh.nodes[0],
            &dual[..8],
            Projection::Cartesian
        ));
    }

    #[test]
    fn test_aspect_ratio_square_is_unity() {
        let mut mesh = unit_square();
        let ratios = mesh.compute_aspect_ratios();

        // 单位正方形：流长（镜像虚节点）与边长同尺度
        for e in 0..4 {
            assert!(ratios[e] > 0.0);
            assert!((ratios[e] - 1.0).abs() < 0.5);
        }
    }
}
