// crates/cm_mesh/src/administration.rs

//! 管理管线
//!
//! 任何变异之后，派生表都可能失效；管理管线从当前节点/边数组重建
//! 它们。阶段依次为：
//!
//! 1. 无效项压实：悬空边置哨兵，无边引用的节点置缺失值，随后做
//!    稳定重映射并删除无效项（此后计数即有效计数）
//! 2. 空间索引刷新：凭脏标志惰性重建非空的节点/边 R-Tree
//! 3. 节点-边关联：跳过重复边与超出扇出上限的节点
//! 4. 角度排序：每节点关联边按外向方向角逆时针排序
//! 5. （仅边模式到此返回）
//! 6. 找面：对边数 3→6 逐级、从每个节点的每条关联边出发走
//!    "顺时针退一步"回路，提交满足全部校验的逆时针最小环
//! 7. 每面几何：面积、质心、外心
//! 8. 节点分类：悬挂 / 内部 / 边界 / 角点
//!
//! 管线对未变化的状态幂等：重复调用产生相同的派生表。

use cm_geo::constants::{INVALID_INDEX, MINIMUM_DELTA_COORDINATE};
use cm_geo::{operations, Point};
use std::f64::consts::PI;

use crate::circumcenter::compute_face_circumcenter;
use crate::mesh::{Mesh, MAX_EDGES_PER_FACE, MAX_EDGES_PER_NODE};

/// 管理级别
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrationOption {
    /// 仅重建节点-边关联与排序
    EdgesOnly,
    /// 重建全部派生表，包括面
    EdgesAndFaces,
}

impl Mesh {
    /// 运行管理管线
    ///
    /// 返回后，`option` 覆盖范围内的派生表与当前节点/边数组一致。
    pub fn administrate(&mut self, option: AdministrationOption) {
        self.delete_invalid_nodes_and_edges();

        if self.nodes_rtree_requires_update && !self.nodes_rtree.is_empty() {
            self.nodes_rtree.build(&self.nodes);
            self.nodes_rtree_requires_update = false;
        }
        if self.edges_rtree_requires_update && !self.edges_rtree.is_empty() {
            self.compute_edges_centers();
            self.edges_rtree.build(&self.edges_centers);
            self.edges_rtree_requires_update = false;
        }

        if self.nodes.is_empty() || self.edges.is_empty() {
            self.clear_derived_tables();
            return;
        }

        self.nodes_edges = vec![Vec::new(); self.nodes.len()];
        self.nodes_num_edges = vec![0; self.nodes.len()];
        self.node_administration();

        for n in 0..self.num_nodes() {
            self.sort_edges_counter_clockwise(n);
        }

        // 面表在两种模式下都先复位：仅边模式不保留过期的面数据
        self.clear_face_tables();
        self.edges_num_faces = vec![0; self.edges.len()];
        self.edges_faces = vec![[INVALID_INDEX; 2]; self.edges.len()];
        if option == AdministrationOption::EdgesOnly {
            return;
        }

        self.find_faces();
        self.compute_face_geometry();
        self.classify_nodes();
    }

    /// 清空全部派生表（空网格路径）
    fn clear_derived_tables(&mut self) {
        self.nodes_edges.clear();
        self.nodes_num_edges.clear();
        self.nodes_types.clear();
        self.nodes_nodes.clear();
        self.clear_face_tables();
        self.edges_num_faces.clear();
        self.edges_faces.clear();
    }

    fn clear_face_tables(&mut self) {
        self.faces_nodes.clear();
        self.faces_edges.clear();
        self.face_area.clear();
        self.faces_mass_centers.clear();
        self.faces_circumcenters.clear();
    }

    /// 阶段 1：无效项压实
    ///
    /// 端点缺失的边整条无效；未被任何有效边引用的节点写缺失值。
    /// 随后按原有顺序做稳定重映射，边改写为压实后的节点索引。
    pub(crate) fn delete_invalid_nodes_and_edges(&mut self) {
        let mut connected = vec![false; self.nodes.len()];
        let mut num_invalid_edges = 0usize;

        for edge in &self.edges {
            if !edge.is_valid() || edge.first >= self.nodes.len() || edge.second >= self.nodes.len()
            {
                num_invalid_edges += 1;
                continue;
            }
            connected[edge.first] = true;
            connected[edge.second] = true;
        }

        let mut num_invalid_nodes = 0usize;
        for (n, node) in self.nodes.iter_mut().enumerate() {
            if !connected[n] {
                *node = Point::missing();
            }
            if !node.is_valid() {
                num_invalid_nodes += 1;
            }
        }

        if num_invalid_edges == 0 && num_invalid_nodes == 0 {
            return;
        }

        // 稳定重映射
        let mut valid_node_indices = vec![INVALID_INDEX; self.nodes.len()];
        let mut valid_index = 0usize;
        for (n, node) in self.nodes.iter().enumerate() {
            if node.is_valid() {
                valid_node_indices[n] = valid_index;
                valid_index += 1;
            }
        }

        for edge in &mut self.edges {
            if edge.is_valid()
                && edge.first < valid_node_indices.len()
                && edge.second < valid_node_indices.len()
                && valid_node_indices[edge.first] != INVALID_INDEX
                && valid_node_indices[edge.second] != INVALID_INDEX
            {
                edge.first = valid_node_indices[edge.first];
                edge.second = valid_node_indices[edge.second];
            } else {
                *edge = crate::mesh::Edge::missing();
            }
        }

        self.nodes.retain(|n| n.is_valid());
        self.edges.retain(|e| e.is_valid());
        self.node_mask = vec![1; self.nodes.len()];

        log::debug!(
            "压实完成: 移除 {} 条无效边, {} 个无效节点",
            num_invalid_edges,
            num_invalid_nodes
        );
    }

    /// 阶段 3：节点-边关联
    fn node_administration(&mut self) {
        for e in 0..self.edges.len() {
            let edge = self.edges[e];
            if !edge.is_valid() {
                continue;
            }
            if self.nodes_num_edges[edge.first] >= MAX_EDGES_PER_NODE
                || self.nodes_num_edges[edge.second] >= MAX_EDGES_PER_NODE
            {
                log::debug!("节点关联边达到上限, 跳过边 {}", e);
                continue;
            }

            // 同一对节点之间只记录一条边
            let already_added = self.nodes_edges[edge.first]
                .iter()
                .any(|&other| self.edges[other].other_node(edge.first) == edge.second);
            if !already_added {
                self.nodes_edges[edge.first].push(e);
                self.nodes_num_edges[edge.first] += 1;
            }

            let already_added = self.nodes_edges[edge.second]
                .iter()
                .any(|&other| self.edges[other].other_node(edge.second) == edge.first);
            if !already_added {
                self.nodes_edges[edge.second].push(e);
                self.nodes_num_edges[edge.second] += 1;
            }
        }
    }

    /// 阶段 4：按外向方向角逆时针排序节点关联边
    ///
    /// 角度相对列表首条边的方向角计算并回绕到 `[0, 2π)`；两个坐标
    /// 差都低于下限时按 Δy 符号强制取 ±π/2。
    fn sort_edges_counter_clockwise(&mut self, node: usize) {
        if !self.nodes[node].is_valid() {
            return;
        }

        let degree = self.nodes_num_edges[node];
        if degree < 2 {
            return;
        }

        let mut phi0 = 0.0;
        let mut angles = vec![0.0f64; degree];
        for (i, &edge_index) in self.nodes_edges[node].iter().enumerate() {
            let edge = self.edges[edge_index];
            let other = edge.other_node(node);
            if other == INVALID_INDEX {
                continue;
            }

            let delta_x = operations::dx(&self.nodes[node], &self.nodes[other], self.projection);
            let delta_y = operations::dy(&self.nodes[node], &self.nodes[other], self.projection);
            let phi = if delta_x.abs() < MINIMUM_DELTA_COORDINATE
                && delta_y.abs() < MINIMUM_DELTA_COORDINATE
            {
                if delta_y < 0.0 { -PI / 2.0 } else { PI / 2.0 }
            } else {
                delta_y.atan2(delta_x)
            };

            if i == 0 {
                phi0 = phi;
            }
            let mut angle = phi - phi0;
            if angle < 0.0 {
                angle += 2.0 * PI;
            }
            angles[i] = angle;
        }

        let mut order: Vec<usize> = (0..degree).collect();
        order.sort_by(|&a, &b| angles[a].partial_cmp(&angles[b]).unwrap_or(std::cmp::Ordering::Equal));

        let copy = self.nodes_edges[node].clone();
        for (i, &j) in order.iter().enumerate() {
            self.nodes_edges[node][i] = copy[j];
        }
    }

    /// 阶段 6：找面
    ///
    /// 对每个目标边数、每个节点、每条关联边发起一次回路尝试。
    fn find_faces(&mut self) {
        for num_edges_per_face in 3..=MAX_EDGES_PER_FACE {
            let mut edges_buf = vec![0usize; num_edges_per_face];
            let mut nodes_buf = vec![0usize; num_edges_per_face];
            for node in 0..self.num_nodes() {
                if !self.nodes[node].is_valid() {
                    continue;
                }
                for e in 0..self.nodes_num_edges[node] {
                    let first_edge = self.nodes_edges[node][e];
                    self.find_faces_walk(
                        node,
                        node,
                        0,
                        first_edge,
                        num_edges_per_face,
                        &mut edges_buf,
                        &mut nodes_buf,
                    );
                }
            }
        }
    }

    /// 回路行走一步
    ///
    /// 进入边 `previous_edge` 抵达节点 `node` 的对端后，下一条边取
    /// 对端节点排序关联表中 `previous_edge` 顺时针方向的紧邻者
    /// （索引减一回绕），即"最左转"规则，发现的是最小包围环。
    #[allow(clippy::too_many_arguments)]
    fn find_faces_walk(
        &mut self,
        start_node: usize,
        node: usize,
        index: usize,
        previous_edge: usize,
        num_closing_edges: usize,
        edges_buf: &mut Vec<usize>,
        nodes_buf: &mut Vec<usize>,
    ) {
        if index >= num_closing_edges {
            return;
        }
        if !self.edges[previous_edge].is_valid() {
            return;
        }
        if self.edges_num_faces[previous_edge] >= 2 {
            return;
        }

        edges_buf[index] = previous_edge;
        nodes_buf[index] = node;

        let other_node = self.edges[previous_edge].other_node(node);
        if other_node == INVALID_INDEX {
            return;
        }

        if other_node == start_node && index == num_closing_edges - 1 {
            self.commit_face(edges_buf, nodes_buf);
            return;
        }

        let degree = self.nodes_num_edges[other_node];
        if degree == 0 {
            return;
        }
        let mut position = 0usize;
        for e in 0..degree {
            if self.nodes_edges[other_node][e] == previous_edge {
                position = e;
                break;
            }
        }
        let position = if position == 0 { degree - 1 } else { position - 1 };
        let next_edge = self.nodes_edges[other_node][position];

        self.find_faces_walk(
            start_node,
            other_node,
            index + 1,
            next_edge,
            num_closing_edges,
            edges_buf,
            nodes_buf,
        );
    }

    /// 校验候选环并提交为新面
    ///
    /// 提交条件：节点互异；每条边邻接面数不足 2；若所有边都已有一个
    /// 邻接面，则这些面必须互异（排除外部环的重复接纳）；环的有符号
    /// 面积为正（逆时针）。
    fn commit_face(&mut self, edges_cycle: &[usize], nodes_cycle: &[usize]) {
        let mut sorted_nodes = nodes_cycle.to_vec();
        sorted_nodes.sort_unstable();
        if sorted_nodes.windows(2).any(|w| w[0] == w[1]) {
            return;
        }

        let one_edge_has_no_face = edges_cycle
            .iter()
            .any(|&e| self.edges_num_faces[e] == 0);
        if !one_edge_has_no_face {
            let mut sorted_faces: Vec<usize> = edges_cycle
                .iter()
                .map(|&e| self.edges_faces[e][0])
                .collect();
            sorted_faces.sort_unstable();
            if sorted_faces.windows(2).any(|w| w[0] == w[1]) {
                return;
            }
        }

        let mut ring: Vec<Point> = nodes_cycle.iter().map(|&n| self.nodes[n]).collect();
        ring.push(ring[0]);
        let (area, center_of_mass, is_counter_clockwise) =
            operations::face_area_and_center_of_mass(&ring, self.projection);
        if !is_counter_clockwise {
            return;
        }

        let new_face = self.faces_nodes.len();
        for &e in edges_cycle {
            self.edges_num_faces[e] += 1;
            let slot = self.edges_num_faces[e] - 1;
            self.edges_faces[e][slot] = new_face;
        }
        self.faces_nodes.push(nodes_cycle.to_vec());
        self.faces_edges.push(edges_cycle.to_vec());
        self.face_area.push(area);
        self.faces_mass_centers.push(center_of_mass);
    }

    /// 阶段 7：每面外心
    ///
    /// 面积与质心已在提交时算得；外心对无内部边的面退化为质心，
    /// 其余交给迭代求解器。
    fn compute_face_geometry(&mut self) {
        self.faces_circumcenters = vec![Point::ZERO; self.num_faces()];
        let mut num_edge_faces_cache: Vec<usize> = Vec::with_capacity(MAX_EDGES_PER_FACE);

        for f in 0..self.num_faces() {
            let mut polygon = self.face_closed_polygon(f);

            let num_interior_edges = self.faces_edges[f]
                .iter()
                .filter(|&&e| self.edges_num_faces[e] == 2)
                .count();
            if num_interior_edges == 0 {
                self.faces_circumcenters[f] = self.faces_mass_centers[f];
                continue;
            }

            num_edge_faces_cache.clear();
            for &e in &self.faces_edges[f] {
                num_edge_faces_cache.push(self.edges_num_faces[e]);
            }

            self.faces_circumcenters[f] =
                compute_face_circumcenter(&mut polygon, &num_edge_faces_cache, self.projection);
        }
    }

    /// 阶段 8：节点分类
    ///
    /// 先按边界关联计数：孤立边（无邻接面）把两端直接标为悬挂；
    /// 边界边给两端计数加一。随后按计数与度数定型，两条边界边夹角
    /// 余弦超过 -0.25 的边界节点升级为角点。
    fn classify_nodes(&mut self) {
        self.nodes_types = vec![0; self.num_nodes()];

        for (e, edge) in self.edges.iter().enumerate() {
            if !edge.is_valid() {
                continue;
            }
            if self.nodes_types[edge.first] == -1 || self.nodes_types[edge.second] == -1 {
                continue;
            }
            if self.edges_num_faces[e] == 0 {
                self.nodes_types[edge.first] = -1;
                self.nodes_types[edge.second] = -1;
            }
            if self.edges_num_faces[e] == 1 {
                self.nodes_types[edge.first] += 1;
                self.nodes_types[edge.second] += 1;
            }
        }

        for n in 0..self.num_nodes() {
            if self.nodes_types[n] == 1 || self.nodes_types[n] == 2 {
                if self.nodes_num_edges[n] == 2 {
                    self.nodes_types[n] = 3;
                } else {
                    let mut first_node = INVALID_INDEX;
                    let mut second_node = INVALID_INDEX;
                    for i in 0..self.nodes_num_edges[n] {
                        let edge_index = self.nodes_edges[n][i];
                        if !self.is_edge_on_boundary(edge_index) {
                            continue;
                        }
                        if first_node == INVALID_INDEX {
                            first_node = self.edges[edge_index].other_node(n);
                        } else {
                            second_node = self.edges[edge_index].other_node(n);
                            break;
                        }
                    }

                    self.nodes_types[n] = 2;
                    if first_node != INVALID_INDEX && second_node != INVALID_INDEX {
                        let cos_phi = operations::normalized_inner_product_two_segments(
                            &self.nodes[n],
                            &self.nodes[first_node],
                            &self.nodes[n],
                            &self.nodes[second_node],
                            self.projection,
                        );
                        // 角点余弦阈值
                        if cos_phi > -0.25 {
                            self.nodes_types[n] = 3;
                        }
                    }
                }
            } else if self.nodes_types[n] > 2 {
                self.nodes_types[n] = 3;
            } else if self.nodes_types[n] != -1 {
                self.nodes_types[n] = 1;
            }

            if self.nodes_num_edges[n] < 2 {
                self.nodes_types[n] = -1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Edge;
    use cm_geo::Projection;

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
    fn test_unit_square_single_face() {
        let mut mesh = unit_square();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_faces(), 1);
        assert!((mesh.face_area[0] - 1.0).abs() < 1e-12);
        assert!((mesh.faces_mass_centers[0].x - 0.5).abs() < 1e-12);
        assert!((mesh.faces_circumcenters[0].x - 0.5).abs() < 1e-12);
        assert!((mesh.faces_circumcenters[0].y - 0.5).abs() < 1e-12);

        for e in 0..4 {
            assert_eq!(mesh.edges_num_faces[e], 1);
        }
        // 四个节点全是角点
        for n in 0..4 {
            assert_eq!(mesh.nodes_types[n], 3);
        }
    }

    #[test]
    fn test_face_cycle_is_ccw_rotation() {
        let mut mesh = unit_square();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        let cycle = &mesh.faces_nodes[0];
        assert_eq!(cycle.len(), 4);
        let start = cycle.iter().position(|&n| n == 0).unwrap();
        let rotated: Vec<usize> = (0..4).map(|i| cycle[(start + i) % 4]).collect();
        assert_eq!(rotated, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_two_triangles_share_edge() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 2),
            Edge::new(2, 0),
            Edge::new(1, 3),
            Edge::new(3, 2),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_faces(), 2);
        // 共享边 (1,2) 有两个互异的邻接面
        assert_eq!(mesh.edges_num_faces[1], 2);
        assert_ne!(mesh.edges_faces[1][0], mesh.edges_faces[1][1]);
    }

    #[test]
    fn test_administration_idempotent() {
        let mut mesh = unit_square();
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        let faces_nodes = mesh.faces_nodes.clone();
        let nodes_edges = mesh.nodes_edges.clone();
        let edges_faces = mesh.edges_faces.clone();
        let types = mesh.nodes_types.clone();

        mesh.administrate(AdministrationOption::EdgesAndFaces);
        assert_eq!(mesh.faces_nodes, faces_nodes);
        assert_eq!(mesh.nodes_edges, nodes_edges);
        assert_eq!(mesh.edges_faces, edges_faces);
        assert_eq!(mesh.nodes_types, types);
    }

    #[test]
    fn test_empty_mesh_administration_is_noop() {
        let mut mesh = Mesh::empty(Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        assert_eq!(mesh.num_nodes(), 0);
        assert_eq!(mesh.num_edges(), 0);
        assert_eq!(mesh.num_faces(), 0);
    }

    #[test]
    fn test_compaction_remaps_edges() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::missing(), // 会被压实掉
            Point::new(1.0, 0.0),
            Point::new(1.0, 1.0),
        ];
        let edges = vec![Edge::new(0, 2), Edge::new(2, 3), Edge::new(3, 0)];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_nodes(), 3);
        assert_eq!(mesh.num_edges(), 3);
        assert_eq!(mesh.num_faces(), 1);
        for edge in &mesh.edges {
            assert!(edge.first < 3 && edge.second < 3);
        }
    }

    #[test]
    fn test_unconnected_node_is_pruned() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 1.0),
            Point::new(9.0, 9.0), // 无边引用
        ];
        let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        assert_eq!(mesh.num_nodes(), 3);
    }

    #[test]
    fn test_angular_sort_non_decreasing() {
        // 五条边呈星形
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 1.0),
            Point::new(-0.5, 1.0),
            Point::new(-1.0, -0.2),
            Point::new(0.3, -1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(0, 2),
            Edge::new(0, 3),
            Edge::new(0, 4),
            Edge::new(0, 5),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesOnly);

        // 相邻关联边的回绕角非降
        let node = 0;
        let first_edge = mesh.nodes_edges[node][0];
        let reference = {
            let other = mesh.edges[first_edge].other_node(node);
            let d = mesh.nodes[other] - mesh.nodes[node];
            d.y.atan2(d.x)
        };
        let mut previous = -1.0;
        for &e in &mesh.nodes_edges[node] {
            let other = mesh.edges[e].other_node(node);
            let d = mesh.nodes[other] - mesh.nodes[node];
            let mut angle = d.y.atan2(d.x) - reference;
            if angle < 0.0 {
                angle += 2.0 * PI;
            }
            assert!(angle >= previous);
            previous = angle;
        }
    }

    #[test]
    fn test_duplicate_edges_recorded_once() {
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(0.5, 1.0),
        ];
        let edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 0), // 同一对节点的重复边
            Edge::new(1, 2),
            Edge::new(2, 0),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesOnly);
        assert_eq!(mesh.nodes_num_edges[0], 2);
        assert_eq!(mesh.nodes_num_edges[1], 2);
    }
}
