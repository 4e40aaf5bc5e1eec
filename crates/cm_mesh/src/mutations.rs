// crates/cm_mesh/src/mutations.rs

//! 变异操作
//!
//! 所有变异都以追加或写哨兵的方式修改规范数组，置相应脏标志，
//! 并使网格处于"待管理"状态；调用方持有的索引在下一次压实前保持
//! 有效。失败的变异不破坏压实前不变量，修正输入后可重试。

use cm_geo::constants::{is_equal, INVALID_INDEX};
use cm_geo::projection::is_point_on_pole;
use cm_geo::{operations, Point, SpatialIndex};

use crate::administration::AdministrationOption;
use crate::error::{MeshError, MeshResult};
use crate::mesh::{Edge, Mesh, MAX_EDGES_PER_NODE, NUM_NODES_IN_TRIANGLE};
use crate::polygons::Polygons;

/// 多边形删除模式
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionOption {
    /// 删除选区内的所有节点
    AllNodesInside,
    /// 删除两侧外心都在选区内的边
    FacesWithIncludedCircumcenters,
    /// 删除完全落入选区的面
    FacesCompletelyIncluded,
}

impl Mesh {
    /// 插入节点，返回新索引
    pub fn insert_node(&mut self, new_point: Point) -> usize {
        let new_node_index = self.nodes.len();
        self.nodes.push(new_point);
        self.node_mask.push(1);
        self.nodes_edges.push(Vec::new());
        self.nodes_num_edges.push(0);

        self.nodes_rtree_requires_update = true;
        new_node_index
    }

    /// 删除节点：级联失效全部关联边，节点写缺失值
    ///
    /// # 错误
    ///
    /// 索引越界返回 `InvalidArgument`。对已缺失节点为空操作。
    pub fn delete_node(&mut self, node_index: usize) -> MeshResult<()> {
        if node_index >= self.num_nodes() {
            return Err(MeshError::invalid_argument("删除节点: 索引不存在"));
        }

        if node_index < self.nodes_edges.len() {
            let incident: Vec<usize> = self.nodes_edges[node_index].clone();
            for edge_index in incident {
                self.delete_edge(edge_index)?;
            }
        }
        self.nodes[node_index] = Point::missing();

        self.nodes_rtree_requires_update = true;
        Ok(())
    }

    /// 连接两个节点
    ///
    /// 已存在同对边时返回 `Ok(None)`，否则追加新边并返回其索引。
    ///
    /// # 错误
    ///
    /// 任一索引越界返回 `InvalidArgument`。
    pub fn connect_nodes(
        &mut self,
        start_node: usize,
        end_node: usize,
    ) -> MeshResult<Option<usize>> {
        if start_node >= self.num_nodes() || end_node >= self.num_nodes() {
            return Err(MeshError::invalid_argument("连接节点: 索引不存在"));
        }
        if self.find_edge(start_node, end_node).is_some() {
            return Ok(None);
        }

        let new_edge_index = self.edges.len();
        self.edges.push(Edge::new(start_node, end_node));

        self.edges_rtree_requires_update = true;
        Ok(Some(new_edge_index))
    }

    /// 删除边：写哨兵失效
    ///
    /// # 错误
    ///
    /// 索引为哨兵或越界返回 `InvalidArgument`。
    pub fn delete_edge(&mut self, edge_index: usize) -> MeshResult<()> {
        if edge_index == INVALID_INDEX || edge_index >= self.num_edges() {
            return Err(MeshError::invalid_argument("删除边: 索引不存在"));
        }

        self.edges[edge_index] = Edge::missing();

        self.edges_rtree_requires_update = true;
        Ok(())
    }

    /// 把 `first_node` 并入 `second_node`
    ///
    /// 两节点之间的边失效；`first` 的邻居与 `second` 之间已有的重复边
    /// 失效；`first` 的其余关联边端点改写为 `second`；`first` 写缺失
    /// 值。自合并与对已缺失节点的重复调用都是空操作。
    ///
    /// # 错误
    ///
    /// 任一索引越界返回 `InvalidArgument`。
    pub fn merge_two_nodes(&mut self, first_node: usize, second_node: usize) -> MeshResult<()> {
        if first_node >= self.num_nodes() || second_node >= self.num_nodes() {
            return Err(MeshError::invalid_argument("合并节点: 索引不存在"));
        }
        if first_node == second_node {
            return Ok(());
        }

        if let Some(edge_index) = self.find_edge(first_node, second_node) {
            self.edges[edge_index] = Edge::missing();
        }

        // first 的邻居若已连向 second，该重复边失效
        if first_node < self.nodes_edges.len() {
            for n in 0..self.nodes_num_edges[first_node] {
                let first_edge_index = self.nodes_edges[first_node][n];
                let other = self.edges[first_edge_index].other_node(first_node);
                if other == INVALID_INDEX || other == second_node {
                    continue;
                }
                for nn in 0..self.nodes_num_edges[other] {
                    let second_edge_index = self.nodes_edges[other][nn];
                    if self.edges[second_edge_index].other_node(other) == second_node {
                        self.edges[second_edge_index] = Edge::missing();
                    }
                }
            }
        }

        // second 现存的有效关联边
        let mut second_node_edges = Vec::with_capacity(MAX_EDGES_PER_NODE);
        if second_node < self.nodes_edges.len() {
            for n in 0..self.nodes_num_edges[second_node] {
                let edge_index = self.nodes_edges[second_node][n];
                if self.edges[edge_index].is_valid() {
                    second_node_edges.push(edge_index);
                }
            }
        }

        // first 的有效关联边改挂到 second
        if first_node < self.nodes_edges.len() {
            for n in 0..self.nodes_num_edges[first_node] {
                let edge_index = self.nodes_edges[first_node][n];
                if self.edges[edge_index].is_valid() {
                    second_node_edges.push(edge_index);
                    if self.edges[edge_index].first == first_node {
                        self.edges[edge_index].first = second_node;
                    }
                    if self.edges[edge_index].second == first_node {
                        self.edges[edge_index].second = second_node;
                    }
                }
            }
            self.nodes_edges[first_node].clear();
            self.nodes_num_edges[first_node] = 0;
        }

        if second_node < self.nodes_edges.len() {
            self.nodes_num_edges[second_node] = second_node_edges.len();
            self.nodes_edges[second_node] = second_node_edges;
        }

        self.nodes[first_node] = Point::missing();

        self.nodes_rtree_requires_update = true;
        self.edges_rtree_requires_update = true;
        Ok(())
    }

    /// 合并选区内相互距离小于 `merging_distance` 的节点
    ///
    /// 对选区内节点建局部 R-Tree；对每个节点，把半径内的其他节点
    /// 逐一并入当前节点。完成后按仅边模式重新管理。
    pub fn merge_nodes_in_polygon(
        &mut self,
        polygon: &Polygons,
        merging_distance: f64,
    ) -> MeshResult<()> {
        self.administrate(AdministrationOption::EdgesOnly);

        let mut filtered_nodes = Vec::new();
        let mut original_indices = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_valid() && polygon.contains_point(node, self.projection) {
                filtered_nodes.push(*node);
                original_indices.push(i);
            }
        }

        let mut nodes_rtree = SpatialIndex::new();
        nodes_rtree.build(&filtered_nodes);

        let merging_distance_squared = merging_distance * merging_distance;
        for i in 0..filtered_nodes.len() {
            nodes_rtree
                .nearest_neighbors_within_squared_distance(&filtered_nodes[i], merging_distance_squared);

            let result_size = nodes_rtree.query_result_size();
            if result_size <= 1 {
                continue;
            }
            let neighbours: Vec<usize> = (0..result_size)
                .map(|j| nodes_rtree.query_result(j))
                .collect();
            for neighbour in neighbours {
                if neighbour == i {
                    continue;
                }
                // 邻居并入当前节点
                self.merge_two_nodes(original_indices[neighbour], original_indices[i])?;
                nodes_rtree.remove_by_position(neighbour);
            }
        }

        self.administrate(AdministrationOption::EdgesOnly);
        Ok(())
    }

    /// 移动节点：径向余弦衰减拖拽
    ///
    /// 目标节点整体位移到 `new_point`，其余节点按与目标节点的距离
    /// 衰减跟随：`δ = 0.5 (1 + cos(π · min(d/L, 1)))`。
    ///
    /// # 错误
    ///
    /// 索引越界或节点已缺失返回 `InvalidArgument`。
    pub fn move_node(&mut self, new_point: Point, node_index: usize) -> MeshResult<()> {
        if node_index >= self.num_nodes() || !self.nodes[node_index].is_valid() {
            return Err(MeshError::invalid_argument("移动节点: 索引不存在"));
        }

        let node_to_move = self.nodes[node_index];
        let total_distance = operations::distance(&node_to_move, &new_point, self.projection);
        if total_distance == 0.0 {
            return Ok(());
        }

        let shift = new_point - node_to_move;
        for node in &mut self.nodes {
            if !node.is_valid() {
                continue;
            }
            let current_distance = operations::distance(node, &node_to_move, self.projection);
            let factor = 0.5
                * (1.0
                    + ((current_distance / total_distance).min(1.0) * std::f64::consts::PI).cos());
            node.x += shift.x * factor;
            node.y += shift.y * factor;
        }

        self.nodes_rtree_requires_update = true;
        self.edges_rtree_requires_update = true;
        Ok(())
    }

    /// 按多边形选区删除网格
    pub fn delete_mesh_in_polygon(
        &mut self,
        polygons: &Polygons,
        deletion_option: DeletionOption,
        invert_deletion: bool,
    ) -> MeshResult<()> {
        match deletion_option {
            DeletionOption::AllNodesInside => {
                for node in &mut self.nodes {
                    let mut in_polygon = polygons.contains_point(node, self.projection);
                    if invert_deletion {
                        in_polygon = !in_polygon;
                    }
                    if in_polygon {
                        *node = Point::missing();
                    }
                }
            }

            DeletionOption::FacesWithIncludedCircumcenters => {
                self.administrate(AdministrationOption::EdgesAndFaces);

                for e in 0..self.num_edges() {
                    let num_edge_faces = self.edges_num_faces[e];

                    let mut all_circumcenters_in_polygon = true;
                    for f in 0..num_edge_faces {
                        let face_index = self.edges_faces[e][f];
                        if face_index == INVALID_INDEX {
                            continue;
                        }
                        let mut in_polygon = polygons
                            .contains_point(&self.faces_circumcenters[face_index], self.projection);
                        if invert_deletion {
                            in_polygon = !in_polygon;
                        }
                        if !in_polygon {
                            all_circumcenters_in_polygon = false;
                            break;
                        }
                    }

                    // 无面可依的孤立边按边中点判断
                    if num_edge_faces == 0 {
                        let edge = self.edges[e];
                        if !edge.is_valid() {
                            continue;
                        }
                        let edge_center =
                            (self.nodes[edge.first] + self.nodes[edge.second]).scale(0.5);
                        all_circumcenters_in_polygon =
                            polygons.contains_point(&edge_center, self.projection);
                        if invert_deletion {
                            all_circumcenters_in_polygon = !all_circumcenters_in_polygon;
                        }
                    }

                    if all_circumcenters_in_polygon {
                        self.edges[e] = Edge::missing();
                    }
                }
            }

            DeletionOption::FacesCompletelyIncluded => {
                self.mask_face_edges_in_polygon(polygons, invert_deletion, false);
                for e in 0..self.num_edges() {
                    if self.edge_mask[e] == 1 {
                        self.edges[e] = Edge::missing();
                    }
                }
            }
        }

        self.nodes_rtree_requires_update = true;
        self.edges_rtree_requires_update = true;

        self.administrate(AdministrationOption::EdgesOnly);
        Ok(())
    }

    /// 把"完全落入选区的面"的边写入边掩码
    ///
    /// `include_intersected` 为真时放宽为"任一端点在选区内"。
    /// `invert_selection` 反转最终选择。
    pub fn mask_face_edges_in_polygon(
        &mut self,
        polygons: &Polygons,
        invert_selection: bool,
        include_intersected: bool,
    ) {
        self.administrate(AdministrationOption::EdgesAndFaces);

        self.node_mask = vec![0; self.num_nodes()];
        for (n, node) in self.nodes.iter().enumerate() {
            if polygons.contains_point(node, self.projection) {
                self.node_mask[n] = 1;
            }
        }

        let mut edge_mask = vec![0; self.num_edges()];
        for (e, edge) in self.edges.iter().enumerate() {
            let first_in = edge.first != INVALID_INDEX && self.node_mask[edge.first] == 1;
            let second_in = edge.second != INVALID_INDEX && self.node_mask[edge.second] == 1;
            let included = if include_intersected {
                first_in || second_in
            } else {
                first_in && second_in
            };
            edge_mask[e] = i32::from(included);
        }

        // 面里只要有一条边不入选，整个面的边全部退选
        let mut second_edge_mask = edge_mask.clone();
        if !include_intersected {
            for f in 0..self.num_faces() {
                let one_edge_not_included = self.faces_edges[f]
                    .iter()
                    .any(|&e| e != INVALID_INDEX && edge_mask[e] == 0);
                if one_edge_not_included {
                    for &e in &self.faces_edges[f] {
                        if e != INVALID_INDEX {
                            second_edge_mask[e] = 0;
                        }
                    }
                }
            }
        }

        if invert_selection {
            for e in 0..self.num_edges() {
                if second_edge_mask[e] == 0 {
                    second_edge_mask[e] = 1;
                }
                if edge_mask[e] == 1 {
                    second_edge_mask[e] = 0;
                }
            }
        }

        self.edge_mask = second_edge_mask;
    }

    /// 网格并集：把 `other` 的节点与边拼接进来
    ///
    /// 边端点按本网格并集前的节点数整体平移。完成后按含面模式管理，
    /// 节点掩码重置为全选。
    ///
    /// # 错误
    ///
    /// 投影不同或 `other` 为空返回 `InvalidArgument`。
    pub fn union_with(&mut self, other: &Mesh) -> MeshResult<()> {
        if self.projection != other.projection
            || other.num_nodes() == 0
            || other.num_edges() == 0
        {
            return Err(MeshError::invalid_argument("网格并集: 两个网格无法合并"));
        }

        let node_offset = self.nodes.len();
        self.nodes.extend_from_slice(&other.nodes);
        for edge in &other.edges {
            if edge.is_valid() {
                self.edges
                    .push(Edge::new(edge.first + node_offset, edge.second + node_offset));
            } else {
                self.edges.push(Edge::missing());
            }
        }

        self.nodes_rtree_requires_update = true;
        self.edges_rtree_requires_update = true;

        self.administrate(AdministrationOption::EdgesAndFaces);
        self.node_mask = vec![1; self.nodes.len()];
        Ok(())
    }

    /// 把多于三边的面扇形剖分为三角形
    pub fn triangulate_faces(&mut self) -> MeshResult<()> {
        for f in 0..self.num_faces() {
            let num_edges = self.num_face_edges(f);
            if num_edges < 4 {
                continue;
            }
            let first_node = self.faces_nodes[f][0];
            for j in 2..num_edges - 1 {
                let node_index = self.faces_nodes[f][j];
                self.connect_nodes(first_node, node_index)?;
            }
        }

        self.edges_rtree_requires_update = true;
        Ok(())
    }

    /// 塌缩退化三角形（三点共线）
    ///
    /// 退化面的三条边失效，三个节点并为一个，幸存节点落在面质心。
    pub fn delete_degenerated_triangles(&mut self) -> MeshResult<()> {
        self.administrate(AdministrationOption::EdgesAndFaces);

        let mut degenerated_triangles = Vec::new();
        for f in 0..self.num_faces() {
            if self.faces_nodes[f].len() != NUM_NODES_IN_TRIANGLE {
                continue;
            }
            let mut first_node = self.faces_nodes[f][0];
            let mut second_node = self.faces_nodes[f][1];
            let mut third_node = self.faces_nodes[f][2];

            // 极点上的参考点会让坐标差退化，轮转一位避开
            if self.projection.is_spherical() && is_point_on_pole(&self.nodes[first_node]) {
                let saved = first_node;
                first_node = second_node;
                second_node = third_node;
                third_node = saved;
            }

            let dx2 = operations::dx(
                &self.nodes[first_node],
                &self.nodes[second_node],
                self.projection,
            );
            let dy2 = operations::dy(
                &self.nodes[first_node],
                &self.nodes[second_node],
                self.projection,
            );
            let dx3 = operations::dx(
                &self.nodes[first_node],
                &self.nodes[third_node],
                self.projection,
            );
            let dy3 = operations::dy(
                &self.nodes[first_node],
                &self.nodes[third_node],
                self.projection,
            );

            let den = dy2 * dx3 - dy3 * dx2;
            if is_equal(den, 0.0) {
                for &edge in &self.faces_edges[f] {
                    self.edges[edge] = Edge::missing();
                }
                degenerated_triangles.push(f);
            }
        }

        if !degenerated_triangles.is_empty() {
            log::debug!("塌缩 {} 个退化三角形", degenerated_triangles.len());
        }

        for &face in &degenerated_triangles {
            let first_node = self.faces_nodes[face][0];
            let second_node = self.faces_nodes[face][1];
            let third_node = self.faces_nodes[face][2];

            // 幸存节点落在三角形质心
            self.nodes[first_node] = self.faces_mass_centers[face];
            self.merge_two_nodes(second_node, first_node)?;
            self.merge_two_nodes(third_node, first_node)?;
        }

        self.administrate(AdministrationOption::EdgesAndFaces);
        Ok(())
    }

    /// 删除小流边：先塌缩退化三角形，再失效流长过小的共享边
    pub fn delete_small_flow_edges(&mut self, small_flow_edges_threshold: f64) -> MeshResult<()> {
        self.delete_degenerated_triangles()?;

        let edges = self.get_edges_crossing_small_flow_edges(small_flow_edges_threshold);
        if !edges.is_empty() {
            for e in edges {
                self.edges[e] = Edge::missing();
            }
            self.administrate(AdministrationOption::EdgesAndFaces);
        }
        Ok(())
    }

    /// 合并边界上过小的尖三角形
    ///
    /// 面积与邻面均值之比低于 `min_fractional_area_triangles` 且最小
    /// 夹角余弦低于阈值的边界三角形，其锐角两端并入对角节点。
    pub fn delete_small_triangles_at_boundaries(
        &mut self,
        min_fractional_area_triangles: f64,
    ) -> MeshResult<()> {
        self.administrate(AdministrationOption::EdgesAndFaces);

        let min_cos_phi = 0.2;
        let mut small_triangles_nodes = Vec::new();

        for face in 0..self.num_faces() {
            if self.faces_nodes[face].len() != NUM_NODES_IN_TRIANGLE
                || self.face_area[face] <= 0.0
                || !self.is_face_on_boundary(face)
            {
                continue;
            }

            // 邻面平均面积
            let mut average_other_faces_area = 0.0;
            let mut num_non_boundary_faces = 0usize;
            for e in 0..NUM_NODES_IN_TRIANGLE {
                let edge = self.faces_edges[face][e];
                if self.is_edge_on_boundary(edge) {
                    continue;
                }
                let other_face = if face == self.edges_faces[edge][0] {
                    self.edges_faces[edge][1]
                } else {
                    self.edges_faces[edge][0]
                };
                if self.faces_nodes[other_face].len() > NUM_NODES_IN_TRIANGLE {
                    average_other_faces_area += self.face_area[other_face];
                    num_non_boundary_faces += 1;
                }
            }

            if num_non_boundary_faces == 0
                || self.face_area[face] / (average_other_faces_area / num_non_boundary_faces as f64)
                    > min_fractional_area_triangles
            {
                continue;
            }

            // 最尖的角
            let mut min_cos_phi_small_triangle = 1.0;
            let mut node_to_preserve = INVALID_INDEX;
            let mut first_node_to_merge = INVALID_INDEX;
            let mut second_node_to_merge = INVALID_INDEX;
            let mut third_edge_small_triangle = INVALID_INDEX;
            for e in 0..NUM_NODES_IN_TRIANGLE {
                let previous = cm_geo::constants::next_circular_backward(e, NUM_NODES_IN_TRIANGLE);
                let next = cm_geo::constants::next_circular_forward(e, NUM_NODES_IN_TRIANGLE);

                let k0 = self.faces_nodes[face][previous];
                let k1 = self.faces_nodes[face][e];
                let k2 = self.faces_nodes[face][next];

                let cos_phi = operations::normalized_inner_product_two_segments(
                    &self.nodes[k0],
                    &self.nodes[k1],
                    &self.nodes[k1],
                    &self.nodes[k2],
                    self.projection,
                )
                .abs();

                if cos_phi < min_cos_phi_small_triangle {
                    min_cos_phi_small_triangle = cos_phi;
                    first_node_to_merge = k0;
                    node_to_preserve = k1;
                    second_node_to_merge = k2;
                    third_edge_small_triangle = self.faces_edges[face][next];
                }
            }

            if min_cos_phi_small_triangle < min_cos_phi
                && third_edge_small_triangle != INVALID_INDEX
                && self.is_edge_on_boundary(third_edge_small_triangle)
            {
                small_triangles_nodes.push([
                    node_to_preserve,
                    first_node_to_merge,
                    second_node_to_merge,
                ]);
            }
        }

        let mut nodes_merged = false;
        for [node_to_preserve, first_node_to_merge, second_node_to_merge] in small_triangles_nodes {
            for node_to_merge in [first_node_to_merge, second_node_to_merge] {
                let num_internal_edges = self.nodes_edges[node_to_merge]
                    .iter()
                    .filter(|&&e| !self.is_edge_on_boundary(e))
                    .count();
                if num_internal_edges == 1 {
                    self.merge_two_nodes(node_to_merge, node_to_preserve)?;
                    nodes_merged = true;
                }
            }
        }

        if nodes_merged {
            self.administrate(AdministrationOption::EdgesAndFaces);
        }
        Ok(())
    }

    /// 删除悬挂边
    pub fn delete_hanging_edges(&mut self) -> MeshResult<()> {
        let hanging_edges = self.get_hanging_edges();
        for hanging_edge in hanging_edges {
            self.delete_edge(hanging_edge)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_insert_node_appends() {
        let mut mesh = unit_square();
        let index = mesh.insert_node(Point::new(0.5, 0.5));
        assert_eq!(index, 4);
        assert_eq!(mesh.num_nodes(), 5);
        assert!(mesh.nodes_rtree_requires_update);
    }

    #[test]
    fn test_delete_node_invalidates_incident_edges() {
        let mut mesh = unit_square();
        mesh.delete_node(0).unwrap();
        assert!(!mesh.nodes[0].is_valid());
        assert!(!mesh.edges[0].is_valid());
        assert!(!mesh.edges[3].is_valid());
        assert!(mesh.edges[1].is_valid());
    }

    #[test]
    fn test_delete_node_out_of_range() {
        let mut mesh = unit_square();
        assert!(mesh.delete_node(99).is_err());
    }

    #[test]
    fn test_connect_nodes_duplicate_returns_none() {
        let mut mesh = unit_square();
        assert_eq!(mesh.connect_nodes(0, 1).unwrap(), None);
        let new_edge = mesh.connect_nodes(0, 2).unwrap();
        assert_eq!(new_edge, Some(4));
        assert_eq!(mesh.edges[4], Edge::new(0, 2));
    }

    #[test]
    fn test_delete_edge_missing_index() {
        let mut mesh = unit_square();
        assert!(mesh.delete_edge(INVALID_INDEX).is_err());
        assert!(mesh.delete_edge(0).is_ok());
        assert!(!mesh.edges[0].is_valid());
    }

    #[test]
    fn test_merge_two_nodes() {
        let mut mesh = unit_square();
        mesh.merge_two_nodes(0, 1).unwrap();

        assert!(!mesh.nodes[0].is_valid());
        // 边 (0,1) 失效
        assert!(!mesh.edges[0].is_valid());
        // 边 (3,0) 改挂到节点 1
        assert_eq!(mesh.edges[3].other_node(3), 1);
    }

    #[test]
    fn test_merge_two_nodes_idempotent() {
        let mut mesh = unit_square();
        mesh.merge_two_nodes(0, 1).unwrap();
        let nodes_snapshot = mesh.nodes.clone();
        let edges_snapshot = mesh.edges.clone();

        mesh.merge_two_nodes(0, 1).unwrap();
        assert_eq!(mesh.nodes, nodes_snapshot);
        assert_eq!(mesh.edges, edges_snapshot);
    }

    #[test]
    fn test_merge_node_with_itself_is_noop() {
        let mut mesh = unit_square();
        let edges_snapshot = mesh.edges.clone();
        mesh.merge_two_nodes(2, 2).unwrap();
        assert_eq!(mesh.edges, edges_snapshot);
        assert!(mesh.nodes[2].is_valid());
    }

    #[test]
    fn test_merge_nodes_in_polygon_close_pair() {
        // 两个几乎重合的节点各连到两个远端节点
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1e-9, 1e-9),
            Point::new(1.0, 0.0),
            Point::new(0.0, 1.0),
        ];
        let edges = vec![
            Edge::new(0, 2),
            Edge::new(0, 3),
            Edge::new(1, 2),
            Edge::new(1, 3),
        ];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);

        let polygon = Polygons::from_points(vec![
            Point::new(-0.1, -0.1),
            Point::new(1.1, -0.1),
            Point::new(1.1, 1.1),
            Point::new(-0.1, 1.1),
        ]);
        mesh.merge_nodes_in_polygon(&polygon, 1e-6).unwrap();

        // 合并后压实：三个节点、两条边
        assert_eq!(mesh.num_nodes(), 3);
        assert_eq!(mesh.num_edges(), 2);
    }

    #[test]
    fn test_move_node_radial_decay() {
        let mut mesh = unit_square();
        mesh.move_node(Point::new(0.1, 0.1), 0).unwrap();

        // 目标节点整体位移
        assert!((mesh.nodes[0].x - 0.1).abs() < 1e-12);
        assert!((mesh.nodes[0].y - 0.1).abs() < 1e-12);
        // 距离超过位移长度的节点不动
        assert!((mesh.nodes[2].x - 1.0).abs() < 1e-12);
        assert!((mesh.nodes[2].y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_move_node_same_position_is_noop() {
        let mut mesh = unit_square();
        let snapshot = mesh.nodes.clone();
        mesh.move_node(Point::new(0.0, 0.0), 0).unwrap();
        assert_eq!(mesh.nodes, snapshot);
    }

    #[test]
    fn test_delete_mesh_all_nodes_inside() {
        let mut mesh = unit_square();
        let polygon = Polygons::from_points(vec![
            Point::new(-0.5, -0.5),
            Point::new(0.5, -0.5),
            Point::new(0.5, 0.5),
            Point::new(-0.5, 0.5),
        ]);
        mesh.delete_mesh_in_polygon(&polygon, DeletionOption::AllNodesInside, false)
            .unwrap();

        // 节点 0 在选区内被删除，压实后剩 3 个节点、2 条边
        assert_eq!(mesh.num_nodes(), 3);
        assert_eq!(mesh.num_edges(), 2);
    }

    #[test]
    fn test_delete_mesh_inverted() {
        let mut mesh = unit_square();
        let polygon = Polygons::from_points(vec![
            Point::new(-0.5, -0.5),
            Point::new(0.5, -0.5),
            Point::new(0.5, 0.5),
            Point::new(-0.5, 0.5),
        ]);
        mesh.delete_mesh_in_polygon(&polygon, DeletionOption::AllNodesInside, true)
            .unwrap();

        // 反选：选区外的三个节点被删，节点 0 失去全部边后也被压实
        assert_eq!(mesh.num_nodes(), 0);
        assert_eq!(mesh.num_edges(), 0);
    }

    #[test]
    fn test_union_with() {
        let mut left = unit_square();
        let right_nodes = vec![
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 1.0),
            Point::new(2.0, 1.0),
        ];
        let right_edges = vec![
            Edge::new(0, 1),
            Edge::new(1, 2),
            Edge::new(2, 3),
            Edge::new(3, 0),
        ];
        let right = Mesh::new(right_edges, right_nodes, Projection::Cartesian);

        left.union_with(&right).unwrap();
        assert_eq!(left.num_nodes(), 8);
        assert_eq!(left.num_edges(), 8);
        assert_eq!(left.num_faces(), 2);
        // 右网格的边端点整体平移
        assert_eq!(left.edges[4], Edge::new(4, 5));
    }

    #[test]
    fn test_union_projection_mismatch() {
        let mut left = unit_square();
        let right = Mesh::new(
            vec![Edge::new(0, 1)],
            vec![Point::new(0.0, 0.0), Point::new(1.0, 0.0)],
            Projection::Spherical,
        );
        assert!(left.union_with(&right).is_err());
    }

    #[test]
    fn test_insert_then_delete_restores_mesh() {
        let mut mesh = unit_square();
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        let nodes_before = mesh.nodes.clone();
        let faces_before = mesh.faces_nodes.clone();

        let new_node = mesh.insert_node(Point::new(5.0, 5.0));
        mesh.delete_node(new_node).unwrap();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.nodes, nodes_before);
        assert_eq!(mesh.faces_nodes, faces_before);
    }

    #[test]
    fn test_delete_degenerated_triangle_collapses() {
        // 近乎共线的三角形：面积为正但退化判据命中
        let nodes = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 1e-16),
        ];
        let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
        let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        assert_eq!(mesh.num_faces(), 1);

        mesh.delete_degenerated_triangles().unwrap();

        assert_eq!(mesh.num_faces(), 0);
        assert_eq!(mesh.num_nodes(), 0);
    }

    #[test]
    fn test_triangulate_faces_splits_quad() {
        let mut mesh = unit_square();
        mesh.administrate(AdministrationOption::EdgesAndFaces);
        mesh.triangulate_faces().unwrap();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_edges(), 5);
        assert_eq!(mesh.num_faces(), 2);
        for f in 0..mesh.num_faces() {
            assert_eq!(mesh.faces_nodes[f].len(), 3);
        }
    }

    #[test]
    fn test_delete_hanging_edges() {
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

        mesh.delete_hanging_edges().unwrap();
        mesh.administrate(AdministrationOption::EdgesAndFaces);

        assert_eq!(mesh.num_nodes(), 4);
        assert_eq!(mesh.num_edges(), 4);
        assert_eq!(mesh.num_faces(), 1);
    }
}
