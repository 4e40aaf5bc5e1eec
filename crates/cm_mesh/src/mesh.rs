// crates/cm_mesh/src/mesh.rs

//! 网格存储与基础查询
//!
//! [`Mesh`] 以节点数组与边数组为规范存储，所有交叉引用都是整数索引，
//! 不存指针。关联表（节点→边、边→面、面→节点/边）与每面几何量均为
//! 派生数据，由 [`administrate`](Mesh::administrate) 重建。
//!
//! 删除一律写哨兵（软删除），索引保持稳定；只有管理管线的压实阶段
//! 才会重排索引。节点与边各有一棵 R-Tree，生命周期独立，凭脏标志
//! 惰性重建。

use cm_geo::constants::INVALID_INDEX;
use cm_geo::{operations, Point, Projection, SpatialIndex};
use serde::{Deserialize, Serialize};

use crate::administration::AdministrationOption;
use crate::error::{MeshError, MeshResult};

/// 单节点最大关联边数
pub const MAX_EDGES_PER_NODE: usize = 16;

/// 单面最大边数
pub const MAX_EDGES_PER_FACE: usize = 6;

/// 三角形节点数
pub const NUM_NODES_IN_TRIANGLE: usize = 3;

/// 四边形节点数
pub const NUM_NODES_QUADS: usize = 4;

/// 外心包含测试中顶点向质心收缩的权重
pub const WEIGHT_CIRCUMCENTER: f64 = 0.975;

/// 多边形内节点合并的默认距离 [m]
pub const MERGING_DISTANCE: f64 = 0.001;

/// 长宽比计算中曲线网格与正交估计的混合权重
pub const CURVILINEAR_TO_ORTHOGONAL_RATIO: f64 = 0.5;

/// 网格边：有序节点索引对
///
/// 任一端为 [`INVALID_INDEX`] 即整条边无效。方向仅是拓扑记录，
/// 几何运算把边当作无序线段。
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// 第一个节点索引
    pub first: usize,
    /// 第二个节点索引
    pub second: usize,
}

impl Edge {
    /// 创建新边
    #[inline]
    #[must_use]
    pub const fn new(first: usize, second: usize) -> Self {
        Self { first, second }
    }

    /// 创建无效边（软删除哨兵）
    #[inline]
    #[must_use]
    pub const fn missing() -> Self {
        Self {
            first: INVALID_INDEX,
            second: INVALID_INDEX,
        }
    }

    /// 边是否有效：两端都不是哨兵
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.first != INVALID_INDEX && self.second != INVALID_INDEX
    }

    /// 给定一端，返回另一端
    ///
    /// `node` 不是本边端点时返回 [`INVALID_INDEX`]。
    #[inline]
    #[must_use]
    pub fn other_node(&self, node: usize) -> usize {
        if self.first == node {
            self.second
        } else if self.second == node {
            self.first
        } else {
            INVALID_INDEX
        }
    }
}

/// 节点分类
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeType {
    /// 悬挂节点（度数不足或仅连孤立边）
    Hanging,
    /// 内部节点
    Internal,
    /// 边界节点
    Boundary,
    /// 角点
    Corner,
}

impl NodeType {
    /// 由分类整数构造
    #[inline]
    #[must_use]
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            -1 => Some(Self::Hanging),
            1 => Some(Self::Internal),
            2 => Some(Self::Boundary),
            3 => Some(Self::Corner),
            _ => None,
        }
    }

    /// 分类整数编码
    #[inline]
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Hanging => -1,
            Self::Internal => 1,
            Self::Boundary => 2,
            Self::Corner => 3,
        }
    }
}

/// 非结构二维网格
#[derive(Debug, Default)]
pub struct Mesh {
    /// 节点坐标（规范数组）
    pub nodes: Vec<Point>,
    /// 边（规范数组）
    pub edges: Vec<Edge>,
    /// 投影，网格生命周期内不变
    pub projection: Projection,

    /// 节点关联边（逆时针排序），每节点至多 [`MAX_EDGES_PER_NODE`] 条
    pub nodes_edges: Vec<Vec<usize>>,
    /// 节点关联边数
    pub nodes_num_edges: Vec<usize>,
    /// 节点分类整数（-1 悬挂 / 1 内部 / 2 边界 / 3 角点）
    pub nodes_types: Vec<i32>,
    /// 节点邻居（由 [`compute_node_neighbours`](Mesh::compute_node_neighbours) 填充）
    pub nodes_nodes: Vec<Vec<usize>>,

    /// 边的邻接面数（0/1/2）
    pub edges_num_faces: Vec<usize>,
    /// 边的两侧面索引，未用槽位为哨兵
    pub edges_faces: Vec<[usize; 2]>,
    /// 边长缓存
    pub edge_lengths: Vec<f64>,
    /// 边中点缓存
    pub edges_centers: Vec<Point>,

    /// 面的节点环（逆时针）
    pub faces_nodes: Vec<Vec<usize>>,
    /// 面的边环（与节点环同序）
    pub faces_edges: Vec<Vec<usize>>,
    /// 面面积
    pub face_area: Vec<f64>,
    /// 面质心
    pub faces_mass_centers: Vec<Point>,
    /// 面外心
    pub faces_circumcenters: Vec<Point>,

    /// 节点掩码（多边形选区暂存）
    pub node_mask: Vec<i32>,
    /// 边掩码（多边形选区暂存）
    pub edge_mask: Vec<i32>,

    pub(crate) nodes_rtree: SpatialIndex,
    pub(crate) edges_rtree: SpatialIndex,
    pub(crate) nodes_rtree_requires_update: bool,
    pub(crate) edges_rtree_requires_update: bool,
}

impl Mesh {
    /// 由边与节点数组构造并完成边管理
    ///
    /// 构造后节点掩码全为 1（无多边形选区参与）。
    #[must_use]
    pub fn new(edges: Vec<Edge>, nodes: Vec<Point>, projection: Projection) -> Self {
        let mut mesh = Self {
            nodes,
            edges,
            projection,
            nodes_rtree_requires_update: true,
            edges_rtree_requires_update: true,
            ..Self::default()
        };
        mesh.administrate(AdministrationOption::EdgesOnly);
        mesh.node_mask = vec![1; mesh.nodes.len()];
        mesh
    }

    /// 空网格
    #[must_use]
    pub fn empty(projection: Projection) -> Self {
        Self {
            projection,
            ..Self::default()
        }
    }

    /// 节点数（数组长度，含软删除项；管理后为有效计数）
    #[inline]
    #[must_use]
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// 边数（数组长度，含软删除项；管理后为有效计数）
    #[inline]
    #[must_use]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// 面数
    #[inline]
    #[must_use]
    pub fn num_faces(&self) -> usize {
        self.faces_nodes.len()
    }

    /// 面 `f` 的边数（等于节点数）
    #[inline]
    #[must_use]
    pub fn num_face_edges(&self, face: usize) -> usize {
        self.faces_edges[face].len()
    }

    /// 边是否为边界边（恰有一个邻接面）
    #[inline]
    #[must_use]
    pub fn is_edge_on_boundary(&self, edge: usize) -> bool {
        self.edges_num_faces[edge] == 1
    }

    /// 面是否含边界边
    #[must_use]
    pub fn is_face_on_boundary(&self, face: usize) -> bool {
        self.faces_edges[face]
            .iter()
            .any(|&e| self.is_edge_on_boundary(e))
    }

    /// 节点分类
    ///
    /// 管理管线（含面）完成后有效。
    #[inline]
    #[must_use]
    pub fn node_type(&self, node: usize) -> Option<NodeType> {
        NodeType::from_code(self.nodes_types[node])
    }

    /// 在 `first_node` 的关联边中查找连向 `second_node` 的边
    ///
    /// 对称：`find_edge(u, v) == find_edge(v, u)`。索引无效或越界时
    /// 返回 `None`。
    #[must_use]
    pub fn find_edge(&self, first_node: usize, second_node: usize) -> Option<usize> {
        if first_node >= self.nodes_edges.len() || second_node == INVALID_INDEX {
            return None;
        }
        self.nodes_edges[first_node]
            .iter()
            .copied()
            .find(|&e| self.edges[e].other_node(first_node) == second_node)
    }

    /// 两条边的公共节点
    ///
    /// # 错误
    ///
    /// 任一边无效时返回 `InvalidArgument`；无公共节点返回哨兵。
    pub fn find_common_node(&self, first_edge: usize, second_edge: usize) -> MeshResult<usize> {
        let a = self.edges[first_edge];
        let b = self.edges[second_edge];
        if !a.is_valid() || !b.is_valid() {
            return Err(MeshError::invalid_argument(
                "查找公共节点: 至少一条边无效",
            ));
        }

        if a.first == b.first || a.first == b.second {
            return Ok(a.first);
        }
        if a.second == b.first || a.second == b.second {
            return Ok(a.second);
        }
        Ok(INVALID_INDEX)
    }

    /// 在搜索半径内查找离给定点最近的节点
    ///
    /// # 错误
    ///
    /// 空网格返回 `InvalidArgument`；半径内无节点返回 `Algorithm`。
    pub fn get_node_index(&mut self, point: Point, search_radius: f64) -> MeshResult<usize> {
        if self.nodes.is_empty() {
            return Err(MeshError::invalid_argument("查找节点: 网格中没有有效节点"));
        }

        if self.nodes_rtree.is_empty() {
            self.nodes_rtree.build(&self.nodes);
            self.nodes_rtree_requires_update = false;
        }

        self.nodes_rtree
            .nearest_neighbors_within_squared_distance(&point, search_radius * search_radius);
        if self.nodes_rtree.query_result_size() > 0 {
            return Ok(self.nodes_rtree.query_result(0));
        }

        Err(MeshError::algorithm("查找节点: 搜索半径内没有节点"))
    }

    /// 查找离给定点最近的边（按边中点）
    ///
    /// # 错误
    ///
    /// 无边或查询无结果返回 `Algorithm`。
    pub fn find_edge_close_to_a_point(&mut self, point: Point) -> MeshResult<usize> {
        if self.edges.is_empty() {
            return Err(MeshError::algorithm("查找最近边: 网格中没有边"));
        }

        if self.edges_rtree.is_empty() {
            self.compute_edges_centers();
            self.edges_rtree.build(&self.edges_centers);
            self.edges_rtree_requires_update = false;
        }

        self.edges_rtree.nearest_neighbor(&point);
        if self.edges_rtree.query_result_size() > 0 {
            return Ok(self.edges_rtree.query_result(0));
        }

        Err(MeshError::algorithm("查找最近边: 没有可用结果"))
    }

    /// 有效节点的包围盒 `(左下, 右上)`
    #[must_use]
    pub fn bounding_box(&self) -> (Point, Point) {
        let mut min_x = f64::MAX;
        let mut max_x = f64::MIN;
        let mut min_y = f64::MAX;
        let mut max_y = f64::MIN;
        for node in self.nodes.iter().filter(|n| n.is_valid()) {
            min_x = min_x.min(node.x);
            max_x = max_x.max(node.x);
            min_y = min_y.min(node.y);
            max_y = max_y.max(node.y);
        }
        (Point::new(min_x, min_y), Point::new(max_x, max_y))
    }

    /// 球面系下把经度折回同一分支
    ///
    /// 当网格经度跨度超过 180° 时，将节点经度搬移 ±360° 使其落在
    /// `[min_x, min_x + 360)`。
    pub fn offset_spherical_coordinates(&mut self, min_x: f64, max_x: f64) {
        if self.projection != Projection::Spherical || max_x - min_x <= 180.0 {
            return;
        }
        for node in &mut self.nodes {
            if node.x - 360.0 >= min_x {
                node.x -= 360.0;
            }
            if node.x < min_x {
                node.x += 360.0;
            }
        }
    }

    /// 重算全部边长
    pub fn compute_edges_lengths(&mut self) {
        self.edge_lengths = self
            .edges
            .iter()
            .map(|e| {
                if e.is_valid() {
                    operations::distance(&self.nodes[e.first], &self.nodes[e.second], self.projection)
                } else {
                    cm_geo::DOUBLE_MISSING_VALUE
                }
            })
            .collect();
    }

    /// 重算全部边中点
    pub fn compute_edges_centers(&mut self) {
        self.edges_centers = self
            .edges
            .iter()
            .map(|e| {
                if e.is_valid() {
                    (self.nodes[e.first] + self.nodes[e.second]).scale(0.5)
                } else {
                    Point::missing()
                }
            })
            .collect();
    }

    /// 填充节点邻居表
    pub fn compute_node_neighbours(&mut self) {
        self.nodes_nodes = (0..self.num_nodes())
            .map(|n| {
                self.nodes_edges[n]
                    .iter()
                    .map(|&e| self.edges[e].other_node(n))
                    .collect()
            })
            .collect();
    }

    /// 面 `f` 的闭合多边形环（节点坐标，末点重复首点）
    #[must_use]
    pub fn face_closed_polygon(&self, face: usize) -> Vec<Point> {
        let mut polygon: Vec<Point> = self.faces_nodes[face]
            .iter()
            .map(|&n| self.nodes[n])
            .collect();
        if let Some(&first) = polygon.first() {
            polygon.push(first);
        }
        polygon
    }

    /// 面的所有节点是否都不在当前节点掩码选区内
    #[must_use]
    pub fn is_full_face_not_in_polygon(&self, face: usize) -> bool {
        self.faces_nodes[face]
            .iter()
            .any(|&n| self.node_mask[n] != 1)
    }

    /// 把多边形选区写入节点掩码
    ///
    /// 选区内为 1，选区外为 0；`inside == false` 时取反。
    pub fn mask_nodes_in_polygons(&mut self, polygons: &crate::polygons::Polygons, inside: bool) {
        self.node_mask = vec![0; self.num_nodes()];
        for (n, node) in self.nodes.iter().enumerate() {
            let mut in_polygon = polygons.contains_point(node, self.projection);
            if !inside {
                in_polygon = !in_polygon;
            }
            if in_polygon {
                self.node_mask[n] = 1;
            }
        }
    }

    /// 由边掩码推导节点掩码：被掩码边的两个端点均置 1
    ///
    /// # 错误
    ///
    /// 掩码长度与网格不符时返回 `InvalidArgument`。
    pub fn compute_node_mask_from_edge_mask(&mut self) -> MeshResult<()> {
        if self.edge_mask.len() != self.num_edges() || self.node_mask.len() != self.num_nodes() {
            return Err(MeshError::invalid_argument(
                "推导节点掩码: 掩码维度与网格不符",
            ));
        }

        self.node_mask.fill(0);
        for (e, edge) in self.edges.iter().enumerate() {
            if self.edge_mask[e] != 1 {
                continue;
            }
            if edge.first != INVALID_INDEX {
                self.node_mask[edge.first] = 1;
            }
            if edge.second != INVALID_INDEX {
                self.node_mask[edge.second] = 1;
            }
        }
        Ok(())
    }
}
