// crates/cm_api/src/state.rs

//! 平面视图与几何序列
//!
//! 外部调用方以结构化数组（SoA）交换网格：节点坐标数组、边节点
//! 交错数组、面节点定长填充数组。多边形与折线用带分隔哨兵的坐标
//! 序列 [`GeometryList`] 表达。

use cm_geo::{Point, DOUBLE_MISSING_VALUE};
use cm_mesh::{AdministrationOption, Edge, Mesh};
use serde::{Deserialize, Serialize};

/// 面节点填充数组使用的整数哨兵
pub const INT_MISSING_VALUE: i32 = -1;

/// 网格维度记录
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshDimensions {
    /// 节点数
    pub num_nodes: usize,
    /// 边数
    pub num_edges: usize,
    /// 面数
    pub num_faces: usize,
    /// 单面最大节点数（填充宽度）
    pub max_num_face_nodes: usize,
}

/// 网格几何平面视图
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// 节点 X 坐标
    pub node_x: Vec<f64>,
    /// 节点 Y 坐标
    pub node_y: Vec<f64>,
    /// 节点 Z 坐标（二维网格恒为 0）
    pub node_z: Vec<f64>,
    /// 边节点交错数组 `(u0, v0, u1, v1, …)`
    pub edge_nodes: Vec<i32>,
    /// 面节点定长填充数组，空槽位为 [`INT_MISSING_VALUE`]
    pub face_nodes: Vec<i32>,
    /// 面外心 X 坐标
    pub face_x: Vec<f64>,
    /// 面外心 Y 坐标
    pub face_y: Vec<f64>,
    /// 面外心 Z 坐标（恒为 0）
    pub face_z: Vec<f64>,
}

/// 坐标序列：带分隔哨兵的点集/折线/多边形
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct GeometryList {
    /// X 坐标
    pub x_coordinates: Vec<f64>,
    /// Y 坐标
    pub y_coordinates: Vec<f64>,
    /// 伴随标量（采样值、质量指标等）
    pub values: Vec<f64>,
}

impl GeometryList {
    /// 由点序列构造
    #[must_use]
    pub fn from_points(points: &[Point]) -> Self {
        Self {
            x_coordinates: points.iter().map(|p| p.x).collect(),
            y_coordinates: points.iter().map(|p| p.y).collect(),
            values: Vec::new(),
        }
    }

    /// 转为点序列（保留分隔哨兵）
    #[must_use]
    pub fn to_points(&self) -> Vec<Point> {
        self.x_coordinates
            .iter()
            .zip(&self.y_coordinates)
            .map(|(&x, &y)| Point::new(x, y))
            .collect()
    }

    /// 坐标数
    #[inline]
    #[must_use]
    pub fn num_coordinates(&self) -> usize {
        self.x_coordinates.len()
    }

    /// 是否为空
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x_coordinates.is_empty()
    }
}

/// 平面视图刷新级别
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FlatCopyLevel {
    /// 仅节点与边
    EdgesOnly,
    /// 节点、边与面
    EdgesAndFaces,
}

/// 刷新网格的平面视图
///
/// 先按级别运行管理管线，再从规范数组重建 SoA 视图。
pub(crate) fn set_flat_copies(mesh: &mut Mesh, level: FlatCopyLevel) -> (MeshDimensions, MeshGeometry) {
    let option = match level {
        FlatCopyLevel::EdgesOnly => AdministrationOption::EdgesOnly,
        FlatCopyLevel::EdgesAndFaces => AdministrationOption::EdgesAndFaces,
    };
    mesh.administrate(option);

    let max_num_face_nodes = cm_mesh::mesh::MAX_EDGES_PER_FACE;
    let mut geometry = MeshGeometry::default();

    geometry.node_x.reserve(mesh.num_nodes());
    geometry.node_y.reserve(mesh.num_nodes());
    geometry.node_z.resize(mesh.num_nodes(), 0.0);
    for node in &mesh.nodes {
        geometry.node_x.push(node.x);
        geometry.node_y.push(node.y);
    }

    geometry.edge_nodes.reserve(mesh.num_edges() * 2);
    for edge in &mesh.edges {
        geometry.edge_nodes.push(to_index(edge.first));
        geometry.edge_nodes.push(to_index(edge.second));
    }

    if level == FlatCopyLevel::EdgesAndFaces {
        geometry
            .face_nodes
            .resize(mesh.num_faces() * max_num_face_nodes, INT_MISSING_VALUE);
        geometry.face_x.reserve(mesh.num_faces());
        geometry.face_y.reserve(mesh.num_faces());
        geometry.face_z.resize(mesh.num_faces(), 0.0);

        for f in 0..mesh.num_faces() {
            for (n, &node) in mesh.faces_nodes[f].iter().enumerate() {
                geometry.face_nodes[f * max_num_face_nodes + n] = to_index(node);
            }
            geometry.face_x.push(mesh.faces_circumcenters[f].x);
            geometry.face_y.push(mesh.faces_circumcenters[f].y);
        }
    }

    let dimensions = MeshDimensions {
        num_nodes: mesh.num_nodes(),
        num_edges: mesh.num_edges(),
        num_faces: mesh.num_faces(),
        max_num_face_nodes,
    };
    (dimensions, geometry)
}

/// 由平面视图重建网格的节点与边
pub(crate) fn mesh_from_flat_arrays(
    geometry: &MeshGeometry,
    projection: cm_geo::Projection,
) -> Mesh {
    let nodes: Vec<Point> = geometry
        .node_x
        .iter()
        .zip(&geometry.node_y)
        .map(|(&x, &y)| Point::new(x, y))
        .collect();

    let edges: Vec<Edge> = geometry
        .edge_nodes
        .chunks_exact(2)
        .map(|pair| Edge::new(from_index(pair[0]), from_index(pair[1])))
        .collect();

    Mesh::new(edges, nodes, projection)
}

#[inline]
fn to_index(index: usize) -> i32 {
    if index == cm_geo::INVALID_INDEX {
        INT_MISSING_VALUE
    } else {
        index as i32
    }
}

#[inline]
fn from_index(index: i32) -> usize {
    if index < 0 {
        cm_geo::INVALID_INDEX
    } else {
        index as usize
    }
}

/// 分隔哨兵（坐标缺失值）
#[must_use]
pub fn separator() -> f64 {
    DOUBLE_MISSING_VALUE
}

/// 内外环分隔哨兵
#[must_use]
pub fn inner_outer_separator() -> f64 {
    cm_geo::constants::INNER_OUTER_SEPARATOR
}
