//! CoastMesh 外部接口层
//!
//! 以整数句柄管理网格实例的状态注册表，是内核面向宿主调用方的稳定
//! 边界。所有操作返回整数码（`0` 成功，正数失败），最近一次失败的
//! 可读消息与结构异常位置可带外读取。
//!
//! # 示例
//!
//! ```
//! use cm_api::{state::MeshGeometry, MeshKernelApi};
//!
//! let mut api = MeshKernelApi::new();
//! let id = api.new_mesh();
//!
//! let geometry = MeshGeometry {
//!     node_x: vec![0.0, 1.0, 1.0, 0.0],
//!     node_y: vec![0.0, 0.0, 1.0, 1.0],
//!     node_z: vec![0.0; 4],
//!     edge_nodes: vec![0, 1, 1, 2, 2, 3, 3, 0],
//!     ..MeshGeometry::default()
//! };
//! assert_eq!(api.set_state(id, &geometry, false), 0);
//!
//! let mut num_faces = 0;
//! assert_eq!(api.find_faces(id, &mut num_faces), 0);
//! assert_eq!(num_faces, 1);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod state;

use cm_geo::{Point, Projection, DOUBLE_MISSING_VALUE};
use cm_mesh::{DeletionOption, Mesh, MeshError, MeshResult, Polygons};

use state::{set_flat_copies, FlatCopyLevel, GeometryList, MeshDimensions, MeshGeometry};

/// 操作成功
pub const SUCCESS: i32 = 0;

/// 结构异常（可读取位置与索引）
pub const INVALID_GEOMETRY: i32 = 1;

/// 一般失败（可读取消息）
pub const EXCEPTION: i32 = 2;

/// 句柄无效
pub const UNKNOWN_MESH: i32 = 3;

/// 网格实例注册表
///
/// 实例由整数句柄标识；释放句柄后槽位不复用，已发出的其他句柄保持
/// 有效。
#[derive(Default)]
pub struct MeshKernelApi {
    instances: Vec<Option<Mesh>>,
    dimensions: Vec<MeshDimensions>,
    geometries: Vec<MeshGeometry>,
    last_error: String,
    geometry_error_index: usize,
    geometry_error_location: i32,
}

impl MeshKernelApi {
    /// 创建空注册表
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配新网格实例，返回句柄
    pub fn new_mesh(&mut self) -> i32 {
        let id = self.instances.len() as i32;
        self.instances.push(Some(Mesh::empty(Projection::Cartesian)));
        self.dimensions.push(MeshDimensions::default());
        self.geometries.push(MeshGeometry::default());
        id
    }

    /// 释放网格实例
    pub fn deallocate_state(&mut self, mesh_id: i32) -> i32 {
        match self.slot_mut(mesh_id) {
            Ok(slot) => {
                *slot = None;
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 最近一次失败的可读消息
    #[must_use]
    pub fn get_error(&self) -> &str {
        &self.last_error
    }

    /// 最近一次结构异常的 `(元素索引, 位置编码)`
    ///
    /// 位置编码：0 节点、1 边、2 面。
    #[must_use]
    pub fn get_geometry_error(&self) -> (usize, i32) {
        (self.geometry_error_index, self.geometry_error_location)
    }

    /// 折线段分隔哨兵
    #[must_use]
    pub fn get_separator(&self) -> f64 {
        state::separator()
    }

    /// 多边形内外环分隔哨兵
    #[must_use]
    pub fn get_inner_outer_separator(&self) -> f64 {
        state::inner_outer_separator()
    }

    /// 以平面数组替换实例内容
    ///
    /// `is_geographic` 为真时选择球面投影。
    pub fn set_state(&mut self, mesh_id: i32, geometry: &MeshGeometry, is_geographic: bool) -> i32 {
        let projection = Projection::from_geographic_flag(is_geographic);
        let mesh = state::mesh_from_flat_arrays(geometry, projection);
        match self.mesh_mut(mesh_id) {
            Ok(instance) => {
                *instance = mesh;
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 刷新节点与边的平面视图
    ///
    /// 之后可经 [`dimensions`](Self::dimensions) 与
    /// [`geometry`](Self::geometry) 读取。
    pub fn get_mesh(&mut self, mesh_id: i32) -> i32 {
        self.refresh(mesh_id, FlatCopyLevel::EdgesOnly)
    }

    /// 管理面并刷新完整平面视图
    pub fn find_faces(&mut self, mesh_id: i32, num_faces: &mut usize) -> i32 {
        let code = self.refresh(mesh_id, FlatCopyLevel::EdgesAndFaces);
        if code == SUCCESS {
            *num_faces = self.dimensions[mesh_id as usize].num_faces;
        }
        code
    }

    /// 实例的维度记录（最近一次刷新）
    #[must_use]
    pub fn dimensions(&self, mesh_id: i32) -> Option<&MeshDimensions> {
        self.dimensions.get(mesh_id as usize)
    }

    /// 实例的几何平面视图（最近一次刷新）
    #[must_use]
    pub fn geometry(&self, mesh_id: i32) -> Option<&MeshGeometry> {
        self.geometries.get(mesh_id as usize)
    }

    /// 插入节点
    pub fn insert_node(&mut self, mesh_id: i32, x: f64, y: f64, node_index: &mut usize) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                *node_index = mesh.insert_node(Point::new(x, y));
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 删除节点
    pub fn delete_node(&mut self, mesh_id: i32, node_index: usize) -> i32 {
        self.run(mesh_id, |mesh| mesh.delete_node(node_index))
    }

    /// 连接两个节点
    ///
    /// 已存在同对边时 `new_edge_index` 保持不变并返回成功。
    pub fn insert_edge(
        &mut self,
        mesh_id: i32,
        start_node: usize,
        end_node: usize,
        new_edge_index: &mut usize,
    ) -> i32 {
        let mesh = match self.mesh_mut(mesh_id) {
            Ok(mesh) => mesh,
            Err(code) => return code,
        };
        match mesh.connect_nodes(start_node, end_node) {
            Ok(Some(index)) => {
                *new_edge_index = index;
                SUCCESS
            }
            Ok(None) => SUCCESS,
            Err(err) => self.record_error(&err),
        }
    }

    /// 删除离给定点最近的边
    pub fn delete_edge(&mut self, mesh_id: i32, x: f64, y: f64) -> i32 {
        self.run(mesh_id, |mesh| {
            let edge_index = mesh.find_edge_close_to_a_point(Point::new(x, y))?;
            mesh.delete_edge(edge_index)
        })
    }

    /// 查找离给定点最近的边
    pub fn find_edge(&mut self, mesh_id: i32, x: f64, y: f64, edge_index: &mut usize) -> i32 {
        let mesh = match self.mesh_mut(mesh_id) {
            Ok(mesh) => mesh,
            Err(code) => return code,
        };
        match mesh.find_edge_close_to_a_point(Point::new(x, y)) {
            Ok(index) => {
                *edge_index = index;
                SUCCESS
            }
            Err(err) => self.record_error(&err),
        }
    }

    /// 在搜索半径内查找最近节点
    pub fn get_node_index(
        &mut self,
        mesh_id: i32,
        x: f64,
        y: f64,
        search_radius: f64,
        node_index: &mut usize,
    ) -> i32 {
        let mesh = match self.mesh_mut(mesh_id) {
            Ok(mesh) => mesh,
            Err(code) => return code,
        };
        match mesh.get_node_index(Point::new(x, y), search_radius) {
            Ok(index) => {
                *node_index = index;
                SUCCESS
            }
            Err(err) => self.record_error(&err),
        }
    }

    /// 径向衰减移动节点
    pub fn move_node(&mut self, mesh_id: i32, x: f64, y: f64, node_index: usize) -> i32 {
        self.run(mesh_id, |mesh| mesh.move_node(Point::new(x, y), node_index))
    }

    /// 把第一个节点并入第二个
    pub fn merge_two_nodes(&mut self, mesh_id: i32, first_node: usize, second_node: usize) -> i32 {
        self.run(mesh_id, |mesh| mesh.merge_two_nodes(first_node, second_node))
    }

    /// 合并选区内的近重合节点
    pub fn merge_nodes(&mut self, mesh_id: i32, selection: &GeometryList) -> i32 {
        let polygon = Polygons::from_points(selection.to_points());
        self.run(mesh_id, |mesh| {
            mesh.merge_nodes_in_polygon(&polygon, cm_mesh::mesh::MERGING_DISTANCE)
        })
    }

    /// 按多边形选区删除网格
    ///
    /// `deletion_option`：0 选区内节点、1 外心入选的面、2 完全入选的面。
    pub fn delete_mesh_in_polygon(
        &mut self,
        mesh_id: i32,
        selection: &GeometryList,
        deletion_option: i32,
        invert_deletion: bool,
    ) -> i32 {
        let option = match deletion_option {
            0 => DeletionOption::AllNodesInside,
            1 => DeletionOption::FacesWithIncludedCircumcenters,
            2 => DeletionOption::FacesCompletelyIncluded,
            _ => {
                self.last_error = format!("未知的删除模式: {deletion_option}");
                return EXCEPTION;
            }
        };
        let polygon = Polygons::from_points(selection.to_points());
        self.run(mesh_id, |mesh| {
            mesh.delete_mesh_in_polygon(&polygon, option, invert_deletion)
        })
    }

    /// 悬挂边计数
    pub fn count_hanging_edges(&mut self, mesh_id: i32, num_hanging_edges: &mut usize) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                *num_hanging_edges = mesh.get_hanging_edges().len();
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 悬挂边索引
    pub fn get_hanging_edges(&mut self, mesh_id: i32, hanging_edges: &mut Vec<usize>) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                *hanging_edges = mesh.get_hanging_edges();
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 删除悬挂边
    pub fn delete_hanging_edges(&mut self, mesh_id: i32) -> i32 {
        self.run(mesh_id, Mesh::delete_hanging_edges)
    }

    /// 每边正交性，写入 `result.values`
    pub fn get_orthogonality(&mut self, mesh_id: i32, result: &mut GeometryList) -> i32 {
        let code = self.refresh(mesh_id, FlatCopyLevel::EdgesAndFaces);
        if code != SUCCESS {
            return code;
        }
        if let Ok(mesh) = self.mesh_mut(mesh_id) {
            result.values = mesh.get_orthogonality();
        }
        SUCCESS
    }

    /// 每边光滑度，写入 `result.values`
    pub fn get_smoothness(&mut self, mesh_id: i32, result: &mut GeometryList) -> i32 {
        let code = self.refresh(mesh_id, FlatCopyLevel::EdgesAndFaces);
        if code != SUCCESS {
            return code;
        }
        if let Ok(mesh) = self.mesh_mut(mesh_id) {
            result.values = mesh.get_smoothness();
        }
        SUCCESS
    }

    /// 钝角三角形质心
    pub fn get_obtuse_triangles_mass_centers(
        &mut self,
        mesh_id: i32,
        result: &mut GeometryList,
    ) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                let centers = mesh.get_obtuse_triangles_centers();
                *result = GeometryList::from_points(&centers);
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 小流边中点
    pub fn get_small_flow_edge_centers(
        &mut self,
        mesh_id: i32,
        small_flow_edges_threshold: f64,
        result: &mut GeometryList,
    ) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                let edges = mesh.get_edges_crossing_small_flow_edges(small_flow_edges_threshold);
                let centers = mesh.get_flow_edges_centers(&edges);
                *result = GeometryList::from_points(&centers);
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 删除小流边与边界小三角形
    pub fn delete_small_flow_edges(
        &mut self,
        mesh_id: i32,
        small_flow_edges_threshold: f64,
        min_fractional_area_triangles: f64,
    ) -> i32 {
        self.run(mesh_id, |mesh| {
            mesh.delete_small_flow_edges(small_flow_edges_threshold)?;
            mesh.delete_small_triangles_at_boundaries(min_fractional_area_triangles)
        })
    }

    /// 钝角三角形计数
    pub fn count_obtuse_triangles(&mut self, mesh_id: i32, num_obtuse_triangles: &mut usize) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                *num_obtuse_triangles = mesh.get_obtuse_triangles_centers().len();
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 小流边计数
    pub fn count_small_flow_edge_centers(
        &mut self,
        mesh_id: i32,
        small_flow_edges_threshold: f64,
        num_small_flow_edges: &mut usize,
    ) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                *num_small_flow_edges = mesh
                    .get_edges_crossing_small_flow_edges(small_flow_edges_threshold)
                    .len();
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 网格边界折线的坐标计数（含分隔哨兵）
    pub fn count_mesh_boundary_polygon_nodes(
        &mut self,
        mesh_id: i32,
        num_boundary_nodes: &mut usize,
    ) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                *num_boundary_nodes = mesh.mesh_boundary_to_polygon(&Polygons::new()).len();
                SUCCESS
            }
            Err(code) => code,
        }
    }

    /// 网格边界提取为折线序列
    pub fn copy_mesh_boundaries_to_polygon(
        &mut self,
        mesh_id: i32,
        result: &mut GeometryList,
    ) -> i32 {
        match self.mesh_mut(mesh_id) {
            Ok(mesh) => {
                let boundary = mesh.mesh_boundary_to_polygon(&Polygons::new());
                *result = GeometryList::from_points(&boundary);
                SUCCESS
            }
            Err(code) => code,
        }
    }

    // ========================================================================
    // 内部工具
    // ========================================================================

    fn slot_mut(&mut self, mesh_id: i32) -> Result<&mut Option<Mesh>, i32> {
        let index = mesh_id as usize;
        if mesh_id < 0 || index >= self.instances.len() {
            self.last_error = format!("网格句柄不存在: {mesh_id}");
            return Err(UNKNOWN_MESH);
        }
        Ok(&mut self.instances[index])
    }

    fn mesh_mut(&mut self, mesh_id: i32) -> Result<&mut Mesh, i32> {
        let index = mesh_id as usize;
        if mesh_id < 0 || index >= self.instances.len() {
            self.last_error = format!("网格句柄不存在: {mesh_id}");
            return Err(UNKNOWN_MESH);
        }
        match self.instances[index].as_mut() {
            Some(mesh) => Ok(mesh),
            None => {
                self.last_error = format!("网格句柄已释放: {mesh_id}");
                Err(UNKNOWN_MESH)
            }
        }
    }

    /// 运行一个返回 `MeshResult` 的操作并翻译错误
    fn run<F>(&mut self, mesh_id: i32, operation: F) -> i32
    where
        F: FnOnce(&mut Mesh) -> MeshResult<()>,
    {
        let mesh = match self.mesh_mut(mesh_id) {
            Ok(mesh) => mesh,
            Err(code) => return code,
        };
        match operation(mesh) {
            Ok(()) => SUCCESS,
            Err(err) => self.record_error(&err),
        }
    }

    fn refresh(&mut self, mesh_id: i32, level: FlatCopyLevel) -> i32 {
        let index = mesh_id as usize;
        let mesh = match self.mesh_mut(mesh_id) {
            Ok(mesh) => mesh,
            Err(code) => return code,
        };
        let (dimensions, geometry) = set_flat_copies(mesh, level);
        self.dimensions[index] = dimensions;
        self.geometries[index] = geometry;
        SUCCESS
    }

    /// 错误翻译：结构异常记录位置，其余记录消息
    fn record_error(&mut self, err: &MeshError) -> i32 {
        self.last_error = err.to_string();
        log::warn!("接口操作失败: {}", self.last_error);
        match err {
            MeshError::Geometry { location, index } => {
                self.geometry_error_index = *index;
                self.geometry_error_location = location.code();
                INVALID_GEOMETRY
            }
            _ => EXCEPTION,
        }
    }
}

/// 分隔哨兵的自由函数形式
#[must_use]
pub fn separator() -> f64 {
    DOUBLE_MISSING_VALUE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_geometry() -> MeshGeometry {
        MeshGeometry {
            node_x: vec![0.0, 1.0, 1.0, 0.0],
            node_y: vec![0.0, 0.0, 1.0, 1.0],
            node_z: vec![0.0; 4],
            edge_nodes: vec![0, 1, 1, 2, 2, 3, 3, 0],
            ..MeshGeometry::default()
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut api = MeshKernelApi::new();
        let id = api.new_mesh();
        assert_eq!(id, 0);
        assert_eq!(api.deallocate_state(id), SUCCESS);
        // 释放后的句柄不可再用
        assert_eq!(api.get_mesh(id), UNKNOWN_MESH);
    }

    #[test]
    fn test_unknown_handle() {
        let mut api = MeshKernelApi::new();
        assert_eq!(api.get_mesh(42), UNKNOWN_MESH);
        assert!(api.get_error().contains("42"));
    }

    #[test]
    fn test_set_state_and_find_faces() {
        let mut api = MeshKernelApi::new();
        let id = api.new_mesh();
        assert_eq!(api.set_state(id, &square_geometry(), false), SUCCESS);

        let mut num_faces = 0;
        assert_eq!(api.find_faces(id, &mut num_faces), SUCCESS);
        assert_eq!(num_faces, 1);

        let dimensions = api.dimensions(id).unwrap();
        assert_eq!(dimensions.num_nodes, 4);
        assert_eq!(dimensions.num_edges, 4);
    }

    #[test]
    fn test_error_translation() {
        let mut api = MeshKernelApi::new();
        let id = api.new_mesh();
        api.set_state(id, &square_geometry(), false);

        // 越界删除是前置条件错误
        assert_eq!(api.delete_node(id, 99), EXCEPTION);
        assert!(!api.get_error().is_empty());
    }

    #[test]
    fn test_insert_edge_duplicate() {
        let mut api = MeshKernelApi::new();
        let id = api.new_mesh();
        api.set_state(id, &square_geometry(), false);

        let mut new_edge = usize::MAX;
        assert_eq!(api.insert_edge(id, 0, 2, &mut new_edge), SUCCESS);
        assert_eq!(new_edge, 4);

        // 重复检测基于上一次管理得到的关联表
        assert_eq!(api.get_mesh(id), SUCCESS);
        let mut unchanged = usize::MAX;
        assert_eq!(api.insert_edge(id, 0, 2, &mut unchanged), SUCCESS);
        assert_eq!(unchanged, usize::MAX);
    }
}
