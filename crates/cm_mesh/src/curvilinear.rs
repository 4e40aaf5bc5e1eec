// crates/cm_mesh/src/curvilinear.rs

//! 曲线网格抬升与规则网格生成
//!
//! [`CurvilinearGrid`] 是二维点阵；抬升为非结构网格时跳过缺失节点，
//! 只在相邻两个都有效的点之间建边。[`Mesh::make_mesh`] 生成可选
//! 多边形裁剪的规则网格。

use cm_geo::constants::INVALID_INDEX;
use cm_geo::{operations, Point, Projection, DOUBLE_MISSING_VALUE};
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::mesh::{Edge, Mesh};
use crate::polygons::Polygons;

/// 曲线网格：行主序二维点阵
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CurvilinearGrid {
    /// 网格点，`grid[n][m]`，缺失值表示洞
    pub grid: Vec<Vec<Point>>,
}

impl CurvilinearGrid {
    /// 创建 `num_n × num_m` 的空网格（全缺失值）
    #[must_use]
    pub fn new(num_n: usize, num_m: usize) -> Self {
        Self {
            grid: vec![vec![Point::missing(); num_m]; num_n],
        }
    }

    /// 网格是否为空
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.grid.is_empty() || self.grid[0].is_empty()
    }

    /// 行数
    #[inline]
    #[must_use]
    pub fn num_n(&self) -> usize {
        self.grid.len()
    }

    /// 列数
    #[inline]
    #[must_use]
    pub fn num_m(&self) -> usize {
        if self.grid.is_empty() { 0 } else { self.grid[0].len() }
    }
}

/// 规则网格生成参数
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MakeMeshParameters {
    /// 列数（单元）
    pub num_columns: usize,
    /// 行数（单元）
    pub num_rows: usize,
    /// 网格旋转角 [deg]
    pub grid_angle: f64,
    /// X 方向步长
    pub block_size_x: f64,
    /// Y 方向步长
    pub block_size_y: f64,
    /// 原点 X
    pub origin_x: f64,
    /// 原点 Y
    pub origin_y: f64,
}

impl Default for MakeMeshParameters {
    fn default() -> Self {
        Self {
            num_columns: 3,
            num_rows: 3,
            grid_angle: 0.0,
            block_size_x: 10.0,
            block_size_y: 10.0,
            origin_x: 0.0,
            origin_y: 0.0,
        }
    }
}

impl Mesh {
    /// 曲线网格抬升为非结构网格
    ///
    /// 缺失网格点跳过；行向与列向只在两端都有效时建边。
    ///
    /// # 错误
    ///
    /// 空网格返回 `InvalidArgument`。
    pub fn from_curvilinear_grid(
        curvilinear_grid: &CurvilinearGrid,
        projection: Projection,
    ) -> MeshResult<Self> {
        if curvilinear_grid.is_empty() {
            return Err(MeshError::invalid_argument("曲线网格抬升: 网格为空"));
        }

        let num_n = curvilinear_grid.num_n();
        let num_m = curvilinear_grid.num_m();

        let mut nodes = Vec::with_capacity(num_n * num_m);
        let mut indices = vec![vec![INVALID_INDEX; num_m]; num_n];
        for n in 0..num_n {
            for m in 0..num_m {
                if curvilinear_grid.grid[n][m].is_valid() {
                    indices[n][m] = nodes.len();
                    nodes.push(curvilinear_grid.grid[n][m]);
                }
            }
        }

        let mut edges = Vec::with_capacity(num_n * num_m * 2);
        for n in 0..num_n.saturating_sub(1) {
            for m in 0..num_m {
                if indices[n][m] != INVALID_INDEX && indices[n + 1][m] != INVALID_INDEX {
                    edges.push(Edge::new(indices[n][m], indices[n + 1][m]));
                }
            }
        }
        for row in indices.iter().take(num_n) {
            for m in 0..num_m.saturating_sub(1) {
                if row[m] != INVALID_INDEX && row[m + 1] != INVALID_INDEX {
                    edges.push(Edge::new(row[m], row[m + 1]));
                }
            }
        }

        Ok(Self::new(edges, nodes, projection))
    }

    /// 生成规则网格，可选多边形裁剪
    ///
    /// 有裁剪选区时以选区第一个有效点为参考重算原点与行列数
    /// （旋转坐标系内取整上界），随后剔除完全落在选区外的单元节点。
    /// 球面系下行列数的上取整与参考点选择是既有限制：跨反子午线的
    /// 大选区结果依赖首个有效点。
    pub fn make_mesh(
        parameters: &MakeMeshParameters,
        polygons: &Polygons,
        projection: Projection,
    ) -> MeshResult<Self> {
        let mut num_m = parameters.num_columns + 1;
        let mut num_n = parameters.num_rows + 1;

        let cosine_angle = (parameters.grid_angle * cm_geo::constants::DEG2RAD).cos();
        let sine_angle = (parameters.grid_angle * cm_geo::constants::DEG2RAD).sin();
        let block_size_x = parameters.block_size_x;
        let block_size_y = parameters.block_size_y;
        let mut origin_x = parameters.origin_x;
        let mut origin_y = parameters.origin_y;

        if !polygons.is_empty() {
            if block_size_x <= 0.0 || block_size_y <= 0.0 {
                return Err(MeshError::invalid_argument("规则网格: 步长必须为正"));
            }

            let reference_point = polygons
                .nodes
                .iter()
                .find(|p| p.is_valid())
                .copied()
                .ok_or_else(|| MeshError::invalid_argument("规则网格: 选区没有有效点"))?;

            // 旋转坐标系 (xi, eta) 内的选区范围
            let mut xi_min = f64::MAX;
            let mut xi_max = f64::MIN;
            let mut eta_min = f64::MAX;
            let mut eta_max = f64::MIN;
            for node in polygons.nodes.iter().filter(|p| p.is_valid()) {
                let dx = operations::dx(&reference_point, node, projection);
                let dy = operations::dy(&reference_point, node, projection);
                let xi = dx * cosine_angle + dy * sine_angle;
                let eta = -dx * sine_angle + dy * cosine_angle;
                xi_min = xi_min.min(xi);
                xi_max = xi_max.max(xi);
                eta_min = eta_min.min(eta);
                eta_max = eta_max.max(eta);
            }

            let mut x_shift = xi_min * cosine_angle - eta_min * sine_angle;
            let mut y_shift = xi_min * sine_angle + eta_min * cosine_angle;
            if projection.is_spherical() {
                let ref_cos = (reference_point.y * cm_geo::constants::DEG2RAD).cos().max(1e-12);
                x_shift = x_shift / cm_geo::constants::EARTH_RADIUS * cm_geo::constants::RAD2DEG;
                y_shift = y_shift / (cm_geo::constants::EARTH_RADIUS * ref_cos)
                    * cm_geo::constants::RAD2DEG;
            }

            origin_x = reference_point.x + x_shift;
            origin_y = reference_point.y + y_shift;
            num_n = ((eta_max - eta_min) / block_size_x).ceil() as usize + 1;
            num_m = ((xi_max - xi_min) / block_size_y).ceil() as usize + 1;
        }

        let mut curvilinear_grid = CurvilinearGrid::new(num_n, num_m);
        for n in 0..num_n {
            for m in 0..num_m {
                let x = origin_x + m as f64 * block_size_x * cosine_angle
                    - n as f64 * block_size_y * sine_angle;
                let y = origin_y
                    + m as f64 * block_size_x * sine_angle
                    + n as f64 * block_size_y * cosine_angle;
                curvilinear_grid.grid[n][m] = Point::new(x, y);
            }
        }

        if !polygons.is_empty() {
            let mut node_based_mask = vec![vec![false; num_m]; num_n];
            let mut face_based_mask = vec![vec![false; num_m - 1]; num_n - 1];

            for n in 0..num_n {
                for m in 0..num_m {
                    if polygons.is_point_in_polygon(&curvilinear_grid.grid[n][m], 0, projection) {
                        node_based_mask[n][m] = true;
                    }
                }
            }

            // 至少一个角点入选的单元整体保留
            for n in 0..num_n - 1 {
                for m in 0..num_m - 1 {
                    if node_based_mask[n][m]
                        || node_based_mask[n + 1][m]
                        || node_based_mask[n][m + 1]
                        || node_based_mask[n + 1][m + 1]
                    {
                        face_based_mask[n][m] = true;
                    }
                }
            }

            for n in 0..num_n - 1 {
                for m in 0..num_m - 1 {
                    if face_based_mask[n][m] {
                        node_based_mask[n][m] = true;
                        node_based_mask[n + 1][m] = true;
                        node_based_mask[n][m + 1] = true;
                        node_based_mask[n + 1][m + 1] = true;
                    }
                }
            }

            for n in 0..num_n {
                for m in 0..num_m {
                    if !node_based_mask[n][m] {
                        curvilinear_grid.grid[n][m] =
                            Point::new(DOUBLE_MISSING_VALUE, DOUBLE_MISSING_VALUE);
                    }
                }
            }
        }

        Self::from_curvilinear_grid(&curvilinear_grid, projection)
    }
}
