// crates/cm_mesh/src/averaging.rs

//! 采样场平均插值器
//!
//! 把散点采样场插值到网格位置（面心、节点、边心）。每个目标位置
//! 取一圈搜索多边形（面取收缩面环，节点取对偶面），收集其中的采样
//! 点并按所选方法聚合。
//!
//! 插值器持有网格的独占引用，计算期间网格不被外部修改是调用方
//! 契约。

use cm_geo::{operations, Point, SpatialIndex, DOUBLE_MISSING_VALUE};

use crate::administration::AdministrationOption;
use crate::error::{MeshError, MeshResult};
use crate::mesh::Mesh;

/// 采样点
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// X 坐标
    pub x: f64,
    /// Y 坐标
    pub y: f64,
    /// 采样值
    pub value: f64,
}

impl Sample {
    /// 创建采样点
    #[inline]
    #[must_use]
    pub const fn new(x: f64, y: f64, value: f64) -> Self {
        Self { x, y, value }
    }

    /// 采样点位置
    #[inline]
    #[must_use]
    pub fn point(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// 聚合方法
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AveragingMethod {
    /// 算术平均
    SimpleAveraging,
    /// 最近采样点
    Closest,
    /// 最大值
    Max,
    /// 最小值
    Min,
    /// 反距离加权
    InverseWeightedDistance,
    /// 绝对值最小者
    MinAbsValue,
}

/// 插值目标位置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshLocation {
    /// 面心
    Faces,
    /// 节点
    Nodes,
    /// 边心
    Edges,
}

/// 平均插值器
pub struct AveragingInterpolation<'a> {
    mesh: &'a mut Mesh,
    samples: Vec<Sample>,
    method: AveragingMethod,
    location: MeshLocation,
    relative_search_radius: f64,
    use_closest_sample_if_none_available: bool,
    transform_samples: bool,

    samples_rtree: SpatialIndex,
    visited_samples: Vec<bool>,
    results: Vec<f64>,
}

impl<'a> AveragingInterpolation<'a> {
    /// 创建插值器
    ///
    /// # 参数
    ///
    /// - `relative_search_radius`: 搜索多边形相对目标面的放大倍率
    /// - `use_closest_sample_if_none_available`: 搜索圈内无采样时
    ///   退化为全局最近采样
    /// - `transform_samples`: 命中后把采样值减一（细化驱动用）
    pub fn new(
        mesh: &'a mut Mesh,
        samples: Vec<Sample>,
        method: AveragingMethod,
        location: MeshLocation,
        relative_search_radius: f64,
        use_closest_sample_if_none_available: bool,
        transform_samples: bool,
    ) -> Self {
        Self {
            mesh,
            samples,
            method,
            location,
            relative_search_radius,
            use_closest_sample_if_none_available,
            transform_samples,
            samples_rtree: SpatialIndex::new(),
            visited_samples: Vec::new(),
            results: Vec::new(),
        }
    }

    /// 插值结果（与目标位置同序）
    #[must_use]
    pub fn results(&self) -> &[f64] {
        &self.results
    }

    /// 执行插值
    ///
    /// # 错误
    ///
    /// 无采样点返回 `Algorithm`。
    pub fn compute(&mut self) -> MeshResult<()> {
        if self.samples.is_empty() {
            return Err(MeshError::algorithm("平均插值: 没有可用的采样点"));
        }

        self.mesh.administrate(AdministrationOption::EdgesAndFaces);

        self.visited_samples = vec![false; self.samples.len()];
        let sample_points: Vec<Point> = self.samples.iter().map(Sample::point).collect();
        self.samples_rtree.build(&sample_points);

        let interpolated = match self.location {
            MeshLocation::Faces => self.compute_on_faces(),
            MeshLocation::Nodes | MeshLocation::Edges => self.compute_on_nodes(),
        };

        // 边心值取两端节点值的平均
        if self.location == MeshLocation::Edges {
            self.results = vec![DOUBLE_MISSING_VALUE; self.mesh.num_edges()];
            for (e, edge) in self.mesh.edges.iter().enumerate() {
                if !edge.is_valid() {
                    continue;
                }
                let first_value = interpolated[edge.first];
                let second_value = interpolated[edge.second];

                let first_missing = first_value == DOUBLE_MISSING_VALUE;
                let second_missing = second_value == DOUBLE_MISSING_VALUE;
                self.results[e] = if !first_missing && !second_missing {
                    0.5 * (first_value + second_value)
                } else if first_missing {
                    second_value
                } else {
                    first_value
                };
            }
            return Ok(());
        }

        self.results = interpolated;
        Ok(())
    }

    /// 面心插值：搜索多边形为面环向质心按倍率缩放
    fn compute_on_faces(&mut self) -> Vec<f64> {
        let num_faces = self.mesh.num_faces();
        let mut interpolated = vec![DOUBLE_MISSING_VALUE; num_faces];

        for f in 0..num_faces {
            let mass_center = self.mesh.faces_mass_centers[f];
            let mut polygon: Vec<Point> = self.mesh.faces_nodes[f]
                .iter()
                .map(|&n| {
                    mass_center
                        + (self.mesh.nodes[n] - mass_center) * self.relative_search_radius
                })
                .collect();
            polygon.push(polygon[0]);

            let result = self.compute_on_polygon(&polygon, mass_center);
            interpolated[f] = result;

            if self.transform_samples && result > 0.0 {
                for i in 0..self.samples_rtree.query_result_size() {
                    let sample = self.samples_rtree.query_result(i);
                    if !self.visited_samples[sample] {
                        self.visited_samples[sample] = true;
                        self.samples[sample].value -= 1.0;
                    }
                }
            }
        }
        interpolated
    }

    /// 节点插值：搜索多边形为节点对偶面
    fn compute_on_nodes(&mut self) -> Vec<f64> {
        let num_nodes = self.mesh.num_nodes();
        let mut interpolated = vec![DOUBLE_MISSING_VALUE; num_nodes];

        for n in 0..num_nodes {
            if self.mesh.nodes_num_edges[n] == 0 {
                continue;
            }
            let dual_face = self.mesh.make_dual_face(n, self.relative_search_radius);
            if dual_face.len() < 4 {
                continue;
            }
            interpolated[n] = self.compute_on_polygon(&dual_face, self.mesh.nodes[n]);
        }
        interpolated
    }

    /// 在搜索多边形内聚合采样值
    ///
    /// 搜索半径取插值点到多边形顶点的最大距离；命中的采样按方法
    /// 聚合，圈内无采样且允许回退时取全局最近采样。
    fn compute_on_polygon(&mut self, polygon: &[Point], interpolation_point: Point) -> f64 {
        let mut search_radius_squared = 0.0f64;
        for p in polygon {
            search_radius_squared = search_radius_squared.max(operations::squared_distance(
                p,
                &interpolation_point,
                self.mesh.projection,
            ));
        }

        self.samples_rtree
            .nearest_neighbors_within_squared_distance(&interpolation_point, search_radius_squared);

        let mut num_valid = 0usize;
        let mut accumulator = 0.0f64;
        let mut weight_sum = 0.0f64;
        let mut best = DOUBLE_MISSING_VALUE;
        let mut best_metric = f64::MAX;

        for i in 0..self.samples_rtree.query_result_size() {
            let sample_index = self.samples_rtree.query_result(i);
            let sample = self.samples[sample_index];
            let sample_point = sample.point();

            if !operations::is_point_in_polygon_nodes(
                &sample_point,
                polygon,
                self.mesh.projection,
            ) {
                continue;
            }
            num_valid += 1;

            match self.method {
                AveragingMethod::SimpleAveraging => accumulator += sample.value,
                AveragingMethod::Closest => {
                    let distance_squared = operations::squared_distance(
                        &sample_point,
                        &interpolation_point,
                        self.mesh.projection,
                    );
                    if distance_squared < best_metric {
                        best_metric = distance_squared;
                        best = sample.value;
                    }
                }
                AveragingMethod::Max => {
                    best = if num_valid == 1 { sample.value } else { best.max(sample.value) };
                }
                AveragingMethod::Min => {
                    best = if num_valid == 1 { sample.value } else { best.min(sample.value) };
                }
                AveragingMethod::InverseWeightedDistance => {
                    let distance = operations::distance(
                        &sample_point,
                        &interpolation_point,
                        self.mesh.projection,
                    )
                    .max(1e-8);
                    accumulator += sample.value / distance;
                    weight_sum += 1.0 / distance;
                }
                AveragingMethod::MinAbsValue => {
                    if sample.value.abs() < best_metric {
                        best_metric = sample.value.abs();
                        best = sample.value;
                    }
                }
            }
        }

        if num_valid > 0 {
            return match self.method {
                AveragingMethod::SimpleAveraging => accumulator / num_valid as f64,
                AveragingMethod::InverseWeightedDistance => accumulator / weight_sum,
                _ => best,
            };
        }

        if self.use_closest_sample_if_none_available {
            self.samples_rtree.nearest_neighbor(&interpolation_point);
            if self.samples_rtree.query_result_size() > 0 {
                return self.samples[self.samples_rtree.query_result(0)].value;
            }
        }

        DOUBLE_MISSING_VALUE
    }
}
