// crates/cm_mesh/src/polygons.rs

//! 多边形选区
//!
//! 以带分隔哨兵的点序列表示多段多边形：段与段之间用坐标缺失值
//! 分隔，内外环之间用内外分隔哨兵分隔。空选区表示"全域"，所有
//! 包含测试都返回真。
//!
//! # 示例
//!
//! ```
//! use cm_geo::{Point, Projection};
//! use cm_mesh::polygons::Polygons;
//!
//! let square = Polygons::from_points(vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 1.0),
//! ]);
//! assert!(square.contains_point(&Point::new(0.5, 0.5), Projection::Cartesian));
//! assert!(!square.contains_point(&Point::new(2.0, 0.5), Projection::Cartesian));
//! ```

use cm_geo::{operations, Point, Projection};
use serde::{Deserialize, Serialize};

/// 多段多边形
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Polygons {
    /// 多边形节点，含分隔哨兵
    pub nodes: Vec<Point>,
    /// 每段的 `[起, 止]` 闭区间索引
    pub indices: Vec<[usize; 2]>,
}

impl Polygons {
    /// 空选区（全域）
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 由点序列构造，按缺失值哨兵切段
    #[must_use]
    pub fn from_points(nodes: Vec<Point>) -> Self {
        let mut indices = Vec::new();
        let mut start: Option<usize> = None;
        for (i, node) in nodes.iter().enumerate() {
            if node.is_valid() {
                if start.is_none() {
                    start = Some(i);
                }
                if i + 1 == nodes.len() {
                    indices.push([start.unwrap_or(i), i]);
                }
            } else if let Some(s) = start.take() {
                if i > s {
                    indices.push([s, i - 1]);
                }
            }
        }
        Self { nodes, indices }
    }

    /// 选区是否为空
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// 段数
    #[inline]
    #[must_use]
    pub fn num_polygons(&self) -> usize {
        self.indices.len()
    }

    /// 第 `part` 段的节点切片
    #[must_use]
    pub fn polygon_nodes(&self, part: usize) -> &[Point] {
        let [start, end] = self.indices[part];
        &self.nodes[start..=end]
    }

    /// 点是否落在第 `part` 段多边形内
    ///
    /// 空选区视为包含一切。
    #[must_use]
    pub fn is_point_in_polygon(&self, point: &Point, part: usize, projection: Projection) -> bool {
        if self.is_empty() {
            return true;
        }
        operations::is_point_in_polygon_nodes(point, self.polygon_nodes(part), projection)
    }

    /// 点是否落在任意一段内
    ///
    /// 空选区视为包含一切。
    #[must_use]
    pub fn contains_point(&self, point: &Point, projection: Projection) -> bool {
        if self.is_empty() {
            return true;
        }
        (0..self.num_polygons()).any(|part| {
            operations::is_point_in_polygon_nodes(point, self.polygon_nodes(part), projection)
        })
    }

    /// 第 `part` 段闭合周长
    #[must_use]
    pub fn perimeter_closed_polygon(&self, part: usize, projection: Projection) -> f64 {
        let nodes = self.polygon_nodes(part);
        if nodes.len() < 2 {
            return 0.0;
        }
        let mut perimeter = 0.0;
        for i in 0..nodes.len() {
            let next = (i + 1) % nodes.len();
            perimeter += operations::distance(&nodes[i], &nodes[next], projection);
        }
        perimeter
    }

    /// 第 `part` 段的最长边
    #[must_use]
    pub fn maximum_edge_length(&self, part: usize, projection: Projection) -> f64 {
        let nodes = self.polygon_nodes(part);
        let mut maximum = 0.0f64;
        for i in 0..nodes.len() {
            let next = (i + 1) % nodes.len();
            maximum = maximum.max(operations::distance(&nodes[i], &nodes[next], projection));
        }
        maximum
    }
}
