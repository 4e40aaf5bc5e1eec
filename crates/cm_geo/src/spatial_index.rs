// crates/cm_geo/src/spatial_index.rs

//! 点集空间索引
//!
//! 基于 rstar R-Tree 的二维点索引，载荷为样本在原始数组中的整数
//! 下标。服务于节点合并、最近节点查找、最近边查找等内核操作。
//!
//! # 查询协议
//!
//! 查询结果写入内部结果缓冲，随后通过 [`SpatialIndex::query_result_size`]
//! 与 [`SpatialIndex::query_result`] 读取。半径查询按距离升序返回，
//! 最近样本位于缓冲首位。空树上的查询得到空结果，不报错。
//!
//! # 示例
//!
//! ```
//! use cm_geo::point::Point;
//! use cm_geo::spatial_index::SpatialIndex;
//!
//! let mut index = SpatialIndex::new();
//! index.build(&[Point::new(0.0, 0.0), Point::new(1.0, 0.0)]);
//!
//! index.nearest_neighbor(&Point::new(0.1, 0.1));
//! assert_eq!(index.query_result_size(), 1);
//! assert_eq!(index.query_result(0), 0);
//! ```

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use crate::point::Point;

/// 索引点：坐标加原始数组下标
#[derive(Clone, Copy, Debug, PartialEq)]
struct IndexedPoint {
    position: [f64; 2],
    /// 样本在原始数组中的下标
    index: usize,
}

impl RTreeObject for IndexedPoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for IndexedPoint {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

/// 点集空间索引
///
/// 无效点（缺失值）在构建时跳过，但保留其原始下标语义：载荷始终指
/// 向调用方数组中的位置。
#[derive(Debug, Default)]
pub struct SpatialIndex {
    tree: RTree<IndexedPoint>,
    /// 最近一次查询的结果缓冲（样本下标，距离升序）
    query_cache: Vec<usize>,
    /// 下一个插入点的载荷下标
    next_index: usize,
}

impl SpatialIndex {
    /// 创建空索引
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// 批量构建索引，替换既有内容
    ///
    /// 时间复杂度 O(n log n)。无效点跳过。
    pub fn build(&mut self, points: &[Point]) {
        let entries: Vec<IndexedPoint> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_valid())
            .map(|(i, p)| IndexedPoint {
                position: [p.x, p.y],
                index: i,
            })
            .collect();

        self.next_index = points.len();
        self.tree = RTree::bulk_load(entries);
        self.query_cache.clear();
    }

    /// 半径查询：收集平方距离不超过 `search_radius_squared` 的样本
    ///
    /// 结果按距离升序写入结果缓冲，最近样本在首位。
    pub fn nearest_neighbors_within_squared_distance(
        &mut self,
        point: &Point,
        search_radius_squared: f64,
    ) {
        self.query_cache.clear();
        if !point.is_valid() {
            return;
        }
        let target = [point.x, point.y];
        for entry in self.tree.nearest_neighbor_iter(&target) {
            if entry.distance_2(&target) > search_radius_squared {
                break;
            }
            self.query_cache.push(entry.index);
        }
    }

    /// 最近邻查询：结果缓冲只保留最近样本
    ///
    /// 空树得到空结果。
    pub fn nearest_neighbor(&mut self, point: &Point) {
        self.query_cache.clear();
        if !point.is_valid() {
            return;
        }
        if let Some(entry) = self.tree.nearest_neighbor(&[point.x, point.y]) {
            self.query_cache.push(entry.index);
        }
    }

    /// 插入一个点，载荷为当前计数
    pub fn insert(&mut self, point: &Point) {
        if !point.is_valid() {
            self.next_index += 1;
            return;
        }
        self.tree.insert(IndexedPoint {
            position: [point.x, point.y],
            index: self.next_index,
        });
        self.next_index += 1;
    }

    /// 按载荷下标删除样本
    ///
    /// 不存在时为空操作。
    pub fn remove_by_position(&mut self, index: usize) {
        let found = self.tree.iter().find(|e| e.index == index).copied();
        if let Some(entry) = found {
            self.tree.remove(&entry);
        }
    }

    /// 索引中的样本数
    #[inline]
    #[must_use]
    pub fn size(&self) -> usize {
        self.tree.size()
    }

    /// 索引是否为空
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// 最近一次查询的结果数
    #[inline]
    #[must_use]
    pub fn query_result_size(&self) -> usize {
        self.query_cache.len()
    }

    /// 读取最近一次查询的第 `k` 个结果（样本下标）
    #[inline]
    #[must_use]
    pub fn query_result(&self, k: usize) -> usize {
        self.query_cache[k]
    }
}
