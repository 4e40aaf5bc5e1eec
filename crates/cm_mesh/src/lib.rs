//! CoastMesh 网格内核
//!
//! 非结构二维网格的数据模型与算法核心：以节点/边数组为规范存储，
//! 面与各类关联表均为派生数据，由管理管线（administration）重建。
//!
//! # 核心类型
//!
//! - [`Mesh`]: 网格本体（规范数组 + 派生表 + 空间索引）
//! - [`Edge`]: 节点索引对，软删除写入哨兵
//! - [`Polygons`]: 带分隔哨兵的多段多边形选区
//! - [`CurvilinearGrid`]: 曲线网格，可抬升为非结构网格
//!
//! # 模块结构
//!
//! - [`mesh`]: 网格存储与基础查询
//! - [`administration`]: 管理管线（压实、关联、排序、找面、分类）
//! - [`circumcenter`]: 面外心迭代求解
//! - [`mutations`]: 变异操作（插入、删除、合并、移动、并集）
//! - [`queries`]: 派生查询（边界多边形、质量指标、对偶面）
//! - [`polygons`]: 多边形选区
//! - [`curvilinear`]: 曲线网格抬升与规则网格生成
//! - [`triangulation`]: 外部三角化服务的数据接缝
//! - [`averaging`]: 采样场平均插值器
//!
//! # 不变量
//!
//! 管理管线返回后：每条有效边引用两个有效节点；节点关联边按逆时针
//! 排序且无重复；每个面是逆时针的最小简单环；内部边恰被两个面共享。
//! 变异操作置脏标志并使网格处于"待管理"状态，后续查询触发重建。
//!
//! # 示例
//!
//! ```
//! use cm_geo::{Point, Projection};
//! use cm_mesh::{AdministrationOption, Edge, Mesh};
//!
//! let nodes = vec![
//!     Point::new(0.0, 0.0),
//!     Point::new(1.0, 0.0),
//!     Point::new(1.0, 1.0),
//!     Point::new(0.0, 1.0),
//! ];
//! let edges = vec![
//!     Edge::new(0, 1),
//!     Edge::new(1, 2),
//!     Edge::new(2, 3),
//!     Edge::new(3, 0),
//! ];
//! let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
//! mesh.administrate(AdministrationOption::EdgesAndFaces);
//! assert_eq!(mesh.num_faces(), 1);
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod administration;
pub mod averaging;
pub mod circumcenter;
pub mod curvilinear;
pub mod error;
pub mod mesh;
pub mod mutations;
pub mod polygons;
pub mod queries;
pub mod triangulation;

pub use administration::AdministrationOption;
pub use averaging::{AveragingInterpolation, AveragingMethod, MeshLocation, Sample};
pub use curvilinear::{CurvilinearGrid, MakeMeshParameters};
pub use error::{ErrorLocation, MeshError, MeshResult};
pub use mesh::{Edge, Mesh, NodeType};
pub use mutations::DeletionOption;
pub use polygons::Polygons;
pub use triangulation::TriangulationData;
