// crates/cm_mesh/src/error.rs

//! 网格内核错误类型
//!
//! 三类失败：
//!
//! - [`MeshError::InvalidArgument`]: 前置条件违反（越界索引、空输入）
//! - [`MeshError::Algorithm`]: 几何搜索无可行解（空索引上的最近邻等）
//! - [`MeshError::Geometry`]: 处理具体节点/边/面时发现的结构异常，
//!   携带位置类别与索引
//!
//! 内核内部错误立即向外传播，不吞异常；外部接口层负责翻译为
//! 整数返回码。

use thiserror::Error;

/// 网格模块结果类型
pub type MeshResult<T> = Result<T, MeshError>;

/// 结构异常的位置类别
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorLocation {
    /// 节点
    Node,
    /// 边
    Edge,
    /// 面
    Face,
}

impl ErrorLocation {
    /// 外部接口使用的整数编码
    #[inline]
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Node => 0,
            Self::Edge => 1,
            Self::Face => 2,
        }
    }
}

/// 网格内核错误
#[derive(Error, Debug)]
pub enum MeshError {
    /// 前置条件违反
    #[error("无效参数: {message}")]
    InvalidArgument {
        /// 违反说明
        message: String,
    },

    /// 几何搜索无可行解
    #[error("算法失败: {message}")]
    Algorithm {
        /// 失败说明
        message: String,
    },

    /// 结构异常
    #[error("几何结构异常: {location:?} {index}")]
    Geometry {
        /// 位置类别
        location: ErrorLocation,
        /// 异常元素索引
        index: usize,
    },
}

impl MeshError {
    /// 创建前置条件错误
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// 创建算法失败错误
    #[inline]
    pub fn algorithm(message: impl Into<String>) -> Self {
        Self::Algorithm {
            message: message.into(),
        }
    }

    /// 创建结构异常错误
    #[inline]
    pub fn geometry(location: ErrorLocation, index: usize) -> Self {
        Self::Geometry { location, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_contains_message() {
        let err = MeshError::invalid_argument("节点索引越界");
        assert!(err.to_string().contains("节点索引越界"));
    }

    #[test]
    fn test_geometry_error_carries_location() {
        let err = MeshError::geometry(ErrorLocation::Edge, 7);
        match err {
            MeshError::Geometry { location, index } => {
                assert_eq!(location, ErrorLocation::Edge);
                assert_eq!(index, 7);
            }
            _ => panic!("错误类别不符"),
        }
    }

    #[test]
    fn test_location_codes() {
        assert_eq!(ErrorLocation::Node.code(), 0);
        assert_eq!(ErrorLocation::Edge.code(), 1);
        assert_eq!(ErrorLocation::Face.code(), 2);
    }
}
