//! 派生查询集成测试
//!
//! 覆盖悬挂边、钝角三角形、小流边、边界折线提取与质量指标。

use cm_geo::constants::is_equal;
use cm_geo::{Point, Projection, DOUBLE_MISSING_VALUE};
use cm_mesh::{AdministrationOption, CurvilinearGrid, Edge, Mesh, Polygons};

#[test]
fn test_hanging_edge_and_node_type() {
    // 单位正方形加中心悬挂节点
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

    assert_eq!(mesh.nodes_types[4], -1);
    assert_eq!(mesh.get_hanging_edges(), vec![4]);
}

#[test]
fn test_obtuse_triangle_centers() {
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(5.0, 0.1),
    ];
    let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
    let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);

    let centers = mesh.get_obtuse_triangles_centers();
    assert_eq!(centers.len(), 1);
    assert!((centers[0].x - 5.0).abs() < 1e-10);
    assert!((centers[0].y - 0.1 / 3.0).abs() < 1e-10);
}

#[test]
fn test_small_flow_edge_reported() {
    // 两个相邻的扁平三角形：外心距离远小于 θ·(√A₀+√A₁)/2
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(1.0, 0.05),
        Point::new(1.0, -0.05),
    ];
    let edges = vec![
        Edge::new(0, 1),
        Edge::new(1, 2),
        Edge::new(2, 0),
        Edge::new(0, 3),
        Edge::new(3, 1),
    ];
    let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);

    let reported = mesh.get_edges_crossing_small_flow_edges(0.2);
    assert_eq!(reported, vec![0]);

    let centers = mesh.get_flow_edges_centers(&reported);
    assert_eq!(centers.len(), 1);
    assert!((centers[0].x - 1.0).abs() < 1e-6);
}

#[test]
fn test_curvilinear_grid_boundary_ring() {
    // 3x3 矩形点阵抬升后，边界提取应给出外圈闭合折线 + 结尾哨兵
    let mut grid = CurvilinearGrid::new(3, 3);
    for n in 0..3 {
        for m in 0..3 {
            grid.grid[n][m] = Point::new(m as f64, n as f64);
        }
    }
    let mut mesh = Mesh::from_curvilinear_grid(&grid, Projection::Cartesian).unwrap();

    let boundary = mesh.mesh_boundary_to_polygon(&Polygons::new());

    // 外圈 8 个节点，闭合重复 1 个，结尾哨兵 1 个
    assert_eq!(boundary.len(), 10);
    assert!(!boundary[9].is_valid());
    assert_eq!(boundary[0], boundary[8]);

    // 折线里恰好出现全部 8 个边界节点，且不含内部节点 (1,1)
    let ring = &boundary[..8];
    for corner in [
        Point::new(0.0, 0.0),
        Point::new(2.0, 0.0),
        Point::new(2.0, 2.0),
        Point::new(0.0, 2.0),
        Point::new(1.0, 0.0),
        Point::new(2.0, 1.0),
        Point::new(1.0, 2.0),
        Point::new(0.0, 1.0),
    ] {
        assert!(ring.contains(&corner));
    }
    assert!(!ring.contains(&Point::new(1.0, 1.0)));

    // 除结尾哨兵外只有一条折线
    let separators = boundary.iter().filter(|p| !p.is_valid()).count();
    assert_eq!(separators, 1);
}

#[test]
fn test_orthogonality_perpendicular_configuration() {
    // 上下对称的两个三角形共享横边：外心连线与共享边垂直
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.5, 1.0),
        Point::new(0.5, -1.0),
    ];
    let edges = vec![
        Edge::new(0, 1),
        Edge::new(1, 2),
        Edge::new(2, 0),
        Edge::new(0, 3),
        Edge::new(3, 1),
    ];
    let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
    mesh.administrate(AdministrationOption::EdgesAndFaces);

    let orthogonality = mesh.get_orthogonality();
    assert!(orthogonality[0].abs() < 1e-10);
    for e in 1..5 {
        assert!(is_equal(orthogonality[e], DOUBLE_MISSING_VALUE));
    }
}

#[test]
fn test_smoothness_area_ratio() {
    // 共享边两侧面积比 2:1
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.5, 1.0),
        Point::new(0.5, -2.0),
    ];
    let edges = vec![
        Edge::new(0, 1),
        Edge::new(1, 2),
        Edge::new(2, 0),
        Edge::new(0, 3),
        Edge::new(3, 1),
    ];
    let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
    mesh.administrate(AdministrationOption::EdgesAndFaces);

    let smoothness = mesh.get_smoothness();
    assert!((smoothness[0] - 2.0).abs() < 1e-10);
    assert!(is_equal(smoothness[1], DOUBLE_MISSING_VALUE));
}

#[test]
fn test_dual_face_around_internal_node() {
    // 中心节点被四个三角形包围
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.0, 1.0),
        Point::new(-1.0, 0.0),
        Point::new(0.0, -1.0),
    ];
    let edges = vec![
        Edge::new(0, 1),
        Edge::new(0, 2),
        Edge::new(0, 3),
        Edge::new(0, 4),
        Edge::new(1, 2),
        Edge::new(2, 3),
        Edge::new(3, 4),
        Edge::new(4, 1),
    ];
    let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
    mesh.administrate(AdministrationOption::EdgesAndFaces);

    let dual = mesh.make_dual_face(0, 1.0);
    assert_eq!(dual.len(), 9);
    assert_eq!(dual[0], dual[8]);

    // 缩放因子 0.5 把对偶面压向质心
    let shrunk = mesh.make_dual_face(0, 0.5);
    let radius = |ring: &[Point]| -> f64 {
        ring.iter().map(|p| p.length()).fold(0.0, f64::max)
    };
    assert!(radius(&shrunk[..8]) < radius(&dual[..8]));
}

#[test]
fn test_aspect_ratios_regular_grid() {
    // 2x2 单元的规则网格，长宽比应接近 1
    let mut grid = CurvilinearGrid::new(3, 3);
    for n in 0..3 {
        for m in 0..3 {
            grid.grid[n][m] = Point::new(m as f64, n as f64);
        }
    }
    let mut mesh = Mesh::from_curvilinear_grid(&grid, Projection::Cartesian).unwrap();

    let ratios = mesh.compute_aspect_ratios();
    assert_eq!(ratios.len(), mesh.num_edges());
    for e in 0..mesh.num_edges() {
        assert!(ratios[e] > 0.5 && ratios[e] < 1.5);
    }
}

#[test]
fn test_boundary_polygon_with_filter() {
    // 过滤选区只盖住网格左半边：只提取与之相交的边界
    let mut grid = CurvilinearGrid::new(2, 3);
    for n in 0..2 {
        for m in 0..3 {
            grid.grid[n][m] = Point::new(m as f64, n as f64);
        }
    }
    let mut mesh = Mesh::from_curvilinear_grid(&grid, Projection::Cartesian).unwrap();

    let filter = Polygons::from_points(vec![
        Point::new(-0.5, -0.5),
        Point::new(0.5, -0.5),
        Point::new(0.5, 1.5),
        Point::new(-0.5, 1.5),
    ]);
    let boundary = mesh.mesh_boundary_to_polygon(&filter);

    assert!(!boundary.is_empty());
    // 右端节点 (2, *) 不在选区内，不应出现在折线中
    for p in boundary.iter().filter(|p| p.is_valid()) {
        assert!(p.x < 1.5);
    }
}

#[test]
fn test_node_neighbours_and_common_node() {
    let nodes = vec![
        Point::new(0.0, 0.0),
        Point::new(1.0, 0.0),
        Point::new(0.5, 1.0),
    ];
    let edges = vec![Edge::new(0, 1), Edge::new(1, 2), Edge::new(2, 0)];
    let mut mesh = Mesh::new(edges, nodes, Projection::Cartesian);
    mesh.compute_node_neighbours();

    let mut neighbours = mesh.nodes_nodes[1].clone();
    neighbours.sort_unstable();
    assert_eq!(neighbours, vec![0, 2]);

    assert_eq!(mesh.find_common_node(0, 1).unwrap(), 1);
}
