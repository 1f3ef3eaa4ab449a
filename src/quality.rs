//! Quality measures for a trained topology.
//!
//! All functions here only read the graph. Callers must not run them while
//! a training step is mutating it; [`crate::runner::Trainer`] takes them
//! under the network lock between steps.

use crate::error::{Result, TopogasError};
use crate::graph::search::bfs;
use crate::graph::{Graph, Node, NodeId};
use crate::input::Vector;
use crate::metric::Metric;
use ndarray::Array2;
use rayon::prelude::*;

/// Nearest and second-nearest node to `query` under squared Euclidean
/// distance. Ties go to the node inserted first.
fn nearest_two(nodes: &[&Node], query: &[f64]) -> Result<(Option<(NodeId, f64)>, Option<NodeId>)> {
    let metric = Metric::SQUARED_EUCLIDEAN;
    let mut first: Option<(NodeId, f64)> = None;
    let mut second: Option<(NodeId, f64)> = None;
    for node in nodes {
        let d = metric.distance(query, &node.position)?;
        match first {
            Some((_, best)) if d >= best => {
                if second.map_or(true, |(_, s)| d < s) {
                    second = Some((node.id, d));
                }
            }
            _ => {
                second = first;
                first = Some((node.id, d));
            }
        }
    }
    Ok((first, second.map(|(id, _)| id)))
}

/// Sum over all inputs of the squared Minkowski(2) value to the nearest
/// node. Minkowski(2) is itself unrooted, so each term is `(Σ dᵢ²)²`.
///
/// Returns 0 for an empty input set and fails with `Empty` when there are
/// inputs but no nodes.
pub fn sse(graph: &Graph, inputs: &[Vector]) -> Result<f64> {
    if inputs.is_empty() {
        return Ok(0.0);
    }
    if graph.is_empty() {
        return Err(TopogasError::Empty("cannot classify inputs without nodes".into()));
    }
    let nodes: Vec<&Node> = graph.nodes().collect();
    let errors = inputs
        .par_iter()
        .map(|v| {
            let (first, _) = nearest_two(&nodes, &v.position)?;
            Ok(first.map_or(0.0, |(_, d)| d * d))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(errors.iter().sum())
}

/// Joins, for every input, its two nearest nodes.
///
/// The result has the same node ids as `graph` and only the induced edges.
/// With fewer than two nodes it has no edges.
pub fn induced_delaunay_triangulation(graph: &Graph, inputs: &[Vector]) -> Result<Graph> {
    let mut triangulation = graph.without_edges();
    if graph.node_count() < 2 {
        return Ok(triangulation);
    }
    let nodes: Vec<&Node> = graph.nodes().collect();
    let pairs = inputs
        .par_iter()
        .map(|v| {
            let (first, second) = nearest_two(&nodes, &v.position)?;
            Ok(first.map(|(a, _)| a).zip(second))
        })
        .collect::<Result<Vec<Option<(NodeId, NodeId)>>>>()?;

    for (a, b) in pairs.into_iter().flatten() {
        if !triangulation.are_connected(a, b) {
            triangulation.add_edge(a, b)?;
        }
    }
    Ok(triangulation)
}

/// All-pairs hop distances over `ids`, unreachable pairs counting as 0.
fn hop_matrix(graph: &Graph, ids: &[NodeId]) -> Result<Array2<f64>> {
    for id in ids {
        graph.node(*id)?;
    }
    let adj = graph.adjacency();
    let rows: Vec<Vec<f64>> = ids
        .par_iter()
        .map(|from| {
            let dist = bfs(&adj, *from);
            ids.iter()
                .map(|to| dist.get(to).copied().unwrap_or(0) as f64)
                .collect()
        })
        .collect();

    let n = ids.len();
    let mut matrix = Array2::<f64>::zeros((n, n));
    for (i, row) in rows.iter().enumerate() {
        for (j, d) in row.iter().enumerate() {
            matrix[[i, j]] = *d;
        }
    }
    Ok(matrix)
}

/// Pearson correlation between the hop-distance matrices of `network` and
/// `triangulation`, over the strictly lower triangle.
///
/// Returns `None` when the coefficient is undefined: fewer than two nodes,
/// or either matrix has no variance.
pub fn topological_correlation(network: &Graph, triangulation: &Graph) -> Result<Option<f64>> {
    let ids = network.node_ids();
    if ids.len() < 2 {
        return Ok(None);
    }
    let a = hop_matrix(network, &ids)?;
    let b = hop_matrix(triangulation, &ids)?;

    let n = ids.len();
    let mut xs = Vec::with_capacity(n * (n - 1) / 2);
    let mut ys = Vec::with_capacity(n * (n - 1) / 2);
    for i in 1..n {
        for j in 0..i {
            xs.push(a[[i, j]]);
            ys.push(b[[i, j]]);
        }
    }
    Ok(pearson(&xs, &ys))
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len() as f64;
    if xs.is_empty() {
        return None;
    }
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut vx = 0.0;
    let mut vy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        cov += dx * dy;
        vx += dx * dx;
        vy += dy * dy;
    }
    if vx <= 0.0 || vy <= 0.0 {
        return None;
    }
    Some(cov / (vx * vy).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Unit;

    fn line(points: &[f64]) -> (Graph, Vec<NodeId>) {
        let mut g = Graph::new();
        let ids: Vec<NodeId> = points.iter().map(|x| g.insert(vec![*x], Unit::Plain)).collect();
        (g, ids)
    }

    fn vectors(points: &[f64]) -> Vec<Vector> {
        points.iter().map(|x| Vector::new(vec![*x])).collect()
    }

    #[test]
    fn test_sse() {
        let (g, _) = line(&[0.0, 10.0]);
        // Nearest values 1, 4 and 1, each squared.
        let sse = sse(&g, &vectors(&[1.0, 2.0, 9.0])).unwrap();
        assert!((sse - 18.0).abs() < 1e-10);
    }

    #[test]
    fn test_sse_in_two_dimensions() {
        let mut g = Graph::new();
        g.insert(vec![0.0, 0.0], Unit::Plain);
        let inputs = vec![Vector::new(vec![3.0, 4.0]), Vector::new(vec![0.0, 1.0])];
        assert!((sse(&g, &inputs).unwrap() - (625.0 + 1.0)).abs() < 1e-9);
    }

    #[test]
    fn test_sse_edge_cases() {
        let (g, _) = line(&[0.0]);
        assert_eq!(sse(&g, &[]).unwrap(), 0.0);
        assert!(matches!(
            sse(&Graph::new(), &vectors(&[1.0])),
            Err(TopogasError::Empty(_))
        ));
    }

    #[test]
    fn test_triangulation_joins_two_nearest() {
        let (g, ids) = line(&[0.0, 1.0, 2.0, 3.0]);
        let t = induced_delaunay_triangulation(&g, &vectors(&[0.4, 0.6, 2.4])).unwrap();
        assert_eq!(t.node_ids(), ids);
        assert_eq!(t.edge_count(), 2);
        assert!(t.are_connected(ids[0], ids[1]));
        assert!(t.are_connected(ids[2], ids[3]));
    }

    #[test]
    fn test_triangulation_single_node() {
        let (g, _) = line(&[0.0]);
        let t = induced_delaunay_triangulation(&g, &vectors(&[0.5])).unwrap();
        assert_eq!(t.edge_count(), 0);
        assert_eq!(t.node_count(), 1);
    }

    #[test]
    fn test_identical_topologies_correlate_perfectly() {
        let (mut g, ids) = line(&[0.0, 1.0, 2.0, 3.0]);
        for w in ids.windows(2) {
            g.add_edge(w[0], w[1]).unwrap();
        }
        let r = topological_correlation(&g, &g.clone()).unwrap().unwrap();
        assert!((r - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_correlation_undefined() {
        let (g, _) = line(&[0.0]);
        assert_eq!(topological_correlation(&g, &g).unwrap(), None);

        // No edges: every hop distance is 0, so there is no variance.
        let (g, _) = line(&[0.0, 1.0, 2.0]);
        assert_eq!(topological_correlation(&g, &g).unwrap(), None);
    }

    #[test]
    fn test_correlation_requires_same_nodes() {
        let (mut g, ids) = line(&[0.0, 1.0]);
        g.add_edge(ids[0], ids[1]).unwrap();
        let (other, _) = line(&[5.0]);
        assert!(topological_correlation(&g, &other).is_err());
    }

    #[test]
    fn test_pearson() {
        let r = pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-10);
    }
}
