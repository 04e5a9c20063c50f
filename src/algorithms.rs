//! Traversal, shortest-path and spanning-tree algorithms over [`Graph`].
//!
//! All functions are synchronous and borrow the graph immutably. Neighbor
//! order always follows edge insertion order, which makes BFS/DFS output
//! deterministic for a given construction sequence.

use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

use crate::domain::{Edge, EdgeId, Graph, GraphError, NodeId};
use crate::union_find::DisjointSet;

fn ensure_contains(graph: &Graph, id: NodeId) -> Result<(), GraphError> {
    if graph.contains(id) {
        Ok(())
    } else {
        Err(GraphError::NotFound(format!("#{}", id.index())))
    }
}

/// Breadth-first traversal from `start`.
///
/// Returns reachable nodes in visit order, each exactly once.
///
/// # Examples
///
/// ```
/// use city_graph::algorithms::bfs;
/// use city_graph::domain::{CityNode, Graph};
///
/// let mut g = Graph::new();
/// let a = g.add_node(CityNode::new("A", 0.0, 0.0));
/// let b = g.add_node(CityNode::new("B", 0.0, 1.0));
/// let c = g.add_node(CityNode::new("C", 1.0, 1.0));
/// g.add_edge(a, b).unwrap();
/// g.add_edge(a, c).unwrap();
///
/// assert_eq!(bfs(&g, b).unwrap(), vec![b, a, c]);
/// ```
pub fn bfs(graph: &Graph, start: NodeId) -> Result<Vec<NodeId>, GraphError> {
    ensure_contains(graph, start)?;

    let mut visited = HashSet::from([start]);
    let mut queue = VecDeque::from([start]);
    let mut order = Vec::new();

    while let Some(current) = queue.pop_front() {
        order.push(current);
        for (neighbor, _) in graph.neighbors(current) {
            if visited.insert(neighbor) {
                queue.push_back(neighbor);
            }
        }
    }

    Ok(order)
}

/// Depth-first traversal from `start`.
///
/// Produces the same order as the recursive formulation (descend into the
/// first unvisited neighbor, backtrack when exhausted) using an explicit
/// stack of pending neighbor lists.
///
/// # Examples
///
/// ```
/// use city_graph::algorithms::dfs;
/// use city_graph::domain::{CityNode, Graph};
///
/// let mut g = Graph::new();
/// let a = g.add_node(CityNode::new("A", 0.0, 0.0));
/// let b = g.add_node(CityNode::new("B", 0.0, 1.0));
/// let c = g.add_node(CityNode::new("C", 1.0, 1.0));
/// let d = g.add_node(CityNode::new("D", 1.0, 0.0));
/// g.add_edge(a, b).unwrap();
/// g.add_edge(a, d).unwrap();
/// g.add_edge(b, c).unwrap();
///
/// assert_eq!(dfs(&g, a).unwrap(), vec![a, b, c, d]);
/// ```
pub fn dfs(graph: &Graph, start: NodeId) -> Result<Vec<NodeId>, GraphError> {
    ensure_contains(graph, start)?;

    let mut visited = HashSet::from([start]);
    let mut order = vec![start];
    let mut stack = vec![graph.neighbors(start).into_iter()];

    loop {
        let next = match stack.last_mut() {
            Some(pending) => pending.next(),
            None => break,
        };
        match next {
            Some((neighbor, _)) => {
                if visited.insert(neighbor) {
                    order.push(neighbor);
                    stack.push(graph.neighbors(neighbor).into_iter());
                }
            }
            None => {
                stack.pop();
            }
        }
    }

    Ok(order)
}

/// Single-source shortest path distances and predecessor links.
#[derive(Debug, Clone)]
pub struct ShortestPaths {
    pub source: NodeId,
    /// Best known distance for every node; `f64::INFINITY` if unreachable.
    pub distances: HashMap<NodeId, f64>,
    /// Predecessor on the best path; absent for the source and unreachable nodes.
    pub predecessors: HashMap<NodeId, NodeId>,
}

impl ShortestPaths {
    pub fn distance(&self, node: NodeId) -> f64 {
        self.distances.get(&node).copied().unwrap_or(f64::INFINITY)
    }

    pub fn is_reachable(&self, node: NodeId) -> bool {
        self.distance(node).is_finite()
    }
}

/// Dijkstra's algorithm from `start` over the non-negative edge weights.
///
/// Uses a binary heap with lazy deletion: stale entries whose recorded
/// distance exceeds the settled distance are skipped when popped.
pub fn dijkstra(graph: &Graph, start: NodeId) -> Result<ShortestPaths, GraphError> {
    ensure_contains(graph, start)?;

    let mut distances: HashMap<NodeId, f64> =
        graph.node_ids().map(|id| (id, f64::INFINITY)).collect();
    let mut predecessors = HashMap::new();
    let mut heap = BinaryHeap::new();

    distances.insert(start, 0.0);
    heap.push(Reverse((OrderedFloat(0.0), start)));

    while let Some(Reverse((OrderedFloat(dist), current))) = heap.pop() {
        if dist > distances.get(&current).copied().unwrap_or(f64::INFINITY) {
            continue;
        }

        for (neighbor, weight) in graph.neighbors(current) {
            let candidate = dist + weight;
            if candidate < distances.get(&neighbor).copied().unwrap_or(f64::INFINITY) {
                distances.insert(neighbor, candidate);
                predecessors.insert(neighbor, current);
                heap.push(Reverse((OrderedFloat(candidate), neighbor)));
            }
        }
    }

    Ok(ShortestPaths {
        source: start,
        distances,
        predecessors,
    })
}

/// A path through the graph with its total weight.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub total_km: f64,
}

impl Path {
    /// Consecutive node pairs along the path.
    pub fn legs(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.nodes.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Shortest path from `start` to `end`.
///
/// `start == end` yields the single-node path. An unreachable `end` yields
/// [`GraphError::NoPathFound`]. The returned path always begins with `start`.
///
/// # Examples
///
/// ```
/// use city_graph::algorithms::shortest_path;
/// use city_graph::domain::{CityNode, Graph};
///
/// let mut g = Graph::new();
/// let a = g.add_node(CityNode::new("A", 0.0, 0.0));
/// let b = g.add_node(CityNode::new("B", 0.0, 1.0));
/// let c = g.add_node(CityNode::new("C", 1.0, 1.0));
/// g.add_edge(a, b).unwrap();
/// g.add_edge(b, c).unwrap();
///
/// let path = shortest_path(&g, a, c).unwrap();
/// assert_eq!(path.nodes, vec![a, b, c]);
/// assert!((path.total_km - 222.39).abs() < 0.02);
/// ```
pub fn shortest_path(graph: &Graph, start: NodeId, end: NodeId) -> Result<Path, GraphError> {
    ensure_contains(graph, end)?;
    let paths = dijkstra(graph, start)?;

    if start == end {
        return Ok(Path {
            nodes: vec![start],
            total_km: 0.0,
        });
    }

    if !paths.is_reachable(end) {
        return Err(GraphError::NoPathFound {
            from: graph.name_of(start).to_string(),
            to: graph.name_of(end).to_string(),
        });
    }

    let mut nodes = vec![end];
    let mut current = end;
    while let Some(&prev) = paths.predecessors.get(&current) {
        nodes.push(prev);
        current = prev;
        if prev == start {
            break;
        }
    }
    nodes.reverse();

    if nodes.first() != Some(&start) {
        nodes.insert(0, start);
    }

    Ok(Path {
        total_km: paths.distance(end),
        nodes,
    })
}

/// Kruskal's minimum spanning tree (or forest, if disconnected).
///
/// Edges are considered in ascending weight order; ties keep insertion
/// order. The result lists accepted edges in the order they were accepted.
///
/// # Examples
///
/// ```
/// use city_graph::algorithms::minimum_spanning_tree;
/// use city_graph::domain::{CityNode, Graph};
///
/// let mut g = Graph::new();
/// let a = g.add_node(CityNode::new("A", 0.0, 0.0));
/// let b = g.add_node(CityNode::new("B", 0.0, 1.0));
/// let c = g.add_node(CityNode::new("C", 1.0, 1.0));
/// g.add_edge(a, b).unwrap();
/// g.add_edge(b, c).unwrap();
/// g.add_edge(a, c).unwrap();
///
/// let tree = minimum_spanning_tree(&g);
/// assert_eq!(tree.len(), 2);
/// ```
pub fn minimum_spanning_tree(graph: &Graph) -> Vec<EdgeId> {
    let mut sorted: Vec<(EdgeId, Edge)> = graph.edge_ids().zip(graph.edges()).collect();
    sorted.sort_by_key(|(_, edge)| OrderedFloat(edge.weight_km));

    let mut sets = DisjointSet::new(graph.node_ids());
    let mut tree = Vec::with_capacity(graph.node_count().saturating_sub(1));

    for (id, edge) in sorted {
        if sets.find(edge.from) != sets.find(edge.to) {
            sets.union(edge.from, edge.to);
            tree.push(id);
        }
    }

    tree
}

/// Sum of the weights of the given edges.
pub fn total_weight_km(graph: &Graph, edges: &[EdgeId]) -> f64 {
    edges
        .iter()
        .filter_map(|&id| graph.edge(id))
        .map(|e| e.weight_km)
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CityNode;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn abc() -> (Graph, NodeId, NodeId, NodeId) {
        let mut g = Graph::new();
        let a = g.add_node(CityNode::new("A", 0.0, 0.0));
        let b = g.add_node(CityNode::new("B", 0.0, 1.0));
        let c = g.add_node(CityNode::new("C", 1.0, 1.0));
        g.add_edge(a, b).unwrap();
        g.add_edge(b, c).unwrap();
        (g, a, b, c)
    }

    /// Random graph with `n` nodes; each pair connected with probability `p`.
    fn random_graph(rng: &mut StdRng, n: usize, p: f64) -> Graph {
        let mut g = Graph::new();
        for i in 0..n {
            let lat = rng.gen_range(13.0..14.5);
            let lng = rng.gen_range(-90.0..-87.5);
            g.add_node(CityNode::new(format!("N{}", i), lat, lng));
        }
        for i in 0..n {
            for j in (i + 1)..n {
                if rng.gen_bool(p) {
                    g.add_edge(NodeId::new(i), NodeId::new(j)).unwrap();
                }
            }
        }
        g
    }

    /// Connected random graph: a random spanning chain plus extra edges.
    fn random_connected_graph(rng: &mut StdRng, n: usize, p: f64) -> Graph {
        let mut g = random_graph(rng, n, p);
        for i in 1..n {
            let j = rng.gen_range(0..i);
            if !g.has_edge_between(NodeId::new(i), NodeId::new(j)) {
                g.add_edge(NodeId::new(i), NodeId::new(j)).unwrap();
            }
        }
        g
    }

    /// Exhaustive shortest simple-path distance via DFS over all paths.
    fn brute_force_distance(g: &Graph, from: NodeId, to: NodeId) -> f64 {
        fn walk(g: &Graph, cur: NodeId, to: NodeId, seen: &mut Vec<bool>, acc: f64, best: &mut f64) {
            if cur == to {
                *best = best.min(acc);
                return;
            }
            for (n, w) in g.neighbors(cur) {
                if !seen[n.index()] {
                    seen[n.index()] = true;
                    walk(g, n, to, seen, acc + w, best);
                    seen[n.index()] = false;
                }
            }
        }
        let mut seen = vec![false; g.node_count()];
        seen[from.index()] = true;
        let mut best = f64::INFINITY;
        walk(g, from, to, &mut seen, 0.0, &mut best);
        best
    }

    /// Minimum spanning tree weight by trying every (|V|-1)-edge subset.
    fn brute_force_mst_weight(g: &Graph) -> f64 {
        let m = g.edge_count();
        let need = g.node_count() - 1;
        let mut best = f64::INFINITY;
        for mask in 0u32..(1 << m) {
            if mask.count_ones() as usize != need {
                continue;
            }
            let edges: Vec<_> = g.edges().collect();
            let mut sets = DisjointSet::new(g.node_ids());
            let mut weight = 0.0;
            let mut acyclic = true;
            for i in 0..m {
                if mask & (1 << i) != 0 {
                    let e = edges[i];
                    if !sets.union(e.from, e.to) {
                        acyclic = false;
                        break;
                    }
                    weight += e.weight_km;
                }
            }
            if acyclic {
                best = best.min(weight);
            }
        }
        best
    }

    #[test]
    fn test_abc_shortest_path() {
        let (g, a, b, c) = abc();
        let path = shortest_path(&g, a, c).unwrap();
        assert_eq!(path.nodes, vec![a, b, c]);
        assert!((path.total_km - 222.39).abs() < 0.02);

        let legs: f64 = path
            .legs()
            .map(|(x, y)| g.node(x).unwrap().distance_km(g.node(y).unwrap()))
            .sum();
        assert!((legs - path.total_km).abs() < 1e-9);
    }

    #[test]
    fn test_abc_mst() {
        let (g, _, _, _) = abc();
        let tree = minimum_spanning_tree(&g);
        assert_eq!(tree, vec![EdgeId::new(0), EdgeId::new(1)]);
        assert!((total_weight_km(&g, &tree) - 222.39).abs() < 0.02);
    }

    #[test]
    fn test_shortest_path_same_node() {
        let (g, a, _, _) = abc();
        let path = shortest_path(&g, a, a).unwrap();
        assert_eq!(path.nodes, vec![a]);
        assert_eq!(path.total_km, 0.0);
    }

    #[test]
    fn test_shortest_path_unreachable() {
        let (mut g, a, _, _) = abc();
        let d = g.add_node(CityNode::new("D", 5.0, 5.0));
        let err = shortest_path(&g, a, d).unwrap_err();
        assert_eq!(
            err,
            GraphError::NoPathFound {
                from: "A".into(),
                to: "D".into()
            }
        );
    }

    #[test]
    fn test_unknown_start_is_not_found() {
        let (g, a, _, _) = abc();
        let ghost = NodeId::new(99);
        assert!(matches!(bfs(&g, ghost), Err(GraphError::NotFound(_))));
        assert!(matches!(dfs(&g, ghost), Err(GraphError::NotFound(_))));
        assert!(matches!(dijkstra(&g, ghost), Err(GraphError::NotFound(_))));
        assert!(matches!(shortest_path(&g, a, ghost), Err(GraphError::NotFound(_))));
    }

    #[test]
    fn test_dijkstra_unreachable_has_infinity_and_no_predecessor() {
        let (mut g, a, _, _) = abc();
        let d = g.add_node(CityNode::new("D", 5.0, 5.0));
        let paths = dijkstra(&g, a).unwrap();
        assert_eq!(paths.distance(a), 0.0);
        assert!(paths.distance(d).is_infinite());
        assert!(!paths.predecessors.contains_key(&d));
        assert!(!paths.predecessors.contains_key(&a));
    }

    #[test]
    fn test_traversals_exclude_unreachable() {
        let (mut g, a, b, c) = abc();
        g.add_node(CityNode::new("D", 5.0, 5.0));
        assert_eq!(bfs(&g, a).unwrap(), vec![a, b, c]);
        assert_eq!(dfs(&g, a).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn test_bfs_and_dfs_order_differ() {
        // A star at A with a tail behind its first neighbor:
        //   A - B - D
        //   A - C
        let mut g = Graph::new();
        let a = g.add_node(CityNode::new("A", 0.0, 0.0));
        let b = g.add_node(CityNode::new("B", 0.0, 1.0));
        let c = g.add_node(CityNode::new("C", 1.0, 0.0));
        let d = g.add_node(CityNode::new("D", 0.0, 2.0));
        g.add_edge(a, b).unwrap();
        g.add_edge(a, c).unwrap();
        g.add_edge(b, d).unwrap();

        assert_eq!(bfs(&g, a).unwrap(), vec![a, b, c, d]);
        assert_eq!(dfs(&g, a).unwrap(), vec![a, b, d, c]);
    }

    #[test]
    fn test_parallel_edges_visit_once() {
        let (mut g, a, b, c) = abc();
        g.add_edge(b, a).unwrap();
        g.add_edge(a, b).unwrap();

        assert_eq!(bfs(&g, a).unwrap(), vec![a, b, c]);
        assert_eq!(dfs(&g, a).unwrap(), vec![a, b, c]);
        assert_eq!(minimum_spanning_tree(&g).len(), 2);
    }

    #[test]
    fn test_mst_forest_when_disconnected() {
        let (mut g, _, _, _) = abc();
        let d = g.add_node(CityNode::new("D", 5.0, 5.0));
        let e = g.add_node(CityNode::new("E", 5.0, 6.0));
        g.add_edge(d, e).unwrap();
        assert_eq!(minimum_spanning_tree(&g).len(), 3);
    }

    #[test]
    fn test_mst_ties_keep_insertion_order() {
        // Three equal-weight edges along the equator; the parallel pair A-B
        // ties and only the first inserted one may be accepted.
        let mut g = Graph::new();
        let a = g.add_node(CityNode::new("A", 0.0, 0.0));
        let b = g.add_node(CityNode::new("B", 0.0, 1.0));
        let c = g.add_node(CityNode::new("C", 0.0, 2.0));
        g.add_edge(a, b).unwrap();
        g.add_edge(b, a).unwrap();
        g.add_edge(b, c).unwrap();

        assert_eq!(minimum_spanning_tree(&g), vec![EdgeId::new(0), EdgeId::new(2)]);
    }

    #[test]
    fn test_random_graphs_full_traversal() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let g = random_connected_graph(&mut rng, 8, 0.3);
            for start in g.node_ids() {
                let b = bfs(&g, start).unwrap();
                let d = dfs(&g, start).unwrap();
                assert_eq!(b.len(), g.node_count());
                assert_eq!(d.len(), g.node_count());
                assert_eq!(b.iter().collect::<HashSet<_>>().len(), g.node_count());
                assert_eq!(d.iter().collect::<HashSet<_>>().len(), g.node_count());
                assert_eq!(b[0], start);
                assert_eq!(d[0], start);
            }
        }
    }

    #[test]
    fn test_dijkstra_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..20 {
            let g = random_graph(&mut rng, 7, 0.4);
            for start in g.node_ids() {
                let paths = dijkstra(&g, start).unwrap();
                assert_eq!(paths.distance(start), 0.0);
                for end in g.node_ids() {
                    let expected = brute_force_distance(&g, start, end);
                    let got = paths.distance(end);
                    if expected.is_infinite() {
                        assert!(got.is_infinite());
                    } else {
                        assert!((expected - got).abs() < 1e-6, "{} vs {}", expected, got);
                    }
                }
            }
        }
    }

    #[test]
    fn test_path_weights_equal_dijkstra_distance() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let g = random_connected_graph(&mut rng, 8, 0.25);
            let start = NodeId::new(0);
            let paths = dijkstra(&g, start).unwrap();
            for end in g.node_ids() {
                let path = shortest_path(&g, start, end).unwrap();
                assert_eq!(path.nodes[0], start);
                assert_eq!(*path.nodes.last().unwrap(), end);
                let sum: f64 = path
                    .legs()
                    .map(|(x, y)| {
                        g.neighbors(x)
                            .into_iter()
                            .filter(|(n, _)| *n == y)
                            .map(|(_, w)| w)
                            .fold(f64::INFINITY, f64::min)
                    })
                    .sum();
                assert!((sum - paths.distance(end)).abs() < 1e-6);
                assert!((path.total_km - paths.distance(end)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_mst_matches_brute_force() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..15 {
            let g = random_connected_graph(&mut rng, 6, 0.35);
            let tree = minimum_spanning_tree(&g);
            assert_eq!(tree.len(), g.node_count() - 1);
            let expected = brute_force_mst_weight(&g);
            assert!((total_weight_km(&g, &tree) - expected).abs() < 1e-6);
        }
    }
}
