//! Bipartition and maximum-cardinality matching helpers shared by the
//! Clustering CSP builder (§4.C.3) and the Symmetrization Reducer (§4.G).
//!
//! Components the reducer enumerates matchings over are small by
//! construction (§4.G, §9), so a brute-force backtracking search is simpler
//! and just as fast here as a general Blossom-algorithm implementation would
//! be, and it is easy to verify against §8's testable properties directly.

use itertools::Itertools;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// 2-colors the subgraph induced by `vertices`/`edges` into `(L, R)` with
/// `|L| <= |R|`, or returns `None` if the component is not bipartite.
#[must_use]
pub fn bipartition(vertices: &[usize], edges: &[(usize, usize)]) -> Option<(Vec<usize>, Vec<usize>)> {
    let mut adjacency: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for &(a, b) in edges {
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }

    let mut color: FxHashMap<usize, bool> = FxHashMap::default();
    for &start in vertices {
        if color.contains_key(&start) {
            continue;
        }
        color.insert(start, true);
        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(v) = queue.pop_front() {
            let v_color = color[&v];
            for &w in adjacency.get(&v).into_iter().flatten() {
                match color.get(&w) {
                    Some(&c) if c == v_color => return None,
                    Some(_) => {}
                    None => {
                        color.insert(w, !v_color);
                        queue.push_back(w);
                    }
                }
            }
        }
    }

    let (mut left, mut right): (Vec<usize>, Vec<usize>) =
        vertices.iter().partition(|v| color[v]);
    if left.len() > right.len() {
        std::mem::swap(&mut left, &mut right);
    }
    left.sort_unstable();
    right.sort_unstable();
    Some((left, right))
}

/// Maximum-cardinality matching of `left` against its neighbors in `edges`,
/// via Kuhn's augmenting-path algorithm.
#[must_use]
pub fn max_bipartite_matching(left: &[usize], edges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut adjacency: FxHashMap<usize, Vec<usize>> = FxHashMap::default();
    for &(a, b) in edges {
        adjacency.entry(a).or_default().push(b);
        adjacency.entry(b).or_default().push(a);
    }

    let mut match_of_right: FxHashMap<usize, usize> = FxHashMap::default();

    fn try_augment(
        l: usize,
        adjacency: &FxHashMap<usize, Vec<usize>>,
        match_of_right: &mut FxHashMap<usize, usize>,
        visited: &mut rustc_hash::FxHashSet<usize>,
    ) -> bool {
        for &r in adjacency.get(&l).into_iter().flatten() {
            if visited.insert(r) {
                let free = match match_of_right.get(&r) {
                    None => true,
                    Some(&prev_l) => try_augment(prev_l, adjacency, match_of_right, visited),
                };
                if free {
                    match_of_right.insert(r, l);
                    return true;
                }
            }
        }
        false
    }

    for &l in left {
        let mut visited = rustc_hash::FxHashSet::default();
        try_augment(l, &adjacency, &mut match_of_right, &mut visited);
    }

    match_of_right.into_iter().map(|(r, l)| (l, r)).collect()
}

/// True maximum-matching size of the (not-necessarily-bipartite) subgraph
/// induced by `vertices`/`edges`, via backtracking.
#[must_use]
pub fn max_matching_size(vertices: &[usize], edges: &[(usize, usize)]) -> usize {
    fn search(
        remaining_edges: &[(usize, usize)],
        used: &mut rustc_hash::FxHashSet<usize>,
        best: &mut usize,
        picked: usize,
    ) {
        // Upper bound: even if every remaining edge were disjoint we could not
        // beat picked + remaining_edges.len().
        if picked + remaining_edges.len() <= *best {
            return;
        }
        let Some((&(a, b), rest)) = remaining_edges.split_first() else {
            *best = (*best).max(picked);
            return;
        };
        // Skip this edge.
        search(rest, used, best, picked);
        // Take this edge, if both endpoints are free.
        if !used.contains(&a) && !used.contains(&b) {
            used.insert(a);
            used.insert(b);
            search(rest, used, best, picked + 1);
            used.remove(&a);
            used.remove(&b);
        }
    }

    let _ = vertices;
    let mut best = 0;
    let mut used = rustc_hash::FxHashSet::default();
    search(edges, &mut used, &mut best, 0);
    best
}

/// Enumerates every maximum-cardinality matching of the subgraph induced by
/// `vertices`/`edges`, by scanning `k`-subsets of `edges` for validity, where
/// `k` is the true maximum matching size.
///
/// Refuses (`Error::ComponentTooLarge`) rather than silently truncating when
/// `vertices.len()` exceeds `limit` (§4.G, §9 Open Question).
pub fn enumerate_max_matchings(
    vertices: &[usize],
    edges: &[(usize, usize)],
    limit: usize,
) -> Result<Vec<Vec<(usize, usize)>>> {
    if vertices.len() > limit {
        return Err(Error::ComponentTooLarge {
            size: vertices.len(),
            limit,
        });
    }

    let k = max_matching_size(vertices, edges);
    if k == 0 {
        return Ok(Vec::new());
    }

    let mut matchings = Vec::new();
    for subset in edges.iter().copied().combinations(k) {
        let mut seen = rustc_hash::FxHashSet::default();
        let mut valid = true;
        for &(a, b) in &subset {
            if !seen.insert(a) || !seen.insert(b) {
                valid = false;
                break;
            }
        }
        if valid {
            matchings.push(subset);
        }
    }
    Ok(matchings)
}
