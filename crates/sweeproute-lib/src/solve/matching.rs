//! Exact minimum-weight perfect matching on a complete graph.
//!
//! The edge-cover solver pairs up odd-degree intersections by their
//! shortest-path distances; picking those pairs greedily inflates the final
//! tour, so this module solves the matching exactly with the primal-dual
//! blossom algorithm (O(n^3), general graphs). Distances are scaled to
//! integer millimeters before solving: duals then stay integral and the
//! algorithm never has to compare floats for equality.
//!
//! Minimization is expressed as maximization of `K - d` over perfect
//! matchings, with `K` larger than any pairwise distance; every added pair
//! then has positive weight, which forces the maximum-weight matching to be
//! perfect.

use std::collections::VecDeque;

use crate::error::{Error, Result};

/// Millimeter scaling applied to meter distances before matching.
const WEIGHT_SCALE: f64 = 1000.0;

/// Compute the exact minimum-weight perfect matching for a symmetric
/// distance matrix. The number of points must be even (handshake lemma
/// guarantees this for odd-degree node sets).
///
/// Returns pairs `(i, j)` with `i < j`, sorted ascending; the output is
/// deterministic for a fixed input.
pub fn min_weight_perfect_matching(dist: &[Vec<f64>]) -> Result<Vec<(usize, usize)>> {
    let n = dist.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if n % 2 != 0 {
        return Err(Error::OddParity { count: n });
    }

    let mut scaled = vec![vec![0i64; n]; n];
    let mut max_scaled = 0i64;
    for i in 0..n {
        if dist[i].len() != n {
            return Err(Error::SolverInvariant {
                message: "distance matrix is not square".to_string(),
            });
        }
        for j in 0..n {
            if i == j {
                continue;
            }
            let d = dist[i][j];
            if !d.is_finite() || d < 0.0 {
                return Err(Error::SolverInvariant {
                    message: format!("invalid pairwise distance {d} at ({i}, {j})"),
                });
            }
            scaled[i][j] = (d * WEIGHT_SCALE).round() as i64;
            max_scaled = max_scaled.max(scaled[i][j]);
        }
    }

    // Transform to a maximization problem with strictly positive weights.
    // Weights are doubled so every dual adjustment stays integral.
    let ceiling = max_scaled + 1;
    let mut solver = BlossomMatcher::new(n);
    for i in 0..n {
        for j in 0..n {
            if i != j {
                solver.set_weight(i + 1, j + 1, 2 * (ceiling - scaled[i][j]));
            }
        }
    }
    solver.solve();

    let mut pairs = Vec::with_capacity(n / 2);
    for u in 1..=n {
        let v = solver.mate[u];
        if v == 0 {
            return Err(Error::SolverInvariant {
                message: format!("matching left point {} unpaired", u - 1),
            });
        }
        if u < v {
            pairs.push((u - 1, v - 1));
        }
    }
    pairs.sort_unstable();
    Ok(pairs)
}

/// Stored representative edge between two (possibly contracted) vertices.
#[derive(Debug, Clone, Copy)]
struct EdgeCell {
    u: usize,
    v: usize,
    w: i64,
}

/// Primal-dual blossom matcher over a dense graph.
///
/// Vertices are 1-based; index 0 is the null sentinel. Ids above `n` are
/// contracted blossoms; arrays are sized `2n + 1` to leave room for them.
/// Labels in `s`: 0 = outer (S), 1 = inner (T), -1 = unlabeled.
struct BlossomMatcher {
    n: usize,
    n_x: usize,
    g: Vec<Vec<EdgeCell>>,
    lab: Vec<i64>,
    mate: Vec<usize>,
    slack: Vec<usize>,
    st: Vec<usize>,
    pa: Vec<usize>,
    flower: Vec<Vec<usize>>,
    flower_from: Vec<Vec<usize>>,
    s: Vec<i8>,
    vis: Vec<usize>,
    visit_stamp: usize,
    queue: VecDeque<usize>,
}

impl BlossomMatcher {
    fn new(n: usize) -> Self {
        let size = 2 * n + 1;
        let mut g = Vec::with_capacity(size);
        for u in 0..size {
            let mut row = Vec::with_capacity(size);
            for v in 0..size {
                row.push(EdgeCell { u, v, w: 0 });
            }
            g.push(row);
        }
        let mut flower_from = vec![vec![0usize; n + 1]; size];
        let mut st = vec![0usize; size];
        for u in 0..=n {
            st[u] = u;
            if u >= 1 {
                flower_from[u][u] = u;
            }
        }
        Self {
            n,
            n_x: n,
            g,
            lab: vec![0; size],
            mate: vec![0; size],
            slack: vec![0; size],
            st,
            pa: vec![0; size],
            flower: vec![Vec::new(); size],
            flower_from,
            s: vec![-1; size],
            vis: vec![0; size],
            visit_stamp: 0,
            queue: VecDeque::new(),
        }
    }

    fn set_weight(&mut self, u: usize, v: usize, w: i64) {
        self.g[u][v].w = w;
    }

    fn e_delta(&self, e: EdgeCell) -> i64 {
        self.lab[e.u] + self.lab[e.v] - self.g[e.u][e.v].w * 2
    }

    fn update_slack(&mut self, u: usize, x: usize) {
        if self.slack[x] == 0
            || self.e_delta(self.g[u][x]) < self.e_delta(self.g[self.slack[x]][x])
        {
            self.slack[x] = u;
        }
    }

    fn set_slack(&mut self, x: usize) {
        self.slack[x] = 0;
        for u in 1..=self.n {
            if self.g[u][x].w > 0 && self.st[u] != x && self.s[self.st[u]] == 0 {
                self.update_slack(u, x);
            }
        }
    }

    fn queue_push(&mut self, x: usize) {
        if x <= self.n {
            self.queue.push_back(x);
        } else {
            let children = self.flower[x].clone();
            for child in children {
                self.queue_push(child);
            }
        }
    }

    fn set_st(&mut self, x: usize, b: usize) {
        self.st[x] = b;
        if x > self.n {
            let children = self.flower[x].clone();
            for child in children {
                self.set_st(child, b);
            }
        }
    }

    /// Position of sub-blossom `xr` inside blossom `b`, normalised to an
    /// even index by reversing the cycle direction when needed.
    fn get_pr(&mut self, b: usize, xr: usize) -> usize {
        let pr = self
            .flower[b]
            .iter()
            .position(|&x| x == xr)
            .expect("sub-blossom must be part of its flower");
        if pr % 2 == 1 {
            self.flower[b][1..].reverse();
            self.flower[b].len() - pr
        } else {
            pr
        }
    }

    fn set_match(&mut self, u: usize, v: usize) {
        self.mate[u] = self.g[u][v].v;
        if u <= self.n {
            return;
        }
        let e = self.g[u][v];
        let xr = self.flower_from[u][e.u];
        let pr = self.get_pr(u, xr);
        for i in 0..pr {
            let a = self.flower[u][i];
            let b = self.flower[u][i ^ 1];
            self.set_match(a, b);
        }
        self.set_match(xr, v);
        self.flower[u].rotate_left(pr);
    }

    fn augment(&mut self, u: usize, v: usize) {
        let xnv = self.st[self.mate[u]];
        self.set_match(u, v);
        if xnv == 0 {
            return;
        }
        let next = self.st[self.pa[xnv]];
        self.set_match(xnv, next);
        self.augment(next, xnv);
    }

    fn get_lca(&mut self, mut u: usize, mut v: usize) -> usize {
        self.visit_stamp += 1;
        while u != 0 || v != 0 {
            if u != 0 {
                if self.vis[u] == self.visit_stamp {
                    return u;
                }
                self.vis[u] = self.visit_stamp;
                u = self.st[self.mate[u]];
                if u != 0 {
                    u = self.st[self.pa[u]];
                }
            }
            std::mem::swap(&mut u, &mut v);
        }
        0
    }

    fn add_blossom(&mut self, u: usize, lca: usize, v: usize) {
        let mut b = self.n + 1;
        while b <= self.n_x && self.st[b] != 0 {
            b += 1;
        }
        if b > self.n_x {
            self.n_x += 1;
        }

        self.lab[b] = 0;
        self.s[b] = 0;
        self.mate[b] = self.mate[lca];
        self.flower[b].clear();
        self.flower[b].push(lca);

        let mut x = u;
        while x != lca {
            self.flower[b].push(x);
            let y = self.st[self.mate[x]];
            self.flower[b].push(y);
            self.queue_push(y);
            x = self.st[self.pa[y]];
        }
        self.flower[b][1..].reverse();

        let mut x = v;
        while x != lca {
            self.flower[b].push(x);
            let y = self.st[self.mate[x]];
            self.flower[b].push(y);
            self.queue_push(y);
            x = self.st[self.pa[y]];
        }

        self.set_st(b, b);
        for x in 1..=self.n_x {
            self.g[b][x].w = 0;
            self.g[x][b].w = 0;
        }
        for x in 1..=self.n {
            self.flower_from[b][x] = 0;
        }
        let children = self.flower[b].clone();
        for xs in children {
            for x in 1..=self.n_x {
                if self.g[b][x].w == 0
                    || self.e_delta(self.g[xs][x]) < self.e_delta(self.g[b][x])
                {
                    self.g[b][x] = self.g[xs][x];
                    self.g[x][b] = self.g[x][xs];
                }
            }
            for x in 1..=self.n {
                if self.flower_from[xs][x] != 0 {
                    self.flower_from[b][x] = xs;
                }
            }
        }
        self.set_slack(b);
    }

    fn expand_blossom(&mut self, b: usize) {
        let children = self.flower[b].clone();
        for child in children {
            self.set_st(child, child);
        }
        let xr = self.flower_from[b][self.g[b][self.pa[b]].u];
        let pr = self.get_pr(b, xr);

        let mut i = 0;
        while i < pr {
            let xs = self.flower[b][i];
            let xns = self.flower[b][i + 1];
            self.pa[xs] = self.g[xns][xs].u;
            self.s[xs] = 1;
            self.s[xns] = 0;
            self.slack[xs] = 0;
            self.set_slack(xns);
            self.queue_push(xns);
            i += 2;
        }
        self.s[xr] = 1;
        self.pa[xr] = self.pa[b];
        for i in (pr + 1)..self.flower[b].len() {
            let xs = self.flower[b][i];
            self.s[xs] = -1;
            self.set_slack(xs);
        }
        self.st[b] = 0;
    }

    fn on_found_edge(&mut self, e: EdgeCell) -> bool {
        let u = self.st[e.u];
        let v = self.st[e.v];
        if self.s[v] == -1 {
            self.pa[v] = e.u;
            self.s[v] = 1;
            let nu = self.st[self.mate[v]];
            self.slack[v] = 0;
            self.slack[nu] = 0;
            self.s[nu] = 0;
            self.queue_push(nu);
        } else if self.s[v] == 0 {
            let lca = self.get_lca(u, v);
            if lca == 0 {
                self.augment(u, v);
                self.augment(v, u);
                return true;
            }
            self.add_blossom(u, lca, v);
        }
        false
    }

    /// One augmentation phase; returns whether the matching grew.
    fn matching_phase(&mut self) -> bool {
        for x in 0..=self.n_x {
            self.s[x] = -1;
            self.slack[x] = 0;
        }
        self.queue.clear();
        for x in 1..=self.n_x {
            if self.st[x] == x && self.mate[x] == 0 {
                self.pa[x] = 0;
                self.s[x] = 0;
                self.queue_push(x);
            }
        }
        if self.queue.is_empty() {
            return false;
        }

        loop {
            while let Some(u) = self.queue.pop_front() {
                if self.s[self.st[u]] == 1 {
                    continue;
                }
                for v in 1..=self.n {
                    if self.g[u][v].w > 0 && self.st[u] != self.st[v] {
                        if self.e_delta(self.g[u][v]) == 0 {
                            if self.on_found_edge(self.g[u][v]) {
                                return true;
                            }
                        } else {
                            let root = self.st[v];
                            self.update_slack(u, root);
                        }
                    }
                }
            }

            // Dual adjustment: the largest step that keeps every constraint
            // tight or feasible.
            let mut d = i64::MAX;
            for b in (self.n + 1)..=self.n_x {
                if self.st[b] == b && self.s[b] == 1 {
                    d = d.min(self.lab[b] / 2);
                }
            }
            for x in 1..=self.n_x {
                if self.st[x] == x && self.slack[x] != 0 {
                    let delta = self.e_delta(self.g[self.slack[x]][x]);
                    if self.s[x] == -1 {
                        d = d.min(delta);
                    } else if self.s[x] == 0 {
                        d = d.min(delta / 2);
                    }
                }
            }
            for u in 1..=self.n {
                match self.s[self.st[u]] {
                    0 => {
                        if self.lab[u] <= d {
                            return false;
                        }
                        self.lab[u] -= d;
                    }
                    1 => self.lab[u] += d,
                    _ => {}
                }
            }
            for b in (self.n + 1)..=self.n_x {
                if self.st[b] == b {
                    if self.s[b] == 0 {
                        self.lab[b] += d * 2;
                    } else if self.s[b] == 1 {
                        self.lab[b] -= d * 2;
                    }
                }
            }

            self.queue.clear();
            for x in 1..=self.n_x {
                if self.st[x] == x
                    && self.slack[x] != 0
                    && self.st[self.slack[x]] != x
                    && self.e_delta(self.g[self.slack[x]][x]) == 0
                    && self.on_found_edge(self.g[self.slack[x]][x])
                {
                    return true;
                }
            }
            for b in (self.n + 1)..=self.n_x {
                if self.st[b] == b && self.s[b] == 1 && self.lab[b] == 0 {
                    self.expand_blossom(b);
                }
            }
        }
    }

    fn solve(&mut self) {
        let mut w_max = 0i64;
        for u in 1..=self.n {
            for v in 1..=self.n {
                w_max = w_max.max(self.g[u][v].w);
            }
        }
        for u in 1..=self.n {
            self.lab[u] = w_max;
        }
        while self.matching_phase() {}
    }
}
