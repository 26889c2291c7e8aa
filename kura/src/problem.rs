use num_traits::Float;
use kura_core::solver::{LinAlgEx, Operator, SolverError, VecLike};
use kura_core::LinOp;
use crate::{BlockPlaceDesc, ProxDesc, PrecondKind, with_linop};

//

/// Saddle-point problem.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Owns the block description of \\(K\\) and the prox descriptions of the
/// separable pieces of \\(G\\) (over the primal variable, length `ncols`)
/// and \\(F^\*\\) (over the dual variable, length `nrows`).
///
/// [`Problem::initialize`] validates the structure, builds the diagonal
/// preconditioners from exact per-block absolute sums, and caches the sum
/// vectors backing [`Problem::row_sum`]/[`Problem::col_sum`].
/// [`Problem::dualize`] exchanges the primal and dual roles, turning
/// \\(K\\) into \\(-K^T\\); applying it twice restores the original
/// orientation.
pub struct Problem<L: LinAlgEx>
{
    nrows: usize,
    ncols: usize,
    blocks: Vec<BlockPlaceDesc<L::F>>,
    prox_g: Vec<ProxDesc<L::F>>,
    prox_fconj: Vec<ProxDesc<L::F>>,
    tau: Vec<L::F>,
    tau_inv: Vec<L::F>,
    sigma: Vec<L::F>,
    sigma_inv: Vec<L::F>,
    row_cache: Vec<(L::F, Vec<L::F>)>,
    col_cache: Vec<(L::F, Vec<L::F>)>,
    initialized: bool,
    dualized: bool,
}

impl<L: LinAlgEx> Problem<L>
{
    /// Creates an instance.
    ///
    /// * `nrows` and `ncols` are the dual and primal dimensions of
    ///   \\(K\\).
    /// * `blocks` describe \\(K\\); `prox_g` and `prox_fconj` describe the
    ///   separable pieces of \\(G\\) and \\(F^\*\\).
    ///
    /// Structure is validated at [`Problem::initialize`].
    pub fn new(nrows: usize, ncols: usize,
               blocks: Vec<BlockPlaceDesc<L::F>>,
               prox_g: Vec<ProxDesc<L::F>>,
               prox_fconj: Vec<ProxDesc<L::F>>) -> Self
    {
        Problem {
            nrows, ncols,
            blocks, prox_g, prox_fconj,
            tau: Vec::new(),
            tau_inv: Vec::new(),
            sigma: Vec::new(),
            sigma_inv: Vec::new(),
            row_cache: Vec::new(),
            col_cache: Vec::new(),
            initialized: false,
            dualized: false,
        }
    }

    /// Dual dimension of the current orientation.
    pub fn nrows(&self) -> usize
    {
        self.nrows
    }

    /// Primal dimension of the current orientation.
    pub fn ncols(&self) -> usize
    {
        self.ncols
    }

    /// Extends \\(K\\) with another block placement.
    ///
    /// Fails with [`SolverError::InvalidState`] once the problem is
    /// initialized; the operator is immutable from then on.
    pub fn add_block(&mut self, place: BlockPlaceDesc<L::F>) -> Result<(), SolverError>
    {
        if self.initialized {
            return Err(SolverError::InvalidState("add_block invoked after initialize".to_string()));
        }
        self.blocks.push(place);

        Ok(())
    }

    /// Whether [`Problem::initialize`] has completed.
    pub fn initialized(&self) -> bool
    {
        self.initialized
    }

    /// Whether the problem is currently dualized.
    pub fn dualized(&self) -> bool
    {
        self.dualized
    }

    // block dimensions in the original (un-dualized) orientation
    fn orig_dims(&self) -> (usize, usize)
    {
        if self.dualized {(self.ncols, self.nrows)} else {(self.nrows, self.ncols)}
    }

    pub(crate) fn with_linop<R, FN>(&self, f: FN) -> Result<R, SolverError>
    where FN: FnOnce(&LinOp<'_, L>) -> R
    {
        with_linop(Some(self.orig_dims()), &self.blocks, f)
    }

    // absolute p-power sums over original rows (colwise = false) or
    // original columns (colwise = true)
    fn abssums(&self, p: L::F, colwise: bool) -> Result<Vec<L::F>, SolverError>
    {
        let (m, n) = self.orig_dims();
        let len = if colwise {n} else {m};

        self.with_linop(|lo| {
            let mut out = vec![L::F::zero(); len];
            {
                let mut v = <L::V>::new_mut(&mut out);
                if colwise {
                    lo.absadd_cols(p, &mut v);
                }
                else {
                    lo.absadd_rows(p, &mut v);
                }
            }
            out
        })
    }

    fn validate_partition(descs: &[ProxDesc<L::F>], dim: usize, side: &str) -> Result<(), SolverError>
    {
        let mut ranges: Vec<(usize, usize)> = descs.iter()
            .map(|d| (d.index(), d.size()))
            .collect();
        ranges.sort();

        let mut end = 0;
        for (idx, sz) in ranges {
            if sz == 0 {
                return Err(SolverError::InvalidStructure(format!(
                    "empty prox range at index {} on the {} side", idx, side)));
            }
            if idx != end {
                return Err(SolverError::InvalidStructure(format!(
                    "prox ranges {} {} at index {} on the {} side",
                    if idx > end {"leave a gap"} else {"overlap"},
                    if idx > end {"starting"} else {"ending"},
                    end, side)));
            }
            end = idx + sz;
        }
        if end != dim {
            return Err(SolverError::InvalidStructure(format!(
                "prox ranges cover [0, {}) of the {}-dimensional {} side", end, dim, side)));
        }

        Ok(())
    }

    /// Initializes the problem.
    ///
    /// Validates block placement and prox partitions, computes the
    /// diagonal preconditioners
    /// \\(\tau_c = 1/\sum_r |K_{rc}|^{2-\alpha}\\) and
    /// \\(\sigma_r = 1/\sum_c |K_{rc}|^\alpha\\)
    /// (identity when `precond` is [`PrecondKind::Off`]), averages them
    /// over prox groups, and caches the plain absolute sums.
    /// Zero sums (empty rows or columns) yield a unit step.
    pub fn initialize(&mut self, precond: PrecondKind, alpha: L::F, eps_zero: L::F) -> Result<(), SolverError>
    {
        let f1 = L::F::one();
        let f2 = f1 + f1;

        if self.initialized {
            return Err(SolverError::InvalidState("problem is already initialized".to_string()));
        }

        let (m, n) = (self.nrows, self.ncols);

        Self::validate_partition(&self.prox_g, n, "primal")?;
        Self::validate_partition(&self.prox_fconj, m, "dual")?;

        // structural validation of the composite happens on first build
        self.with_linop(|_| ())?;

        let recip_guarded = |sums: Vec<L::F>| -> Vec<L::F> {
            sums.iter()
                .map(|s| if *s <= eps_zero {f1} else {s.recip()})
                .collect()
        };

        let mut tau;
        let mut sigma;
        match precond {
            PrecondKind::Off => {
                tau = vec![f1; n];
                sigma = vec![f1; m];
            },
            PrecondKind::Alpha => {
                tau = recip_guarded(self.abssums(f2 - alpha, true)?);
                sigma = recip_guarded(self.abssums(alpha, false)?);
            },
        }

        // group-coupled proxes need one step size per group
        for (descs, steps) in [(&self.prox_g, &mut tau), (&self.prox_fconj, &mut sigma)] {
            let mut v = <L::V>::new_mut(steps);
            for d in descs.iter() {
                let p = d.build::<L>(eps_zero)?;
                let (_, mut spl) = v.split_mut(d.index());
                let (mut sub, _) = spl.split_mut(d.size());
                p.average_steps(&mut sub);
            }
        }

        self.tau_inv = tau.iter().map(|t| t.recip()).collect();
        self.sigma_inv = sigma.iter().map(|s| s.recip()).collect();
        self.tau = tau;
        self.sigma = sigma;

        self.row_cache = vec![(f1, self.abssums(f1, false)?)];
        self.col_cache = vec![(f1, self.abssums(f1, true)?)];

        self.initialized = true;

        log::debug!("problem: initialized, {} rows, {} cols, {} + {} prox ranges",
                    m, n, self.prox_g.len(), self.prox_fconj.len());

        Ok(())
    }

    /// Exchanges the primal and dual roles: \\(G \leftrightarrow F^\*\\),
    /// \\(K \leftarrow -K^T\\), \\(\tau \leftrightarrow \sigma\\).
    pub fn dualize(&mut self) -> Result<(), SolverError>
    {
        if !self.initialized {
            return Err(SolverError::InvalidState("dualize invoked before initialize".to_string()));
        }

        core::mem::swap(&mut self.nrows, &mut self.ncols);
        core::mem::swap(&mut self.prox_g, &mut self.prox_fconj);
        core::mem::swap(&mut self.tau, &mut self.sigma);
        core::mem::swap(&mut self.tau_inv, &mut self.sigma_inv);
        self.dualized = !self.dualized;

        Ok(())
    }

    fn sum_query(&mut self, i: usize, p: L::F, rowwise: bool) -> Result<L::F, SolverError>
    {
        if !self.initialized {
            return Err(SolverError::InvalidState("sum query before initialize".to_string()));
        }

        // caches live in the original orientation; a dualized row is an
        // original column (|-K^T| = |K|^T)
        let orig_rowwise = if self.dualized {!rowwise} else {rowwise};
        let (m, n) = self.orig_dims();
        let len = if orig_rowwise {m} else {n};

        if i >= len {
            return Err(SolverError::ShapeMismatch(format!(
                "sum index {} out of length {}", i, len)));
        }

        let cache = if orig_rowwise {&mut self.row_cache} else {&mut self.col_cache};
        if let Some((_, v)) = cache.iter().find(|(q, _)| *q == p) {
            return Ok(v[i]);
        }

        let v = self.abssums(p, !orig_rowwise)?;
        let r = v[i];
        let cache = if orig_rowwise {&mut self.row_cache} else {&mut self.col_cache};
        cache.push((p, v));

        Ok(r)
    }

    /// Absolute row sum \\(\sum_j |K_{ij}|^p\\), from the cache.
    pub fn row_sum(&mut self, i: usize, p: L::F) -> Result<L::F, SolverError>
    {
        self.sum_query(i, p, true)
    }

    /// Absolute column sum \\(\sum_i |K_{ij}|^p\\), from the cache.
    pub fn col_sum(&mut self, j: usize, p: L::F) -> Result<L::F, SolverError>
    {
        self.sum_query(j, p, false)
    }

    pub(crate) fn precond_slices(&self) -> (&[L::F], &[L::F], &[L::F], &[L::F])
    {
        (&self.tau, &self.tau_inv, &self.sigma, &self.sigma_inv)
    }

    /// The diagonal preconditioners \\((\tau, \sigma)\\).
    pub fn preconditioners(&self) -> Result<(&[L::F], &[L::F]), SolverError>
    {
        if !self.initialized {
            return Err(SolverError::InvalidState("preconditioners queried before initialize".to_string()));
        }

        Ok((&self.tau, &self.sigma))
    }

    pub(crate) fn prox_descs(&self) -> (&[ProxDesc<L::F>], &[ProxDesc<L::F>])
    {
        (&self.prox_g, &self.prox_fconj)
    }

    /// Releases the preconditioners and sum caches; the problem returns to
    /// its un-initialized state (a later [`Problem::initialize`] works).
    pub fn release(&mut self)
    {
        if self.dualized {
            core::mem::swap(&mut self.nrows, &mut self.ncols);
            core::mem::swap(&mut self.prox_g, &mut self.prox_fconj);
            self.dualized = false;
        }
        self.tau = Vec::new();
        self.tau_inv = Vec::new();
        self.sigma = Vec::new();
        self.sigma_inv = Vec::new();
        self.row_cache = Vec::new();
        self.col_cache = Vec::new();
        self.initialized = false;
    }
}
