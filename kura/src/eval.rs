use std::time::Instant;
use num_traits::{Float, Zero, One, NumCast};
use kura_core::solver::{LinAlg, LinAlgEx, Operator, SolverError, VecLike};
use crate::{BlockPlaceDesc, ProxDesc, with_linop};

//

/// Result of a standalone operator evaluation.
#[derive(Debug, Clone)]
pub struct LinOpEval<F: Float>
{
    /// \\(K \cdot {\rm rhs}\\) (or \\(K^T \cdot {\rm rhs}\\)).
    pub result: Vec<F>,
    /// Absolute row sums of \\(K\\).
    pub row_sums: Vec<F>,
    /// Absolute column sums of \\(K\\).
    pub col_sums: Vec<F>,
    /// Wall-clock evaluation time in milliseconds.
    pub time_ms: f64,
}

/// Applies a block-described operator to a right-hand side once.
///
/// The typed counterpart of the host `eval_linop` command: assembles the
/// composite, applies it (or its adjoint with `transpose`), and reports
/// the plain absolute row and column sums along with the evaluation time.
pub fn eval_linop<L: LinAlgEx>(blocks: &[BlockPlaceDesc<L::F>], rhs: &[L::F], transpose: bool) -> Result<LinOpEval<L::F>, SolverError>
{
    let f0 = L::F::zero();
    let f1 = L::F::one();

    with_linop::<L, _, _>(None, blocks, |lo| {
        let (m, n) = lo.size();
        let (in_len, out_len) = if transpose {(m, n)} else {(n, m)};

        if rhs.len() != in_len {
            return Err(SolverError::ShapeMismatch(format!(
                "right-hand side length {} does not match {}", rhs.len(), in_len)));
        }

        let mut result = vec![f0; out_len];
        let tick = Instant::now();
        {
            let v_rhs = <L::V>::new_ref(rhs);
            let mut v_res = <L::V>::new_mut(&mut result);
            if transpose {
                lo.trans_op(f1, &v_rhs, f0, &mut v_res);
            }
            else {
                lo.op(f1, &v_rhs, f0, &mut v_res);
            }
        }
        let time_ms = tick.elapsed().as_secs_f64() * 1e3;

        let mut row_sums = vec![f0; m];
        let mut col_sums = vec![f0; n];
        {
            let mut v_row = <L::V>::new_mut(&mut row_sums);
            lo.absadd_rows(f1, &mut v_row);
        }
        {
            let mut v_col = <L::V>::new_mut(&mut col_sums);
            lo.absadd_cols(f1, &mut v_col);
        }

        Ok(LinOpEval {
            result, row_sums, col_sums, time_ms,
        })
    })?
}

//

/// Result of a standalone prox evaluation.
#[derive(Debug, Clone)]
pub struct ProxEval<F: Float>
{
    /// The proximal map of the argument.
    pub result: Vec<F>,
    /// Wall-clock evaluation time in milliseconds.
    pub time_ms: f64,
}

/// Evaluates a described proximal operator once.
///
/// The typed counterpart of the host `eval_prox` command. The argument
/// length must equal the prox size; `tau_diag` defaults to ones.
pub fn eval_prox<L: LinAlg>(desc: &ProxDesc<L::F>, arg: &[L::F], tau: L::F, tau_diag: Option<&[L::F]>) -> Result<ProxEval<L::F>, SolverError>
{
    let f0 = L::F::zero();
    let f1 = L::F::one();
    let n = arg.len();

    if desc.size() != n {
        return Err(SolverError::ShapeMismatch(format!(
            "argument length {} does not match the prox size {}", n, desc.size())));
    }
    if let Some(td) = tau_diag {
        if td.len() != n {
            return Err(SolverError::ShapeMismatch(format!(
                "tau_diag length {} does not match the prox size {}", td.len(), n)));
        }
    }

    let mut p = desc.build::<L>(NumCast::from(1e-12).unwrap())?;

    let ones;
    let td = match tau_diag {
        Some(td) => td,
        None => {
            ones = vec![f1; n];
            &ones
        },
    };

    let mut result = vec![f0; n];
    let tick = Instant::now();
    {
        let v_arg = <L::V>::new_ref(arg);
        let v_td = <L::V>::new_ref(td);
        let mut v_res = <L::V>::new_mut(&mut result);
        // evaluate in local coordinates, the argument covers exactly the range
        p.eval_local(&mut v_res, &v_arg, &v_td, tau, false)?;
    }
    let time_ms = tick.elapsed().as_secs_f64() * 1e3;

    Ok(ProxEval {
        result, time_ms,
    })
}
