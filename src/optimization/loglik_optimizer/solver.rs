//! loglik_optimizer::solver — L-BFGS construction and execution.
//!
//! Purpose
//! -------
//! Turn an [`MLEOptions`] into a configured Argmin L-BFGS solver, run it on
//! a [`NegLogLik`] and normalize the final state into an
//! [`OptimOutcome`].
//!
//! Key behaviors
//! -------------
//! - [`lbfgs`] applies the history size and the optional gradient /
//!   cost-change tolerances to any line search.
//! - [`maximize`] checks `θ₀`, picks the line search named in the options
//!   and runs the executor with the iteration cap, restarting with a
//!   shrunken objective when a model error stops the line search.
//! - The reported point is the best one visited, so `ℓ(θ̂) ≥ ℓ(θ₀)`
//!   whenever the run completes.
//!
//! Conventions
//! -----------
//! - With the `obs_slog` feature and `verbose = true`, the starting value is
//!   printed once and the slog terminal observer is attached for every
//!   iteration. Otherwise the solver is silent.
use std::cell::RefCell;

use argmin::{
    core::{Executor, IterState, Solver, State},
    solver::quasinewton::LBFGS,
};
use argmin_math::ArgminL2Norm;

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        adapter::{FailureLog, NegLogLik},
        options::{LineSearcher, MLEOptions},
        traits::{LogLikelihood, OptimOutcome},
        types::{Cost, FnEvalMap, Grad, HagerZhangLS, MoreThuenteLS, Theta, DEFAULT_LBFGS_MEM},
    },
};

type LbfgsState = IterState<Theta, Grad, (), (), (), Cost>;

/// Restarts allowed after a model error stops the line search.
const MAX_RESTARTS: usize = 3;
/// Factor applied to the objective scale on every restart.
const RESTART_SHRINK: f64 = 1e-2;

/// L-BFGS over `linesearch` with the memory and tolerances of `opts`.
///
/// Tolerances are multiplied by `scale`, the factor the cost is scaled by,
/// so a scaled run stops where the unscaled one would. Absent tolerances
/// leave Argmin's defaults in place; the starting point and iteration cap
/// are applied at run time.
///
/// # Errors
/// `OptError::Backend` when Argmin rejects a tolerance.
pub fn lbfgs<L>(
    linesearch: L, opts: &MLEOptions, scale: f64,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    let mut solver = LBFGS::new(linesearch, opts.lbfgs_mem.unwrap_or(DEFAULT_LBFGS_MEM));
    if let Some(tol) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(tol * scale)?;
    }
    if let Some(tol) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(tol * scale)?;
    }
    Ok(solver)
}

/// Maximize `ℓ(θ)` from `theta0` with L-BFGS.
///
/// When a model error at a trial point stops the line search (the first
/// step of a fresh L-BFGS run is as long as the gradient, which can leave
/// the region where `ℓ` is defined), the run restarts from the best point
/// so far with the objective scaled by [`RESTART_SHRINK`]. Iterations and
/// evaluation counts accumulate across restarts.
///
/// # Errors
/// - Whatever `f.check` rejects.
/// - Model errors at accepted iterates; a failed factorization aborts the
///   search and is never turned into a `NaN` cost.
/// - `SearchAborted` when model errors still stop the search after
///   [`MAX_RESTARTS`] restarts.
pub fn maximize<F: LogLikelihood>(
    f: &F, theta0: Theta, data: &F::Data, opts: &MLEOptions,
) -> OptResult<OptimOutcome> {
    f.check(&theta0, data)?;
    let failures: FailureLog = RefCell::new(None);
    let mut start = theta0;
    let mut scale = 1.0;
    let mut iterations = 0usize;
    let mut fn_evals = FnEvalMap::new();
    let mut restarts = 0usize;
    loop {
        let cap = opts.tols.max_iter.map(|cap| cap.saturating_sub(iterations));
        let problem = NegLogLik::new(f, data).with_scale(scale).with_failure_log(&failures);
        let mut out = match opts.line_searcher {
            LineSearcher::MoreThuente => {
                execute(problem, lbfgs(MoreThuenteLS::new(), opts, scale)?, start, opts, cap)?
            }
            LineSearcher::HagerZhang => {
                execute(problem, lbfgs(HagerZhangLS::new(), opts, scale)?, start, opts, cap)?
            }
        };
        iterations += out.iterations;
        for (name, count) in out.fn_evals.drain() {
            *fn_evals.entry(name).or_insert(0) += count;
        }

        let Some(cause) = failures.borrow_mut().take() else {
            out.iterations = iterations;
            out.fn_evals = fn_evals;
            return Ok(out);
        };
        if restarts == MAX_RESTARTS {
            return Err(OptError::SearchAborted { restarts, cause: Box::new(cause) });
        }
        restarts += 1;
        start = out.theta_hat;
        scale *= RESTART_SHRINK;
    }
}

fn execute<'a, F, S>(
    problem: NegLogLik<'a, F>, solver: S, theta0: Theta, opts: &MLEOptions, cap: Option<usize>,
) -> OptResult<OptimOutcome>
where
    F: LogLikelihood,
    S: Solver<NegLogLik<'a, F>, LbfgsState>,
{
    let scale = problem.scale;
    #[cfg(feature = "obs_slog")]
    if opts.verbose {
        print_start(&problem, &theta0)?;
    }

    let executor = Executor::new(problem, solver).configure(|state| {
        let state = state.param(theta0);
        match cap {
            Some(cap) => state.max_iters(cap as u64),
            None => state,
        }
    });
    #[cfg(feature = "obs_slog")]
    let executor = if opts.verbose {
        executor.add_observer(
            argmin_observer_slog::SlogLogger::term_noblock(),
            argmin::core::observers::ObserverMode::Always,
        )
    } else {
        executor
    };
    #[cfg(not(feature = "obs_slog"))]
    let _ = opts;

    let result = executor.run()?;
    let state = result.state();
    OptimOutcome::new(
        state.get_best_param().cloned(),
        -state.get_best_cost() / scale,
        state.get_termination_status().clone(),
        state.get_iter(),
        state.get_func_counts().clone(),
        state.get_gradient().map(|g| g / scale),
    )
}

#[cfg(feature = "obs_slog")]
fn print_start<F: LogLikelihood>(problem: &NegLogLik<'_, F>, theta0: &Theta) -> OptResult<()> {
    use argmin::core::{CostFunction, Gradient};

    let ell = -problem.cost(theta0)? / problem.scale;
    match problem.gradient(theta0) {
        Ok(g) => eprintln!("start: ell = {ell:.6}, |grad| = {:.6}", g.l2_norm() / problem.scale),
        Err(_) => eprintln!("start: ell = {ell:.6}"),
    }
    Ok(())
}

/// Euclidean norm of an optional gradient.
pub(crate) fn grad_norm(grad: Option<&Grad>) -> Option<f64> {
    grad.map(|g| g.l2_norm())
}
