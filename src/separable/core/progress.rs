//! Per-iteration progress reporting for the iterative estimators.
//!
//! Estimators never print. ALS, the uniform EM and the mixture EM call
//! [`ProgressSink::on_iteration`] once per outer iteration with the current
//! objective (Frobenius residual for ALS, log-likelihood for EM). Any
//! `FnMut(usize, f64)` closure is a sink; [`NoProgress`] discards everything.

/// Receiver of `(iteration, objective)` events.
pub trait ProgressSink {
    fn on_iteration(&mut self, iteration: usize, objective: f64);
}

/// Sink that ignores every event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_iteration(&mut self, _iteration: usize, _objective: f64) {}
}

impl<F: FnMut(usize, f64)> ProgressSink for F {
    fn on_iteration(&mut self, iteration: usize, objective: f64) {
        self(iteration, objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Closures act as sinks through the blanket impl.
    //
    // Given
    // -----
    // - A closure pushing into a Vec, used through `&mut dyn ProgressSink`.
    //
    // Expect
    // ------
    // - Both events are recorded in order.
    fn closure_is_a_sink() {
        let mut seen = Vec::new();
        {
            let mut record = |i: usize, v: f64| seen.push((i, v));
            let sink: &mut dyn ProgressSink = &mut record;
            sink.on_iteration(1, -3.0);
            sink.on_iteration(2, -2.5);
        }
        NoProgress.on_iteration(0, 0.0);
        assert_eq!(seen, vec![(1, -3.0), (2, -2.5)]);
    }
}
