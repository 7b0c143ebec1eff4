// SPDX-FileCopyrightText: 2026 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Traversal checkpoints reported while the pipeline runs.

use std::fmt;

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Demodulate,
    Integrate,
    Normalize,
    Discriminate,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Demodulate => "demodulate",
            Self::Integrate => "integrate",
            Self::Normalize => "normalize",
            Self::Discriminate => "discriminate",
        };
        f.write_str(name)
    }
}

/// Snapshot handed to a [`ProgressSink`].
///
/// `running_sum` and `rms` are only populated by the integration pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Checkpoint {
    pub stage: Stage,
    pub position: usize,
    pub total: usize,
    pub running_sum: Option<f64>,
    pub rms: Option<f64>,
}

pub trait ProgressSink {
    fn checkpoint(&mut self, checkpoint: &Checkpoint);
}

impl<F: FnMut(&Checkpoint)> ProgressSink for F {
    fn checkpoint(&mut self, checkpoint: &Checkpoint) {
        self(checkpoint)
    }
}

/// Emits each checkpoint as a `debug!` event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn checkpoint(&mut self, cp: &Checkpoint) {
        match (cp.running_sum, cp.rms) {
            (Some(sum), Some(rms)) => debug!(
                "{} {}/{}: running sum {:.6}, running rms {:.6}",
                cp.stage, cp.position, cp.total, sum, rms
            ),
            _ => debug!("{} {}/{}", cp.stage, cp.position, cp.total),
        }
    }
}

/// Calls the sink every `interval` positions. An interval of 0 disables
/// reporting.
pub(crate) struct Reporter<'a> {
    sink: Option<&'a mut dyn ProgressSink>,
    interval: usize,
}

impl<'a> Reporter<'a> {
    pub(crate) fn new(sink: Option<&'a mut dyn ProgressSink>, interval: usize) -> Self {
        Self { sink, interval }
    }

    pub(crate) fn silent() -> Self {
        Self {
            sink: None,
            interval: 0,
        }
    }

    #[inline]
    pub(crate) fn due(&self, position: usize) -> bool {
        self.sink.is_some() && self.interval > 0 && position % self.interval == 0
    }

    pub(crate) fn report(&mut self, checkpoint: Checkpoint) {
        if let Some(sink) = self.sink.as_mut() {
            sink.checkpoint(&checkpoint);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_sink_and_interval() {
        let mut seen = Vec::new();
        {
            let mut sink = |cp: &Checkpoint| seen.push(cp.position);
            let mut reporter = Reporter::new(Some(&mut sink), 4);
            for position in 0..10 {
                if reporter.due(position) {
                    reporter.report(Checkpoint {
                        stage: Stage::Demodulate,
                        position,
                        total: 10,
                        running_sum: None,
                        rms: None,
                    });
                }
            }
        }
        assert_eq!(seen, vec![0, 4, 8]);
    }

    #[test]
    fn test_zero_interval_never_due() {
        let mut sink = TracingProgress;
        let reporter = Reporter::new(Some(&mut sink), 0);
        assert!(!(0..100).any(|p| reporter.due(p)));
        assert!(!Reporter::silent().due(0));
    }
}
