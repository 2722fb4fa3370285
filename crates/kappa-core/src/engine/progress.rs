#[derive(Debug, Clone)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// Linewidths of every grid point were taken from a store.
    Restored { grid_points: usize },

    GridStart { total: u64 },
    GridPointFinished { index: usize, grid_point: usize },
    GridFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reporter_without_callback_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::GridFinish);
    }

    #[test]
    fn reporter_forwards_events_to_callback() {
        let seen = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::GridPointFinished { grid_point, .. } = event {
                seen.lock().unwrap().push(grid_point);
            }
        }));
        reporter.report(Progress::GridPointFinished {
            index: 0,
            grid_point: 7,
        });
        reporter.report(Progress::Message("ignored".to_string()));
        drop(reporter);
        assert_eq!(seen.into_inner().unwrap(), vec![7]);
    }
}
