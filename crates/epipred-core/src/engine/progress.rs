#[derive(Debug, Clone)]
pub enum Progress {
    StageStart { name: &'static str },
    /// `items` is the number of rows or groups the stage produced.
    StageFinish { items: usize },

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional observer; a reporter without one is silent.
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

    /// Reports `stage` as started, runs it, and reports the number of items it produced.
    pub fn stage<T, E>(
        &self,
        name: &'static str,
        stage: impl FnOnce() -> Result<Vec<T>, E>,
    ) -> Result<Vec<T>, E> {
        self.report(Progress::StageStart { name });
        let items = stage()?;
        self.report(Progress::StageFinish { items: items.len() });
        Ok(items)
    }
}
