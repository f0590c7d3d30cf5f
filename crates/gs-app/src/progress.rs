#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStage {
    LoadingScenario,
    Simulating,
    ExpandingVariants,
    RunningBatch,
    Completed,
}

#[derive(Debug, Clone)]
pub struct RunProgressEvent {
    pub stage: RunStage,
    /// Variant id when the event belongs to a batch variant.
    pub variant: Option<usize>,
    pub elapsed_wall_s: f64,
    pub message: Option<String>,
}

impl RunProgressEvent {
    pub fn stage(stage: RunStage, elapsed_wall_s: f64, message: Option<String>) -> Self {
        Self {
            stage,
            variant: None,
            elapsed_wall_s,
            message,
        }
    }
}
