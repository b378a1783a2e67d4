#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StepStage {
    Integrate = 1,
    RefreshVolumes = 2,
    Broadphase = 3,
    Narrowphase = 4,
    Solve = 5,
    Tires = 6,
}

/// Records the stage order of one substep; tests assert the pass
/// structure without peeking into engine internals.
#[derive(Default)]
pub struct ScheduleRecorder { stages: Vec<StepStage> }

impl ScheduleRecorder {
    pub fn new() -> Self { Self { stages: Vec::new() } }
    pub fn push(&mut self, s: StepStage) { self.stages.push(s); }
    pub fn clear(&mut self) { self.stages.clear(); }
    pub fn stages(&self) -> &[StepStage] { &self.stages }
}
