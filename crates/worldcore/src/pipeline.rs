//! Pipeline stage ordering and validation.
//!
//! The generation pipeline is a strict DAG; leaves run first and every
//! stage reads only fields produced by completed predecessors. The
//! validator tracks completed stages in a bitmask and is the single source
//! of truth for happened-before within a chunk. It is an invariant aid, not
//! a scheduler: release builds log and proceed best-effort, debug builds
//! assert.

/// The ten pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineStage {
    Heightmap = 0,
    Erosion = 1,
    Drainage = 2,
    Rivers = 3,
    Lakes = 4,
    Hydrology = 5,
    Climate = 6,
    Biomes = 7,
    Materials = 8,
    Mesh = 9,
}

impl PipelineStage {
    pub const COUNT: usize = 10;

    pub fn name(self) -> &'static str {
        match self {
            PipelineStage::Heightmap => "heightmap generation",
            PipelineStage::Erosion => "erosion processing",
            PipelineStage::Drainage => "drainage computation",
            PipelineStage::Rivers => "river generation",
            PipelineStage::Lakes => "lake detection",
            PipelineStage::Hydrology => "hydrology aggregation",
            PipelineStage::Climate => "climate generation",
            PipelineStage::Biomes => "biome classification",
            PipelineStage::Materials => "material blending",
            PipelineStage::Mesh => "mesh generation",
        }
    }

    #[inline]
    fn bit(self) -> u16 {
        1 << self as u8
    }

    /// Bitmask of stages that must complete before this one may begin.
    fn prerequisites(self) -> u16 {
        let b = PipelineStage::bit;
        match self {
            PipelineStage::Heightmap => 0,
            PipelineStage::Erosion => b(PipelineStage::Heightmap),
            // Erosion is optional; drainage only needs a heightmap.
            PipelineStage::Drainage => b(PipelineStage::Heightmap),
            PipelineStage::Rivers => b(PipelineStage::Drainage),
            PipelineStage::Lakes => b(PipelineStage::Drainage),
            PipelineStage::Hydrology => b(PipelineStage::Drainage),
            PipelineStage::Climate => b(PipelineStage::Heightmap),
            PipelineStage::Biomes => b(PipelineStage::Climate),
            PipelineStage::Materials => b(PipelineStage::Heightmap) | b(PipelineStage::Climate),
            PipelineStage::Mesh => b(PipelineStage::Heightmap),
        }
    }
}

/// Tracks pipeline execution for one chunk and validates stage ordering.
#[derive(Debug, Default)]
pub struct PipelineValidator {
    completed: u16,
    current: Option<PipelineStage>,
    violations: u32,
}

impl PipelineValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset for a new generation pass.
    pub fn reset(&mut self) {
        self.completed = 0;
        self.current = None;
        self.violations = 0;
    }

    /// Mark a stage as starting. Returns false (and counts a violation) if a
    /// prerequisite stage has not completed; generation proceeds best-effort.
    pub fn begin_stage(&mut self, stage: PipelineStage) -> bool {
        let missing = stage.prerequisites() & !self.completed;
        if missing != 0 {
            log::warn!(
                "pipeline invariant violation: {} executed without prerequisites",
                stage.name()
            );
            self.violations += 1;
            debug_assert!(missing == 0, "{} began out of order", stage.name());
            return false;
        }
        self.current = Some(stage);
        true
    }

    /// Result-returning variant of [`Self::begin_stage`] for callers that
    /// propagate instead of degrading.
    pub fn try_begin_stage(&mut self, stage: PipelineStage) -> Result<(), crate::GenError> {
        let missing = stage.prerequisites() & !self.completed;
        if missing != 0 {
            self.violations += 1;
            return Err(crate::GenError::PrerequisiteMissing(stage));
        }
        self.current = Some(stage);
        Ok(())
    }

    /// Mark a stage as completed.
    pub fn end_stage(&mut self, stage: PipelineStage) {
        self.completed |= stage.bit();
        self.current = None;
    }

    pub fn is_complete(&self, stage: PipelineStage) -> bool {
        self.completed & stage.bit() != 0
    }

    pub fn current_stage(&self) -> Option<PipelineStage> {
        self.current
    }

    pub fn violation_count(&self) -> u32 {
        self.violations
    }

    pub fn completed_mask(&self) -> u16 {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Stages run in DAG order without violations.
    #[test]
    fn full_pipeline_in_order_is_valid() {
        let mut v = PipelineValidator::new();
        let order = [
            PipelineStage::Heightmap,
            PipelineStage::Erosion,
            PipelineStage::Drainage,
            PipelineStage::Rivers,
            PipelineStage::Lakes,
            PipelineStage::Hydrology,
            PipelineStage::Climate,
            PipelineStage::Biomes,
            PipelineStage::Materials,
            PipelineStage::Mesh,
        ];
        for stage in order {
            assert!(v.begin_stage(stage), "{} should be runnable", stage.name());
            v.end_stage(stage);
        }
        assert_eq!(v.violation_count(), 0);
        assert_eq!(v.completed_mask().count_ones() as usize, PipelineStage::COUNT);
    }

    /// Skipping drainage makes river generation a violation.
    #[test]
    #[cfg(not(debug_assertions))]
    fn rivers_without_drainage_is_violation() {
        let mut v = PipelineValidator::new();
        v.begin_stage(PipelineStage::Heightmap);
        v.end_stage(PipelineStage::Heightmap);
        assert!(!v.begin_stage(PipelineStage::Rivers));
        assert_eq!(v.violation_count(), 1);
    }

    /// The fallible entry point reports the missing prerequisite.
    #[test]
    fn try_begin_reports_missing_prerequisite() {
        let mut v = PipelineValidator::new();
        let err = v.try_begin_stage(PipelineStage::Biomes).unwrap_err();
        assert!(matches!(
            err,
            crate::GenError::PrerequisiteMissing(PipelineStage::Biomes)
        ));
        assert_eq!(v.violation_count(), 1);
    }

    /// Rivers and lakes both only require drainage, not each other.
    #[test]
    fn rivers_and_lakes_are_independent() {
        let mut v = PipelineValidator::new();
        v.begin_stage(PipelineStage::Heightmap);
        v.end_stage(PipelineStage::Heightmap);
        v.begin_stage(PipelineStage::Drainage);
        v.end_stage(PipelineStage::Drainage);
        assert!(v.begin_stage(PipelineStage::Lakes));
        v.end_stage(PipelineStage::Lakes);
        assert!(v.begin_stage(PipelineStage::Rivers));
    }
}
