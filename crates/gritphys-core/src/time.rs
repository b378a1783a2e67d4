/// Counters reported by one engine substep.
#[derive(Copy, Clone, Debug, Default)]
pub struct StepStats {
    pub pairs_tested: u32,
    pub contacts: u32,
    pub ridge_contacts: u32,
    pub swept_hits: u32,
}

impl StepStats {
    pub fn accumulate(&mut self, other: StepStats) {
        self.pairs_tested += other.pairs_tested;
        self.contacts += other.contacts;
        self.ridge_contacts += other.ridge_contacts;
        self.swept_hits += other.swept_hits;
    }
}
