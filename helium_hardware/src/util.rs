/// Small xorshift64 generator for simulated sensor noise.
///
/// Not suitable for anything but test signals; a zero seed is remapped so the
/// state never collapses to zero.
#[derive(Debug, Clone)]
pub struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 0xDEAD_BEEF_CAFE_BABE } else { seed },
        }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Uniform sample in [0.0, 1.0).
    pub fn next_unit(&mut self) -> f64 {
        // 53 mantissa bits
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
