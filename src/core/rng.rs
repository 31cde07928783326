use std::f64::consts::PI;

const INCREMENT: u32 = 0x6D2B_79F5;
const DENOM: f64 = 4_294_967_296.0;

/// Deterministic uniform stream (mulberry32). The bit mixing is fixed so a
/// given seed yields the same sequence on every platform.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    state: u32,
}

impl SeededRandom {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_add(INCREMENT);
        let t = self.state;
        let mut r = (t ^ (t >> 15)).wrapping_mul(t | 1);
        r ^= r.wrapping_add((r ^ (r >> 7)).wrapping_mul(r | 61));
        r ^ (r >> 14)
    }

    /// Uniform draw in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        self.next_u32() as f64 / DENOM
    }

    pub fn standard_normal(&mut self) -> f64 {
        box_muller(|| self.next_f64())
    }
}

/// One standard-normal sample from two uniform draws. Exact zeros are
/// redrawn so the logarithm stays finite.
pub fn box_muller<F: FnMut() -> f64>(mut random: F) -> f64 {
    let mut u = 0.0;
    while u == 0.0 {
        u = random();
    }
    let mut v = 0.0;
    while v == 0.0 {
        v = random();
    }
    (-2.0 * u.ln()).sqrt() * (2.0 * PI * v).cos()
}
