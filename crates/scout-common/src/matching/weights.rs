/// Ranking weights applied uniformly to every candidate.
/// Velocity carries the most weight; growth the least since young accounts
/// fall back to a neutral value.
pub const CANONICAL_WEIGHTS: Weights = Weights {
    growth: 0.20,
    velocity: 0.30,
    hidden_gem: 0.25,
    pioneer: 0.25,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub growth: f64,
    pub velocity: f64,
    pub hidden_gem: f64,
    pub pioneer: f64,
}

impl Weights {
    pub fn sum(&self) -> f64 {
        self.growth + self.velocity + self.hidden_gem + self.pioneer
    }
}

impl Default for Weights {
    fn default() -> Self {
        CANONICAL_WEIGHTS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weights_sum_to_one() {
        assert!((CANONICAL_WEIGHTS.sum() - 1.0).abs() < 1e-6);
        assert!((Weights::default().sum() - 1.0).abs() < 1e-6);
    }
}
