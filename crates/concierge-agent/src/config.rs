/// Limits applied to every agent taking part in one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    /// Model queries one agent may make while answering a single turn.
    pub max_steps: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { max_steps: 25 }
    }
}

impl RunConfig {
    pub fn with_max_steps(max_steps: usize) -> Self {
        Self { max_steps }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_config_defaults() {
        let config = RunConfig::default();
        assert_eq!(config.max_steps, 25);
        assert_eq!(RunConfig::with_max_steps(2).max_steps, 2);
    }
}
