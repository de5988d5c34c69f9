use crate::differentiator::DifferentiatorMode;

/// Renderer-wide switches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RendererConfig {
    pub differentiator_mode: DifferentiatorMode,
    /// Attempts [`ShadowTree::commit`](crate::ShadowTree::commit) makes before
    /// giving up on a surface that keeps moving underneath it.
    pub commit_retry_limit: usize,
    pub enable_state_reconciliation: bool,
    pub enable_leak_checker: bool,
}

impl RendererConfig {
    pub fn with_differentiator_mode(mut self, mode: DifferentiatorMode) -> Self {
        self.differentiator_mode = mode;
        self
    }

    pub fn with_commit_retry_limit(mut self, limit: usize) -> Self {
        self.commit_retry_limit = limit.max(1);
        self
    }

    pub fn with_state_reconciliation(mut self, enabled: bool) -> Self {
        self.enable_state_reconciliation = enabled;
        self
    }

    pub fn with_leak_checker(mut self, enabled: bool) -> Self {
        self.enable_leak_checker = enabled;
        self
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            differentiator_mode: DifferentiatorMode::Classic,
            commit_retry_limit: 1024,
            enable_state_reconciliation: true,
            enable_leak_checker: cfg!(debug_assertions),
        }
    }
}
