//! Engine-level configuration consumed (never parsed) by this crate. Reading
//! these values from environment variables or a config file is the embedding
//! transport's job.

/// Size ceilings enforced by the Limits Guard at ingress.
#[derive(Clone, Copy, Debug)]
pub struct MemoryLimits {
    /// Maximum raw HTTP body size in bytes. `0` means unlimited.
    pub max_request_body_size: usize,
    /// Maximum size in bytes of the raw variables JSON payload. `0` means
    /// unlimited.
    pub max_variable_size: usize,
    /// Capacity of the per-subscription forward channel. Values below `1`
    /// are clamped to `1` (a rendezvous channel), since `tokio::sync::mpsc`
    /// requires a positive capacity.
    pub subscription_buffer_size: usize,
}

impl Default for MemoryLimits {
    fn default() -> Self {
        MemoryLimits {
            max_request_body_size: 0,
            max_variable_size: 0,
            subscription_buffer_size: 16,
        }
    }
}

impl MemoryLimits {
    pub(crate) fn effective_subscription_buffer_size(&self) -> usize {
        self.subscription_buffer_size.max(1)
    }
}

/// Opaque passthrough for CORS policy. The engine never interprets this; it
/// exists so a single `EngineConfig` value can travel from configuration
/// loading to the HTTP transport without a side channel.
#[derive(Clone, Debug, Default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

#[derive(Clone, Debug, Default)]
pub struct EngineConfig {
    pub memory_limits: MemoryLimits,
    pub cors: CorsSettings,
    pub enable_introspection: bool,
}
