//! Limits Guard: size ceilings enforced at the two points where untrusted
//! bytes enter the engine — the raw request body and the raw variables
//! payload — plus the subscription channel capacity derived from config.

use crate::config::MemoryLimits;
use crate::error::GraphyError;

/// `0` means unlimited, matching [`MemoryLimits`]'s documented convention.
pub fn check_request_body_size(body_len: usize, limits: &MemoryLimits) -> Result<(), GraphyError> {
    check_size(body_len, limits.max_request_body_size, "request body")
}

pub fn check_variable_payload_size(payload_len: usize, limits: &MemoryLimits) -> Result<(), GraphyError> {
    check_size(payload_len, limits.max_variable_size, "variables payload")
}

fn check_size(actual: usize, max: usize, what: &str) -> Result<(), GraphyError> {
    if max != 0 && actual > max {
        Err(GraphyError::Limit(format!("{what} of {actual} bytes exceeds the configured limit of {max} bytes")))
    } else {
        Ok(())
    }
}

pub fn subscription_buffer_capacity(limits: &MemoryLimits) -> usize {
    limits.effective_subscription_buffer_size()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_means_unlimited() {
        let limits = MemoryLimits { max_request_body_size: 0, ..MemoryLimits::default() };
        assert!(check_request_body_size(10_000_000, &limits).is_ok());
    }

    #[test]
    fn rejects_over_limit_payload() {
        let limits = MemoryLimits { max_variable_size: 16, ..MemoryLimits::default() };
        assert!(check_variable_payload_size(17, &limits).is_err());
        assert!(check_variable_payload_size(16, &limits).is_ok());
    }

    #[test]
    fn subscription_buffer_clamps_to_one() {
        let limits = MemoryLimits { subscription_buffer_size: 0, ..MemoryLimits::default() };
        assert_eq!(subscription_buffer_capacity(&limits), 1);
    }
}
