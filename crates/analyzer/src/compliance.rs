//! Compliance of the tenant against a provider baseline

use crate::round_to;
use serde::Serialize;

/// Outcome of checking a provider list against the tenant
///
/// `found` and `missing` keep the order of the checked list and together
/// cover it exactly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceResult {
    pub required_count: usize,
    pub found: Vec<String>,
    pub missing: Vec<String>,
    /// One decimal place
    pub compliance_percentage: f64,
}

impl ComplianceResult {
    pub(crate) fn new(required_count: usize, found: Vec<String>, missing: Vec<String>) -> Self {
        let compliance_percentage =
            round_to(found.len() as f64 / required_count as f64 * 100.0, 1);

        Self {
            required_count,
            found,
            missing,
            compliance_percentage,
        }
    }

    pub fn is_compliant(&self) -> bool {
        self.missing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage() {
        let result = ComplianceResult::new(
            3,
            vec!["A".to_string(), "C".to_string()],
            vec!["B".to_string()],
        );
        assert_eq!(result.compliance_percentage, 66.7);
        assert!(!result.is_compliant());

        let result = ComplianceResult::new(1, vec!["A".to_string()], vec![]);
        assert_eq!(result.compliance_percentage, 100.0);
        assert!(result.is_compliant());
    }
}
