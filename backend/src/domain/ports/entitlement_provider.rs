//! Driven port for the external billing and entitlement service.
//!
//! The billing service owns which plan a user is on. The backend asks it
//! whether a named entitlement flag is set, and reports billable events back
//! to it.

use async_trait::async_trait;

use crate::domain::UserId;

use super::define_port_error;

/// Entitlement flag granting the enterprise plan.
pub const ENTERPRISE_PLAN_FLAG: &str = "enterprise-plan";
/// Entitlement flag granting the pro plan.
pub const PRO_PLAN_FLAG: &str = "pro-plan";
/// Billable event recorded after a receipt scan completes.
pub const RECEIPT_SCAN_EVENT: &str = "scaning-reciept";

define_port_error! {
    /// Errors surfaced while calling the billing service.
    pub enum EntitlementProviderError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "billing transport failed: {message}",
        /// Billing call exceeded timeout.
        Timeout { message: String } =>
            "billing timeout: {message}",
        /// Billing service rejected the request.
        Rejected { message: String } =>
            "billing service rejected request: {message}",
        /// Billing response could not be decoded.
        Decode { message: String } =>
            "billing response decode failed: {message}",
        /// No billing credentials are configured.
        NotConfigured =>
            "billing service is not configured",
    }
}

/// Port for entitlement checks and billable event tracking.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntitlementProvider: Send + Sync {
    /// Report whether `flag` is enabled for the user.
    async fn check_flag(&self, user_id: &UserId, flag: &str)
    -> Result<bool, EntitlementProviderError>;

    /// Record a billable event for the user.
    async fn track_event(
        &self,
        user_id: &UserId,
        event: &str,
    ) -> Result<(), EntitlementProviderError>;
}

/// Fixture implementation granting no entitlements and ignoring events.
///
/// Every user resolves to the free plan.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEntitlementProvider;

#[async_trait]
impl EntitlementProvider for FixtureEntitlementProvider {
    async fn check_flag(
        &self,
        _user_id: &UserId,
        _flag: &str,
    ) -> Result<bool, EntitlementProviderError> {
        Ok(false)
    }

    async fn track_event(
        &self,
        _user_id: &UserId,
        _event: &str,
    ) -> Result<(), EntitlementProviderError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixture_grants_nothing() {
        let provider = FixtureEntitlementProvider;
        let granted = provider
            .check_flag(&UserId::random(), PRO_PLAN_FLAG)
            .await
            .expect("fixture check succeeds");
        assert!(!granted);
    }

    #[test]
    fn unit_variants_get_constructors() {
        assert_eq!(
            EntitlementProviderError::not_configured().to_string(),
            "billing service is not configured"
        );
    }
}
