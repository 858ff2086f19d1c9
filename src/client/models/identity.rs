//! Delegated identity models

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Session name recorded upstream for every assumed role.
pub const ROLE_SESSION_NAME: &str = "ami-query";

/// Lifetime of delegated credentials. One refresh cycle is expected to fit
/// inside it; calls made after expiry fail like any other upstream error.
pub const ROLE_SESSION_DURATION: Duration = Duration::from_secs(15 * 60);

/// Session policy limiting delegated credentials to the two read calls the
/// refresh needs.
pub const ROLE_SESSION_POLICY: &str = r#"{
	"Version": "2012-10-17",
	"Statement": [{
		"Effect": "Allow",
		"Action": [
			"ec2:DescribeImageAttribute",
			"ec2:DescribeImages"
		],
		"Resource": "*"
	}]
}"#;

/// Request to assume a role in a target account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    /// Account the role lives in
    pub account_id: String,
    /// Full role ARN
    pub role_arn: String,
    pub session_name: String,
    /// Inline session policy
    pub policy: String,
    pub duration: Duration,
}

impl AssumeRoleRequest {
    /// Least-privilege request for `role_name` in `account_id`.
    pub fn for_account(account_id: &str, role_name: &str) -> Self {
        Self {
            account_id: account_id.to_string(),
            role_arn: format!("arn:aws:iam::{}:role/{}", account_id, role_name),
            session_name: ROLE_SESSION_NAME.to_string(),
            policy: ROLE_SESSION_POLICY.to_string(),
            duration: ROLE_SESSION_DURATION,
        }
    }
}

/// Time-boxed credentials returned by the identity service
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credentials {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

// Secrets stay out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_account_builds_role_arn() {
        let req = AssumeRoleRequest::for_account("111122223333", "ami-query-role");
        assert_eq!(req.role_arn, "arn:aws:iam::111122223333:role/ami-query-role");
        assert_eq!(req.session_name, "ami-query");
        assert_eq!(req.duration, Duration::from_secs(900));
    }

    #[test]
    fn test_policy_is_least_privilege() {
        let policy: serde_json::Value = serde_json::from_str(ROLE_SESSION_POLICY).unwrap();
        let actions = policy["Statement"][0]["Action"].as_array().unwrap();
        assert_eq!(actions.len(), 2);
        assert!(actions.contains(&serde_json::json!("ec2:DescribeImages")));
        assert!(actions.contains(&serde_json::json!("ec2:DescribeImageAttribute")));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials {
            account_id: "111122223333".to_string(),
            access_key_id: "AKIAEXAMPLE".to_string(),
            secret_access_key: "super-secret".to_string(),
            session_token: "token-value".to_string(),
            expires_at: Utc::now(),
        };
        let out = format!("{:?}", creds);
        assert!(out.contains("AKIAEXAMPLE"));
        assert!(!out.contains("super-secret"));
        assert!(!out.contains("token-value"));
    }
}
