use serde::{Deserialize, Serialize};

use crate::identity::Operation;

/// Credentials and project scope for the identity service. Built once by the
/// caller and handed to the runner; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub auth_url: String,
    pub username: String,
    pub password: String,
    pub project_name: String,
    pub project_domain_name: String,
    pub user_domain_name: String,
}

/// One repeated, timed call against a cataloged service.
///
/// `headers` and `data` hold JSON-encoded maps; they are parsed when the case
/// runs and a parse failure aborts the whole run. `concurrency` is accepted
/// for schema parity but nothing acts on it yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub service_type: String,
    pub operation: Operation,
    /// Path appended to the resolved endpoint; may contain the
    /// `%(tenant_id)s` placeholder.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrency: Option<usize>,
    /// Per-case iteration count; negative means run until interrupted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<i64>,
}

impl TestCase {
    pub fn new(
        name: impl Into<String>,
        service_type: impl Into<String>,
        operation: Operation,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service_type: service_type.into(),
            operation,
            url: url.into(),
            headers: None,
            data: None,
            concurrency: None,
            repeat: None,
        }
    }
}

// Identity v3 password-auth request body. The project domain goes out under
// `domain.id`, matching the wire schema the service expects.

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordAuthRequest {
    pub auth: AuthPayload,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AuthPayload {
    pub identity: IdentitySection,
    pub scope: ScopeSection,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct IdentitySection {
    pub methods: Vec<String>,
    pub password: PasswordSection,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PasswordSection {
    pub user: UserSection,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UserSection {
    pub name: String,
    pub domain: UserDomain,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct UserDomain {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScopeSection {
    pub project: ProjectScope,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProjectScope {
    pub name: String,
    pub domain: ProjectDomain,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ProjectDomain {
    pub id: String,
}

impl PasswordAuthRequest {
    pub fn new(auth: &AuthContext) -> Self {
        Self {
            auth: AuthPayload {
                identity: IdentitySection {
                    methods: vec!["password".to_string()],
                    password: PasswordSection {
                        user: UserSection {
                            name: auth.username.clone(),
                            domain: UserDomain {
                                name: auth.user_domain_name.clone(),
                            },
                            password: auth.password.clone(),
                        },
                    },
                },
                scope: ScopeSection {
                    project: ProjectScope {
                        name: auth.project_name.clone(),
                        domain: ProjectDomain {
                            id: auth.project_domain_name.clone(),
                        },
                    },
                },
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenResponse {
    pub token: TokenBody,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TokenBody {
    pub project: ProjectRef,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ProjectRef {
    pub id: String,
}

// Catalog responses. A missing list key reads as empty so the caller sees
// "absent" instead of a decode error.

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ServiceList {
    pub services: Vec<ServiceEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ServiceEntry {
    pub id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct EndpointList {
    pub endpoints: Vec<EndpointEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct EndpointEntry {
    pub url: String,
}
