/// Response header carrying the issued token.
pub(crate) const SUBJECT_TOKEN_HEADER: &str = "X-Subject-Token";

/// Catalog interface queried when the caller does not pick one.
pub(crate) const DEFAULT_INTERFACE: &str = "public";

/// Literal replaced with the scoped project id in test-case paths.
pub(crate) const TENANT_ID_PLACEHOLDER: &str = "%(tenant_id)s";
