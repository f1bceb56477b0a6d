use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use log::{info, warn};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::client_defaults::TENANT_ID_PLACEHOLDER;
use crate::error::Error;
use crate::identity::{auth_headers, IdentityClient};
use crate::models::{AuthContext, TestCase};

/// Outcome of one timed iteration. PASS means a status below 400.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IterationResult {
    pub case: String,
    pub iteration: i64,
    pub status: u16,
    pub elapsed: Duration,
    pub passed: bool,
}

impl IterationResult {
    pub fn new(case: &str, iteration: i64, status: u16, elapsed: Duration) -> Self {
        Self {
            case: case.to_owned(),
            iteration,
            status,
            elapsed,
            passed: status < 400,
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.passed {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

impl fmt::Display for IterationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test Case: {:<20} Status: {:>4} Time lapsed: {:.4}",
            format!("{}-{}", self.case, self.iteration),
            self.status_label(),
            self.elapsed.as_secs_f64()
        )
    }
}

/// Where iteration results go. Injected so tests can capture output instead
/// of scraping a process-wide logger.
pub trait ReportSink {
    fn record(&mut self, result: &IterationResult);
}

/// Default sink: one log line per iteration.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ReportSink for LogReporter {
    fn record(&mut self, result: &IterationResult) {
        info!("{result}");
    }
}

/// Drives test cases sequentially against one shared token.
pub struct Runner<R = LogReporter> {
    // Accepted for parity with the test-case schema; nothing reads it yet.
    #[allow(dead_code)]
    concurrency: usize,
    repeat: i64,
    reporter: R,
}

impl Runner<LogReporter> {
    pub fn new() -> Self {
        Self::with_reporter(LogReporter)
    }
}

impl Default for Runner<LogReporter> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ReportSink> Runner<R> {
    pub fn with_reporter(reporter: R) -> Self {
        Self {
            concurrency: 1,
            repeat: 1,
            reporter,
        }
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Default iteration count for cases that do not set their own.
    pub fn repeat(mut self, repeat: i64) -> Self {
        self.repeat = repeat;
        self
    }

    /// Fetch the token once, then run every case in list order. A failed
    /// iteration is recorded and the loop moves on; malformed JSON anywhere
    /// aborts the run.
    pub fn execute(&mut self, auth: AuthContext, testcases: &[TestCase]) -> Result<(), Error> {
        let mut client = IdentityClient::builder(auth)?.build()?;
        client.get_token()?;

        for case in testcases {
            info!("executing test case: {}", case.name);

            let endpoint = client.resolve_endpoint(&case.service_type)?;
            if endpoint.is_none() {
                warn!("no {} endpoint in the catalog", case.service_type);
            }
            // An absent endpoint leaves a bare path here and the dispatch
            // below fails on the relative URL. Kept unguarded.
            let url = build_case_url(
                endpoint.as_deref().unwrap_or_default(),
                &case.url,
                client.tenant_id(),
            );

            let mut headers = auth_headers(client.token().unwrap_or_default())?;
            if let Some(raw) = case.headers.as_deref() {
                merge_headers(&mut headers, raw)?;
            }
            let data = case
                .data
                .as_deref()
                .map(serde_json::from_str::<serde_json::Value>)
                .transpose()?;

            let repeat = case.repeat.unwrap_or(self.repeat);
            let mut count: i64 = 0;
            while should_continue(repeat, count) {
                let (resp, elapsed) =
                    client.perform(case.operation, &url, headers.clone(), data.as_ref())?;
                let result =
                    IterationResult::new(&case.name, count + 1, resp.status().as_u16(), elapsed);
                self.reporter.record(&result);
                count += 1;
            }
        }
        Ok(())
    }
}

/// A negative repeat count runs until interrupted.
fn should_continue(repeat: i64, count: i64) -> bool {
    repeat < 0 || count < repeat
}

fn build_case_url(endpoint: &str, path: &str, tenant_id: Option<&str>) -> String {
    let url = format!("{endpoint}{path}");
    match tenant_id {
        Some(tenant_id) => url.replace(TENANT_ID_PLACEHOLDER, tenant_id),
        None => url,
    }
}

/// Merge a JSON-encoded header map into `headers`; extras win over defaults.
fn merge_headers(headers: &mut HeaderMap, raw: &str) -> Result<(), Error> {
    let extra: HashMap<String, String> = serde_json::from_str(raw)?;
    for (name, value) in extra {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| Error::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(&value).map_err(|_| Error::InvalidHeader(value.clone()))?;
        headers.insert(header_name, header_value);
    }
    Ok(())
}
