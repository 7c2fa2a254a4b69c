use crate::domain::model::{ApiResult, DeliveryOutcome, Payload, PaymentRequest, StatusToken};
use crate::domain::ports::{ApiClient, DeliveryChannel};
use crate::utils::logger::AuditLog;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayReport {
    /// `None` when no reply was obtained at all.
    pub result: Option<ApiResult>,
    pub status: StatusToken,
}

/// Sends extracted card fields to the payment API and turns the reply into a
/// status token. One attempt per call.
pub struct ApiRelay<A: ApiClient> {
    client: A,
    endpoint: String,
    audit: AuditLog,
}

impl<A: ApiClient> ApiRelay<A> {
    pub fn new(client: A, endpoint: impl Into<String>, audit: AuditLog) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            audit,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn client(&self) -> &A {
        &self.client
    }

    pub async fn relay(&self, pan: &str, formatted_expiry: &str) -> RelayReport {
        self.audit.info(format!("Relaying card to {}", self.endpoint));

        let body = match PaymentRequest::new(pan, formatted_expiry).to_json() {
            Ok(body) => body,
            Err(e) => {
                self.audit.error(format!("Could not encode payment request: {}", e));
                return RelayReport {
                    result: None,
                    status: StatusToken::Failure,
                };
            }
        };
        self.audit.info(format!("Request body: {}", body));

        let started = Instant::now();
        let reply = self.client.post_json(&self.endpoint, &body).await;
        let elapsed = started.elapsed();
        self.audit
            .info(format!("API response time: {}", format_duration(elapsed)));

        let reply = match reply {
            Ok(reply) => reply,
            Err(e) => {
                self.audit.error(format!(
                    "API call could not be made: {} (after {})",
                    e,
                    format_duration(elapsed)
                ));
                return RelayReport {
                    result: None,
                    status: StatusToken::Failure,
                };
            }
        };

        let result = ApiResult::new(reply, elapsed);
        let status = match result.http_status.as_deref() {
            Some(code) => {
                self.audit.info(format!("HTTP status: {}", code));
                self.audit.info(format!("API response: {}", result.body));
                if result.is_success() {
                    self.audit.success(format!(
                        "API call succeeded in {}",
                        format_duration(elapsed)
                    ));
                    StatusToken::Success
                } else {
                    self.audit.error(format!(
                        "API call failed with HTTP {} in {}",
                        code,
                        format_duration(elapsed)
                    ));
                    StatusToken::Failure
                }
            }
            None => {
                self.audit.error(format!(
                    "Invalid API response {:?} in {}",
                    result.body,
                    format_duration(elapsed)
                ));
                StatusToken::Failure
            }
        };

        RelayReport {
            result: Some(result),
            status,
        }
    }

    /// Relays and then always reports the resulting token over `channel`.
    pub async fn relay_and_report<C: DeliveryChannel>(
        &self,
        pan: &str,
        formatted_expiry: &str,
        channel: &C,
    ) -> (RelayReport, DeliveryOutcome) {
        let report = self.relay(pan, formatted_expiry).await;
        let delivery = channel.send(&Payload::status(report.status)).await;
        (report, delivery)
    }
}

/// `850ms` below one second, `1.25s` above.
pub fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms < 1000 {
        format!("{}ms", ms)
    } else {
        format!("{}s", ms as f64 / 1000.0)
    }
}
