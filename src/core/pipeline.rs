use crate::core::detector::detect;
use crate::core::extract::{extract_tlv, extract_track, reformat_expiry, EXPIRY_LEN};
use crate::core::relay::{ApiRelay, RelayReport};
use crate::core::track::decode_track;
use crate::domain::model::{
    preview, CaptureFormat, CardFields, DeliveryOutcome, Payload, StatusToken,
};
use crate::domain::ports::{ApiClient, CaptureSource, DeliveryChannel};
use crate::utils::logger::AuditLog;

const CAPTURE_PREVIEW_CHARS: usize = 50;
const TRACK_PREVIEW_CHARS: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Loaded,
    Classified,
    Extracted,
    Validated,
    Delivered,
    Relayed,
    Done,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Capture unreadable or empty. Nothing was written to the pipe.
    NoCapture,
    PanMissing,
    /// PAN delivered alone, failure reported.
    ExpiryMissing,
    /// Fields delivered with the raw expiry, failure reported.
    ExpiryMalformed,
    /// Fields delivered and the API relay produced the final token.
    Relayed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub format: Option<CaptureFormat>,
    pub fields: Option<CardFields>,
    pub field_delivery: Option<DeliveryOutcome>,
    pub relay: Option<RelayReport>,
    /// Final token written (or attempted) on the pipe.
    pub status: Option<StatusToken>,
}

impl RunReport {
    fn new(outcome: RunOutcome) -> Self {
        Self {
            outcome,
            format: None,
            fields: None,
            field_delivery: None,
            relay: None,
            status: None,
        }
    }
}

/// Capture → extraction → pipe delivery → API relay, one card per run.
pub struct CardPipeline<S: CaptureSource, C: DeliveryChannel, A: ApiClient> {
    source: S,
    channel: C,
    relay: ApiRelay<A>,
    audit: AuditLog,
}

impl<S: CaptureSource, C: DeliveryChannel, A: ApiClient> CardPipeline<S, C, A> {
    pub fn new(source: S, channel: C, relay: ApiRelay<A>, audit: AuditLog) -> Self {
        Self {
            source,
            channel,
            relay,
            audit,
        }
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn enter(&self, stage: Stage) {
        tracing::debug!(stage = ?stage, "pipeline stage");
    }

    pub async fn run(&self) -> RunReport {
        self.enter(Stage::Start);
        self.audit
            .info(format!("Processing capture from {}", self.source.describe()));

        let capture = match self.source.read_capture().await {
            Ok(capture) if !capture.is_empty() => capture,
            Ok(_) => {
                self.audit
                    .error(format!("Capture is empty: {}", self.source.describe()));
                return self.finish(RunReport::new(RunOutcome::NoCapture));
            }
            Err(e) => {
                self.audit.error(format!("Could not read capture: {}", e));
                return self.finish(RunReport::new(RunOutcome::NoCapture));
            }
        };
        self.enter(Stage::Loaded);
        self.audit.info(format!(
            "Capture data: {}",
            capture.preview(CAPTURE_PREVIEW_CHARS)
        ));

        let format = detect(&capture);
        self.enter(Stage::Classified);
        self.audit.info(format!("Detected {} capture", format));

        // Track captures are hex-decoded once; TLV tags are searched in the raw hex.
        let extraction = match format {
            CaptureFormat::Tlv => extract_tlv(capture.as_str()),
            CaptureFormat::Track => {
                let track = decode_track(capture.as_str());
                self.audit.info(format!(
                    "Decoded track: {}",
                    preview(&track.to_lossy_string(), TRACK_PREVIEW_CHARS)
                ));
                extract_track(track.as_bytes())
            }
        };
        self.enter(Stage::Extracted);
        if let Some((pan_at, expiry_at)) = extraction.tag_offsets {
            self.audit.info(format!(
                "Tag offsets: 5A08={}, 5F2403={}",
                describe_offset(pan_at),
                describe_offset(expiry_at)
            ));
        }
        if let Err(miss) = &extraction.pan {
            self.audit.error(format!("PAN not extracted: {}", miss));
        }
        if let Err(miss) = &extraction.expiry {
            self.audit.error(format!("Expiry not extracted: {}", miss));
        }

        let mut report = RunReport::new(RunOutcome::PanMissing);
        report.format = Some(format);

        let Some(fields) = extraction.into_fields() else {
            self.audit.error("PAN not found");
            report.status = Some(self.report_status(StatusToken::Failure).await);
            return self.finish(report);
        };
        self.audit.info(format!("Extracted PAN: {}", fields.pan));
        report.fields = Some(fields.clone());

        let expiry = match fields.expiry.as_deref() {
            Some(expiry) if !expiry.is_empty() => expiry,
            _ => {
                self.audit.error("Expiry not found, delivering PAN only");
                report.outcome = RunOutcome::ExpiryMissing;
                report.field_delivery = Some(self.deliver(&Payload::pan_only(&fields.pan)).await);
                report.status = Some(self.report_status(StatusToken::Failure).await);
                return self.finish(report);
            }
        };
        self.audit.info(format!("Extracted expiry (YYMM): {}", expiry));

        let Some(formatted) = reformat_expiry(expiry) else {
            self.audit.error(format!(
                "Invalid expiry length: {} bytes (expected {})",
                expiry.len(),
                EXPIRY_LEN
            ));
            report.outcome = RunOutcome::ExpiryMalformed;
            report.field_delivery = Some(self.deliver(&Payload::fields(&fields)).await);
            report.status = Some(self.report_status(StatusToken::Failure).await);
            return self.finish(report);
        };
        self.enter(Stage::Validated);
        self.audit.info(format!("Expiry for API (MM/YY): {}", formatted));

        report.field_delivery = Some(self.deliver(&Payload::fields(&fields)).await);
        self.enter(Stage::Delivered);

        let (relay_report, _) = self
            .relay
            .relay_and_report(&fields.pan, &formatted, &self.channel)
            .await;
        self.enter(Stage::Relayed);

        report.outcome = RunOutcome::Relayed;
        report.status = Some(relay_report.status);
        report.relay = Some(relay_report);
        self.finish(report)
    }

    /// Delivery failures are logged by the channel and never change the path.
    async fn deliver(&self, payload: &Payload) -> DeliveryOutcome {
        let outcome = self.channel.send(payload).await;
        tracing::debug!(?outcome, "field payload delivery");
        outcome
    }

    async fn report_status(&self, token: StatusToken) -> StatusToken {
        self.channel.send(&Payload::status(token)).await;
        token
    }

    fn finish(&self, report: RunReport) -> RunReport {
        self.enter(Stage::Done);
        tracing::info!(outcome = ?report.outcome, status = ?report.status, "run finished");
        report
    }
}

fn describe_offset(offset: Option<usize>) -> String {
    offset.map_or_else(|| "none".to_string(), |at| at.to_string())
}
