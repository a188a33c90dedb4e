//! Per-attachment scan state machine.
//!
//! ```text
//! Init -> LookingUp -> Found
//!                   -> Uploading -> Polling -> RefetchingReport -> Found
//!                                           -> TimedOut
//! any network/malformed error              -> Failed
//! parent cancelled                         -> Cancelled
//! ```
//!
//! Every service call goes through the shared [`ConcurrencyGate`]. The
//! orchestrator never returns an error: every terminal state maps to a
//! [`ScanOutcome`] whose score defaults to `0.0`.

use futures_util::future::join_all;
use phishnet_core::{
    AnalysisJob, AttachmentScan, Lookup, PhishnetError, ReportSource, ReputationReport,
    ReputationService, Result, ScanOutcome,
};
use phishnet_guard::ResultCache;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ScanConfig;
use crate::gate::ConcurrencyGate;
use crate::request::ScanRequest;

/// Non-terminal states, used for transition logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    LookingUp,
    Uploading,
    Polling,
    RefetchingReport,
}

impl std::fmt::Display for ScanState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LookingUp => write!(f, "looking_up"),
            Self::Uploading => write!(f, "uploading"),
            Self::Polling => write!(f, "polling"),
            Self::RefetchingReport => write!(f, "refetching_report"),
        }
    }
}

/// Turns attachments into malicious scores
pub struct ScanOrchestrator {
    service: Option<Arc<dyn ReputationService>>,
    gate: ConcurrencyGate,
    reports: Arc<ResultCache<ReputationReport>>,
    config: ScanConfig,
}

impl ScanOrchestrator {
    /// Create an orchestrator with its own gate and report cache
    pub fn new(service: Arc<dyn ReputationService>, config: ScanConfig) -> Self {
        Self {
            service: Some(service),
            gate: ConcurrencyGate::new(config.max_concurrency),
            reports: Arc::new(ResultCache::new(config.report_ttl())),
            config,
        }
    }

    /// An orchestrator that scores everything `Disabled` (no credentials)
    pub fn disabled(config: ScanConfig) -> Self {
        warn!("no reputation service API key configured; attachment scanning disabled");
        Self {
            service: None,
            gate: ConcurrencyGate::new(config.max_concurrency),
            reports: Arc::new(ResultCache::new(config.report_ttl())),
            config,
        }
    }

    /// Share an existing gate instead of the private one
    #[must_use]
    pub fn with_gate(mut self, gate: ConcurrencyGate) -> Self {
        self.gate = gate;
        self
    }

    /// Share an existing report cache instead of the private one
    #[must_use]
    pub fn with_report_cache(mut self, reports: Arc<ResultCache<ReputationReport>>) -> Self {
        self.reports = reports;
        self
    }

    /// Whether a reputation service is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    /// The admission gate guarding service calls
    #[must_use]
    pub const fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Cached reports keyed by SHA-256
    #[must_use]
    pub fn report_cache(&self) -> &Arc<ResultCache<ReputationReport>> {
        &self.reports
    }

    /// Scan one attachment until it reaches a terminal state
    pub async fn scan(&self, request: &ScanRequest, cancel: &CancellationToken) -> AttachmentScan {
        AttachmentScan {
            file: request.filename().to_string(),
            sha256: request.sha256().to_string(),
            outcome: self.scan_outcome(request, cancel).await,
        }
    }

    /// Scan a set of attachments concurrently.
    ///
    /// Each distinct hash is scanned once; results come back in input order
    /// after every scan has reached a terminal state.
    pub async fn scan_all(
        &self,
        requests: &[ScanRequest],
        cancel: &CancellationToken,
    ) -> Vec<AttachmentScan> {
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut unique: Vec<&ScanRequest> = Vec::new();
        let mut slots = Vec::with_capacity(requests.len());

        for request in requests {
            let next = unique.len();
            let slot = *index.entry(request.sha256()).or_insert_with(|| {
                unique.push(request);
                next
            });
            slots.push(slot);
        }

        if unique.len() < requests.len() {
            debug!(
                total = requests.len(),
                unique = unique.len(),
                "deduplicated attachments by content hash"
            );
        }

        let outcomes = join_all(unique.iter().map(|r| self.scan_outcome(r, cancel))).await;

        requests
            .iter()
            .zip(slots)
            .map(|(request, slot)| AttachmentScan {
                file: request.filename().to_string(),
                sha256: request.sha256().to_string(),
                outcome: outcomes[slot].clone(),
            })
            .collect()
    }

    #[instrument(skip_all, fields(sha256 = %request.sha256(), file = %request.filename()))]
    async fn scan_outcome(&self, request: &ScanRequest, cancel: &CancellationToken) -> ScanOutcome {
        let Some(service) = &self.service else {
            return ScanOutcome::Disabled;
        };

        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!("scan cancelled before completion");
                return ScanOutcome::Cancelled;
            }
            result = self.drive(service.as_ref(), request) => result,
        };

        match result {
            Ok(outcome) => {
                info!(
                    malicious_ratio = outcome.malicious_ratio(),
                    status = outcome.label(),
                    "scan finished"
                );
                outcome
            }
            Err(PhishnetError::Timeout { elapsed_secs }) => {
                warn!(elapsed_secs, "analysis timed out; scoring 0.0");
                ScanOutcome::TimedOut { elapsed_secs }
            }
            Err(e) => {
                warn!(error = %e, "scan failed; scoring 0.0");
                ScanOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn drive(
        &self,
        service: &dyn ReputationService,
        request: &ScanRequest,
    ) -> Result<ScanOutcome> {
        let sha256 = request.sha256();

        if let Some(report) = self.reports.get(sha256) {
            debug!("report served from cache");
            return Ok(ScanOutcome::Found {
                report,
                source: ReportSource::Cache,
            });
        }

        Self::transition(ScanState::LookingUp);
        if let Lookup::Found(report) = self.gate.run(service.lookup(sha256)).await? {
            return Ok(self.found(sha256, report, ReportSource::Existing));
        }

        Self::transition(ScanState::Uploading);
        let job_id = self
            .gate
            .run(service.submit(request.content(), request.filename()))
            .await?;
        let mut job = AnalysisJob::submitted(job_id);

        Self::transition(ScanState::Polling);
        self.wait_for_analysis(service, &mut job).await?;

        Self::transition(ScanState::RefetchingReport);
        match self.gate.run(service.lookup(sha256)).await? {
            Lookup::Found(report) => Ok(self.found(sha256, report, ReportSource::Analyzed)),
            Lookup::NotFound => Err(PhishnetError::MalformedResponse(format!(
                "analysis {} completed but no report exists",
                job.id
            ))),
        }
    }

    /// Poll until the job completes or the budget runs out
    async fn wait_for_analysis(
        &self,
        service: &dyn ReputationService,
        job: &mut AnalysisJob,
    ) -> Result<()> {
        let started = Instant::now();
        let budget = self.config.timeout_duration();
        let interval = self.config.poll_interval_duration();

        loop {
            let poll = self.gate.run(service.poll_status(&job.id)).await?;
            job.observe(poll.status);

            if job.status.is_completed() {
                debug!(job_id = %job.id, "analysis completed");
                return Ok(());
            }

            let elapsed = started.elapsed();
            if elapsed > budget {
                return Err(PhishnetError::Timeout {
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            debug!(job_id = %job.id, status = %job.status, "analysis pending");
            tokio::time::sleep(interval).await;
        }
    }

    fn found(&self, sha256: &str, report: ReputationReport, source: ReportSource) -> ScanOutcome {
        self.reports
            .set(sha256, report.clone(), Some(self.config.report_ttl()));
        ScanOutcome::Found { report, source }
    }

    fn transition(state: ScanState) {
        debug!(state = %state, "scan state");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use phishnet_core::{AnalysisPoll, AnalysisStats, AnalysisStatus};
    use std::collections::VecDeque;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Lookup(String),
        Submit(String),
        Poll(String),
    }

    /// Replays queued answers and records every call
    #[derive(Default)]
    struct ScriptedService {
        lookups: Mutex<VecDeque<Result<Lookup>>>,
        submits: Mutex<VecDeque<Result<String>>>,
        polls: Mutex<VecDeque<AnalysisStatus>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedService {
        fn then_lookup(self, answer: Result<Lookup>) -> Self {
            self.lookups.lock().push_back(answer);
            self
        }

        fn then_submit(self, answer: Result<String>) -> Self {
            self.submits.lock().push_back(answer);
            self
        }

        fn then_poll(self, status: AnalysisStatus) -> Self {
            self.polls.lock().push_back(status);
            self
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().clone()
        }
    }

    #[async_trait]
    impl ReputationService for ScriptedService {
        async fn lookup(&self, sha256: &str) -> Result<Lookup> {
            self.calls.lock().push(Call::Lookup(sha256.to_string()));
            self.lookups.lock().pop_front().unwrap_or(Ok(Lookup::NotFound))
        }

        async fn submit(&self, _content: &[u8], filename: &str) -> Result<String> {
            self.calls.lock().push(Call::Submit(filename.to_string()));
            self.submits
                .lock()
                .pop_front()
                .unwrap_or_else(|| Ok("job-1".to_string()))
        }

        async fn poll_status(&self, job_id: &str) -> Result<AnalysisPoll> {
            self.calls.lock().push(Call::Poll(job_id.to_string()));
            // an empty script keeps the job pending forever
            let status = self.polls.lock().pop_front().unwrap_or(AnalysisStatus::Pending);
            Ok(AnalysisPoll {
                status,
                raw_report: serde_json::json!({"data": {"attributes": {"status": status.to_string()}}}),
            })
        }
    }

    fn request() -> ScanRequest {
        ScanRequest::from_bytes("invoice.pdf", b"%PDF-1.4 not really".as_slice())
    }

    fn report_for(request: &ScanRequest) -> ReputationReport {
        ReputationReport::new(
            request.sha256(),
            AnalysisStats {
                malicious: 3,
                suspicious: 1,
                harmless: 10,
                undetected: 6,
            },
        )
    }

    fn orchestrator(service: &Arc<ScriptedService>, config: ScanConfig) -> ScanOrchestrator {
        let service: Arc<dyn ReputationService> = service.clone();
        ScanOrchestrator::new(service, config)
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_hash_full_sequence() {
        let req = request();
        let service = Arc::new(
            ScriptedService::default()
                .then_lookup(Ok(Lookup::NotFound))
                .then_submit(Ok("job-1".into()))
                .then_poll(AnalysisStatus::Pending)
                .then_poll(AnalysisStatus::Pending)
                .then_poll(AnalysisStatus::Completed)
                .then_lookup(Ok(Lookup::Found(report_for(&req)))),
        );
        let scanner = orchestrator(&service, ScanConfig::default());

        let scan = scanner.scan(&req, &CancellationToken::new()).await;

        let hash = req.sha256().to_string();
        assert_eq!(
            service.calls(),
            vec![
                Call::Lookup(hash.clone()),
                Call::Submit("invoice.pdf".into()),
                Call::Poll("job-1".into()),
                Call::Poll("job-1".into()),
                Call::Poll("job-1".into()),
                Call::Lookup(hash),
            ]
        );
        assert!(matches!(
            scan.outcome,
            ScanOutcome::Found {
                source: ReportSource::Analyzed,
                ..
            }
        ));
        assert!((scan.outcome.malicious_ratio() - 0.2).abs() < f64::EPSILON);
        assert_eq!(scanner.gate().available(), 2);
    }

    #[tokio::test]
    async fn test_known_hash_never_uploads() {
        let req = request();
        let service =
            Arc::new(ScriptedService::default().then_lookup(Ok(Lookup::Found(report_for(&req)))));
        let scanner = orchestrator(&service, ScanConfig::default());
        let cancel = CancellationToken::new();

        let first = scanner.scan(&req, &cancel).await;
        let second = scanner.scan(&req, &cancel).await;

        assert!(matches!(
            first.outcome,
            ScanOutcome::Found {
                source: ReportSource::Existing,
                ..
            }
        ));
        assert!(matches!(
            second.outcome,
            ScanOutcome::Found {
                source: ReportSource::Cache,
                ..
            }
        ));
        assert_eq!(service.calls(), vec![Call::Lookup(req.sha256().to_string())]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timeout_scores_zero() {
        let service = Arc::new(ScriptedService::default());
        let config = ScanConfig::default()
            .poll_interval(Duration::from_secs(15))
            .timeout(Duration::from_secs(60));
        let scanner = orchestrator(&service, config);

        let scan = scanner.scan(&request(), &CancellationToken::new()).await;

        match scan.outcome {
            ScanOutcome::TimedOut { elapsed_secs } => assert!(elapsed_secs > 60),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(scan.outcome.malicious_ratio().abs() < f64::EPSILON);
        // polls at 0, 15, 30, 45, 60, 75s
        let polls = service
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Poll(_)))
            .count();
        assert_eq!(polls, 6);
        assert_eq!(scanner.gate().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sub_second_interval_does_not_spin() {
        let service = Arc::new(ScriptedService::default());
        let config = ScanConfig::default()
            .poll_interval(Duration::from_millis(900))
            .timeout(Duration::from_secs(60));
        let scanner = orchestrator(&service, config);

        let scan = scanner.scan(&request(), &CancellationToken::new()).await;

        assert_eq!(scan.outcome.label(), "timed_out");
        // one poll per second at t = 0..=61; the 61s poll exceeds the budget
        let polls = service
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Poll(_)))
            .count();
        assert_eq!(polls, 62);
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_cache_does_not_grow_unbounded() {
        let requests: Vec<ScanRequest> = (0..3u8)
            .map(|i| ScanRequest::from_bytes(format!("f{i}"), vec![i; 4]))
            .collect();
        let mut service = ScriptedService::default();
        for req in &requests {
            service = service.then_lookup(Ok(Lookup::Found(report_for(req))));
        }
        let fresh = ScanRequest::from_bytes("late.pdf", b"late".as_slice());
        service = service.then_lookup(Ok(Lookup::Found(report_for(&fresh))));

        let scanner = orchestrator(&Arc::new(service), ScanConfig::default());
        let cancel = CancellationToken::new();
        scanner.scan_all(&requests, &cancel).await;
        assert_eq!(scanner.report_cache().len(), 3);

        // unread reports are dropped by the next write after their TTL
        tokio::time::advance(scanner.config().report_ttl()).await;
        scanner.scan(&fresh, &cancel).await;
        assert_eq!(scanner.report_cache().len(), 1);
    }

    #[tokio::test]
    async fn test_network_error_is_failed_outcome() {
        let service = Arc::new(ScriptedService::default().then_lookup(Err(PhishnetError::Network {
            status: 500,
            body: "boom".into(),
        })));
        let scanner = orchestrator(&service, ScanConfig::default());

        let scan = scanner.scan(&request(), &CancellationToken::new()).await;

        match &scan.outcome {
            ScanOutcome::Failed { reason } => assert!(reason.contains("500")),
            other => panic!("expected failure, got {other:?}"),
        }
        assert!(scan.outcome.malicious_ratio().abs() < f64::EPSILON);
        assert_eq!(scanner.gate().available(), 2);
    }

    #[tokio::test]
    async fn test_upload_error_releases_gate() {
        let service = Arc::new(
            ScriptedService::default()
                .then_lookup(Ok(Lookup::NotFound))
                .then_submit(Err(PhishnetError::Network {
                    status: 413,
                    body: "too large".into(),
                })),
        );
        let scanner = orchestrator(&service, ScanConfig::default().max_concurrency(1));

        let scan = scanner.scan(&request(), &CancellationToken::new()).await;

        assert_eq!(scan.outcome.label(), "failed");
        assert_eq!(scanner.gate().available(), 1);
        assert!(!service.calls().iter().any(|c| matches!(c, Call::Poll(_))));
    }

    #[tokio::test]
    async fn test_missing_report_after_completion_fails() {
        let service = Arc::new(
            ScriptedService::default()
                .then_lookup(Ok(Lookup::NotFound))
                .then_poll(AnalysisStatus::Completed)
                .then_lookup(Ok(Lookup::NotFound)),
        );
        let scanner = orchestrator(&service, ScanConfig::default());

        let scan = scanner.scan(&request(), &CancellationToken::new()).await;
        assert_eq!(scan.outcome.label(), "failed");
    }

    #[tokio::test]
    async fn test_disabled_makes_no_calls() {
        let scanner = ScanOrchestrator::disabled(ScanConfig::default());
        assert!(!scanner.is_enabled());

        let scan = scanner.scan(&request(), &CancellationToken::new()).await;
        assert_eq!(scan.outcome, ScanOutcome::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_mid_poll_releases_gate() {
        let service = Arc::new(ScriptedService::default());
        let scanner = orchestrator(&service, ScanConfig::default().max_concurrency(1));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(40)).await;
            trigger.cancel();
        });

        let scan = scanner.scan(&request(), &cancel).await;

        assert_eq!(scan.outcome, ScanOutcome::Cancelled);
        assert_eq!(scanner.gate().available(), 1);
        assert!(scanner.report_cache().is_empty());
    }

    #[tokio::test]
    async fn test_scan_all_dedups_and_keeps_order() {
        let a = ScanRequest::from_bytes("a.pdf", b"same".as_slice());
        let b = ScanRequest::from_bytes("b.doc", b"other".as_slice());
        let a_again = ScanRequest::from_bytes("copy-of-a.pdf", b"same".as_slice());

        let service = Arc::new(
            ScriptedService::default()
                .then_lookup(Ok(Lookup::Found(report_for(&a))))
                .then_lookup(Ok(Lookup::Found(report_for(&b)))),
        );
        let scanner = orchestrator(&service, ScanConfig::default());

        let scans = scanner
            .scan_all(&[a.clone(), b, a_again], &CancellationToken::new())
            .await;

        let files: Vec<&str> = scans.iter().map(|s| s.file.as_str()).collect();
        assert_eq!(files, ["a.pdf", "b.doc", "copy-of-a.pdf"]);
        assert_eq!(scans[0].outcome, scans[2].outcome);
        assert_eq!(scans[2].sha256, a.sha256());

        let lookups = service
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Lookup(_)))
            .count();
        assert_eq!(lookups, 2);
    }
}
