//! Multi-strategy yt-dlp invocation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::YtDlpConfig;
use crate::cookies::CookieSource;
use crate::error::{MediaError, MediaResult};
use crate::identity::{FixedIdentity, IdentitySelector, RandomIdentity, DEFAULT_USER_AGENTS};
use crate::runner::{CommandRunner, ProcessOutput, ProcessRunner};
use crate::strategy::{default_strategies, Strategy, StrategyInputs};

const ATTEMPTS_TOTAL: &str = "ytclip_invocation_attempts_total";
const ATTEMPT_DURATION: &str = "ytclip_invocation_attempt_duration_seconds";

/// Runs yt-dlp through an ordered chain of fallback strategies.
///
/// Every attempt gets its own timeout, identity and (when the strategy asks for
/// one) scoped cookie file. The first clean exit wins.
pub struct InvocationEngine {
    program: String,
    strategies: Vec<Strategy>,
    identity: Arc<dyn IdentitySelector>,
    cookies: CookieSource,
    runner: Arc<dyn CommandRunner>,
    proxy: Option<String>,
    extractor_retries: u32,
    sleep_interval: u32,
    cookie_cleanup_delay: Duration,
    default_timeout: Duration,
}

impl InvocationEngine {
    pub fn from_config(config: &YtDlpConfig) -> Self {
        let identity: Arc<dyn IdentitySelector> = match (&config.user_agent, config.user_agent_rotation) {
            (Some(ua), _) => Arc::new(FixedIdentity::new(ua.clone())),
            (None, true) => Arc::new(RandomIdentity::default()),
            (None, false) => Arc::new(FixedIdentity::new(DEFAULT_USER_AGENTS[0])),
        };

        Self {
            program: config.binary.clone(),
            strategies: default_strategies(),
            identity,
            cookies: config.cookie_source(),
            runner: Arc::new(ProcessRunner),
            proxy: config.proxy.clone(),
            extractor_retries: config.extractor_retries,
            sleep_interval: config.sleep_interval,
            cookie_cleanup_delay: config.cookie_cleanup_delay,
            default_timeout: config.command_timeout,
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentitySelector>) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_cookies(mut self, cookies: CookieSource) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Invoke with the default per-attempt timeout.
    pub async fn invoke(&self, base_args: &[String]) -> MediaResult<ProcessOutput> {
        self.invoke_with_timeout(base_args, self.default_timeout).await
    }

    /// Invoke, bounding each attempt by `timeout`.
    pub async fn invoke_with_timeout(
        &self,
        base_args: &[String],
        timeout: Duration,
    ) -> MediaResult<ProcessOutput> {
        let mut attempts = 0usize;
        let mut last_error: Option<MediaError> = None;

        for strategy in &self.strategies {
            let scoped = if strategy.uses_cookies {
                match self.cookies.materialize(self.cookie_cleanup_delay).await {
                    Ok(scoped) => scoped,
                    Err(e) => {
                        warn!(strategy = strategy.name, "Skipping strategy, cookies unusable: {}", e);
                        continue;
                    }
                }
            } else {
                None
            };

            let inputs = StrategyInputs {
                proxy: self.proxy.clone(),
                cookies_path: scoped.as_ref().map(|c| c.path().to_path_buf()),
                user_agent: self.identity.next_user_agent(),
                extractor_retries: self.extractor_retries,
                sleep_interval: self.sleep_interval,
            };

            let Some(args) = strategy.apply(base_args, &inputs) else {
                debug!(strategy = strategy.name, "Strategy not applicable, skipping");
                continue;
            };

            attempts += 1;
            debug!(strategy = strategy.name, attempt = attempts, "Invoking {}", self.program);

            let started = Instant::now();
            let result = self.runner.run(&self.program, &args, timeout).await;
            drop(scoped);

            metrics::histogram!(ATTEMPT_DURATION, "strategy" => strategy.name)
                .record(started.elapsed().as_secs_f64());

            match result {
                Ok(output) if output.success() => {
                    metrics::counter!(ATTEMPTS_TOTAL, "strategy" => strategy.name, "outcome" => "success")
                        .increment(1);
                    info!(strategy = strategy.name, attempt = attempts, "Invocation succeeded");
                    return Ok(output);
                }
                Ok(output) => {
                    metrics::counter!(ATTEMPTS_TOTAL, "strategy" => strategy.name, "outcome" => "failed")
                        .increment(1);
                    warn!(
                        strategy = strategy.name,
                        exit_code = ?output.exit_code,
                        "Invocation strategy failed"
                    );
                    debug!(strategy = strategy.name, output = %output.combined(), "Failed attempt output");
                    last_error = Some(MediaError::command_failed(
                        format!("{} exited with status {:?}", self.program, output.exit_code),
                        output.combined(),
                        output.exit_code,
                    ));
                }
                Err(e) => {
                    let outcome = if e.is_timeout() { "timeout" } else { "error" };
                    metrics::counter!(ATTEMPTS_TOTAL, "strategy" => strategy.name, "outcome" => outcome)
                        .increment(1);
                    warn!(strategy = strategy.name, "Invocation strategy errored: {}", e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(last) => Err(MediaError::StrategiesExhausted {
                attempts,
                last: Box::new(last),
            }),
            None => Err(MediaError::NoApplicableStrategy),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::identity::RoundRobinIdentity;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Scripted outcome for one fake process.
    #[derive(Debug, Clone)]
    pub enum Outcome {
        Exit(i32, &'static str),
        Timeout,
    }

    #[derive(Default)]
    pub struct FakeRunner {
        script: Mutex<VecDeque<Outcome>>,
        pub calls: Mutex<Vec<(Vec<String>, Duration)>>,
    }

    impl FakeRunner {
        pub fn new(script: Vec<Outcome>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(Vec::new()),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(
            &self,
            _program: &str,
            args: &[String],
            timeout: Duration,
        ) -> MediaResult<ProcessOutput> {
            self.calls.lock().unwrap().push((args.to_vec(), timeout));
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(Outcome::Exit(code, stdout)) => Ok(ProcessOutput {
                    exit_code: Some(code),
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                }),
                Some(Outcome::Timeout) => Err(MediaError::Timeout(timeout)),
                None => panic!("unexpected extra invocation"),
            }
        }
    }

    const COOKIES: &str = ".youtube.com\tTRUE\t/\tTRUE\t1704067200\tVISITOR_INFO1_LIVE\tabc\n";

    fn engine(runner: Arc<FakeRunner>) -> InvocationEngine {
        InvocationEngine::from_config(&YtDlpConfig::default())
            .with_runner(runner)
            .with_identity(Arc::new(RoundRobinIdentity::new(vec!["ua-1".into(), "ua-2".into()])))
    }

    fn base() -> Vec<String> {
        vec!["-F".into(), "https://youtu.be/abc".into()]
    }

    #[tokio::test]
    async fn test_timeout_then_success_spawns_two_processes() {
        let runner = FakeRunner::new(vec![Outcome::Timeout, Outcome::Exit(0, "formats")]);
        let engine = engine(runner.clone()).with_cookies(CookieSource::Content(COOKIES.into()));

        let output = engine.invoke(&base()).await.unwrap();

        assert_eq!(output.stdout, "formats");
        assert_eq!(runner.call_count(), 2);

        let calls = runner.calls.lock().unwrap();
        assert!(calls[0].0.contains(&"--cookies".to_string()));
        assert!(!calls[1].0.contains(&"--cookies".to_string()));
    }

    #[tokio::test]
    async fn test_each_attempt_gets_full_timeout() {
        let runner = FakeRunner::new(vec![
            Outcome::Exit(1, ""),
            Outcome::Exit(1, ""),
            Outcome::Exit(0, "ok"),
        ]);
        let engine = engine(runner.clone());

        engine
            .invoke_with_timeout(&base(), Duration::from_secs(7))
            .await
            .unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert!(calls.iter().all(|(_, t)| *t == Duration::from_secs(7)));
    }

    #[tokio::test]
    async fn test_without_cookies_authenticated_is_skipped() {
        let runner = FakeRunner::new(vec![Outcome::Exit(0, "ok")]);
        let engine = engine(runner.clone());

        engine.invoke(&base()).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains(&"youtube:player_client=web".to_string()));
    }

    #[tokio::test]
    async fn test_all_strategies_fail() {
        let runner = FakeRunner::new(vec![
            Outcome::Exit(1, ""),
            Outcome::Timeout,
            Outcome::Exit(2, "ERROR: Sign in to confirm you're not a bot"),
        ]);
        let engine = engine(runner.clone());

        let err = engine.invoke(&base()).await.unwrap_err();

        match &err {
            MediaError::StrategiesExhausted { attempts, last } => {
                assert_eq!(*attempts, 3);
                assert!(matches!(
                    last.as_ref(),
                    MediaError::CommandFailed { exit_code: Some(2), .. }
                ));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.output(), Some("ERROR: Sign in to confirm you're not a bot"));
        assert_eq!(runner.call_count(), 3);
    }

    #[tokio::test]
    async fn test_identity_rotates_per_attempt() {
        let runner = FakeRunner::new(vec![Outcome::Exit(1, ""), Outcome::Exit(0, "ok")]);
        let engine = engine(runner.clone());

        engine.invoke(&base()).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        let agent = |args: &[String]| {
            let i = args.iter().position(|a| a == "--user-agent").unwrap();
            args[i + 1].clone()
        };
        assert_ne!(agent(&calls[0].0), agent(&calls[1].0));
    }

    #[tokio::test]
    async fn test_no_applicable_strategy() {
        let runner = FakeRunner::new(vec![]);
        let engine = engine(runner.clone()).with_strategies(vec![Strategy {
            name: "never",
            uses_cookies: false,
            decorate: |_, _| None,
        }]);

        let err = engine.invoke(&base()).await.unwrap_err();
        assert!(matches!(err, MediaError::NoApplicableStrategy));
        assert_eq!(runner.call_count(), 0);
    }
}
