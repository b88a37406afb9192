//! Fallback strategies for yt-dlp invocations.
//!
//! Each strategy is a pure decorator over the base argument list. The
//! [`InvocationEngine`](crate::InvocationEngine) walks them in order and stops
//! at the first attempt that exits cleanly.

use std::path::PathBuf;

/// Per-attempt values a strategy may weave into the argument list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyInputs {
    pub proxy: Option<String>,
    /// Scoped cookie file for this attempt, if credentials are configured
    pub cookies_path: Option<PathBuf>,
    pub user_agent: String,
    pub extractor_retries: u32,
    /// Base pacing in seconds
    pub sleep_interval: u32,
}

/// Argument decorator. `None` means the strategy does not apply.
pub type DecorateFn = fn(&[String], &StrategyInputs) -> Option<Vec<String>>;

/// One named step of the fallback chain.
#[derive(Debug, Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    /// Whether the engine should materialise a cookie file before decorating
    pub uses_cookies: bool,
    pub decorate: DecorateFn,
}

impl Strategy {
    pub fn apply(&self, base: &[String], inputs: &StrategyInputs) -> Option<Vec<String>> {
        (self.decorate)(base, inputs)
    }
}

/// The default chain: authenticated, rotated identity, aggressive pacing, minimal.
pub fn default_strategies() -> Vec<Strategy> {
    vec![
        Strategy {
            name: "authenticated",
            uses_cookies: true,
            decorate: authenticated,
        },
        Strategy {
            name: "rotated_identity",
            uses_cookies: false,
            decorate: rotated_identity,
        },
        Strategy {
            name: "aggressive_pacing",
            uses_cookies: false,
            decorate: aggressive_pacing,
        },
        Strategy {
            name: "minimal",
            uses_cookies: false,
            decorate: minimal,
        },
    ]
}

/// Credentials, identity, retries and request pacing.
pub fn authenticated(base: &[String], inputs: &StrategyInputs) -> Option<Vec<String>> {
    let cookies = inputs.cookies_path.as_ref()?;

    let mut args = proxy_args(inputs);
    args.push("--cookies".into());
    args.push(cookies.display().to_string());
    args.extend(identity_args(inputs));
    args.push("--extractor-retries".into());
    args.push(inputs.extractor_retries.to_string());
    args.push("--sleep-requests".into());
    args.push(inputs.sleep_interval.to_string());
    args.push("--retry-sleep".into());
    args.push("exp=1:10".into());
    args.extend_from_slice(base);
    Some(args)
}

/// Anonymous request with a rotated identity and the web player client.
pub fn rotated_identity(base: &[String], inputs: &StrategyInputs) -> Option<Vec<String>> {
    let mut args = proxy_args(inputs);
    args.extend(identity_args(inputs));
    args.push("--extractor-args".into());
    args.push("youtube:player_client=web".into());
    args.push("--extractor-retries".into());
    args.push(inputs.extractor_retries.to_string());
    args.push("--sleep-requests".into());
    args.push(inputs.sleep_interval.to_string());
    args.extend_from_slice(base);
    Some(args)
}

/// Alternate player clients, doubled retries and a randomised sleep window.
pub fn aggressive_pacing(base: &[String], inputs: &StrategyInputs) -> Option<Vec<String>> {
    let min_sleep = inputs.sleep_interval.max(1);
    let max_sleep = min_sleep.saturating_mul(3);

    let mut args = proxy_args(inputs);
    args.extend(identity_args(inputs));
    args.push("--extractor-args".into());
    args.push("youtube:player_client=android,web".into());
    args.push("--extractor-retries".into());
    args.push(inputs.extractor_retries.saturating_mul(2).to_string());
    args.push("--sleep-interval".into());
    args.push(min_sleep.to_string());
    args.push("--max-sleep-interval".into());
    args.push(max_sleep.to_string());
    args.push("--retry-sleep".into());
    args.push("exp=1:30".into());
    args.extend_from_slice(base);
    Some(args)
}

/// The undecorated request, proxied if configured.
pub fn minimal(base: &[String], inputs: &StrategyInputs) -> Option<Vec<String>> {
    let mut args = proxy_args(inputs);
    args.extend_from_slice(base);
    Some(args)
}

fn proxy_args(inputs: &StrategyInputs) -> Vec<String> {
    match &inputs.proxy {
        Some(proxy) => vec!["--proxy".into(), proxy.clone()],
        None => Vec::new(),
    }
}

fn identity_args(inputs: &StrategyInputs) -> Vec<String> {
    if inputs.user_agent.is_empty() {
        return Vec::new();
    }
    vec!["--user-agent".into(), inputs.user_agent.clone()]
}
