//! User-agent selection for invocation attempts.

use std::sync::atomic::{AtomicUsize, Ordering};

use rand::seq::IndexedRandom;

/// Browser user agents rotated across attempts.
pub const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:125.0) Gecko/20100101 Firefox/125.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4_1) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4.1 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
];

/// Picks the identity string presented by an attempt.
pub trait IdentitySelector: Send + Sync {
    fn next_user_agent(&self) -> String;
}

/// Always returns the configured user agent.
#[derive(Debug, Clone)]
pub struct FixedIdentity(String);

impl FixedIdentity {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self(user_agent.into())
    }
}

impl IdentitySelector for FixedIdentity {
    fn next_user_agent(&self) -> String {
        self.0.clone()
    }
}

/// Uniformly random pick from a pool.
#[derive(Debug, Clone)]
pub struct RandomIdentity {
    pool: Vec<String>,
}

impl RandomIdentity {
    pub fn new(pool: Vec<String>) -> Self {
        Self { pool }
    }
}

impl Default for RandomIdentity {
    fn default() -> Self {
        Self::new(default_pool())
    }
}

impl IdentitySelector for RandomIdentity {
    fn next_user_agent(&self) -> String {
        self.pool
            .choose(&mut rand::rng())
            .cloned()
            .unwrap_or_else(|| DEFAULT_USER_AGENTS[0].to_string())
    }
}

/// Deterministic rotation through a pool.
#[derive(Debug)]
pub struct RoundRobinIdentity {
    pool: Vec<String>,
    cursor: AtomicUsize,
}

impl RoundRobinIdentity {
    pub fn new(pool: Vec<String>) -> Self {
        Self {
            pool,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl Default for RoundRobinIdentity {
    fn default() -> Self {
        Self::new(default_pool())
    }
}

impl IdentitySelector for RoundRobinIdentity {
    fn next_user_agent(&self) -> String {
        if self.pool.is_empty() {
            return DEFAULT_USER_AGENTS[0].to_string();
        }
        let index = self.cursor.fetch_add(1, Ordering::Relaxed) % self.pool.len();
        self.pool[index].clone()
    }
}

fn default_pool() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|ua| ua.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_identity() {
        let identity = FixedIdentity::new("curl/8.0");
        assert_eq!(identity.next_user_agent(), "curl/8.0");
        assert_eq!(identity.next_user_agent(), "curl/8.0");
    }

    #[test]
    fn test_round_robin_wraps() {
        let identity = RoundRobinIdentity::new(vec!["a".into(), "b".into()]);
        let picks: Vec<String> = (0..5).map(|_| identity.next_user_agent()).collect();
        assert_eq!(picks, vec!["a", "b", "a", "b", "a"]);
    }

    #[test]
    fn test_random_stays_in_pool() {
        let identity = RandomIdentity::default();
        for _ in 0..20 {
            let ua = identity.next_user_agent();
            assert!(DEFAULT_USER_AGENTS.contains(&ua.as_str()));
        }
    }

    #[test]
    fn test_empty_pools_fall_back() {
        assert_eq!(
            RandomIdentity::new(vec![]).next_user_agent(),
            DEFAULT_USER_AGENTS[0]
        );
        assert_eq!(
            RoundRobinIdentity::new(vec![]).next_user_agent(),
            DEFAULT_USER_AGENTS[0]
        );
    }
}
