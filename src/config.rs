use std::{env, net::SocketAddr, str::FromStr, sync::Arc, time::Duration};

use anyhow::{bail, Context, Result};

use crate::engine::{AlertPolicy, EveryRecompute, SingleOpen};
use crate::service::AdviceJobConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertPolicyKind {
    Every,
    SingleOpen,
}

impl AlertPolicyKind {
    pub fn build(self) -> Arc<dyn AlertPolicy> {
        match self {
            AlertPolicyKind::Every => Arc::new(EveryRecompute),
            AlertPolicyKind::SingleOpen => Arc::new(SingleOpen),
        }
    }
}

impl FromStr for AlertPolicyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "every" => Ok(AlertPolicyKind::Every),
            "single-open" => Ok(AlertPolicyKind::SingleOpen),
            other => bail!("ALERT_POLICY must be 'every' or 'single-open', got '{}'", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. Without one the service keeps everything in memory.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub advice_job: AdviceJobConfig,
    pub alert_policy: AlertPolicyKind,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let bind_addr: SocketAddr = var("BIND_ADDR", "0.0.0.0:3050")
            .parse()
            .context("BIND_ADDR must be a socket address")?;
        let db_max_connections: u32 = var("DB_MAX_CONNECTIONS", "5")
            .parse()
            .context("DB_MAX_CONNECTIONS must be a number")?;
        let advice_delay_ms: u64 = var("ADVICE_DELAY_MS", "0")
            .parse()
            .context("ADVICE_DELAY_MS must be a number of milliseconds")?;
        let advice_max_retries: usize = var("ADVICE_MAX_RETRIES", "3")
            .parse()
            .context("ADVICE_MAX_RETRIES must be a number")?;
        let alert_policy: AlertPolicyKind = var("ALERT_POLICY", "every").parse()?;

        Ok(Config {
            database_url: lookup("DATABASE_URL").filter(|u| !u.is_empty()),
            bind_addr,
            db_max_connections,
            advice_job: AdviceJobConfig {
                delay: Duration::from_millis(advice_delay_ms),
                max_retries: advice_max_retries,
                ..AdviceJobConfig::default()
            },
            alert_policy,
        })
    }
}
