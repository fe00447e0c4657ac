use clap::Args;
use tokio::time::Duration;

use crate::client::{self, Client};
use crate::counter::{self, Counter};

/// Store settings, taken from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Connection string of the form redis://<user>:<password>@<host>:<port>
    #[arg(long, env = "REDIS_URL", hide_env_values = true)]
    pub redis_url: Option<String>,

    /// Key holding the counter
    #[arg(long, env = "COUNTER_KEY", default_value = counter::DEFAULT_KEY)]
    pub key: String,

    /// Milliseconds a command may take before the store is treated as unavailable
    #[arg(long, env = "COUNTER_TIMEOUT_MS", default_value_t = client::DEFAULT_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,
}

impl Config {
    pub fn client(&self) -> Client {
        Client::from_url(self.redis_url.as_deref())
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }

    pub fn counter(&self) -> Counter {
        Counter::new(self.client(), self.key.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Cli {
        #[command(flatten)]
        config: Config,
    }

    #[test]
    fn explicit_flags() {
        let cli = Cli::try_parse_from([
            "respcounter",
            "--redis-url",
            "redis://default:pw@localhost:6379",
            "--key",
            "visits",
            "--timeout-ms",
            "250",
        ])
        .unwrap();

        let counter = cli.config.counter();

        assert_eq!(counter.key(), "visits");
        assert!(cli.config.client().is_configured());
        assert_eq!(cli.config.client().timeout(), Duration::from_millis(250));
    }

    #[test]
    fn malformed_url_leaves_client_unconfigured() {
        let cli = Cli::try_parse_from(["respcounter", "--redis-url", "localhost:6379"]).unwrap();

        assert!(!cli.config.client().is_configured());
    }
}
