use clap::Parser;
use deskpulse_core::raster::DEFAULT_ART_WIDTH;
use deskpulse_core::Cadence;
use std::path::PathBuf;
use std::time::Duration;

const MIN_TICK: Duration = Duration::from_millis(100);
const MIN_POLL: Duration = Duration::from_secs(1);

#[derive(Parser, Debug, Clone)]
#[command(name = "deskpulse", about = "Terminal desk dashboard")]
pub struct Args {
    #[arg(long, env = "DESKPULSE_TICK_MS", default_value_t = 1000)]
    pub tick_ms: u64,
    #[arg(long, env = "DESKPULSE_SYSTEM_SECS", default_value_t = 2)]
    pub system_secs: u64,
    #[arg(long, env = "DESKPULSE_ACTIVITY_SECS", default_value_t = 60)]
    pub activity_secs: u64,
    #[arg(long, env = "DESKPULSE_PLAYBACK_SECS", default_value_t = 5)]
    pub playback_secs: u64,
    #[arg(long, env = "DESKPULSE_FETCH_TIMEOUT_SECS", default_value_t = 15)]
    pub fetch_timeout_secs: u64,
    #[arg(long, env = "DESKPULSE_ART_WIDTH", default_value_t = DEFAULT_ART_WIDTH)]
    pub art_width: u32,
    #[arg(long, env = "DESKPULSE_LOG_FILE")]
    pub log_file: Option<PathBuf>,
    #[arg(long, env = "DESKPULSE_DEBUG", default_value_t = false)]
    pub debug: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GithubCredentials {
    pub username: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub cadence: Cadence,
    pub fetch_timeout: Duration,
    pub art_width: u32,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub github: GithubCredentials,
    pub spotify: SpotifyCredentials,
}

pub fn load_config() -> Config {
    // A missing .env is normal; the process environment still applies.
    dotenvy::dotenv().ok();
    let args = Args::parse();
    Config::from_args(args, |key| std::env::var(key).ok())
}

impl Config {
    pub fn from_args(args: Args, env: impl Fn(&str) -> Option<String>) -> Self {
        let cred = |key: &str| non_empty(env(key));
        Self {
            cadence: Cadence {
                tick: Duration::from_millis(args.tick_ms).max(MIN_TICK),
                system: poll_interval(args.system_secs),
                activity: poll_interval(args.activity_secs),
                playback: poll_interval(args.playback_secs),
            },
            fetch_timeout: poll_interval(args.fetch_timeout_secs),
            art_width: args.art_width.max(1),
            log_file: args.log_file,
            debug: args.debug,
            github: GithubCredentials {
                username: cred("GITHUB_USERNAME"),
                token: cred("GITHUB_TOKEN"),
            },
            spotify: SpotifyCredentials {
                client_id: cred("SPOTIFY_CLIENT_ID").unwrap_or_default(),
                client_secret: cred("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
                refresh_token: cred("SPOTIFY_REFRESH_TOKEN"),
            },
        }
    }
}

fn poll_interval(secs: u64) -> Duration {
    Duration::from_secs(secs).max(MIN_POLL)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["deskpulse"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).expect("args")
    }

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_dashboard_cadence() {
        let config = Config::from_args(args(&[]), env_from(&[]));
        assert_eq!(config.cadence, Cadence::default());
        assert_eq!(config.fetch_timeout, Duration::from_secs(15));
        assert_eq!(config.art_width, DEFAULT_ART_WIDTH);
        assert!(!config.debug);
        assert_eq!(config.github, GithubCredentials::default());
        assert_eq!(config.spotify.refresh_token, None);
    }

    #[test]
    fn zero_intervals_are_raised_to_minimums() {
        let config = Config::from_args(
            args(&[
                "--tick-ms",
                "0",
                "--system-secs",
                "0",
                "--fetch-timeout-secs",
                "0",
                "--art-width",
                "0",
            ]),
            env_from(&[]),
        );
        assert_eq!(config.cadence.tick, Duration::from_millis(100));
        assert_eq!(config.cadence.system, Duration::from_secs(1));
        assert_eq!(config.fetch_timeout, Duration::from_secs(1));
        assert_eq!(config.art_width, 1);
    }

    #[test]
    fn blank_credentials_count_as_absent() {
        let config = Config::from_args(
            args(&[]),
            env_from(&[
                ("GITHUB_USERNAME", " octocat "),
                ("GITHUB_TOKEN", "   "),
                ("SPOTIFY_CLIENT_ID", "id"),
                ("SPOTIFY_REFRESH_TOKEN", ""),
            ]),
        );
        assert_eq!(config.github.username.as_deref(), Some("octocat"));
        assert_eq!(config.github.token, None);
        assert_eq!(config.spotify.client_id, "id");
        assert_eq!(config.spotify.client_secret, "");
        assert_eq!(config.spotify.refresh_token, None);
    }

    #[test]
    fn flags_override_defaults() {
        let config = Config::from_args(
            args(&[
                "--activity-secs",
                "300",
                "--log-file",
                "/tmp/deskpulse.log",
                "--debug",
            ]),
            env_from(&[]),
        );
        assert_eq!(config.cadence.activity, Duration::from_secs(300));
        assert_eq!(
            config.log_file.as_deref(),
            Some(std::path::Path::new("/tmp/deskpulse.log"))
        );
        assert!(config.debug);
    }
}
