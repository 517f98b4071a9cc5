//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};

/// Multi-label issue classifier HTTP service.
#[derive(Debug, Clone, Parser)]
#[command(name = "labelwise", version, about)]
pub struct Settings {
    /// Address to listen on.
    #[arg(long, env = "LABELWISE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Path prefix for the API routes.
    #[arg(long, env = "API_PREFIX", default_value = "/api/v1")]
    pub api_prefix: String,

    /// Name reported by the health check.
    #[arg(long, env = "PROJECT_NAME", default_value = "Multi-Label Issue Classifier")]
    pub project_name: String,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(
        long,
        env = "DEBUG_MODE",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub debug: bool,

    /// Directory containing the model artifact.
    #[arg(long, env = "MODEL_PATH", default_value = "models/")]
    pub model_path: PathBuf,

    /// Artifact file name inside the model directory.
    #[arg(
        long,
        env = "MODEL_FILENAME",
        default_value = "github_classifier_cc_stratified.json"
    )]
    pub model_filename: String,

    /// Load the model at startup instead of on the first request.
    #[arg(
        long,
        env = "LABELWISE_PRELOAD",
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true"
    )]
    pub preload: bool,
}

impl Settings {
    pub fn artifact_path(&self) -> PathBuf {
        self.model_path.join(&self.model_filename)
    }

    /// The API prefix with exactly one leading slash and no trailing slash.
    /// An empty or `/` prefix mounts the API at the root.
    pub fn route_prefix(&self) -> String {
        let trimmed = self.api_prefix.trim_matches('/');
        if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        }
    }

    pub fn default_log_level(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Settings {
        Settings::try_parse_from(std::iter::once("labelwise").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let s = parse(&[]);
        assert_eq!(s.route_prefix(), "/api/v1");
        assert_eq!(
            s.artifact_path(),
            PathBuf::from("models/github_classifier_cc_stratified.json")
        );
        assert!(!s.preload);
        assert_eq!(s.default_log_level(), "info");
    }

    #[test]
    fn prefix_is_normalized() {
        assert_eq!(parse(&["--api-prefix", "api/v2/"]).route_prefix(), "/api/v2");
        assert_eq!(parse(&["--api-prefix", "/"]).route_prefix(), "");
    }

    #[test]
    fn flags_override_defaults() {
        let s = parse(&[
            "--model-path",
            "/srv/models",
            "--model-filename",
            "m.json",
            "--debug",
            "--bind",
            "127.0.0.1:9000",
        ]);
        assert_eq!(s.artifact_path(), PathBuf::from("/srv/models/m.json"));
        assert_eq!(s.default_log_level(), "debug");
        assert_eq!(s.bind.port(), 9000);
    }

    #[test]
    fn bool_flags_accept_boolish_values() {
        assert!(parse(&["--debug"]).debug);
        assert!(parse(&["--debug=yes"]).debug);
        assert!(parse(&["--debug=1"]).debug);
        assert!(parse(&["--debug=on"]).debug);
        assert!(!parse(&["--debug=0"]).debug);
        assert!(!parse(&["--debug=false"]).debug);
        assert!(!parse(&["--debug=off"]).debug);
        assert!(parse(&["--preload=true"]).preload);
        assert!(!parse(&["--preload=no"]).preload);
    }

    #[test]
    fn bare_bool_flag_leaves_next_argument_alone() {
        let s = parse(&["--debug", "--model-path", "/srv/models"]);
        assert!(s.debug);
        assert_eq!(s.model_path, PathBuf::from("/srv/models"));
    }

    #[test]
    fn rejects_unrecognized_bool_value() {
        assert!(Settings::try_parse_from(["labelwise", "--debug=maybe"]).is_err());
    }

    #[test]
    fn rejects_bad_bind_address() {
        assert!(Settings::try_parse_from(["labelwise", "--bind", "nowhere"]).is_err());
    }
}
