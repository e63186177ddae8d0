//! Command-line interface definition.

use std::path::PathBuf;

use clap::Parser;

use meetup2md_providers::Credential;

/// meetup2md - Download Meetup events as markdown pages for static sites
#[derive(Debug, Parser)]
#[command(name = "meetup2md")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Read and write settings to this file
    #[arg(long, env = "MEETUP2MD_CONFIG")]
    pub config: Option<PathBuf>,

    // --- Authorization ---
    /// Set the consumer key and secret
    #[arg(long, num_args = 2, value_names = ["KEY", "SECRET"])]
    pub consumer: Option<Vec<String>>,

    /// Verify authorization with the code shown in the browser
    #[arg(long)]
    pub verifier: Option<String>,

    // --- Event options (also read from [events] in the config file) ---
    /// group_urlname of the group to retrieve events from
    #[arg(long, short = 'g')]
    pub group_name: Option<String>,

    /// Only export events whose name matches this regular expression
    #[arg(long, short = 'f')]
    pub name_filter: Option<String>,

    /// Return events within a time range: two times separated by a comma
    #[arg(long, short = 't', value_name = "START,END", allow_hyphen_values = true)]
    pub time_range: Option<String>,

    /// Event status: upcoming, past, proposed, suggested, cancelled, draft, or
    /// several separated by commas
    #[arg(long = "status", short = 's', value_name = "LIST")]
    pub event_status: Option<String>,

    /// Remove text matching this regular expression from titles
    #[arg(long = "cleanup", short = 'c', value_name = "REGEX")]
    pub title_cleanup: Option<String>,

    /// Directory to write pages to; without it only a summary is shown
    #[arg(long, short = 'o', value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Overwrite existing pages
    #[arg(long)]
    pub overwrite: bool,

    /// Enable verbose debugging output
    #[arg(long, short = 'v')]
    pub verbose: bool,
}

impl Cli {
    /// Returns the consumer credential passed with `--consumer`.
    pub fn consumer_credential(&self) -> Option<Credential> {
        match self.consumer.as_deref() {
            Some([key, secret]) => Some(Credential::new(key, secret)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["meetup2md"]).unwrap();
        assert!(cli.consumer_credential().is_none());
        assert!(cli.group_name.is_none());
        assert!(!cli.overwrite);
        assert!(!cli.verbose);
    }

    #[test]
    fn consumer_takes_two_values() {
        let cli = Cli::try_parse_from(["meetup2md", "--consumer", "key123", "secret456"]).unwrap();
        assert_eq!(cli.consumer_credential(), Some(Credential::new("key123", "secret456")));

        assert!(Cli::try_parse_from(["meetup2md", "--consumer", "only-key"]).is_err());
    }

    #[test]
    fn short_flags() {
        let cli = Cli::try_parse_from([
            "meetup2md", "-g", "rust-meetup", "-f", "Night", "-t", "-1m,1m", "-s", "past",
            "-c", "^Monthly:", "-o", "content", "-v",
        ])
        .unwrap();

        assert_eq!(cli.group_name.as_deref(), Some("rust-meetup"));
        assert_eq!(cli.name_filter.as_deref(), Some("Night"));
        assert_eq!(cli.time_range.as_deref(), Some("-1m,1m"));
        assert_eq!(cli.event_status.as_deref(), Some("past"));
        assert_eq!(cli.title_cleanup.as_deref(), Some("^Monthly:"));
        assert_eq!(cli.output_dir, Some(PathBuf::from("content")));
        assert!(cli.verbose);
    }

    #[test]
    fn long_flags() {
        let cli = Cli::try_parse_from([
            "meetup2md",
            "--config",
            "/tmp/meetup.toml",
            "--verifier",
            "987654",
            "--status",
            "upcoming,past",
            "--cleanup",
            "\\(.*\\)",
            "--overwrite",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/meetup.toml")));
        assert_eq!(cli.verifier.as_deref(), Some("987654"));
        assert_eq!(cli.event_status.as_deref(), Some("upcoming,past"));
        assert_eq!(cli.title_cleanup.as_deref(), Some("\\(.*\\)"));
        assert!(cli.overwrite);
    }
}
