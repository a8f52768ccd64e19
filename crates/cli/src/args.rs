//! Command-line surface.

use clap::{Parser, Subcommand};

/// Select a topic, research it, draft an article, and publish it.
///
/// Without a subcommand one full pipeline run is executed.
#[derive(Debug, Parser)]
#[command(name = "articlegen", version)]
pub struct Cli {
    /// Generate the article but do not publish or record it.
    #[arg(long)]
    pub dry_run: bool,

    /// Write about this topic instead of the next one in the rotation.
    #[arg(long, value_name = "TEXT")]
    pub topic: Option<String>,

    /// Log at DEBUG on the console.
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show catalog and publication statistics.
    Stats,

    /// List recent publications, newest first.
    History {
        /// Maximum number of entries to show.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// List every topic with its category.
    Topics,

    /// Add a topic to an existing category.
    AddTopic {
        /// Category key, e.g. `beaches`.
        category_key: String,
        /// Topic text.
        topic: String,
    },

    /// Create a draft post to verify the WordPress credentials.
    CheckCredentials {
        /// Leave the draft in place instead of deleting it.
        #[arg(long)]
        keep: bool,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_flags() {
        let cli = Cli::try_parse_from(["articlegen", "--dry-run", "--topic", "Parga Castle", "-v"])
            .unwrap();
        assert!(cli.dry_run);
        assert!(cli.verbose);
        assert_eq!(cli.topic.as_deref(), Some("Parga Castle"));
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["articlegen", "history", "--limit", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Command::History { limit: Some(3) })));

        let cli = Cli::try_parse_from(["articlegen", "add-topic", "beaches", "Kryoneri Beach"])
            .unwrap();
        match cli.command {
            Some(Command::AddTopic {
                category_key,
                topic,
            }) => {
                assert_eq!(category_key, "beaches");
                assert_eq!(topic, "Kryoneri Beach");
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["articlegen", "check-credentials", "--keep"]).unwrap();
        assert!(matches!(cli.command, Some(Command::CheckCredentials { keep: true })));
    }
}
