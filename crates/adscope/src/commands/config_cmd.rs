//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init { force } => {
            let path = config::path(global);
            if path.exists() && !force {
                return Err(CliError::Validation {
                    field: "config".into(),
                    reason: format!(
                        "{} already exists (use --force to overwrite)",
                        path.display()
                    ),
                });
            }
            config::save_config_to(&Config::default(), &path)?;
            if !global.quiet {
                eprintln!("Wrote default configuration to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?;
            let rendered = match global.output {
                Some(
                    format @ (OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml),
                ) => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
                _ => toml::to_string_pretty(&cfg)?,
            };
            output::print_output(&rendered, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::path(global).display().to_string(), global.quiet);
            Ok(())
        }
    }
}
