//! `config show` and `config check`.

use crate::CliOutput;
use crate::error::CliError;
use hybrid_rag_infra::{ConfigOutputFormat, load_effective_config, render_config};
use std::collections::BTreeMap;
use std::path::Path;

/// Print the effective config with secrets redacted.
pub fn run_config_show(
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
    format: ConfigOutputFormat,
) -> Result<CliOutput, CliError> {
    let config = load_effective_config(env, path, None)?;
    Ok(CliOutput::stdout(render_config(&config, format)?))
}

/// Validate config file, env, and defaults together.
pub fn run_config_check(
    env: &BTreeMap<String, String>,
    path: Option<&Path>,
) -> Result<CliOutput, CliError> {
    load_effective_config(env, path, None)?;
    let stdout = path.map_or_else(
        || "status: ok\nconfig: ok\n".to_string(),
        |path| format!("status: ok\nconfig: ok\npath: {}\n", path.to_string_lossy()),
    );
    Ok(CliOutput::stdout(stdout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExitCode;

    #[test]
    fn check_reports_invalid_env_as_caller_error() {
        let env = BTreeMap::from([("HRAG_SEARCH_MAX_LIMIT".to_owned(), "0".to_owned())]);
        let error = run_config_check(&env, None).err();
        assert!(matches!(error, Some(ref e) if e.exit_code() == ExitCode::InvalidInput));
    }

    #[test]
    fn show_defaults_as_toml() -> Result<(), CliError> {
        let output = run_config_show(&BTreeMap::new(), None, ConfigOutputFormat::Toml)?;
        assert!(output.stdout.contains("collectionName = \"documents\""));
        Ok(())
    }
}
