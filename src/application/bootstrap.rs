use crate::infrastructure::config::{
    POMODORO_JSON, PomodoroConfig, ensure_default_config, load_config,
};
use crate::infrastructure::error::InfraError;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct BootstrapResult {
    pub workspace_root: PathBuf,
    pub config_path: PathBuf,
    pub config: PomodoroConfig,
}

pub fn bootstrap_workspace(workspace_root: &Path) -> Result<BootstrapResult, InfraError> {
    let config_dir = workspace_root.join("config");
    fs::create_dir_all(&config_dir)?;

    ensure_default_config(&config_dir)?;
    let config = load_config(&config_dir)?;

    Ok(BootstrapResult {
        workspace_root: workspace_root.to_path_buf(),
        config_path: config_dir.join(POMODORO_JSON),
        config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_creates_default_config_under_workspace() {
        let pid = std::process::id();
        let root = std::env::temp_dir().join(format!("pomogroup-bootstrap-tests-{pid}"));
        let _ = fs::remove_dir_all(&root);

        let bootstrap = bootstrap_workspace(&root).expect("bootstrap workspace");
        assert_eq!(bootstrap.workspace_root, root);
        assert_eq!(bootstrap.config_path, root.join("config").join(POMODORO_JSON));
        assert!(bootstrap.config_path.is_file());
        assert_eq!(bootstrap.config.defaults.focus_minutes, 25);

        let _ = fs::remove_dir_all(&root);
    }
}
