use std::{env, path::PathBuf};

const CONFIG_FILE: &str = ".diff-review.toml";

/// Read the first config file found.
///
/// A `.diff-review.toml` in the working directory takes precedence over one
/// in `$HOME`; the per-user `config.toml` under the platform config directory
/// is the last resort. Unreadable candidates are skipped.
pub fn load_config_file() -> Option<String> {
    candidate_paths().into_iter().find_map(|path| {
        let content = std::fs::read_to_string(&path).ok()?;
        log::debug!("Loaded config from {}", path.display());
        Some(content)
    })
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    paths.extend(home_config_path());
    paths.extend(crate::paths::global_config_path().ok());
    paths
}

/// `$HOME/.diff-review.toml`, when `HOME` is set.
fn home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_working_directory_is_searched_first() {
        let paths = candidate_paths();
        assert_eq!(paths.first(), Some(&PathBuf::from(CONFIG_FILE)));
    }
}
