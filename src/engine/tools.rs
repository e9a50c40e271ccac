//! Location of the bundled external tools.
//!
//! ffkit ships ffmpeg/ffprobe/mkvmerge and the Auto-Boost script in an
//! `extern/` directory. The bundle is searched for next to the executable,
//! in the working directory, then one level up; when no bundled copy is
//! found a tool falls back to its bare name so the PATH can supply it.

use std::env;
use std::path::{Path, PathBuf};

const BUNDLE_DIR: &str = "extern";

/// Resolved paths of the external tools a job may invoke.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
    pub mkvmerge: PathBuf,
    pub booster: PathBuf,
}

impl Toolchain {
    /// Locate the tool bundle and resolve each tool, falling back to PATH
    /// lookup per tool.
    pub fn locate() -> Self {
        let bundle = bundle_dir();
        Self {
            ffmpeg: resolve(bundle.as_deref(), &[], "ffmpeg"),
            ffprobe: resolve(bundle.as_deref(), &[], "ffprobe"),
            mkvmerge: resolve(bundle.as_deref(), &["mkvtoolnix"], "mkvmerge"),
            booster: resolve(bundle.as_deref(), &["scripts"], "auto-boost"),
        }
    }
}

/// First existing `extern/` directory among: beside the executable, in the
/// current directory, one level above the current directory.
fn bundle_dir() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(exe) = env::current_exe() {
        if let Some(dir) = exe.parent() {
            candidates.push(dir.join(BUNDLE_DIR));
        }
    }
    if let Ok(cwd) = env::current_dir() {
        candidates.push(cwd.join(BUNDLE_DIR));
        if let Some(parent) = cwd.parent() {
            candidates.push(parent.join(BUNDLE_DIR));
        }
    }

    candidates.into_iter().find(|p| p.is_dir())
}

fn resolve(bundle: Option<&Path>, subdirs: &[&str], name: &str) -> PathBuf {
    if let Some(bundle) = bundle {
        let mut path = bundle.to_path_buf();
        for dir in subdirs {
            path.push(dir);
        }
        path.push(exe_name(name));
        if path.exists() {
            return path;
        }
    }
    PathBuf::from(name)
}

#[cfg(windows)]
fn exe_name(name: &str) -> String {
    format!("{name}.exe")
}

#[cfg(not(windows))]
fn exe_name(name: &str) -> String {
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn missing_bundle_falls_back_to_path_names() {
        let tc = Toolchain {
            ffmpeg: resolve(None, &[], "ffmpeg"),
            ffprobe: resolve(None, &[], "ffprobe"),
            mkvmerge: resolve(None, &["mkvtoolnix"], "mkvmerge"),
            booster: resolve(None, &["scripts"], "auto-boost"),
        };
        assert_eq!(tc.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(tc.mkvmerge, PathBuf::from("mkvmerge"));
        assert_eq!(tc.booster, PathBuf::from("auto-boost"));
    }

    #[test]
    fn bundled_tool_wins_when_present() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join(BUNDLE_DIR);
        fs::create_dir_all(bundle.join("mkvtoolnix")).unwrap();
        let bundled = bundle.join("mkvtoolnix").join(exe_name("mkvmerge"));
        fs::write(&bundled, b"").unwrap();

        assert_eq!(
            resolve(Some(bundle.as_path()), &["mkvtoolnix"], "mkvmerge"),
            bundled
        );
        // ffmpeg is not in the bundle, so it resolves to the bare name
        assert_eq!(
            resolve(Some(bundle.as_path()), &[], "ffmpeg"),
            PathBuf::from("ffmpeg")
        );
    }
}
