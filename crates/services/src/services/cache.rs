use std::{
    io,
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use logs::{LogKey, LogLine};

const MARKER_FILE: &str = "last_update";

/// Leading generic key segments (account/org/project) already encoded in the
/// cache directory path, so they are dropped from file names.
const SCOPE_SEGMENTS: usize = 3;

/// Scanner-owned on-disk cache of pre-fetched log text.
///
/// Layout: `<base>/<account>/<org>/<project>/<flattened-key>.log`, one file
/// per log key, overwritten whole on each scan pass. The external search
/// index reads this directory; nothing else does.
#[derive(Debug)]
pub struct LogCache {
    root: PathBuf,
}

impl LogCache {
    pub fn new(base: &Path, account: &str, org: &str, project: &str) -> io::Result<Self> {
        let root = base.join(account).join(org).join(project);
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &LogKey) -> PathBuf {
        self.root
            .join(format!("{}.log", key.cache_stem(SCOPE_SEGMENTS)))
    }

    /// Overwrite the cache entry for `key` with the given lines.
    pub fn write_entry(&self, key: &LogKey, lines: &[LogLine]) -> io::Result<PathBuf> {
        let path = self.entry_path(key);
        let mut text = String::with_capacity(lines.iter().map(|l| l.out.len() + 1).sum());
        for line in lines {
            text.push_str(&line.normalized());
        }
        std::fs::write(&path, text)?;
        Ok(path)
    }

    /// Elapsed time since the last successful scan, judged by the marker
    /// file's mtime. `None` if no scan ever completed here.
    pub fn marker_age(&self) -> Option<Duration> {
        let metadata = std::fs::metadata(self.root.join(MARKER_FILE)).ok()?;
        let mtime = metadata.modified().ok()?;
        // A marker from the future counts as brand new.
        Some(SystemTime::now().duration_since(mtime).unwrap_or(Duration::ZERO))
    }

    /// Record a successful scan completion. The timestamp is written as the
    /// file contents for diagnostics; freshness is judged by mtime.
    pub fn touch_marker(&self) -> io::Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs();
        std::fs::write(self.root.join(MARKER_FILE), now.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache(temp: &tempfile::TempDir) -> LogCache {
        LogCache::new(temp.path(), "acct", "org", "proj").unwrap()
    }

    #[test]
    fn entry_path_uses_flattened_key() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(&temp);
        let key = LogKey::new(
            "accountId:a1/orgId:o1/projectId:p1/pipelineId:pipe/runSequence:3/level0:pipeline/level1:stages/level2:build",
        );

        assert_eq!(
            cache.entry_path(&key),
            temp.path()
                .join("acct/org/proj/pipe__3__pipeline__stages__build.log")
        );
    }

    #[test]
    fn write_entry_overwrites_previous_content() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(&temp);
        let key = LogKey::new("a:1/b:2/c:3/pipelineId:x/runSequence:1");

        let first: Vec<LogLine> = vec![
            serde_json::from_str(r#"{"out":"old line"}"#).unwrap(),
            serde_json::from_str(r#"{"out":"old line 2"}"#).unwrap(),
        ];
        let second: Vec<LogLine> = vec![serde_json::from_str(r#"{"out":"new line"}"#).unwrap()];

        cache.write_entry(&key, &first).unwrap();
        let path = cache.write_entry(&key, &second).unwrap();

        assert_eq!(std::fs::read_to_string(path).unwrap(), "new line\n");
    }

    #[test]
    fn marker_round_trip() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(&temp);

        assert!(cache.marker_age().is_none());
        cache.touch_marker().unwrap();
        let age = cache.marker_age().unwrap();
        assert!(age < Duration::from_secs(5));
    }
}
