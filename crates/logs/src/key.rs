use std::fmt;

/// Opaque structured identifier of one log stream.
///
/// The hierarchical encoding is `level:name` segments joined by `/`, e.g.
/// `accountId:a1/orgId:o1/projectId:p1/pipelineId:pipe/runSequence:3/level0:pipeline`.
/// Keys are case-preserved and order-significant, and are used directly as
/// map keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LogKey(String);

impl LogKey {
    pub fn new<S: Into<String>>(raw: S) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Append the command-unit qualifier some step types require, e.g.
    /// `-commandUnit:Execute` for shell-script steps.
    pub fn with_command_unit(&self, unit: &str) -> LogKey {
        LogKey(format!("{}-commandUnit:{unit}", self.0))
    }

    /// Collision-resistant cache-file stem: drop the first `skip` generic
    /// segments, keep only each remaining segment's name (the part after
    /// `level:`), join with `__`.
    pub fn cache_stem(&self, skip: usize) -> String {
        self.0
            .split('/')
            .skip(skip)
            .map(|segment| segment.split_once(':').map_or(segment, |(_, name)| name))
            .collect::<Vec<_>>()
            .join("__")
    }
}

impl fmt::Display for LogKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for LogKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<&str> for LogKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}
