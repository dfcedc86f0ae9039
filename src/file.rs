use serde::{Serialize, Deserialize};

/// A media file as handed over by the host's upload plugin.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDescriptor {
    pub name: String,
    /// Extension including the leading dot.
    pub ext: String,
    #[serde(default)]
    pub path: Option<String>,
    pub hash: String,
    pub mime: String,
    #[serde(skip)]
    pub buffer: Vec<u8>,
    #[serde(default)]
    pub url: Option<String>,
}

impl FileDescriptor {
    pub fn new(
        name: impl Into<String>,
        ext: impl Into<String>,
        hash: impl Into<String>,
        mime: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            ext: ext.into(),
            hash: hash.into(),
            mime: mime.into(),
            ..Default::default()
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_buffer(mut self, buffer: Vec<u8>) -> Self {
        self.buffer = buffer;
        self
    }

    /// Sub-directory, if one is set and non-empty.
    pub fn sub_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}
