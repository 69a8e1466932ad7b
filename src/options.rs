use serde::Deserialize;

/// Options for serializing a GPX document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteOptions {
    /// Emit the `<?xml ...?>` declaration (default: true)
    #[serde(default = "default_true")]
    pub xml_declaration: bool,

    /// Spaces per nesting level; 0 writes everything on one line (default: 2)
    #[serde(default = "default_indent")]
    pub indent: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            xml_declaration: true,
            indent: default_indent(),
        }
    }
}

impl WriteOptions {
    pub fn compact() -> Self {
        Self {
            indent: 0,
            ..Default::default()
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_indent() -> usize {
    2
}
