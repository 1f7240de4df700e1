use std::path::Path;

/// Kind of an archive member, by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    JavaScript,
    Json,
    WebAssembly,
    Other,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "js" | "mjs" | "cjs" => FileType::JavaScript,
            "json" => FileType::Json,
            "wasm" => FileType::WebAssembly,
            _ => FileType::Other,
        }
    }

    pub fn from_path(path: &str) -> Self {
        Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileType::Other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path("js/background.js"), FileType::JavaScript);
        assert_eq!(FileType::from_path("lib/worker.MJS"), FileType::JavaScript);
        assert_eq!(FileType::from_path("pkg/module.wasm"), FileType::WebAssembly);
        assert_eq!(FileType::from_path("manifest.json"), FileType::Json);
        assert_eq!(FileType::from_path("README"), FileType::Other);
    }
}
