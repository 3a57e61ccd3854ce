use crate::error::StoreError;
use crate::source::{LogPage, LogQuery, LogSource};
use pathstat_core::entry::RawRecord;
use std::io::Read;
use std::path::{Path, PathBuf};

enum TextInput {
    File(PathBuf),
    Stdin,
    Inline(String),
}

/// Plain-text log lines, one record per non-empty line.
///
/// Lines carry no instant of their own, so every record is stamped with the
/// query's window start and the window does not filter anything. The
/// keyword filter still applies. Always a single page.
pub struct TextSource {
    input: TextInput,
}

impl TextSource {
    pub fn from_path(path: &Path) -> Self {
        Self {
            input: TextInput::File(path.to_path_buf()),
        }
    }

    pub fn stdin() -> Self {
        Self { input: TextInput::Stdin }
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            input: TextInput::Inline(text.into()),
        }
    }

    fn read(&self) -> Result<String, StoreError> {
        match &self.input {
            TextInput::File(path) => std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e)),
            TextInput::Stdin => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .map_err(|e| StoreError::io(Path::new("<stdin>"), e))?;
                Ok(buf)
            }
            TextInput::Inline(text) => Ok(text.clone()),
        }
    }
}

impl LogSource for TextSource {
    fn name(&self) -> String {
        match &self.input {
            TextInput::File(path) => path.display().to_string(),
            TextInput::Stdin => "<stdin>".to_string(),
            TextInput::Inline(_) => "<inline>".to_string(),
        }
    }

    fn fetch_page(&self, query: &LogQuery, next_token: Option<&str>) -> Result<LogPage, StoreError> {
        if let Some(token) = next_token {
            return Err(StoreError::UnknownPageToken(token.to_string()));
        }

        let text = self.read()?;
        let records = text
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty() && query.matches_text(line))
            .map(|(i, line)| RawRecord::new((i + 1).to_string(), line, query.window.start))
            .collect();

        Ok(LogPage {
            records,
            next_token: None,
        })
    }
}
