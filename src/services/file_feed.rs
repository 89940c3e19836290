//! Sample-data feed read from a local file.
//!
//! Used when no API key is configured. The sample document only carries
//! 1 Line vehicles, so this source serves that line alone.

use core::future::Future;
use std::path::PathBuf;

use crate::feed::FetchError;
use crate::traits::FeedSource;
use crate::vehicle::Line;

const SAMPLE_LINES: [Line; 1] = [Line::One];

/// Feed source backed by a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileFeed {
    path: PathBuf,
    description: String,
}

impl FileFeed {
    /// Creates a feed reading `path` on every fetch.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let description = format!("sample data at {}", path.display());
        Self { path, description }
    }

    /// The file being read.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl FeedSource for FileFeed {
    fn lines(&self) -> &[Line] {
        &SAMPLE_LINES
    }

    fn describe(&self) -> &str {
        &self.description
    }

    fn fetch_line(&self, line: Line) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send {
        let path = self.path.clone();
        async move {
            if !SAMPLE_LINES.contains(&line) {
                return Err(FetchError::Status(404));
            }
            tokio::fs::read(&path)
                .await
                .map_err(|e| FetchError::Io(format!("{}: {}", path.display(), e)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_file_for_line_one() {
        let path = std::env::temp_dir().join(format!("linklight-sample-{}.json", std::process::id()));
        tokio::fs::write(&path, b"{\"data\":{\"list\":[]}}").await.unwrap();

        let feed = FileFeed::new(&path);
        assert_eq!(feed.lines(), &[Line::One]);
        assert_eq!(
            feed.fetch_line(Line::One).await.unwrap(),
            b"{\"data\":{\"list\":[]}}".to_vec()
        );
        assert_eq!(feed.fetch_line(Line::Two).await, Err(FetchError::Status(404)));

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let feed = FileFeed::new("/nonexistent/linklight/sample.json");
        assert!(matches!(feed.fetch_line(Line::One).await, Err(FetchError::Io(_))));
    }
}
