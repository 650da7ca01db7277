//! Asynchronous CSV reader with batch interface
//!
//! Reads a CSV export in fixed-size batches so large files can be loaded
//! without blocking the runtime between batches.
//!
//! # Architecture
//!
//! ```text
//! AsyncRead → csv-async → AsyncReader → batches of Records
//!                              ↓
//!                       csv_format module
//!                       (convert_csv_row)
//! ```

use crate::io::csv_format::convert_csv_row;
use crate::types::{Collection, DashboardError, Record};
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncReader<R>,
    headers: Option<Vec<String>>,
}

impl<R: AsyncRead + Unpin + Send> AsyncReader<R> {
    /// Wrap an async byte source
    ///
    /// The header row is read lazily on the first call to
    /// [`headers`](Self::headers) or [`read_batch`](Self::read_batch).
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_reader(reader);

        Self {
            csv_reader,
            headers: None,
        }
    }

    /// Column names from the header row
    pub async fn headers(&mut self) -> Result<Vec<String>, DashboardError> {
        if let Some(headers) = &self.headers {
            return Ok(headers.clone());
        }
        let headers: Vec<String> = self
            .csv_reader
            .headers()
            .await?
            .iter()
            .map(str::to_string)
            .collect();
        self.headers = Some(headers.clone());
        Ok(headers)
    }

    /// Read up to `batch_size` records
    ///
    /// Rows that fail to parse are logged and skipped. An empty batch means
    /// the end of the input.
    ///
    /// # Errors
    ///
    /// Returns an error only if the header row cannot be read.
    pub async fn read_batch(&mut self, batch_size: usize) -> Result<Vec<Record>, DashboardError> {
        let headers = self.headers().await?;
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.records();

        while batch.len() < batch_size {
            match rows.next().await {
                Some(Ok(row)) => batch.push(convert_csv_row(
                    headers.iter().map(String::as_str),
                    row.iter(),
                )),
                Some(Err(e)) => warn!(error = %e, "skipping unreadable row"),
                None => break,
            }
        }

        Ok(batch)
    }

    /// Drain the reader into a collection, one batch at a time
    pub async fn read_all(mut self, batch_size: usize) -> Result<Collection, DashboardError> {
        let batch_size = batch_size.max(1);
        let mut records = Vec::new();
        loop {
            let batch = self.read_batch(batch_size).await?;
            if batch.is_empty() {
                break;
            }
            records.extend(batch);
        }
        let header = self.headers().await?;
        Ok(Collection::with_header(header, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use futures::io::Cursor;

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let csv_content = "id,name\n1,Ana\n2,Bob\n3,Carla\n";
        let mut reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = reader.read_batch(2).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].get("name"), Some(&Value::from("Ana")));
        assert_eq!(batch[1].get("name"), Some(&Value::from("Bob")));

        let batch = reader.read_batch(2).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id(), Some("3".to_string()));

        assert!(reader.read_batch(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_header_only() {
        let mut reader = AsyncReader::new(Cursor::new("id,name\n".as_bytes()));

        assert!(reader.read_batch(10).await.unwrap().is_empty());
        assert_eq!(reader.headers().await.unwrap(), vec!["id", "name"]);
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_and_empty_cells() {
        let csv_content = "id , amount\n  1  ,   \n";
        let mut reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let batch = reader.read_batch(10).await.unwrap();
        assert_eq!(batch[0].id(), Some("1".to_string()));
        assert_eq!(batch[0].get("amount"), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_async_reader_read_all() {
        let csv_content = "id,status\n1,approved\n2,pending\n3,rejected\n4,pending\n5,approved\n";
        let reader = AsyncReader::new(Cursor::new(csv_content.as_bytes()));

        let collection = reader.read_all(2).await.unwrap();
        assert_eq!(collection.len(), 5);
        assert_eq!(collection.columns, vec!["id", "status"]);
        assert_eq!(collection.records[4].get("status"), Some(&Value::from("approved")));
    }
}
