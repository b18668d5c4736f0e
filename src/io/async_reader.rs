//! Asynchronous CSV reader with batch interface
//!
//! Reads command records from any `futures::io::AsyncRead` in bounded batches
//! so the async strategy never holds more than one batch in memory.
//!
//! ```text
//! AsyncRead → AsyncReader → Vec<CommandRecord> batches
//!                  ↓
//!           csv_format module
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::CommandRecord;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` command records
    ///
    /// Rows that fail to parse or convert are logged and skipped. An empty
    /// batch means the input is exhausted.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<CommandRecord> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(command) => batch.push(command),
                    Err(e) => {
                        self.skipped += 1;
                        warn!(error = %e, "Skipping record");
                    }
                },
                Some(Err(e)) => {
                    self.skipped += 1;
                    warn!(error = %e, "Skipping unparsable row");
                }
                None => break,
            }
        }

        batch
    }

    /// Number of rows skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
