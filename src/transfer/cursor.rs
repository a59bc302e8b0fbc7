//! Block-by-block transfer between a source and a sink.

use std::io;

use futures::Stream;

use super::block::{BlockSink, BlockSource};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CursorState {
    /// Source not positioned yet.
    Start,
    Moving,
    /// End of data reached, or a step failed.
    Done,
}

/// Moves data from `source` to `sink` one block per step.
///
/// The first step positions the source at the start offset and yields that
/// offset. Every later step moves one block and yields the new offset. The
/// cursor ends when the source returns an empty block. After an error the
/// cursor is done; restarting is the caller's job.
#[derive(Debug)]
pub struct TransferCursor<S, D> {
    source: S,
    sink: D,
    offset: u64,
    block_size: usize,
    state: CursorState,
}

impl<S: BlockSource, D: BlockSink> TransferCursor<S, D> {
    pub fn new(source: S, sink: D, offset: u64, block_size: usize) -> Self {
        Self {
            source,
            sink,
            offset,
            block_size: block_size.max(1),
            state: CursorState::Start,
        }
    }

    /// Bytes transferred so far, counted from the start of the file.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn is_done(&self) -> bool {
        self.state == CursorState::Done
    }

    /// Perform one step. `Ok(None)` once the source is exhausted.
    pub async fn next_step(&mut self) -> Result<Option<u64>> {
        match self.state {
            CursorState::Done => Ok(None),
            CursorState::Start => {
                self.state = CursorState::Done;
                self.source.seek(self.offset).await?;
                self.state = CursorState::Moving;
                Ok(Some(self.offset))
            }
            CursorState::Moving => {
                self.state = CursorState::Done;
                let block = self.source.read_block(self.block_size).await?;
                if block.is_empty() {
                    return Ok(None);
                }

                let len = block.len() as u64;
                let written = self.sink.write_block(block).await?;
                if written == 0 {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("sink accepted no bytes at offset {}", self.offset),
                    )
                    .into());
                }
                self.offset += written;
                // Re-read whatever the sink did not take.
                if written < len {
                    self.source.seek(self.offset).await?;
                }

                self.state = CursorState::Moving;
                Ok(Some(self.offset))
            }
        }
    }

    /// Release both endpoints.
    pub async fn release(&mut self) {
        self.source.release().await;
        self.sink.release().await;
    }

    pub fn into_parts(self) -> (S, D) {
        (self.source, self.sink)
    }

    /// The remaining steps as a stream of offsets.
    pub fn into_stream(self) -> impl Stream<Item = Result<u64>> {
        futures::stream::try_unfold(self, |mut cursor| async move {
            let step = cursor.next_step().await;
            step.map(|offset| offset.map(|offset| (offset, cursor)))
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::PCloudError;
    use crate::transfer::block::Endpoint;
    use bytes::Bytes;
    use futures::TryStreamExt;
    use std::sync::{Arc, Mutex};

    /// In-memory source over a byte vector.
    #[derive(Debug, Default)]
    pub(crate) struct MemorySource {
        pub data: Vec<u8>,
        pub pos: usize,
        pub fail_on_read: Option<usize>,
        pub reads: usize,
    }

    impl MemorySource {
        pub fn new(data: &[u8]) -> Self {
            Self {
                data: data.to_vec(),
                ..Default::default()
            }
        }
    }

    impl Endpoint for MemorySource {}

    impl BlockSource for MemorySource {
        async fn seek(&mut self, offset: u64) -> Result<()> {
            self.pos = (offset as usize).min(self.data.len());
            Ok(())
        }

        async fn read_block(&mut self, max_len: usize) -> Result<Bytes> {
            self.reads += 1;
            if self.fail_on_read == Some(self.reads) {
                return Err(PCloudError::api(5004));
            }
            let end = (self.pos + max_len).min(self.data.len());
            let block = Bytes::copy_from_slice(&self.data[self.pos..end]);
            self.pos = end;
            Ok(block)
        }
    }

    /// In-memory sink; the buffer is shared so tests can inspect it after the sink moves.
    #[derive(Debug, Default, Clone)]
    pub(crate) struct MemorySink {
        pub data: Arc<Mutex<Vec<u8>>>,
        pub fail_on_write: Option<usize>,
        pub max_accept: Option<usize>,
        pub writes: usize,
        pub released: Arc<Mutex<bool>>,
    }

    impl Endpoint for MemorySink {
        async fn release(&mut self) {
            *self.released.lock().unwrap() = true;
        }
    }

    impl BlockSink for MemorySink {
        async fn write_block(&mut self, block: Bytes) -> Result<u64> {
            self.writes += 1;
            if self.fail_on_write == Some(self.writes) {
                return Err(PCloudError::api(5003));
            }
            let take = self.max_accept.unwrap_or(block.len()).min(block.len());
            self.data.lock().unwrap().extend_from_slice(&block[..take]);
            Ok(take as u64)
        }
    }

    async fn collect<S: BlockSource, D: BlockSink>(cursor: &mut TransferCursor<S, D>) -> Vec<u64> {
        let mut offsets = Vec::new();
        while let Some(offset) = cursor.next_step().await.unwrap() {
            offsets.push(offset);
        }
        offsets
    }

    #[tokio::test]
    async fn test_yields_start_then_each_block() {
        let sink = MemorySink::default();
        let mut cursor =
            TransferCursor::new(MemorySource::new(b"0123456789AB"), sink.clone(), 0, 8);
        assert_eq!(collect(&mut cursor).await, vec![0, 8, 12]);
        assert_eq!(sink.data.lock().unwrap().as_slice(), b"0123456789AB");
        assert!(cursor.is_done());
        assert_eq!(cursor.next_step().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_resume_from_offset() {
        let sink = MemorySink::default();
        let mut cursor =
            TransferCursor::new(MemorySource::new(b"0123456789AB"), sink.clone(), 8, 8);
        assert_eq!(collect(&mut cursor).await, vec![8, 12]);
        assert_eq!(sink.data.lock().unwrap().as_slice(), b"89AB");
    }

    #[tokio::test]
    async fn test_empty_source_yields_only_start() {
        let mut cursor = TransferCursor::new(MemorySource::new(b""), MemorySink::default(), 0, 8);
        assert_eq!(collect(&mut cursor).await, vec![0]);
    }

    #[tokio::test]
    async fn test_exact_multiple_of_block_size() {
        let data = vec![7u8; 16];
        let mut exact = TransferCursor::new(MemorySource::new(&data), MemorySink::default(), 0, 8);
        assert_eq!(collect(&mut exact).await, vec![0, 8, 16]);

        let data = vec![7u8; 17];
        let mut longer = TransferCursor::new(MemorySource::new(&data), MemorySink::default(), 0, 8);
        assert_eq!(collect(&mut longer).await, vec![0, 8, 16, 17]);
    }

    #[tokio::test]
    async fn test_partial_writes_do_not_skip_bytes() {
        let sink = MemorySink {
            max_accept: Some(5),
            ..Default::default()
        };
        let mut cursor =
            TransferCursor::new(MemorySource::new(b"0123456789AB"), sink.clone(), 0, 8);
        assert_eq!(collect(&mut cursor).await, vec![0, 5, 10, 12]);
        assert_eq!(sink.data.lock().unwrap().as_slice(), b"0123456789AB");
    }

    #[tokio::test]
    async fn test_zero_byte_write_is_an_error() {
        let sink = MemorySink {
            max_accept: Some(0),
            ..Default::default()
        };
        let mut cursor = TransferCursor::new(MemorySource::new(b"abc"), sink, 0, 8);
        assert_eq!(cursor.next_step().await.unwrap(), Some(0));
        let err = cursor.next_step().await.unwrap_err();
        assert!(matches!(err, PCloudError::Io(e) if e.kind() == io::ErrorKind::WriteZero));
    }

    #[tokio::test]
    async fn test_error_ends_the_cursor() {
        let sink = MemorySink {
            fail_on_write: Some(2),
            ..Default::default()
        };
        let mut cursor =
            TransferCursor::new(MemorySource::new(b"0123456789AB"), sink.clone(), 0, 4);
        assert_eq!(cursor.next_step().await.unwrap(), Some(0));
        assert_eq!(cursor.next_step().await.unwrap(), Some(4));
        assert_eq!(cursor.next_step().await.unwrap_err().api_code(), Some(5003));
        assert_eq!(cursor.offset(), 4);
        assert_eq!(cursor.next_step().await.unwrap(), None);
        assert_eq!(sink.data.lock().unwrap().as_slice(), b"0123");
    }

    #[tokio::test]
    async fn test_offsets_are_monotonic() {
        let data: Vec<u8> = (0..=255).collect();
        let cursor = TransferCursor::new(MemorySource::new(&data), MemorySink::default(), 0, 7);
        let offsets: Vec<u64> = cursor.into_stream().try_collect().await.unwrap();
        assert!(offsets.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(offsets.first(), Some(&0));
        assert_eq!(offsets.last(), Some(&256));
    }
}
