use crate::error::BatchError;

/// Result of a single read: `Ok(Some(item))` while items remain, `Ok(None)` once
/// the source is exhausted.
pub type ItemReaderResult<I> = Result<Option<I>, BatchError>;

/// Result of processing one item.
pub type ItemProcessorResult<O> = Result<O, BatchError>;

/// Result of writing one chunk.
pub type ItemWriterResult = Result<(), BatchError>;

/// Retrieval of input for a step, one item at a time.
///
/// A reader is forward-only: once it has returned `Ok(None)` it stays exhausted.
pub trait ItemReader<I> {
    /// Reads the next item.
    fn read(&self) -> ItemReaderResult<I>;

    /// Acquires the underlying resource. Called once before the first read.
    fn open(&self) -> Result<(), BatchError> {
        Ok(())
    }

    /// Releases the underlying resource. Called once the step is over, whatever its outcome.
    fn close(&self) -> Result<(), BatchError> {
        Ok(())
    }
}

/// Business logic applied to every item between the reader and the writer.
///
/// The processor takes ownership of the read item and hands back the item to write.
pub trait ItemProcessor<I, O> {
    fn process(&self, item: I) -> ItemProcessorResult<O>;
}

/// Output of a step, one chunk of items at a time.
pub trait ItemWriter<O> {
    /// Writes a chunk. Either every item of the chunk is written or an error is returned.
    fn write(&self, items: &[O]) -> ItemWriterResult;

    fn flush(&self) -> ItemWriterResult {
        Ok(())
    }

    fn open(&self) -> ItemWriterResult {
        Ok(())
    }

    fn close(&self) -> ItemWriterResult {
        Ok(())
    }
}

/// Identity processor used by steps built without a processor.
#[derive(Default, Debug, Clone, Copy)]
pub struct PassThroughProcessor;

impl<T> ItemProcessor<T, T> for PassThroughProcessor {
    fn process(&self, item: T) -> ItemProcessorResult<T> {
        Ok(item)
    }
}
