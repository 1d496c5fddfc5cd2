use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use uuid::Uuid;

use crate::BatchError;

use super::item::{ItemProcessor, ItemReader, ItemWriter, PassThroughProcessor};

/// Outcome of reading one chunk.
#[derive(Debug, PartialEq)]
pub enum ChunkStatus {
    /// The chunk holds `chunk_size` items and the reader may have more.
    Full,
    /// The reader is exhausted; the chunk holds the remaining items, possibly none.
    Finished,
}

/// Status of a step execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// The step has not been executed yet.
    Starting,
    /// The step is reading, processing and writing chunks.
    Started,
    /// Every chunk has been committed.
    Success,
    /// The reader failed (missing resource, malformed input, unmappable item).
    ReadError,
    /// The processor failed.
    ProcessorError,
    /// The writer failed; the chunk being written was not committed.
    WriteError,
}

/// Execution details of a single step run.
#[derive(Debug)]
pub struct StepExecution {
    /// Unique identifier for this step execution
    pub id: Uuid,
    /// Human-readable name for the step
    pub name: String,
    /// Current status of the step execution
    pub status: StepStatus,
    pub start_time: Instant,
    pub end_time: Instant,
    pub duration: Duration,
    /// Number of items successfully read
    pub read_count: usize,
    /// Number of items successfully written
    pub write_count: usize,
    /// Number of chunks committed by the writer
    pub commit_count: usize,
}

impl StepExecution {
    pub fn new(name: &str) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: StepStatus::Starting,
            start_time: now,
            end_time: now,
            duration: Duration::default(),
            read_count: 0,
            write_count: 0,
            commit_count: 0,
        }
    }
}

/// A sequential phase of a job.
pub trait Step {
    /// Executes the step, recording its progress in `step_execution`.
    ///
    /// # Returns
    /// - `Ok(())`: the step completed successfully
    /// - `Err(BatchError)`: the error that stopped the step, unmodified
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError>;

    fn get_name(&self) -> &str;
}

/// A step reading, processing and writing items chunk by chunk.
///
/// Every chunk is handed to the writer in one call; a writer committing a
/// transaction per call therefore commits once per chunk. Any error stops the
/// step: chunks already written stay written, the current chunk is discarded.
pub struct ChunkOrientedStep<'a, I, O> {
    name: String,
    /// Component responsible for reading items from the source
    reader: &'a dyn ItemReader<I>,
    /// Component responsible for processing items
    processor: &'a dyn ItemProcessor<I, O>,
    /// Component responsible for writing items to the destination
    writer: &'a dyn ItemWriter<O>,
    /// Number of items to process in each chunk
    chunk_size: usize,
}

impl<I, O> Step for ChunkOrientedStep<'_, I, O> {
    fn execute(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        let start_time = Instant::now();
        step_execution.start_time = start_time;
        step_execution.status = StepStatus::Started;

        info!(
            "Start of step: {}, id: {}",
            step_execution.name, step_execution.id
        );

        let result = self.open_and_run(step_execution);

        step_execution.end_time = Instant::now();
        step_execution.duration = start_time.elapsed();

        match &result {
            Ok(()) => {
                step_execution.status = StepStatus::Success;
                info!(
                    "End of step: {}, id: {}, read: {}, written: {}, commits: {}",
                    step_execution.name,
                    step_execution.id,
                    step_execution.read_count,
                    step_execution.write_count,
                    step_execution.commit_count
                );
            }
            Err(err) => {
                error!(
                    "Step {} failed with status {:?} after read: {}, written: {}, commits: {}: {}",
                    step_execution.name,
                    step_execution.status,
                    step_execution.read_count,
                    step_execution.write_count,
                    step_execution.commit_count,
                    err
                );
            }
        }

        result
    }

    fn get_name(&self) -> &str {
        &self.name
    }
}

impl<I, O> ChunkOrientedStep<'_, I, O> {
    /// Opens the reader and the writer, runs the chunk loop and closes both
    /// whatever the outcome.
    fn open_and_run(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        if let Err(err) = self.reader.open() {
            step_execution.status = StepStatus::ReadError;
            return Err(err);
        }

        if let Err(err) = self.writer.open() {
            step_execution.status = StepStatus::WriteError;
            Self::manage_error(self.reader.close());
            return Err(err);
        }

        let result = self.run_chunks(step_execution);

        Self::manage_error(self.writer.close());
        Self::manage_error(self.reader.close());

        result
    }

    fn run_chunks(&self, step_execution: &mut StepExecution) -> Result<(), BatchError> {
        loop {
            let (read_items, chunk_status) = self.read_chunk(step_execution)?;

            let processed_items = self.process_chunk(step_execution, read_items)?;

            self.write_chunk(step_execution, &processed_items)?;

            if chunk_status == ChunkStatus::Finished {
                return Ok(());
            }
        }
    }

    /// Reads up to `chunk_size` items.
    ///
    /// # Returns
    /// - `Ok((items, ChunkStatus::Full))`: the chunk is full
    /// - `Ok((items, ChunkStatus::Finished))`: the reader is exhausted
    /// - `Err(BatchError)`: the reader failed
    fn read_chunk(
        &self,
        step_execution: &mut StepExecution,
    ) -> Result<(Vec<I>, ChunkStatus), BatchError> {
        debug!("Start reading chunk");

        let mut read_items = Vec::with_capacity(self.chunk_size);

        loop {
            match self.reader.read() {
                Ok(Some(item)) => {
                    read_items.push(item);
                    step_execution.read_count += 1;

                    if read_items.len() >= self.chunk_size {
                        debug!("End reading chunk: FULL");
                        return Ok((read_items, ChunkStatus::Full));
                    }
                }
                Ok(None) => {
                    debug!("End reading chunk: FINISHED");
                    return Ok((read_items, ChunkStatus::Finished));
                }
                Err(err) => {
                    step_execution.status = StepStatus::ReadError;
                    return Err(err);
                }
            }
        }
    }

    fn process_chunk(
        &self,
        step_execution: &mut StepExecution,
        read_items: Vec<I>,
    ) -> Result<Vec<O>, BatchError> {
        debug!("Processing chunk of {} items", read_items.len());

        let mut processed_items = Vec::with_capacity(read_items.len());

        for item in read_items {
            match self.processor.process(item) {
                Ok(processed_item) => processed_items.push(processed_item),
                Err(err) => {
                    step_execution.status = StepStatus::ProcessorError;
                    return Err(err);
                }
            }
        }

        Ok(processed_items)
    }

    fn write_chunk(
        &self,
        step_execution: &mut StepExecution,
        processed_items: &[O],
    ) -> Result<(), BatchError> {
        if processed_items.is_empty() {
            debug!("No items to write, skipping write call");
            return Ok(());
        }

        debug!("Writing chunk of {} items", processed_items.len());

        let result = self
            .writer
            .write(processed_items)
            .and_then(|()| self.writer.flush());

        match result {
            Ok(()) => {
                step_execution.write_count += processed_items.len();
                step_execution.commit_count += 1;
                Ok(())
            }
            Err(err) => {
                step_execution.status = StepStatus::WriteError;
                Err(err)
            }
        }
    }

    fn manage_error(result: Result<(), BatchError>) {
        if let Err(error) = result {
            warn!("Non-fatal error: {}", error);
        }
    }
}

/// Builder for a chunk-oriented step.
///
/// ```
/// use batch_xml_to_db::core::item::{ItemReader, ItemReaderResult, ItemWriter, ItemWriterResult};
/// use batch_xml_to_db::core::step::{Step, StepBuilder, StepExecution, StepStatus};
/// use std::cell::{Cell, RefCell};
///
/// struct Countdown(Cell<u32>);
///
/// impl ItemReader<u32> for Countdown {
///     fn read(&self) -> ItemReaderResult<u32> {
///         let remaining = self.0.get();
///         if remaining == 0 {
///             return Ok(None);
///         }
///         self.0.set(remaining - 1);
///         Ok(Some(remaining))
///     }
/// }
///
/// #[derive(Default)]
/// struct Collect(RefCell<Vec<u32>>);
///
/// impl ItemWriter<u32> for Collect {
///     fn write(&self, items: &[u32]) -> ItemWriterResult {
///         self.0.borrow_mut().extend_from_slice(items);
///         Ok(())
///     }
/// }
///
/// let reader = Countdown(Cell::new(3));
/// let writer = Collect::default();
///
/// let step = StepBuilder::new("countdown")
///     .chunk::<u32, u32>(2)
///     .reader(&reader)
///     .writer(&writer)
///     .build()
///     .unwrap();
///
/// let mut step_execution = StepExecution::new(step.get_name());
/// step.execute(&mut step_execution).unwrap();
///
/// assert_eq!(step_execution.status, StepStatus::Success);
/// assert_eq!(step_execution.commit_count, 2);
/// assert_eq!(*writer.0.borrow(), vec![3, 2, 1]);
/// ```
pub struct StepBuilder {
    name: String,
}

impl StepBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }

    /// Starts a chunk-oriented step committing every `chunk_size` items.
    pub fn chunk<'a, I, O>(self, chunk_size: usize) -> ChunkOrientedStepBuilder<'a, I, O> {
        ChunkOrientedStepBuilder::new(&self.name).chunk_size(chunk_size)
    }
}

pub struct ChunkOrientedStepBuilder<'a, I, O> {
    name: String,
    reader: Option<&'a dyn ItemReader<I>>,
    processor: Option<&'a dyn ItemProcessor<I, O>>,
    writer: Option<&'a dyn ItemWriter<O>>,
    chunk_size: usize,
}

impl<'a, I, O> ChunkOrientedStepBuilder<'a, I, O> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            reader: None,
            processor: None,
            writer: None,
            chunk_size: 1,
        }
    }

    pub fn reader(mut self, reader: &'a dyn ItemReader<I>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn processor(mut self, processor: &'a dyn ItemProcessor<I, O>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn writer(mut self, writer: &'a dyn ItemWriter<O>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Builds the step. Without a processor, items are written as read.
    pub fn build(self) -> Result<ChunkOrientedStep<'a, I, O>, BatchError>
    where
        PassThroughProcessor: ItemProcessor<I, O>,
    {
        if self.chunk_size == 0 {
            return Err(BatchError::Configuration(format!(
                "Chunk size of step {} must be greater than 0",
                self.name
            )));
        }

        let reader = self.reader.ok_or_else(|| {
            BatchError::Configuration(format!("Reader is required for building step {}", self.name))
        })?;

        let writer = self.writer.ok_or_else(|| {
            BatchError::Configuration(format!("Writer is required for building step {}", self.name))
        })?;

        Ok(ChunkOrientedStep {
            name: self.name,
            reader,
            processor: self.processor.unwrap_or(&PassThroughProcessor),
            writer,
            chunk_size: self.chunk_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::core::item::{ItemProcessorResult, ItemReaderResult, ItemWriterResult};

    struct VecReader {
        items: RefCell<Vec<Result<String, String>>>,
        opened: Cell<bool>,
        closed: Cell<bool>,
    }

    impl VecReader {
        fn new(items: Vec<Result<&str, &str>>) -> Self {
            let mut items: Vec<Result<String, String>> = items
                .into_iter()
                .map(|item| item.map(str::to_string).map_err(str::to_string))
                .collect();
            items.reverse();
            Self {
                items: RefCell::new(items),
                opened: Cell::new(false),
                closed: Cell::new(false),
            }
        }
    }

    impl ItemReader<String> for VecReader {
        fn read(&self) -> ItemReaderResult<String> {
            match self.items.borrow_mut().pop() {
                Some(Ok(item)) => Ok(Some(item)),
                Some(Err(message)) => Err(BatchError::ItemReader(message)),
                None => Ok(None),
            }
        }

        fn open(&self) -> Result<(), BatchError> {
            self.opened.set(true);
            Ok(())
        }

        fn close(&self) -> Result<(), BatchError> {
            self.closed.set(true);
            Ok(())
        }
    }

    #[derive(Default)]
    struct ChunkRecorder {
        chunks: RefCell<Vec<Vec<String>>>,
        fail_on: Option<&'static str>,
        closed: Cell<bool>,
    }

    impl ItemWriter<String> for ChunkRecorder {
        fn write(&self, items: &[String]) -> ItemWriterResult {
            if let Some(poison) = self.fail_on {
                if items.iter().any(|item| item == poison) {
                    return Err(BatchError::ItemWriter(format!("cannot write {}", poison)));
                }
            }
            self.chunks.borrow_mut().push(items.to_vec());
            Ok(())
        }

        fn close(&self) -> ItemWriterResult {
            self.closed.set(true);
            Ok(())
        }
    }

    struct FailingProcessor;

    impl ItemProcessor<String, String> for FailingProcessor {
        fn process(&self, item: String) -> ItemProcessorResult<String> {
            if item == "bad" {
                Err(BatchError::ItemProcessor("bad item".to_string()))
            } else {
                Ok(item)
            }
        }
    }

    #[test]
    fn writes_items_in_chunks_of_configured_size() {
        let reader = VecReader::new(vec![Ok("a"), Ok("b"), Ok("c"), Ok("d"), Ok("e")]);
        let writer = ChunkRecorder::default();

        let step = StepBuilder::new("test")
            .chunk::<String, String>(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();

        let mut step_execution = StepExecution::new(step.get_name());
        let result = step.execute(&mut step_execution);

        assert!(result.is_ok());
        assert_eq!(step_execution.status, StepStatus::Success);
        assert_eq!(step_execution.read_count, 5);
        assert_eq!(step_execution.write_count, 5);
        assert_eq!(step_execution.commit_count, 3);
        assert_eq!(
            *writer.chunks.borrow(),
            vec![vec!["a", "b"], vec!["c", "d"], vec!["e"]]
        );
        assert!(reader.opened.get());
        assert!(reader.closed.get());
        assert!(writer.closed.get());
    }

    #[test]
    fn empty_reader_completes_without_calling_writer() {
        let reader = VecReader::new(vec![]);
        let writer = ChunkRecorder::default();

        let step = StepBuilder::new("empty")
            .chunk::<String, String>(1)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();

        let mut step_execution = StepExecution::new(step.get_name());
        step.execute(&mut step_execution).unwrap();

        assert_eq!(step_execution.status, StepStatus::Success);
        assert_eq!(step_execution.commit_count, 0);
        assert!(writer.chunks.borrow().is_empty());
    }

    #[test]
    fn read_error_stops_step_and_discards_current_chunk() {
        let reader = VecReader::new(vec![Ok("a"), Ok("b"), Ok("c"), Err("broken")]);
        let writer = ChunkRecorder::default();

        let step = StepBuilder::new("read-error")
            .chunk::<String, String>(2)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();

        let mut step_execution = StepExecution::new(step.get_name());
        let result = step.execute(&mut step_execution);

        match result {
            Err(BatchError::ItemReader(message)) => assert_eq!(message, "broken"),
            other => panic!("Expected ItemReader error, got {:?}", other),
        }
        assert_eq!(step_execution.status, StepStatus::ReadError);
        assert_eq!(*writer.chunks.borrow(), vec![vec!["a", "b"]]);
        assert_eq!(step_execution.write_count, 2);
        assert!(writer.closed.get());
        assert!(reader.closed.get());
    }

    #[test]
    fn processor_error_fails_step() {
        let reader = VecReader::new(vec![Ok("a"), Ok("bad")]);
        let writer = ChunkRecorder::default();
        let processor = FailingProcessor;

        let step = StepBuilder::new("process-error")
            .chunk::<String, String>(1)
            .reader(&reader)
            .processor(&processor)
            .writer(&writer)
            .build()
            .unwrap();

        let mut step_execution = StepExecution::new(step.get_name());
        let result = step.execute(&mut step_execution);

        assert!(matches!(result, Err(BatchError::ItemProcessor(_))));
        assert_eq!(step_execution.status, StepStatus::ProcessorError);
        assert_eq!(*writer.chunks.borrow(), vec![vec!["a"]]);
    }

    #[test]
    fn write_error_keeps_previous_chunks_and_stops() {
        let reader = VecReader::new(vec![Ok("a"), Ok("poison"), Ok("c")]);
        let writer = ChunkRecorder {
            fail_on: Some("poison"),
            ..Default::default()
        };

        let step = StepBuilder::new("write-error")
            .chunk::<String, String>(1)
            .reader(&reader)
            .writer(&writer)
            .build()
            .unwrap();

        let mut step_execution = StepExecution::new(step.get_name());
        let result = step.execute(&mut step_execution);

        assert!(matches!(result, Err(BatchError::ItemWriter(_))));
        assert_eq!(step_execution.status, StepStatus::WriteError);
        assert_eq!(step_execution.read_count, 2);
        assert_eq!(step_execution.commit_count, 1);
        assert_eq!(*writer.chunks.borrow(), vec![vec!["a"]]);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let reader = VecReader::new(vec![]);
        let writer = ChunkRecorder::default();

        let result = StepBuilder::new("zero")
            .chunk::<String, String>(0)
            .reader(&reader)
            .writer(&writer)
            .build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }

    #[test]
    fn missing_writer_is_rejected() {
        let reader = VecReader::new(vec![]);

        let result = StepBuilder::new("no-writer")
            .chunk::<String, String>(1)
            .reader(&reader)
            .build();

        assert!(matches!(result, Err(BatchError::Configuration(_))));
    }
}
