use std::error::Error;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use crate::{
    csv_utils::write_csv,
    dto::{ActionType, Request},
    Session, StoryPrompt, Storyteller, UserId,
};

use csv_async::{AsyncReaderBuilder, Error as CsvError, Trim};
use tokio::fs::File;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;

const BUFFER_SIZE: usize = 1024;

type Result<T, E = Box<dyn Error + Send + Sync>> = std::result::Result<T, E>;

/// Counts of what happened to the input rows.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
}

/// Runs the actions in `input_path` and writes the final ledger to `writer`.
/// Spawns two tasks:
/// * CSV reader - streams actions from the input file, deserializes them and sends them to the processor via channel.
/// * Processor - receives actions from the channel and applies them in order until the channel is closed.
///
/// The ledger written at the end is read back through `storyteller`: one row
/// per account, sorted by user.
///
/// # Errors
/// Returns an error if:
/// * The input file cannot be read
/// * The CSV is malformed
/// * The store cannot be read for the final ledger
/// * Writing to the output fails
///
/// A failing action (not enough tokens, provider down, ...) is logged and
/// skipped; it does not stop the run.
pub async fn run<P, W>(
    input_path: P,
    storyteller: Arc<Storyteller>,
    writer: W,
) -> Result<RunSummary>
where
    P: AsRef<Path>,
    W: Write,
{
    let (tx, rx) = mpsc::channel(BUFFER_SIZE);
    let input_path = input_path.as_ref().to_owned();

    let reader_handle = tokio::spawn(read_requests(input_path, tx));
    let processor_handle = tokio::spawn(process_requests(rx, storyteller.clone()));

    // Wait for reader to finish and propagate any errors
    reader_handle.await??;
    let summary = processor_handle.await?;

    let rows = storyteller.ledger().await?;
    write_csv(writer, rows.into_iter())?;
    Ok(summary)
}

/// Reads and deserializes actions from a CSV file.
/// Returns them through the provided channel.
async fn read_requests(
    input_path: impl AsRef<Path> + Send,
    tx: mpsc::Sender<Request>,
) -> Result<(), CsvError> {
    let file = File::open(input_path).await?;
    let mut csv_reader = AsyncReaderBuilder::new()
        .has_headers(true)
        .trim(Trim::All)
        .create_deserializer(file);

    let mut records = csv_reader.deserialize::<Request>();
    while let Some(result) = records.next().await {
        // Malformed rows are fatal, unlike failed actions.
        let request = result?;
        if tx.send(request).await.is_err() {
            // Receiver dropped, exit gracefully
            break;
        }
    }
    Ok(())
}

async fn process_requests(
    mut rx: mpsc::Receiver<Request>,
    storyteller: Arc<Storyteller>,
) -> RunSummary {
    let mut summary = RunSummary::default();
    while let Some(request) = rx.recv().await {
        summary.processed += 1;
        let action = request.action;
        let user = request.user.clone();
        if let Err(err) = apply(&storyteller, request).await {
            summary.failed += 1;
            tracing::warn!(
                row = summary.processed,
                %user,
                ?action,
                retryable = err.is_retryable(),
                %err,
                "action skipped"
            );
        }
    }
    summary
}

async fn apply(storyteller: &Storyteller, request: Request) -> crate::Result<()> {
    let session = Session::new(UserId::new(request.user)?);
    match request.action {
        ActionType::Generate => {
            let prompt = StoryPrompt::new(request.character, request.setting, request.plot_twist)?;
            storyteller.generate(&session, &prompt).await?;
        }
        ActionType::Buy => {
            storyteller.buy_tokens(&session).await?;
        }
    }
    Ok(())
}
