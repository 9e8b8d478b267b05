//! Sequential batch conversion on a background worker.
//!
//! A batch walks its input list in order and converts one file at a time.
//! Cancellation is cooperative: the flag is only looked at before a file is
//! started, so a file that is already being written always finishes.

use std::panic;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};

use crate::convert::Converter;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Succeeded { input: PathBuf, output: PathBuf },
    Failed { input: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// Files written successfully
    pub succeeded: usize,
    /// Files attempted before the batch ended
    pub processed: usize,
    /// Files in the input list
    pub total: usize,
    pub state: BatchState,
    pub outcomes: Vec<FileOutcome>,
}

impl BatchResult {
    pub fn failed(&self) -> usize {
        self.processed - self.succeeded
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == BatchState::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    Started { total: usize },
    /// Sent before a file is converted, `index` counts from 1
    Progress { index: usize, total: usize, file_name: String },
    FileDone { file_name: String, output_path: PathBuf },
    Finished(BatchResult),
    /// The batch could not run at all
    Failed { reason: String },
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Converts `files` in order on the calling thread.
///
/// `emit` receives `Started`, `Progress` and `FileDone` events as the batch
/// advances. A file that fails is logged and recorded in the outcomes but does
/// not stop the batch. Only a failure to create the output directory up front
/// is returned as an error.
pub fn run_batch<F>(files: &[PathBuf], converter: &Converter, cancel: &AtomicBool, mut emit: F) -> Result<BatchResult>
where
    F: FnMut(BatchEvent),
{
    let total = files.len();
    converter.ensure_output_dir()?;
    emit(BatchEvent::Started { total });

    let mut succeeded = 0;
    let mut outcomes = Vec::with_capacity(total);
    let mut state = BatchState::Completed;

    for (i, input) in files.iter().enumerate() {
        if cancel.load(Ordering::SeqCst) {
            info!("Batch cancelled after {} of {} files", i, total);
            state = BatchState::Cancelled;
            break;
        }

        let file_name = display_name(input);
        emit(BatchEvent::Progress { index: i + 1, total, file_name: file_name.clone() });

        match converter.convert(input) {
            Ok(output_path) => {
                debug!("Converted {} -> {}", input.display(), output_path.display());
                succeeded += 1;
                outcomes.push(FileOutcome::Succeeded { input: input.clone(), output: output_path.clone() });
                emit(BatchEvent::FileDone { file_name, output_path });
            }
            Err(e) => {
                warn!("Failed to convert {}: {}", input.display(), e);
                outcomes.push(FileOutcome::Failed { input: input.clone(), reason: e.to_string() });
            }
        }
    }

    Ok(BatchResult {
        succeeded,
        processed: outcomes.len(),
        total,
        state,
        outcomes,
    })
}

/// Shared cancellation switch of a running batch.
#[derive(Debug, Clone, Default)]
pub struct Canceller(Arc<AtomicBool>);

impl Canceller {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct BatchHandle {
    events: Receiver<BatchEvent>,
    canceller: Canceller,
    state: Arc<Mutex<BatchState>>,
    worker: JoinHandle<Result<BatchResult>>,
}

impl BatchHandle {
    /// Event stream of the batch. It ends with `Finished` or `Failed` and is
    /// disconnected once the worker exits.
    pub fn events(&self) -> &Receiver<BatchEvent> {
        &self.events
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    pub fn state(&self) -> BatchState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the worker and returns the aggregate result. A panic on the
    /// worker is re-raised on the calling thread.
    pub fn join(self) -> Result<BatchResult> {
        match self.worker.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

/// Starts converting `files` on a new worker thread.
pub fn start_batch(files: Vec<PathBuf>, converter: Converter) -> BatchHandle {
    let (sender, events) = unbounded();
    let canceller = Canceller::default();
    let state = Arc::new(Mutex::new(BatchState::Running));

    let worker_cancel = canceller.clone();
    let worker_state = Arc::clone(&state);
    let worker = thread::spawn(move || {
        let result = run_batch(&files, &converter, &worker_cancel.0, |event| {
            // Nobody listening is fine, the result is still returned by join
            let _ = sender.send(event);
        });

        let final_state = match &result {
            Ok(r) => r.state,
            Err(_) => BatchState::Idle,
        };
        if let Ok(mut s) = worker_state.lock() {
            *s = final_state;
        }

        match &result {
            Ok(r) => {
                let _ = sender.send(BatchEvent::Finished(r.clone()));
            }
            Err(e) => {
                error!("Batch failed: {}", e);
                let _ = sender.send(BatchEvent::Failed { reason: e.to_string() });
            }
        }
        result
    });

    BatchHandle {
        events,
        canceller,
        state,
        worker,
    }
}
