//! Timed servo procedures
//!
//! Some servo actions are multi-step physical sequences: move the logo
//! arm, wait for the mechanics to settle, then continue. The device
//! offers no acknowledgment for motion, so the waits are blind timeouts
//! sized to the hardware. Sequences are expressed as explicit step lists
//! and executed by a [`SequenceRunner`], which keeps the whole procedure
//! cancellable and testable on virtual time — no inline sleeps scattered
//! through UI code.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

use wheel_proto::{ServoIn, ServoMotorInfo};

use crate::error::{ClientError, Result};

/// Settle time after a plain positioning move
const GOTO_SETTLE: Duration = Duration::from_secs(5);
/// Time the arm is held at the mount position while a logo is attached
const MOUNT_HOLD: Duration = Duration::from_secs(10);

/// One step of a servo procedure: a command plus its settle wait
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceStep {
    /// Servo write to dispatch
    pub servo: ServoIn,
    /// Blind wait for the mechanics to settle before the next step
    pub settle: Duration,
}

/// High-level servo actions offered to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServoCommand {
    /// Move the logo to its hidden position
    GotoZero,
    /// Move the logo to its display position
    GotoFull,
    /// Move to the release position, settle, then detach the servo so
    /// the logo can be removed
    Unmount,
    /// Move to the mount position, hold while the logo is attached,
    /// then return to hidden
    Mount,
}

impl ServoCommand {
    /// Compile the command into its timed steps using the motor's
    /// calibration
    pub fn steps(&self, calibration: &ServoMotorInfo) -> Vec<SequenceStep> {
        match self {
            ServoCommand::GotoZero => vec![SequenceStep {
                servo: ServoIn::goto(0.0),
                settle: GOTO_SETTLE,
            }],
            ServoCommand::GotoFull => vec![SequenceStep {
                servo: ServoIn::goto(1.0),
                settle: GOTO_SETTLE,
            }],
            ServoCommand::Unmount => vec![
                SequenceStep {
                    servo: ServoIn::goto(calibration.mount_pos),
                    settle: GOTO_SETTLE,
                },
                SequenceStep {
                    servo: ServoIn::detach(),
                    settle: Duration::ZERO,
                },
            ],
            ServoCommand::Mount => vec![
                SequenceStep {
                    servo: ServoIn::goto(calibration.mount_pos),
                    settle: MOUNT_HOLD,
                },
                SequenceStep {
                    servo: ServoIn::goto(0.0),
                    settle: Duration::ZERO,
                },
            ],
        }
    }
}

/// Executes one timed step list at a time
///
/// Rejects reentry while a sequence is running (the triggering UI
/// disables its button off the [`in_progress`](SequenceRunner::in_progress)
/// flag) and abandons the remainder of a sequence on
/// [`abort`](SequenceRunner::abort) — used at teardown so nothing
/// mutates state after the owner is gone.
pub struct SequenceRunner {
    in_progress: Arc<AtomicBool>,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl SequenceRunner {
    /// New idle runner
    pub fn new() -> Self {
        Self {
            in_progress: Arc::new(AtomicBool::new(false)),
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Start a sequence, dispatching each step through `dispatch`
    ///
    /// `motor` only labels the error when a sequence is already running.
    pub fn run<F>(&self, motor: &str, steps: Vec<SequenceStep>, dispatch: F) -> Result<()>
    where
        F: Fn(ServoIn) + Send + Sync + 'static,
    {
        if self.in_progress.swap(true, Ordering::SeqCst) {
            return Err(ClientError::SequenceInProgress(motor.to_string()));
        }

        let in_progress = Arc::clone(&self.in_progress);
        let handle = tokio::spawn(async move {
            for step in steps {
                dispatch(step.servo);
                if !step.settle.is_zero() {
                    tokio::time::sleep(step.settle).await;
                }
            }
            in_progress.store(false, Ordering::SeqCst);
        });
        *self.task.lock() = Some(handle);
        Ok(())
    }

    /// Whether a sequence is currently running
    pub fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    /// Abandon the running sequence, if any
    ///
    /// Remaining steps are never dispatched.
    pub fn abort(&self) {
        if let Some(handle) = self.task.lock().take() {
            handle.abort();
        }
        self.in_progress.store(false, Ordering::SeqCst);
    }
}

impl Default for SequenceRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SequenceRunner {
    fn clone(&self) -> Self {
        Self {
            in_progress: Arc::clone(&self.in_progress),
            task: Arc::clone(&self.task),
        }
    }
}

impl std::fmt::Debug for SequenceRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceRunner")
            .field("in_progress", &self.in_progress())
            .finish()
    }
}
