//! The main dispatch queue as the UI sequence.

use crate::platform::{UiExecutor, UiTask};

/// Posts tasks to the main dispatch queue, which AppKit drains on the main
/// thread. The app's run loop must be running for tasks to execute.
#[derive(Debug, Default, Clone, Copy)]
pub struct MainQueueExecutor;

impl UiExecutor for MainQueueExecutor {
    fn post(&self, task: UiTask) {
        dispatch::Queue::main().exec_async(task);
    }
}
