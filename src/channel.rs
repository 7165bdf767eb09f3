use std::io::{self, Write};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};

/// Source of values for `read` statements.
pub trait InputProvider {
    /// Blocks until a value is available.
    fn next_value(&mut self) -> String;
}

/// Destination of `write` output, one line per call.
pub trait OutputSink {
    fn emit(&mut self, line: &str);
}

impl OutputSink for Vec<String> {
    fn emit(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

impl OutputSink for io::Stdout {
    fn emit(&mut self, line: &str) {
        let mut out = self.lock();
        // Nowhere to report a closed stdout; the program keeps running.
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

impl OutputSink for Sender<String> {
    fn emit(&mut self, line: &str) {
        // A dropped receiver means nobody is listening any more.
        let _ = self.send(line.to_string());
    }
}

#[derive(Debug, Default)]
struct Slot {
    value: Option<String>,
    waiting: bool,
}

/// One-slot rendezvous between the interpreter and whoever supplies input.
///
/// Clones share the same slot. A deposit replaces any value that has not
/// been taken yet: the slot is not a queue, the last write wins.
#[derive(Debug, Clone, Default)]
pub struct InputSlot {
    shared: Arc<(Mutex<Slot>, Condvar)>,
}

impl InputSlot {
    pub fn new() -> InputSlot {
        InputSlot::default()
    }

    pub fn deposit(&self, value: &str) {
        let (lock, signal) = &*self.shared;
        let mut slot = lock_slot(lock);
        slot.value = Some(value.to_string());
        signal.notify_all();
    }

    /// Blocks until the interpreter is waiting on an empty slot.
    pub fn wait_for_request(&self) {
        let (lock, signal) = &*self.shared;
        let mut slot = lock_slot(lock);
        while !(slot.waiting && slot.value.is_none()) {
            slot = wait(signal, slot);
        }
    }

    #[cfg(test)]
    fn is_waiting(&self) -> bool {
        let (lock, _) = &*self.shared;
        lock_slot(lock).waiting
    }

    pub fn take(&self) -> String {
        let (lock, signal) = &*self.shared;
        let mut slot = lock_slot(lock);
        slot.waiting = true;
        signal.notify_all();
        loop {
            if let Some(value) = slot.value.take() {
                slot.waiting = false;
                return value;
            }
            slot = wait(signal, slot);
        }
    }
}

impl InputProvider for InputSlot {
    fn next_value(&mut self) -> String {
        self.take()
    }
}

// The slot holds plain data, so a panic elsewhere cannot leave it half
// written; recover the guard from a poisoned lock.
fn lock_slot(lock: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn wait<'a>(signal: &Condvar, guard: MutexGuard<'a, Slot>) -> MutexGuard<'a, Slot> {
    signal
        .wait(guard)
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
