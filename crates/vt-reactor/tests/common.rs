// Shared test doubles. Included with `mod common;` from each test file.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use vt_core::Command;
use vt_hw::{ActuatorPort, HwError, HwResult, SensorPort};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Call {
    Read,
    Write(Command),
    Stop,
}

#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    pub fn record(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn stops(&self) -> usize {
        self.calls().iter().filter(|c| **c == Call::Stop).count()
    }

    pub fn actuator_calls(&self) -> usize {
        self.calls().iter().filter(|c| **c != Call::Read).count()
    }
}

/// Plays back readings; repeats the last one once the script runs out.
pub struct ScriptedSensor {
    readings: VecDeque<f64>,
    last: f64,
    fail: bool,
    journal: Journal,
}

impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = f64>, journal: &Journal) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last: f64::NAN,
            fail: false,
            journal: journal.clone(),
        }
    }

    pub fn constant(value: f64, journal: &Journal) -> Self {
        Self::new([value], journal)
    }

    pub fn failing(journal: &Journal) -> Self {
        let mut s = Self::new(std::iter::empty(), journal);
        s.fail = true;
        s
    }
}

impl SensorPort for ScriptedSensor {
    fn read_temperature(&mut self) -> HwResult<f64> {
        self.journal.record(Call::Read);
        if self.fail {
            return Err(HwError::io("probe", io::Error::other("no response")));
        }
        if let Some(v) = self.readings.pop_front() {
            self.last = v;
        }
        Ok(self.last)
    }
}

pub struct RecordingActuator {
    fail_writes: bool,
    journal: Journal,
}

impl RecordingActuator {
    pub fn new(journal: &Journal) -> Self {
        Self {
            fail_writes: false,
            journal: journal.clone(),
        }
    }

    pub fn failing_writes(journal: &Journal) -> Self {
        Self {
            fail_writes: true,
            journal: journal.clone(),
        }
    }
}

impl ActuatorPort for RecordingActuator {
    fn write(&mut self, command: Command) -> HwResult<()> {
        self.journal.record(Call::Write(command));
        if self.fail_writes {
            return Err(HwError::bus("esc", "nack"));
        }
        Ok(())
    }

    fn stop(&mut self) -> HwResult<()> {
        self.journal.record(Call::Stop);
        Ok(())
    }
}

/// Log sink for asserting on emitted diagnostics.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber writing into a buffer; return its output.
pub fn with_captured_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let logs = CapturedLogs::default();
    let writer = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let r = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
    (r, text)
}
