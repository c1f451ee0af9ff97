use tracing::debug;

/// Fire-and-forget hardware marker output (EEG port, photodiode box).
pub trait TriggerSink {
    fn fire(&mut self, code: u8);
}

impl<T: TriggerSink + ?Sized> TriggerSink for &mut T {
    fn fire(&mut self, code: u8) {
        (**self).fire(code)
    }
}

impl<T: TriggerSink + ?Sized> TriggerSink for Box<T> {
    fn fire(&mut self, code: u8) {
        (**self).fire(code)
    }
}

/// Stand-in when no trigger device is attached: logs and records the codes.
#[derive(Debug, Default, Clone)]
pub struct LoggingTrigger {
    pub fired: Vec<u8>,
}

impl LoggingTrigger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TriggerSink for LoggingTrigger {
    fn fire(&mut self, code: u8) {
        debug!(code, "trigger simulated");
        self.fired.push(code);
    }
}
