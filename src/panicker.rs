use std::fmt::Debug;

/// Loud-failure hook for programmer errors (missing translations, prices out
/// of range, unformattable times).
///
/// Installed on the service at construction so tests can observe the failure
/// instead of unwinding.
pub trait Panicker: Send + Sync + Debug {
    fn panic(&self, message: String);
}

/// Default panicker: aborts the current task with the message.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessPanicker;

impl Panicker for ProcessPanicker {
    fn panic(&self, message: String) {
        panic!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[should_panic(expected = "out of range")]
    fn process_panicker_panics() {
        ProcessPanicker.panic("out of range".to_string());
    }
}
