//! Common test utilities

use parking_lot::Mutex;
use rxlite::rx::Observer;
use std::fmt::Debug;
use std::sync::Arc;

/// Event log shared between an observer and the test body
#[derive(Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)] // Not every test module uses every helper
impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observer recording `next:<v>`, `error:<e>` and `complete`
    pub fn observer<T: Debug + Send + 'static>(&self) -> Observer<T> {
        let (n, e, c) = (self.clone(), self.clone(), self.clone());
        Observer::on_next(move |v: T| n.push(format!("next:{v:?}")))
            .with_error(move |err| e.push(format!("error:{err}")))
            .with_complete(move || c.push("complete".to_string()))
    }

    pub fn push(&self, event: String) {
        self.events.lock().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }
}
