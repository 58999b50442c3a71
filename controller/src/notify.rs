use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use tracing::{error, info, warn};

use plantcare_common::{Notification, Severity};

#[derive(Clone)]
pub struct Notifier {
    history: Arc<Mutex<VecDeque<Notification>>>,
    capacity: usize,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            history: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    pub fn recent(&self) -> Vec<Notification> {
        let history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        history.iter().cloned().collect()
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Notification::new(Severity::Info, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Notification::new(Severity::Success, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(Notification::new(Severity::Warning, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Notification::new(Severity::Error, message));
    }

    fn push(&self, notification: Notification) {
        match notification.severity {
            Severity::Info | Severity::Success => info!("{}", notification.message),
            Severity::Warning => warn!("{}", notification.message),
            Severity::Error => error!("{}", notification.message),
        }

        let mut history = self.history.lock().unwrap_or_else(PoisonError::into_inner);
        if history.len() == self.capacity {
            history.pop_front();
        }
        history.push_back(notification);
    }
}
