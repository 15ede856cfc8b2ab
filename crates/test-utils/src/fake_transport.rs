use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use plugwatch::reload::{AttemptError, ReloadRequest, ReloadTransport};
use plugwatch::types::BoxFuture;

/// Scripted outcome of one reload attempt.
#[derive(Debug, Clone)]
pub enum Scripted {
    Ok,
    Rejected(u16, &'static str),
    Unreachable(&'static str),
}

/// A reload transport that replays a script and records every request.
///
/// Once the script runs out every further attempt succeeds.
#[derive(Debug, Clone, Default)]
pub struct FakeReloadTransport {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<ReloadRequest>>>,
}

impl FakeReloadTransport {
    pub fn new(script: impl IntoIterator<Item = Scripted>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    pub fn attempts(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ReloadRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ReloadTransport for FakeReloadTransport {
    fn send<'a>(&'a self, request: &'a ReloadRequest) -> BoxFuture<'a, Result<(), AttemptError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Scripted::Ok);
            match next {
                Scripted::Ok => Ok(()),
                Scripted::Rejected(status, body) => Err(AttemptError::Rejected {
                    status,
                    body: body.to_string(),
                }),
                Scripted::Unreachable(msg) => Err(AttemptError::Unreachable(msg.to_string())),
            }
        })
    }
}
