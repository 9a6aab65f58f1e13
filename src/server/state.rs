use crate::session::Session;
use crate::zones::Classifier;
use std::sync::Mutex;

pub struct AppState {
    pub session: Mutex<Session>,
    /// Copy of the session's classifier; offline classification never
    /// waits on a batch holding the session lock.
    pub classifier: Classifier,
}
