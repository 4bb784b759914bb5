use crate::config::FlashdeckConfig;
use crate::source::RemoteSource;
use std::rc::Rc;

/// Handles shared by every screen model: the document store and the loaded
/// configuration. Created once at startup and passed to each component.
pub struct AppContext<S: RemoteSource> {
    source: S,
    config: FlashdeckConfig,
}

impl<S: RemoteSource> AppContext<S> {
    pub fn new(source: S, config: FlashdeckConfig) -> Rc<Self> {
        Rc::new(Self { source, config })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &FlashdeckConfig {
        &self.config
    }
}
