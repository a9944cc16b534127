/// Access to the hosting runtime's loaded modules

use std::path::PathBuf;

/// The runtime that will load compiled modules.
///
/// Every module it reports as loaded is always referenced by a compile.
pub trait HostRuntime {
    fn loaded_modules(&self) -> Vec<PathBuf>;
}

/// A host whose loaded modules are a fixed list.
#[derive(Debug, Clone, Default)]
pub struct StaticHost {
    modules: Vec<PathBuf>,
}

impl StaticHost {
    pub fn new<I, P>(modules: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            modules: modules.into_iter().map(Into::into).collect(),
        }
    }
}

impl HostRuntime for StaticHost {
    fn loaded_modules(&self) -> Vec<PathBuf> {
        self.modules.clone()
    }
}
