pub(crate) mod escape;
pub(crate) mod params;
pub(crate) mod processor;
pub(crate) mod reconcile;
pub(crate) mod registry;
pub(crate) mod scanner;
