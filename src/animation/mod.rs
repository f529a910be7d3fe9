pub(crate) mod animator;
pub(crate) mod curve;
pub(crate) mod ease;
pub(crate) mod effects;
pub(crate) mod wave;
