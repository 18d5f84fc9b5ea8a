pub(crate) mod generation;
pub(crate) mod roster;
pub(crate) mod ypareo;
