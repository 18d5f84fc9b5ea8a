pub(crate) mod bulletins;
pub(crate) mod errors;
pub(crate) mod handlers;
pub(crate) mod imports;
pub(crate) mod proxy;
pub(crate) mod router;
