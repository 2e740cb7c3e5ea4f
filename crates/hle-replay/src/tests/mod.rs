mod bootstrap;
pub(crate) mod support;
