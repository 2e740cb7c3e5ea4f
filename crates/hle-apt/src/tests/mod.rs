mod commands;
pub(crate) mod support;
