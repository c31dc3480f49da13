pub mod completion;
pub(crate) mod http_errors;
