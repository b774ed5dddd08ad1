pub(crate) mod lead;
pub(crate) mod pipeline;
pub(crate) mod serve;
