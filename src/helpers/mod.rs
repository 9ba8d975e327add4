pub(crate) mod archive;
pub(crate) mod reader;
pub(crate) mod xml;
