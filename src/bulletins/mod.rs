//! The bulletin engine: everything between "a grade spreadsheet was uploaded"
//! and "one populated DOCX per student exists on disk".

pub(crate) mod archive;
pub(crate) mod convert;
pub(crate) mod ects;
pub(crate) mod engine;
pub(crate) mod grades;
pub(crate) mod normalize;
pub(crate) mod populate;
pub(crate) mod render;
pub(crate) mod template;
pub(crate) mod unit_state;
pub(crate) mod workbook;
