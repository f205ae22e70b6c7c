//! Text utilities: encoding detection, HTML flattening, word counts.

pub mod encoding;
pub mod html_text;
pub mod string_utils;
