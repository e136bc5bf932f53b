pub mod parser;
pub mod rsvp;

pub use parser::{parse_file, parse_file_with, Chapter, InputFile, ParseError, ParsedContent, ParserOptions};
pub use rsvp::ReaderSettings;
