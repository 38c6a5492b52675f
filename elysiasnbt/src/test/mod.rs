mod parser;
mod writer;
