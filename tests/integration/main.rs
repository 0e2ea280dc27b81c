mod common;

mod supervisor;
mod upload;
