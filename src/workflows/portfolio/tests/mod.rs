mod common;
mod optimizer;
mod rating;
