mod config;
mod envelope;
mod error;
mod request;
mod search;
mod util;
