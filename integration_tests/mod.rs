mod blocking;
mod client;
mod errors;
mod helpers;
mod search;
