mod common;
mod routing;
mod search;
