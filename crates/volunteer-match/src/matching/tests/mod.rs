mod common;
mod publisher;
mod routing;
