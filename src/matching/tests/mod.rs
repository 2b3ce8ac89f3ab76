mod common;
mod dealbreakers;
mod router;
