//! Traits (ports) implemented outside the domain layer

mod hooks;

pub use hooks::BodyHook;
