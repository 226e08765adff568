pub mod clock;
pub mod conversation;
pub mod corridors;
pub mod dates;
pub mod finalizer;
pub mod intent;
pub mod locks;
pub mod messaging;
pub mod pricing;
pub mod replies;
