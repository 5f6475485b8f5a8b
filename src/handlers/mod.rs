pub mod dispatcher;
pub mod gate;
pub mod router;
