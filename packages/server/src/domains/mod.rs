pub mod notifications;
pub mod publishing;
pub mod submissions;
