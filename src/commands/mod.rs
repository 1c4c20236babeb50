pub mod extract;
pub mod inventory;
pub mod publish;
pub mod rename;
pub mod status;
