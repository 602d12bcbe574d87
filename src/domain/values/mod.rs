pub mod intent;
pub mod role;
