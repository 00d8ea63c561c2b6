pub mod ghost_list;
pub mod key_list;

pub use ghost_list::GhostList;
pub use key_list::KeyList;
