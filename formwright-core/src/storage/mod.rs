pub mod opendal;

pub use self::opendal::{lock_writes, operator_from_uri};
