pub mod record;

pub use record::RelayLogRecord;
