pub mod operation_reader;
pub mod transaction_writer;
