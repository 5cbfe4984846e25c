pub mod service_reader;
