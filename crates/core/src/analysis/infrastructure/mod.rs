pub mod csv_sample_reader;
