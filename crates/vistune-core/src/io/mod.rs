pub mod stack_file;
pub mod tiff_io;
