/// UI widgets beyond the main layout
pub mod compare;
